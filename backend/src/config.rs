use std::net::SocketAddr;

use clap::Parser;

pub const DEFAULT_ROUTING_URL: &str = "https://router.hereapi.com/v8/routes";
pub const DEFAULT_GEOCODE_URL: &str = "https://geocode.search.hereapi.com/v1/geocode";

#[derive(Debug, Clone, Parser)]
#[command(
    author,
    version,
    about = "Traffic guidance scheme planner: lanes, workzone, taper and sign placement"
)]
pub struct ServerConfig {
    /// Address the HTTP API listens on
    #[arg(long, env = "TGS_BIND", default_value = "0.0.0.0:8080")]
    pub bind: SocketAddr,

    /// HERE platform API key used for routing and geocoding
    #[arg(long, env = "HERE_API_KEY", default_value = "", hide_env_values = true)]
    pub here_api_key: String,

    #[arg(long, env = "HERE_ROUTING_URL", default_value = DEFAULT_ROUTING_URL)]
    pub routing_url: String,

    #[arg(long, env = "HERE_GEOCODE_URL", default_value = DEFAULT_GEOCODE_URL)]
    pub geocode_url: String,

    /// How far from a lane line (meters) a click still selects that lane
    #[arg(long, env = "TGS_HIT_TOLERANCE_M", default_value_t = 6.0)]
    pub hit_tolerance_m: f64,
}

impl ServerConfig {
    pub fn planner_settings(&self) -> PlannerSettings {
        PlannerSettings {
            hit_tolerance_m: self.hit_tolerance_m,
        }
    }
}

/// Knobs of the interactive session.
#[derive(Debug, Clone, Copy)]
pub struct PlannerSettings {
    pub hit_tolerance_m: f64,
}

impl Default for PlannerSettings {
    fn default() -> Self {
        Self {
            hit_tolerance_m: 6.0,
        }
    }
}
