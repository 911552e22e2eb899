use serde::{Deserialize, Serialize};

/// Label carried by every advance warning sign.
pub const SIGN_LABEL: &str = "Roadwork Ahead";

/// WGS84 position in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lon: f64,
    pub lat: f64,
}

impl GeoPoint {
    pub const fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }
}

/// One traffic lane derived from the route centerline.
///
/// `offset_meters` is signed: positive values lie to the right of the
/// direction of travel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lane {
    pub lane_index: usize,
    pub offset_meters: f64,
    pub path: Vec<GeoPoint>,
}

/// Workzone bounds normalized so that `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkzoneRange {
    pub start: usize,
    pub end: usize,
}

impl WorkzoneRange {
    pub fn from_bounds(a: usize, b: usize) -> Self {
        Self {
            start: a.min(b),
            end: a.max(b),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaperPlan {
    pub path: Vec<GeoPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignPlacement {
    pub coordinate: GeoPoint,
    pub label: String,
}

/// Output of the planner for one lane and one workzone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TgsPlan {
    pub workzone: WorkzoneRange,
    pub taper_start_idx: usize,
    pub sign_idx: usize,
    pub taper: TaperPlan,
    pub sign: SignPlacement,
    /// The lane ran out upstream before the taper length was reached.
    #[serde(default)]
    pub taper_exhausted: bool,
    /// The lane ran out upstream before the sign distance was reached.
    #[serde(default)]
    pub sign_exhausted: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LanesRequest {
    pub route: Vec<GeoPoint>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LanesResponse {
    pub lanes: Vec<Lane>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TgsRequest {
    pub lane: Vec<GeoPoint>,
    /// Workzone bounds in click order; the planner normalizes them.
    pub bounds: [usize; 2],
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TgsResponse {
    pub plan: TgsPlan,
    pub gpx_base64: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteRequest {
    pub start: GeoPoint,
    pub end: GeoPoint,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteResponse {
    pub route: Vec<GeoPoint>,
    pub lanes: Vec<Lane>,
    pub distance_m: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeocodeRequest {
    pub query: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeocodeResponse {
    #[serde(default)]
    pub position: Option<GeoPoint>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub message: String,
}
