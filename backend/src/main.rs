use clap::Parser;
use tgs_backend::{AppState, config::ServerConfig, create_router, here::HereClient};
use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tgs_backend=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::parse();
    if config.here_api_key.is_empty() {
        tracing::warn!("HERE_API_KEY is not set; route and place lookups will be rejected");
    }

    let provider = HereClient::from_config(&config);
    let state = AppState::new(provider, config.planner_settings());

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);
    let app = create_router(state).layer(cors);

    tracing::info!("starting TGS planner on http://{}", config.bind);
    tracing::info!("  POST /api/route - route + lanes between two points");
    tracing::info!("  POST /api/lanes - lanes for a given route");
    tracing::info!("  POST /api/tgs - taper and sign for a lane workzone");
    tracing::info!("  POST /api/geocode - first match for a place query");
    tracing::info!("  GET/POST /api/session[/events|/features] - interactive session");

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .expect("bind listener");
    axum::serve(listener, app).await.expect("serve API");
}
