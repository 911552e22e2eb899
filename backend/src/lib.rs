pub mod config;
pub mod error;
pub mod features;
pub mod geo_math;
pub mod gpx_export;
pub mod here;
pub mod lanes;
pub mod models;
pub mod planner;
pub mod polyline;
pub mod projector;
pub mod route;
pub mod session;
pub mod workzone;

use std::sync::{Arc, Mutex, PoisonError};

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};

use crate::config::PlannerSettings;
use crate::error::ExternalRouteError;
use crate::geo_math::Spherical;
use crate::gpx_export::encode_plan_as_gpx;
use crate::here::RouteProvider;
use crate::lanes::generate_lanes;
use crate::models::{
    ApiError, GeocodeRequest, GeocodeResponse, LanesRequest, LanesResponse, RouteRequest,
    RouteResponse, TgsRequest, TgsResponse,
};
use crate::planner::plan_tgs;
use crate::session::{ClientEvent, LookupTicket, RouteTicket, SessionEvent, SessionState, SessionView};
use crate::workzone::WorkzoneSelector;

pub struct AppState<P> {
    pub provider: Arc<P>,
    pub session: Arc<Mutex<SessionState>>,
    pub settings: PlannerSettings,
}

impl<P> AppState<P> {
    pub fn new(provider: P, settings: PlannerSettings) -> Self {
        Self {
            provider: Arc::new(provider),
            session: Arc::new(Mutex::new(SessionState::default())),
            settings,
        }
    }
}

impl<P> Clone for AppState<P> {
    fn clone(&self) -> Self {
        Self {
            provider: Arc::clone(&self.provider),
            session: Arc::clone(&self.session),
            settings: self.settings,
        }
    }
}

pub fn create_router<P: RouteProvider + 'static>(state: AppState<P>) -> Router {
    Router::new()
        .route("/api/lanes", post(lanes_handler))
        .route("/api/tgs", post(tgs_handler))
        .route("/api/route", post(route_handler::<P>))
        .route("/api/geocode", post(geocode_handler::<P>))
        .route("/api/session", get(session_handler::<P>))
        .route("/api/session/events", post(session_event_handler::<P>))
        .route("/api/session/features", get(session_features_handler::<P>))
        .with_state(state)
}

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ApiError>)>;

async fn lanes_handler(Json(req): Json<LanesRequest>) -> ApiResult<LanesResponse> {
    let lanes = generate_lanes(&req.route, &Spherical)
        .map_err(|err| error_response(StatusCode::BAD_REQUEST, err))?;
    Ok(Json(LanesResponse { lanes }))
}

async fn tgs_handler(Json(req): Json<TgsRequest>) -> ApiResult<TgsResponse> {
    let [first, second] = req.bounds;
    let selector = WorkzoneSelector::Empty.select(first).select(second);
    let plan = plan_tgs(&req.lane, selector, &Spherical)
        .map_err(|err| error_response(StatusCode::UNPROCESSABLE_ENTITY, err))?;
    let gpx_base64 = encode_plan_as_gpx(&req.lane, &plan)
        .map_err(|err| error_response(StatusCode::INTERNAL_SERVER_ERROR, err))?;

    tracing::info!(
        "TGS for workzone {}..={}: taper from {}, sign at {}",
        plan.workzone.start,
        plan.workzone.end,
        plan.taper_start_idx,
        plan.sign_idx
    );
    Ok(Json(TgsResponse { plan, gpx_base64 }))
}

async fn route_handler<P: RouteProvider>(
    State(state): State<AppState<P>>,
    Json(req): Json<RouteRequest>,
) -> ApiResult<RouteResponse> {
    tracing::info!("Route request: {:?} -> {:?}", req.start, req.end);
    let route = state
        .provider
        .fetch_route(req.start, req.end)
        .await
        .map_err(route_error)?;
    let lanes = generate_lanes(route.path(), &Spherical)
        .map_err(|err| error_response(StatusCode::UNPROCESSABLE_ENTITY, err))?;
    let distance_m = route.length_m();

    Ok(Json(RouteResponse {
        route: route.into_path(),
        lanes,
        distance_m,
    }))
}

async fn geocode_handler<P: RouteProvider>(
    State(state): State<AppState<P>>,
    Json(req): Json<GeocodeRequest>,
) -> ApiResult<GeocodeResponse> {
    let position = state
        .provider
        .lookup_place(&req.query)
        .await
        .map_err(|err| {
            tracing::warn!("{err}");
            error_response(StatusCode::BAD_GATEWAY, "Error searching address.")
        })?;
    Ok(Json(GeocodeResponse { position }))
}

async fn session_handler<P>(State(state): State<AppState<P>>) -> Json<SessionView> {
    Json(lock_session(&state.session).view())
}

async fn session_features_handler<P>(
    State(state): State<AppState<P>>,
) -> Json<geojson::FeatureCollection> {
    Json(lock_session(&state.session).features())
}

/// Apply an operator event, then run whatever lookups it requested.
///
/// The session lock is released while the provider is awaited; responses go
/// back through the session's ticket check.
async fn session_event_handler<P: RouteProvider>(
    State(state): State<AppState<P>>,
    Json(event): Json<ClientEvent>,
) -> Json<SessionView> {
    let (route_ticket, lookup_ticket) = apply_event(&state, event.into());

    if let Some(ticket) = route_ticket {
        let result = state.provider.fetch_route(ticket.start, ticket.end).await;
        apply_event(
            &state,
            SessionEvent::RouteFetched {
                ticket: ticket.id,
                result,
            },
        );
    }
    if let Some(ticket) = lookup_ticket {
        let result = state.provider.lookup_place(&ticket.query).await;
        apply_event(
            &state,
            SessionEvent::PlaceFound {
                ticket: ticket.id,
                result,
            },
        );
    }

    Json(lock_session(&state.session).view())
}

/// Returns the tickets newly issued by `event`.
fn apply_event<P>(
    state: &AppState<P>,
    event: SessionEvent,
) -> (Option<RouteTicket>, Option<LookupTicket>) {
    let mut session = lock_session(&state.session);
    let route_before = session.pending_route().map(|t| t.id);
    let lookup_before = session.pending_lookup().map(|t| t.id);

    let current = std::mem::take(&mut *session);
    *session = current.apply(event, &Spherical, &state.settings);

    (
        session
            .pending_route()
            .filter(|t| Some(t.id) != route_before)
            .cloned(),
        session
            .pending_lookup()
            .filter(|t| Some(t.id) != lookup_before)
            .cloned(),
    )
}

fn lock_session(session: &Mutex<SessionState>) -> std::sync::MutexGuard<'_, SessionState> {
    session.lock().unwrap_or_else(PoisonError::into_inner)
}

fn route_error(err: ExternalRouteError) -> (StatusCode, Json<ApiError>) {
    tracing::warn!("route fetch failed: {err}");
    match err {
        ExternalRouteError::NoGeometry => error_response(StatusCode::BAD_GATEWAY, "No route found."),
        _ => error_response(StatusCode::BAD_GATEWAY, "Error fetching route."),
    }
}

fn error_response(status: StatusCode, err: impl ToString) -> (StatusCode, Json<ApiError>) {
    (
        status,
        Json(ApiError {
            message: err.to_string(),
        }),
    )
}
