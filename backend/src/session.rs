//! Operator session: the whole interactive state as one value.
//!
//! Every operator action and every external response is an event applied by
//! [`SessionState::apply`], which consumes the old state and returns the new
//! one. Network calls are not made here; instead the state records a pending
//! ticket and the caller reports the outcome back with that ticket. Outcomes
//! whose ticket is no longer pending are dropped.

use serde::{Deserialize, Serialize};

use crate::{
    config::PlannerSettings,
    error::{ExternalLookupError, ExternalRouteError, PlanError},
    features::scheme_features,
    geo_math::GeoMath,
    lanes::generate_lanes,
    models::{GeoPoint, Lane, TgsPlan},
    planner::plan_tgs,
    projector::{nearest_index, nearest_lane},
    route::{Route, RouteModel},
    workzone::WorkzoneSelector,
};

/// A route request the caller should perform.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteTicket {
    pub id: u64,
    pub start: GeoPoint,
    pub end: GeoPoint,
}

/// A place lookup the caller should perform.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LookupTicket {
    pub id: u64,
    pub query: String,
}

/// Actions an operator (or the UI on their behalf) can send.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientEvent {
    MapClicked { point: GeoPoint },
    SelectLane { lane: usize },
    SearchSubmitted { query: String },
    GenerateRequested,
    Reset,
}

#[derive(Debug)]
pub enum SessionEvent {
    Client(ClientEvent),
    RouteFetched {
        ticket: u64,
        result: Result<Route, ExternalRouteError>,
    },
    PlaceFound {
        ticket: u64,
        result: Result<Option<GeoPoint>, ExternalLookupError>,
    },
}

impl From<ClientEvent> for SessionEvent {
    fn from(event: ClientEvent) -> Self {
        Self::Client(event)
    }
}

#[derive(Debug, Clone, Default)]
pub struct SessionState {
    segment_points: Vec<GeoPoint>,
    next_ticket: u64,
    pending_route: Option<RouteTicket>,
    pending_lookup: Option<LookupTicket>,
    routes: RouteModel,
    lanes: Vec<Lane>,
    selected_lane: Option<usize>,
    workzone: WorkzoneSelector,
    plan: Option<TgsPlan>,
    focus: Option<GeoPoint>,
    error: Option<String>,
    loading: bool,
}

/// Serializable snapshot handed to the UI.
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub segment_points: Vec<GeoPoint>,
    pub route: Option<Vec<GeoPoint>>,
    pub lanes: Vec<Lane>,
    pub selected_lane: Option<usize>,
    pub workzone: WorkzoneSelector,
    pub plan: Option<TgsPlan>,
    pub focus: Option<GeoPoint>,
    pub route_pending: bool,
    pub loading: bool,
    pub can_generate: bool,
    pub error: Option<String>,
    pub messages: Vec<String>,
}

impl SessionState {
    pub fn apply(
        mut self,
        event: SessionEvent,
        geo: &impl GeoMath,
        settings: &PlannerSettings,
    ) -> Self {
        match event {
            SessionEvent::Client(ClientEvent::MapClicked { point }) => {
                self.map_clicked(point, geo, settings)
            }
            SessionEvent::Client(ClientEvent::SelectLane { lane }) => self.select_lane(lane),
            SessionEvent::Client(ClientEvent::SearchSubmitted { query }) => self.search(query),
            SessionEvent::Client(ClientEvent::GenerateRequested) => {
                self.generate(geo);
                self
            }
            SessionEvent::Client(ClientEvent::Reset) => Self {
                next_ticket: self.next_ticket,
                ..Self::default()
            },
            SessionEvent::RouteFetched { ticket, result } => self.route_fetched(ticket, result, geo),
            SessionEvent::PlaceFound { ticket, result } => self.place_found(ticket, result),
        }
    }

    pub fn pending_route(&self) -> Option<&RouteTicket> {
        self.pending_route.as_ref()
    }

    pub fn pending_lookup(&self) -> Option<&LookupTicket> {
        self.pending_lookup.as_ref()
    }

    pub fn route(&self) -> Option<&Route> {
        self.routes.route()
    }

    pub fn lanes(&self) -> &[Lane] {
        &self.lanes
    }

    pub fn selected_lane(&self) -> Option<usize> {
        self.selected_lane
    }

    pub fn workzone(&self) -> WorkzoneSelector {
        self.workzone
    }

    pub fn plan(&self) -> Option<&TgsPlan> {
        self.plan.as_ref()
    }

    pub fn focus(&self) -> Option<GeoPoint> {
        self.focus
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn can_generate(&self) -> bool {
        self.selected_lane.is_some() && self.workzone.range().is_some()
    }

    fn map_clicked(self, point: GeoPoint, geo: &impl GeoMath, settings: &PlannerSettings) -> Self {
        let hit = nearest_lane(&self.lanes, point, settings.hit_tolerance_m, geo);
        match (hit, self.selected_lane) {
            (Some(lane), Some(selected)) if lane == selected => {
                self.workzone_clicked(selected, point, geo)
            }
            (Some(lane), _) => self.select_lane(lane),
            (None, Some(selected)) => self.workzone_clicked(selected, point, geo),
            (None, None) => self.segment_clicked(point),
        }
    }

    fn select_lane(mut self, lane: usize) -> Self {
        if lane >= self.lanes.len() {
            tracing::debug!("ignoring selection of missing lane {lane}");
            return self;
        }
        tracing::info!("lane {lane} selected");
        self.selected_lane = Some(lane);
        self.workzone = self.workzone.reset();
        self.plan = None;
        self
    }

    fn workzone_clicked(mut self, lane: usize, point: GeoPoint, geo: &impl GeoMath) -> Self {
        let Some(index) = self
            .lanes
            .get(lane)
            .and_then(|lane| nearest_index(&lane.path, point, geo))
        else {
            return self;
        };
        self.workzone = self.workzone.select(index);
        tracing::debug!("workzone click at vertex {index}: {:?}", self.workzone);
        self.plan = None;
        self
    }

    fn segment_clicked(mut self, point: GeoPoint) -> Self {
        self.error = None;
        self.routes.clear();
        self.lanes.clear();
        self.selected_lane = None;
        self.workzone = self.workzone.reset();
        self.plan = None;
        self.pending_route = None;

        match self.segment_points[..] {
            [start] => {
                self.segment_points.push(point);
                let id = self.issue_ticket();
                tracing::info!("segment {:?} -> {:?} selected, route ticket {id}", start, point);
                self.pending_route = Some(RouteTicket {
                    id,
                    start,
                    end: point,
                });
            }
            _ => self.segment_points = vec![point],
        }
        self
    }

    fn search(mut self, query: String) -> Self {
        let query = query.trim().to_string();
        if query.is_empty() {
            return self;
        }
        let id = self.issue_ticket();
        self.pending_lookup = Some(LookupTicket { id, query });
        self.loading = true;
        self.error = None;
        self
    }

    fn generate(&mut self, geo: &impl GeoMath) {
        let Some(lane) = self.selected_lane.and_then(|idx| self.lanes.get(idx)) else {
            tracing::debug!("generate ignored: no lane selected");
            return;
        };
        match plan_tgs(&lane.path, self.workzone, geo) {
            Ok(plan) => {
                tracing::info!(
                    "TGS generated on lane {}: taper {} points, sign at vertex {}",
                    lane.lane_index,
                    plan.taper.path.len(),
                    plan.sign_idx
                );
                self.plan = Some(plan);
            }
            Err(err @ PlanError::PreconditionNotMet(_)) => {
                tracing::debug!("generate ignored: {err}");
            }
            Err(err) => {
                tracing::warn!("TGS planning failed: {err}");
                self.error = Some(err.to_string());
            }
        }
    }

    fn route_fetched(
        mut self,
        ticket: u64,
        result: Result<Route, ExternalRouteError>,
        geo: &impl GeoMath,
    ) -> Self {
        if self.pending_route.as_ref().map(|t| t.id) != Some(ticket) {
            tracing::debug!("dropping stale route response for ticket {ticket}");
            return self;
        }
        self.pending_route = None;
        self.selected_lane = None;
        self.workzone = self.workzone.reset();
        self.plan = None;

        let route = match result {
            Ok(route) => route,
            Err(err) => {
                tracing::warn!("route fetch failed: {err}");
                self.error = Some(
                    match err {
                        ExternalRouteError::NoGeometry => "No route found.",
                        _ => "Error fetching route.",
                    }
                    .to_string(),
                );
                return self;
            }
        };

        match generate_lanes(route.path(), geo) {
            Ok(lanes) => {
                self.lanes = lanes;
                self.routes.set(route);
            }
            Err(err) => {
                tracing::warn!("cannot derive lanes: {err}");
                self.error = Some("Route geometry is unusable.".to_string());
            }
        }
        self
    }

    fn place_found(
        mut self,
        ticket: u64,
        result: Result<Option<GeoPoint>, ExternalLookupError>,
    ) -> Self {
        if self.pending_lookup.as_ref().map(|t| t.id) != Some(ticket) {
            tracing::debug!("dropping stale lookup response for ticket {ticket}");
            return self;
        }
        self.pending_lookup = None;
        self.loading = false;
        match result {
            Ok(Some(position)) => self.focus = Some(position),
            Ok(None) => self.error = Some("No results found.".to_string()),
            Err(err) => {
                tracing::warn!("place lookup failed: {err}");
                self.error = Some("Error searching address.".to_string());
            }
        }
        self
    }

    fn issue_ticket(&mut self) -> u64 {
        self.next_ticket += 1;
        self.next_ticket
    }

    pub fn view(&self) -> SessionView {
        let mut messages = Vec::new();
        if let Some(lane) = self.selected_lane {
            messages.push(format!("Lane {} selected", lane + 1));
        }
        match self.workzone.selected_count() {
            1 => messages
                .push("Click a second point along the lane to define the workzone".to_string()),
            2 => messages.push("Workzone defined".to_string()),
            _ => {}
        }
        if self.plan.is_some() {
            messages.push("TGS generated: taper and Roadwork Ahead sign".to_string());
        }
        if self.loading {
            messages.push("Searching...".to_string());
        }

        SessionView {
            segment_points: self.segment_points.clone(),
            route: self.routes.route().map(|route| route.path().to_vec()),
            lanes: self.lanes.clone(),
            selected_lane: self.selected_lane,
            workzone: self.workzone,
            plan: self.plan.clone(),
            focus: self.focus,
            route_pending: self.pending_route.is_some(),
            loading: self.loading,
            can_generate: self.can_generate(),
            error: self.error.clone(),
            messages,
        }
    }

    /// Features for the map: route, lanes, workzone, taper and sign.
    pub fn features(&self) -> geojson::FeatureCollection {
        scheme_features(
            self.routes.route().map(Route::path),
            &self.lanes,
            self.selected_lane,
            self.workzone.range(),
            self.plan.as_ref(),
        )
    }
}
