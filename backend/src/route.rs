use crate::{
    error::{ExternalRouteError, PlanError},
    geo_math::path_length_m,
    models::GeoPoint,
    polyline::decode_polyline,
};

/// Route polyline for one origin/destination pair. Always has at least
/// two points.
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    path: Vec<GeoPoint>,
}

impl Route {
    pub fn new(path: Vec<GeoPoint>) -> Result<Self, PlanError> {
        if path.len() < 2 {
            return Err(PlanError::InvalidRouteGeometry { points: path.len() });
        }
        Ok(Self { path })
    }

    pub fn path(&self) -> &[GeoPoint] {
        &self.path
    }

    pub fn into_path(self) -> Vec<GeoPoint> {
        self.path
    }

    pub fn length_m(&self) -> f64 {
        path_length_m(&self.path)
    }
}

/// Holds the active route. A new route replaces the old one wholesale.
#[derive(Debug, Clone, Default)]
pub struct RouteModel {
    active: Option<Route>,
}

impl RouteModel {
    pub fn route(&self) -> Option<&Route> {
        self.active.as_ref()
    }

    pub fn set(&mut self, route: Route) {
        self.active = Some(route);
    }

    pub fn clear(&mut self) {
        self.active = None;
    }
}

/// Decode and join the encoded sections of one routing result.
///
/// Sections are concatenated in order; a section that starts where the
/// previous one ended does not repeat the shared vertex.
pub fn route_from_sections<'a>(
    sections: impl IntoIterator<Item = &'a str>,
) -> Result<Route, ExternalRouteError> {
    let mut path: Vec<GeoPoint> = Vec::new();
    for encoded in sections {
        let decoded = decode_polyline(encoded)?;
        let skip = match (path.last(), decoded.first()) {
            (Some(last), Some(first)) if last == first => 1,
            _ => 0,
        };
        path.extend(decoded.into_iter().skip(skip));
    }

    Route::new(path).map_err(|_| ExternalRouteError::NoGeometry)
}
