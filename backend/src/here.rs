//! HERE routing and geocoding clients.

use std::future::Future;

use serde::Deserialize;

use crate::{
    config::ServerConfig,
    error::{ExternalLookupError, ExternalRouteError},
    models::GeoPoint,
    route::{Route, route_from_sections},
};

/// External route and place lookup.
///
/// Implementations are queried from async handlers; results may arrive after
/// the operator has moved on, so callers must check they are still wanted.
pub trait RouteProvider: Send + Sync {
    /// Car route between two points.
    fn fetch_route(
        &self,
        start: GeoPoint,
        end: GeoPoint,
    ) -> impl Future<Output = Result<Route, ExternalRouteError>> + Send;

    /// First candidate position for a free-text query, if any.
    fn lookup_place(
        &self,
        query: &str,
    ) -> impl Future<Output = Result<Option<GeoPoint>, ExternalLookupError>> + Send;
}

#[derive(Debug, Default, Deserialize)]
pub struct HereRoutesResponse {
    #[serde(default)]
    pub routes: Vec<HereRoute>,
}

#[derive(Debug, Default, Deserialize)]
pub struct HereRoute {
    #[serde(default)]
    pub sections: Vec<HereSection>,
}

#[derive(Debug, Default, Deserialize)]
pub struct HereSection {
    #[serde(default)]
    pub polyline: Option<String>,
}

impl HereRoutesResponse {
    /// Geometry of the first route, all sections joined.
    pub fn into_route(self) -> Result<Route, ExternalRouteError> {
        let route = self
            .routes
            .into_iter()
            .next()
            .ok_or(ExternalRouteError::NoGeometry)?;
        let encoded: Vec<String> = route
            .sections
            .into_iter()
            .filter_map(|section| section.polyline)
            .collect();
        route_from_sections(encoded.iter().map(String::as_str))
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct HereGeocodeResponse {
    #[serde(default)]
    pub items: Vec<HereGeocodeItem>,
}

#[derive(Debug, Deserialize)]
pub struct HereGeocodeItem {
    pub position: HerePosition,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct HerePosition {
    pub lat: f64,
    pub lng: f64,
}

impl HereGeocodeResponse {
    pub fn first_position(&self) -> Option<GeoPoint> {
        self.items.first().map(|item| GeoPoint {
            lon: item.position.lng,
            lat: item.position.lat,
        })
    }
}

#[derive(Clone)]
pub struct HereClient {
    http: reqwest::Client,
    api_key: String,
    routing_url: String,
    geocode_url: String,
}

impl HereClient {
    pub fn new(api_key: impl Into<String>, routing_url: &str, geocode_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.into(),
            routing_url: routing_url.trim_end_matches('/').to_string(),
            geocode_url: geocode_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &ServerConfig) -> Self {
        Self::new(
            config.here_api_key.clone(),
            &config.routing_url,
            &config.geocode_url,
        )
    }
}

impl RouteProvider for HereClient {
    async fn fetch_route(&self, start: GeoPoint, end: GeoPoint) -> Result<Route, ExternalRouteError> {
        tracing::info!("fetching route {:?} -> {:?}", start, end);
        let response: HereRoutesResponse = self
            .http
            .get(&self.routing_url)
            .query(&[
                ("transportMode", "car".to_string()),
                ("origin", format!("{},{}", start.lat, start.lon)),
                ("destination", format!("{},{}", end.lat, end.lon)),
                ("return", "polyline".to_string()),
                ("apiKey", self.api_key.clone()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let route = response.into_route()?;
        tracing::info!(
            "route has {} points, {:.0}m",
            route.path().len(),
            route.length_m()
        );
        Ok(route)
    }

    async fn lookup_place(&self, query: &str) -> Result<Option<GeoPoint>, ExternalLookupError> {
        tracing::info!("geocoding {query:?}");
        let response: HereGeocodeResponse = self
            .http
            .get(&self.geocode_url)
            .query(&[("q", query), ("apiKey", self.api_key.as_str())])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(response.first_position())
    }
}
