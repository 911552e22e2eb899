use thiserror::Error;

use crate::polyline::PolylineError;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlanError {
    #[error("route geometry needs at least 2 points, got {points}")]
    InvalidRouteGeometry { points: usize },
    #[error("cannot plan a TGS: {0}")]
    PreconditionNotMet(&'static str),
}

#[derive(Debug, Error)]
pub enum ExternalRouteError {
    #[error("routing request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("routing response carries no usable geometry")]
    NoGeometry,
    #[error("routing geometry could not be decoded: {0}")]
    Polyline(#[from] PolylineError),
}

#[derive(Debug, Error)]
pub enum ExternalLookupError {
    #[error("place lookup failed: {0}")]
    Http(#[from] reqwest::Error),
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to build GPX document: {0}")]
    Gpx(#[from] gpx::errors::GpxError),
}
