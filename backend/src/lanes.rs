use crate::{
    error::PlanError,
    geo_math::GeoMath,
    models::{GeoPoint, Lane},
};

/// Lane count is fixed; it is not derived from road data.
pub const NUM_LANES: usize = 3;
/// Lane width in meters.
pub const LANE_WIDTH_M: f64 = 3.5;

/// Signed lateral offset of lane `index`, symmetric about the centerline.
pub fn lane_offset_m(index: usize) -> f64 {
    (index as f64 - (NUM_LANES as f64 - 1.0) / 2.0) * LANE_WIDTH_M
}

/// Derive the `NUM_LANES` parallel lanes of a route polyline.
pub fn generate_lanes(route: &[GeoPoint], geo: &impl GeoMath) -> Result<Vec<Lane>, PlanError> {
    if route.len() < 2 {
        return Err(PlanError::InvalidRouteGeometry {
            points: route.len(),
        });
    }

    let lanes = (0..NUM_LANES)
        .map(|lane_index| {
            let offset_meters = lane_offset_m(lane_index);
            let path = geo.offset(route, offset_meters);
            if path.len() < 2 {
                return Err(PlanError::InvalidRouteGeometry { points: path.len() });
            }
            Ok(Lane {
                lane_index,
                offset_meters,
                path,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    tracing::debug!(
        "generated {} lanes from {} route points ({})",
        lanes.len(),
        route.len(),
        lanes
            .iter()
            .map(|lane| format!("{:+.2}m/{}pts", lane.offset_meters, lane.path.len()))
            .collect::<Vec<_>>()
            .join(", ")
    );

    Ok(lanes)
}
