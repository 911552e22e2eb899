use crate::{
    geo_math::GeoMath,
    models::{GeoPoint, Lane},
};

/// Index of the vertex of `path` closest to `point`.
///
/// Ties resolve to the smallest index. `None` only for an empty path.
pub fn nearest_index(path: &[GeoPoint], point: GeoPoint, geo: &impl GeoMath) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (idx, vertex) in path.iter().enumerate() {
        let dist = geo.distance(*vertex, point);
        match best {
            Some((_, min_dist)) if dist >= min_dist => {}
            _ => best = Some((idx, dist)),
        }
    }
    best.map(|(idx, _)| idx)
}

/// Which lane, if any, a click at `point` hits.
///
/// Returns the lane whose line lies closest to the point, provided it is
/// within `tolerance_m`. Ties go to the lower lane index.
pub fn nearest_lane(
    lanes: &[Lane],
    point: GeoPoint,
    tolerance_m: f64,
    geo: &impl GeoMath,
) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (idx, lane) in lanes.iter().enumerate() {
        let dist = geo.distance_to_path(&lane.path, point);
        if dist > tolerance_m {
            continue;
        }
        match best {
            Some((_, min_dist)) if dist >= min_dist => {}
            _ => best = Some((idx, dist)),
        }
    }
    best.map(|(idx, _)| idx)
}
