use std::f64::consts::{FRAC_PI_2, PI};

use crate::models::GeoPoint;

/// Mean earth radius, the same sphere the map client measures on.
pub const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// Joints whose miter would reach further than this multiple of the offset
/// are cut back to the bisector point.
const MAX_MITER_RATIO: f64 = 4.0;

/// Geometry backend used by lane generation, projection and planning.
///
/// Implementations must be deterministic: the same inputs always give the
/// same outputs, otherwise lanes would shift between renders.
pub trait GeoMath {
    /// Geodesic distance in meters.
    fn distance(&self, a: GeoPoint, b: GeoPoint) -> f64;

    /// Displace `path` perpendicular to its local bearing by `meters`.
    /// Positive values move to the right of the direction of travel.
    fn offset(&self, path: &[GeoPoint], meters: f64) -> Vec<GeoPoint>;

    /// Shortest distance in meters from `point` to any segment of `path`.
    fn distance_to_path(&self, path: &[GeoPoint], point: GeoPoint) -> f64 {
        match path {
            [] => f64::INFINITY,
            [single] => self.distance(*single, point),
            _ => path
                .windows(2)
                .map(|w| segment_distance_m(w[0], w[1], point))
                .fold(f64::INFINITY, f64::min),
        }
    }
}

/// Spherical earth model (haversine).
#[derive(Debug, Clone, Copy, Default)]
pub struct Spherical;

impl GeoMath for Spherical {
    fn distance(&self, a: GeoPoint, b: GeoPoint) -> f64 {
        haversine_m(a, b)
    }

    fn offset(&self, path: &[GeoPoint], meters: f64) -> Vec<GeoPoint> {
        offset_polyline(path, meters)
    }
}

pub fn haversine_m(a: GeoPoint, b: GeoPoint) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlat = (b.lat - a.lat).to_radians();
    let dlon = (b.lon - a.lon).to_radians();

    let sin_dlat = (dlat / 2.0).sin();
    let sin_dlon = (dlon / 2.0).sin();

    let h = sin_dlat * sin_dlat + lat1.cos() * lat2.cos() * sin_dlon * sin_dlon;
    2.0 * EARTH_RADIUS_M * h.sqrt().min(1.0).asin()
}

pub fn path_length_m(path: &[GeoPoint]) -> f64 {
    path.windows(2).map(|w| haversine_m(w[0], w[1])).sum()
}

/// Initial great-circle bearing from `a` to `b`, radians clockwise from north.
pub fn bearing_rad(a: GeoPoint, b: GeoPoint) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlon = (b.lon - a.lon).to_radians();

    let y = dlon.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * dlon.cos();
    y.atan2(x)
}

pub fn destination_point(start: GeoPoint, distance_m: f64, bearing_rad: f64) -> GeoPoint {
    let angular_distance = distance_m / EARTH_RADIUS_M;
    let lat1 = start.lat.to_radians();
    let lon1 = start.lon.to_radians();

    let lat2 = f64::asin(
        lat1.sin() * angular_distance.cos()
            + lat1.cos() * angular_distance.sin() * bearing_rad.cos(),
    );
    let lon2 = lon1
        + f64::atan2(
            bearing_rad.sin() * angular_distance.sin() * lat1.cos(),
            angular_distance.cos() - lat1.sin() * lat2.sin(),
        );

    GeoPoint {
        lon: normalize_longitude(lon2.to_degrees()),
        lat: lat2.to_degrees(),
    }
}

fn normalize_longitude(lon: f64) -> f64 {
    let mut normalized = lon;
    while normalized < -180.0 {
        normalized += 360.0;
    }
    while normalized > 180.0 {
        normalized -= 360.0;
    }
    normalized
}

/// Geodesic parallel offset of a polyline.
///
/// Every segment is shifted by a destination step perpendicular to its own
/// bearing, so the result follows the curvature of the input. Consecutive
/// shifted segments are joined at their intersection, computed in a tangent
/// plane at the shared vertex. Repeated vertices are dropped first, so the
/// output may have fewer points than the input.
pub fn offset_polyline(path: &[GeoPoint], meters: f64) -> Vec<GeoPoint> {
    if meters == 0.0 {
        return path.to_vec();
    }

    let mut points: Vec<GeoPoint> = Vec::with_capacity(path.len());
    for &point in path {
        if points.last().is_some_and(|&last| haversine_m(last, point) == 0.0) {
            continue;
        }
        points.push(point);
    }
    if points.len() < 2 {
        return points;
    }

    let shifted: Vec<(GeoPoint, GeoPoint)> = points
        .windows(2)
        .map(|w| shift_segment(w[0], w[1], meters))
        .collect();

    let mut result = Vec::with_capacity(points.len());
    result.push(shifted[0].0);
    for (idx, pair) in shifted.windows(2).enumerate() {
        result.push(join_shifted(points[idx + 1], pair[0], pair[1], meters));
    }
    result.push(shifted[shifted.len() - 1].1);
    result
}

fn shift_segment(a: GeoPoint, b: GeoPoint, meters: f64) -> (GeoPoint, GeoPoint) {
    let (distance, side) = if meters >= 0.0 {
        (meters, FRAC_PI_2)
    } else {
        (-meters, -FRAC_PI_2)
    };
    // Bearing at `b` is the reverse of the bearing back to `a`.
    let start_bearing = bearing_rad(a, b);
    let end_bearing = bearing_rad(b, a) + PI;
    (
        destination_point(a, distance, start_bearing + side),
        destination_point(b, distance, end_bearing + side),
    )
}

fn join_shifted(
    joint: GeoPoint,
    incoming: (GeoPoint, GeoPoint),
    outgoing: (GeoPoint, GeoPoint),
    meters: f64,
) -> GeoPoint {
    let (x1, y1) = to_local(joint, incoming.0);
    let (x2, y2) = to_local(joint, incoming.1);
    let (x3, y3) = to_local(joint, outgoing.0);
    let (x4, y4) = to_local(joint, outgoing.1);

    let denom = (x1 - x2) * (y3 - y4) - (y1 - y2) * (x3 - x4);
    if denom.abs() < 1e-9 {
        return incoming.1;
    }

    let t = ((x1 - x3) * (y3 - y4) - (y1 - y3) * (x3 - x4)) / denom;
    let ix = x1 + t * (x2 - x1);
    let iy = y1 + t * (y2 - y1);
    if ix.hypot(iy) <= MAX_MITER_RATIO * meters.abs() {
        return from_local(joint, (ix, iy));
    }

    // Near-reversal: keep the vertex at the offset distance on the bisector.
    let (mx, my) = ((x2 + x3) / 2.0, (y2 + y3) / 2.0);
    let len = mx.hypot(my);
    if len < 1e-9 {
        return incoming.1;
    }
    let scale = meters.abs() / len;
    from_local(joint, (mx * scale, my * scale))
}

/// Equirectangular projection around `origin`, in meters (x east, y north).
fn to_local(origin: GeoPoint, point: GeoPoint) -> (f64, f64) {
    let mut dlon = point.lon - origin.lon;
    if dlon > 180.0 {
        dlon -= 360.0;
    } else if dlon < -180.0 {
        dlon += 360.0;
    }
    let x = dlon.to_radians() * origin.lat.to_radians().cos() * EARTH_RADIUS_M;
    let y = (point.lat - origin.lat).to_radians() * EARTH_RADIUS_M;
    (x, y)
}

fn from_local(origin: GeoPoint, (x, y): (f64, f64)) -> GeoPoint {
    let cos_lat = origin.lat.to_radians().cos().max(1e-12);
    GeoPoint {
        lon: normalize_longitude(origin.lon + (x / (EARTH_RADIUS_M * cos_lat)).to_degrees()),
        lat: origin.lat + (y / EARTH_RADIUS_M).to_degrees(),
    }
}

fn segment_distance_m(a: GeoPoint, b: GeoPoint, point: GeoPoint) -> f64 {
    let (ax, ay) = to_local(point, a);
    let (bx, by) = to_local(point, b);
    let (dx, dy) = (bx - ax, by - ay);
    let len_sq = dx * dx + dy * dy;
    if len_sq == 0.0 {
        return haversine_m(a, point);
    }
    let t = (-(ax * dx + ay * dy) / len_sq).clamp(0.0, 1.0);
    (ax + t * dx).hypot(ay + t * dy)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MELBOURNE: GeoPoint = GeoPoint {
        lon: 144.9631,
        lat: -37.8136,
    };

    #[test]
    fn test_haversine_same_point() {
        assert_eq!(haversine_m(MELBOURNE, MELBOURNE), 0.0);
    }

    #[test]
    fn test_haversine_1km_north() {
        // 1km north ≈ 0.009° at any latitude
        let dist = haversine_m(GeoPoint::new(5.0, 45.0), GeoPoint::new(5.0, 45.009));
        assert!((dist - 1000.0).abs() < 10.0);
    }

    #[test]
    fn test_haversine_known_distance() {
        // Paris to London, ~343 km
        let paris = GeoPoint::new(2.3522, 48.8566);
        let london = GeoPoint::new(-0.1278, 51.5074);
        assert!((haversine_m(paris, london) - 343_000.0).abs() < 5_000.0);
    }

    #[test]
    fn test_path_length_empty_and_single() {
        assert_eq!(path_length_m(&[]), 0.0);
        assert_eq!(path_length_m(&[MELBOURNE]), 0.0);
    }

    #[test]
    fn destination_point_travels_requested_distance() {
        let east = destination_point(MELBOURNE, 250.0, FRAC_PI_2);
        assert!((haversine_m(MELBOURNE, east) - 250.0).abs() < 1e-6);
        assert!((bearing_rad(MELBOURNE, east) - FRAC_PI_2).abs() < 1e-4);
    }

    #[test]
    fn zero_offset_returns_input() {
        let path = vec![MELBOURNE, destination_point(MELBOURNE, 100.0, 0.0)];
        assert_eq!(offset_polyline(&path, 0.0), path);
    }

    #[test]
    fn positive_offset_moves_right_of_travel() {
        // Travelling east, the right-hand side is south.
        let path = vec![MELBOURNE, destination_point(MELBOURNE, 200.0, FRAC_PI_2)];
        let shifted = offset_polyline(&path, 3.5);

        assert_eq!(shifted.len(), 2);
        for (original, moved) in path.iter().zip(&shifted) {
            assert!((haversine_m(*original, *moved) - 3.5).abs() < 1e-6);
            assert!(moved.lat < original.lat);
        }

        let left = offset_polyline(&path, -3.5);
        assert!(left.iter().zip(&path).all(|(l, p)| l.lat > p.lat));
    }

    #[test]
    fn right_angle_joint_uses_miter_point() {
        let corner = destination_point(MELBOURNE, 100.0, FRAC_PI_2);
        let path = vec![MELBOURNE, corner, destination_point(corner, 100.0, PI)];
        let shifted = offset_polyline(&path, 3.5);

        assert_eq!(shifted.len(), 3);
        let miter = haversine_m(corner, shifted[1]);
        assert!((miter - 3.5 * 2f64.sqrt()).abs() < 0.01, "miter {miter}");
    }

    #[test]
    fn repeated_vertices_are_dropped() {
        let end = destination_point(MELBOURNE, 80.0, 0.3);
        let path = vec![MELBOURNE, MELBOURNE, end, end];
        assert_eq!(offset_polyline(&path, -3.5).len(), 2);
        assert_eq!(offset_polyline(&[MELBOURNE, MELBOURNE], 3.5).len(), 1);
    }

    #[test]
    fn distance_to_path_measures_to_segment_interior() {
        let end = destination_point(MELBOURNE, 100.0, FRAC_PI_2);
        let middle = destination_point(MELBOURNE, 50.0, FRAC_PI_2);
        let probe = destination_point(middle, 4.0, 0.0);
        let dist = Spherical.distance_to_path(&[MELBOURNE, end], probe);
        assert!((dist - 4.0).abs() < 0.01, "distance {dist}");
        assert_eq!(Spherical.distance_to_path(&[], probe), f64::INFINITY);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn valid_point() -> impl Strategy<Value = GeoPoint> {
            (-80.0..=80.0, -179.0..=179.0).prop_map(|(lat, lon)| GeoPoint { lon, lat })
        }

        proptest! {
            #[test]
            fn prop_haversine_symmetric(a in valid_point(), b in valid_point()) {
                prop_assert!((haversine_m(a, b) - haversine_m(b, a)).abs() < 1e-6);
            }

            #[test]
            fn prop_haversine_triangle_inequality(
                a in valid_point(),
                b in valid_point(),
                c in valid_point()
            ) {
                prop_assert!(haversine_m(a, c) <= haversine_m(a, b) + haversine_m(b, c) + 1e-3);
            }

            #[test]
            fn prop_segment_offset_keeps_distance(
                start in valid_point(),
                length in 10.0..5_000.0f64,
                bearing in 0.0..(2.0 * PI),
                meters in -20.0..20.0f64
            ) {
                prop_assume!(meters.abs() > 0.01);
                let path = vec![start, destination_point(start, length, bearing)];
                let shifted = offset_polyline(&path, meters);
                prop_assert_eq!(shifted.len(), 2);
                for (original, moved) in path.iter().zip(&shifted) {
                    prop_assert!((haversine_m(*original, *moved) - meters.abs()).abs() < 1e-4);
                }
            }
        }
    }
}
