//! Taper and advance-warning sign placement.
//!
//! Ascending vertex index is the direction of travel, so "upstream" of the
//! workzone means walking towards index 0. Both placements are found by
//! accumulating geodesic segment lengths backwards from a start vertex until
//! a threshold distance is reached.

use crate::{
    error::PlanError,
    geo_math::GeoMath,
    models::{GeoPoint, SIGN_LABEL, SignPlacement, TaperPlan, TgsPlan},
    workzone::WorkzoneSelector,
};

/// Length of the merge taper in meters.
pub const TAPER_LENGTH_M: f64 = 60.0;
/// Distance of the advance warning sign before the taper start, in meters.
pub const SIGN_DISTANCE_M: f64 = 100.0;

/// Result of one backward walk.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UpstreamWalk {
    pub index: usize,
    /// Distance accumulated when the walk stopped.
    pub walked_m: f64,
    /// The walk hit index 0 before reaching the threshold.
    pub exhausted: bool,
}

/// Walk from `from` towards index 0 until `threshold_m` is covered.
///
/// Returns the vertex where the threshold was first met or exceeded. When the
/// lane runs out first the walk reports its start vertex. A `from` past the
/// end of `path` starts at the last vertex.
pub fn walk_upstream(
    path: &[GeoPoint],
    from: usize,
    threshold_m: f64,
    geo: &impl GeoMath,
) -> UpstreamWalk {
    let start = from.min(path.len().saturating_sub(1));
    let mut walked_m = 0.0;
    let mut i = start;
    while i > 0 {
        walked_m += geo.distance(path[i], path[i - 1]);
        if walked_m >= threshold_m {
            return UpstreamWalk {
                index: i - 1,
                walked_m,
                exhausted: false,
            };
        }
        i -= 1;
    }
    UpstreamWalk {
        index: start,
        walked_m,
        exhausted: true,
    }
}

/// Plan the taper and sign for a workzone on `lane`.
///
/// Requires `selector` to hold two bounds that both lie on the lane.
pub fn plan_tgs(
    lane: &[GeoPoint],
    selector: WorkzoneSelector,
    geo: &impl GeoMath,
) -> Result<TgsPlan, PlanError> {
    let workzone = selector
        .range()
        .ok_or(PlanError::PreconditionNotMet("workzone needs two bounds"))?;
    if workzone.end >= lane.len() {
        return Err(PlanError::PreconditionNotMet(
            "workzone bound lies outside the lane",
        ));
    }

    let taper_walk = walk_upstream(lane, workzone.start, TAPER_LENGTH_M, geo);
    let taper_start_idx = taper_walk.index;
    let taper = TaperPlan {
        path: lane[taper_start_idx..=workzone.start].to_vec(),
    };

    let sign_walk = walk_upstream(lane, taper_start_idx, SIGN_DISTANCE_M, geo);
    let sign_idx = sign_walk.index;
    let sign = SignPlacement {
        coordinate: lane[sign_idx],
        label: SIGN_LABEL.to_string(),
    };

    if taper_walk.exhausted {
        tracing::warn!(
            "only {:.1}m of lane upstream of workzone start {}, taper needs {TAPER_LENGTH_M}m",
            taper_walk.walked_m,
            workzone.start
        );
    }
    if sign_walk.exhausted {
        tracing::warn!(
            "only {:.1}m of lane upstream of taper start {}, sign needs {SIGN_DISTANCE_M}m",
            sign_walk.walked_m,
            taper_start_idx
        );
    }
    tracing::debug!(
        "planned TGS: workzone {}..={}, taper from {}, sign at {}",
        workzone.start,
        workzone.end,
        taper_start_idx,
        sign_idx
    );

    Ok(TgsPlan {
        workzone,
        taper_start_idx,
        sign_idx,
        taper,
        sign,
        taper_exhausted: taper_walk.exhausted,
        sign_exhausted: sign_walk.exhausted,
    })
}

#[cfg(test)]
mod tests {
    use std::f64::consts::FRAC_PI_2;

    use super::*;
    use crate::{
        geo_math::{Spherical, destination_point},
        models::WorkzoneRange,
    };

    /// Geometry backend with exact, caller-chosen segment lengths.
    struct FixedSteps(f64);

    impl GeoMath for FixedSteps {
        fn distance(&self, a: GeoPoint, b: GeoPoint) -> f64 {
            if a == b { 0.0 } else { self.0 }
        }

        fn offset(&self, path: &[GeoPoint], _meters: f64) -> Vec<GeoPoint> {
            path.to_vec()
        }
    }

    fn evenly_spaced(count: usize) -> Vec<GeoPoint> {
        (0..count)
            .map(|i| GeoPoint::new(144.96 + i as f64 * 0.001, -37.81))
            .collect()
    }

    fn bounded(first: usize, second: usize) -> WorkzoneSelector {
        WorkzoneSelector::Bounded { first, second }
    }

    #[test]
    fn exhausted_walks_fall_back_to_start_vertex() {
        // 5 vertices 30m apart, workzone (2, 4): the taper reaches exactly 60m
        // at index 0, leaving nothing upstream for the sign.
        let lane = evenly_spaced(5);
        let plan = plan_tgs(&lane, bounded(2, 4), &FixedSteps(30.0)).unwrap();

        assert_eq!(plan.workzone, WorkzoneRange { start: 2, end: 4 });
        assert_eq!(plan.taper_start_idx, 0);
        assert_eq!(plan.taper.path, lane[0..=2].to_vec());
        assert!(!plan.taper_exhausted);

        assert_eq!(plan.sign_idx, 0);
        assert_eq!(plan.sign.coordinate, lane[0]);
        assert_eq!(plan.sign.label, "Roadwork Ahead");
        assert!(plan.sign_exhausted);
    }

    #[test]
    fn geodesic_lane_matches_fixed_step_scenario() {
        let start = GeoPoint::new(144.9631, -37.8136);
        let mut lane: Vec<GeoPoint> = (0..5)
            .map(|i| destination_point(start, 30.0 * i as f64, FRAC_PI_2))
            .collect();
        // Two 30m hops can round to just under 60m; nudge vertex 0 upstream.
        lane[0] = destination_point(start, -0.01, FRAC_PI_2);

        let plan = plan_tgs(&lane, bounded(4, 2), &Spherical).unwrap();
        assert_eq!(plan.taper_start_idx, 0);
        assert_eq!(plan.sign_idx, 0);
        assert_eq!(plan.taper.path.len(), 3);
    }

    #[test]
    fn taper_too_short_degenerates_to_workzone_start() {
        let lane = evenly_spaced(4);
        let plan = plan_tgs(&lane, bounded(3, 1), &FixedSteps(20.0)).unwrap();

        assert_eq!(plan.taper_start_idx, 1);
        assert_eq!(plan.taper.path, vec![lane[1]]);
        assert!(plan.taper_exhausted);
        assert_eq!(plan.sign_idx, 1);
    }

    #[test]
    fn long_lane_places_taper_and_sign_upstream() {
        let lane = evenly_spaced(20);
        let plan = plan_tgs(&lane, bounded(15, 18), &FixedSteps(10.0)).unwrap();

        assert_eq!(plan.taper_start_idx, 9);
        assert_eq!(plan.taper.path, lane[9..=15].to_vec());
        // 100m more upstream: ten 10m hops from index 9 would need index -1.
        assert_eq!(plan.sign_idx, 9);
        assert!(plan.sign_exhausted);

        let plan = plan_tgs(&evenly_spaced(30), bounded(25, 28), &FixedSteps(10.0)).unwrap();
        assert_eq!(plan.taper_start_idx, 19);
        assert_eq!(plan.sign_idx, 9);
        assert!(!plan.sign_exhausted);
    }

    #[test]
    fn walk_from_past_the_end_starts_at_last_vertex() {
        let lane = evenly_spaced(4);
        let walk = walk_upstream(&lane, 10, 500.0, &FixedSteps(10.0));
        assert_eq!(walk.index, 3);
        assert_eq!(walk.walked_m, 30.0);
        assert!(walk.exhausted);

        let walk = walk_upstream(&lane, 10, 15.0, &FixedSteps(10.0));
        assert_eq!(walk.index, 1);
        assert!(!walk.exhausted);
    }

    #[test]
    fn zero_length_segments_contribute_nothing() {
        let p = GeoPoint::new(144.96, -37.81);
        let lane = vec![p, p, p, p];
        let plan = plan_tgs(&lane, bounded(3, 2), &Spherical).unwrap();
        assert_eq!(plan.taper_start_idx, 2);
        assert_eq!(plan.sign_idx, 2);
    }

    #[test]
    fn requires_two_bounds_inside_lane() {
        let lane = evenly_spaced(5);
        assert!(matches!(
            plan_tgs(&lane, WorkzoneSelector::Empty, &Spherical),
            Err(PlanError::PreconditionNotMet(_))
        ));
        assert!(matches!(
            plan_tgs(&lane, WorkzoneSelector::OneSelected { index: 2 }, &Spherical),
            Err(PlanError::PreconditionNotMet(_))
        ));
        assert!(matches!(
            plan_tgs(&lane, bounded(2, 5), &Spherical),
            Err(PlanError::PreconditionNotMet(_))
        ));
    }

    #[test]
    fn planning_is_repeatable() {
        let lane = evenly_spaced(12);
        let first = plan_tgs(&lane, bounded(9, 7), &Spherical).unwrap();
        let second = plan_tgs(&lane, bounded(9, 7), &Spherical).unwrap();
        assert_eq!(first, second);
    }

    mod proptests {
        use super::*;
        use crate::geo_math::path_length_m;
        use proptest::prelude::*;

        fn jittered_lane() -> impl Strategy<Value = Vec<GeoPoint>> {
            prop::collection::vec((0.0..40.0f64, -0.6..0.6f64), 2..40).prop_map(|hops| {
                let mut point = GeoPoint::new(144.9631, -37.8136);
                let mut lane = vec![point];
                for (length, turn) in hops.into_iter().skip(1) {
                    point = destination_point(point, length, FRAC_PI_2 + turn);
                    lane.push(point);
                }
                lane
            })
        }

        proptest! {
            #[test]
            fn prop_indices_are_ordered_and_thresholds_hold(
                lane in jittered_lane(),
                a in 0usize..40,
                b in 0usize..40
            ) {
                let len = lane.len();
                let (a, b) = (a % len, b % len);
                prop_assume!(a != b);

                let plan = plan_tgs(&lane, bounded(a, b), &Spherical).unwrap();
                let WorkzoneRange { start, end } = plan.workzone;
                prop_assert!(plan.taper_start_idx <= start);
                prop_assert!(plan.sign_idx <= plan.taper_start_idx);
                prop_assert!(start < end && end < len);

                let taper_len = path_length_m(&lane[plan.taper_start_idx..=start]);
                if plan.taper_exhausted {
                    prop_assert_eq!(plan.taper_start_idx, start);
                    prop_assert!(path_length_m(&lane[..=start]) < TAPER_LENGTH_M);
                } else {
                    prop_assert!(taper_len >= TAPER_LENGTH_M);
                }

                let sign_len = path_length_m(&lane[plan.sign_idx..=plan.taper_start_idx]);
                if plan.sign_exhausted {
                    prop_assert_eq!(plan.sign_idx, plan.taper_start_idx);
                    prop_assert!(path_length_m(&lane[..=plan.taper_start_idx]) < SIGN_DISTANCE_M);
                } else {
                    prop_assert!(sign_len >= SIGN_DISTANCE_M);
                }
            }
        }
    }
}
