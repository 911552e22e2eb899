use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use geo_types::Point;
use gpx::{Gpx, GpxVersion, Track, TrackSegment, Waypoint};

use crate::error::ExportError;
use crate::models::{GeoPoint, TgsPlan};

/// GPX 1.1 document of a plan, base64 encoded.
///
/// Contains a "taper" track, a "workzone" track cut from `lane`, and the
/// sign as a named waypoint.
pub fn encode_plan_as_gpx(lane: &[GeoPoint], plan: &TgsPlan) -> Result<String, ExportError> {
    let mut gpx = Gpx {
        version: GpxVersion::Gpx11,
        creator: Some("tgs_planner".into()),
        ..Default::default()
    };

    gpx.tracks.push(track("taper", &plan.taper.path));
    if let Some(workzone) = lane.get(plan.workzone.start..=plan.workzone.end) {
        gpx.tracks.push(track("workzone", workzone));
    }

    let mut sign = to_waypoint(&plan.sign.coordinate);
    sign.name = Some(plan.sign.label.clone());
    gpx.waypoints.push(sign);

    let mut buffer = Vec::new();
    gpx::write(&gpx, &mut buffer)?;
    Ok(BASE64.encode(buffer))
}

fn track(name: &str, path: &[GeoPoint]) -> Track {
    let mut track = Track {
        name: Some(name.into()),
        ..Default::default()
    };
    let mut segment = TrackSegment::new();
    for waypoint in path.iter().map(to_waypoint) {
        segment.points.push(waypoint);
    }
    track.segments.push(segment);
    track
}

fn to_waypoint(coord: &GeoPoint) -> Waypoint {
    Waypoint::new(Point::new(coord.lon, coord.lat))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{SIGN_LABEL, SignPlacement, TaperPlan, WorkzoneRange};

    #[test]
    fn gpx_contains_tracks_and_sign() {
        let lane: Vec<GeoPoint> = (0..5)
            .map(|i| GeoPoint::new(144.96 + i as f64 * 0.0004, -37.81))
            .collect();
        let plan = TgsPlan {
            workzone: WorkzoneRange { start: 2, end: 4 },
            taper_start_idx: 0,
            sign_idx: 0,
            taper: TaperPlan {
                path: lane[0..=2].to_vec(),
            },
            sign: SignPlacement {
                coordinate: lane[0],
                label: SIGN_LABEL.to_string(),
            },
            taper_exhausted: false,
            sign_exhausted: true,
        };

        let encoded = encode_plan_as_gpx(&lane, &plan).unwrap();
        let xml = String::from_utf8(BASE64.decode(encoded).unwrap()).unwrap();
        let parsed = gpx::read(xml.as_bytes()).unwrap();

        assert_eq!(parsed.tracks.len(), 2);
        assert_eq!(parsed.tracks[0].name.as_deref(), Some("taper"));
        assert_eq!(parsed.tracks[0].segments[0].points.len(), 3);
        assert_eq!(parsed.tracks[1].segments[0].points.len(), 3);
        assert_eq!(parsed.waypoints[0].name.as_deref(), Some("Roadwork Ahead"));
    }
}
