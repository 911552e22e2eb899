//! GeoJSON features for the map renderer.

use geo_types::{LineString, Point};
use geojson::{Feature, FeatureCollection, Geometry, JsonObject};

use crate::models::{GeoPoint, Lane, TgsPlan, WorkzoneRange};

pub fn scheme_features(
    route: Option<&[GeoPoint]>,
    lanes: &[Lane],
    selected_lane: Option<usize>,
    workzone: Option<WorkzoneRange>,
    plan: Option<&TgsPlan>,
) -> FeatureCollection {
    let mut features = Vec::new();

    if let Some(route) = route {
        features.push(line_feature(route, properties("route")));
    }

    for lane in lanes {
        let mut props = properties("lane");
        props.insert("laneIdx".to_string(), lane.lane_index.into());
        props.insert("offsetMeters".to_string(), lane.offset_meters.into());
        props.insert(
            "selected".to_string(),
            (selected_lane == Some(lane.lane_index)).into(),
        );
        features.push(line_feature(&lane.path, props));
    }

    let selected_path = selected_lane
        .and_then(|idx| lanes.get(idx))
        .map(|lane| lane.path.as_slice());
    if let (Some(path), Some(range)) = (selected_path, workzone) {
        if let Some(slice) = path.get(range.start..=range.end) {
            features.push(line_feature(slice, properties("workzone")));
        }
    }

    if let Some(plan) = plan {
        features.push(line_feature(&plan.taper.path, properties("taper")));

        let mut props = properties("sign");
        props.insert("label".to_string(), plan.sign.label.clone().into());
        let point = Point::new(plan.sign.coordinate.lon, plan.sign.coordinate.lat);
        features.push(feature(Geometry::new(geojson::Value::from(&point)), props));
    }

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

fn properties(kind: &str) -> JsonObject {
    let mut props = JsonObject::new();
    props.insert("kind".to_string(), kind.into());
    props
}

fn line_feature(path: &[GeoPoint], props: JsonObject) -> Feature {
    let line: LineString<f64> = path
        .iter()
        .map(|p| (p.lon, p.lat))
        .collect::<Vec<_>>()
        .into();
    feature(Geometry::new(geojson::Value::from(&line)), props)
}

fn feature(geometry: Geometry, props: JsonObject) -> Feature {
    Feature {
        bbox: None,
        geometry: Some(geometry),
        id: None,
        properties: Some(props),
        foreign_members: None,
    }
}
