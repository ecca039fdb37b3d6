//! `GeoJSON` export of a map payload.
//!
//! Incidents become `Point` features, the route a `LineString`, and the
//! route endpoints two more points. A route of fewer than two positions
//! (identical endpoints) exports only its endpoints. Every feature carries a `kind`
//! property so consumers can style the layers apart.

use crime_route_geography_models::Coordinate;
use crime_route_map_models::{EndpointMarker, IncidentMarker, MapPayload, RouteOverlay};
use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value};
use serde_json::json;

/// Converts a payload to a `GeoJSON` feature collection.
#[must_use]
pub fn to_geojson(payload: &MapPayload) -> FeatureCollection {
    let mut features: Vec<Feature> = payload.markers.iter().map(incident_feature).collect();

    if let Some(route) = &payload.route {
        features.extend(route_feature(route));
        features.push(endpoint_feature(&route.start));
        features.push(endpoint_feature(&route.end));
    }

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

fn position(coord: Coordinate) -> Vec<f64> {
    vec![coord.longitude, coord.latitude]
}

fn feature(value: Value, properties: JsonObject) -> Feature {
    Feature {
        bbox: None,
        geometry: Some(Geometry::new(value)),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}

fn incident_feature(marker: &IncidentMarker) -> Feature {
    let mut properties = JsonObject::new();
    properties.insert("kind".to_string(), json!("incident"));
    properties.insert("id".to_string(), json!(marker.id));
    properties.insert("crimeType".to_string(), json!(marker.title));
    properties.insert("color".to_string(), json!(marker.color.css()));
    properties.insert("detail".to_string(), json!(marker.detail));

    feature(Value::Point(position(marker.coordinate)), properties)
}

fn route_feature(route: &RouteOverlay) -> Option<Feature> {
    if route.polyline.len() < 2 {
        return None;
    }

    let mut properties = JsonObject::new();
    properties.insert("kind".to_string(), json!("route"));
    properties.insert("distanceKm".to_string(), json!(route.distance_km));
    properties.insert("pathLengthKm".to_string(), json!(route.path_length_km));
    properties.insert("label".to_string(), json!(route.distance_label));
    properties.insert("stroke".to_string(), json!(route.style.color));
    properties.insert("stroke-width".to_string(), json!(route.style.weight));
    properties.insert("stroke-opacity".to_string(), json!(route.style.opacity));

    let line = route.polyline.iter().copied().map(position).collect();
    Some(feature(Value::LineString(line), properties))
}

fn endpoint_feature(marker: &EndpointMarker) -> Feature {
    let mut properties = JsonObject::new();
    properties.insert("kind".to_string(), json!(marker.endpoint.as_ref()));
    properties.insert("label".to_string(), json!(marker.label));

    feature(Value::Point(position(marker.coordinate)), properties)
}

#[cfg(test)]
mod tests {
    use crime_route_geography_models::RouteResult;
    use crime_route_incident_models::{ArrestMade, CrimeRecord};
    use crime_route_map_models::MapSettings;

    use super::*;
    use crate::tests::record;
    use crate::{RouteInput, assemble};

    #[test]
    fn exports_incidents_route_and_endpoints() {
        let start = Coordinate::new(13.0418, 80.2341);
        let end = Coordinate::new(13.0067, 80.2206);
        let theft = record(0, "Theft", ArrestMade::No);
        let records: [&CrimeRecord; 1] = [&theft];
        let result = RouteResult::found(vec![start, end], 4.2, 5.0);
        let payload = assemble(
            &MapSettings::default(),
            &records,
            Some(RouteInput {
                result: &result,
                start,
                end,
            }),
        );

        let collection = to_geojson(&payload);
        assert_eq!(collection.features.len(), 4);

        let kinds: Vec<&str> = collection
            .features
            .iter()
            .filter_map(|f| f.property("kind").and_then(serde_json::Value::as_str))
            .collect();
        assert_eq!(kinds, vec!["incident", "route", "start", "end"]);

        let Some(Value::LineString(line)) =
            collection.features[1].geometry.as_ref().map(|g| &g.value)
        else {
            panic!("route feature is not a LineString");
        };
        assert_eq!(line[0], vec![80.2341, 13.0418]);
    }

    #[test]
    fn single_point_route_exports_endpoints_only() {
        let here = Coordinate::new(13.0418, 80.2341);
        let result = RouteResult::found(vec![here], 0.0, 0.0);
        let payload = assemble(
            &MapSettings::default(),
            &[],
            Some(RouteInput {
                result: &result,
                start: here,
                end: here,
            }),
        );
        assert!(payload.route.is_some());

        let collection = to_geojson(&payload);
        let kinds: Vec<&str> = collection
            .features
            .iter()
            .filter_map(|f| f.property("kind").and_then(serde_json::Value::as_str))
            .collect();
        assert_eq!(kinds, vec!["start", "end"]);
        assert!(collection.features.iter().all(|f| matches!(
            f.geometry.as_ref().map(|g| &g.value),
            Some(Value::Point(_))
        )));
    }

    #[test]
    fn no_route_exports_only_incidents() {
        let theft = record(0, "Theft", ArrestMade::Yes);
        let payload = assemble(&MapSettings::default(), &[&theft], None);
        let collection = to_geojson(&payload);

        assert_eq!(collection.features.len(), 1);
        assert_eq!(
            collection.features[0].property("color"),
            Some(&serde_json::json!("green"))
        );
    }
}
