#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Presentation assembler.
//!
//! Turns filtered incidents and an optional route into a [`MapPayload`].
//! Pure aggregation: inputs are borrowed and never modified.

pub mod export;

use std::collections::BTreeMap;

use crime_route_geography_models::{Coordinate, Endpoint, RouteError, RouteResult};
use crime_route_incident_models::CrimeRecord;
use crime_route_map_models::{
    CrimeTypeCount, EndpointMarker, HeatPoint, Heatmap, IncidentMarker, MapPayload, MapSettings,
    MarkerColor, Notice, PolylineStyle, RouteOverlay, Summary,
};

pub use export::to_geojson;

/// A route together with the locations it was requested between.
#[derive(Debug, Clone, Copy)]
pub struct RouteInput<'a> {
    /// Resolver output.
    pub result: &'a RouteResult,
    /// Geocoded start location.
    pub start: Coordinate,
    /// Geocoded destination.
    pub end: Coordinate,
}

/// Builds the map payload.
///
/// A route overlay is added only when `route` has a non-empty path. A
/// failed route produces an error notice instead; the incidents are still
/// drawn.
#[must_use]
pub fn assemble(
    settings: &MapSettings,
    records: &[&CrimeRecord],
    route: Option<RouteInput<'_>>,
) -> MapPayload {
    let heatmap = Heatmap {
        radius: settings.heatmap_radius,
        blur: settings.heatmap_blur,
        points: records
            .iter()
            .map(|r| HeatPoint {
                latitude: r.latitude,
                longitude: r.longitude,
                weight: 1.0,
            })
            .collect(),
    };

    let markers = records.iter().map(|r| incident_marker(r)).collect();

    let (route, notice) = match route {
        Some(input) if input.result.has_path() => (Some(route_overlay(input)), None),
        Some(input) => (None, route_notice(input.result)),
        None => (None, None),
    };

    log::debug!(
        "Assembled map payload: {} markers, route {}",
        records.len(),
        if route.is_some() { "shown" } else { "absent" }
    );

    MapPayload {
        center: settings.center,
        zoom: settings.zoom,
        heatmap,
        markers,
        route,
        notice,
        summary: summarize(records),
    }
}

/// Marker for one incident.
#[must_use]
pub fn incident_marker(record: &CrimeRecord) -> IncidentMarker {
    IncidentMarker {
        id: record.id,
        coordinate: Coordinate::new(record.latitude, record.longitude),
        color: if record.arrest_made.is_outstanding() {
            MarkerColor::Warning
        } else {
            MarkerColor::Resolved
        },
        title: record.crime_type.clone(),
        detail: incident_detail(record),
    }
}

/// Multi-line description listing every field of an incident.
#[must_use]
pub fn incident_detail(record: &CrimeRecord) -> String {
    format!(
        "Crime Type: {}\n\
         Location: {}\n\
         Date: {}\n\
         Suspect: {}, {} yrs\n\
         Victim: {}, {} yrs\n\
         Arrest Made: {}\n\
         Case Status: {}\n\
         Description: {}",
        record.crime_type,
        record.location,
        record.date.format("%Y-%m-%d"),
        record.suspect_gender,
        record.suspect_age,
        record.victim_gender,
        record.victim_age,
        record.arrest_made,
        record.case_status,
        record.description,
    )
}

/// The distance line shown under the map.
#[must_use]
pub fn distance_label(distance_km: f64) -> String {
    format!("Distance: {distance_km:.2} km")
}

fn route_overlay(input: RouteInput<'_>) -> RouteOverlay {
    RouteOverlay {
        polyline: input.result.path.clone(),
        style: PolylineStyle::default(),
        start: EndpointMarker {
            endpoint: Endpoint::Start,
            coordinate: input.start,
            label: "Start Location".to_string(),
        },
        end: EndpointMarker {
            endpoint: Endpoint::End,
            coordinate: input.end,
            label: "Destination".to_string(),
        },
        distance_km: input.result.distance_km,
        path_length_km: input.result.path_length_km,
        distance_label: distance_label(input.result.distance_km),
    }
}

/// Error notice for a failed route, `None` if the route succeeded.
#[must_use]
pub fn route_notice(result: &RouteResult) -> Option<Notice> {
    result
        .error
        .as_ref()
        .map(|error: &RouteError| Notice::error(format!("Error finding route: {error}")))
}

/// Total and per-type counts, most frequent type first, ties by name.
#[must_use]
pub fn summarize(records: &[&CrimeRecord]) -> Summary {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for record in records {
        *counts.entry(record.crime_type.as_str()).or_default() += 1;
    }

    let mut by_crime_type: Vec<CrimeTypeCount> = counts
        .into_iter()
        .map(|(crime_type, count)| CrimeTypeCount {
            crime_type: crime_type.to_string(),
            count,
        })
        .collect();
    // BTreeMap order already sorts ties by name; the sort is stable.
    by_crime_type.sort_by(|a, b| b.count.cmp(&a.count));

    Summary {
        total: records.len(),
        by_crime_type,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use chrono::NaiveDate;
    use crime_route_incident_models::ArrestMade;
    use crime_route_map_models::NoticeLevel;

    use super::*;

    pub(crate) fn record(id: usize, crime_type: &str, arrest_made: ArrestMade) -> CrimeRecord {
        CrimeRecord {
            id,
            crime_type: crime_type.to_string(),
            date: NaiveDate::from_ymd_opt(2023, 1, 2).unwrap(),
            location: "T. Nagar".to_string(),
            latitude: 13.0418,
            longitude: 80.2341,
            suspect_gender: "Male".to_string(),
            suspect_age: 34,
            victim_gender: "Female".to_string(),
            victim_age: 28,
            arrest_made,
            case_status: "Open".to_string(),
            description: "Chain snatching near bus stop".to_string(),
        }
    }

    const START: Coordinate = Coordinate::new(13.0418, 80.2341);
    const END: Coordinate = Coordinate::new(13.0067, 80.2206);

    #[test]
    fn markers_follow_arrest_status() {
        let open = record(0, "Theft", ArrestMade::No);
        let closed = record(1, "Assault", ArrestMade::Yes);
        let payload = assemble(&MapSettings::default(), &[&open, &closed], None);

        assert_eq!(payload.markers.len(), 2);
        assert_eq!(payload.markers[0].color, MarkerColor::Warning);
        assert_eq!(payload.markers[1].color, MarkerColor::Resolved);
        assert_eq!(payload.heatmap.points.len(), 2);
        assert_eq!(payload.heatmap.radius, 15);
        assert_eq!(payload.heatmap.blur, 10);
        assert!(payload.route.is_none());
        assert!(payload.notice.is_none());
    }

    #[test]
    fn detail_lists_every_field() {
        let detail = incident_detail(&record(0, "Theft", ArrestMade::No));
        for expected in [
            "Crime Type: Theft",
            "Location: T. Nagar",
            "Date: 2023-01-02",
            "Suspect: Male, 34 yrs",
            "Victim: Female, 28 yrs",
            "Arrest Made: No",
            "Case Status: Open",
            "Description: Chain snatching near bus stop",
        ] {
            assert!(detail.contains(expected), "missing {expected:?} in {detail}");
        }
    }

    #[test]
    fn summary_orders_by_count_then_name() {
        let records = [
            record(0, "Theft", ArrestMade::No),
            record(1, "Assault", ArrestMade::No),
            record(2, "Theft", ArrestMade::Yes),
            record(3, "Burglary", ArrestMade::No),
        ];
        let refs: Vec<&CrimeRecord> = records.iter().collect();
        let summary = summarize(&refs);

        assert_eq!(summary.total, 4);
        let order: Vec<(&str, usize)> = summary
            .by_crime_type
            .iter()
            .map(|c| (c.crime_type.as_str(), c.count))
            .collect();
        assert_eq!(order, vec![("Theft", 2), ("Assault", 1), ("Burglary", 1)]);
    }

    #[test]
    fn found_route_adds_overlay() {
        let result = RouteResult::found(vec![START, END], 4.213, 5.1);
        let payload = assemble(
            &MapSettings::default(),
            &[],
            Some(RouteInput {
                result: &result,
                start: START,
                end: END,
            }),
        );

        let route = payload.route.unwrap();
        assert_eq!(route.polyline, vec![START, END]);
        assert_eq!(route.distance_label, "Distance: 4.21 km");
        assert_eq!(route.start.label, "Start Location");
        assert_eq!(route.end.label, "Destination");
        assert_eq!(route.end.coordinate, END);
        assert!(payload.notice.is_none());
    }

    #[test]
    fn failed_route_keeps_incidents_and_reports_reason() {
        let theft = record(0, "Theft", ArrestMade::No);
        let result = RouteResult::failed(4.2, RouteError::Timeout);
        let payload = assemble(
            &MapSettings::default(),
            &[&theft],
            Some(RouteInput {
                result: &result,
                start: START,
                end: END,
            }),
        );

        assert!(payload.route.is_none());
        assert_eq!(payload.markers.len(), 1);
        assert_eq!(payload.heatmap.points.len(), 1);
        let notice = payload.notice.unwrap();
        assert_eq!(notice.level, NoticeLevel::Error);
        assert_eq!(notice.message, "Error finding route: timeout");
    }

    #[test]
    fn distance_label_rounds_to_two_places() {
        assert_eq!(distance_label(0.0), "Distance: 0.00 km");
        assert_eq!(distance_label(12.345_6), "Distance: 12.35 km");
    }
}
