#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the crime route server.
//!
//! Query parameter structs mirror the user-facing controls: crime type
//! and case status multi-selects (comma lists), a date range, and the two
//! location fields.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use crime_route_geocoder::GeocodeOutcome;
use crime_route_geography_models::RouteResult;
use crime_route_incident_models::DateRange;
use crime_route_map_models::Notice;
use serde::{Deserialize, Serialize};

/// Health check response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHealth {
    /// Whether the service is healthy.
    pub healthy: bool,
    /// Service version.
    pub version: String,
    /// Number of incidents loaded.
    pub incidents: usize,
}

/// Values available to the filter controls.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiFilters {
    /// Distinct crime types in order of first appearance.
    pub crime_types: Vec<String>,
    /// Distinct case statuses in order of first appearance.
    pub case_statuses: Vec<String>,
    /// Earliest and latest incident dates; `None` for an empty dataset.
    pub date_range: Option<DateRange>,
}

/// Query parameters for the map endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapQueryParams {
    /// Comma-separated crime types. Absent means all; empty means none.
    pub crime_types: Option<String>,
    /// Comma-separated case statuses. Absent means all; empty means none.
    pub statuses: Option<String>,
    /// First included day (`YYYY-MM-DD`).
    pub from: Option<NaiveDate>,
    /// Last included day (`YYYY-MM-DD`).
    pub to: Option<NaiveDate>,
    /// Start location text.
    pub start: Option<String>,
    /// Destination text.
    pub end: Option<String>,
}

/// Splits a comma list into a set, dropping blank items.
#[must_use]
pub fn parse_list(s: &str) -> BTreeSet<String> {
    s.split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
        .collect()
}

/// Query parameters for the geocode endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct GeocodeQueryParams {
    /// Free-text place.
    #[serde(default)]
    pub q: String,
}

/// Query parameters for the route endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct RouteQueryParams {
    /// Start location text.
    #[serde(default)]
    pub start: String,
    /// Destination text.
    #[serde(default)]
    pub end: String,
}

/// Route endpoint response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiRoute {
    /// Start geocoding outcome.
    pub start: GeocodeOutcome,
    /// Destination geocoding outcome.
    pub end: GeocodeOutcome,
    /// Route, when both locations resolved.
    pub route: Option<RouteResult>,
    /// `"Distance: X.XX km"`, when both locations resolved.
    pub distance_label: Option<String>,
    /// Message explaining a missing or failed route.
    pub notice: Option<Notice>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_list_trims_and_drops_blanks() {
        let set = parse_list(" Theft, Assault ,,");
        assert_eq!(
            set,
            BTreeSet::from(["Assault".to_string(), "Theft".to_string()])
        );
        assert!(parse_list("").is_empty());
    }

    #[test]
    fn map_params_use_camel_case() {
        let params: MapQueryParams = serde_json::from_value(serde_json::json!({
            "crimeTypes": "Theft",
            "from": "2023-01-01"
        }))
        .unwrap();
        assert_eq!(params.crime_types.as_deref(), Some("Theft"));
        assert_eq!(params.from, NaiveDate::from_ymd_opt(2023, 1, 1));
        assert!(params.statuses.is_none());
    }
}
