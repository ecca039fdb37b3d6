#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Map payload types.
//!
//! A [`MapPayload`] is the complete render target for one pipeline run:
//! heatmap, incident markers, an optional route overlay, an optional
//! user-facing notice and the summary panel. It is rebuilt from scratch
//! on every run and serialized to camelCase JSON for map front-ends.

use crime_route_geography_models::{Coordinate, Endpoint};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display};

/// Map view and heatmap settings (`[map]` in the application config).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapSettings {
    /// Initial map center.
    pub center: Coordinate,
    /// Initial zoom level.
    pub zoom: u8,
    /// Heatmap point radius in pixels.
    pub heatmap_radius: u32,
    /// Heatmap blur in pixels.
    pub heatmap_blur: u32,
}

impl Default for MapSettings {
    fn default() -> Self {
        Self {
            center: Coordinate::new(13.0827, 80.2707),
            zoom: 12,
            heatmap_radius: 15,
            heatmap_blur: 10,
        }
    }
}

/// Everything needed to draw the map and its side panels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapPayload {
    /// Initial map center.
    pub center: Coordinate,
    /// Initial zoom level.
    pub zoom: u8,
    /// Incident density layer.
    pub heatmap: Heatmap,
    /// One marker per filtered incident, in input order.
    pub markers: Vec<IncidentMarker>,
    /// Walking route, when one was found.
    pub route: Option<RouteOverlay>,
    /// Message to show alongside the map.
    pub notice: Option<Notice>,
    /// Counts for the summary panel.
    pub summary: Summary,
}

/// Heatmap layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Heatmap {
    /// Point radius in pixels.
    pub radius: u32,
    /// Blur in pixels.
    pub blur: u32,
    /// Weighted points.
    pub points: Vec<HeatPoint>,
}

/// A weighted heatmap point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeatPoint {
    /// Latitude.
    pub latitude: f64,
    /// Longitude.
    pub longitude: f64,
    /// Relative weight.
    pub weight: f64,
}

/// Marker color class.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, AsRefStr,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "lowercase")]
pub enum MarkerColor {
    /// No arrest made yet.
    Warning,
    /// Arrest made.
    Resolved,
}

impl MarkerColor {
    /// Conventional map icon color for this class.
    #[must_use]
    pub const fn css(self) -> &'static str {
        match self {
            Self::Warning => "red",
            Self::Resolved => "green",
        }
    }
}

/// A marker for one crime incident.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncidentMarker {
    /// Row index of the incident.
    pub id: usize,
    /// Marker position.
    pub coordinate: Coordinate,
    /// Color class.
    pub color: MarkerColor,
    /// Short title (the crime type).
    pub title: String,
    /// Multi-line description listing every field of the incident.
    pub detail: String,
}

/// A marker at one end of the route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointMarker {
    /// Which end.
    pub endpoint: Endpoint,
    /// Marker position (the geocoded location, not the snapped node).
    pub coordinate: Coordinate,
    /// Popup label.
    pub label: String,
}

/// Polyline drawing hints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolylineStyle {
    /// Stroke color.
    pub color: String,
    /// Stroke width in pixels.
    pub weight: u32,
    /// Stroke opacity, 0 to 1.
    pub opacity: f64,
    /// Hover text.
    pub tooltip: String,
}

impl Default for PolylineStyle {
    fn default() -> Self {
        Self {
            color: "blue".to_string(),
            weight: 6,
            opacity: 0.7,
            tooltip: "Shortest walking route".to_string(),
        }
    }
}

/// A resolved route drawn over the map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteOverlay {
    /// Path coordinates in walking order.
    pub polyline: Vec<Coordinate>,
    /// Polyline drawing hints.
    pub style: PolylineStyle,
    /// Start marker.
    pub start: EndpointMarker,
    /// Destination marker.
    pub end: EndpointMarker,
    /// Straight-line distance between the endpoints.
    pub distance_km: f64,
    /// Walked length of the polyline.
    pub path_length_km: f64,
    /// Display line, e.g. `"Distance: 4.21 km"`.
    pub distance_label: String,
}

/// Severity of a [`Notice`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, AsRefStr,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "lowercase")]
pub enum NoticeLevel {
    /// Input problem the user can fix.
    Warning,
    /// A service failed.
    Error,
}

/// A message shown next to the map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notice {
    /// Severity.
    pub level: NoticeLevel,
    /// Text to display.
    pub message: String,
}

impl Notice {
    /// A warning notice.
    #[must_use]
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }

    /// An error notice.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

/// Incident count for one crime type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrimeTypeCount {
    /// Crime type label.
    pub crime_type: String,
    /// Number of filtered incidents of this type.
    pub count: usize,
}

/// Summary panel contents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    /// Number of filtered incidents.
    pub total: usize,
    /// Counts per crime type, most frequent first, ties by name.
    pub by_crime_type: Vec<CrimeTypeCount>,
}
