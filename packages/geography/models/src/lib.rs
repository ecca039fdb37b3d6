#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Geographic primitives shared by the geocoder, the route resolver, and
//! the map assembler.
//!
//! Distances are measured on the WGS84 ellipsoid ([`geo::Geodesic`]), so
//! the straight-line "as the crow flies" figure shown to users matches what
//! mapping tools report.

use geo::{Distance as _, Geodesic, Point};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display};

/// Shortest length of one degree of latitude (at the equator), so padding
/// derived from it is never smaller than requested.
const KM_PER_DEGREE_LAT: f64 = 110.574;

/// A WGS84 coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
}

impl Coordinate {
    /// Creates a coordinate from latitude and longitude.
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Returns `true` if both components are finite and within the valid
    /// latitude/longitude ranges.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }

    /// Converts to a [`geo::Point`] (x = longitude, y = latitude).
    #[must_use]
    pub fn to_point(self) -> Point<f64> {
        Point::new(self.longitude, self.latitude)
    }
}

impl From<Point<f64>> for Coordinate {
    fn from(point: Point<f64>) -> Self {
        Self::new(point.y(), point.x())
    }
}

/// Geodesic distance between two coordinates in metres.
#[must_use]
pub fn geodesic_distance_m(a: Coordinate, b: Coordinate) -> f64 {
    if a == b {
        return 0.0;
    }
    Geodesic.distance(a.to_point(), b.to_point())
}

/// Geodesic distance between two coordinates in kilometres.
#[must_use]
pub fn geodesic_distance_km(a: Coordinate, b: Coordinate) -> f64 {
    geodesic_distance_m(a, b) / 1000.0
}

/// A geographic bounding box in WGS84 coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Western longitude boundary.
    pub west: f64,
    /// Southern latitude boundary.
    pub south: f64,
    /// Eastern longitude boundary.
    pub east: f64,
    /// Northern latitude boundary.
    pub north: f64,
}

impl BoundingBox {
    /// Creates a new bounding box from the given coordinates.
    #[must_use]
    pub const fn new(west: f64, south: f64, east: f64, north: f64) -> Self {
        Self {
            west,
            south,
            east,
            north,
        }
    }

    /// Smallest box containing both coordinates.
    #[must_use]
    pub fn spanning(a: Coordinate, b: Coordinate) -> Self {
        Self::new(
            a.longitude.min(b.longitude),
            a.latitude.min(b.latitude),
            a.longitude.max(b.longitude),
            a.latitude.max(b.latitude),
        )
    }

    /// Returns `true` if the coordinate lies inside the box (edges
    /// included).
    #[must_use]
    pub fn contains(&self, coord: Coordinate) -> bool {
        (self.south..=self.north).contains(&coord.latitude)
            && (self.west..=self.east).contains(&coord.longitude)
    }

    /// Grows the box by `km` on every side.
    ///
    /// The longitude padding is computed at the box's most poleward
    /// latitude so the padded box never ends up narrower than requested.
    #[must_use]
    pub fn padded(&self, km: f64) -> Self {
        let dlat = km / KM_PER_DEGREE_LAT;
        let widest_lat = self.south.abs().max(self.north.abs()).min(89.0);
        let dlon = km / (KM_PER_DEGREE_LAT * widest_lat.to_radians().cos());
        Self::new(
            (self.west - dlon).max(-180.0),
            (self.south - dlat).max(-90.0),
            (self.east + dlon).min(180.0),
            (self.north + dlat).min(90.0),
        )
    }

    /// Expands the box outward so every edge sits on a multiple of
    /// `grid` degrees. Nearby requests therefore share the same box.
    #[must_use]
    pub fn snapped(&self, grid: f64) -> Self {
        if grid <= 0.0 || !grid.is_finite() {
            return *self;
        }
        Self::new(
            (self.west / grid).floor() * grid,
            (self.south / grid).floor() * grid,
            (self.east / grid).ceil() * grid,
            (self.north / grid).ceil() * grid,
        )
    }

    /// Stable textual key for the box, rounded to 1e-5 degrees.
    #[must_use]
    pub fn key(&self) -> String {
        format!(
            "{:.5},{:.5},{:.5},{:.5}",
            self.west, self.south, self.east, self.north
        )
    }
}

/// Which endpoint of a route request a failure refers to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, AsRefStr,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "lowercase")]
pub enum Endpoint {
    /// The start location.
    Start,
    /// The destination.
    End,
}

/// Why a route could not be produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum RouteError {
    /// The street network could not be fetched or parsed.
    #[error("street network unavailable: {message}")]
    GraphFetch {
        /// Underlying failure description.
        message: String,
    },

    /// The fetched area contained no walkable streets.
    #[error("no walkable streets in the requested area")]
    EmptyGraph,

    /// An endpoint is farther than the snap radius from every street node.
    #[error("no street within {radius_m:.0} m of the {endpoint} location")]
    NoNearbyNode {
        /// The endpoint that could not be snapped.
        endpoint: Endpoint,
        /// Search radius in metres.
        radius_m: f64,
    },

    /// Both endpoints snapped, but the street network does not connect
    /// them.
    #[error("no walkable path connects the two locations")]
    NoPath,

    /// The route computation did not finish within the configured time.
    #[error("timeout")]
    Timeout,
}

/// Result of a route request.
///
/// `distance_km` is always the geodesic distance between the requested
/// endpoints, independent of `path`. `path_length_km` is the summed length
/// of the walked path, which is usually longer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteResult {
    /// Ordered path coordinates; empty on failure.
    pub path: Vec<Coordinate>,
    /// Straight-line geodesic distance between the endpoints.
    pub distance_km: f64,
    /// Length of `path` along the street network.
    pub path_length_km: f64,
    /// Failure reason, if any.
    pub error: Option<RouteError>,
}

impl RouteResult {
    /// A successful route.
    #[must_use]
    pub const fn found(path: Vec<Coordinate>, distance_km: f64, path_length_km: f64) -> Self {
        Self {
            path,
            distance_km,
            path_length_km,
            error: None,
        }
    }

    /// A failed route. The straight-line distance is still reported.
    #[must_use]
    pub const fn failed(distance_km: f64, error: RouteError) -> Self {
        Self {
            path: Vec::new(),
            distance_km,
            path_length_km: 0.0,
            error: Some(error),
        }
    }

    /// Returns `true` if the route has a drawable path.
    #[must_use]
    pub const fn has_path(&self) -> bool {
        !self.path.is_empty()
    }
}
