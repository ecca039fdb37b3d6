//! Photon geocoder client.
//!
//! Photon serves `OpenStreetMap` data and answers with a `GeoJSON`
//! `FeatureCollection` whose features are points in `[lon, lat]` order.
//!
//! See <https://photon.komoot.io/>

use async_trait::async_trait;
use crime_route_geography_models::Coordinate;
use crime_route_http::RetryPolicy;
use geojson::GeoJson;

use crate::{GeocodeError, GeocodedPlace, Geocoder, GeocodingProvider};

/// Photon search client.
pub struct PhotonGeocoder {
    client: reqwest::Client,
    base_url: String,
    policy: RetryPolicy,
}

impl PhotonGeocoder {
    /// Creates a client for the given API endpoint.
    #[must_use]
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.to_string(),
            policy: RetryPolicy::default(),
        }
    }

    /// Sets the retry budget.
    #[must_use]
    pub const fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }
}

#[async_trait]
impl Geocoder for PhotonGeocoder {
    fn provider(&self) -> GeocodingProvider {
        GeocodingProvider::Photon
    }

    async fn geocode(&self, query: &str) -> Result<Option<GeocodedPlace>, GeocodeError> {
        log::debug!("Photon search: {query}");
        let body = crime_route_http::send_json(&self.policy, || {
            self.client
                .get(&self.base_url)
                .query(&[("q", query), ("limit", "1")])
        })
        .await?;

        parse_response(body)
    }
}

/// Parses a Photon `FeatureCollection`.
fn parse_response(body: serde_json::Value) -> Result<Option<GeocodedPlace>, GeocodeError> {
    let geojson = GeoJson::from_json_value(body).map_err(|e| GeocodeError::Parse {
        message: format!("Photon response is not GeoJSON: {e}"),
    })?;

    let GeoJson::FeatureCollection(collection) = geojson else {
        return Err(GeocodeError::Parse {
            message: "Photon response is not a FeatureCollection".to_string(),
        });
    };

    let Some(feature) = collection.features.into_iter().next() else {
        return Ok(None);
    };

    let Some(geojson::Value::Point(position)) = feature.geometry.map(|g| g.value) else {
        return Err(GeocodeError::Parse {
            message: "Photon feature has no point geometry".to_string(),
        });
    };

    let (Some(&lon), Some(&lat)) = (position.first(), position.get(1)) else {
        return Err(GeocodeError::Parse {
            message: "Photon point has fewer than two ordinates".to_string(),
        });
    };

    let coordinate = Coordinate::new(lat, lon);
    if !coordinate.is_valid() {
        return Err(GeocodeError::Parse {
            message: format!("Photon returned out-of-range coordinates ({lat}, {lon})"),
        });
    }

    let display_name = feature.properties.as_ref().map(|props| {
        ["name", "city", "state", "country"]
            .iter()
            .filter_map(|key| props.get(*key).and_then(serde_json::Value::as_str))
            .collect::<Vec<_>>()
            .join(", ")
    });

    Ok(Some(GeocodedPlace {
        coordinate,
        display_name: display_name.filter(|s| !s.is_empty()),
        provider: GeocodingProvider::Photon,
    }))
}
