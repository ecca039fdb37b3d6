//! Nominatim / OpenStreetMap geocoder client.
//!
//! Nominatim has strict rate limits: **1 request per second** maximum on
//! the public instance. [`NominatimGeocoder`] spaces its own requests by
//! the configured `rate_limit_ms`, so concurrent lookups are safe.
//!
//! See <https://nominatim.org/release-docs/develop/api/Search/>

use std::time::Duration;

use async_trait::async_trait;
use crime_route_geography_models::Coordinate;
use crime_route_http::RetryPolicy;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::{GeocodeError, GeocodedPlace, Geocoder, GeocodingProvider};

/// Free-form Nominatim search client.
pub struct NominatimGeocoder {
    client: reqwest::Client,
    base_url: String,
    country_codes: Option<String>,
    rate_limit: Duration,
    policy: RetryPolicy,
    last_request: Mutex<Option<Instant>>,
}

impl NominatimGeocoder {
    /// Creates a client for the given search endpoint.
    #[must_use]
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.to_string(),
            country_codes: None,
            rate_limit: Duration::ZERO,
            policy: RetryPolicy::default(),
            last_request: Mutex::new(None),
        }
    }

    /// Sets the minimum spacing between requests.
    #[must_use]
    pub const fn with_rate_limit(mut self, rate_limit: Duration) -> Self {
        self.rate_limit = rate_limit;
        self
    }

    /// Restricts matches to the given comma-separated ISO country codes.
    #[must_use]
    pub fn with_country_codes(mut self, country_codes: Option<String>) -> Self {
        self.country_codes = country_codes.filter(|c| !c.trim().is_empty());
        self
    }

    /// Sets the retry budget.
    #[must_use]
    pub const fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Waits until `rate_limit` has elapsed since the previous request.
    async fn throttle(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(prev) = *last {
            let ready_at = prev + self.rate_limit;
            if ready_at > Instant::now() {
                tokio::time::sleep_until(ready_at).await;
            }
        }
        *last = Some(Instant::now());
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    fn provider(&self) -> GeocodingProvider {
        GeocodingProvider::Nominatim
    }

    async fn geocode(&self, query: &str) -> Result<Option<GeocodedPlace>, GeocodeError> {
        self.throttle().await;

        let mut params: Vec<(&str, &str)> = vec![("q", query), ("format", "jsonv2"), ("limit", "1")];
        if let Some(codes) = &self.country_codes {
            params.push(("countrycodes", codes.as_str()));
        }

        log::debug!("Nominatim search: {query}");
        let body = crime_route_http::send_json(&self.policy, || {
            self.client.get(&self.base_url).query(&params)
        })
        .await?;

        parse_response(&body)
    }
}

/// Parses Nominatim JSON response.
fn parse_response(body: &serde_json::Value) -> Result<Option<GeocodedPlace>, GeocodeError> {
    let results = body.as_array().ok_or_else(|| GeocodeError::Parse {
        message: "Nominatim response is not an array".to_string(),
    })?;

    let Some(first) = results.first() else {
        return Ok(None);
    };

    let lat = first["lat"]
        .as_str()
        .and_then(|s| s.parse::<f64>().ok())
        .ok_or_else(|| GeocodeError::Parse {
            message: "Missing lat in Nominatim response".to_string(),
        })?;

    let lon = first["lon"]
        .as_str()
        .and_then(|s| s.parse::<f64>().ok())
        .ok_or_else(|| GeocodeError::Parse {
            message: "Missing lon in Nominatim response".to_string(),
        })?;

    let coordinate = Coordinate::new(lat, lon);
    if !coordinate.is_valid() {
        return Err(GeocodeError::Parse {
            message: format!("Nominatim returned out-of-range coordinates ({lat}, {lon})"),
        });
    }

    let display_name = first["display_name"].as_str().map(String::from);

    Ok(Some(GeocodedPlace {
        coordinate,
        display_name,
        provider: GeocodingProvider::Nominatim,
    }))
}
