#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Place-name geocoding for route endpoints.
//!
//! Converts free-text place names ("T. Nagar, Chennai") to coordinates
//! using a multi-provider strategy configured via TOML files in
//! `services/`:
//!
//! 1. **Nominatim / OpenStreetMap** (priority 1) — free, 1 req/sec rate
//!    limit.
//! 2. **Photon** (priority 2) — free, `GeoJSON` responses, used when
//!    Nominatim has no match or is unavailable.
//!
//! [`GeocoderChain::resolve`] never fails: every outcome, including
//! service failures, is reported as a [`GeocodeOutcome`] so callers can
//! tell "no such place" apart from "lookup service unavailable".

pub mod nominatim;
pub mod photon;
pub mod service_registry;

use std::time::Duration;

use async_trait::async_trait;
use crime_route_geography_models::Coordinate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::service_registry::{GeocodingService, ProviderConfig};

/// A geocoding match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeocodedPlace {
    /// Resolved coordinate.
    pub coordinate: Coordinate,
    /// The matched/canonical place name returned by the provider.
    pub display_name: Option<String>,
    /// Which provider resolved this place.
    pub provider: GeocodingProvider,
}

/// Which geocoding provider resolved a place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GeocodingProvider {
    /// Nominatim / `OpenStreetMap`.
    Nominatim,
    /// Photon.
    Photon,
}

/// Errors from a single provider lookup.
#[derive(Debug, Error)]
pub enum GeocodeError {
    /// HTTP request failed after retries.
    #[error(transparent)]
    Http(#[from] crime_route_http::HttpError),

    /// Client construction failed.
    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),

    /// Response parsing failed.
    #[error("Parse error: {message}")]
    Parse {
        /// Description of the parsing failure.
        message: String,
    },
}

impl GeocodeError {
    /// Returns `true` if the provider answered HTTP 429.
    #[must_use]
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::Http(e) if e.is_rate_limited())
    }

    /// Returns `true` if the provider did not answer in time.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Http(e) if e.is_timeout())
    }
}

/// Outcome of resolving a place name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum GeocodeOutcome {
    /// A provider matched the text.
    Found {
        /// The match.
        place: GeocodedPlace,
    },
    /// Every provider answered, none matched.
    NotFound,
    /// The input was empty or whitespace; no lookup was made.
    Blank,
    /// No match, and at least one provider failed to answer.
    ServiceError {
        /// Failure detail from the last failing provider.
        detail: String,
    },
}

impl GeocodeOutcome {
    /// The resolved coordinate, if any.
    #[must_use]
    pub const fn coordinate(&self) -> Option<Coordinate> {
        match self {
            Self::Found { place } => Some(place.coordinate),
            Self::NotFound | Self::Blank | Self::ServiceError { .. } => None,
        }
    }

    /// Returns `true` if the lookup failed because a service was
    /// unavailable rather than because the place is unknown.
    #[must_use]
    pub const fn is_service_error(&self) -> bool {
        matches!(self, Self::ServiceError { .. })
    }
}

/// A single geocoding backend.
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Provider identity, for logs and results.
    fn provider(&self) -> GeocodingProvider;

    /// Looks up `query`, returning `Ok(None)` when the provider has no
    /// match.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError`] if the provider could not be reached or
    /// returned an unreadable response.
    async fn geocode(&self, query: &str) -> Result<Option<GeocodedPlace>, GeocodeError>;
}

/// Providers tried in priority order.
pub struct GeocoderChain {
    providers: Vec<Box<dyn Geocoder>>,
}

impl GeocoderChain {
    /// Creates a chain from already-built providers, tried in the given
    /// order.
    #[must_use]
    pub fn new(providers: Vec<Box<dyn Geocoder>>) -> Self {
        Self { providers }
    }

    /// Builds a chain from the enabled services in the registry.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError`] if an HTTP client cannot be constructed.
    pub fn from_registry(user_agent: &str) -> Result<Self, GeocodeError> {
        Self::from_services(&service_registry::enabled_services(), user_agent)
    }

    /// Builds a chain from explicit service configurations, sorted by
    /// priority.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError`] if an HTTP client cannot be constructed.
    pub fn from_services(
        services: &[GeocodingService],
        user_agent: &str,
    ) -> Result<Self, GeocodeError> {
        let mut services: Vec<&GeocodingService> = services.iter().filter(|s| s.enabled).collect();
        services.sort_by_key(|s| s.priority);

        let mut providers: Vec<Box<dyn Geocoder>> = Vec::with_capacity(services.len());
        for service in services {
            let client = build_client(user_agent, service.timeout())?;
            let policy = service.retry_policy();
            log::debug!("Geocoding provider {} ({})", service.id, service.base_url());
            match &service.provider {
                ProviderConfig::Nominatim {
                    base_url,
                    rate_limit_ms,
                    country_codes,
                    ..
                } => providers.push(Box::new(
                    nominatim::NominatimGeocoder::new(client, base_url)
                        .with_rate_limit(Duration::from_millis(*rate_limit_ms))
                        .with_country_codes(country_codes.clone())
                        .with_retry_policy(policy),
                )),
                ProviderConfig::Photon { base_url, .. } => providers.push(Box::new(
                    photon::PhotonGeocoder::new(client, base_url).with_retry_policy(policy),
                )),
            }
        }

        Ok(Self::new(providers))
    }

    /// Number of configured providers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Returns `true` if no providers are configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Resolves free text to a coordinate.
    ///
    /// Blank input returns [`GeocodeOutcome::Blank`] without any lookup.
    /// Providers are tried in order until one matches.
    pub async fn resolve(&self, text: &str) -> GeocodeOutcome {
        let query = text.trim();
        if query.is_empty() {
            return GeocodeOutcome::Blank;
        }

        let mut last_error: Option<String> = None;

        for provider in &self.providers {
            match provider.geocode(query).await {
                Ok(Some(place)) => {
                    log::info!(
                        "Geocoded '{query}' via {:?} -> ({:.5}, {:.5})",
                        place.provider,
                        place.coordinate.latitude,
                        place.coordinate.longitude
                    );
                    return GeocodeOutcome::Found { place };
                }
                Ok(None) => {
                    log::debug!("{:?} found no match for '{query}'", provider.provider());
                }
                Err(e) => {
                    let name = provider.provider();
                    if e.is_rate_limited() {
                        log::warn!("{name:?} is rate limiting lookups; skipping for '{query}'");
                    } else if e.is_timeout() {
                        log::warn!("{name:?} timed out for '{query}'");
                    } else {
                        log::warn!("{name:?} failed for '{query}': {e}");
                    }
                    last_error = Some(e.to_string());
                }
            }
        }

        match last_error {
            Some(detail) => GeocodeOutcome::ServiceError { detail },
            None => GeocodeOutcome::NotFound,
        }
    }
}

/// Builds a [`reqwest::Client`] with a User-Agent and a per-request
/// timeout. Public geocoders reject requests without a User-Agent.
///
/// # Errors
///
/// Returns [`reqwest::Error`] if the TLS backend cannot be initialised.
pub fn build_client(user_agent: &str, timeout: Duration) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .user_agent(user_agent)
        .timeout(timeout)
        .build()
}
