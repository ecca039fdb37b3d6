//! Geocoding services bundled with the binary.
//!
//! Each provider is described by a TOML file under `services/`, embedded
//! with `include_str!`. [`enabled_services`] yields them in the order the
//! chain should try them.

use std::time::Duration;

use crime_route_http::RetryPolicy;
use serde::Deserialize;

/// One geocoding service entry.
#[derive(Debug, Clone, Deserialize)]
pub struct GeocodingService {
    /// Identifier used in logs.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Disabled services are skipped when building a chain.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Lower runs first.
    pub priority: u32,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Retries after the first attempt for transient failures.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Backend settings.
    pub provider: ProviderConfig,
}

/// Backend settings, tagged by `type`.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProviderConfig {
    /// Nominatim search endpoint.
    Nominatim {
        /// Search URL.
        base_url: String,
        /// Minimum spacing between requests, in milliseconds.
        #[serde(default)]
        rate_limit_ms: u64,
        /// ISO 3166-1 alpha-2 codes, comma separated, restricting matches.
        #[serde(default)]
        country_codes: Option<String>,
    },
    /// Photon `GeoJSON` endpoint.
    Photon {
        /// API URL.
        base_url: String,
    },
}

const fn default_enabled() -> bool {
    true
}

const fn default_timeout_secs() -> u64 {
    10
}

const fn default_max_retries() -> u32 {
    2
}

impl GeocodingService {
    /// Endpoint URL of the backend.
    #[must_use]
    pub fn base_url(&self) -> &str {
        match &self.provider {
            ProviderConfig::Nominatim { base_url, .. } | ProviderConfig::Photon { base_url } => {
                base_url
            }
        }
    }

    /// Per-request timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Retry budget for lookups against this service.
    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            ..RetryPolicy::default()
        }
    }
}

const SERVICE_TOMLS: &[(&str, &str)] = &[
    ("nominatim", include_str!("../services/nominatim.toml")),
    ("photon", include_str!("../services/photon.toml")),
];

/// Every bundled service, enabled or not.
///
/// # Panics
///
/// Panics if an embedded TOML file is malformed. The files ship with the
/// binary and are parsed in tests.
#[must_use]
pub fn all_services() -> Vec<GeocodingService> {
    SERVICE_TOMLS
        .iter()
        .map(|(name, text)| {
            toml::de::from_str(text)
                .unwrap_or_else(|e| panic!("Failed to parse geocoding service '{name}': {e}"))
        })
        .collect()
}

/// Enabled services in priority order.
#[must_use]
pub fn enabled_services() -> Vec<GeocodingService> {
    let mut services: Vec<GeocodingService> =
        all_services().into_iter().filter(|s| s.enabled).collect();
    services.sort_by_key(|s| s.priority);
    services
}
