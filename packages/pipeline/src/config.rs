//! Application configuration.
//!
//! Values come from a TOML file: the built-in `config/default.toml`
//! unless a path is given explicitly or via `CRIME_ROUTE_CONFIG`.
//! `CRIME_ROUTE_DATASET` overrides the dataset path afterwards.

use std::path::{Path, PathBuf};

use crime_route_dataset::{DataLoadError, Dataset, LoadOptions};
use crime_route_geography_models::BoundingBox;
use crime_route_map_models::MapSettings;
use crime_route_routing::RoutingConfig;
use serde::Deserialize;

const DEFAULT_CONFIG: &str = include_str!("../config/default.toml");

/// Environment variable naming a config file.
pub const CONFIG_ENV: &str = "CRIME_ROUTE_CONFIG";

/// Environment variable overriding the dataset path.
pub const DATASET_ENV: &str = "CRIME_ROUTE_DATASET";

/// Errors raised while reading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("Failed to read config {path}: {source}")]
    Io {
        /// File path.
        path: String,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The config file is not valid TOML for [`AppConfig`].
    #[error("Invalid config: {0}")]
    Toml(#[from] toml::de::Error),
}

/// `[dataset]` section.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DatasetConfig {
    /// CSV file with the incident table.
    pub path: PathBuf,
    /// Region every incident must lie in.
    #[serde(default)]
    pub bounds: Option<BoundingBox>,
}

/// Full application configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AppConfig {
    /// Incident table location and validation.
    pub dataset: DatasetConfig,
    /// Map view and heatmap settings.
    #[serde(default)]
    pub map: MapSettings,
    /// Route resolver settings.
    #[serde(default)]
    pub routing: RoutingConfig,
}

impl AppConfig {
    /// Parses configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Toml`] if the text is not a valid config.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// The built-in configuration.
    ///
    /// # Panics
    ///
    /// Panics if the embedded default config is malformed (a build-time
    /// guarantee, covered by tests).
    #[must_use]
    pub fn builtin() -> Self {
        Self::from_toml(DEFAULT_CONFIG)
            .unwrap_or_else(|e| panic!("Failed to parse built-in config: {e}"))
    }

    /// Loads configuration from `path`, or from `CRIME_ROUTE_CONFIG`, or
    /// the built-in default, then applies environment overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a config file cannot be read or parsed.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let from_env = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
        let mut config = match path.map(Path::to_path_buf).or(from_env) {
            Some(path) => {
                log::info!("Loading config from {}", path.display());
                let text = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
                    path: path.display().to_string(),
                    source,
                })?;
                Self::from_toml(&text)?
            }
            None => Self::builtin(),
        };

        if let Some(dataset) = std::env::var_os(DATASET_ENV) {
            config.dataset.path = PathBuf::from(dataset);
        }

        Ok(config)
    }

    /// Loads the incident table named by the config.
    ///
    /// # Errors
    ///
    /// Returns [`DataLoadError`] if the file is missing or any row is
    /// invalid.
    pub fn load_dataset(&self) -> Result<Dataset, DataLoadError> {
        let options = LoadOptions {
            bounds: self.dataset.bounds,
        };
        Dataset::load(&self.dataset.path, &options)
    }
}
