#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! End-to-end filter-and-route pipeline.
//!
//! One [`Pipeline::run`] is one user interaction: filter the incident
//! table, geocode both locations concurrently, resolve a walking route
//! when both resolved, and assemble the map payload. Geocoding and
//! routing failures never abort the run; they surface as a notice on an
//! otherwise complete payload.

pub mod config;
pub mod progress;

use std::collections::BTreeSet;

use chrono::NaiveDate;
use crime_route_dataset::Dataset;
use crime_route_geocoder::{GeocodeError, GeocodeOutcome, GeocoderChain};
use crime_route_geography_models::RouteResult;
use crime_route_incident_models::{DateRange, FilterCriteria};
use crime_route_map::RouteInput;
use crime_route_map_models::{MapPayload, MapSettings, Notice};
use crime_route_routing::{GraphFetchError, RouteResolver};
use serde::{Deserialize, Serialize};

pub use config::{AppConfig, ConfigError};
pub use progress::{NullProgress, ProgressCallback, null_progress};

const STEPS: u64 = 4;

/// Errors raised while building a pipeline.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Geocoder chain could not be built.
    #[error(transparent)]
    Geocoder(#[from] GeocodeError),

    /// Route resolver could not be built.
    #[error(transparent)]
    Routing(#[from] GraphFetchError),
}

/// One user interaction's inputs.
///
/// Absent crime types or statuses mean every value in the dataset; absent
/// dates mean the dataset's own bounds. An explicitly empty set matches
/// nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapRequest {
    /// Crime types to show.
    pub crime_types: Option<BTreeSet<String>>,
    /// Case statuses to show.
    pub case_statuses: Option<BTreeSet<String>>,
    /// First included day.
    pub from: Option<NaiveDate>,
    /// Last included day.
    pub to: Option<NaiveDate>,
    /// Start location text.
    #[serde(default)]
    pub start: String,
    /// Destination text.
    #[serde(default)]
    pub end: String,
}

impl MapRequest {
    /// Filter criteria for this request against `dataset`.
    #[must_use]
    pub fn criteria(&self, dataset: &Dataset) -> FilterCriteria {
        let bounds = dataset.date_bounds();
        let range = DateRange::new(
            self.from
                .or_else(|| bounds.map(|b| b.start))
                .unwrap_or(NaiveDate::MIN),
            self.to
                .or_else(|| bounds.map(|b| b.end))
                .unwrap_or(NaiveDate::MAX),
        );

        let crime_types = self
            .crime_types
            .clone()
            .unwrap_or_else(|| dataset.crime_types().into_iter().map(String::from).collect());
        let case_statuses = self
            .case_statuses
            .clone()
            .unwrap_or_else(|| dataset.case_statuses().into_iter().map(String::from).collect());

        FilterCriteria::new(crime_types, range, case_statuses)
    }

    /// Returns `true` if both location fields have text, i.e. the user
    /// asked for a route.
    #[must_use]
    pub fn wants_route(&self) -> bool {
        !self.start.trim().is_empty() && !self.end.trim().is_empty()
    }
}

/// Everything a run produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineOutput {
    /// The render target.
    pub payload: MapPayload,
    /// Start geocoding outcome.
    pub start: GeocodeOutcome,
    /// Destination geocoding outcome.
    pub end: GeocodeOutcome,
    /// Route, when both locations resolved.
    pub route: Option<RouteResult>,
}

/// The filter, geocode, route, assemble chain.
pub struct Pipeline {
    geocoder: GeocoderChain,
    resolver: RouteResolver,
    map: MapSettings,
}

impl Pipeline {
    /// Creates a pipeline from its parts.
    #[must_use]
    pub const fn new(geocoder: GeocoderChain, resolver: RouteResolver, map: MapSettings) -> Self {
        Self {
            geocoder,
            resolver,
            map,
        }
    }

    /// Builds a pipeline with the registry geocoders and the configured
    /// street network provider.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError`] if an HTTP client cannot be built.
    pub fn from_config(config: &AppConfig) -> Result<Self, PipelineError> {
        let geocoder = GeocoderChain::from_registry(&config.routing.user_agent)?;
        let resolver = RouteResolver::from_config(config.routing.clone())?;
        log::info!("Pipeline ready with {} geocoding providers", geocoder.len());
        Ok(Self::new(geocoder, resolver, config.map.clone()))
    }

    /// Geocoder chain.
    #[must_use]
    pub const fn geocoder(&self) -> &GeocoderChain {
        &self.geocoder
    }

    /// Route resolver.
    #[must_use]
    pub const fn resolver(&self) -> &RouteResolver {
        &self.resolver
    }

    /// Map settings.
    #[must_use]
    pub const fn map_settings(&self) -> &MapSettings {
        &self.map
    }

    /// Runs the pipeline without progress reporting.
    pub async fn run(&self, dataset: &Dataset, request: &MapRequest) -> PipelineOutput {
        self.run_with_progress(dataset, request, &NullProgress).await
    }

    /// Runs the pipeline, reporting each step to `progress`.
    pub async fn run_with_progress(
        &self,
        dataset: &Dataset,
        request: &MapRequest,
        progress: &dyn ProgressCallback,
    ) -> PipelineOutput {
        progress.set_total(STEPS);

        progress.set_message("Filtering incidents".to_string());
        let criteria = request.criteria(dataset);
        let filtered = crime_route_dataset::filter(dataset.records(), &criteria);
        log::info!("{} of {} incidents match", filtered.len(), dataset.len());
        progress.inc(1);

        progress.set_message("Geocoding locations".to_string());
        let (start, end) = futures::join!(
            self.geocoder.resolve(&request.start),
            self.geocoder.resolve(&request.end)
        );
        progress.inc(1);

        progress.set_message("Finding walking route".to_string());
        let route = match (start.coordinate(), end.coordinate()) {
            (Some(from), Some(to)) => Some((from, to, self.resolver.find_route(from, to).await)),
            _ => None,
        };
        progress.inc(1);

        progress.set_message("Assembling map".to_string());
        let mut payload = crime_route_map::assemble(
            &self.map,
            &filtered,
            route.as_ref().map(|(from, to, result)| RouteInput {
                result,
                start: *from,
                end: *to,
            }),
        );
        if route.is_none() {
            payload.notice = geocode_notice(&request.start, &request.end, &start, &end);
        }
        progress.inc(1);
        progress.finish(format!("{} incidents on the map", payload.summary.total));

        PipelineOutput {
            payload,
            start,
            end,
            route: route.map(|(_, _, result)| result),
        }
    }
}

/// Explains why no route was attempted after a geocoding failure.
///
/// Nothing is reported unless both location fields have text. A service
/// outage is reported as an error; unknown places as a warning naming
/// the location text that did not resolve.
#[must_use]
pub fn geocode_notice(
    start_text: &str,
    end_text: &str,
    start: &GeocodeOutcome,
    end: &GeocodeOutcome,
) -> Option<Notice> {
    let (start_text, end_text) = (start_text.trim(), end_text.trim());
    if start_text.is_empty() || end_text.is_empty() {
        return None;
    }

    let unavailable = [start, end].into_iter().find_map(|outcome| match outcome {
        GeocodeOutcome::ServiceError { detail } => Some(detail),
        _ => None,
    });
    if let Some(detail) = unavailable {
        return Some(Notice::error(format!(
            "Geocoding service unavailable ({detail}). Please try again later."
        )));
    }

    let missing: Vec<String> = [
        ("start location", start_text, start),
        ("destination", end_text, end),
    ]
    .into_iter()
    .filter(|(_, _, outcome)| outcome.coordinate().is_none())
    .map(|(label, text, _)| format!("{label} \"{text}\""))
    .collect();

    if missing.is_empty() {
        return None;
    }

    Some(Notice::warning(format!(
        "Could not find {}. Please enter valid start and destination locations.",
        missing.join(" or ")
    )))
}
