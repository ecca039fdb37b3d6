#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Crime record table loader and filter engine.
//!
//! The table is read once at startup into an immutable [`Dataset`] and
//! threaded through every pipeline run. Loading is all-or-nothing: the
//! first bad row aborts the load with a [`DataLoadError`].

pub mod filter;
pub mod loader;
pub mod parsing;

use chrono::NaiveDate;
use crime_route_incident_models::{CrimeRecord, DateRange, FilterCriteria};
use thiserror::Error;

pub use filter::filter;
pub use loader::{LoadOptions, REQUIRED_COLUMNS};

/// Errors raised while loading the incident table.
#[derive(Debug, Error)]
pub enum DataLoadError {
    /// The file could not be opened or read.
    #[error("I/O error reading {path}: {source}")]
    Io {
        /// File that failed.
        path: String,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The file is not valid CSV.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A required column is absent from the header row.
    #[error("Missing required column '{column}'")]
    MissingColumn {
        /// Name of the missing column.
        column: &'static str,
    },

    /// A date cell could not be parsed.
    #[error("Row {row}: invalid date '{value}'")]
    InvalidDate {
        /// 1-based data row number.
        row: usize,
        /// The raw cell value.
        value: String,
    },

    /// A coordinate pair is non-finite or outside the plausible region.
    #[error("Row {row}: implausible coordinates ({latitude}, {longitude})")]
    InvalidCoordinate {
        /// 1-based data row number.
        row: usize,
        /// Parsed latitude.
        latitude: f64,
        /// Parsed longitude.
        longitude: f64,
    },

    /// Any other cell that failed to parse.
    #[error("Row {row}: invalid value for '{column}': {message}")]
    InvalidField {
        /// 1-based data row number.
        row: usize,
        /// Column name.
        column: &'static str,
        /// What went wrong.
        message: String,
    },
}

/// The loaded, immutable incident table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    records: Vec<CrimeRecord>,
}

impl Dataset {
    /// Wraps already-parsed records. Record ids are left untouched.
    #[must_use]
    pub const fn from_records(records: Vec<CrimeRecord>) -> Self {
        Self { records }
    }

    /// All records in file order.
    #[must_use]
    pub fn records(&self) -> &[CrimeRecord] {
        &self.records
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if the table has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct crime types in order of first appearance.
    #[must_use]
    pub fn crime_types(&self) -> Vec<&str> {
        distinct(self.records.iter().map(|r| r.crime_type.as_str()))
    }

    /// Distinct case statuses in order of first appearance.
    #[must_use]
    pub fn case_statuses(&self) -> Vec<&str> {
        distinct(self.records.iter().map(|r| r.case_status.as_str()))
    }

    /// Earliest and latest incident dates, or `None` for an empty table.
    #[must_use]
    pub fn date_bounds(&self) -> Option<DateRange> {
        let min = self.records.iter().map(|r| r.date).min()?;
        let max = self.records.iter().map(|r| r.date).max()?;
        Some(DateRange::new(min, max))
    }

    /// Criteria that select every record: all crime types, all statuses,
    /// and the full date span.
    #[must_use]
    pub fn unfiltered_criteria(&self) -> FilterCriteria {
        let range = self.date_bounds().unwrap_or_else(|| {
            DateRange::new(NaiveDate::MIN, NaiveDate::MAX)
        });
        FilterCriteria::new(self.crime_types(), range, self.case_statuses())
    }
}

fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<&'a str> {
    let mut seen = std::collections::BTreeSet::new();
    values.filter(|v| seen.insert(*v)).collect()
}
