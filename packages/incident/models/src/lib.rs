#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Crime incident record and filter criteria types.
//!
//! A [`CrimeRecord`] is one row of the incident table, immutable once
//! loaded. [`FilterCriteria`] is the per-interaction selection (crime
//! types, date range, case statuses) applied by the filter engine.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Whether an arrest was made for an incident.
///
/// Source tables store this as the literal strings `"Yes"` / `"No"`.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[strum(ascii_case_insensitive)]
pub enum ArrestMade {
    /// An arrest was made.
    Yes,
    /// No arrest has been made.
    No,
}

impl ArrestMade {
    /// Returns `true` when the incident is still without an arrest.
    #[must_use]
    pub const fn is_outstanding(self) -> bool {
        matches!(self, Self::No)
    }
}

/// A single crime incident.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrimeRecord {
    /// Zero-based row index in the source table.
    pub id: usize,
    /// Crime type label as it appears in the source (e.g. `"Theft"`).
    pub crime_type: String,
    /// Calendar date of the incident.
    pub date: NaiveDate,
    /// Free-text location name.
    pub location: String,
    /// Latitude (WGS84).
    pub latitude: f64,
    /// Longitude (WGS84).
    pub longitude: f64,
    /// Suspect gender.
    pub suspect_gender: String,
    /// Suspect age in years.
    pub suspect_age: u32,
    /// Victim gender.
    pub victim_gender: String,
    /// Victim age in years.
    pub victim_age: u32,
    /// Whether an arrest was made.
    pub arrest_made: ArrestMade,
    /// Case status label (e.g. `"Open"`, `"Closed"`).
    pub case_status: String,
    /// Incident description.
    pub description: String,
}

/// An inclusive calendar date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    /// First included day.
    pub start: NaiveDate,
    /// Last included day.
    pub end: NaiveDate,
}

impl DateRange {
    /// Creates a new range. No reordering is done: a range whose `start`
    /// is after its `end` contains no dates.
    #[must_use]
    pub const fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Returns `true` if `date` lies within the range, inclusive on both
    /// ends.
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// User-selected filter predicates.
///
/// An empty set matches nothing for that dimension. Use
/// [`FilterCriteria::new`] with every distinct value to express "no
/// filter".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterCriteria {
    /// Crime types to keep.
    pub crime_types: BTreeSet<String>,
    /// Inclusive date range to keep.
    pub date_range: DateRange,
    /// Case statuses to keep.
    pub case_statuses: BTreeSet<String>,
}

impl FilterCriteria {
    /// Creates criteria from any string collections.
    #[must_use]
    pub fn new<T, S>(crime_types: T, date_range: DateRange, case_statuses: S) -> Self
    where
        T: IntoIterator,
        T::Item: Into<String>,
        S: IntoIterator,
        S::Item: Into<String>,
    {
        Self {
            crime_types: crime_types.into_iter().map(Into::into).collect(),
            date_range,
            case_statuses: case_statuses.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns `true` if `record` passes all three predicates.
    #[must_use]
    pub fn matches(&self, record: &CrimeRecord) -> bool {
        self.crime_types.contains(&record.crime_type)
            && self.date_range.contains(record.date)
            && self.case_statuses.contains(&record.case_status)
    }
}
