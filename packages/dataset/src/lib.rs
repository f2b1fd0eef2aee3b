#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Loading and snapshot handling for the arrest dataset.
//!
//! A [`Dataset`] is an immutable, cheaply cloneable snapshot of cleaned
//! [`ArrestRecord`]s. Every snapshot carries a process-unique
//! [`SnapshotId`] that downstream memoization keys on, so a reloaded table
//! never serves results computed against an older one.

pub mod loader;
pub mod paths;
pub mod progress;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{Datelike as _, NaiveDate, NaiveDateTime};
use nypd_arrests_arrest_models::{ArrestRecord, GeoPoint};

pub use loader::{LoadOptions, LoadReport, load_csv, load_reader};

/// Records at or above this latitude are treated as geocoding errors.
pub const MAX_LATITUDE: f64 = 42.0;

/// Errors that can occur while loading the dataset.
#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    /// I/O error (file open/read).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV parsing failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// The CSV header lacks a required column.
    #[error("CSV header is missing required column '{column}'")]
    MissingColumn {
        /// Raw name of the missing column.
        column: &'static str,
    },

    /// The sampling fraction is outside `(0, 1]`.
    #[error("Invalid sample fraction {fraction}: expected a value in (0, 1]")]
    InvalidSampleFraction {
        /// The fraction that was provided.
        fraction: f64,
    },

    /// `NYPD_ARRESTS_SAMPLE` is set but not a number.
    #[error("Invalid {variable} value '{value}': expected a fraction in (0, 1]")]
    InvalidSampleSetting {
        /// Environment variable name.
        variable: &'static str,
        /// The raw value found.
        value: String,
    },
}

/// Process-unique identity of a [`Dataset`] snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SnapshotId(u64);

impl SnapshotId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the numeric value of this id.
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for SnapshotId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "snapshot-{}", self.0)
    }
}

/// An immutable snapshot of cleaned arrest records.
///
/// Cloning shares the underlying records.
#[derive(Debug, Clone)]
pub struct Dataset {
    id: SnapshotId,
    records: Arc<[ArrestRecord]>,
}

impl Dataset {
    /// Builds a snapshot from already-parsed records.
    ///
    /// Records whose coordinates are not finite or whose latitude is not
    /// below [`MAX_LATITUDE`] are dropped so the snapshot invariants hold
    /// regardless of where the records came from.
    #[must_use]
    pub fn new(records: Vec<ArrestRecord>) -> Self {
        let before = records.len();
        let records: Vec<ArrestRecord> = records
            .into_iter()
            .filter(|r| is_valid_location(r.latitude, r.longitude))
            .collect();

        if records.len() < before {
            log::debug!(
                "Dropped {} record(s) with invalid coordinates",
                before - records.len()
            );
        }

        Self {
            id: SnapshotId::next(),
            records: records.into(),
        }
    }

    /// Returns this snapshot's identity.
    #[must_use]
    pub const fn id(&self) -> SnapshotId {
        self.id
    }

    /// Returns all records in load order.
    #[must_use]
    pub fn records(&self) -> &[ArrestRecord] {
        &self.records
    }

    /// Returns the number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if the snapshot holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns every arrest location in load order.
    #[must_use]
    pub fn points(&self) -> Vec<GeoPoint> {
        self.records.iter().map(ArrestRecord::location).collect()
    }

    /// Returns the earliest and latest arrest year found in the snapshot.
    ///
    /// Records with unparseable dates are ignored. Returns `None` if no
    /// record has a parseable date.
    #[must_use]
    pub fn year_range(&self) -> Option<(i32, i32)> {
        self.records
            .iter()
            .filter_map(|r| arrest_year(&r.arrest_date))
            .fold(None, |acc, year| match acc {
                None => Some((year, year)),
                Some((lo, hi)) => Some((lo.min(year), hi.max(year))),
            })
    }

    /// Number of records per arrest year, ascending by year.
    #[must_use]
    pub fn year_counts(&self) -> BTreeMap<i32, u64> {
        let mut counts = BTreeMap::new();
        for year in self.records.iter().filter_map(|r| arrest_year(&r.arrest_date)) {
            *counts.entry(year).or_insert(0) += 1;
        }
        counts
    }
}

/// Returns `true` if a coordinate pair satisfies the snapshot invariants.
#[must_use]
pub fn is_valid_location(latitude: f64, longitude: f64) -> bool {
    latitude.is_finite() && longitude.is_finite() && latitude < MAX_LATITUDE
}

/// Extracts the year from an arrest date.
///
/// Accepts the source's `MM/DD/YYYY` encoding as well as ISO 8601 dates
/// and datetimes.
#[must_use]
pub fn arrest_year(date: &str) -> Option<i32> {
    let date = date.trim();
    if let Ok(d) = NaiveDate::parse_from_str(date, "%m/%d/%Y") {
        return Some(d.year());
    }
    if let Ok(d) = NaiveDate::parse_from_str(date, "%Y-%m-%d") {
        return Some(d.year());
    }
    NaiveDateTime::parse_from_str(date, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|dt| dt.year())
}

#[cfg(test)]
pub(crate) mod test_support {
    use nypd_arrests_arrest_models::ArrestRecord;

    pub fn record(date: &str, race: &str, latitude: f64) -> ArrestRecord {
        ArrestRecord {
            arrest_date: date.to_string(),
            offense_description: "PETIT LARCENY".to_string(),
            age_group: "25-44".to_string(),
            gender: "M".to_string(),
            race: race.to_string(),
            law_code: None,
            latitude,
            longitude: -73.95,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::record;
    use super::*;

    #[test]
    fn snapshot_ids_are_unique() {
        let a = Dataset::new(Vec::new());
        let b = Dataset::new(Vec::new());
        assert_ne!(a.id(), b.id());
        assert_eq!(a.clone().id(), a.id());
    }

    #[test]
    fn drops_records_outside_latitude_bound() {
        let dataset = Dataset::new(vec![
            record("01/01/2016", "BLACK", 40.7),
            record("01/01/2016", "BLACK", 42.0),
            record("01/01/2016", "BLACK", f64::NAN),
        ]);
        assert_eq!(dataset.len(), 1);
        assert!(dataset.records().iter().all(|r| r.latitude < MAX_LATITUDE));
    }

    #[test]
    fn computes_year_range() {
        let dataset = Dataset::new(vec![
            record("03/14/2012", "BLACK", 40.7),
            record("2019-06-01", "WHITE", 40.7),
            record("not a date", "WHITE", 40.7),
            record("11/30/2006", "OTHER", 40.7),
        ]);
        assert_eq!(dataset.year_range(), Some((2006, 2019)));
    }

    #[test]
    fn year_range_of_empty_snapshot_is_none() {
        assert_eq!(Dataset::new(Vec::new()).year_range(), None);
    }

    #[test]
    fn counts_records_per_year() {
        let dataset = Dataset::new(vec![
            record("01/01/2015", "BLACK", 40.7),
            record("06/15/2016", "WHITE", 40.7),
            record("12/31/2016", "WHITE", 40.7),
            record("not a date", "WHITE", 40.7),
        ]);
        let counts = dataset.year_counts();
        assert_eq!(counts.into_iter().collect::<Vec<_>>(), vec![(2015, 1), (2016, 2)]);
    }

    #[test]
    fn parses_arrest_years() {
        assert_eq!(arrest_year("12/31/2016"), Some(2016));
        assert_eq!(arrest_year("2016-12-31T00:00:00.000"), Some(2016));
        assert_eq!(arrest_year("garbage"), None);
    }
}
