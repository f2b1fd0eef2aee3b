#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Aggregations over arrest dataset snapshots.
//!
//! Four stateless transforms feed the dashboard charts:
//!
//! - [`year::filter_year`] slices a snapshot down to one arrest year
//!   (memoized by [`year::YearFilterCache`]),
//! - [`histogram::histogram`] counts rows per demographic label,
//! - [`ranking::offense_ranking`] ranks the most frequent offenses within a
//!   race subgroup,
//! - [`clustering::cluster`] runs seeded k-means over arrest locations.
//!
//! [`sample::sample`] picks the seeded random subset of a year shown on the
//! map and in the raw-data table.
//!
//! None of them mutate their input, so a failed aggregation never affects
//! the cached snapshot or any other chart.

pub mod clustering;
pub mod histogram;
pub mod ranking;
pub mod sample;
pub mod year;

use nypd_arrests_arrest_models::InvalidLabelError;
use thiserror::Error;

pub use clustering::cluster;
pub use histogram::{histogram, histogram_for};
pub use ranking::{TOP_OFFENSES, offense_ranking, top_offenses};
pub use sample::{DEFAULT_SAMPLE_ROWS, sample, sample_indices};
pub use year::{YearFilterCache, YearSlice, filter_year};

/// Errors that can occur during an aggregation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalyticsError {
    /// A filter matched no rows, so there is nothing to normalize by.
    #[error("No rows match {context}")]
    EmptyInput {
        /// Description of the filter that came up empty.
        context: String,
    },

    /// The point set cannot be split into the requested clusters.
    #[error("Clustering error: {message}")]
    Clustering {
        /// Description of what went wrong.
        message: String,
    },

    /// A parameter is outside its fixed domain.
    #[error("Invalid parameter '{name}': {message}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Description of what went wrong.
        message: String,
    },
}

impl From<InvalidLabelError> for AnalyticsError {
    fn from(e: InvalidLabelError) -> Self {
        Self::InvalidParameter {
            name: e.domain,
            message: e.to_string(),
        }
    }
}
