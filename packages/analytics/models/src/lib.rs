#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Parameter and result types for the arrest aggregations.
//!
//! Every result here is a small in-memory table meant to be handed straight
//! to a charting layer: label/value rows for histograms and rankings, and a
//! coordinate list for cluster centroids.

use nypd_arrests_arrest_models::{Dimension, GeoPoint, Race};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Smallest accepted cluster count.
pub const MIN_CLUSTERS: usize = 1;
/// Largest accepted cluster count.
pub const MAX_CLUSTERS: usize = 50;
/// Seed used when the caller does not pick one.
pub const DEFAULT_SEED: u64 = 42;
/// Iteration cap for Lloyd refinement.
pub const DEFAULT_MAX_ITERATIONS: usize = 300;
/// Convergence threshold on the largest centroid shift, in degrees.
pub const DEFAULT_TOLERANCE: f64 = 1e-7;

/// How a category label is matched against a record field.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MatchMode {
    /// The field contains the label anywhere (case-sensitive). A
    /// `WHITE HISPANIC` record therefore also matches `WHITE`.
    #[default]
    Substring,
    /// The field equals the label.
    Exact,
}

impl MatchMode {
    /// Returns `true` if `field` matches `label` under this mode.
    #[must_use]
    pub fn matches(self, field: &str, label: &str) -> bool {
        match self {
            Self::Substring => field.contains(label),
            Self::Exact => field == label,
        }
    }
}

/// Whether rankings report raw counts or fractions of the selected rows.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RankingMode {
    /// Number of matching rows.
    Count,
    /// Matching rows divided by all selected rows.
    #[default]
    Fraction,
}

/// One row of a [`CategoryHistogram`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistogramEntry {
    /// Category label in its raw encoding.
    pub label: String,
    /// Rows whose field matched the label.
    pub count: u64,
    /// `count` divided by the sum of all counts in the histogram.
    pub fraction: f64,
    /// `count` divided by the number of rows considered. With substring
    /// matching these can add up to more than 1.0.
    pub share_of_rows: f64,
}

/// Per-label counts along one demographic dimension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryHistogram {
    /// Dimension the histogram was computed over.
    pub dimension: Dimension,
    /// Matching strategy used.
    pub match_mode: MatchMode,
    /// Rows considered.
    pub total_rows: u64,
    /// Sum of all entry counts (the normalization denominator).
    pub matched_total: u64,
    /// Entries in declared label order.
    pub entries: Vec<HistogramEntry>,
}

impl CategoryHistogram {
    /// Looks up the entry for a label.
    #[must_use]
    pub fn get(&self, label: &str) -> Option<&HistogramEntry> {
        self.entries.iter().find(|e| e.label == label)
    }

    /// Sum of all entry fractions.
    #[must_use]
    pub fn fraction_sum(&self) -> f64 {
        self.entries.iter().map(|e| e.fraction).sum()
    }
}

/// One row of a [`RankingTable`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankingEntry {
    /// Offense description.
    pub offense: String,
    /// Rows with this offense.
    pub count: u64,
    /// Reported value: `count` or its fraction, depending on the mode.
    pub value: f64,
}

/// Most frequent offenses within a selection of rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankingTable {
    /// Race the rows were selected by, `None` for all races.
    pub race: Option<Race>,
    /// Reporting mode of [`RankingEntry::value`].
    pub mode: RankingMode,
    /// Rows in the selection.
    pub selected_rows: u64,
    /// Distinct offenses in the selection before truncation.
    pub distinct_offenses: u64,
    /// Entries, descending by count, ties by offense name.
    pub entries: Vec<RankingEntry>,
}

/// Parameters for k-means clustering.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KMeansParams {
    /// Requested number of clusters.
    pub k: usize,
    /// RNG seed for centroid initialization.
    pub seed: u64,
    /// Iteration cap.
    pub max_iterations: usize,
    /// Stop once no centroid moves further than this (degrees).
    pub tolerance: f64,
}

impl KMeansParams {
    /// Creates parameters for `k` clusters with default seed and limits.
    #[must_use]
    pub const fn new(k: usize) -> Self {
        Self {
            k,
            seed: DEFAULT_SEED,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            tolerance: DEFAULT_TOLERANCE,
        }
    }

    /// Overrides the seed.
    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

/// Result of a clustering run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterCentroids {
    /// One centroid per cluster.
    pub centroids: Vec<GeoPoint>,
    /// Number of points assigned to each centroid, aligned with `centroids`.
    pub cluster_sizes: Vec<u64>,
    /// Sum of squared distances from each point to its centroid.
    pub inertia: f64,
    /// Lloyd iterations performed.
    pub iterations: usize,
    /// Seed that produced this result.
    pub seed: u64,
}
