#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the NYPD arrests server.
//!
//! Aggregation results ([`CategoryHistogram`], [`RankingTable`],
//! [`ClusterCentroids`]) are already chart-ready and are serialized as-is.
//! The types here cover query parameters and the few responses that
//! combine several sources.
//!
//! [`CategoryHistogram`]: nypd_arrests_analytics_models::CategoryHistogram
//! [`RankingTable`]: nypd_arrests_analytics_models::RankingTable
//! [`ClusterCentroids`]: nypd_arrests_analytics_models::ClusterCentroids

use nypd_arrests_analytics_models::{MatchMode, RankingMode};
use nypd_arrests_arrest_models::{ArrestRecord, Dimension, GeoPoint};
use nypd_arrests_reference::{DatasetSummary, LabelTotal};
use serde::{Deserialize, Serialize};

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHealth {
    /// Whether the service is healthy.
    pub healthy: bool,
    /// Server version.
    pub version: String,
}

/// Error body returned with every non-2xx response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub error: String,
}

/// Inclusive range of arrest years.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiYearRange {
    pub first: i32,
    pub last: i32,
}

/// Response of `GET /api/summary`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiSummary {
    /// All-years figures from the reference tables.
    pub reference: DatasetSummary,
    /// Identity of the loaded snapshot.
    pub snapshot: String,
    /// Rows in the loaded snapshot.
    pub loaded_arrests: u64,
    /// Years observed in the loaded snapshot, if any row has a valid date.
    pub observed_years: Option<ApiYearRange>,
}

/// Response of `GET /api/reference/totals`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiReferenceTotals {
    pub dimension: Dimension,
    pub totals: Vec<LabelTotal>,
}

/// Response of `GET /api/points`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiPoints {
    /// Year the points were filtered to.
    pub year: i32,
    /// Rows in the year slice before `limit` was applied.
    pub total: u64,
    /// Arrest locations.
    pub points: Vec<GeoPoint>,
}

/// Response of `GET /api/records`.
///
/// Records serialize under the canonical lower-case column names.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiRecords {
    pub year: i32,
    /// Rows in the year slice before sampling.
    pub total: u64,
    /// Seed the sample was drawn with.
    pub seed: u64,
    /// Sampled rows in dataset order.
    pub records: Vec<ArrestRecord>,
}

/// Query parameters for `GET /api/reference/totals`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TotalsQuery {
    /// `race`, `gender` or `age group`.
    pub dimension: String,
}

/// Query parameters for `GET /api/points`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointsQuery {
    pub year: i32,
    /// Maximum number of points to return, sampled at random. Omitted
    /// returns every point.
    pub limit: Option<usize>,
    /// Sampling seed; defaults to the analytics default seed.
    pub seed: Option<u64>,
}

/// Query parameters for `GET /api/records`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordsQuery {
    pub year: i32,
    /// Number of rows to sample; defaults to 100.
    pub limit: Option<usize>,
    pub seed: Option<u64>,
}

/// Query parameters for `GET /api/histogram`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistogramQuery {
    pub year: i32,
    /// `race`, `gender` or `age group`.
    pub dimension: String,
    /// Defaults to substring matching.
    pub match_mode: Option<MatchMode>,
}

/// Query parameters for `GET /api/offenses`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OffensesQuery {
    pub year: i32,
    /// Raw race label. Omitted ranks across all races.
    pub race: Option<String>,
    /// Defaults to [`RankingMode::Fraction`].
    pub mode: Option<RankingMode>,
    /// Defaults to substring matching.
    pub match_mode: Option<MatchMode>,
}

/// Query parameters for `GET /api/clusters`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClustersQuery {
    pub year: i32,
    /// Number of clusters.
    pub k: usize,
    /// RNG seed; defaults to the analytics default seed.
    pub seed: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offenses_query_accepts_snake_case_modes() {
        let query: OffensesQuery = serde_json::from_str(
            r#"{"year":2016,"race":"WHITE HISPANIC","mode":"count","matchMode":"exact"}"#,
        )
        .unwrap();
        assert_eq!(query.mode, Some(RankingMode::Count));
        assert_eq!(query.match_mode, Some(MatchMode::Exact));
        assert_eq!(query.race.as_deref(), Some("WHITE HISPANIC"));
    }

    #[test]
    fn summary_serializes_camel_case() {
        let json = serde_json::to_value(ApiYearRange {
            first: 2006,
            last: 2019,
        })
        .unwrap();
        assert_eq!(json["first"], 2006);

        let points = ApiPoints {
            year: 2016,
            total: 0,
            points: Vec::new(),
        };
        let json = serde_json::to_value(points).unwrap();
        assert!(json.get("points").is_some());
    }

    #[test]
    fn records_query_fields_are_optional() {
        let query: RecordsQuery = serde_json::from_str(r#"{"year":2012}"#).unwrap();
        assert_eq!(query.year, 2012);
        assert_eq!(query.limit, None);
        assert_eq!(query.seed, None);
    }
}
