#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Static all-years reference tables.
//!
//! The dashboard shows a handful of figures computed once over the full
//! 2006-2019 export (dataset summary, per-label pie totals, per-offense
//! totals). They are not derived from the loaded sample, so they live here
//! as TOML baked into the binary via [`include_str!`] and are handed to the
//! presentation layer as plain data.

use std::sync::OnceLock;

use nypd_arrests_arrest_models::Dimension;
use serde::{Deserialize, Serialize};

const SUMMARY_TOML: &str = include_str!("../data/summary.toml");
const DEMOGRAPHICS_TOML: &str = include_str!("../data/demographics.toml");
const OFFENSES_TOML: &str = include_str!("../data/offenses.toml");

/// Errors that can occur while parsing the embedded tables.
#[derive(Debug, thiserror::Error)]
pub enum ReferenceError {
    /// A TOML table failed to parse.
    #[error("Failed to parse {table}.toml: {source}")]
    Parse {
        /// Name of the embedded table.
        table: &'static str,
        /// Underlying TOML error.
        source: toml::de::Error,
    },

    /// A demographic table lists a label outside its dimension's domain.
    #[error("Unknown {dimension} label '{label}' in reference totals")]
    UnknownLabel {
        /// Dimension the label was listed under.
        dimension: Dimension,
        /// The offending label.
        label: String,
    },
}

/// Dataset-wide figures for the full export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetSummary {
    /// First year covered.
    pub first_year: i32,
    /// Last year covered.
    pub last_year: i32,
    /// Total number of arrests.
    pub total_arrests: u64,
    /// Average number of arrests per year.
    pub average_arrests_per_year: u64,
    /// Number of distinct offense descriptions.
    pub unique_offenses: u64,
}

/// All-years arrest count for one label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelTotal {
    /// Raw label.
    pub label: String,
    /// Arrest count.
    pub count: u64,
}

/// All-years arrest counts per demographic label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DemographicTotals {
    pub gender: Vec<LabelTotal>,
    pub race: Vec<LabelTotal>,
    pub age_group: Vec<LabelTotal>,
}

impl DemographicTotals {
    /// Returns the totals of one dimension, in declared label order.
    #[must_use]
    pub fn for_dimension(&self, dimension: Dimension) -> &[LabelTotal] {
        match dimension {
            Dimension::Race => &self.race,
            Dimension::Gender => &self.gender,
            Dimension::AgeGroup => &self.age_group,
        }
    }

    fn validate(&self) -> Result<(), ReferenceError> {
        for dimension in Dimension::all() {
            let labels = dimension.labels();
            for total in self.for_dimension(*dimension) {
                if !labels.contains(&total.label.as_str()) {
                    return Err(ReferenceError::UnknownLabel {
                        dimension: *dimension,
                        label: total.label.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}

/// All-years arrest count for one offense description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OffenseTotal {
    /// Offense description as it appears in the source.
    pub description: String,
    /// Arrest count.
    pub count: u64,
}

#[derive(Deserialize)]
#[serde(rename_all = "snake_case")]
struct RawDemographics {
    gender: Vec<LabelTotal>,
    race: Vec<LabelTotal>,
    age_group: Vec<LabelTotal>,
}

#[derive(Deserialize)]
struct RawOffenses {
    offense: Vec<OffenseTotal>,
}

#[derive(Deserialize)]
#[serde(rename_all = "snake_case")]
struct RawSummary {
    first_year: i32,
    last_year: i32,
    total_arrests: u64,
    average_arrests_per_year: u64,
    unique_offenses: u64,
}

/// Every embedded reference table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceTables {
    pub summary: DatasetSummary,
    pub demographics: DemographicTotals,
    /// Offense totals in source order.
    pub offenses: Vec<OffenseTotal>,
}

impl ReferenceTables {
    /// Parses the embedded TOML tables.
    ///
    /// # Errors
    ///
    /// Returns [`ReferenceError`] if a table does not parse or lists an
    /// undeclared demographic label.
    pub fn load() -> Result<Self, ReferenceError> {
        let summary: RawSummary =
            toml::from_str(SUMMARY_TOML).map_err(|source| ReferenceError::Parse {
                table: "summary",
                source,
            })?;
        let demographics: RawDemographics =
            toml::from_str(DEMOGRAPHICS_TOML).map_err(|source| ReferenceError::Parse {
                table: "demographics",
                source,
            })?;
        let offenses: RawOffenses =
            toml::from_str(OFFENSES_TOML).map_err(|source| ReferenceError::Parse {
                table: "offenses",
                source,
            })?;

        let demographics = DemographicTotals {
            gender: demographics.gender,
            race: demographics.race,
            age_group: demographics.age_group,
        };
        demographics.validate()?;

        Ok(Self {
            summary: DatasetSummary {
                first_year: summary.first_year,
                last_year: summary.last_year,
                total_arrests: summary.total_arrests,
                average_arrests_per_year: summary.average_arrests_per_year,
                unique_offenses: summary.unique_offenses,
            },
            demographics,
            offenses: offenses.offense,
        })
    }

    /// Offense totals sorted by descending count, ties by description.
    #[must_use]
    pub fn offenses_by_count(&self) -> Vec<&OffenseTotal> {
        let mut sorted: Vec<&OffenseTotal> = self.offenses.iter().collect();
        sorted.sort_by(|a, b| {
            b.count
                .cmp(&a.count)
                .then_with(|| a.description.cmp(&b.description))
        });
        sorted
    }
}

/// Returns the process-wide parsed reference tables.
///
/// # Panics
///
/// Panics if the embedded TOML is malformed (the tables are baked in at
/// compile time and covered by tests).
#[must_use]
pub fn tables() -> &'static ReferenceTables {
    static TABLES: OnceLock<ReferenceTables> = OnceLock::new();
    TABLES.get_or_init(|| {
        ReferenceTables::load()
            .unwrap_or_else(|e| panic!("Embedded reference tables are invalid: {e}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_embedded_tables() {
        let tables = ReferenceTables::load().unwrap();
        assert_eq!(tables.summary.total_arrests, 5_005_855);
        assert_eq!(tables.summary.first_year, 2006);
        assert_eq!(tables.summary.last_year, 2019);
        assert_eq!(tables.offenses.len(), 86);
    }

    #[test]
    fn demographic_totals_follow_declared_order() {
        let tables = tables();
        for dimension in Dimension::all() {
            let labels: Vec<&str> = tables
                .demographics
                .for_dimension(*dimension)
                .iter()
                .map(|t| t.label.as_str())
                .collect();
            assert_eq!(labels, dimension.labels(), "{dimension}");
        }
    }

    #[test]
    fn gender_totals_add_up_to_summary() {
        let tables = tables();
        let total: u64 = tables.demographics.gender.iter().map(|t| t.count).sum();
        assert_eq!(total, tables.summary.total_arrests);
    }

    #[test]
    fn offenses_by_count_is_descending() {
        let tables = tables();
        let sorted = tables.offenses_by_count();
        assert_eq!(sorted[0].description, "DANGEROUS DRUGS");
        assert!(sorted.windows(2).all(|w| w[0].count >= w[1].count));
    }
}
