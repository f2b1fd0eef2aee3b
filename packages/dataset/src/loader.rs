//! CSV loader for the historic arrest dataset.
//!
//! Reads the raw NYPD export, keeps only the columns of the arrest schema,
//! and applies the load-time cleanup:
//!
//! 1. rows missing any key field are dropped,
//! 2. rows whose coordinates do not parse are dropped,
//! 3. rows at or above [`MAX_LATITUDE`](crate::MAX_LATITUDE) are dropped,
//! 4. the survivors are optionally down-sampled with a seeded Bernoulli draw.

use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use nypd_arrests_arrest_models::{ArrestRecord, Column};
use rand::rngs::StdRng;
use rand::{Rng as _, SeedableRng as _};
use serde::{Deserialize, Serialize};

use crate::progress::ProgressCallback;
use crate::{Dataset, DatasetError, is_valid_location};

/// Default seed for the load-time sample.
pub const DEFAULT_SAMPLE_SEED: u64 = 42;

const PROGRESS_BATCH: u64 = 10_000;

/// Options controlling how the CSV is read.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadOptions {
    /// Fraction of cleaned rows to keep, in `(0, 1]`. `None` keeps all rows.
    pub sample_fraction: Option<f64>,
    /// Seed for the sampling RNG.
    pub sample_seed: u64,
    /// Maximum number of raw rows to read.
    pub limit: Option<u64>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            sample_fraction: None,
            sample_seed: DEFAULT_SAMPLE_SEED,
            limit: None,
        }
    }
}

/// Row counts collected while loading.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadReport {
    /// Raw rows read from the CSV.
    pub rows_read: u64,
    /// Rows dropped for a missing key field.
    pub missing_fields: u64,
    /// Rows dropped for unparseable coordinates.
    pub invalid_coordinates: u64,
    /// Rows dropped by the latitude bound.
    pub out_of_bounds: u64,
    /// Clean rows left out by sampling.
    pub sampled_out: u64,
    /// Rows kept in the dataset.
    pub kept: u64,
}

impl LoadReport {
    fn record_drop(&mut self, reason: DropReason) {
        match reason {
            DropReason::MissingField => self.missing_fields += 1,
            DropReason::InvalidCoordinates => self.invalid_coordinates += 1,
            DropReason::OutOfBounds => self.out_of_bounds += 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DropReason {
    MissingField,
    InvalidCoordinates,
    OutOfBounds,
}

/// One raw CSV row, restricted to the arrest schema columns.
#[derive(Debug, Deserialize)]
struct RawRow {
    #[serde(rename = "ARREST_DATE", default)]
    arrest_date: Option<String>,
    #[serde(rename = "OFNS_DESC", default)]
    offense_description: Option<String>,
    #[serde(rename = "AGE_GROUP", default)]
    age_group: Option<String>,
    #[serde(rename = "PERP_SEX", default)]
    gender: Option<String>,
    #[serde(rename = "PERP_RACE", default)]
    race: Option<String>,
    #[serde(rename = "LAW_CODE", default)]
    law_code: Option<String>,
    #[serde(rename = "Latitude", default)]
    latitude: Option<String>,
    #[serde(rename = "Longitude", default)]
    longitude: Option<String>,
}

impl RawRow {
    fn into_record(self) -> Result<ArrestRecord, DropReason> {
        let (
            Some(arrest_date),
            Some(offense_description),
            Some(age_group),
            Some(gender),
            Some(race),
            Some(latitude),
            Some(longitude),
        ) = (
            non_empty(self.arrest_date),
            non_empty(self.offense_description),
            non_empty(self.age_group),
            non_empty(self.gender),
            non_empty(self.race),
            non_empty(self.latitude),
            non_empty(self.longitude),
        )
        else {
            return Err(DropReason::MissingField);
        };

        let (Ok(latitude), Ok(longitude)) = (latitude.parse::<f64>(), longitude.parse::<f64>())
        else {
            return Err(DropReason::InvalidCoordinates);
        };

        if !latitude.is_finite() || !longitude.is_finite() {
            return Err(DropReason::InvalidCoordinates);
        }

        if !is_valid_location(latitude, longitude) {
            return Err(DropReason::OutOfBounds);
        }

        Ok(ArrestRecord {
            arrest_date,
            offense_description,
            age_group,
            gender,
            race,
            law_code: non_empty(self.law_code),
            latitude,
            longitude,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            None
        } else if trimmed.len() == v.len() {
            Some(v)
        } else {
            Some(trimmed.to_string())
        }
    })
}

/// Loads the dataset from a CSV file.
///
/// # Errors
///
/// Returns [`DatasetError`] if the file cannot be opened, the header lacks
/// a required column, a row cannot be parsed, or the sample fraction is
/// invalid.
pub fn load_csv(
    path: &Path,
    options: &LoadOptions,
    progress: &Arc<dyn ProgressCallback>,
) -> Result<(Dataset, LoadReport), DatasetError> {
    log::info!("Loading arrests from {}", path.display());
    progress.set_message(format!("Loading {}", path.display()));
    let file = std::fs::File::open(path)?;
    load_reader(file, options, progress)
}

/// Loads the dataset from any CSV byte stream.
///
/// # Errors
///
/// Returns [`DatasetError`] if the header lacks a required column, a row
/// cannot be parsed, or the sample fraction is invalid.
pub fn load_reader<R: Read>(
    reader: R,
    options: &LoadOptions,
    progress: &Arc<dyn ProgressCallback>,
) -> Result<(Dataset, LoadReport), DatasetError> {
    if let Some(fraction) = options.sample_fraction
        && (fraction.is_nan() || fraction <= 0.0 || fraction > 1.0)
    {
        return Err(DatasetError::InvalidSampleFraction { fraction });
    }

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let headers = reader.headers()?.clone();
    for column in Column::required() {
        if !headers.iter().any(|h| h == column.raw_name()) {
            return Err(DatasetError::MissingColumn {
                column: column.raw_name(),
            });
        }
    }

    if let Some(limit) = options.limit {
        progress.set_total(limit);
    }

    let mut rng = StdRng::seed_from_u64(options.sample_seed);
    let mut report = LoadReport::default();
    let mut records = Vec::new();

    for row in reader.deserialize::<RawRow>() {
        let row = row?;
        report.rows_read += 1;

        if report.rows_read % PROGRESS_BATCH == 0 {
            progress.inc(PROGRESS_BATCH);
        }

        match row.into_record() {
            Ok(record) => {
                if let Some(fraction) = options.sample_fraction
                    && !rng.gen_bool(fraction)
                {
                    report.sampled_out += 1;
                } else {
                    records.push(record);
                }
            }
            Err(reason) => report.record_drop(reason),
        }

        if let Some(limit) = options.limit
            && report.rows_read >= limit
        {
            log::info!("Reached limit of {limit} rows, stopping CSV read");
            break;
        }
    }

    progress.inc(report.rows_read % PROGRESS_BATCH);
    report.kept = records.len() as u64;

    log::info!(
        "Loaded {} arrests from {} rows ({} missing fields, {} bad coordinates, {} out of bounds, {} sampled out)",
        report.kept,
        report.rows_read,
        report.missing_fields,
        report.invalid_coordinates,
        report.out_of_bounds,
        report.sampled_out,
    );
    progress.finish(format!("Loaded {} arrests", report.kept));

    Ok((Dataset::new(records), report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::null_progress;

    const CSV: &str = "\
ARREST_KEY,ARREST_DATE,OFNS_DESC,LAW_CODE,AGE_GROUP,PERP_SEX,PERP_RACE,Latitude,Longitude
1,01/05/2016,ROBBERY,PL 1601500,25-44,M,BLACK,40.81,-73.91
2,02/11/2016,DANGEROUS DRUGS,,18-24,F,WHITE HISPANIC,40.67,-73.88
3,03/19/2015,FELONY ASSAULT,PL 1200502,<18,M,WHITE,,-73.95
4,04/23/2015,,PL 1552500,45-64,M,BLACK,40.70,-73.99
5,05/30/2014,PETIT LARCENY,PL 1552500,65+,F,ASIAN / PACIFIC ISLANDER,43.10,-73.99
6,06/02/2014,FORGERY,PL 1702500,25-44,M,OTHER,north,-73.99
";

    fn load(options: &LoadOptions) -> (Dataset, LoadReport) {
        load_reader(CSV.as_bytes(), options, &null_progress()).unwrap()
    }

    #[test]
    fn cleans_rows_and_reports_reasons() {
        let (dataset, report) = load(&LoadOptions::default());
        assert_eq!(report.rows_read, 6);
        assert_eq!(report.missing_fields, 2);
        assert_eq!(report.out_of_bounds, 1);
        assert_eq!(report.invalid_coordinates, 1);
        assert_eq!(report.kept, 2);
        assert_eq!(dataset.len(), 2);
    }

    #[test]
    fn keeps_raw_encodings_and_optional_law_code() {
        let (dataset, _) = load(&LoadOptions::default());
        let first = &dataset.records()[0];
        assert_eq!(first.race, "BLACK");
        assert_eq!(first.law_code.as_deref(), Some("PL 1601500"));
        let second = &dataset.records()[1];
        assert_eq!(second.race, "WHITE HISPANIC");
        assert_eq!(second.law_code, None);
    }

    #[test]
    fn rejects_header_without_required_column() {
        let csv = "ARREST_DATE,OFNS_DESC,AGE_GROUP,PERP_SEX,Latitude,Longitude\n";
        let err = load_reader(csv.as_bytes(), &LoadOptions::default(), &null_progress())
            .unwrap_err();
        assert!(matches!(
            err,
            DatasetError::MissingColumn {
                column: "PERP_RACE"
            }
        ));
    }

    #[test]
    fn rejects_invalid_sample_fraction() {
        for fraction in [0.0, -0.5, 1.5, f64::NAN] {
            let options = LoadOptions {
                sample_fraction: Some(fraction),
                ..LoadOptions::default()
            };
            assert!(matches!(
                load_reader(CSV.as_bytes(), &options, &null_progress()),
                Err(DatasetError::InvalidSampleFraction { .. })
            ));
        }
    }

    #[test]
    fn sampling_is_reproducible_for_a_seed() {
        let options = LoadOptions {
            sample_fraction: Some(0.5),
            sample_seed: 7,
            limit: None,
        };
        let (a, report_a) = load(&options);
        let (b, report_b) = load(&options);
        assert_eq!(a.records(), b.records());
        assert_eq!(report_a, report_b);
        assert_eq!(report_a.kept + report_a.sampled_out, 2);
    }

    #[test]
    fn full_sample_keeps_everything() {
        let options = LoadOptions {
            sample_fraction: Some(1.0),
            ..LoadOptions::default()
        };
        let (dataset, report) = load(&options);
        assert_eq!(dataset.len(), 2);
        assert_eq!(report.sampled_out, 0);
    }

    #[test]
    fn honors_row_limit() {
        let options = LoadOptions {
            limit: Some(1),
            ..LoadOptions::default()
        };
        let (dataset, report) = load(&options);
        assert_eq!(report.rows_read, 1);
        assert_eq!(dataset.len(), 1);
    }
}
