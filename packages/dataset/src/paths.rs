//! Canonical file locations for the arrest dataset.
//!
//! All default paths are relative to the project root's `data/` directory.

use std::path::{Path, PathBuf};

use crate::DatasetError;

/// Environment variable overriding the default CSV location.
pub const CSV_PATH_ENV: &str = "NYPD_ARRESTS_CSV";

/// Environment variable holding the load-time sample fraction.
pub const SAMPLE_ENV: &str = "NYPD_ARRESTS_SAMPLE";

/// Returns the workspace root directory.
///
/// Resolved at compile time from `CARGO_MANIFEST_DIR`.
#[must_use]
pub fn project_root() -> PathBuf {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    manifest_dir
        .ancestors()
        .nth(2)
        .unwrap_or(manifest_dir)
        .to_path_buf()
}

/// Returns the `data/` directory path.
#[must_use]
pub fn data_dir() -> PathBuf {
    project_root().join("data")
}

/// Returns the arrest CSV path.
///
/// Uses `NYPD_ARRESTS_CSV` when set, otherwise `data/arrests.csv`.
#[must_use]
pub fn csv_path() -> PathBuf {
    std::env::var_os(CSV_PATH_ENV)
        .filter(|p| !p.is_empty())
        .map_or_else(|| data_dir().join("arrests.csv"), PathBuf::from)
}

/// Reads the sample fraction from `NYPD_ARRESTS_SAMPLE`.
///
/// Unset or empty means no sampling. Range checking happens at load time.
///
/// # Errors
///
/// Returns [`DatasetError::InvalidSampleSetting`] if the value is not a
/// number.
pub fn sample_fraction() -> Result<Option<f64>, DatasetError> {
    std::env::var(SAMPLE_ENV)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(|v| parse_fraction(&v))
        .transpose()
}

fn parse_fraction(value: &str) -> Result<f64, DatasetError> {
    value
        .trim()
        .parse()
        .map_err(|_| DatasetError::InvalidSampleSetting {
            variable: SAMPLE_ENV,
            value: value.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_dir_is_under_project_root() {
        assert!(data_dir().starts_with(project_root()));
        assert!(data_dir().ends_with("data"));
    }

    #[test]
    fn parses_sample_fraction_values() {
        assert!((parse_fraction(" 0.25 ").unwrap() - 0.25).abs() < f64::EPSILON);
        assert!(matches!(
            parse_fraction("quarter"),
            Err(DatasetError::InvalidSampleSetting { .. })
        ));
    }
}
