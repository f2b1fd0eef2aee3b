//! Categorical histogram over one demographic dimension.

use nypd_arrests_analytics_models::{CategoryHistogram, HistogramEntry, MatchMode};
use nypd_arrests_arrest_models::{ArrestRecord, Dimension};

use crate::AnalyticsError;

/// Counts rows per declared label of `dimension` and normalizes by the sum
/// of the counts.
///
/// Entries follow the declared label order, not frequency. Under
/// [`MatchMode::Substring`] one row can count toward several labels
/// (`WHITE HISPANIC` also matches `WHITE`), so the counts may add up to
/// more than the number of rows; `fraction` still sums to 1.0 while
/// `share_of_rows` exposes the overlap.
///
/// # Errors
///
/// Returns [`AnalyticsError::EmptyInput`] if no row matches any label.
#[allow(clippy::cast_precision_loss)]
pub fn histogram(
    rows: &[ArrestRecord],
    dimension: Dimension,
    match_mode: MatchMode,
) -> Result<CategoryHistogram, AnalyticsError> {
    let counts: Vec<(&'static str, u64)> = dimension
        .labels()
        .into_iter()
        .map(|label| {
            let count = rows
                .iter()
                .filter(|r| match_mode.matches(r.field(dimension), label))
                .count() as u64;
            (label, count)
        })
        .collect();

    let matched_total: u64 = counts.iter().map(|(_, c)| c).sum();
    if matched_total == 0 {
        return Err(AnalyticsError::EmptyInput {
            context: format!("any {dimension} label ({} rows considered)", rows.len()),
        });
    }

    let total_rows = rows.len() as u64;
    let entries = counts
        .into_iter()
        .map(|(label, count)| HistogramEntry {
            label: label.to_string(),
            count,
            fraction: count as f64 / matched_total as f64,
            share_of_rows: count as f64 / total_rows as f64,
        })
        .collect();

    Ok(CategoryHistogram {
        dimension,
        match_mode,
        total_rows,
        matched_total,
        entries,
    })
}

/// [`histogram`] with the dimension given as a selector string
/// (`race`, `gender` or `age group`).
///
/// # Errors
///
/// Returns [`AnalyticsError::InvalidParameter`] for an unknown selector and
/// [`AnalyticsError::EmptyInput`] if no row matches any label.
pub fn histogram_for(
    rows: &[ArrestRecord],
    selector: &str,
    match_mode: MatchMode,
) -> Result<CategoryHistogram, AnalyticsError> {
    let dimension = Dimension::from_selector(selector)?;
    histogram(rows, dimension, match_mode)
}
