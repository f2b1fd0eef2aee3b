//! Top-N offense rankings.

use std::collections::BTreeMap;

use nypd_arrests_analytics_models::{MatchMode, RankingEntry, RankingMode, RankingTable};
use nypd_arrests_arrest_models::{ArrestRecord, Race};

use crate::AnalyticsError;

/// Number of offenses kept in a ranking.
pub const TOP_OFFENSES: usize = 20;

/// Ranks the most frequent offenses among rows whose race matches `race`.
///
/// `race` must be one of the eight declared race labels. Rows are selected
/// with `match_mode`, so under [`MatchMode::Substring`] ranking `WHITE`
/// also covers `WHITE HISPANIC` rows.
///
/// # Errors
///
/// Returns [`AnalyticsError::InvalidParameter`] for an undeclared race
/// label and [`AnalyticsError::EmptyInput`] if no row matches it.
pub fn offense_ranking(
    rows: &[ArrestRecord],
    race: &str,
    mode: RankingMode,
    match_mode: MatchMode,
) -> Result<RankingTable, AnalyticsError> {
    let race = Race::from_label(race)?;
    let selected: Vec<&ArrestRecord> = rows
        .iter()
        .filter(|r| match_mode.matches(&r.race, race.label()))
        .collect();

    if selected.is_empty() {
        return Err(AnalyticsError::EmptyInput {
            context: format!("race '{race}' ({} rows considered)", rows.len()),
        });
    }

    Ok(rank(&selected, Some(race), mode))
}

/// Ranks the most frequent offenses across all rows.
///
/// # Errors
///
/// Returns [`AnalyticsError::EmptyInput`] if `rows` is empty.
pub fn top_offenses(
    rows: &[ArrestRecord],
    mode: RankingMode,
) -> Result<RankingTable, AnalyticsError> {
    if rows.is_empty() {
        return Err(AnalyticsError::EmptyInput {
            context: "the offense ranking (no rows)".to_string(),
        });
    }

    let selected: Vec<&ArrestRecord> = rows.iter().collect();
    Ok(rank(&selected, None, mode))
}

#[allow(clippy::cast_precision_loss)]
fn rank(selected: &[&ArrestRecord], race: Option<Race>, mode: RankingMode) -> RankingTable {
    let mut counts: BTreeMap<&str, u64> = BTreeMap::new();
    for record in selected {
        *counts.entry(record.offense_description.as_str()).or_insert(0) += 1;
    }

    let distinct_offenses = counts.len() as u64;
    let mut ranked: Vec<(&str, u64)> = counts.into_iter().collect();
    // Descending by count; BTreeMap order already sorted labels, and the
    // stable sort keeps that order among equal counts.
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked.truncate(TOP_OFFENSES);

    let selected_rows = selected.len() as u64;
    let entries = ranked
        .into_iter()
        .map(|(offense, count)| RankingEntry {
            offense: offense.to_string(),
            count,
            value: match mode {
                RankingMode::Count => count as f64,
                RankingMode::Fraction => count as f64 / selected_rows as f64,
            },
        })
        .collect();

    RankingTable {
        race,
        mode,
        selected_rows,
        distinct_offenses,
        entries,
    }
}
