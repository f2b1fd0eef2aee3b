//! Subcommand implementations shared by the flag-driven and interactive
//! front ends.
//!
//! Each command computes one aggregation and either prints it as a text
//! table or, with `--json`, as pretty-printed JSON.

use std::error::Error;

use nypd_arrests_analytics::{
    cluster, filter_year, histogram_for, offense_ranking, sample, top_offenses,
};
use nypd_arrests_analytics_models::{
    CategoryHistogram, ClusterCentroids, KMeansParams, MatchMode, RankingMode, RankingTable,
};
use nypd_arrests_arrest_models::{ArrestRecord, Column};
use nypd_arrests_dataset::Dataset;
use nypd_arrests_reference::ReferenceTables;
use serde::Serialize;

/// Offenses listed by the text rendering of `summary`.
const SUMMARY_OFFENSES: usize = 10;

/// Arrest count of one year in the loaded snapshot.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YearCount {
    pub year: i32,
    pub arrests: u64,
}

/// Seeded sample of one year's raw records.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordSample<'a> {
    pub year: i32,
    /// Rows in the year before sampling.
    pub total: usize,
    pub seed: u64,
    pub records: Vec<&'a ArrestRecord>,
}

fn emit<T: Serialize + ?Sized>(
    json: bool,
    value: &T,
    render: impl FnOnce(&T) -> String,
) -> Result<(), serde_json::Error> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        println!("{}", render(value));
    }
    Ok(())
}

/// Prints the all-years reference tables.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn summary(json: bool) -> Result<(), Box<dyn Error>> {
    emit(json, nypd_arrests_reference::tables(), render_summary)?;
    Ok(())
}

/// Prints the number of loaded arrests per year.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn years(dataset: &Dataset, json: bool) -> Result<(), Box<dyn Error>> {
    let counts: Vec<YearCount> = dataset
        .year_counts()
        .into_iter()
        .map(|(year, arrests)| YearCount { year, arrests })
        .collect();
    emit(json, counts.as_slice(), render_years)?;
    Ok(())
}

/// Prints a seeded random sample of one year's records under the canonical
/// column names.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn records(
    dataset: &Dataset,
    year: i32,
    rows: usize,
    seed: u64,
    json: bool,
) -> Result<(), Box<dyn Error>> {
    let slice = filter_year(dataset, year);
    let records = RecordSample {
        year,
        total: slice.len(),
        seed,
        records: sample(slice.rows(), rows, seed),
    };
    emit(json, &records, render_records)?;
    Ok(())
}

/// Prints the histogram of one dimension for one year.
///
/// # Errors
///
/// Returns an error for an unknown dimension, a year with no matching
/// rows, or a JSON serialization failure.
pub fn histogram(
    dataset: &Dataset,
    year: i32,
    dimension: &str,
    match_mode: MatchMode,
    json: bool,
) -> Result<(), Box<dyn Error>> {
    let slice = filter_year(dataset, year);
    let histogram = histogram_for(slice.rows(), dimension, match_mode)?;
    emit(json, &histogram, render_histogram)?;
    Ok(())
}

/// Prints the offense ranking of one year, within `race` when given.
///
/// # Errors
///
/// Returns an error for an undeclared race, an empty selection, or a JSON
/// serialization failure.
pub fn offenses(
    dataset: &Dataset,
    year: i32,
    race: Option<&str>,
    mode: RankingMode,
    match_mode: MatchMode,
    json: bool,
) -> Result<(), Box<dyn Error>> {
    let slice = filter_year(dataset, year);
    let table = match race {
        Some(race) => offense_ranking(slice.rows(), race, mode, match_mode)?,
        None => top_offenses(slice.rows(), mode)?,
    };
    emit(json, &table, render_ranking)?;
    Ok(())
}

/// Prints k-means centroids of one year's arrest locations.
///
/// # Errors
///
/// Returns an error if `k` is out of range, the year has too few distinct
/// locations, or JSON serialization fails.
pub fn clusters(
    dataset: &Dataset,
    year: i32,
    k: usize,
    seed: u64,
    json: bool,
) -> Result<(), Box<dyn Error>> {
    let points = filter_year(dataset, year).points();
    log::info!("Clustering {} points of {year} into {k} clusters", points.len());

    let centroids = cluster(&points, &KMeansParams::new(k).with_seed(seed))?;
    emit(json, &centroids, render_clusters)?;
    Ok(())
}

fn render_summary(tables: &ReferenceTables) -> String {
    let summary = &tables.summary;
    let mut lines = vec![
        format!("NYPD arrests {}-{}", summary.first_year, summary.last_year),
        format!("  {:<20} {:>10}", "Total arrests", summary.total_arrests),
        format!(
            "  {:<20} {:>10}",
            "Average per year", summary.average_arrests_per_year
        ),
        format!("  {:<20} {:>10}", "Unique offenses", summary.unique_offenses),
    ];

    for (heading, totals) in [
        ("GENDER", &tables.demographics.gender),
        ("RACE", &tables.demographics.race),
        ("AGE GROUP", &tables.demographics.age_group),
    ] {
        lines.push(String::new());
        lines.push(heading.to_string());
        for total in totals {
            lines.push(format!("  {:<32} {:>10}", total.label, total.count));
        }
    }

    lines.push(String::new());
    lines.push("TOP OFFENSES".to_string());
    for (i, offense) in tables
        .offenses_by_count()
        .into_iter()
        .take(SUMMARY_OFFENSES)
        .enumerate()
    {
        lines.push(format!(
            "  {:>2}. {:<40} {:>10}",
            i + 1,
            offense.description,
            offense.count
        ));
    }

    lines.join("\n")
}

fn render_years(counts: &[YearCount]) -> String {
    let mut lines = vec![format!("{:<6} {:>10}", "YEAR", "ARRESTS")];
    lines.extend(
        counts
            .iter()
            .map(|c| format!("{:<6} {:>10}", c.year, c.arrests)),
    );
    lines.join("\n")
}

fn render_histogram(histogram: &CategoryHistogram) -> String {
    let mut lines = vec![
        format!(
            "{} histogram ({} matching, {} rows, {} matched)",
            histogram.dimension, histogram.match_mode, histogram.total_rows, histogram.matched_total
        ),
        format!(
            "{:<32} {:>8} {:>9} {:>9}",
            "LABEL", "COUNT", "FRACTION", "SHARE"
        ),
    ];
    lines.extend(histogram.entries.iter().map(|e| {
        format!(
            "{:<32} {:>8} {:>9.4} {:>9.4}",
            e.label, e.count, e.fraction, e.share_of_rows
        )
    }));
    lines.join("\n")
}

fn render_ranking(table: &RankingTable) -> String {
    let heading = table.race.map_or_else(
        || "Top offenses, all races".to_string(),
        |race| format!("Top offenses, {race}"),
    );
    let mut lines = vec![
        format!(
            "{heading} ({} rows, {} distinct offenses)",
            table.selected_rows, table.distinct_offenses
        ),
        format!("{:>3}  {:<40} {:>8} {:>10}", "#", "OFFENSE", "COUNT", table.mode),
    ];
    lines.extend(table.entries.iter().enumerate().map(|(i, e)| {
        let rank = i + 1;
        let value = match table.mode {
            RankingMode::Count => e.count.to_string(),
            RankingMode::Fraction => format!("{:.4}", e.value),
        };
        format!("{rank:>3}  {:<40} {:>8} {value:>10}", e.offense, e.count)
    }));
    lines.join("\n")
}

fn render_records(sample: &RecordSample<'_>) -> String {
    let columns = Column::required();
    let mut lines = vec![
        format!(
            "{} of {} arrests in {} (seed {})",
            sample.records.len(),
            sample.total,
            sample.year,
            sample.seed
        ),
        format!(
            "{:<11} {:<36} {:<9} {:<6} {:<30} {:>11} {:>10}",
            columns[0].canonical_name(),
            columns[1].canonical_name(),
            columns[2].canonical_name(),
            columns[3].canonical_name(),
            columns[4].canonical_name(),
            columns[5].canonical_name(),
            columns[6].canonical_name()
        ),
    ];
    lines.extend(sample.records.iter().map(|r| {
        format!(
            "{:<11} {:<36} {:<9} {:<6} {:<30} {:>11.6} {:>10.6}",
            r.arrest_date,
            r.offense_description,
            r.age_group,
            r.gender,
            r.race,
            r.longitude,
            r.latitude
        )
    }));
    lines.join("\n")
}

fn render_clusters(result: &ClusterCentroids) -> String {
    let mut lines = vec![
        format!(
            "{} clusters (seed {}, {} iterations, inertia {:.6})",
            result.centroids.len(),
            result.seed,
            result.iterations,
            result.inertia
        ),
        format!("{:>3}  {:>11} {:>11} {:>8}", "#", "LATITUDE", "LONGITUDE", "SIZE"),
    ];
    lines.extend(
        result
            .centroids
            .iter()
            .zip(&result.cluster_sizes)
            .enumerate()
            .map(|(i, (c, size))| {
                format!(
                    "{:>3}  {:>11.6} {:>11.6} {:>8}",
                    i + 1,
                    c.latitude,
                    c.longitude,
                    size
                )
            }),
    );
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use nypd_arrests_analytics_models::{HistogramEntry, RankingEntry};
    use nypd_arrests_arrest_models::{Dimension, GeoPoint, Race};

    use super::*;

    #[test]
    fn summary_lists_top_offenses_first() {
        let text = render_summary(nypd_arrests_reference::tables());
        assert!(text.starts_with("NYPD arrests 2006-2019"));
        let top = text.lines().find(|l| l.trim_start().starts_with("1.")).unwrap();
        assert!(top.contains("DANGEROUS DRUGS"));
        let listed = text
            .lines()
            .skip_while(|l| *l != "TOP OFFENSES")
            .skip(1)
            .count();
        assert_eq!(listed, SUMMARY_OFFENSES);
    }

    #[test]
    fn histogram_table_has_one_line_per_label() {
        let histogram = CategoryHistogram {
            dimension: Dimension::Gender,
            match_mode: MatchMode::Exact,
            total_rows: 4,
            matched_total: 4,
            entries: vec![
                HistogramEntry {
                    label: "M".to_string(),
                    count: 3,
                    fraction: 0.75,
                    share_of_rows: 0.75,
                },
                HistogramEntry {
                    label: "F".to_string(),
                    count: 1,
                    fraction: 0.25,
                    share_of_rows: 0.25,
                },
            ],
        };
        let text = render_histogram(&histogram);
        assert_eq!(text.lines().count(), 4);
        assert!(text.starts_with("gender histogram (exact matching"));
        assert!(text.contains("0.7500"));
    }

    #[test]
    fn ranking_table_names_the_race() {
        let table = RankingTable {
            race: Some(Race::WhiteHispanic),
            mode: RankingMode::Fraction,
            selected_rows: 2,
            distinct_offenses: 1,
            entries: vec![RankingEntry {
                offense: "ROBBERY".to_string(),
                count: 2,
                value: 1.0,
            }],
        };
        let text = render_ranking(&table);
        assert!(text.starts_with("Top offenses, WHITE HISPANIC"));
        assert!(text.contains("1.0000"));
    }

    #[test]
    fn cluster_table_pairs_centroids_with_sizes() {
        let result = ClusterCentroids {
            centroids: vec![GeoPoint::new(40.7, -73.9), GeoPoint::new(40.8, -73.8)],
            cluster_sizes: vec![3, 5],
            inertia: 0.5,
            iterations: 2,
            seed: 42,
        };
        let text = render_clusters(&result);
        let rows: Vec<&str> = text.lines().skip(2).collect();
        assert_eq!(rows.len(), 2);
        assert!(rows[1].ends_with('5'));
    }

    #[test]
    fn year_table_lists_each_year() {
        let text = render_years(&[
            YearCount {
                year: 2015,
                arrests: 1,
            },
            YearCount {
                year: 2016,
                arrests: 2,
            },
        ]);
        assert_eq!(text.lines().count(), 3);
        assert!(text.lines().nth(2).unwrap().starts_with("2016"));
    }

    #[test]
    fn record_table_is_headed_by_canonical_names() {
        let rows: Vec<ArrestRecord> = ["01/02/2016", "03/04/2016", "05/06/2016"]
            .into_iter()
            .map(|date| ArrestRecord {
                arrest_date: date.to_string(),
                offense_description: "ROBBERY".to_string(),
                age_group: "18-24".to_string(),
                gender: "F".to_string(),
                race: "WHITE".to_string(),
                law_code: None,
                latitude: 40.7,
                longitude: -73.9,
            })
            .collect();
        let picked = RecordSample {
            year: 2016,
            total: rows.len(),
            seed: 42,
            records: sample(&rows, 2, 42),
        };

        let text = render_records(&picked);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "2 of 3 arrests in 2016 (seed 42)");
        assert!(lines[1].starts_with("arrest date"));
        assert!(lines[1].contains("offense description"));
        assert!(lines[2].contains("ROBBERY"));
        assert!(lines[3].ends_with("40.700000"));
    }

    #[test]
    fn count_ranking_prints_counts() {
        let table = RankingTable {
            race: None,
            mode: RankingMode::Count,
            selected_rows: 3,
            distinct_offenses: 1,
            entries: vec![RankingEntry {
                offense: "FORGERY".to_string(),
                count: 3,
                value: 3.0,
            }],
        };
        let text = render_ranking(&table);
        assert!(text.starts_with("Top offenses, all races"));
        assert!(text.lines().nth(2).unwrap().ends_with(" 3"));
    }
}
