#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line explorer for the NYPD historic arrests dataset.
//!
//! Every subcommand prints one chart-ready table: the all-years reference
//! summary, per-year arrest counts, a seeded sample of raw records, a
//! demographic histogram, an offense ranking, or k-means centroids. `serve`
//! starts the HTTP API instead. Without a subcommand an interactive menu is
//! shown.
//!
//! Uses `indicatif-log-bridge` (via [`nypd_arrests_cli_utils::init_logger`])
//! so that log lines and the CSV loading progress bar never fight for the
//! terminal.

mod commands;
mod interactive;

use std::path::PathBuf;
use std::time::Instant;

use clap::{Args, Parser, Subcommand};
use nypd_arrests_analytics::DEFAULT_SAMPLE_ROWS;
use nypd_arrests_analytics_models::{DEFAULT_SEED, MatchMode, RankingMode};
use nypd_arrests_cli_utils::{IndicatifProgress, MultiProgress};
use nypd_arrests_dataset::loader::DEFAULT_SAMPLE_SEED;
use nypd_arrests_dataset::{Dataset, LoadOptions, load_csv, paths};
use nypd_arrests_server::ServerConfig;

#[derive(Parser)]
#[command(name = "nypd_arrests", about = "NYPD historic arrests explorer")]
struct Cli {
    #[command(flatten)]
    data: DataArgs,

    /// Print JSON instead of a text table
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Options controlling how the arrests CSV is loaded.
#[derive(Args, Clone)]
pub struct DataArgs {
    /// Path to the arrests CSV (overrides `NYPD_ARRESTS_CSV`)
    #[arg(long, global = true)]
    csv: Option<PathBuf>,
    /// Fraction of clean rows to keep, in (0, 1] (overrides `NYPD_ARRESTS_SAMPLE`)
    #[arg(long, global = true)]
    sample: Option<f64>,
    /// Seed for the load-time sample
    #[arg(long, global = true, default_value_t = DEFAULT_SAMPLE_SEED)]
    sample_seed: u64,
    /// Maximum number of raw CSV rows to read (for testing)
    #[arg(long, global = true)]
    limit: Option<u64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the all-years reference summary and totals
    Summary,
    /// Count loaded arrests per year
    Years,
    /// Random sample of one year's raw records
    Records {
        #[arg(long)]
        year: i32,
        /// Number of records to show
        #[arg(long, default_value_t = DEFAULT_SAMPLE_ROWS)]
        rows: usize,
        /// Seed for the sample
        #[arg(long, default_value_t = DEFAULT_SEED)]
        seed: u64,
    },
    /// Histogram of one demographic dimension for a year
    Histogram {
        #[arg(long)]
        year: i32,
        /// `race`, `gender` or `age group`
        #[arg(long, default_value = "race")]
        dimension: String,
        /// Match labels exactly instead of by substring
        #[arg(long)]
        exact: bool,
    },
    /// Top 20 offenses for a year, optionally within one race
    Offenses {
        #[arg(long)]
        year: i32,
        /// Raw race label (e.g. "WHITE HISPANIC"); omit for all races
        #[arg(long)]
        race: Option<String>,
        /// `count` or `fraction`
        #[arg(long, default_value = "fraction", value_parser = parse_ranking_mode)]
        mode: RankingMode,
        /// Match the race exactly instead of by substring
        #[arg(long)]
        exact: bool,
    },
    /// K-means centroids of a year's arrest locations
    Clusters {
        #[arg(long)]
        year: i32,
        /// Number of clusters
        #[arg(long)]
        k: usize,
        /// Seed for centroid initialization
        #[arg(long, default_value_t = DEFAULT_SEED)]
        seed: u64,
    },
    /// Start the HTTP API server (`BIND_ADDR`, `PORT`)
    Serve,
}

fn parse_ranking_mode(value: &str) -> Result<RankingMode, String> {
    value
        .parse()
        .map_err(|_| format!("expected `count` or `fraction`, got '{value}'"))
}

const fn match_mode(exact: bool) -> MatchMode {
    if exact {
        MatchMode::Exact
    } else {
        MatchMode::Substring
    }
}

/// Loads the dataset described by `args`, rendering progress on `multi`.
///
/// # Errors
///
/// Returns an error if the sample setting is invalid or the CSV cannot be
/// loaded.
pub fn load_dataset(
    multi: &MultiProgress,
    args: &DataArgs,
) -> Result<Dataset, Box<dyn std::error::Error>> {
    let path = args.csv.clone().unwrap_or_else(paths::csv_path);
    let sample_fraction = match args.sample {
        Some(fraction) => Some(fraction),
        None => paths::sample_fraction()?,
    };
    let options = LoadOptions {
        sample_fraction,
        sample_seed: args.sample_seed,
        limit: args.limit,
    };

    let progress = IndicatifProgress::rows_bar(multi, "Loading arrests");
    let start = Instant::now();
    let (dataset, _report) = load_csv(&path, &options, &progress)?;
    log::info!(
        "Loaded {} arrests in {:.1}s",
        dataset.len(),
        start.elapsed().as_secs_f64()
    );

    Ok(dataset)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = nypd_arrests_cli_utils::init_logger();
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        return interactive::run(&multi, &cli.data);
    };

    match command {
        Commands::Summary => commands::summary(cli.json)?,
        Commands::Years => {
            let dataset = load_dataset(&multi, &cli.data)?;
            commands::years(&dataset, cli.json)?;
        }
        Commands::Records { year, rows, seed } => {
            let dataset = load_dataset(&multi, &cli.data)?;
            commands::records(&dataset, year, rows, seed, cli.json)?;
        }
        Commands::Histogram {
            year,
            dimension,
            exact,
        } => {
            let dataset = load_dataset(&multi, &cli.data)?;
            commands::histogram(&dataset, year, &dimension, match_mode(exact), cli.json)?;
        }
        Commands::Offenses {
            year,
            race,
            mode,
            exact,
        } => {
            let dataset = load_dataset(&multi, &cli.data)?;
            commands::offenses(
                &dataset,
                year,
                race.as_deref(),
                mode,
                match_mode(exact),
                cli.json,
            )?;
        }
        Commands::Clusters { year, k, seed } => {
            let dataset = load_dataset(&multi, &cli.data)?;
            commands::clusters(&dataset, year, k, seed, cli.json)?;
        }
        Commands::Serve => {
            let dataset = load_dataset(&multi, &cli.data)?;
            actix_web::rt::System::new()
                .block_on(nypd_arrests_server::serve(dataset, ServerConfig::from_env()))?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory as _;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_offenses_flags() {
        let cli = Cli::parse_from([
            "nypd_arrests",
            "offenses",
            "--year",
            "2016",
            "--race",
            "WHITE HISPANIC",
            "--mode",
            "count",
            "--json",
        ]);
        assert!(cli.json);
        match cli.command {
            Some(Commands::Offenses {
                year, race, mode, ..
            }) => {
                assert_eq!(year, 2016);
                assert_eq!(race.as_deref(), Some("WHITE HISPANIC"));
                assert_eq!(mode, RankingMode::Count);
            }
            _ => panic!("expected offenses subcommand"),
        }
    }

    #[test]
    fn rejects_unknown_ranking_mode() {
        assert!(parse_ranking_mode("median").is_err());
        assert_eq!(parse_ranking_mode("fraction"), Ok(RankingMode::Fraction));
    }

    #[test]
    fn global_data_flags_follow_the_subcommand() {
        let cli = Cli::parse_from([
            "nypd_arrests",
            "clusters",
            "--year",
            "2010",
            "--k",
            "8",
            "--sample",
            "0.1",
            "--csv",
            "arrests.csv",
        ]);
        assert_eq!(cli.data.sample, Some(0.1));
        assert_eq!(cli.data.csv, Some(PathBuf::from("arrests.csv")));
        assert_eq!(cli.data.sample_seed, DEFAULT_SAMPLE_SEED);
        assert!(matches!(
            cli.command,
            Some(Commands::Clusters { k: 8, seed: DEFAULT_SEED, .. })
        ));
    }

    #[test]
    fn records_rows_do_not_clash_with_the_load_limit() {
        let cli = Cli::parse_from([
            "nypd_arrests",
            "records",
            "--year",
            "2012",
            "--rows",
            "5",
            "--limit",
            "1000",
        ]);
        assert_eq!(cli.data.limit, Some(1000));
        assert!(matches!(
            cli.command,
            Some(Commands::Records { year: 2012, rows: 5, seed: DEFAULT_SEED })
        ));
    }
}
