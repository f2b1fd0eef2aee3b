//! Interactive menu for the arrests explorer.
//!
//! Lets users pick a chart and its parameters with `dialoguer` prompts
//! instead of memorizing subcommand flags. The dataset is loaded once and
//! reused for every chart until the user quits.

use dialoguer::{Input, Select};
use nypd_arrests_analytics::DEFAULT_SAMPLE_ROWS;
use nypd_arrests_analytics_models::{DEFAULT_SEED, MatchMode, RankingMode};
use nypd_arrests_arrest_models::{Dimension, Race};
use nypd_arrests_cli_utils::{IndicatifProgress, MultiProgress};
use nypd_arrests_dataset::Dataset;

use crate::{DataArgs, commands, load_dataset};

/// Default cluster count offered by the prompt.
const DEFAULT_CLUSTERS: usize = 8;

/// Top-level action selection.
enum Action {
    Summary,
    Years,
    Records,
    Histogram,
    Offenses,
    Clusters,
    Serve,
    Quit,
}

impl Action {
    const ALL: &[Self] = &[
        Self::Summary,
        Self::Years,
        Self::Records,
        Self::Histogram,
        Self::Offenses,
        Self::Clusters,
        Self::Serve,
        Self::Quit,
    ];

    #[must_use]
    const fn label(&self) -> &'static str {
        match self {
            Self::Summary => "Show all-years summary",
            Self::Years => "Count arrests per year",
            Self::Records => "Sample raw records",
            Self::Histogram => "Demographic histogram",
            Self::Offenses => "Top offenses",
            Self::Clusters => "Arrest location clusters",
            Self::Serve => "Start API server",
            Self::Quit => "Quit",
        }
    }
}

/// Runs the interactive menu loop.
///
/// Aggregation failures (an empty year, too few points to cluster) are
/// logged and the menu is shown again.
///
/// # Errors
///
/// Returns an error if user input fails, the dataset cannot be loaded, or
/// the server fails to start.
pub fn run(multi: &MultiProgress, args: &DataArgs) -> Result<(), Box<dyn std::error::Error>> {
    println!("NYPD Arrests Explorer");
    println!();

    let labels: Vec<&str> = Action::ALL.iter().map(Action::label).collect();
    let mut dataset: Option<Dataset> = None;

    loop {
        let idx = Select::new()
            .with_prompt("What would you like to do?")
            .items(&labels)
            .default(0)
            .interact()?;

        let action = &Action::ALL[idx];
        let result = match action {
            Action::Quit => return Ok(()),
            Action::Summary => commands::summary(false),
            Action::Serve => {
                let progress = IndicatifProgress::rows_bar(multi, "Loading arrests");
                actix_web::rt::System::new()
                    .block_on(nypd_arrests_server::interactive::run(progress))?;
                return Ok(());
            }
            Action::Years
            | Action::Records
            | Action::Histogram
            | Action::Offenses
            | Action::Clusters => {
                if dataset.is_none() {
                    dataset = Some(load_dataset(multi, args)?);
                }
                match dataset.as_ref() {
                    Some(dataset) => run_chart(action, dataset),
                    None => Ok(()),
                }
            }
        };

        if let Err(e) = result {
            log::error!("{e}");
        }
        println!();
    }
}

fn run_chart(action: &Action, dataset: &Dataset) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        Action::Years => commands::years(dataset, false),
        Action::Records => {
            let year = prompt_year(dataset)?;
            let rows: usize = Input::new()
                .with_prompt("Number of records")
                .default(DEFAULT_SAMPLE_ROWS)
                .interact_text()?;
            let seed: u64 = Input::new()
                .with_prompt("Seed")
                .default(DEFAULT_SEED)
                .interact_text()?;
            commands::records(dataset, year, rows, seed, false)
        }
        Action::Histogram => {
            let year = prompt_year(dataset)?;
            let dimensions = Dimension::all();
            let names: Vec<String> = dimensions.iter().map(ToString::to_string).collect();
            let idx = Select::new()
                .with_prompt("Dimension")
                .items(&names)
                .default(0)
                .interact()?;
            let match_mode = prompt_match_mode()?;
            commands::histogram(
                dataset,
                year,
                dimensions[idx].as_ref(),
                match_mode,
                false,
            )
        }
        Action::Offenses => {
            let year = prompt_year(dataset)?;
            let mut races = vec!["All races"];
            races.extend(Race::all().iter().map(|r| r.label()));
            let idx = Select::new()
                .with_prompt("Race")
                .items(&races)
                .default(0)
                .interact()?;
            let race = (idx > 0).then(|| races[idx]);

            let modes = [RankingMode::Fraction, RankingMode::Count];
            let mode_idx = Select::new()
                .with_prompt("Report")
                .items(&["Fraction of the race's arrests", "Raw counts"])
                .default(0)
                .interact()?;
            let match_mode = if race.is_some() {
                prompt_match_mode()?
            } else {
                MatchMode::default()
            };

            commands::offenses(dataset, year, race, modes[mode_idx], match_mode, false)
        }
        Action::Clusters => {
            let year = prompt_year(dataset)?;
            let k: usize = Input::new()
                .with_prompt("Number of clusters")
                .default(DEFAULT_CLUSTERS)
                .interact_text()?;
            let seed: u64 = Input::new()
                .with_prompt("Seed")
                .default(DEFAULT_SEED)
                .interact_text()?;
            commands::clusters(dataset, year, k, seed, false)
        }
        Action::Summary | Action::Serve | Action::Quit => Ok(()),
    }
}

fn prompt_year(dataset: &Dataset) -> Result<i32, dialoguer::Error> {
    let mut input = Input::new().with_prompt("Year");
    if let Some((first, last)) = dataset.year_range() {
        input = input
            .with_prompt(format!("Year ({first}-{last})"))
            .default(last);
    }
    input.interact_text()
}

fn prompt_match_mode() -> Result<MatchMode, dialoguer::Error> {
    let idx = Select::new()
        .with_prompt("Label matching")
        .items(&["Substring (historical figures)", "Exact"])
        .default(0)
        .interact()?;
    Ok(if idx == 0 {
        MatchMode::Substring
    } else {
        MatchMode::Exact
    })
}
