//! Interactive mode for the server.
//!
//! Prompts for the dataset location, sample fraction, bind address and
//! port, loads the snapshot, then starts the server.

use std::path::PathBuf;
use std::sync::Arc;

use dialoguer::{Confirm, Input};
use nypd_arrests_dataset::progress::ProgressCallback;
use nypd_arrests_dataset::{DatasetError, LoadOptions, load_csv, paths};

use crate::{DEFAULT_BIND_ADDR, DEFAULT_PORT, ServerConfig, ServerError};

/// Runs the server in interactive mode, prompting for configuration.
///
/// Prompt defaults come from the same environment variables the
/// non-interactive server reads. Load progress is reported to `progress`.
///
/// # Errors
///
/// Returns [`ServerError`] if the dataset fails to load or the server
/// fails to start.
#[allow(clippy::future_not_send)]
pub async fn run(progress: Arc<dyn ProgressCallback>) -> Result<(), ServerError> {
    println!("NYPD Arrests Server");
    println!();

    let env_config = ServerConfig::from_env();
    let default_csv = paths::csv_path().display().to_string();

    let csv: String = Input::new()
        .with_prompt("Arrests CSV")
        .default(default_csv.clone())
        .interact_text()
        .unwrap_or(default_csv);

    let default_sample = sample_default(paths::sample_fraction());
    let mut sample_input = Input::<String>::new()
        .with_prompt("Sample fraction (empty = all rows)")
        .allow_empty(true);
    if !default_sample.is_empty() {
        sample_input = sample_input.default(default_sample.clone());
    }
    let sample_str = sample_input.interact_text().unwrap_or(default_sample);

    let bind_addr: String = Input::new()
        .with_prompt("Bind address")
        .default(env_config.bind_addr.clone())
        .interact_text()
        .unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());

    let port_str: String = Input::new()
        .with_prompt("Port")
        .default(env_config.port.to_string())
        .interact_text()
        .unwrap_or_else(|_| DEFAULT_PORT.to_string());

    let port = port_str.trim().parse().unwrap_or_else(|_| {
        log::warn!("Invalid port '{port_str}', using {DEFAULT_PORT}");
        DEFAULT_PORT
    });

    let sample_fraction = parse_sample(&sample_str);

    if !Confirm::new()
        .with_prompt(format!("Start server on {bind_addr}:{port}?"))
        .default(true)
        .interact()
        .unwrap_or(true)
    {
        println!("Cancelled.");
        return Ok(());
    }

    let options = LoadOptions {
        sample_fraction,
        ..LoadOptions::default()
    };
    let (dataset, _report) = load_csv(&PathBuf::from(csv), &options, &progress)?;

    super::serve(dataset, ServerConfig { bind_addr, port }).await
}

/// Prompt default for the sample fraction, taken from `NYPD_ARRESTS_SAMPLE`.
fn sample_default(setting: Result<Option<f64>, DatasetError>) -> String {
    match setting {
        Ok(fraction) => fraction.map(|f| f.to_string()).unwrap_or_default(),
        Err(e) => {
            log::warn!("{e}; not sampling by default");
            String::new()
        }
    }
}

fn parse_sample(input: &str) -> Option<f64> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }
    input.parse().map_or_else(
        |_| {
            log::warn!("Invalid sample fraction '{input}', loading all rows");
            None
        },
        Some,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_prompt_defaults_to_the_environment_setting() {
        assert_eq!(sample_default(Ok(Some(0.25))), "0.25");
        assert_eq!(sample_default(Ok(None)), "");

        let invalid = DatasetError::InvalidSampleSetting {
            variable: paths::SAMPLE_ENV,
            value: "half".to_string(),
        };
        assert_eq!(sample_default(Err(invalid)), "");
    }

    #[test]
    fn parses_sample_input() {
        assert_eq!(parse_sample(" 0.5 "), Some(0.5));
        assert_eq!(parse_sample(""), None);
        assert_eq!(parse_sample("most"), None);
        assert_eq!(parse_sample(&sample_default(Ok(Some(0.1)))), Some(0.1));
    }
}
