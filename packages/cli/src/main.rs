#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line runner for the urban context vulnerability index.
//!
//! `urban_index run <config>` loads every layer named by a TOML run file,
//! scores all parcels and writes the scored `GeoJSON` (plus an optional
//! JSON summary). `urban_index validate <config>` only loads and checks the
//! layers.
//!
//! Uses `indicatif-log-bridge` (via [`urban_index_cli_utils::init_logger`])
//! so that log lines and progress bars never fight for the terminal.

mod config;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use urban_index_cli_utils::{IndicatifProgress, MultiProgress};
use urban_index_io::LAYER_COUNT;
use urban_index_models::{IndexConfig, MissingNoisePolicy, RunReport};
use urban_index_scoring::ScoringOptions;

#[derive(Parser)]
#[command(name = "urban_index", about = "Urban context vulnerability index")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score every parcel and write the result
    Run {
        /// TOML run file
        config: PathBuf,

        /// Override the scored `GeoJSON` destination
        #[arg(long)]
        output: Option<PathBuf>,

        /// Override the JSON summary destination
        #[arg(long)]
        summary: Option<PathBuf>,

        /// Contribution of parcels without a noise band (`zero` or `worst`)
        #[arg(long)]
        missing_policy: Option<MissingNoisePolicy>,
    },
    /// Load and validate every layer without scoring
    Validate {
        /// TOML run file
        config: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = urban_index_cli_utils::init_logger();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            output,
            summary,
            missing_policy,
        } => {
            let config =
                config::apply_overrides(config::load(&config)?, output, summary, missing_policy);
            run(&config, &multi)?;
        }
        Commands::Validate { config } => {
            let config = config::load(&config)?;
            validate(&config, &multi)?;
        }
    }

    Ok(())
}

/// Scores every parcel. Nothing is written unless scoring succeeds.
fn run(config: &IndexConfig, multi: &MultiProgress) -> Result<(), Box<dyn std::error::Error>> {
    let steps = IndicatifProgress::steps_bar(multi, "Loading layers", LAYER_COUNT as u64);
    let (inputs, features) = urban_index_io::load_inputs(config, steps.as_ref())?;

    let progress = IndicatifProgress::scoring_bar(multi, "Scoring parcels");
    let options = ScoringOptions {
        missing_noise_policy: config.noise.missing_policy,
    };
    let scored = urban_index_scoring::run(&inputs, options, progress.as_ref())?;

    urban_index_io::write_scored_parcels(&config.output, &features, &scored.parcels)?;
    if let Some(summary) = &config.summary {
        urban_index_io::write_report(summary, &scored.report)?;
    }

    log_report(&scored.report);

    Ok(())
}

/// Loads every layer and reports what was found.
fn validate(config: &IndexConfig, multi: &MultiProgress) -> Result<(), Box<dyn std::error::Error>> {
    let steps = IndicatifProgress::steps_bar(multi, "Validating layers", LAYER_COUNT as u64);
    let (inputs, _) = urban_index_io::load_inputs(config, steps.as_ref())?;

    log::info!("parcels: {} features", inputs.parcels.len());
    for criterion in urban_index_models::Criterion::ALL {
        log::info!("{criterion}: {} features", inputs.layers.get(criterion).len());
    }
    log::info!("noise: {} polygons", inputs.noise.len());
    log::info!("All {LAYER_COUNT} layers are valid");

    Ok(())
}

/// One line per non-fatal condition recorded in `report`.
fn warning_lines(report: &RunReport) -> Vec<String> {
    if !report.has_warnings() {
        return Vec::new();
    }

    let mut lines: Vec<String> = report
        .degenerate_distributions
        .iter()
        .map(|degenerate| {
            let unreachable: Vec<String> = degenerate
                .unreachable_ranks
                .iter()
                .map(|rank| rank.value().to_string())
                .collect();
            format!(
                "{}: only {} distinct distances; unreachable ranks [{}]",
                degenerate.criterion,
                degenerate.distinct_values,
                unreachable.join(", ")
            )
        })
        .collect();

    if report.missing_noise > 0 {
        lines.push(format!(
            "{} parcels outside every noise polygon ({} policy)",
            report.missing_noise, report.missing_noise_policy
        ));
    }
    if report.out_of_range_decibels > 0 {
        lines.push(format!(
            "{} parcels with unbandable decibel readings",
            report.out_of_range_decibels
        ));
    }

    lines
}

fn log_report(report: &RunReport) {
    for line in warning_lines(report) {
        log::warn!("{line}");
    }

    let distribution: Vec<String> = report
        .index_distribution
        .iter()
        .map(|(index, count)| format!("{index}: {count}"))
        .collect();
    log::info!(
        "Index distribution over {} parcels: {}",
        report.parcel_count,
        distribution.join(", ")
    );
}
