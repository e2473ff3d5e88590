#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for the NYPD shooting incident report.

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use nypd_shootings_analytics::{aggregate_ordered, exclude_sentinels};
use nypd_shootings_analytics_models::{BucketOrder, GroupField, Metric};
use nypd_shootings_clean::clean;
use nypd_shootings_cli_utils::{StageBar, init_logger};
use nypd_shootings_config::ReportConfig;
use nypd_shootings_report::render::{render_buckets, render_cleaning, render_model, render_report};
use nypd_shootings_report::{ReportError, run_report, train_model, write_cleaned, write_json};
use nypd_shootings_source::load_raw;

#[derive(Parser)]
#[command(
    name = "nypd_shootings",
    about = "Descriptive report and murder classifier for NYPD shooting incident data"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct InputArgs {
    /// Shooting incident CSV file
    #[arg(long)]
    input: PathBuf,
    /// TOML configuration file (defaults apply when omitted)
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Args)]
struct ModelArgs {
    /// Seed for the train/test split (overrides the config file)
    #[arg(long)]
    seed: Option<u64>,
    /// Share of each class used for training (overrides the config file)
    #[arg(long)]
    train_fraction: Option<f64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full report and print it
    Report {
        #[command(flatten)]
        input: InputArgs,
        #[command(flatten)]
        model: ModelArgs,
        /// Also write the report as JSON to this path
        #[arg(long)]
        json: Option<PathBuf>,
    },
    /// Clean the input and write the surviving incidents as CSV
    Clean {
        #[command(flatten)]
        input: InputArgs,
        /// Destination CSV file
        #[arg(long)]
        output: PathBuf,
    },
    /// Print one aggregation table
    Aggregate {
        #[command(flatten)]
        input: InputArgs,
        /// Field to group by (e.g. `borough`, `victim_race`, `time_of_day`)
        #[arg(long)]
        by: GroupField,
        /// Include each group's share of the total
        #[arg(long)]
        percent: bool,
        /// Leave out the sentinel categories configured for the field
        #[arg(long)]
        exclude_sentinels: bool,
        /// Order groups by the field's own order instead of by count
        #[arg(long)]
        natural_order: bool,
    },
    /// Split, fit and evaluate the murder classifier
    Train {
        #[command(flatten)]
        input: InputArgs,
        #[command(flatten)]
        model: ModelArgs,
    },
}

fn load_config(path: Option<&Path>, model: Option<&ModelArgs>) -> Result<ReportConfig, ReportError> {
    let mut config = ReportConfig::load_or_default(path)?;
    if let Some(model) = model {
        if let Some(seed) = model.seed {
            config.model.seed = seed;
        }
        if let Some(fraction) = model.train_fraction {
            config.model.train_fraction = fraction;
        }
        config.validate()?;
    }
    Ok(config)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = init_logger();
    let cli = Cli::parse();

    match cli.command {
        Commands::Report { input, model, json } => {
            let config = load_config(input.config.as_deref(), Some(&model))?;
            let table = load_raw(&input.input)?;

            let progress = StageBar::new(&multi);
            let report = run_report(&table, &config, progress.as_ref())?;

            print!("{}", render_report(&report, config.analysis.top_hexbins));
            if let Some(path) = json {
                write_json(&path, &report)?;
            }
        }
        Commands::Clean { input, output } => {
            let config = load_config(input.config.as_deref(), None)?;
            let table = load_raw(&input.input)?;
            let outcome = clean(&table, &config.cleaning)?;

            print!("{}", render_cleaning(&outcome.summary()));
            write_cleaned(&output, &outcome.incidents)?;
        }
        Commands::Aggregate {
            input,
            by,
            percent,
            exclude_sentinels: exclude,
            natural_order,
        } => {
            let config = load_config(input.config.as_deref(), None)?;
            let table = load_raw(&input.input)?;
            let outcome = clean(&table, &config.cleaning)?;

            let sentinels = if exclude {
                config.analysis.sentinels_for(by)
            } else {
                Vec::new()
            };
            let records = exclude_sentinels(&outcome.incidents, by, &sentinels);
            let metric = if percent {
                Metric::Percentage
            } else {
                Metric::Count
            };
            let order = if natural_order {
                BucketOrder::Natural
            } else {
                BucketOrder::CountDesc
            };

            let buckets = aggregate_ordered(records, by, metric, order);
            print!("{}", render_buckets(by.label(), &buckets));
        }
        Commands::Train { input, model } => {
            let config = load_config(input.config.as_deref(), Some(&model))?;
            let table = load_raw(&input.input)?;
            let outcome = clean(&table, &config.cleaning)?;

            let section = train_model(&outcome.incidents, &outcome.domains, &config.model)?;
            print!("{}", render_model(&section));
        }
    }

    Ok(())
}
