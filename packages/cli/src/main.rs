#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line front end for the crime route map.
//!
//! Each subcommand is one pipeline interaction. Without a subcommand the
//! tool drops into an interactive menu built on `dialoguer`.
//!
//! Uses `indicatif-log-bridge` (via [`logger::init_logger`]) to route
//! `log` output through `indicatif::MultiProgress` so that log lines and
//! progress bars never fight for the terminal.

mod interactive;
mod logger;
mod progress;
mod report;

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use crime_route_pipeline::{AppConfig, MapRequest, Pipeline};

use crate::progress::IndicatifProgress;

#[derive(Parser)]
#[command(name = "crime_route_cli", about = "Crime incident map and walking routes")]
struct Cli {
    /// Config file (defaults to `CRIME_ROUTE_CONFIG`, then the built-in
    /// config)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Filter incidents, optionally route between two places, and write
    /// the map
    Map {
        /// Crime types to include (comma-separated or repeated). Defaults
        /// to all.
        #[arg(long = "crime-type", value_delimiter = ',')]
        crime_types: Option<Vec<String>>,
        /// Case statuses to include (comma-separated or repeated).
        /// Defaults to all.
        #[arg(long = "status", value_delimiter = ',')]
        statuses: Option<Vec<String>>,
        /// First included day (YYYY-MM-DD)
        #[arg(long)]
        from: Option<NaiveDate>,
        /// Last included day (YYYY-MM-DD)
        #[arg(long)]
        to: Option<NaiveDate>,
        /// Start location
        #[arg(long, default_value = "")]
        start: String,
        /// Destination
        #[arg(long, default_value = "")]
        end: String,
        /// Write the map payload as JSON
        #[arg(long)]
        output: Option<PathBuf>,
        /// Write the map as a `GeoJSON` feature collection
        #[arg(long)]
        geojson: Option<PathBuf>,
    },
    /// List the crime types, case statuses, and date range in the dataset
    Filters,
    /// Resolve a place name to coordinates
    Geocode {
        /// Free-text place
        text: String,
    },
    /// Start the API server
    Serve,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = logger::init_logger();
    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref())?;

    let Some(command) = cli.command else {
        return interactive::run(config, &multi).await;
    };

    match command {
        Commands::Map {
            crime_types,
            statuses,
            from,
            to,
            start,
            end,
            output,
            geojson,
        } => {
            let dataset = config.load_dataset()?;
            let pipeline = Pipeline::from_config(&config)?;
            let request = MapRequest {
                crime_types: crime_types.map(|v| v.into_iter().collect()),
                case_statuses: statuses.map(|v| v.into_iter().collect()),
                from,
                to,
                start,
                end,
            };

            let progress = IndicatifProgress::steps_bar(&multi, "Building map");
            let result = pipeline
                .run_with_progress(&dataset, &request, &progress)
                .await;

            report::print_output(&result);
            report::write_outputs(&result, output.as_deref(), geojson.as_deref())?;
        }
        Commands::Filters => {
            let dataset = config.load_dataset()?;
            report::print_filters(&dataset);
        }
        Commands::Geocode { text } => {
            let pipeline = Pipeline::from_config(&config)?;
            let outcome = pipeline.geocoder().resolve(&text).await;
            println!("{}", report::outcome_label(&outcome));
        }
        Commands::Serve => serve(config).await?,
    }

    Ok(())
}

/// Runs the API server to completion.
///
/// The server uses actix-web's runtime, so it runs in a blocking task to
/// avoid nesting tokio runtimes.
async fn serve(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    tokio::task::spawn_blocking(|| {
        actix_web::rt::System::new().block_on(crime_route_server::run_server(config))
    })
    .await??;
    Ok(())
}
