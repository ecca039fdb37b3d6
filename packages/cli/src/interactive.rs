//! Interactive menu: the controls of the map page as terminal prompts.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use crime_route_dataset::Dataset;
use crime_route_pipeline::{AppConfig, MapRequest, Pipeline};
use dialoguer::{Confirm, Input, MultiSelect, Select};
use indicatif::MultiProgress;

use crate::progress::IndicatifProgress;
use crate::report;

/// Top-level actions in the interactive menu.
enum Action {
    BuildMap,
    ListFilters,
    Geocode,
    StartServer,
    Quit,
}

impl Action {
    const ALL: &[Self] = &[
        Self::BuildMap,
        Self::ListFilters,
        Self::Geocode,
        Self::StartServer,
        Self::Quit,
    ];

    #[must_use]
    const fn label(&self) -> &'static str {
        match self {
            Self::BuildMap => "Build map",
            Self::ListFilters => "List filter values",
            Self::Geocode => "Look up a place",
            Self::StartServer => "Start server",
            Self::Quit => "Quit",
        }
    }
}

/// Runs the interactive menu until the user quits or starts the server.
///
/// # Errors
///
/// Returns an error if the dataset cannot be loaded, the pipeline cannot
/// be built, a prompt fails, or output cannot be written.
pub async fn run(config: AppConfig, multi: &MultiProgress) -> Result<(), Box<dyn std::error::Error>> {
    println!("Crime Route Map");
    println!();

    let dataset = config.load_dataset()?;
    let pipeline = Pipeline::from_config(&config)?;
    let labels: Vec<&str> = Action::ALL.iter().map(Action::label).collect();

    loop {
        let idx = Select::new()
            .with_prompt("What would you like to do?")
            .items(&labels)
            .default(0)
            .interact()?;

        match Action::ALL[idx] {
            Action::BuildMap => build_map(&dataset, &pipeline, multi).await?,
            Action::ListFilters => report::print_filters(&dataset),
            Action::Geocode => {
                let text: String = Input::new().with_prompt("Place").interact_text()?;
                let outcome = pipeline.geocoder().resolve(&text).await;
                println!("{}", report::outcome_label(&outcome));
            }
            Action::StartServer => {
                tokio::task::spawn_blocking(|| {
                    actix_web::rt::System::new()
                        .block_on(crime_route_server::interactive::run(config))
                })
                .await??;
                return Ok(());
            }
            Action::Quit => return Ok(()),
        }
        println!();
    }
}

async fn build_map(
    dataset: &Dataset,
    pipeline: &Pipeline,
    multi: &MultiProgress,
) -> Result<(), Box<dyn std::error::Error>> {
    let crime_types = prompt_values("Crime types", &dataset.crime_types())?;
    let case_statuses = prompt_values("Case statuses", &dataset.case_statuses())?;

    let bounds = dataset.date_bounds();
    let from = prompt_date("From date", bounds.map(|b| b.start))?;
    let to = prompt_date("To date", bounds.map(|b| b.end))?;

    let start: String = Input::new()
        .with_prompt("Start location (empty to skip routing)")
        .allow_empty(true)
        .interact_text()?;
    let end: String = Input::new()
        .with_prompt("Destination (empty to skip routing)")
        .allow_empty(true)
        .interact_text()?;

    let request = MapRequest {
        crime_types: Some(crime_types),
        case_statuses: Some(case_statuses),
        from,
        to,
        start,
        end,
    };

    let progress = IndicatifProgress::steps_bar(multi, "Building map");
    let output = pipeline
        .run_with_progress(dataset, &request, &progress)
        .await;
    report::print_output(&output);

    if Confirm::new()
        .with_prompt("Save the map?")
        .default(false)
        .interact()?
    {
        let json: String = Input::new()
            .with_prompt("JSON output path")
            .default("crime_map.json".to_string())
            .interact_text()?;
        let geojson: String = Input::new()
            .with_prompt("GeoJSON output path (empty to skip)")
            .allow_empty(true)
            .interact_text()?;
        let geojson = (!geojson.trim().is_empty()).then(|| PathBuf::from(geojson.trim()));
        report::write_outputs(&output, Some(Path::new(json.trim())), geojson.as_deref())?;
    }

    Ok(())
}

/// Multi-select over `values`, all selected by default.
fn prompt_values(
    prompt: &str,
    values: &[&str],
) -> Result<BTreeSet<String>, Box<dyn std::error::Error>> {
    let defaults = vec![true; values.len()];
    let selected = MultiSelect::new()
        .with_prompt(format!("{prompt} (space=toggle, a=all, enter=confirm)"))
        .items(values)
        .defaults(&defaults)
        .max_length(20)
        .interact()?;

    Ok(selected.into_iter().map(|i| values[i].to_string()).collect())
}

fn prompt_date(
    prompt: &str,
    default: Option<NaiveDate>,
) -> Result<Option<NaiveDate>, Box<dyn std::error::Error>> {
    let mut input = Input::<String>::new()
        .with_prompt(format!("{prompt} (YYYY-MM-DD)"))
        .allow_empty(true)
        .validate_with(|s: &String| -> Result<(), String> {
            if s.trim().is_empty() || s.trim().parse::<NaiveDate>().is_ok() {
                Ok(())
            } else {
                Err("expected YYYY-MM-DD".to_string())
            }
        });
    if let Some(date) = default {
        input = input.default(date.to_string());
    }
    let text = input.interact_text()?;

    Ok(if text.trim().is_empty() {
        None
    } else {
        Some(text.trim().parse()?)
    })
}
