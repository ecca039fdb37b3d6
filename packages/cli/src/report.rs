//! Terminal rendering and file output for pipeline results.

use std::path::Path;

use console::style;
use crime_route_dataset::Dataset;
use crime_route_geocoder::GeocodeOutcome;
use crime_route_map_models::{Notice, NoticeLevel};
use crime_route_pipeline::PipelineOutput;

/// Prints the values the filters accept.
pub fn print_filters(dataset: &Dataset) {
    println!("{}", style("Crime types").bold());
    for crime_type in dataset.crime_types() {
        println!("  {crime_type}");
    }
    println!("{}", style("Case statuses").bold());
    for status in dataset.case_statuses() {
        println!("  {status}");
    }
    if let Some(range) = dataset.date_bounds() {
        println!("{} {} to {}", style("Dates").bold(), range.start, range.end);
    }
}

/// Prints the summary panel, route, and any notice.
pub fn print_output(output: &PipelineOutput) {
    let payload = &output.payload;

    println!();
    println!(
        "{} {}",
        style("Total incidents:").bold(),
        payload.summary.total
    );
    for entry in &payload.summary.by_crime_type {
        println!("  {:<24} {}", entry.crime_type, entry.count);
    }

    println!();
    println!("Start:       {}", outcome_label(&output.start));
    println!("Destination: {}", outcome_label(&output.end));

    if let Some(route) = &payload.route {
        println!(
            "{} ({} points, {:.2} km walked)",
            style(&route.distance_label).green(),
            route.polyline.len(),
            route.path_length_km
        );
    }

    if let Some(notice) = &payload.notice {
        print_notice(notice);
    }
}

/// Prints a notice colored by severity.
pub fn print_notice(notice: &Notice) {
    match notice.level {
        NoticeLevel::Warning => println!("{}", style(&notice.message).yellow()),
        NoticeLevel::Error => println!("{}", style(&notice.message).red().bold()),
    }
}

/// One-line description of a geocoding outcome.
#[must_use]
pub fn outcome_label(outcome: &GeocodeOutcome) -> String {
    match outcome {
        GeocodeOutcome::Found { place } => {
            let at = format!(
                "{:.5}, {:.5}",
                place.coordinate.latitude, place.coordinate.longitude
            );
            place
                .display_name
                .as_deref()
                .map_or_else(|| at.clone(), |name| format!("{name} ({at})"))
        }
        GeocodeOutcome::NotFound => "not found".to_string(),
        GeocodeOutcome::Blank => "(none)".to_string(),
        GeocodeOutcome::ServiceError { detail } => format!("service unavailable: {detail}"),
    }
}

/// Writes the map payload as JSON and/or `GeoJSON`.
///
/// # Errors
///
/// Returns an error if serialization or a file write fails.
pub fn write_outputs(
    output: &PipelineOutput,
    json: Option<&Path>,
    geojson: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(path) = json {
        std::fs::write(path, serde_json::to_string_pretty(&output.payload)?)?;
        log::info!("Wrote map payload to {}", path.display());
    }
    if let Some(path) = geojson {
        let collection = crime_route_map::to_geojson(&output.payload);
        std::fs::write(path, serde_json::to_string_pretty(&collection)?)?;
        log::info!("Wrote GeoJSON to {}", path.display());
    }
    Ok(())
}
