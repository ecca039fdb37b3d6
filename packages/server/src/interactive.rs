//! Prompts for the dataset and listen address, then serves.

use std::path::PathBuf;

use crime_route_pipeline::AppConfig;
use dialoguer::{Confirm, Input};

use crate::BindAddress;

/// Asks for a dataset path and listen address, confirms, and hands off
/// to [`crate::serve`]. Defaults come from `config` and the environment.
///
/// # Errors
///
/// Returns an `std::io::Result` error if a prompt fails or the server
/// fails to start.
#[allow(clippy::future_not_send)]
pub async fn run(mut config: AppConfig) -> std::io::Result<()> {
    println!("Crime Route Server");
    println!();

    let dataset: String = Input::new()
        .with_prompt("Dataset CSV")
        .default(config.dataset.path.display().to_string())
        .interact_text()
        .map_err(std::io::Error::other)?;
    config.dataset.path = PathBuf::from(dataset);

    let defaults = BindAddress::from_env();
    let host: String = Input::new()
        .with_prompt("Listen on host")
        .default(defaults.host)
        .interact_text()
        .map_err(std::io::Error::other)?;
    let port: u16 = Input::new()
        .with_prompt("Port")
        .default(defaults.port)
        .interact_text()
        .map_err(std::io::Error::other)?;
    let address = BindAddress { host, port };

    let confirmed = Confirm::new()
        .with_prompt(format!(
            "Serve {} on {}:{}?",
            config.dataset.path.display(),
            address.host,
            address.port
        ))
        .default(true)
        .interact()
        .map_err(std::io::Error::other)?;
    if !confirmed {
        println!("Cancelled.");
        return Ok(());
    }

    crate::serve(config, address).await
}
