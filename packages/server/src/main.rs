#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for the crime route map.
//!
//! Reads configuration from `CRIME_ROUTE_CONFIG` (or the built-in
//! default) and serves the `/api` routes.

use crime_route_pipeline::AppConfig;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    pretty_env_logger::init_custom_env("RUST_LOG");

    let config = AppConfig::load(None).map_err(std::io::Error::other)?;
    crime_route_server::run_server(config).await
}
