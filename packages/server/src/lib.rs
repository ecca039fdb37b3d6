#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for the crime route map.
//!
//! The incident table is loaded once at startup and shared read-only
//! across workers. Every `/api/map` request is one full pipeline run.

mod handlers;
pub mod interactive;

use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware, web};
use crime_route_dataset::Dataset;
use crime_route_pipeline::{AppConfig, Pipeline};

/// Shared application state.
pub struct AppState {
    /// Immutable incident table.
    pub dataset: Arc<Dataset>,
    /// Geocoder, route resolver, and map settings.
    pub pipeline: Arc<Pipeline>,
}

/// Registers the `/api` routes.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/health", web::get().to(handlers::health))
            .route("/filters", web::get().to(handlers::filters))
            .route("/map", web::get().to(handlers::map))
            .route("/geocode", web::get().to(handlers::geocode))
            .route("/route", web::get().to(handlers::route)),
    );
}

/// Where the server listens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindAddress {
    /// Interface to bind.
    pub host: String,
    /// TCP port.
    pub port: u16,
}

impl Default for BindAddress {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

impl BindAddress {
    /// Reads `BIND_ADDR` and `PORT`, falling back to `127.0.0.1:8080`.
    /// An unparseable port falls back as well.
    #[must_use]
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            host: std::env::var("BIND_ADDR").unwrap_or(default.host),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(default.port),
        }
    }
}

/// Starts the API server on the address from the environment.
///
/// See [`serve`].
///
/// # Errors
///
/// Returns an `std::io::Result` error if the dataset cannot be loaded,
/// the pipeline cannot be built, or the HTTP server fails to bind.
#[allow(clippy::future_not_send)]
pub async fn run_server(config: AppConfig) -> std::io::Result<()> {
    serve(config, BindAddress::from_env()).await
}

/// Loads the dataset, builds the pipeline from `config`, and serves the
/// API on `address`. This is a regular async function; the caller
/// provides the runtime (e.g. via `#[actix_web::main]`).
///
/// # Errors
///
/// Returns an `std::io::Result` error if the dataset cannot be loaded,
/// the pipeline cannot be built, or the HTTP server fails to bind.
#[allow(clippy::future_not_send)]
pub async fn serve(config: AppConfig, address: BindAddress) -> std::io::Result<()> {
    let dataset = config.load_dataset().map_err(std::io::Error::other)?;
    let pipeline = Pipeline::from_config(&config).map_err(std::io::Error::other)?;

    let state = web::Data::new(AppState {
        dataset: Arc::new(dataset),
        pipeline: Arc::new(pipeline),
    });

    log::info!("Starting server on {}:{}", address.host, address.port);

    HttpServer::new(move || {
        App::new()
            .wrap(Cors::permissive())
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure)
    })
    .bind((address.host, address.port))?
    .run()
    .await
}
