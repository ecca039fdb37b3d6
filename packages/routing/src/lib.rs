#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Walking route resolution over `OpenStreetMap` street networks.
//!
//! [`RouteResolver::find_route`] picks an area around both endpoints,
//! loads its walking network from a [`StreetGraphProvider`] (or the
//! [`GraphCache`]), snaps the endpoints to the nearest street nodes and
//! runs A* on a blocking thread. The whole operation is bounded by a
//! timeout. Failures never escape as errors: they are reported inside
//! the returned [`RouteResult`].

mod cache;
mod graph;
pub mod overpass;
pub mod pbf;
pub mod walkable;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use crime_route_geography_models::{
    BoundingBox, Coordinate, RouteError, RouteResult, geodesic_distance_km,
};
use crime_route_http::{HttpError, RetryPolicy};
use serde::Deserialize;

pub use cache::GraphCache;
pub use graph::{GraphPath, SnappedNode, StreetGraph, StreetNetwork};
pub use overpass::OverpassProvider;
pub use pbf::OsmPbfProvider;

/// Errors raised while loading a street network.
#[derive(Debug, thiserror::Error)]
pub enum GraphFetchError {
    /// Overpass request failed.
    #[error(transparent)]
    Http(#[from] HttpError),

    /// HTTP client could not be constructed.
    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),

    /// PBF extract could not be read.
    #[error("PBF read failed for {path}: {message}")]
    Pbf {
        /// Extract path.
        path: String,
        /// Underlying failure.
        message: String,
    },

    /// Response could not be interpreted.
    #[error("Parse error: {message}")]
    Parse {
        /// What was wrong with the response.
        message: String,
    },
}

/// A source of walkable street networks.
#[async_trait]
pub trait StreetGraphProvider: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    /// Loads the walkable street network inside `area`.
    ///
    /// # Errors
    ///
    /// Returns [`GraphFetchError`] if the network cannot be obtained.
    async fn fetch(&self, area: BoundingBox) -> Result<StreetNetwork, GraphFetchError>;
}

/// Where street networks come from, tagged by `type` in TOML.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GraphSourceConfig {
    /// Remote Overpass API.
    Overpass {
        /// Interpreter URL.
        #[serde(default = "default_overpass_url")]
        base_url: String,
        /// Server-side query timeout.
        #[serde(default = "default_query_timeout_secs")]
        query_timeout_secs: u64,
        /// Retries after the first attempt on transient failures.
        #[serde(default = "default_max_retries")]
        max_retries: u32,
    },
    /// Local `.osm.pbf` extract.
    OsmPbf {
        /// Extract path.
        path: PathBuf,
    },
}

impl Default for GraphSourceConfig {
    fn default() -> Self {
        Self::Overpass {
            base_url: default_overpass_url(),
            query_timeout_secs: default_query_timeout_secs(),
            max_retries: default_max_retries(),
        }
    }
}

fn default_overpass_url() -> String {
    "https://overpass-api.de/api/interpreter".to_string()
}

const fn default_query_timeout_secs() -> u64 {
    25
}

const fn default_max_retries() -> u32 {
    2
}

/// Route resolver settings (`[routing]` in the application config).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// Street network source.
    pub provider: GraphSourceConfig,
    /// Padding around the endpoints' bounding box.
    pub padding_km: f64,
    /// Lattice the padded box is snapped to; also fixes the cache key.
    pub grid_degrees: f64,
    /// Maximum distance from an endpoint to its snapped street node.
    pub snap_radius_m: f64,
    /// Upper bound for fetch plus search.
    pub timeout_secs: u64,
    /// How long a fetched network is reused.
    pub cache_ttl_secs: u64,
    /// Maximum number of cached networks.
    pub cache_max_entries: usize,
    /// Drop street islands unreachable from the main network.
    pub retain_largest_component: bool,
    /// `User-Agent` sent to `OpenStreetMap` services.
    pub user_agent: String,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            provider: GraphSourceConfig::default(),
            padding_km: 1.0,
            grid_degrees: 0.02,
            snap_radius_m: 500.0,
            timeout_secs: 60,
            cache_ttl_secs: 3600,
            cache_max_entries: 16,
            retain_largest_component: true,
            user_agent: concat!("crime-route-map/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl RoutingConfig {
    /// Overall route timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Area whose street network serves a route between `start` and `end`.
    #[must_use]
    pub fn area_for(&self, start: Coordinate, end: Coordinate) -> BoundingBox {
        BoundingBox::spanning(start, end)
            .padded(self.padding_km)
            .snapped(self.grid_degrees)
    }
}

/// Resolves walking routes between coordinates.
pub struct RouteResolver {
    provider: Arc<dyn StreetGraphProvider>,
    cache: GraphCache,
    config: RoutingConfig,
}

impl RouteResolver {
    /// Creates a resolver over an explicit provider.
    #[must_use]
    pub fn new(provider: Arc<dyn StreetGraphProvider>, config: RoutingConfig) -> Self {
        let cache = GraphCache::new(
            Duration::from_secs(config.cache_ttl_secs),
            config.cache_max_entries,
        );
        Self {
            provider,
            cache,
            config,
        }
    }

    /// Creates a resolver with the provider named in `config`.
    ///
    /// # Errors
    ///
    /// Returns [`GraphFetchError::Client`] if the HTTP client cannot be
    /// built.
    pub fn from_config(config: RoutingConfig) -> Result<Self, GraphFetchError> {
        let provider: Arc<dyn StreetGraphProvider> = match &config.provider {
            GraphSourceConfig::Overpass {
                base_url,
                query_timeout_secs,
                max_retries,
            } => {
                let query_timeout = Duration::from_secs(*query_timeout_secs);
                let client = reqwest::Client::builder()
                    .user_agent(&config.user_agent)
                    .timeout(query_timeout + Duration::from_secs(5))
                    .build()?;
                Arc::new(
                    OverpassProvider::new(client, base_url)
                        .with_query_timeout(query_timeout)
                        .with_retry_policy(RetryPolicy {
                            max_retries: *max_retries,
                            ..RetryPolicy::default()
                        }),
                )
            }
            GraphSourceConfig::OsmPbf { path } => Arc::new(OsmPbfProvider::new(path.clone())),
        };

        log::info!("Route resolver using {} street networks", provider.name());
        Ok(Self::new(provider, config))
    }

    /// Active settings.
    #[must_use]
    pub const fn config(&self) -> &RoutingConfig {
        &self.config
    }

    /// Cached street networks.
    #[must_use]
    pub const fn cache(&self) -> &GraphCache {
        &self.cache
    }

    /// Finds the shortest walking path from `start` to `end`.
    ///
    /// `distance_km` in the result is always the straight-line geodesic
    /// distance between the inputs, whether or not a path was found.
    pub async fn find_route(&self, start: Coordinate, end: Coordinate) -> RouteResult {
        if start == end {
            return RouteResult::found(vec![start], 0.0, 0.0);
        }

        let distance_km = geodesic_distance_km(start, end);

        match tokio::time::timeout(self.config.timeout(), self.resolve(start, end)).await {
            Ok(Ok(path)) => {
                log::info!(
                    "Route found: {} points, {:.2} km walked, {distance_km:.2} km direct",
                    path.coordinates.len(),
                    path.length_m / 1000.0
                );
                RouteResult::found(path.coordinates, distance_km, path.length_m / 1000.0)
            }
            Ok(Err(e)) => {
                log::warn!("Route failed: {e}");
                RouteResult::failed(distance_km, e)
            }
            Err(_) => {
                log::warn!(
                    "Route timed out after {}s",
                    self.config.timeout().as_secs()
                );
                RouteResult::failed(distance_km, RouteError::Timeout)
            }
        }
    }

    async fn resolve(&self, start: Coordinate, end: Coordinate) -> Result<GraphPath, RouteError> {
        let area = self.config.area_for(start, end);
        let graph = self.graph_for(area).await?;
        let snap_radius_m = self.config.snap_radius_m;

        tokio::task::spawn_blocking(move || graph.route(start, end, snap_radius_m))
            .await
            .map_err(|e| RouteError::GraphFetch {
                message: format!("route search task failed: {e}"),
            })?
    }

    /// Returns the street graph for `area`, fetching it on a cache miss.
    async fn graph_for(&self, area: BoundingBox) -> Result<Arc<StreetGraph>, RouteError> {
        let key = area.key();
        if let Some(graph) = self.cache.get(&key) {
            log::debug!("Street graph cache hit for {key}");
            return Ok(graph);
        }

        let network = self
            .provider
            .fetch(area)
            .await
            .map_err(|e| RouteError::GraphFetch {
                message: e.to_string(),
            })?;

        if network.is_empty() {
            return Err(RouteError::EmptyGraph);
        }

        let retain = self.config.retain_largest_component;
        let graph = tokio::task::spawn_blocking(move || StreetGraph::from_network(&network, retain))
            .await
            .map_err(|e| RouteError::GraphFetch {
                message: format!("graph build task failed: {e}"),
            })?;

        let graph = Arc::new(graph);
        self.cache.insert(key, Arc::clone(&graph));
        Ok(graph)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crime_route_geography_models::Endpoint;

    use super::*;
    use crate::graph::tests::{grid_coordinate, grid_network};

    /// Serves a fixed network and counts fetches.
    struct StaticProvider {
        network: StreetNetwork,
        fetches: AtomicUsize,
    }

    impl StaticProvider {
        fn grid() -> Self {
            Self {
                network: grid_network(6),
                fetches: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl StreetGraphProvider for StaticProvider {
        fn name(&self) -> &'static str {
            "static"
        }

        async fn fetch(&self, _area: BoundingBox) -> Result<StreetNetwork, GraphFetchError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            Ok(self.network.clone())
        }
    }

    struct FailingProvider;

    #[async_trait]
    impl StreetGraphProvider for FailingProvider {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn fetch(&self, _area: BoundingBox) -> Result<StreetNetwork, GraphFetchError> {
            Err(GraphFetchError::Parse {
                message: "Overpass unavailable".to_string(),
            })
        }
    }

    struct SlowProvider;

    #[async_trait]
    impl StreetGraphProvider for SlowProvider {
        fn name(&self) -> &'static str {
            "slow"
        }

        async fn fetch(&self, _area: BoundingBox) -> Result<StreetNetwork, GraphFetchError> {
            tokio::time::sleep(Duration::from_secs(600)).await;
            Ok(grid_network(2))
        }
    }

    fn resolver(provider: Arc<dyn StreetGraphProvider>) -> RouteResolver {
        RouteResolver::new(
            provider,
            RoutingConfig {
                snap_radius_m: 200.0,
                ..RoutingConfig::default()
            },
        )
    }

    #[tokio::test]
    async fn identical_endpoints_skip_fetch() {
        let provider = Arc::new(StaticProvider::grid());
        let resolver = resolver(provider.clone());
        let here = grid_coordinate(1, 1);

        let result = resolver.find_route(here, here).await;

        assert_eq!(result.path, vec![here]);
        assert!(result.distance_km.abs() < f64::EPSILON);
        assert!(result.path_length_km.abs() < f64::EPSILON);
        assert!(result.error.is_none());
        assert_eq!(provider.fetches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn finds_route_across_grid() {
        let resolver = resolver(Arc::new(StaticProvider::grid()));
        let start = grid_coordinate(0, 0);
        let end = grid_coordinate(3, 4);

        let result = resolver.find_route(start, end).await;

        assert!(result.error.is_none(), "{:?}", result.error);
        assert_eq!(result.path.first(), Some(&start));
        assert_eq!(result.path.last(), Some(&end));
        assert!(result.distance_km > 5.0);
        assert!(result.path_length_km >= result.distance_km);
    }

    #[tokio::test]
    async fn reuses_cached_graph_for_nearby_routes() {
        let provider = Arc::new(StaticProvider::grid());
        let resolver = resolver(provider.clone());

        resolver
            .find_route(grid_coordinate(0, 0), grid_coordinate(2, 2))
            .await;
        resolver
            .find_route(grid_coordinate(2, 2), grid_coordinate(0, 0))
            .await;

        assert_eq!(provider.fetches.load(Ordering::SeqCst), 1);
        assert_eq!(resolver.cache().len(), 1);
    }

    #[tokio::test]
    async fn fetch_failure_is_reported_in_result() {
        let resolver = resolver(Arc::new(FailingProvider));
        let start = grid_coordinate(0, 0);
        let end = grid_coordinate(1, 1);

        let result = resolver.find_route(start, end).await;

        assert!(result.path.is_empty());
        assert!(result.distance_km > 0.0);
        assert!(matches!(
            result.error,
            Some(RouteError::GraphFetch { ref message }) if message.contains("Overpass unavailable")
        ));
    }

    #[tokio::test]
    async fn endpoint_off_the_network_is_reported() {
        let resolver = resolver(Arc::new(StaticProvider::grid()));
        let result = resolver
            .find_route(grid_coordinate(0, 0), Coordinate::new(13.2, 80.2))
            .await;

        assert!(matches!(
            result.error,
            Some(RouteError::NoNearbyNode {
                endpoint: Endpoint::End,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn unreachable_destination_yields_empty_path() {
        let mut network = grid_network(3);
        network.nodes.insert(90_001, Coordinate::new(13.10, 80.30));
        network.nodes.insert(90_002, Coordinate::new(13.101, 80.30));
        network.ways.push(vec![90_001, 90_002]);
        let provider = StaticProvider {
            network,
            fetches: AtomicUsize::new(0),
        };
        let resolver = RouteResolver::new(
            Arc::new(provider),
            RoutingConfig {
                snap_radius_m: 200.0,
                retain_largest_component: false,
                ..RoutingConfig::default()
            },
        );

        let result = resolver
            .find_route(grid_coordinate(0, 0), Coordinate::new(13.10, 80.30))
            .await;

        assert!(result.path.is_empty());
        assert_eq!(result.error, Some(RouteError::NoPath));
        assert!(result.distance_km > 0.0);
    }

    #[tokio::test]
    async fn empty_network_is_reported() {
        let provider = Arc::new(StaticProvider {
            network: StreetNetwork::default(),
            fetches: AtomicUsize::new(0),
        });
        let result = resolver(provider)
            .find_route(grid_coordinate(0, 0), grid_coordinate(1, 1))
            .await;
        assert_eq!(result.error, Some(RouteError::EmptyGraph));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_fetch_times_out() {
        let resolver = resolver(Arc::new(SlowProvider));
        let start = grid_coordinate(0, 0);
        let end = grid_coordinate(1, 1);

        let result = resolver.find_route(start, end).await;

        assert_eq!(result.error, Some(RouteError::Timeout));
        assert_eq!(
            result.error.map(|e| e.to_string()).as_deref(),
            Some("timeout")
        );
        assert!(result.path.is_empty());
        assert!(result.distance_km > 0.0);
    }

    #[test]
    fn area_is_padded_and_snapped() {
        let config = RoutingConfig::default();
        let start = Coordinate::new(13.0418, 80.2341);
        let end = Coordinate::new(13.0067, 80.2206);
        let area = config.area_for(start, end);

        assert!(area.contains(start));
        assert!(area.contains(end));
        assert!(area.south <= 13.0067 - 0.009);
        assert_eq!(area, config.area_for(end, start));
    }

    #[test]
    fn parses_routing_config() {
        let config: RoutingConfig = toml::from_str(
            r#"
            snap_radius_m = 250.0
            timeout_secs = 20

            [provider]
            type = "osm_pbf"
            path = "data/chennai.osm.pbf"
            "#,
        )
        .unwrap();

        assert_eq!(
            config.provider,
            GraphSourceConfig::OsmPbf {
                path: PathBuf::from("data/chennai.osm.pbf")
            }
        );
        assert!((config.snap_radius_m - 250.0).abs() < f64::EPSILON);
        assert_eq!(config.timeout(), Duration::from_secs(20));
        assert_eq!(config.cache_max_entries, 16);
    }
}
