//! Overpass API street network provider.
//!
//! Downloads the walkable ways inside a bounding box together with their
//! nodes, using the same tag filter the local extract reader applies.
//!
//! See <https://wiki.openstreetmap.org/wiki/Overpass_API>

use std::time::Duration;

use async_trait::async_trait;
use crime_route_geography_models::{BoundingBox, Coordinate};
use crime_route_http::RetryPolicy;

use crate::walkable::{is_walkable, overpass_filter};
use crate::{GraphFetchError, StreetGraphProvider, StreetNetwork};

/// Street network provider backed by an Overpass interpreter endpoint.
pub struct OverpassProvider {
    client: reqwest::Client,
    base_url: String,
    query_timeout: Duration,
    policy: RetryPolicy,
}

impl OverpassProvider {
    /// Creates a provider for the given interpreter URL.
    #[must_use]
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.to_string(),
            query_timeout: Duration::from_secs(25),
            policy: RetryPolicy::default(),
        }
    }

    /// Sets the server-side query timeout.
    #[must_use]
    pub const fn with_query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout = timeout;
        self
    }

    /// Sets the retry budget.
    #[must_use]
    pub const fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }
}

#[async_trait]
impl StreetGraphProvider for OverpassProvider {
    fn name(&self) -> &'static str {
        "overpass"
    }

    async fn fetch(&self, area: BoundingBox) -> Result<StreetNetwork, GraphFetchError> {
        let query = build_query(area, self.query_timeout);
        log::info!("Fetching walking network from Overpass for {}", area.key());

        let body = crime_route_http::send_json(&self.policy, || {
            self.client
                .post(&self.base_url)
                .form(&[("data", query.as_str())])
        })
        .await?;

        let network = parse_response(&body)?;
        log::info!(
            "Overpass returned {} walkable ways over {} nodes",
            network.ways.len(),
            network.nodes.len()
        );
        Ok(network)
    }
}

/// Builds the Overpass QL query for the walkable ways in `area`.
fn build_query(area: BoundingBox, timeout: Duration) -> String {
    format!(
        "[out:json][timeout:{timeout}];\
         way{filter}({south},{west},{north},{east});\
         (._;>;);\
         out body qt;",
        timeout = timeout.as_secs(),
        filter = overpass_filter(),
        south = area.south,
        west = area.west,
        north = area.north,
        east = area.east,
    )
}

/// Parses an Overpass JSON response into raw street data.
fn parse_response(body: &serde_json::Value) -> Result<StreetNetwork, GraphFetchError> {
    let elements = body["elements"]
        .as_array()
        .ok_or_else(|| GraphFetchError::Parse {
            message: "Overpass response has no elements array".to_string(),
        })?;

    let mut network = StreetNetwork::default();

    for element in elements {
        match element["type"].as_str() {
            Some("node") => {
                let (Some(id), Some(lat), Some(lon)) = (
                    element["id"].as_i64(),
                    element["lat"].as_f64(),
                    element["lon"].as_f64(),
                ) else {
                    continue;
                };
                network.nodes.insert(id, Coordinate::new(lat, lon));
            }
            Some("way") => {
                let walkable = element["tags"].as_object().is_some_and(|tags| {
                    is_walkable(
                        tags.iter()
                            .filter_map(|(k, v)| v.as_str().map(|v| (k.as_str(), v))),
                    )
                });
                if !walkable {
                    continue;
                }
                let Some(refs) = element["nodes"].as_array() else {
                    continue;
                };
                let refs: Vec<i64> = refs.iter().filter_map(serde_json::Value::as_i64).collect();
                if refs.len() >= 2 {
                    network.ways.push(refs);
                }
            }
            _ => {}
        }
    }

    Ok(network)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_uses_south_west_north_east_order() {
        let area = BoundingBox::new(80.20, 13.00, 80.25, 13.05);
        let query = build_query(area, Duration::from_secs(30));
        assert!(query.starts_with("[out:json][timeout:30];"));
        assert!(query.contains("(13,80.2,13.05,80.25)"));
        assert!(query.contains("out body qt;"));
    }

    #[test]
    fn parses_nodes_and_walkable_ways() {
        let body = serde_json::json!({
            "elements": [
                { "type": "node", "id": 1, "lat": 13.0, "lon": 80.2 },
                { "type": "node", "id": 2, "lat": 13.001, "lon": 80.2 },
                { "type": "node", "id": 3, "lat": 13.002, "lon": 80.2 },
                { "type": "way", "id": 10, "nodes": [1, 2, 3],
                  "tags": { "highway": "residential" } },
                { "type": "way", "id": 11, "nodes": [1, 3],
                  "tags": { "highway": "motorway" } },
                { "type": "way", "id": 12, "nodes": [2],
                  "tags": { "highway": "footway" } }
            ]
        });

        let network = parse_response(&body).unwrap();
        assert_eq!(network.nodes.len(), 3);
        assert_eq!(network.ways, vec![vec![1, 2, 3]]);
    }

    #[test]
    fn rejects_error_payload() {
        let body = serde_json::json!({ "remark": "runtime error: Query timed out" });
        assert!(matches!(
            parse_response(&body),
            Err(GraphFetchError::Parse { .. })
        ));
    }
}
