//! Local `OpenStreetMap` PBF extract provider.
//!
//! Reads the walking network for an area from a `.osm.pbf` file instead
//! of a remote API. Two passes over the file: the first collects node
//! positions inside the area, the second keeps walkable ways that touch
//! at least two of those nodes. Ways leaving the area are clipped when
//! the graph is built.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use crime_route_geography_models::{BoundingBox, Coordinate};
use osmpbf::{Element, ElementReader};

use crate::walkable::is_walkable;
use crate::{GraphFetchError, StreetGraphProvider, StreetNetwork};

/// Street network provider reading a local PBF extract.
pub struct OsmPbfProvider {
    path: PathBuf,
}

impl OsmPbfProvider {
    /// Creates a provider for the extract at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl StreetGraphProvider for OsmPbfProvider {
    fn name(&self) -> &'static str {
        "osm_pbf"
    }

    async fn fetch(&self, area: BoundingBox) -> Result<StreetNetwork, GraphFetchError> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || read_network(&path, area))
            .await
            .map_err(|e| GraphFetchError::Parse {
                message: format!("PBF reader task failed: {e}"),
            })?
    }
}

/// Reads the walkable street network inside `area` from a PBF file.
///
/// # Errors
///
/// Returns [`GraphFetchError::Pbf`] if the file cannot be opened or
/// decoded.
pub fn read_network(path: &Path, area: BoundingBox) -> Result<StreetNetwork, GraphFetchError> {
    if !path.exists() {
        return Err(GraphFetchError::Pbf {
            path: path.display().to_string(),
            message: "file not found".to_string(),
        });
    }

    log::info!("Reading walking network for {} from {}", area.key(), path.display());

    let pbf_error = |e: osmpbf::Error| GraphFetchError::Pbf {
        path: path.display().to_string(),
        message: e.to_string(),
    };

    let nodes: BTreeMap<i64, Coordinate> = ElementReader::from_path(path)
        .map_err(pbf_error)?
        .par_map_reduce(
            |element| {
                let mut found = Vec::new();
                let (id, lat, lon) = match element {
                    Element::Node(node) => (node.id(), node.lat(), node.lon()),
                    Element::DenseNode(node) => (node.id(), node.lat(), node.lon()),
                    Element::Way(_) | Element::Relation(_) => return found,
                };
                let coord = Coordinate::new(lat, lon);
                if area.contains(coord) {
                    found.push((id, coord));
                }
                found
            },
            Vec::new,
            |mut a, mut b| {
                a.append(&mut b);
                a
            },
        )
        .map_err(pbf_error)?
        .into_iter()
        .collect();

    log::debug!("{} nodes inside the area", nodes.len());

    let ways = ElementReader::from_path(path)
        .map_err(pbf_error)?
        .par_map_reduce(
            |element| {
                let Element::Way(way) = element else {
                    return Vec::new();
                };
                if !is_walkable(way.tags()) {
                    return Vec::new();
                }
                let refs: Vec<i64> = way.refs().collect();
                let inside = refs.iter().filter(|id| nodes.contains_key(id)).count();
                if inside >= 2 { vec![refs] } else { Vec::new() }
            },
            Vec::new,
            |mut a, mut b| {
                a.append(&mut b);
                a
            },
        )
        .map_err(pbf_error)?;

    log::info!("Extracted {} walkable ways from PBF", ways.len());

    Ok(StreetNetwork { nodes, ways })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_extract_is_an_error() {
        let area = BoundingBox::new(80.2, 13.0, 80.3, 13.1);
        let result = read_network(Path::new("/nonexistent/chennai.osm.pbf"), area);
        assert!(matches!(result, Err(GraphFetchError::Pbf { .. })));
    }
}
