//! In-memory walking network.
//!
//! A [`StreetNetwork`] is the raw material a provider hands back: node
//! coordinates keyed by `OpenStreetMap` id plus the node sequences of the
//! walkable ways. [`StreetGraph`] turns that into an undirected petgraph
//! weighted by geodesic edge length, with an R-tree over the nodes for
//! snapping endpoints.

use std::collections::BTreeMap;

use crime_route_geography_models::{Coordinate, Endpoint, RouteError, geodesic_distance_m};
use geo::{Distance as _, Haversine};
use petgraph::algo::{astar, kosaraju_scc};
use petgraph::graph::{NodeIndex, UnGraph};
use rstar::RTree;
use rstar::primitives::GeomWithData;

/// Number of R-tree candidates re-ranked by geodesic distance when
/// snapping. Degree-space nearest is skewed by latitude.
const SNAP_CANDIDATES: usize = 8;

/// Keeps the haversine estimate below the ellipsoidal edge lengths.
const HEURISTIC_SCALE: f64 = 0.99;

type IndexedNode = GeomWithData<[f64; 2], NodeIndex>;

/// Raw street data as fetched from a provider.
#[derive(Debug, Clone, Default)]
pub struct StreetNetwork {
    /// Node coordinates keyed by `OpenStreetMap` node id.
    pub nodes: BTreeMap<i64, Coordinate>,
    /// Node id sequences of walkable ways.
    pub ways: Vec<Vec<i64>>,
}

impl StreetNetwork {
    /// Returns `true` if there is nothing to build a graph from.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ways.is_empty() || self.nodes.is_empty()
    }
}

/// A node snapped to a requested endpoint.
#[derive(Debug, Clone, Copy)]
pub struct SnappedNode {
    /// Graph index of the node.
    pub index: NodeIndex,
    /// Distance from the requested coordinate to the node in metres.
    pub offset_m: f64,
}

/// A path through the graph.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphPath {
    /// Node coordinates in walking order.
    pub coordinates: Vec<Coordinate>,
    /// Summed edge length in metres.
    pub length_m: f64,
}

/// Undirected walking graph with a spatial index over its nodes.
pub struct StreetGraph {
    graph: UnGraph<Coordinate, f64>,
    index: RTree<IndexedNode>,
}

impl StreetGraph {
    /// Builds the graph from raw street data.
    ///
    /// Way segments that reference a node without coordinates are
    /// skipped, which clips ways at the edge of the fetched area. With
    /// `retain_largest_component`, islands that cannot reach the main
    /// network are dropped so endpoints never snap onto them.
    #[must_use]
    pub fn from_network(network: &StreetNetwork, retain_largest_component: bool) -> Self {
        let mut graph = UnGraph::<Coordinate, f64>::new_undirected();
        let mut indices: BTreeMap<i64, NodeIndex> = BTreeMap::new();

        for way in &network.ways {
            for pair in way.windows(2) {
                let (a, b) = (pair[0], pair[1]);
                if a == b {
                    continue;
                }
                let (Some(&coord_a), Some(&coord_b)) =
                    (network.nodes.get(&a), network.nodes.get(&b))
                else {
                    continue;
                };

                let ia = *indices.entry(a).or_insert_with(|| graph.add_node(coord_a));
                let ib = *indices.entry(b).or_insert_with(|| graph.add_node(coord_b));
                graph.add_edge(ia, ib, geodesic_distance_m(coord_a, coord_b));
            }
        }

        if retain_largest_component && graph.node_count() > 0 {
            graph = largest_component(&graph);
        }

        let index = RTree::bulk_load(
            graph
                .node_indices()
                .map(|i| {
                    let c = graph[i];
                    GeomWithData::new([c.longitude, c.latitude], i)
                })
                .collect(),
        );

        log::debug!(
            "Built street graph: {} nodes, {} edges",
            graph.node_count(),
            graph.edge_count()
        );

        Self { graph, index }
    }

    /// Number of nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Returns `true` if the graph has no edges to walk.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.graph.edge_count() == 0
    }

    /// Coordinate of a node.
    #[must_use]
    pub fn coordinate(&self, index: NodeIndex) -> Option<Coordinate> {
        self.graph.node_weight(index).copied()
    }

    /// Finds the node nearest to `coord` within `max_distance_m`.
    #[must_use]
    pub fn nearest_node(&self, coord: Coordinate, max_distance_m: f64) -> Option<SnappedNode> {
        self.index
            .nearest_neighbor_iter(&[coord.longitude, coord.latitude])
            .take(SNAP_CANDIDATES)
            .map(|entry| SnappedNode {
                index: entry.data,
                offset_m: geodesic_distance_m(coord, self.graph[entry.data]),
            })
            .min_by(|a, b| a.offset_m.total_cmp(&b.offset_m))
            .filter(|snapped| snapped.offset_m <= max_distance_m)
    }

    /// A* search between two nodes with a great-circle heuristic.
    #[must_use]
    pub fn shortest_path(&self, from: NodeIndex, to: NodeIndex) -> Option<GraphPath> {
        let goal = self.graph.node_weight(to)?.to_point();

        let (length_m, nodes) = astar(
            &self.graph,
            from,
            |n| n == to,
            |e| *e.weight(),
            |n| Haversine.distance(self.graph[n].to_point(), goal) * HEURISTIC_SCALE,
        )?;

        Some(GraphPath {
            coordinates: nodes.into_iter().map(|n| self.graph[n]).collect(),
            length_m,
        })
    }

    /// Snaps both endpoints and searches for the shortest walking path.
    ///
    /// # Errors
    ///
    /// * [`RouteError::EmptyGraph`] if the graph has no edges
    /// * [`RouteError::NoNearbyNode`] if an endpoint is farther than
    ///   `snap_radius_m` from every node
    /// * [`RouteError::NoPath`] if the snapped nodes are not connected
    pub fn route(
        &self,
        start: Coordinate,
        end: Coordinate,
        snap_radius_m: f64,
    ) -> Result<GraphPath, RouteError> {
        if self.is_empty() {
            return Err(RouteError::EmptyGraph);
        }

        let snap = |coord: Coordinate, endpoint: Endpoint| {
            self.nearest_node(coord, snap_radius_m)
                .ok_or(RouteError::NoNearbyNode {
                    endpoint,
                    radius_m: snap_radius_m,
                })
        };

        let from = snap(start, Endpoint::Start)?;
        let to = snap(end, Endpoint::End)?;
        log::debug!(
            "Snapped endpoints: start {:.0} m, end {:.0} m from nearest node",
            from.offset_m,
            to.offset_m
        );

        self.shortest_path(from.index, to.index)
            .ok_or(RouteError::NoPath)
    }
}

/// Returns a copy of `graph` holding only its largest connected component.
fn largest_component(graph: &UnGraph<Coordinate, f64>) -> UnGraph<Coordinate, f64> {
    let components = kosaraju_scc(graph);
    let Some(largest) = components.iter().max_by_key(|c| c.len()) else {
        return graph.clone();
    };
    if largest.len() == graph.node_count() {
        return graph.clone();
    }

    let mut keep = vec![false; graph.node_count()];
    for node in largest {
        keep[node.index()] = true;
    }

    log::debug!(
        "Dropping {} nodes outside the largest component",
        graph.node_count() - largest.len()
    );

    graph.filter_map(
        |node, coord| keep[node.index()].then_some(*coord),
        |_, weight| Some(*weight),
    )
}
