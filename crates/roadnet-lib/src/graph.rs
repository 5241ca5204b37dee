use std::collections::HashMap;

use tracing::debug;

use crate::heap::PriorityFrontier;
use crate::model::{JunctionId, RouteMetric};

/// Directed edge in the road network.
///
/// Distance and base time are fixed when the edge is created; only the
/// traffic multiplier changes over the edge's life.
#[derive(Debug, Clone, PartialEq)]
pub struct RoadEdge {
    pub target: JunctionId,
    /// Kilometres.
    pub distance: f64,
    /// Free-flow traversal time in minutes.
    pub base_time: f64,
    /// Congestion scalar; 1.0 until the first traffic update.
    pub traffic_multiplier: f64,
    pub road_name: String,
}

impl RoadEdge {
    /// Traversal time in minutes under current traffic.
    pub fn actual_time(&self) -> f64 {
        self.base_time * self.traffic_multiplier
    }

    fn cost(&self, metric: RouteMetric) -> f64 {
        match metric {
            RouteMetric::Distance => self.distance,
            RouteMetric::Time => self.actual_time(),
        }
    }
}

/// Shortest path provided by [`RoadGraph::shortest_path`].
#[derive(Debug, Clone, PartialEq)]
pub struct ShortestPath {
    /// Junction ids from source to destination inclusive.
    pub path: Vec<JunctionId>,
    /// Sum of edge distances along the path, in kilometres.
    pub total_distance: f64,
    /// Sum of traffic-adjusted edge times along the path, in minutes.
    pub total_time: f64,
}

/// Adjacency-list weighted directed graph over junction ids.
#[derive(Debug, Clone, Default)]
pub struct RoadGraph {
    adjacency: HashMap<JunctionId, Vec<RoadEdge>>,
}

impl RoadGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a vertex. Idempotent.
    pub fn add_vertex(&mut self, id: JunctionId) {
        self.adjacency.entry(id).or_default();
    }

    pub fn has_vertex(&self, id: JunctionId) -> bool {
        self.adjacency.contains_key(&id)
    }

    /// Add a directed edge, implicitly registering both endpoints.
    pub fn add_edge(
        &mut self,
        source: JunctionId,
        destination: JunctionId,
        distance: f64,
        base_time: f64,
        road_name: &str,
    ) {
        self.add_vertex(destination);
        self.adjacency.entry(source).or_default().push(RoadEdge {
            target: destination,
            distance,
            base_time,
            traffic_multiplier: 1.0,
            road_name: road_name.to_string(),
        });
    }

    /// Add a two-way road as a mirrored pair of directed edges sharing all
    /// weight fields.
    pub fn add_undirected_edge(
        &mut self,
        source: JunctionId,
        destination: JunctionId,
        distance: f64,
        base_time: f64,
        road_name: &str,
    ) {
        self.add_edge(source, destination, distance, base_time, road_name);
        self.add_edge(destination, source, distance, base_time, road_name);
    }

    pub fn neighbours(&self, id: JunctionId) -> &[RoadEdge] {
        self.adjacency.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// First edge from `source` to `destination`, if any.
    pub fn edge(&self, source: JunctionId, destination: JunctionId) -> Option<&RoadEdge> {
        self.neighbours(source)
            .iter()
            .find(|edge| edge.target == destination)
    }

    pub fn vertex_count(&self) -> usize {
        self.adjacency.len()
    }

    pub fn edge_count(&self) -> usize {
        self.adjacency.values().map(Vec::len).sum()
    }

    /// Overwrite the traffic multiplier on the first edge `source ->
    /// destination`. Distance and base time are immutable.
    pub fn update_traffic(
        &mut self,
        source: JunctionId,
        destination: JunctionId,
        multiplier: f64,
    ) -> bool {
        let Some(edges) = self.adjacency.get_mut(&source) else {
            return false;
        };
        match edges.iter_mut().find(|edge| edge.target == destination) {
            Some(edge) => {
                edge.traffic_multiplier = multiplier;
                true
            }
            None => false,
        }
    }

    /// Update both directions of a two-way road. Callers must use this (not
    /// the single-direction form) for two-way roads, or the graph becomes
    /// asymmetric.
    pub fn update_traffic_bidirectional(
        &mut self,
        source: JunctionId,
        destination: JunctionId,
        multiplier: f64,
    ) {
        self.update_traffic(source, destination, multiplier);
        self.update_traffic(destination, source, multiplier);
    }

    /// Dijkstra's algorithm from `source` to `destination` under the given
    /// cost metric, O((V + E) log V) on the binary-heap frontier.
    ///
    /// Both total distance and total time are accumulated along the relaxed
    /// path regardless of which metric drives the search. Search stops the
    /// moment the destination is popped from the frontier, which is valid
    /// because edge costs are always positive. Absent endpoints and
    /// disconnected pairs yield `None`.
    pub fn shortest_path(
        &self,
        source: JunctionId,
        destination: JunctionId,
        metric: RouteMetric,
    ) -> Option<ShortestPath> {
        if !self.has_vertex(source) || !self.has_vertex(destination) {
            return None;
        }
        if source == destination {
            return Some(ShortestPath {
                path: vec![source],
                total_distance: 0.0,
                total_time: 0.0,
            });
        }

        let mut costs: HashMap<JunctionId, f64> = HashMap::new();
        let mut distances: HashMap<JunctionId, f64> = HashMap::new();
        let mut times: HashMap<JunctionId, f64> = HashMap::new();
        let mut previous: HashMap<JunctionId, JunctionId> = HashMap::new();
        let mut frontier = PriorityFrontier::new();

        costs.insert(source, 0.0);
        distances.insert(source, 0.0);
        times.insert(source, 0.0);
        frontier.insert(source, 0.0);

        let mut settled_destination = false;
        while let Some((current, _)) = frontier.pop() {
            if current == destination {
                settled_destination = true;
                break;
            }

            let current_cost = costs.get(&current).copied().unwrap_or(f64::INFINITY);
            let current_distance = distances.get(&current).copied().unwrap_or(f64::INFINITY);
            let current_time = times.get(&current).copied().unwrap_or(f64::INFINITY);

            for edge in self.neighbours(current) {
                let next = edge.target;
                let next_cost = current_cost + edge.cost(metric);
                if next_cost < costs.get(&next).copied().unwrap_or(f64::INFINITY) {
                    costs.insert(next, next_cost);
                    distances.insert(next, current_distance + edge.distance);
                    times.insert(next, current_time + edge.actual_time());
                    previous.insert(next, current);
                    // Upsert: acts as decrease-key when already queued.
                    frontier.insert(next, next_cost);
                }
            }
        }

        if !settled_destination {
            debug!(source, destination, "no path between junctions");
            return None;
        }

        let path = reconstruct_path(&previous, source, destination)?;
        Some(ShortestPath {
            path,
            total_distance: distances.get(&destination).copied().unwrap_or(0.0),
            total_time: times.get(&destination).copied().unwrap_or(0.0),
        })
    }
}

/// Walk the predecessor map from destination back to source. A broken chain
/// means the search state is inconsistent; report not-found rather than a
/// partial path.
fn reconstruct_path(
    previous: &HashMap<JunctionId, JunctionId>,
    source: JunctionId,
    destination: JunctionId,
) -> Option<Vec<JunctionId>> {
    let mut path = vec![destination];
    let mut current = destination;
    while current != source {
        match previous.get(&current) {
            Some(&parent) => {
                path.push(parent);
                current = parent;
            }
            None => {
                debug!(source, destination, "predecessor chain broken");
                return None;
            }
        }
    }
    path.reverse();
    Some(path)
}
