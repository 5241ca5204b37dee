use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::btree::OrderedIndex;
use crate::cache::{RouteCache, RouteKey};
use crate::error::{Error, Result};
use crate::graph::RoadGraph;
use crate::hash::{HashIndex, HashIndexMetrics};
use crate::model::{
    Junction, JunctionId, Road, RoadId, RouteMetric, RouteResult, TrafficLevel, TrafficSegment,
};

/// Route cache entries kept by default.
pub const DEFAULT_CACHE_CAPACITY: usize = 100;

/// Everything guarded by the data mutex: the id stores, the sorted name and
/// city indexes, and the road network graph. Mutating operations keep these
/// mutually consistent under a single lock acquisition.
#[derive(Debug)]
struct NetworkState {
    junctions: HashIndex<JunctionId, Junction>,
    name_index: OrderedIndex<String, JunctionId>,
    city_index: OrderedIndex<String, Vec<JunctionId>>,
    roads: HashIndex<RoadId, Road>,
    network: RoadGraph,
}

impl NetworkState {
    fn new() -> Self {
        Self {
            junctions: HashIndex::new(),
            name_index: OrderedIndex::new(),
            city_index: OrderedIndex::new(),
            roads: HashIndex::new(),
            network: RoadGraph::new(),
        }
    }
}

/// Counters reported by [`TrafficManager::stats`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NetworkStats {
    pub junctions: usize,
    pub roads: usize,
    pub graph_vertices: usize,
    pub graph_edges: usize,
    pub cache_entries: usize,
    pub cache_hit_rate: f64,
}

/// Serializable image of the full network state. Traffic levels ride on the
/// road records; indexes and graph are rebuilt on restore.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkSnapshot {
    pub junctions: Vec<Junction>,
    pub roads: Vec<Road>,
}

/// Orchestrates the indexes, graph, and route cache behind two coarse
/// mutexes.
///
/// All callers go through this type; the underlying structures are never
/// handed out. Structural access serializes on the data lock and cache access
/// on an independent cache lock, so `find_route` can race with an identical
/// query and both will recompute; duplicate work is tolerated. Any mutation
/// that changes edge costs clears the cache wholesale before returning, so no
/// stale route survives a traffic update.
#[derive(Debug)]
pub struct TrafficManager {
    data: Mutex<NetworkState>,
    cache: Mutex<RouteCache>,
}

impl Default for TrafficManager {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}

impl TrafficManager {
    pub fn new(cache_capacity: usize) -> Self {
        Self {
            data: Mutex::new(NetworkState::new()),
            cache: Mutex::new(RouteCache::new(cache_capacity)),
        }
    }

    fn lock_data(&self) -> MutexGuard<'_, NetworkState> {
        self.data.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_cache(&self) -> MutexGuard<'_, RouteCache> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a junction in the id store, the name and city indexes, and
    /// the graph, all under one lock acquisition.
    ///
    /// Names are treated as effectively unique: a second junction with the
    /// same exact name takes over the name-index slot.
    pub fn add_junction(&self, junction: Junction) {
        let mut data = self.lock_data();
        data.network.add_vertex(junction.id);
        data.name_index.insert(junction.name.clone(), junction.id);
        let appended = data
            .city_index
            .search_mut(&junction.city)
            .map(|ids| ids.push(junction.id))
            .is_some();
        if !appended {
            data.city_index
                .insert(junction.city.clone(), vec![junction.id]);
        }
        data.junctions.insert(junction.id, junction);
    }

    /// Register a road: store the record, add one or two graph edges, and
    /// append each endpoint to the other's connection list. Dangling
    /// junction references are tolerated; the edge makes the missing vertex
    /// implicitly valid.
    ///
    /// New edges change the reachable cost surface, so the route cache is
    /// cleared.
    pub fn add_road(&self, road: Road) {
        {
            let mut data = self.lock_data();
            if road.is_two_way {
                data.network.add_undirected_edge(
                    road.source_junction,
                    road.dest_junction,
                    road.distance,
                    road.base_time,
                    &road.name,
                );
            } else {
                data.network.add_edge(
                    road.source_junction,
                    road.dest_junction,
                    road.distance,
                    road.base_time,
                    &road.name,
                );
            }
            if let Some(source) = data.junctions.get_mut(&road.source_junction) {
                source.connected_junctions.push(road.dest_junction);
            }
            if road.is_two_way {
                if let Some(dest) = data.junctions.get_mut(&road.dest_junction) {
                    dest.connected_junctions.push(road.source_junction);
                }
            }
            data.roads.insert(road.id, road);
        }
        self.lock_cache().clear();
    }

    pub fn get_junction(&self, id: JunctionId) -> Option<Junction> {
        self.lock_data().junctions.get(&id).cloned()
    }

    /// Exact name lookup through the sorted index.
    pub fn get_junction_by_name(&self, name: &str) -> Option<Junction> {
        let data = self.lock_data();
        let id = *data.name_index.search(&name.to_string())?;
        data.junctions.get(&id).cloned()
    }

    pub fn all_junctions(&self) -> Vec<Junction> {
        let data = self.lock_data();
        let mut out = Vec::with_capacity(data.junctions.len());
        data.junctions.for_each(|_, junction| out.push(junction.clone()));
        out
    }

    pub fn junctions_by_city(&self, city: &str) -> Vec<Junction> {
        let data = self.lock_data();
        let Some(ids) = data.city_index.search(&city.to_string()) else {
            return Vec::new();
        };
        ids.iter()
            .filter_map(|id| data.junctions.get(id).cloned())
            .collect()
    }

    /// Case-insensitive substring match over all junction names. O(n) scan;
    /// never touches the cache.
    pub fn search_junctions(&self, query: &str) -> Vec<Junction> {
        let needle = query.to_lowercase();
        let data = self.lock_data();
        let mut out = Vec::new();
        data.junctions.for_each(|_, junction| {
            if junction.name.to_lowercase().contains(&needle) {
                out.push(junction.clone());
            }
        });
        out
    }

    /// Junctions whose name starts with `prefix`, in name order.
    pub fn junctions_with_prefix(&self, prefix: &str) -> Vec<Junction> {
        let data = self.lock_data();
        data.name_index
            .prefix_search(prefix)
            .into_iter()
            .filter_map(|(_, id)| data.junctions.get(&id).cloned())
            .collect()
    }

    /// Junctions whose name falls in `[min, max]` inclusive, in name order.
    pub fn junctions_in_range(&self, min: &str, max: &str) -> Vec<Junction> {
        let data = self.lock_data();
        data.name_index
            .range(&min.to_string(), &max.to_string())
            .into_iter()
            .filter_map(|(_, id)| data.junctions.get(&id).cloned())
            .collect()
    }

    pub fn get_road(&self, id: RoadId) -> Option<Road> {
        self.lock_data().roads.get(&id).cloned()
    }

    pub fn all_roads(&self) -> Vec<Road> {
        let data = self.lock_data();
        let mut out = Vec::with_capacity(data.roads.len());
        data.roads.for_each(|_, road| out.push(road.clone()));
        out
    }

    /// Set the traffic level of a road and push the derived multiplier into
    /// its graph edge(s), both directions for a two-way road. Returns `false`
    /// when the road id is unknown.
    ///
    /// Any successful update clears the whole route cache; invalidation is
    /// deliberately coarse.
    pub fn update_traffic_level(&self, road_id: RoadId, level: TrafficLevel) -> bool {
        {
            let mut data = self.lock_data();
            let Some(road) = data.roads.get_mut(&road_id) else {
                return false;
            };
            road.traffic_level = level;
            let (source, dest, two_way) =
                (road.source_junction, road.dest_junction, road.is_two_way);
            let multiplier = level.multiplier();
            if two_way {
                data.network
                    .update_traffic_bidirectional(source, dest, multiplier);
            } else {
                data.network.update_traffic(source, dest, multiplier);
            }
        }
        debug!(road_id, %level, "traffic level updated, route cache cleared");
        self.lock_cache().clear();
        true
    }

    /// Set the traffic level on whichever road connects two junctions,
    /// scanning the road store. Returns `false` when no road matches.
    pub fn update_traffic_between(
        &self,
        source: JunctionId,
        dest: JunctionId,
        level: TrafficLevel,
    ) -> bool {
        let road_id = {
            let data = self.lock_data();
            let mut found = None;
            data.roads.for_each(|id, road| {
                let forward = road.source_junction == source && road.dest_junction == dest;
                let reverse = road.is_two_way
                    && road.source_junction == dest
                    && road.dest_junction == source;
                if found.is_none() && (forward || reverse) {
                    found = Some(*id);
                }
            });
            found
        };
        match road_id {
            Some(id) => self.update_traffic_level(id, level),
            None => false,
        }
    }

    /// Shortest route between two junctions under the chosen metric, served
    /// from the cache when possible.
    ///
    /// The cache lock is released while Dijkstra runs under the data lock,
    /// then reacquired to store the result, so two identical concurrent
    /// queries may both compute. Not-found results are cached too; they stay
    /// valid until the network or its traffic changes, and both of those
    /// clear the cache.
    pub fn find_route(
        &self,
        source: JunctionId,
        destination: JunctionId,
        metric: RouteMetric,
    ) -> RouteResult {
        let key = RouteKey {
            source,
            destination,
            metric,
        };
        if let Some(cached) = self.lock_cache().get(&key) {
            debug!(source, destination, ?metric, "route cache hit");
            return cached;
        }

        let result = {
            let data = self.lock_data();
            match data.network.shortest_path(source, destination, metric) {
                Some(found) => {
                    let junctions = found
                        .path
                        .iter()
                        .filter_map(|id| data.junctions.get(id).cloned())
                        .collect();
                    let segments = found
                        .path
                        .windows(2)
                        .filter_map(|leg| {
                            data.network.edge(leg[0], leg[1]).map(|edge| TrafficSegment {
                                from: leg[0],
                                to: leg[1],
                                road_name: edge.road_name.clone(),
                                distance: edge.distance,
                                time: edge.actual_time(),
                                level: TrafficLevel::from_multiplier(edge.traffic_multiplier),
                            })
                        })
                        .collect();
                    RouteResult {
                        found: true,
                        junctions,
                        segments,
                        total_distance: found.total_distance,
                        total_time: found.total_time,
                    }
                }
                None => RouteResult::not_found(),
            }
        };

        self.lock_cache().put(key, result.clone());
        result
    }

    /// Resolve junction names through the sorted index, then route. Unknown
    /// names yield a not-found result rather than an error.
    pub fn find_route_by_name(
        &self,
        source_name: &str,
        dest_name: &str,
        metric: RouteMetric,
    ) -> RouteResult {
        let endpoints = {
            let data = self.lock_data();
            let source = data.name_index.search(&source_name.to_string()).copied();
            let dest = data.name_index.search(&dest_name.to_string()).copied();
            source.zip(dest)
        };
        match endpoints {
            Some((source, dest)) => self.find_route(source, dest, metric),
            None => RouteResult::not_found(),
        }
    }

    /// Drop all memoized routes and reset the hit/miss counters.
    pub fn invalidate_cache(&self) {
        self.lock_cache().clear();
    }

    pub fn junction_count(&self) -> usize {
        self.lock_data().junctions.len()
    }

    pub fn road_count(&self) -> usize {
        self.lock_data().roads.len()
    }

    /// Cache hit rate as a percentage; 0 before any route query.
    pub fn cache_hit_rate(&self) -> f64 {
        self.lock_cache().hit_rate()
    }

    pub fn stats(&self) -> NetworkStats {
        let (junctions, roads, graph_vertices, graph_edges) = {
            let data = self.lock_data();
            (
                data.junctions.len(),
                data.roads.len(),
                data.network.vertex_count(),
                data.network.edge_count(),
            )
        };
        let cache = self.lock_cache();
        NetworkStats {
            junctions,
            roads,
            graph_vertices,
            graph_edges,
            cache_entries: cache.len(),
            cache_hit_rate: cache.hit_rate(),
        }
    }

    /// Chain-health counters for the junction store.
    pub fn junction_index_metrics(&self) -> HashIndexMetrics {
        self.lock_data().junctions.metrics()
    }

    /// Bulk-register already-parsed junction records. The record parsing
    /// itself (JSON, XML, whatever the boundary speaks) lives outside the
    /// core.
    pub fn load_junctions<I>(&self, junctions: I) -> usize
    where
        I: IntoIterator<Item = Junction>,
    {
        let mut count = 0;
        for junction in junctions {
            self.add_junction(junction);
            count += 1;
        }
        info!(count, "bulk-loaded junctions");
        count
    }

    /// Export the full network state as a serializable snapshot. Junctions
    /// and roads are ordered by id so repeated snapshots of the same state
    /// are byte-identical.
    pub fn snapshot(&self) -> NetworkSnapshot {
        let mut junctions = self.all_junctions();
        junctions.sort_by_key(|j| j.id);
        let mut roads = self.all_roads();
        roads.sort_by_key(|r| r.id);
        NetworkSnapshot { junctions, roads }
    }

    /// Rebuild a manager from a snapshot: every index and the graph are
    /// reconstructed, and stored traffic levels are re-applied through the
    /// normal update path so edge multipliers match the records.
    pub fn from_snapshot(snapshot: NetworkSnapshot, cache_capacity: usize) -> Result<Self> {
        for road in &snapshot.roads {
            if road.distance <= 0.0 {
                return Err(Error::InvalidRoad {
                    id: road.id,
                    reason: format!("distance must be positive, got {}", road.distance),
                });
            }
            if road.speed_limit <= 0.0 {
                return Err(Error::InvalidRoad {
                    id: road.id,
                    reason: format!("speed limit must be positive, got {}", road.speed_limit),
                });
            }
        }

        let manager = Self::new(cache_capacity);
        for mut junction in snapshot.junctions {
            // Connection lists are rebuilt as roads are added.
            junction.connected_junctions.clear();
            manager.add_junction(junction);
        }
        for road in snapshot.roads {
            let (id, level) = (road.id, road.traffic_level);
            manager.add_road(road);
            if level != TrafficLevel::Normal {
                manager.update_traffic_level(id, level);
            }
        }
        Ok(manager)
    }

    /// Write the current network to a JSON file.
    pub fn save_network(&self, path: &Path) -> Result<()> {
        let snapshot = self.snapshot();
        let json = serde_json::to_string_pretty(&snapshot)?;
        std::fs::write(path, json)?;
        info!(path = %path.display(), junctions = snapshot.junctions.len(), roads = snapshot.roads.len(), "network saved");
        Ok(())
    }

    /// Load a network from a JSON file produced by [`Self::save_network`] (or
    /// any external tool emitting the same shape).
    pub fn load_network(path: &Path, cache_capacity: usize) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let snapshot: NetworkSnapshot = serde_json::from_str(&json)?;
        info!(path = %path.display(), junctions = snapshot.junctions.len(), roads = snapshot.roads.len(), "network loaded");
        Self::from_snapshot(snapshot, cache_capacity)
    }
}
