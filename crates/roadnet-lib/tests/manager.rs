use roadnet_lib::{
    Junction, Road, RouteMetric, TrafficLevel, TrafficManager, DEFAULT_CACHE_CAPACITY,
};

/// Three junctions in a line: A(1) - B(2) - C(3), both roads two-way, 5 km at
/// 60 km/h, so each leg has a 5-minute base time.
fn linear_network() -> TrafficManager {
    let manager = TrafficManager::default();
    manager.add_junction(Junction::new(1, "A", 0.0, 0.0, "Springfield", "North"));
    manager.add_junction(Junction::new(2, "B", 0.0, 0.05, "Springfield", "Center"));
    manager.add_junction(Junction::new(3, "C", 0.0, 0.1, "Shelbyville", "South"));
    manager.add_road(Road::new(10, "A-B", 1, 2, 5.0, 60.0));
    manager.add_road(Road::new(11, "B-C", 2, 3, 5.0, 60.0));
    manager
}

#[test]
fn end_to_end_route_by_distance_and_time() {
    let manager = linear_network();

    let by_distance = manager.find_route(1, 3, RouteMetric::Distance);
    assert!(by_distance.found);
    assert_eq!(
        by_distance.junctions.iter().map(|j| j.name.as_str()).collect::<Vec<_>>(),
        vec!["A", "B", "C"]
    );
    assert!((by_distance.total_distance - 10.0).abs() < 1e-9);

    let by_time = manager.find_route(1, 3, RouteMetric::Time);
    assert!(by_time.found);
    // 5 + 5 minutes at multiplier 1.0.
    assert!((by_time.total_time - 10.0).abs() < 1e-9);
}

#[test]
fn traffic_update_invalidates_cache_and_scales_time() {
    let manager = linear_network();

    let before = manager.find_route(1, 2, RouteMetric::Time);
    assert!((before.total_time - 5.0).abs() < 1e-9);

    assert!(manager.update_traffic_level(10, TrafficLevel::Severe));

    // The cached route must not be served; the recomputed one reflects the
    // 2.5x multiplier.
    let after = manager.find_route(1, 2, RouteMetric::Time);
    assert!((after.total_time - 12.5).abs() < 1e-9);
    assert_eq!(after.segments.len(), 1);
    assert_eq!(after.segments[0].level, TrafficLevel::Severe);

    // Distance is untouched by congestion.
    let by_distance = manager.find_route(1, 2, RouteMetric::Distance);
    assert!((by_distance.total_distance - 5.0).abs() < 1e-9);
}

#[test]
fn update_against_unknown_road_reports_not_found() {
    let manager = linear_network();
    assert!(!manager.update_traffic_level(999, TrafficLevel::Heavy));
    assert!(!manager.update_traffic_between(1, 99, TrafficLevel::Heavy));
}

#[test]
fn update_traffic_between_matches_either_direction() {
    let manager = linear_network();
    // Road 10 runs 1 -> 2 but is two-way, so the reversed pair matches too.
    assert!(manager.update_traffic_between(2, 1, TrafficLevel::Heavy));
    let route = manager.find_route(1, 2, RouteMetric::Time);
    assert!((route.total_time - 7.5).abs() < 1e-9);
}

#[test]
fn cache_hit_rate_after_one_miss_and_nine_hits() {
    let manager = linear_network();
    for _ in 0..10 {
        let route = manager.find_route(1, 3, RouteMetric::Time);
        assert!(route.found);
    }
    assert!((manager.cache_hit_rate() - 90.0).abs() < 1e-9);
}

#[test]
fn metrics_are_cached_independently() {
    let manager = linear_network();
    manager.find_route(1, 3, RouteMetric::Time);
    manager.find_route(1, 3, RouteMetric::Distance);
    // Two distinct cache keys, so two misses.
    assert_eq!(manager.cache_hit_rate(), 0.0);
}

#[test]
fn route_to_unknown_junction_is_not_found() {
    let manager = linear_network();
    let route = manager.find_route(1, 42, RouteMetric::Time);
    assert!(!route.found);
    assert!(route.junctions.is_empty());
    assert_eq!(route.total_distance, 0.0);
    assert_eq!(route.total_time, 0.0);
}

#[test]
fn not_found_routes_do_not_go_stale() {
    let manager = linear_network();
    manager.add_junction(Junction::new(4, "D", 0.0, 0.2, "Shelbyville", "East"));

    let unreachable = manager.find_route(1, 4, RouteMetric::Distance);
    assert!(!unreachable.found);

    // Connecting D must invalidate the cached miss.
    manager.add_road(Road::new(12, "C-D", 3, 4, 2.0, 60.0));
    let reachable = manager.find_route(1, 4, RouteMetric::Distance);
    assert!(reachable.found);
    assert!((reachable.total_distance - 12.0).abs() < 1e-9);
}

#[test]
fn name_city_and_substring_queries() {
    let manager = TrafficManager::default();
    manager.add_junction(Junction::new(1, "Oak St & 1st Ave", 0.0, 0.0, "Springfield", ""));
    manager.add_junction(Junction::new(2, "Oak St & 2nd Ave", 0.0, 0.1, "Springfield", ""));
    manager.add_junction(Junction::new(3, "Pine Rd & Main St", 0.1, 0.0, "Shelbyville", ""));

    assert_eq!(manager.get_junction_by_name("Oak St & 2nd Ave").map(|j| j.id), Some(2));
    assert!(manager.get_junction_by_name("Elm St").is_none());

    let by_city = manager.junctions_by_city("Springfield");
    assert_eq!(by_city.len(), 2);
    assert!(manager.junctions_by_city("Capital City").is_empty());

    // Substring search is case-insensitive and scans every name.
    let hits = manager.search_junctions("oak st");
    assert_eq!(hits.len(), 2);
    let hits = manager.search_junctions("MAIN");
    assert_eq!(hits.len(), 1);

    let prefixed = manager.junctions_with_prefix("Oak");
    assert_eq!(prefixed.len(), 2);

    let ranged = manager.junctions_in_range("Oak St & 1st Ave", "Oak St & 2nd Ave");
    assert_eq!(ranged.iter().map(|j| j.id).collect::<Vec<_>>(), vec![1, 2]);
}

#[test]
fn duplicate_name_last_insert_wins() {
    let manager = TrafficManager::default();
    manager.add_junction(Junction::new(1, "Roundabout", 0.0, 0.0, "Springfield", ""));
    manager.add_junction(Junction::new(2, "Roundabout", 0.0, 0.1, "Springfield", ""));
    assert_eq!(manager.get_junction_by_name("Roundabout").map(|j| j.id), Some(2));
    assert_eq!(manager.junction_count(), 2);
}

#[test]
fn connection_lists_append_per_road() {
    let manager = linear_network();
    let b = manager.get_junction(2).expect("junction exists");
    // B touches both roads: once as destination of A-B (two-way appends the
    // source), once as source of B-C.
    assert_eq!(b.connected_junctions, vec![1, 3]);

    // A one-way road only appends on the source side.
    manager.add_road({
        let mut road = Road::new(13, "C-A express", 3, 1, 9.0, 90.0);
        road.is_two_way = false;
        road
    });
    let c = manager.get_junction(3).expect("junction exists");
    assert_eq!(c.connected_junctions, vec![2, 1]);
    let a = manager.get_junction(1).expect("junction exists");
    assert_eq!(a.connected_junctions, vec![2]);
}

#[test]
fn one_way_road_routes_one_way() {
    let manager = TrafficManager::default();
    manager.add_junction(Junction::new(1, "A", 0.0, 0.0, "", ""));
    manager.add_junction(Junction::new(2, "B", 0.0, 0.1, "", ""));
    manager.add_road({
        let mut road = Road::new(20, "one-way", 1, 2, 3.0, 60.0);
        road.is_two_way = false;
        road
    });
    assert!(manager.find_route(1, 2, RouteMetric::Distance).found);
    assert!(!manager.find_route(2, 1, RouteMetric::Distance).found);
}

#[test]
fn find_route_by_name_resolves_through_name_index() {
    let manager = linear_network();
    let route = manager.find_route_by_name("A", "C", RouteMetric::Distance);
    assert!(route.found);
    assert!((route.total_distance - 10.0).abs() < 1e-9);

    let missing = manager.find_route_by_name("A", "Nowhere", RouteMetric::Distance);
    assert!(!missing.found);
}

#[test]
fn stats_reflect_network_shape() {
    let manager = linear_network();
    manager.find_route(1, 3, RouteMetric::Time);
    let stats = manager.stats();
    assert_eq!(stats.junctions, 3);
    assert_eq!(stats.roads, 2);
    assert_eq!(stats.graph_vertices, 3);
    // Two two-way roads produce four directed edges.
    assert_eq!(stats.graph_edges, 4);
    assert_eq!(stats.cache_entries, 1);

    let metrics = manager.junction_index_metrics();
    assert_eq!(metrics.elements, 3);
}

#[test]
fn bulk_load_registers_every_record() {
    let manager = TrafficManager::default();
    let records: Vec<Junction> = (0..50)
        .map(|i| Junction::new(i, format!("J{i}"), 0.0, i as f64 * 0.01, "Springfield", ""))
        .collect();
    assert_eq!(manager.load_junctions(records), 50);
    assert_eq!(manager.junction_count(), 50);
    assert_eq!(manager.junctions_by_city("Springfield").len(), 50);
}

#[test]
fn snapshot_restores_state_and_traffic() {
    let manager = linear_network();
    assert!(manager.update_traffic_level(11, TrafficLevel::Heavy));

    let snapshot = manager.snapshot();
    let restored =
        TrafficManager::from_snapshot(snapshot, DEFAULT_CACHE_CAPACITY).expect("snapshot is valid");

    assert_eq!(restored.junction_count(), 3);
    assert_eq!(restored.road_count(), 2);
    assert_eq!(
        restored.get_road(11).map(|r| r.traffic_level),
        Some(TrafficLevel::Heavy)
    );
    // The restored graph carries the re-applied multiplier: 5 + 7.5 minutes.
    let route = restored.find_route(1, 3, RouteMetric::Time);
    assert!((route.total_time - 12.5).abs() < 1e-9);
    // Connection lists were rebuilt, not doubled.
    assert_eq!(restored.get_junction(2).map(|j| j.connected_junctions), Some(vec![1, 3]));
}

#[test]
fn snapshot_rejects_invalid_roads() {
    let manager = linear_network();
    let mut snapshot = manager.snapshot();
    snapshot.roads[0].distance = -1.0;
    let err = TrafficManager::from_snapshot(snapshot, 10).expect_err("invalid road");
    assert!(err.to_string().contains("distance"));
}

#[test]
fn save_and_load_round_trip() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("network.json");

    let manager = linear_network();
    manager.update_traffic_level(10, TrafficLevel::Low);
    manager.save_network(&path).expect("save succeeds");

    let loaded = TrafficManager::load_network(&path, 10).expect("load succeeds");
    assert_eq!(loaded.junction_count(), 3);
    let route = loaded.find_route(1, 2, RouteMetric::Time);
    // Low traffic: 5 minutes * 0.8.
    assert!((route.total_time - 4.0).abs() < 1e-9);
}

#[test]
fn concurrent_queries_and_updates_stay_consistent() {
    use std::sync::Arc;

    let manager = Arc::new(linear_network());
    let mut handles = Vec::new();
    for worker in 0..4 {
        let manager = Arc::clone(&manager);
        handles.push(std::thread::spawn(move || {
            for i in 0..200 {
                if worker == 0 && i % 50 == 0 {
                    let level = if i % 100 == 0 {
                        TrafficLevel::Severe
                    } else {
                        TrafficLevel::Normal
                    };
                    assert!(manager.update_traffic_level(10, level));
                }
                let route = manager.find_route(1, 3, RouteMetric::Time);
                assert!(route.found);
                // Under either traffic level the B-C leg stays at 5 minutes,
                // so totals are bounded by the A-B extremes.
                assert!(route.total_time >= 10.0 - 1e-9);
                assert!(route.total_time <= 17.5 + 1e-9);
            }
        }));
    }
    for handle in handles {
        handle.join().expect("worker panicked");
    }
}
