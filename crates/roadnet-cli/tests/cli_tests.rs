//! Black-box tests for the roadnet CLI, driving the compiled binary against
//! a network file written into a temp directory.

use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

use roadnet_lib::{Junction, Road, TrafficManager};

/// Write a three-junction line network (A-B-C, 5 km legs at 60 km/h) and
/// return the file path.
fn write_fixture(dir: &TempDir) -> PathBuf {
    let manager = TrafficManager::new(8);
    manager.add_junction(Junction::new(1, "Alpha Sq", 0.0, 0.0, "Springfield", "North"));
    manager.add_junction(Junction::new(2, "Beta Cross", 0.0, 0.05, "Springfield", "Center"));
    manager.add_junction(Junction::new(3, "Gamma Gate", 0.0, 0.1, "Shelbyville", "South"));
    manager.add_road(Road::new(10, "AB Rd", 1, 2, 5.0, 60.0));
    manager.add_road(Road::new(11, "BC Rd", 2, 3, 5.0, 60.0));

    let path = dir.path().join("network.json");
    manager.save_network(&path).expect("fixture written");
    path
}

fn cli() -> Command {
    Command::cargo_bin("roadnet-cli").expect("binary builds")
}

#[test]
fn route_by_name_prints_path_and_totals() {
    let dir = TempDir::new().expect("temp dir");
    let network = write_fixture(&dir);

    cli()
        .args(["--network", network.to_str().expect("utf-8 path")])
        .args(["route", "--from", "Alpha Sq", "--to", "Gamma Gate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Alpha Sq (1)"))
        .stdout(predicate::str::contains("Beta Cross (2)"))
        .stdout(predicate::str::contains("Gamma Gate (3)"))
        .stdout(predicate::str::contains("Total: 10.00 km, 10.0 min"));
}

#[test]
fn route_accepts_ids_and_distance_metric() {
    let dir = TempDir::new().expect("temp dir");
    let network = write_fixture(&dir);

    cli()
        .args(["--network", network.to_str().expect("utf-8 path")])
        .args(["route", "--from", "1", "--to", "3", "--by-distance"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Total: 10.00 km"));
}

#[test]
fn traffic_override_scales_route_time() {
    let dir = TempDir::new().expect("temp dir");
    let network = write_fixture(&dir);

    cli()
        .args(["--network", network.to_str().expect("utf-8 path")])
        .args([
            "route",
            "--from",
            "Alpha Sq",
            "--to",
            "Beta Cross",
            "--traffic",
            "10=severe",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("traffic severe"))
        .stdout(predicate::str::contains("Total: 5.00 km, 12.5 min"));
}

#[test]
fn unknown_junction_fails_with_message() {
    let dir = TempDir::new().expect("temp dir");
    let network = write_fixture(&dir);

    cli()
        .args(["--network", network.to_str().expect("utf-8 path")])
        .args(["route", "--from", "Alpha Sq", "--to", "Nowhere"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown junction: Nowhere"));
}

#[test]
fn search_is_case_insensitive() {
    let dir = TempDir::new().expect("temp dir");
    let network = write_fixture(&dir);

    cli()
        .args(["--network", network.to_str().expect("utf-8 path")])
        .args(["search", "beta"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Beta Cross (2)"));
}

#[test]
fn city_lists_its_junctions() {
    let dir = TempDir::new().expect("temp dir");
    let network = write_fixture(&dir);

    cli()
        .args(["--network", network.to_str().expect("utf-8 path")])
        .args(["city", "Springfield"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Alpha Sq (1)"))
        .stdout(predicate::str::contains("Beta Cross (2)"))
        .stdout(predicate::str::contains("Gamma Gate").not());
}

#[test]
fn stats_reports_counts() {
    let dir = TempDir::new().expect("temp dir");
    let network = write_fixture(&dir);

    cli()
        .args(["--network", network.to_str().expect("utf-8 path")])
        .arg("stats")
        .assert()
        .success()
        .stdout(predicate::str::contains("Junctions: 3"))
        .stdout(predicate::str::contains("Roads: 2"))
        .stdout(predicate::str::contains("Graph edges: 4"));
}

#[test]
fn missing_network_file_is_an_error() {
    cli()
        .args(["--network", "/nonexistent/network.json", "stats"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to load network"));
}
