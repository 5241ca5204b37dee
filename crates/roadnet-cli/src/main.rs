use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use roadnet_lib::{JunctionId, RouteMetric, TrafficLevel, TrafficManager, DEFAULT_CACHE_CAPACITY};

#[derive(Parser, Debug)]
#[command(author, version, about = "Road-network routing utilities")]
struct Cli {
    /// Path to a network JSON file (junctions and roads).
    #[arg(long)]
    network: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compute a route between two junctions, given by id or exact name.
    Route {
        #[arg(long = "from")]
        from: String,
        #[arg(long = "to")]
        to: String,
        /// Optimize for raw distance instead of traffic-adjusted time.
        #[arg(long)]
        by_distance: bool,
        /// Traffic overrides applied before routing, as ROAD_ID=LEVEL
        /// (low, normal, heavy, severe). May be repeated.
        #[arg(long = "traffic", value_name = "ROAD_ID=LEVEL")]
        traffic: Vec<String>,
    },
    /// List junctions whose name contains the query, case-insensitively.
    Search { query: String },
    /// List junctions in a city.
    City { name: String },
    /// Print network counters.
    Stats,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let manager = TrafficManager::load_network(&cli.network, DEFAULT_CACHE_CAPACITY)
        .with_context(|| format!("failed to load network from {}", cli.network.display()))?;

    match cli.command {
        Command::Route {
            from,
            to,
            by_distance,
            traffic,
        } => handle_route(&manager, &from, &to, by_distance, &traffic),
        Command::Search { query } => handle_search(&manager, &query),
        Command::City { name } => handle_city(&manager, &name),
        Command::Stats => handle_stats(&manager, &cli.network),
    }
}

fn handle_route(
    manager: &TrafficManager,
    from: &str,
    to: &str,
    by_distance: bool,
    traffic: &[String],
) -> Result<()> {
    for spec in traffic {
        let (road_id, level) = parse_traffic_override(spec)?;
        if !manager.update_traffic_level(road_id, level) {
            bail!("unknown road id in traffic override: {road_id}");
        }
    }

    let source = resolve_junction(manager, from)?;
    let destination = resolve_junction(manager, to)?;
    let metric = if by_distance {
        RouteMetric::Distance
    } else {
        RouteMetric::Time
    };

    let route = manager.find_route(source, destination, metric);
    if !route.found {
        bail!("no route found between {from} and {to}");
    }

    println!("Route:");
    for junction in &route.junctions {
        println!("- {} ({})", junction.name, junction.id);
    }
    for segment in &route.segments {
        println!(
            "  {} -> {} via {}: {:.2} km, {:.1} min, traffic {}",
            segment.from, segment.to, segment.road_name, segment.distance, segment.time,
            segment.level
        );
    }
    println!(
        "Total: {:.2} km, {:.1} min",
        route.total_distance, route.total_time
    );
    Ok(())
}

fn handle_search(manager: &TrafficManager, query: &str) -> Result<()> {
    let hits = manager.search_junctions(query);
    if hits.is_empty() {
        println!("No junctions match '{query}'");
        return Ok(());
    }
    for junction in hits {
        println!(
            "{} ({}) in {} [{:.4}, {:.4}]",
            junction.name, junction.id, junction.city, junction.latitude, junction.longitude
        );
    }
    Ok(())
}

fn handle_city(manager: &TrafficManager, name: &str) -> Result<()> {
    let junctions = manager.junctions_by_city(name);
    if junctions.is_empty() {
        println!("No junctions in '{name}'");
        return Ok(());
    }
    for junction in junctions {
        println!("{} ({})", junction.name, junction.id);
    }
    Ok(())
}

fn handle_stats(manager: &TrafficManager, network: &Path) -> Result<()> {
    let stats = manager.stats();
    println!("Network: {}", network.display());
    println!("Junctions: {}", stats.junctions);
    println!("Roads: {}", stats.roads);
    println!("Graph vertices: {}", stats.graph_vertices);
    println!("Graph edges: {}", stats.graph_edges);
    println!("Cache hit rate: {:.1}%", stats.cache_hit_rate);
    Ok(())
}

/// Accept either a junction id or an exact junction name.
fn resolve_junction(manager: &TrafficManager, spec: &str) -> Result<JunctionId> {
    if let Some(junction) = manager.get_junction_by_name(spec) {
        return Ok(junction.id);
    }
    if let Ok(id) = spec.parse::<JunctionId>() {
        if manager.get_junction(id).is_some() {
            return Ok(id);
        }
    }
    bail!("unknown junction: {spec}")
}

fn parse_traffic_override(spec: &str) -> Result<(i64, TrafficLevel)> {
    let (id, level) = spec
        .split_once('=')
        .with_context(|| format!("expected ROAD_ID=LEVEL, got '{spec}'"))?;
    let id: i64 = id
        .trim()
        .parse()
        .with_context(|| format!("invalid road id '{id}'"))?;
    let level: TrafficLevel = level
        .trim()
        .parse()
        .map_err(|err: String| anyhow::anyhow!(err))?;
    Ok((id, level))
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}
