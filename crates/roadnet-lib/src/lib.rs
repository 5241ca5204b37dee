//! Roadnet library entry points.
//!
//! This crate indexes a set of geographic junctions and the roads connecting
//! them, and answers shortest-path queries under dynamically changing traffic
//! levels, with results cached for repeated queries. Higher-level consumers
//! (CLI, services) should only depend on [`TrafficManager`] and the model
//! types exported here instead of reaching into the individual structures.
//!

#![deny(warnings)]

pub mod btree;
pub mod cache;
pub mod error;
pub mod graph;
pub mod hash;
pub mod heap;
pub mod manager;
pub mod model;

pub use btree::OrderedIndex;
pub use cache::{LruCache, RouteCache, RouteKey};
pub use error::{Error, Result};
pub use graph::{RoadEdge, RoadGraph, ShortestPath};
pub use hash::{HashIndex, HashIndexMetrics, IndexKey};
pub use heap::PriorityFrontier;
pub use manager::{NetworkSnapshot, NetworkStats, TrafficManager, DEFAULT_CACHE_CAPACITY};
pub use model::{
    Junction, JunctionId, Road, RoadId, RouteMetric, RouteResult, TrafficLevel, TrafficSegment,
};
