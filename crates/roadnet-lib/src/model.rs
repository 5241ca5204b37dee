use std::fmt;

use serde::{Deserialize, Serialize};

/// Numeric identifier for a junction.
pub type JunctionId = i64;

/// Numeric identifier for a road.
pub type RoadId = i64;

/// Mean Earth radius in kilometres, used for Haversine distances.
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Congestion level reported for a road.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrafficLevel {
    Low,
    #[default]
    Normal,
    Heavy,
    Severe,
}

impl TrafficLevel {
    /// Scalar applied to a road's base travel time. The mapping is fixed and
    /// not configurable per instance.
    pub fn multiplier(self) -> f64 {
        match self {
            TrafficLevel::Low => 0.8,
            TrafficLevel::Normal => 1.0,
            TrafficLevel::Heavy => 1.5,
            TrafficLevel::Severe => 2.5,
        }
    }

    /// Classify a multiplier back into a level, used when rendering route
    /// segments from graph edges.
    pub fn from_multiplier(multiplier: f64) -> Self {
        if multiplier <= 0.8 {
            TrafficLevel::Low
        } else if multiplier <= 1.0 {
            TrafficLevel::Normal
        } else if multiplier <= 1.5 {
            TrafficLevel::Heavy
        } else {
            TrafficLevel::Severe
        }
    }
}

impl fmt::Display for TrafficLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TrafficLevel::Low => "low",
            TrafficLevel::Normal => "normal",
            TrafficLevel::Heavy => "heavy",
            TrafficLevel::Severe => "severe",
        };
        f.write_str(name)
    }
}

impl std::str::FromStr for TrafficLevel {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "low" => Ok(TrafficLevel::Low),
            "normal" => Ok(TrafficLevel::Normal),
            "heavy" => Ok(TrafficLevel::Heavy),
            "severe" => Ok(TrafficLevel::Severe),
            other => Err(format!("unknown traffic level: {other}")),
        }
    }
}

/// Cost function used by shortest-path search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RouteMetric {
    /// Raw distance in kilometres.
    Distance,
    /// Traffic-adjusted travel time in minutes.
    Time,
}

/// A road intersection with geographic coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Junction {
    pub id: JunctionId,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub area: String,
    #[serde(default)]
    pub has_traffic_signal: bool,
    /// Neighbouring junction ids, appended as roads are added. Duplicates are
    /// kept: each entry corresponds to one road touching this junction.
    #[serde(default)]
    pub connected_junctions: Vec<JunctionId>,
}

impl Junction {
    pub fn new(
        id: JunctionId,
        name: impl Into<String>,
        latitude: f64,
        longitude: f64,
        city: impl Into<String>,
        area: impl Into<String>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            latitude,
            longitude,
            city: city.into(),
            area: area.into(),
            has_traffic_signal: true,
            connected_junctions: Vec::new(),
        }
    }

    /// Haversine distance to another junction, in kilometres.
    pub fn distance_to(&self, other: &Junction) -> f64 {
        let lat1 = self.latitude.to_radians();
        let lat2 = other.latitude.to_radians();
        let d_lat = (other.latitude - self.latitude).to_radians();
        let d_lon = (other.longitude - self.longitude).to_radians();

        let a = (d_lat / 2.0).sin().powi(2)
            + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

        EARTH_RADIUS_KM * c
    }
}

/// A road connecting two junctions, producing one or two graph edges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Road {
    pub id: RoadId,
    pub name: String,
    pub source_junction: JunctionId,
    pub dest_junction: JunctionId,
    /// Kilometres; fixed at creation.
    pub distance: f64,
    /// Kilometres per hour; fixed at creation.
    pub speed_limit: f64,
    /// Free-flow traversal time in minutes, derived from distance and speed
    /// limit once at construction and never recomputed.
    pub base_time: f64,
    #[serde(default)]
    pub traffic_level: TrafficLevel,
    #[serde(default = "default_two_way")]
    pub is_two_way: bool,
}

fn default_two_way() -> bool {
    true
}

impl Road {
    pub fn new(
        id: RoadId,
        name: impl Into<String>,
        source: JunctionId,
        dest: JunctionId,
        distance: f64,
        speed_limit: f64,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            source_junction: source,
            dest_junction: dest,
            distance,
            speed_limit,
            base_time: distance / speed_limit * 60.0,
            traffic_level: TrafficLevel::Normal,
            is_two_way: true,
        }
    }

    /// Travel time in minutes under the current traffic level.
    pub fn actual_time(&self) -> f64 {
        self.base_time * self.traffic_level.multiplier()
    }
}

/// One leg of a computed route, carrying the traffic state observed when the
/// route was produced. Used by callers for visualization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrafficSegment {
    pub from: JunctionId,
    pub to: JunctionId,
    pub road_name: String,
    pub distance: f64,
    pub time: f64,
    pub level: TrafficLevel,
}

/// Result of a route query, either computed fresh or served from the cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteResult {
    pub found: bool,
    /// Junctions along the path, source first, destination last. Empty when
    /// no route was found.
    pub junctions: Vec<Junction>,
    pub segments: Vec<TrafficSegment>,
    /// Total kilometres along the path; 0 when not found.
    pub total_distance: f64,
    /// Total traffic-adjusted minutes along the path; 0 when not found.
    pub total_time: f64,
}

impl RouteResult {
    pub fn not_found() -> Self {
        Self {
            found: false,
            junctions: Vec::new(),
            segments: Vec::new(),
            total_distance: 0.0,
            total_time: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multiplier_mapping_is_fixed() {
        assert_eq!(TrafficLevel::Low.multiplier(), 0.8);
        assert_eq!(TrafficLevel::Normal.multiplier(), 1.0);
        assert_eq!(TrafficLevel::Heavy.multiplier(), 1.5);
        assert_eq!(TrafficLevel::Severe.multiplier(), 2.5);
    }

    #[test]
    fn multiplier_thresholds_round_trip() {
        for level in [
            TrafficLevel::Low,
            TrafficLevel::Normal,
            TrafficLevel::Heavy,
            TrafficLevel::Severe,
        ] {
            assert_eq!(TrafficLevel::from_multiplier(level.multiplier()), level);
        }
    }

    #[test]
    fn base_time_derived_once() {
        let road = Road::new(1, "Ring Rd", 1, 2, 5.0, 60.0);
        assert!((road.base_time - 5.0).abs() < 1e-9);

        let mut congested = road.clone();
        congested.traffic_level = TrafficLevel::Severe;
        // Base time stays put; only the actual time scales.
        assert!((congested.base_time - 5.0).abs() < 1e-9);
        assert!((congested.actual_time() - 12.5).abs() < 1e-9);
    }

    #[test]
    fn haversine_is_plausible() {
        let a = Junction::new(1, "A", 51.5007, -0.1246, "London", "Westminster");
        let b = Junction::new(2, "B", 48.8584, 2.2945, "Paris", "7e");
        let d = a.distance_to(&b);
        // London to Paris is roughly 340 km.
        assert!((330.0..350.0).contains(&d), "got {d}");
        assert!(a.distance_to(&a) < 1e-9);
    }
}
