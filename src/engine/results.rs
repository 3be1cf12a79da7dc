//! Owned query results handed back by the engine.

use crate::compute::spatial::{RangeMatch, Region, RegionId, RegionStats, TrajectoryStats};
use crate::config::{Level, TrajectoryPoint};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::SystemTime;

/// Region fields without geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionSummary {
    pub id: RegionId,
    pub name: String,
    pub level: Level,
    pub parent_id: Option<RegionId>,
    pub path: Option<String>,
    /// (lng, lat)
    pub center: [f64; 2],
}

impl From<&Region> for RegionSummary {
    fn from(region: &Region) -> Self {
        Self {
            id: region.id,
            name: region.name.clone(),
            level: region.level,
            parent_id: region.parent,
            path: region.path.clone(),
            center: [region.center.x(), region.center.y()],
        }
    }
}

/// Administrative location of a coordinate.
///
/// Each level is present only when a region at that level contains the
/// point; deeper levels are never filled when a shallower one is missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub province: Option<RegionSummary>,
    pub city: Option<RegionSummary>,
    pub district: Option<RegionSummary>,
    /// Path of the deepest region, or the chain's names joined by spaces
    pub full_path: Option<String>,
}

impl Location {
    pub(crate) fn from_chain(chain: &[&Region]) -> Self {
        let mut location = Location::default();
        for region in chain {
            let summary = Some(RegionSummary::from(*region));
            match region.level {
                Level::Province => location.province = summary,
                Level::City => location.city = summary,
                Level::District => location.district = summary,
            }
        }

        location.full_path = chain.last().map(|deepest| match &deepest.path {
            Some(path) => path.clone(),
            None => chain
                .iter()
                .map(|r| r.name.as_str())
                .collect::<Vec<_>>()
                .join(" "),
        });
        location
    }

    pub fn is_found(&self) -> bool {
        self.province.is_some()
    }

    /// Deepest matched region.
    pub fn deepest(&self) -> Option<&RegionSummary> {
        self.district
            .as_ref()
            .or(self.city.as_ref())
            .or(self.province.as_ref())
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.full_path {
            Some(path) => f.write_str(path),
            None => f.write_str("not found"),
        }
    }
}

/// A trajectory point inside a query circle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircleHit {
    pub vehicle_id: String,
    pub timestamp: SystemTime,
    pub lng: f64,
    pub lat: f64,
    pub speed: Option<f32>,
    pub direction: Option<f32>,
    pub distance_m: f64,
}

impl From<RangeMatch<'_>> for CircleHit {
    fn from(m: RangeMatch<'_>) -> Self {
        let p = m.point;
        Self {
            vehicle_id: p.vehicle_id.clone(),
            timestamp: p.timestamp,
            lng: p.lng,
            lat: p.lat,
            speed: p.speed,
            direction: p.direction,
            distance_m: m.distance_m,
        }
    }
}

/// One step of a vehicle track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackPoint {
    pub timestamp: SystemTime,
    pub lng: f64,
    pub lat: f64,
    pub speed: Option<f32>,
    pub direction: Option<f32>,
}

impl From<&TrajectoryPoint> for TrackPoint {
    fn from(p: &TrajectoryPoint) -> Self {
        Self {
            timestamp: p.timestamp,
            lng: p.lng,
            lat: p.lat,
            speed: p.speed,
            direction: p.direction,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NearbyRegion {
    pub region: RegionSummary,
    pub distance_m: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineStats {
    pub regions: RegionStats,
    pub trajectories: TrajectoryStats,
}
