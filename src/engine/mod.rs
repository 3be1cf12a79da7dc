//! Thread-safe query engine over a region index and a trajectory index.
//!
//! `Engine` is cheap to clone; clones share the same indexes. Region data is
//! held as an immutable snapshot behind an `Arc`, so a reload builds the new
//! index off to the side and swaps it in while in-flight lookups finish on
//! the old one. Trajectory ingestion takes an exclusive lock; queries share a
//! read lock.
//!
//! # Examples
//!
//! ```rust
//! use geolocate::{CircleQuery, Engine, Level, RegionRecord, TrajectoryPoint};
//! use std::thread;
//! use std::time::UNIX_EPOCH;
//!
//! # fn main() -> geolocate::Result<()> {
//! let square = vec![vec![[100.0, 20.0], [120.0, 20.0], [120.0, 40.0], [100.0, 40.0]]];
//! let engine = Engine::builder()
//!     .regions(vec![RegionRecord::new(45, Level::Province, "Somewhere", square)])
//!     .build()?;
//!
//! let writer = engine.clone();
//! thread::spawn(move || {
//!     writer.ingest(vec![TrajectoryPoint::new("V1", UNIX_EPOCH, 110.0, 30.0)]);
//! })
//! .join()
//! .unwrap();
//!
//! assert_eq!(engine.locate(110.0, 30.0)?.province.unwrap().name, "Somewhere");
//! assert_eq!(engine.count_in_circle(&CircleQuery::new(110.0, 30.0, 10.0))?, 1);
//! # Ok(())
//! # }
//! ```

pub mod results;

pub use results::{CircleHit, EngineStats, Location, NearbyRegion, RegionSummary, TrackPoint};

use crate::builder::EngineBuilder;
use crate::compute::spatial::{
    CircleQuery, Deadline, IngestReport, RegionId, RegionIndex, RegionStats, TrajectoryIndex,
};
use crate::config::{Config, Level, RegionRecord, TimeRange, TrajectoryPoint};
use crate::error::{GeoLocateError, Result};
use parking_lot::RwLock;
use std::borrow::Cow;
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone)]
pub struct Engine {
    regions: Arc<RwLock<Arc<RegionIndex>>>,
    trajectories: Arc<RwLock<TrajectoryIndex>>,
    config: Arc<Config>,
}

impl Engine {
    /// Empty engine with the given configuration.
    pub fn new(config: Config) -> Result<Self> {
        config.validate().map_err(GeoLocateError::Config)?;
        Ok(Self {
            regions: Arc::new(RwLock::new(Arc::new(RegionIndex::empty()))),
            trajectories: Arc::new(RwLock::new(TrajectoryIndex::new())),
            config: Arc::new(config),
        })
    }

    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Replace the region data with a freshly built index.
    ///
    /// With `strict_region_load` set, the first malformed record aborts the
    /// reload and the previous index stays active.
    pub fn load_regions<I>(&self, records: I) -> Result<RegionStats>
    where
        I: IntoIterator<Item = RegionRecord>,
    {
        let index = if self.config.strict_region_load {
            RegionIndex::try_build(records)?
        } else {
            RegionIndex::build(records)
        };
        let stats = index.stats();
        *self.regions.write() = Arc::new(index);
        Ok(stats)
    }

    /// Current region snapshot. Holding it does not block reloads.
    pub fn region_index(&self) -> Arc<RegionIndex> {
        self.regions.read().clone()
    }

    /// Add trajectory points. Invalid points are skipped and counted.
    pub fn ingest<I>(&self, points: I) -> IngestReport
    where
        I: IntoIterator<Item = TrajectoryPoint>,
    {
        self.trajectories.write().ingest(points)
    }

    /// Administrative location of a coordinate.
    ///
    /// A point outside every province yields an empty [`Location`], not an
    /// error.
    pub fn locate(&self, lng: f64, lat: f64) -> Result<Location> {
        let deadline = self.deadline();
        let index = self.region_index();
        let chain = index.locate(lng, lat)?;
        let location = Location::from_chain(&chain);
        self.log_if_slow("locate", &deadline);
        Ok(location)
    }

    /// Matched regions from province downwards.
    pub fn locate_chain(&self, lng: f64, lat: f64) -> Result<Vec<RegionSummary>> {
        let index = self.region_index();
        Ok(index
            .locate(lng, lat)?
            .into_iter()
            .map(RegionSummary::from)
            .collect())
    }

    /// Locate many coordinates against one snapshot. Fails on the first
    /// invalid coordinate.
    pub fn locate_batch(&self, coords: &[(f64, f64)]) -> Result<Vec<Location>> {
        let deadline = self.deadline();
        let index = self.region_index();
        let locations = coords
            .iter()
            .map(|&(lng, lat)| {
                index
                    .locate(lng, lat)
                    .map(|chain| Location::from_chain(&chain))
            })
            .collect::<Result<Vec<_>>>()?;
        self.log_if_slow("locate_batch", &deadline);
        Ok(locations)
    }

    pub fn region(&self, id: RegionId) -> Option<RegionSummary> {
        self.region_index().get(id).map(RegionSummary::from)
    }

    pub fn children(&self, id: RegionId) -> Vec<RegionSummary> {
        let index = self.region_index();
        index.children(id).into_iter().map(RegionSummary::from).collect()
    }

    pub fn find_regions_by_name(&self, fragment: &str) -> Vec<RegionSummary> {
        let index = self.region_index();
        index
            .find_by_name(fragment)
            .into_iter()
            .map(RegionSummary::from)
            .collect()
    }

    /// Regions of `level` whose centres lie closest to the coordinate.
    pub fn nearest_regions(
        &self,
        lng: f64,
        lat: f64,
        level: Level,
        limit: usize,
    ) -> Result<Vec<NearbyRegion>> {
        let index = self.region_index();
        Ok(index
            .nearest(level, lng, lat, limit)?
            .into_iter()
            .map(|(region, distance_m)| NearbyRegion {
                region: RegionSummary::from(region),
                distance_m,
            })
            .collect())
    }

    /// Trajectory points within `radius_m` of the centre, nearest first.
    ///
    /// A query without its own limit falls back to `default_circle_limit`.
    pub fn circle_query(&self, query: &CircleQuery) -> Result<Vec<CircleHit>> {
        let deadline = self.deadline();
        let query = self.with_default_limit(query);

        let trajectories = self.trajectories.read();
        let (matches, stats) = trajectories.circle_query_within(&query, &deadline)?;
        let hits: Vec<CircleHit> = matches.into_iter().map(CircleHit::from).collect();
        drop(trajectories);

        self.log_if_slow("circle_query", &deadline);
        log::trace!("circle_query returned {} of {} candidates", stats.returned, stats.candidates);
        Ok(hits)
    }

    /// Number of trajectory points within the circle; no limit applies.
    pub fn count_in_circle(&self, query: &CircleQuery) -> Result<usize> {
        let deadline = self.deadline();
        let (count, _) = self
            .trajectories
            .read()
            .count_in_circle_within(query, &deadline)?;
        self.log_if_slow("count_in_circle", &deadline);
        Ok(count)
    }

    /// Track of one vehicle in ascending time order.
    ///
    /// `limit` defaults to `default_track_limit`.
    pub fn get_track(
        &self,
        vehicle_id: &str,
        time_range: Option<TimeRange>,
        limit: Option<usize>,
    ) -> Result<Vec<TrackPoint>> {
        let deadline = self.deadline();
        let range = time_range.unwrap_or_default();
        let limit = limit.unwrap_or(self.config.default_track_limit);

        let track = self
            .trajectories
            .read()
            .get_track(vehicle_id, &range, limit)?
            .into_iter()
            .map(TrackPoint::from)
            .collect();

        self.log_if_slow("get_track", &deadline);
        Ok(track)
    }

    pub fn stats(&self) -> EngineStats {
        EngineStats {
            regions: self.region_index().stats(),
            trajectories: self.trajectories.read().stats(),
        }
    }

    fn deadline(&self) -> Deadline {
        Deadline::start(self.config.query_deadline())
    }

    fn with_default_limit<'q>(&self, query: &'q CircleQuery) -> Cow<'q, CircleQuery> {
        match (query.limit, self.config.default_circle_limit) {
            (None, Some(limit)) => Cow::Owned(query.clone().limit(limit)),
            _ => Cow::Borrowed(query),
        }
    }

    fn log_if_slow(&self, operation: &str, deadline: &Deadline) {
        let elapsed = deadline.elapsed();
        let threshold = self.config.slow_query_threshold();
        if threshold > Duration::ZERO && elapsed > threshold {
            log::warn!("Slow {}: took {:?} (threshold {:?})", operation, elapsed, threshold);
        }
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self {
            regions: Arc::new(RwLock::new(Arc::new(RegionIndex::empty()))),
            trajectories: Arc::new(RwLock::new(TrajectoryIndex::new())),
            config: Arc::new(Config::default()),
        }
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("regions", &self.region_index().len())
            .field("points", &self.trajectories.read().len())
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, UNIX_EPOCH};

    fn square(min_x: f64, min_y: f64, size: f64) -> Vec<crate::config::Ring> {
        vec![vec![
            [min_x, min_y],
            [min_x + size, min_y],
            [min_x + size, min_y + size],
            [min_x, min_y + size],
        ]]
    }

    #[test]
    fn test_reload_swaps_snapshot() {
        let engine = Engine::default();
        engine
            .load_regions(vec![RegionRecord::new(1, Level::Province, "Old", square(0.0, 0.0, 1.0))])
            .unwrap();
        let old = engine.region_index();

        engine
            .load_regions(vec![RegionRecord::new(2, Level::Province, "New", square(0.0, 0.0, 1.0))])
            .unwrap();

        // The held snapshot is unaffected by the swap
        assert_eq!(old.get(1).unwrap().name, "Old");
        assert_eq!(engine.locate(0.5, 0.5).unwrap().province.unwrap().name, "New");
    }

    #[test]
    fn test_strict_reload_keeps_previous_index() {
        let engine = Engine::new(Config::default().with_strict_region_load(true)).unwrap();
        engine
            .load_regions(vec![RegionRecord::new(1, Level::Province, "Kept", square(0.0, 0.0, 1.0))])
            .unwrap();

        let result = engine.load_regions(vec![RegionRecord::new(2, Level::Province, "Bad", vec![])]);
        assert!(matches!(result, Err(GeoLocateError::DataError { region_id: 2, .. })));
        assert_eq!(engine.region(1).unwrap().name, "Kept");
    }

    #[test]
    fn test_default_limits_apply() {
        let config = Config::default()
            .with_default_circle_limit(2)
            .with_default_track_limit(3);
        let engine = Engine::new(config).unwrap();
        let points = (0..5u64).map(|i| {
            TrajectoryPoint::new("V1", UNIX_EPOCH + Duration::from_secs(i), 116.0 + i as f64 * 1e-5, 39.0)
        });
        engine.ingest(points);

        let query = CircleQuery::new(116.0, 39.0, 1_000.0);
        assert_eq!(engine.circle_query(&query).unwrap().len(), 2);
        assert_eq!(engine.circle_query(&query.clone().limit(4)).unwrap().len(), 4);
        assert_eq!(engine.count_in_circle(&query).unwrap(), 5);
        assert_eq!(engine.get_track("V1", None, None).unwrap().len(), 3);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = Config {
            default_track_limit: 0,
            ..Config::default()
        };
        assert!(matches!(Engine::new(config), Err(GeoLocateError::Config(_))));
    }
}
