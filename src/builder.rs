//! Engine builder
//!
//! Collects configuration, region records and an initial batch of trajectory
//! points, then builds both indexes in one go.

use crate::config::{Config, RegionRecord, TrajectoryPoint};
use crate::engine::Engine;
use crate::error::Result;

/// Builder for an [`Engine`] preloaded with data.
#[derive(Debug, Default)]
pub struct EngineBuilder {
    config: Config,
    regions: Vec<RegionRecord>,
    points: Vec<TrajectoryPoint>,
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the engine configuration (limits, deadline, strict loading).
    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    pub fn regions<I>(mut self, records: I) -> Self
    where
        I: IntoIterator<Item = RegionRecord>,
    {
        self.regions.extend(records);
        self
    }

    /// Add region records from a JSON array.
    pub fn regions_json(mut self, json: &str) -> Result<Self> {
        let records: Vec<RegionRecord> = serde_json::from_str(json)?;
        self.regions.extend(records);
        Ok(self)
    }

    pub fn points<I>(mut self, points: I) -> Self
    where
        I: IntoIterator<Item = TrajectoryPoint>,
    {
        self.points.extend(points);
        self
    }

    /// Add trajectory points from a JSON array.
    pub fn points_json(mut self, json: &str) -> Result<Self> {
        let points: Vec<TrajectoryPoint> = serde_json::from_str(json)?;
        self.points.extend(points);
        Ok(self)
    }

    /// Validate the configuration and build both indexes.
    pub fn build(self) -> Result<Engine> {
        let engine = Engine::new(self.config)?;

        if !self.regions.is_empty() {
            engine.load_regions(self.regions)?;
        }

        if !self.points.is_empty() {
            let report = engine.ingest(self.points);
            if report.rejected > 0 {
                log::warn!(
                    "Initial load rejected {} of {} trajectory points",
                    report.rejected,
                    report.accepted + report.rejected
                );
            }
        }

        Ok(engine)
    }
}
