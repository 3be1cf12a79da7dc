//! Engine configuration.
//!
//! Re-exports the shared record types from `geolocate-types` for convenience.
use serde::de::Error;
use std::time::Duration;

pub use geolocate_types::bbox::BoundingBox2D;
pub use geolocate_types::point::{TimeRange, TrajectoryPoint};
pub use geolocate_types::region::{Level, RegionRecord, Ring};

/// Engine configuration
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Result cap applied to circle queries that do not pass their own limit.
    /// `None` leaves them unbounded.
    #[serde(default)]
    pub default_circle_limit: Option<usize>,

    #[serde(default = "Config::default_track_limit")]
    pub default_track_limit: usize,

    /// Budget checked between the prefilter and refinement stages
    #[serde(default)]
    pub query_deadline_ms: Option<u64>,

    /// Queries slower than this are logged at warn level
    #[serde(default = "Config::default_slow_query_threshold_ms")]
    pub slow_query_threshold_ms: u64,

    /// Fail the whole region load on the first malformed record instead of
    /// skipping it
    #[serde(default)]
    pub strict_region_load: bool,
}

impl Config {
    const fn default_track_limit() -> usize {
        1000
    }

    const fn default_slow_query_threshold_ms() -> u64 {
        50
    }

    pub fn with_default_circle_limit(mut self, limit: usize) -> Self {
        assert!(limit > 0, "Circle limit must be greater than zero");
        self.default_circle_limit = Some(limit);
        self
    }

    pub fn with_default_track_limit(mut self, limit: usize) -> Self {
        assert!(limit > 0, "Track limit must be greater than zero");
        self.default_track_limit = limit;
        self
    }

    /// Sub-millisecond budgets round up to one millisecond.
    pub fn with_query_deadline(mut self, deadline: Duration) -> Self {
        assert!(!deadline.is_zero(), "Query deadline must be greater than zero");
        self.query_deadline_ms = Some(ceil_millis(deadline));
        self
    }

    pub fn with_slow_query_threshold(mut self, threshold: Duration) -> Self {
        self.slow_query_threshold_ms = ceil_millis(threshold);
        self
    }

    pub fn with_strict_region_load(mut self, strict: bool) -> Self {
        self.strict_region_load = strict;
        self
    }

    pub fn query_deadline(&self) -> Option<Duration> {
        self.query_deadline_ms.map(Duration::from_millis)
    }

    pub fn slow_query_threshold(&self) -> Duration {
        Duration::from_millis(self.slow_query_threshold_ms)
    }

    pub fn validate(&self) -> Result<(), String> {
        if let Some(limit) = self.default_circle_limit
            && limit == 0
        {
            return Err("Circle limit must be greater than zero".to_string());
        }

        if self.default_track_limit == 0 {
            return Err("Track limit must be greater than zero".to_string());
        }

        if self.query_deadline_ms == Some(0) {
            return Err("Query deadline must be greater than zero".to_string());
        }

        Ok(())
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let config: Config = serde_json::from_str(json)?;
        if let Err(e) = config.validate() {
            return Err(Error::custom(e));
        }
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    #[cfg(feature = "toml")]
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        let config: Config = toml::from_str(toml_str)?;
        if let Err(e) = config.validate() {
            return Err(toml::de::Error::custom(e));
        }
        Ok(config)
    }

    #[cfg(feature = "toml")]
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

fn ceil_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_nanos().div_ceil(1_000_000)).unwrap_or(u64::MAX)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_circle_limit: None,
            default_track_limit: Self::default_track_limit(),
            query_deadline_ms: None,
            slow_query_threshold_ms: Self::default_slow_query_threshold_ms(),
            strict_region_load: false,
        }
    }
}
