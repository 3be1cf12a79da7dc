//! In-memory geographic query engine: administrative region lookup and
//! circular trajectory search.
//!
//! ```rust
//! use geolocate::{CircleQuery, Engine, Level, RegionRecord, TrajectoryPoint};
//! use std::time::UNIX_EPOCH;
//!
//! let province = RegionRecord::new(
//!     45,
//!     Level::Province,
//!     "Guangxi",
//!     vec![vec![[104.0, 21.0], [112.0, 21.0], [112.0, 26.0], [104.0, 26.0]]],
//! );
//!
//! let engine = Engine::builder()
//!     .regions(vec![province])
//!     .points(vec![TrajectoryPoint::new("V1", UNIX_EPOCH, 110.995, 22.918)])
//!     .build()?;
//!
//! let location = engine.locate(110.995, 22.918)?;
//! assert_eq!(location.full_path.as_deref(), Some("Guangxi"));
//!
//! let hits = engine.circle_query(&CircleQuery::new(110.995, 22.918, 100.0))?;
//! assert_eq!(hits[0].distance_m, 0.0);
//! # Ok::<(), geolocate::GeoLocateError>(())
//! ```

pub mod builder;
pub mod compute;
pub mod config;
pub mod engine;
pub mod error;

pub use builder::EngineBuilder;
pub use engine::{
    CircleHit, Engine, EngineStats, Location, NearbyRegion, RegionSummary, TrackPoint,
};
pub use error::{GeoLocateError, Result};

pub use geo::{Point, Polygon};

pub use compute::spatial::{
    CircleQuery, IngestReport, Region, RegionId, RegionIndex, RegionStats, TrajectoryIndex,
    TrajectoryStats, dms_to_decimal, haversine_distance, point_in_polygon,
};

pub use config::{BoundingBox2D, Config, Level, RegionRecord, Ring, TimeRange, TrajectoryPoint};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common imports
pub mod prelude {

    pub use crate::{Engine, EngineBuilder, GeoLocateError, Result};

    pub use crate::{CircleQuery, Location, TimeRange};

    pub use crate::{Config, Level, RegionRecord, TrajectoryPoint};

    pub use crate::haversine_distance;
}
