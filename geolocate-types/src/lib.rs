//! # geolocate-types
//!
//! Core data types shared by the geolocate region and trajectory indexes.
//!
//! - **Bounding boxes**: `BoundingBox2D`
//! - **Trajectory types**: `TrajectoryPoint`, `TimeRange`
//! - **Region source records**: `RegionRecord`, `Level`, `Ring`
//!
//! All types are serializable with Serde and built on top of the `geo` crate's
//! geometric primitives. Coordinates are decimal degrees in the GCJ-02 frame.
//!
//! ## Examples
//!
//! ```rust
//! use geolocate_types::point::TrajectoryPoint;
//! use std::time::{Duration, UNIX_EPOCH};
//!
//! let fix = TrajectoryPoint::new("V000001", UNIX_EPOCH + Duration::from_secs(60), 116.407, 39.904);
//! assert_eq!(fix.point().x(), 116.407);
//! ```

pub mod bbox;
pub mod point;
pub mod region;
