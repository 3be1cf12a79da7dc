//! Spatial indexing and query algorithms.

pub mod algorithms;
pub mod planner;
pub mod region_index;
pub mod trajectory_index;

pub use algorithms::{
    EARTH_RADIUS_METERS, circle_envelopes, dms_to_decimal, haversine_distance, point_in_polygon,
    point_in_ring,
};
pub use planner::{CandidateSource, CircleQuery, CirclePlan, Deadline, QueryStats};
pub use region_index::{Region, RegionId, RegionIndex, RegionStats};
pub use trajectory_index::{IngestReport, RangeMatch, TrajectoryIndex, TrajectoryStats};
