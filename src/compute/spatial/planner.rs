//! Circle query planning and refinement.
//!
//! A [`CircleQuery`] is validated into a [`CirclePlan`] holding the bbox
//! envelopes used to prefilter candidates. Refinement computes the exact
//! haversine distance, and [`rank`] orders the survivors by distance with a
//! bounded heap when a limit is set.

use crate::compute::spatial::algorithms::{circle_envelopes, haversine_distance};
use crate::compute::validation::{
    validate_coordinate, validate_limit, validate_radius, validate_time_range,
};
use crate::config::{BoundingBox2D, TimeRange, TrajectoryPoint};
use crate::error::{GeoLocateError, Result};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::time::{Duration, Instant};

/// Parameters of a circular range search.
///
/// # Example
///
/// ```rust
/// use geolocate::compute::spatial::CircleQuery;
/// use geolocate::TimeRange;
/// use std::time::{Duration, UNIX_EPOCH};
///
/// let query = CircleQuery::new(116.407, 39.904, 500.0)
///     .time_range(TimeRange::since(UNIX_EPOCH + Duration::from_secs(1_700_000_000)))
///     .vehicle("V1")
///     .limit(20);
///
/// assert_eq!(query.limit, Some(20));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircleQuery {
    pub lng: f64,
    pub lat: f64,
    pub radius_m: f64,
    #[serde(default)]
    pub time_range: Option<TimeRange>,
    #[serde(default)]
    pub vehicle_id: Option<String>,
    #[serde(default)]
    pub limit: Option<usize>,
}

impl CircleQuery {
    pub fn new(lng: f64, lat: f64, radius_m: f64) -> Self {
        Self {
            lng,
            lat,
            radius_m,
            time_range: None,
            vehicle_id: None,
            limit: None,
        }
    }

    pub fn time_range(mut self, range: TimeRange) -> Self {
        self.time_range = Some(range);
        self
    }

    pub fn vehicle(mut self, vehicle_id: impl Into<String>) -> Self {
        self.vehicle_id = Some(vehicle_id.into());
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Validate the parameters and compute the prefilter envelopes.
    pub fn plan(&self) -> Result<CirclePlan<'_>> {
        validate_coordinate(self.lng, self.lat)?;
        validate_radius(self.radius_m)?;
        let time_range = self.time_range.unwrap_or_default();
        validate_time_range(&time_range)?;
        if let Some(limit) = self.limit {
            validate_limit(limit)?;
        }

        let source = if self.vehicle_id.is_some() {
            CandidateSource::VehicleTrack
        } else {
            CandidateSource::Spatial
        };

        Ok(CirclePlan {
            query: self,
            envelopes: circle_envelopes(self.lng, self.lat, self.radius_m),
            time_range,
            source,
        })
    }
}

/// Where prefilter candidates come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CandidateSource {
    /// R*-tree envelope lookup
    Spatial,
    /// Time-sorted track of a single vehicle
    VehicleTrack,
}

/// A validated circle query ready to run against an index.
#[derive(Debug, Clone)]
pub struct CirclePlan<'q> {
    query: &'q CircleQuery,
    envelopes: SmallVec<[BoundingBox2D; 2]>,
    time_range: TimeRange,
    source: CandidateSource,
}

impl<'q> CirclePlan<'q> {
    pub fn envelopes(&self) -> &[BoundingBox2D] {
        &self.envelopes
    }

    pub fn time_range(&self) -> &TimeRange {
        &self.time_range
    }

    pub fn vehicle_id(&self) -> Option<&'q str> {
        self.query.vehicle_id.as_deref()
    }

    pub fn limit(&self) -> Option<usize> {
        self.query.limit
    }

    pub fn source(&self) -> CandidateSource {
        self.source
    }

    /// Cheap checks applied to every prefilter candidate.
    #[inline]
    pub fn admits(&self, point: &TrajectoryPoint) -> bool {
        self.envelopes
            .iter()
            .any(|b| b.contains_coord(point.lng, point.lat))
            && self.time_range.contains(point.timestamp)
            && self
                .vehicle_id()
                .is_none_or(|vehicle| vehicle == point.vehicle_id)
    }

    /// Exact great-circle distance if the point lies within the radius.
    #[inline]
    pub fn refine(&self, point: &TrajectoryPoint) -> Option<f64> {
        let distance = haversine_distance(self.query.lng, self.query.lat, point.lng, point.lat);
        (distance.is_finite() && distance <= self.query.radius_m).then_some(distance)
    }
}

/// Wall-clock budget checked between pipeline stages.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    started: Instant,
    budget: Option<Duration>,
}

impl Deadline {
    pub fn start(budget: Option<Duration>) -> Self {
        Self {
            started: Instant::now(),
            budget,
        }
    }

    pub fn unbounded() -> Self {
        Self::start(None)
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn check(&self, stage: &'static str) -> Result<()> {
        let elapsed = self.elapsed();
        match self.budget {
            Some(budget) if elapsed > budget => {
                log::warn!("Query exceeded its {:?} budget during {}", budget, stage);
                Err(GeoLocateError::DeadlineExceeded { stage, elapsed })
            }
            _ => Ok(()),
        }
    }
}

/// Per-query counters, logged at debug level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryStats {
    pub source: CandidateSource,
    /// Points that passed the bbox, time and vehicle filters
    pub candidates: usize,
    /// Points within the radius
    pub matched: usize,
    pub returned: usize,
}

/// Refined candidate: arena slot plus exact distance.
#[derive(Debug, Clone, Copy)]
pub struct Candidate {
    pub slot: usize,
    pub distance: f64,
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}
impl Eq for Candidate {}
impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        // Max-heap on distance so the worst candidate sits on top; slot order
        // breaks ties between equidistant points
        self.distance
            .total_cmp(&other.distance)
            .then_with(|| self.slot.cmp(&other.slot))
    }
}

/// Order candidates by ascending distance, keeping at most `limit`.
pub fn rank<I>(candidates: I, limit: Option<usize>) -> Vec<Candidate>
where
    I: IntoIterator<Item = Candidate>,
{
    let Some(limit) = limit else {
        let mut all: Vec<Candidate> = candidates.into_iter().collect();
        all.sort_unstable();
        return all;
    };

    let mut heap = BinaryHeap::with_capacity(limit.min(1024));
    for candidate in candidates {
        if heap.len() < limit {
            heap.push(candidate);
        } else if let Some(worst) = heap.peek()
            && candidate < *worst
        {
            heap.pop();
            heap.push(candidate);
        }
    }

    heap.into_sorted_vec()
}
