//! Trajectory point index.
//!
//! Points are kept in an append-only arena. A 2D R*-tree over (lng, lat)
//! serves spatial prefiltering and a per-vehicle list of arena slots, sorted
//! by timestamp, serves track retrieval and single-vehicle circle queries.

use crate::compute::spatial::planner::{
    Candidate, CandidateSource, CircleQuery, CirclePlan, Deadline, QueryStats, rank,
};
use crate::compute::validation::{validate_limit, validate_time_range, validate_trajectory_point};
use crate::config::{BoundingBox2D, TimeRange, TrajectoryPoint};
use crate::error::Result;
use rstar::{AABB, Point as RstarPoint, RTree};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use std::time::SystemTime;

/// 2D point for R*-tree indexing, pointing back into the arena.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndexedPoint2D {
    pub x: f64,
    pub y: f64,
    pub slot: usize,
}

impl IndexedPoint2D {
    pub fn new(x: f64, y: f64, slot: usize) -> Self {
        Self { x, y, slot }
    }
}

impl RstarPoint for IndexedPoint2D {
    type Scalar = f64;
    const DIMENSIONS: usize = 2;

    fn generate(mut generator: impl FnMut(usize) -> Self::Scalar) -> Self {
        Self {
            x: generator(0),
            y: generator(1),
            slot: 0,
        }
    }

    fn nth(&self, index: usize) -> Self::Scalar {
        match index {
            0 => self.x,
            1 => self.y,
            _ => unreachable!(),
        }
    }

    fn nth_mut(&mut self, index: usize) -> &mut Self::Scalar {
        match index {
            0 => &mut self.x,
            1 => &mut self.y,
            _ => unreachable!(),
        }
    }
}

fn envelope_of(bbox: &BoundingBox2D) -> AABB<IndexedPoint2D> {
    AABB::from_corners(
        IndexedPoint2D::new(bbox.min_x(), bbox.min_y(), 0),
        IndexedPoint2D::new(bbox.max_x(), bbox.max_y(), 0),
    )
}

/// Outcome of an ingest call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestReport {
    pub accepted: usize,
    pub rejected: usize,
}

/// Aggregate figures over everything ingested so far.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryStats {
    pub points: usize,
    pub vehicles: usize,
    pub earliest: Option<SystemTime>,
    pub latest: Option<SystemTime>,
    /// Bounding box of every indexed position
    pub extent: Option<BoundingBox2D>,
}

/// A point within the search radius.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangeMatch<'a> {
    pub point: &'a TrajectoryPoint,
    pub distance_m: f64,
}

#[derive(Debug, Default)]
pub struct TrajectoryIndex {
    points: Vec<TrajectoryPoint>,
    tree: RTree<IndexedPoint2D>,
    tracks: FxHashMap<String, Vec<usize>>,
    stats: TrajectoryStats,
}

impl TrajectoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn stats(&self) -> TrajectoryStats {
        self.stats.clone()
    }

    /// Index a batch of points. Invalid points are logged and counted, never
    /// indexed.
    pub fn ingest<I>(&mut self, points: I) -> IngestReport
    where
        I: IntoIterator<Item = TrajectoryPoint>,
    {
        let mut report = IngestReport::default();
        let mut fresh = Vec::new();
        let mut touched: FxHashSet<String> = FxHashSet::default();

        for point in points {
            if let Err(e) = validate_trajectory_point(&point) {
                log::warn!("Rejecting trajectory point: {}", e);
                report.rejected += 1;
                continue;
            }

            let slot = self.points.len();
            fresh.push(IndexedPoint2D::new(point.lng, point.lat, slot));
            self.tracks
                .entry(point.vehicle_id.clone())
                .or_default()
                .push(slot);
            touched.insert(point.vehicle_id.clone());
            self.record(&point);
            self.points.push(point);
            report.accepted += 1;
        }

        if fresh.len() > self.tree.size() {
            // Large batches rebuild the tree in one bulk load
            let mut all: Vec<IndexedPoint2D> = self.tree.iter().copied().collect();
            all.extend(fresh);
            self.tree = RTree::bulk_load(all);
        } else {
            for entry in fresh {
                self.tree.insert(entry);
            }
        }

        let points = &self.points;
        for vehicle in &touched {
            if let Some(slots) = self.tracks.get_mut(vehicle) {
                slots.sort_by_key(|&slot| (points[slot].timestamp, slot));
            }
        }

        self.stats.vehicles = self.tracks.len();
        log::debug!(
            "Ingested {} trajectory points ({} rejected), {} indexed",
            report.accepted,
            report.rejected,
            self.points.len()
        );
        report
    }

    fn record(&mut self, point: &TrajectoryPoint) {
        let stats = &mut self.stats;
        stats.points += 1;
        stats.earliest = Some(stats.earliest.map_or(point.timestamp, |t| t.min(point.timestamp)));
        stats.latest = Some(stats.latest.map_or(point.timestamp, |t| t.max(point.timestamp)));
        stats.extent = Some(match stats.extent {
            Some(mut extent) => {
                extent.extend_to(point.lng, point.lat);
                extent
            }
            None => BoundingBox2D::new(point.lng, point.lat, point.lng, point.lat),
        });
    }

    /// Slots of one vehicle inside a time window, in timestamp order.
    fn track_slots(&self, vehicle_id: &str, range: &TimeRange) -> &[usize] {
        let Some(slots) = self.tracks.get(vehicle_id) else {
            return &[];
        };

        let lo = match range.start {
            Some(start) => slots.partition_point(|&s| self.points[s].timestamp < start),
            None => 0,
        };
        let hi = match range.end {
            Some(end) => slots.partition_point(|&s| self.points[s].timestamp <= end),
            None => slots.len(),
        };

        if lo >= hi { &[] } else { &slots[lo..hi] }
    }

    /// Candidate slots passing the bbox, time and vehicle filters.
    fn prefilter(&self, plan: &CirclePlan<'_>) -> Vec<usize> {
        match (plan.source(), plan.vehicle_id()) {
            (CandidateSource::VehicleTrack, Some(vehicle)) => self
                .track_slots(vehicle, plan.time_range())
                .iter()
                .copied()
                .filter(|&slot| plan.admits(&self.points[slot]))
                .collect(),
            _ => plan
                .envelopes()
                .iter()
                .flat_map(|bbox| self.tree.locate_in_envelope_intersecting(&envelope_of(bbox)))
                .map(|entry| entry.slot)
                .filter(|&slot| plan.admits(&self.points[slot]))
                .collect(),
        }
    }

    fn refine<'a>(
        &'a self,
        plan: &'a CirclePlan<'_>,
        slots: &'a [usize],
    ) -> impl Iterator<Item = Candidate> + 'a {
        slots.iter().filter_map(move |&slot| {
            plan.refine(&self.points[slot])
                .map(|distance| Candidate { slot, distance })
        })
    }

    /// Points within the circle ordered by ascending distance.
    pub fn circle_query(&self, query: &CircleQuery) -> Result<Vec<RangeMatch<'_>>> {
        self.circle_query_within(query, &Deadline::unbounded())
            .map(|(matches, _)| matches)
    }

    /// Circle query that fails once `deadline` expires between stages.
    pub fn circle_query_within(
        &self,
        query: &CircleQuery,
        deadline: &Deadline,
    ) -> Result<(Vec<RangeMatch<'_>>, QueryStats)> {
        let plan = query.plan()?;

        let slots = self.prefilter(&plan);
        deadline.check("prefilter")?;

        let mut matched = 0;
        let ranked = rank(self.refine(&plan, &slots).inspect(|_| matched += 1), plan.limit());
        deadline.check("refine")?;

        let stats = QueryStats {
            source: plan.source(),
            candidates: slots.len(),
            matched,
            returned: ranked.len(),
        };
        log::debug!("Circle query {:?}: {:?}", query, stats);

        let matches = ranked
            .into_iter()
            .map(|c| RangeMatch {
                point: &self.points[c.slot],
                distance_m: c.distance,
            })
            .collect();

        Ok((matches, stats))
    }

    /// Number of points within the circle. Any limit on the query is ignored.
    pub fn count_in_circle(&self, query: &CircleQuery) -> Result<usize> {
        self.count_in_circle_within(query, &Deadline::unbounded())
            .map(|(count, _)| count)
    }

    pub fn count_in_circle_within(
        &self,
        query: &CircleQuery,
        deadline: &Deadline,
    ) -> Result<(usize, QueryStats)> {
        let plan = query.plan()?;

        let slots = self.prefilter(&plan);
        deadline.check("prefilter")?;

        let count = self.refine(&plan, &slots).count();
        deadline.check("refine")?;

        let stats = QueryStats {
            source: plan.source(),
            candidates: slots.len(),
            matched: count,
            returned: count,
        };
        log::debug!("Circle count {:?}: {:?}", query, stats);

        Ok((count, stats))
    }

    /// Points of one vehicle in ascending timestamp order, first `limit` only.
    ///
    /// An unknown vehicle yields an empty track.
    pub fn get_track(
        &self,
        vehicle_id: &str,
        range: &TimeRange,
        limit: usize,
    ) -> Result<Vec<&TrajectoryPoint>> {
        validate_time_range(range)?;
        validate_limit(limit)?;

        Ok(self
            .track_slots(vehicle_id, range)
            .iter()
            .take(limit)
            .map(|&slot| &self.points[slot])
            .collect())
    }
}
