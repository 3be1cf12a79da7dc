//! Administrative region index.
//!
//! Regions live in a flat arena addressed by slot; parents are referenced by
//! id only. Each level (province, city, district) gets its own R*-tree over
//! region bounding boxes, which serves as the prefilter for the exact ray-cast
//! containment test.
//!
//! # Example
//!
//! ```rust
//! use geolocate::compute::spatial::RegionIndex;
//! use geolocate::{Level, RegionRecord};
//!
//! let square = |min: f64, max: f64| vec![vec![[min, min], [max, min], [max, max], [min, max]]];
//! let index = RegionIndex::build(vec![
//!     RegionRecord::new(1, Level::Province, "P", square(0.0, 10.0)),
//!     RegionRecord::new(11, Level::City, "C", square(1.0, 5.0)).with_parent(1),
//! ]);
//!
//! let chain = index.locate(2.0, 2.0).unwrap();
//! assert_eq!(chain.len(), 2);
//! assert_eq!(chain[1].name, "C");
//! ```

use crate::compute::spatial::algorithms::{haversine_distance, point_in_polygon};
use crate::compute::validation::{validate_coordinate, validate_limit, validate_ring};
use crate::config::{BoundingBox2D, Level, RegionRecord, Ring};
use crate::error::{GeoLocateError, Result};
use geo::{LineString, Point, Polygon};
use rstar::{AABB, RTree, RTreeObject};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::cmp::Ordering;

pub type RegionId = u64;

/// One administrative unit, immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    pub id: RegionId,
    pub name: String,
    pub level: Level,
    /// Containing region, resolved through the index (never owned)
    pub parent: Option<RegionId>,
    pub path: Option<String>,
    pub center: Point,
    /// Primary polygon first, then any additional disjoint parts
    pub parts: Vec<Polygon>,
    /// Tight enclosure of every ring of every part
    pub bbox: BoundingBox2D,
}

impl Region {
    /// Convert a source record, rejecting anything that cannot be indexed.
    pub fn from_record(record: RegionRecord) -> Result<Self> {
        let id = record.id;

        if record.rings.is_empty() {
            return Err(GeoLocateError::data(id, "region has no rings"));
        }

        let mut parts = Vec::with_capacity(1 + record.additional_parts.len());
        let mut bbox: Option<BoundingBox2D> = None;

        for (part_idx, rings) in record.parts().enumerate() {
            if rings.is_empty() {
                return Err(GeoLocateError::data(
                    id,
                    format!("part {} has no rings", part_idx),
                ));
            }

            for (ring_idx, ring) in rings.iter().enumerate() {
                validate_ring(ring).map_err(|reason| {
                    GeoLocateError::data(id, format!("part {} ring {}: {}", part_idx, ring_idx, reason))
                })?;
                if let Some(ring_bbox) = BoundingBox2D::from_coords(ring.iter()) {
                    bbox = Some(match bbox {
                        Some(acc) => acc.union(&ring_bbox),
                        None => ring_bbox,
                    });
                }
            }

            parts.push(to_polygon(rings));
        }

        let bbox = match bbox {
            Some(b) if !b.is_degenerate() => b,
            _ => return Err(GeoLocateError::data(id, "degenerate bounding box")),
        };

        let center = match record.center {
            Some([lng, lat]) => {
                validate_coordinate(lng, lat)
                    .map_err(|e| GeoLocateError::data(id, format!("center: {}", e)))?;
                Point::new(lng, lat)
            }
            None => bbox.center(),
        };

        Ok(Self {
            id,
            name: record.name,
            level: record.level,
            parent: record.parent_id,
            path: record.path,
            center,
            parts,
            bbox,
        })
    }

    /// Exact containment: bbox prefilter, then ray casting on every part.
    pub fn contains(&self, lng: f64, lat: f64) -> bool {
        self.bbox.contains_coord(lng, lat)
            && self.parts.iter().any(|part| point_in_polygon(lng, lat, part))
    }

    /// Rings of the primary polygon, outer boundary first.
    pub fn rings(&self) -> impl Iterator<Item = &LineString> {
        self.parts
            .first()
            .into_iter()
            .flat_map(|p| std::iter::once(p.exterior()).chain(p.interiors().iter()))
    }
}

fn to_polygon(rings: &[Ring]) -> Polygon {
    let mut iter = rings.iter().map(|ring| LineString::from(ring.clone()));
    let exterior = iter.next().unwrap_or_else(|| LineString::new(Vec::new()));
    Polygon::new(exterior, iter.collect())
}

/// Bounding box entry pointing back into the arena.
#[derive(Debug, Clone, PartialEq)]
struct RegionEnvelope {
    slot: usize,
    bbox: BoundingBox2D,
}

impl RTreeObject for RegionEnvelope {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(
            [self.bbox.min_x(), self.bbox.min_y()],
            [self.bbox.max_x(), self.bbox.max_y()],
        )
    }
}

/// Counts reported after a load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionStats {
    pub provinces: usize,
    pub cities: usize,
    pub districts: usize,
    /// Records rejected as malformed or duplicate
    pub skipped: usize,
}

impl RegionStats {
    pub fn total(&self) -> usize {
        self.provinces + self.cities + self.districts
    }

    fn record(&mut self, level: Level) {
        match level {
            Level::Province => self.provinces += 1,
            Level::City => self.cities += 1,
            Level::District => self.districts += 1,
        }
    }
}

/// Read-only index resolving coordinates to administrative regions.
#[derive(Debug)]
pub struct RegionIndex {
    regions: Vec<Region>,
    by_id: FxHashMap<RegionId, usize>,
    children: FxHashMap<RegionId, Vec<usize>>,
    levels: [RTree<RegionEnvelope>; 3],
    stats: RegionStats,
}

impl RegionIndex {
    /// Build an index, logging and skipping malformed records.
    pub fn build<I>(records: I) -> Self
    where
        I: IntoIterator<Item = RegionRecord>,
    {
        // The lenient sink never returns an error
        Self::assemble(records, |err| {
            log::warn!("Skipping region: {}", err);
            Ok(())
        })
        .unwrap_or_default()
    }

    /// Build an index, failing on the first malformed record.
    pub fn try_build<I>(records: I) -> Result<Self>
    where
        I: IntoIterator<Item = RegionRecord>,
    {
        Self::assemble(records, Err)
    }

    pub fn empty() -> Self {
        Self {
            regions: Vec::new(),
            by_id: FxHashMap::default(),
            children: FxHashMap::default(),
            levels: Default::default(),
            stats: RegionStats::default(),
        }
    }

    fn assemble<I, F>(records: I, mut on_error: F) -> Result<Self>
    where
        I: IntoIterator<Item = RegionRecord>,
        F: FnMut(GeoLocateError) -> Result<()>,
    {
        let mut regions: Vec<Region> = Vec::new();
        let mut by_id = FxHashMap::default();
        let mut stats = RegionStats::default();

        for record in records {
            let region = match Region::from_record(record) {
                Ok(region) => region,
                Err(err) => {
                    stats.skipped += 1;
                    on_error(err)?;
                    continue;
                }
            };

            if by_id.contains_key(&region.id) {
                stats.skipped += 1;
                on_error(GeoLocateError::data(region.id, "duplicate region id"))?;
                continue;
            }

            stats.record(region.level);
            by_id.insert(region.id, regions.len());
            regions.push(region);
        }

        let mut children: FxHashMap<RegionId, Vec<usize>> = FxHashMap::default();
        let mut buckets: [Vec<RegionEnvelope>; 3] = Default::default();

        for (slot, region) in regions.iter().enumerate() {
            buckets[region.level.depth()].push(RegionEnvelope {
                slot,
                bbox: region.bbox,
            });
            if let Some(parent) = region.parent {
                if !by_id.contains_key(&parent) {
                    log::debug!("Region {} references unknown parent {}", region.id, parent);
                }
                children.entry(parent).or_default().push(slot);
            }
        }

        for slots in children.values_mut() {
            slots.sort_by_key(|&slot| regions[slot].id);
        }

        log::info!(
            "Region index built: {} provinces, {} cities, {} districts ({} skipped)",
            stats.provinces,
            stats.cities,
            stats.districts,
            stats.skipped
        );

        Ok(Self {
            regions,
            by_id,
            children,
            levels: buckets.map(RTree::bulk_load),
            stats,
        })
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn stats(&self) -> RegionStats {
        self.stats
    }

    pub fn iter(&self) -> impl Iterator<Item = &Region> {
        self.regions.iter()
    }

    pub fn get(&self, id: RegionId) -> Option<&Region> {
        self.by_id.get(&id).map(|&slot| &self.regions[slot])
    }

    pub fn parent_of(&self, region: &Region) -> Option<&Region> {
        region.parent.and_then(|id| self.get(id))
    }

    /// Parent chain of `id`, shallowest first and ending with the region
    /// itself. Stops at a missing parent; a cyclic chain is cut after three
    /// hops.
    pub fn lineage(&self, id: RegionId) -> Vec<&Region> {
        let mut chain = Vec::new();
        let mut current = self.get(id);
        while let Some(region) = current {
            if chain.len() == Level::ALL.len() {
                log::warn!("Parent chain of region {} is longer than the hierarchy", id);
                break;
            }
            chain.push(region);
            current = self.parent_of(region);
        }
        chain.reverse();
        chain
    }

    /// Direct children of `id`, ordered by id.
    pub fn children(&self, id: RegionId) -> Vec<&Region> {
        self.children
            .get(&id)
            .map(|slots| slots.iter().map(|&slot| &self.regions[slot]).collect())
            .unwrap_or_default()
    }

    /// Resolve a coordinate to its containing regions, shallowest first.
    ///
    /// Each level is searched in turn; the chain stops at the first level
    /// without a match. An empty chain means the point is outside every
    /// known province.
    pub fn locate(&self, lng: f64, lat: f64) -> Result<Vec<&Region>> {
        validate_coordinate(lng, lat)?;

        let mut chain = Vec::with_capacity(Level::ALL.len());
        for level in Level::ALL {
            match self.locate_at_level(level, lng, lat) {
                Some(region) => chain.push(region),
                None => break,
            }
        }
        Ok(chain)
    }

    /// Best match at a single level.
    ///
    /// Candidates whose bbox holds the point are tried by increasing bbox
    /// area, then increasing id; the first one that passes the polygon test
    /// wins. Overlapping regions at the same level therefore resolve to the
    /// smallest, lowest-id one.
    pub fn locate_at_level(&self, level: Level, lng: f64, lat: f64) -> Option<&Region> {
        let probe = AABB::from_point([lng, lat]);
        let mut candidates: SmallVec<[&Region; 8]> = self.levels[level.depth()]
            .locate_in_envelope_intersecting(&probe)
            .map(|entry| &self.regions[entry.slot])
            .collect();

        candidates.sort_by(|a, b| compare_specificity(a, b));

        log::trace!(
            "{} candidates at {} level for ({}, {})",
            candidates.len(),
            level,
            lng,
            lat
        );

        candidates.into_iter().find(|region| region.contains(lng, lat))
    }

    /// Case-sensitive substring search over names and paths, ordered by level
    /// then name.
    pub fn find_by_name(&self, fragment: &str) -> Vec<&Region> {
        if fragment.is_empty() {
            return Vec::new();
        }
        let mut found: Vec<&Region> = self
            .regions
            .iter()
            .filter(|r| {
                r.name.contains(fragment) || r.path.as_deref().is_some_and(|p| p.contains(fragment))
            })
            .collect();
        found.sort_by(|a, b| a.level.cmp(&b.level).then_with(|| a.name.cmp(&b.name)));
        found
    }

    /// Regions of one level ordered by great-circle distance from their
    /// centre to the query point.
    pub fn nearest(&self, level: Level, lng: f64, lat: f64, limit: usize) -> Result<Vec<(&Region, f64)>> {
        validate_coordinate(lng, lat)?;
        validate_limit(limit)?;

        let mut ranked: Vec<(&Region, f64)> = self.levels[level.depth()]
            .iter()
            .map(|entry| {
                let region = &self.regions[entry.slot];
                let d = haversine_distance(lng, lat, region.center.x(), region.center.y());
                (region, d)
            })
            .collect();

        ranked.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.id.cmp(&b.0.id)));
        ranked.truncate(limit);
        Ok(ranked)
    }
}

impl Default for RegionIndex {
    fn default() -> Self {
        Self::empty()
    }
}

fn compare_specificity(a: &Region, b: &Region) -> Ordering {
    a.bbox
        .area()
        .total_cmp(&b.bbox.area())
        .then_with(|| a.id.cmp(&b.id))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(min_x: f64, min_y: f64, size: f64) -> Vec<Ring> {
        vec![vec![
            [min_x, min_y],
            [min_x + size, min_y],
            [min_x + size, min_y + size],
            [min_x, min_y + size],
        ]]
    }

    fn hierarchy() -> Vec<RegionRecord> {
        vec![
            RegionRecord::new(1, Level::Province, "Province", square(0.0, 0.0, 10.0)),
            RegionRecord::new(11, Level::City, "City", square(0.0, 0.0, 5.0)).with_parent(1),
            RegionRecord::new(111, Level::District, "District", square(1.0, 1.0, 2.0))
                .with_parent(11)
                .with_path("Province City District"),
        ]
    }

    #[test]
    fn test_locate_full_chain() {
        let index = RegionIndex::build(hierarchy());
        let chain = index.locate(2.0, 2.0).unwrap();
        let names: Vec<_> = chain.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Province", "City", "District"]);
        assert!(chain.last().unwrap().contains(2.0, 2.0));
    }

    #[test]
    fn test_locate_partial_chain() {
        let index = RegionIndex::build(hierarchy());

        let chain = index.locate(4.0, 4.0).unwrap();
        assert_eq!(chain.len(), 2);

        let chain = index.locate(8.0, 8.0).unwrap();
        assert_eq!(chain.len(), 1);

        let chain = index.locate(50.0, 50.0).unwrap();
        assert!(chain.is_empty());
    }

    #[test]
    fn test_locate_rejects_out_of_range() {
        let index = RegionIndex::build(hierarchy());
        assert!(matches!(
            index.locate(190.0, 0.0),
            Err(GeoLocateError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_hole_excludes_point() {
        let mut rings = square(0.0, 0.0, 10.0);
        rings.push(vec![[4.0, 4.0], [6.0, 4.0], [6.0, 6.0], [4.0, 6.0]]);
        let index = RegionIndex::build(vec![RegionRecord::new(1, Level::Province, "Ring", rings)]);

        assert_eq!(index.locate(2.0, 2.0).unwrap().len(), 1);
        assert!(index.locate(5.0, 5.0).unwrap().is_empty());
    }

    #[test]
    fn test_additional_parts() {
        let record = RegionRecord::new(1, Level::Province, "Islands", square(0.0, 0.0, 1.0))
            .with_part(square(5.0, 5.0, 1.0));
        let index = RegionIndex::build(vec![record]);

        assert_eq!(index.locate(5.5, 5.5).unwrap().len(), 1);
        assert!(index.locate(3.0, 3.0).unwrap().is_empty());
        let region = index.get(1).unwrap();
        assert_eq!(region.bbox.max_x(), 6.0);
        assert_eq!(region.rings().count(), 1);
    }

    #[test]
    fn test_overlap_tie_break_smallest_area_then_lowest_id() {
        let records = vec![
            RegionRecord::new(1, Level::Province, "Big", square(0.0, 0.0, 10.0)),
            RegionRecord::new(2, Level::Province, "Small", square(1.0, 1.0, 3.0)),
            RegionRecord::new(4, Level::Province, "TwinB", square(20.0, 20.0, 2.0)),
            RegionRecord::new(3, Level::Province, "TwinA", square(20.0, 20.0, 2.0)),
        ];
        let index = RegionIndex::build(records);

        // Both Big and Small contain the point; Small has the smaller bbox
        let chain = index.locate(2.0, 2.0).unwrap();
        assert_eq!(chain[0].id, 2);

        // Identical boxes: lowest id wins, regardless of input order
        for _ in 0..5 {
            let chain = index.locate(21.0, 21.0).unwrap();
            assert_eq!(chain[0].id, 3);
        }
    }

    #[test]
    fn test_malformed_regions_are_skipped() {
        let records = vec![
            RegionRecord::new(1, Level::Province, "Good", square(0.0, 0.0, 1.0)),
            RegionRecord::new(2, Level::Province, "NoRings", vec![]),
            RegionRecord::new(3, Level::Province, "Flat", vec![vec![[0.0, 0.0], [1.0, 0.0], [2.0, 0.0]]]),
            RegionRecord::new(4, Level::Province, "TwoPoints", vec![vec![[0.0, 0.0], [1.0, 1.0]]]),
            RegionRecord::new(1, Level::Province, "Duplicate", square(5.0, 5.0, 1.0)),
        ];
        let index = RegionIndex::build(records);
        assert_eq!(index.len(), 1);
        assert_eq!(index.stats().skipped, 4);
        assert_eq!(index.get(1).unwrap().name, "Good");
    }

    #[test]
    fn test_try_build_fails_on_malformed() {
        let err = RegionIndex::try_build(vec![RegionRecord::new(
            9,
            Level::City,
            "Flat",
            vec![vec![[0.0, 0.0], [1.0, 0.0], [2.0, 0.0]]],
        )])
        .unwrap_err();
        assert!(matches!(err, GeoLocateError::DataError { region_id: 9, .. }));
    }

    #[test]
    fn test_lineage_and_children() {
        let index = RegionIndex::build(hierarchy());
        let lineage: Vec<_> = index.lineage(111).iter().map(|r| r.id).collect();
        assert_eq!(lineage, vec![1, 11, 111]);

        let kids: Vec<_> = index.children(1).iter().map(|r| r.id).collect();
        assert_eq!(kids, vec![11]);
        assert!(index.children(111).is_empty());
    }

    #[test]
    fn test_find_by_name_and_nearest() {
        let index = RegionIndex::build(hierarchy());
        let found: Vec<_> = index.find_by_name("City").iter().map(|r| r.id).collect();
        // "City" matches the city's name and the district's path
        assert_eq!(found, vec![11, 111]);
        assert!(index.find_by_name("").is_empty());

        let nearest = index.nearest(Level::District, 2.0, 2.0, 5).unwrap();
        assert_eq!(nearest.len(), 1);
        assert_eq!(nearest[0].0.id, 111);
        assert!(nearest[0].1 < 1.0);

        assert!(matches!(
            index.nearest(Level::District, 2.0, 2.0, 0),
            Err(GeoLocateError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_stats_per_level() {
        let stats = RegionIndex::build(hierarchy()).stats();
        assert_eq!((stats.provinces, stats.cities, stats.districts), (1, 1, 1));
        assert_eq!(stats.total(), 3);
    }
}
