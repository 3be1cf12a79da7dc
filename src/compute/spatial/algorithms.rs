//! Geometric primitives: ray casting, haversine distance and circle envelopes.
//!
//! Everything here is pure and allocation-free apart from the envelope split,
//! which lives in a `SmallVec` so the common single-box case stays on the
//! stack.

use crate::config::BoundingBox2D;
use geo::{LineString, Polygon};
use smallvec::{SmallVec, smallvec};
use std::f64::consts::FRAC_PI_2;

/// Mean earth radius in meters used by every distance computation.
///
/// A spherical model overestimates or underestimates ellipsoidal distances by
/// up to ~0.5%, which is well inside tolerance for the sub-kilometer to tens of
/// kilometers radii this engine serves.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Padding added to every envelope edge to absorb rounding in the
/// degree/radian conversions.
const ENVELOPE_EPSILON_DEG: f64 = 1e-9;

/// Great-circle distance in meters between two lng/lat positions.
///
/// # Examples
///
/// ```
/// use geolocate::compute::spatial::haversine_distance;
///
/// // One degree of latitude is roughly 111.2 km.
/// let d = haversine_distance(116.0, 39.0, 116.0, 40.0);
/// assert!((d - 111_195.0).abs() < 10.0);
/// ```
#[inline]
pub fn haversine_distance(lng1: f64, lat1: f64, lng2: f64, lat2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lng = (lng2 - lng1).to_radians();

    // Rounding can push `a` just past 1 for near-antipodal pairs
    let a = ((delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lng / 2.0).sin().powi(2))
    .clamp(0.0, 1.0);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_METERS * c
}

/// Convert degrees, minutes and seconds to decimal degrees.
///
/// The sign of `degrees` applies to the whole angle, so west and south
/// positions are written with negative degrees only.
///
/// # Examples
///
/// ```
/// use geolocate::compute::spatial::dms_to_decimal;
///
/// assert!((dms_to_decimal(110.0, 3.0, 0.0) - 110.05).abs() < 1e-12);
/// assert!((dms_to_decimal(-73.0, 30.0, 0.0) + 73.5).abs() < 1e-12);
/// ```
pub fn dms_to_decimal(degrees: f64, minutes: f64, seconds: f64) -> f64 {
    let magnitude = degrees.abs() + minutes / 60.0 + seconds / 3600.0;
    if degrees.is_sign_negative() {
        -magnitude
    } else {
        magnitude
    }
}

/// Even-odd ray cast of `(x, y)` against one ring.
///
/// A horizontal ray to the east is tested against every edge; an odd number
/// of crossings means inside. Vertices exactly on the ray count on the upper
/// side only, so a given point always gets the same answer.
pub fn point_in_ring(x: f64, y: f64, ring: &LineString) -> bool {
    let coords = &ring.0;
    let n = coords.len();
    if n < 3 {
        return false;
    }

    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let (xi, yi) = (coords[i].x, coords[i].y);
        let (xj, yj) = (coords[j].x, coords[j].y);

        if (yi > y) != (yj > y) && x < (xj - xi) * (y - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Inside the exterior ring and not inside any hole.
///
/// # Examples
///
/// ```
/// use geolocate::compute::spatial::point_in_polygon;
/// use geo::{LineString, Polygon};
///
/// let outer = LineString::from(vec![(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)]);
/// let hole = LineString::from(vec![(4.0, 4.0), (6.0, 4.0), (6.0, 6.0), (4.0, 6.0)]);
/// let poly = Polygon::new(outer, vec![hole]);
///
/// assert!(point_in_polygon(2.0, 2.0, &poly));
/// assert!(!point_in_polygon(5.0, 5.0, &poly));
/// assert!(!point_in_polygon(12.0, 5.0, &poly));
/// ```
pub fn point_in_polygon(x: f64, y: f64, polygon: &Polygon) -> bool {
    point_in_ring(x, y, polygon.exterior())
        && !polygon
            .interiors()
            .iter()
            .any(|hole| point_in_ring(x, y, hole))
}

/// Bounding boxes that together cover every point within `radius_m` of the
/// center.
///
/// The latitude half-width is the angular radius `r / R`. The longitude
/// half-width grows with latitude; the exact spherical bound
/// `asin(sin(d) / cos(lat))` is combined with the linear `d / cos(lat)`
/// estimate so the box never undershoots the circle. Circles reaching a pole
/// cover every longitude, and circles crossing the antimeridian are split in
/// two so each box stays within [-180, 180].
pub fn circle_envelopes(lng: f64, lat: f64, radius_m: f64) -> SmallVec<[BoundingBox2D; 2]> {
    let angular = radius_m / EARTH_RADIUS_METERS;
    let lat_rad = lat.to_radians();
    let min_lat_rad = lat_rad - angular;
    let max_lat_rad = lat_rad + angular;

    if max_lat_rad >= FRAC_PI_2 || min_lat_rad <= -FRAC_PI_2 {
        let min_lat = min_lat_rad.to_degrees().max(-90.0);
        let max_lat = max_lat_rad.to_degrees().min(90.0);
        return smallvec![BoundingBox2D::new(-180.0, min_lat, 180.0, max_lat)];
    }

    let cos_lat = lat_rad.cos();
    let exact = (angular.sin() / cos_lat).asin();
    let linear = angular / cos_lat;
    let delta_lng = exact.max(linear).to_degrees() + ENVELOPE_EPSILON_DEG;

    let min_lat = min_lat_rad.to_degrees() - ENVELOPE_EPSILON_DEG;
    let max_lat = max_lat_rad.to_degrees() + ENVELOPE_EPSILON_DEG;

    if delta_lng >= 180.0 {
        return smallvec![BoundingBox2D::new(-180.0, min_lat, 180.0, max_lat)];
    }

    let min_lng = lng - delta_lng;
    let max_lng = lng + delta_lng;

    if min_lng < -180.0 {
        smallvec![
            BoundingBox2D::new(min_lng + 360.0, min_lat, 180.0, max_lat),
            BoundingBox2D::new(-180.0, min_lat, max_lng, max_lat),
        ]
    } else if max_lng > 180.0 {
        smallvec![
            BoundingBox2D::new(min_lng, min_lat, 180.0, max_lat),
            BoundingBox2D::new(-180.0, min_lat, max_lng - 360.0, max_lat),
        ]
    } else {
        smallvec![BoundingBox2D::new(min_lng, min_lat, max_lng, max_lat)]
    }
}
