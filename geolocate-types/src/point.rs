use geo::Point;
use serde::{Deserialize, Serialize};
use std::time::SystemTime;

/// One recorded vehicle location.
///
/// Coordinates are decimal degrees in the same frame as the region polygons.
/// A point is never mutated once it has been indexed.
///
/// # Examples
///
/// ```
/// use geolocate_types::point::TrajectoryPoint;
/// use std::time::SystemTime;
///
/// let fix = TrajectoryPoint::new("V000042", SystemTime::now(), 121.544, 31.221)
///     .with_speed(42.5)
///     .with_direction(270.0);
/// assert_eq!(fix.speed, Some(42.5));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryPoint {
    /// Opaque entity identifier
    pub vehicle_id: String,
    /// Time the fix was recorded
    pub timestamp: SystemTime,
    pub lng: f64,
    pub lat: f64,
    /// Ground speed in km/h, when the source reports one
    #[serde(default)]
    pub speed: Option<f32>,
    /// Heading in degrees clockwise from north, when the source reports one
    #[serde(default)]
    pub direction: Option<f32>,
}

impl TrajectoryPoint {
    pub fn new(vehicle_id: impl Into<String>, timestamp: SystemTime, lng: f64, lat: f64) -> Self {
        Self {
            vehicle_id: vehicle_id.into(),
            timestamp,
            lng,
            lat,
            speed: None,
            direction: None,
        }
    }

    pub fn with_speed(mut self, speed: f32) -> Self {
        self.speed = Some(speed);
        self
    }

    pub fn with_direction(mut self, direction: f32) -> Self {
        self.direction = Some(direction);
        self
    }

    /// Position as a `geo::Point` (x = longitude, y = latitude).
    pub fn point(&self) -> Point {
        Point::new(self.lng, self.lat)
    }
}

/// Inclusive time window. Either bound may be open.
///
/// # Examples
///
/// ```
/// use geolocate_types::point::TimeRange;
/// use std::time::{Duration, UNIX_EPOCH};
///
/// let t0 = UNIX_EPOCH + Duration::from_secs(100);
/// let t1 = UNIX_EPOCH + Duration::from_secs(200);
/// let window = TimeRange::between(t0, t1);
///
/// assert!(window.contains(t0));
/// assert!(window.contains(t1));
/// assert!(!window.contains(t1 + Duration::from_secs(1)));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TimeRange {
    #[serde(default)]
    pub start: Option<SystemTime>,
    #[serde(default)]
    pub end: Option<SystemTime>,
}

impl TimeRange {
    /// A window with no bounds; matches every timestamp.
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn between(start: SystemTime, end: SystemTime) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
        }
    }

    pub fn since(start: SystemTime) -> Self {
        Self {
            start: Some(start),
            end: None,
        }
    }

    pub fn until(end: SystemTime) -> Self {
        Self {
            start: None,
            end: Some(end),
        }
    }

    /// False when both bounds are set and `start` is after `end`.
    pub fn is_well_formed(&self) -> bool {
        match (self.start, self.end) {
            (Some(start), Some(end)) => start <= end,
            _ => true,
        }
    }

    #[inline]
    pub fn contains(&self, ts: SystemTime) -> bool {
        self.start.is_none_or(|start| ts >= start) && self.end.is_none_or(|end| ts <= end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, UNIX_EPOCH};

    fn at(secs: u64) -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(secs)
    }

    #[test]
    fn test_open_bounds() {
        assert!(TimeRange::unbounded().contains(at(0)));
        assert!(TimeRange::since(at(10)).contains(at(10)));
        assert!(!TimeRange::since(at(10)).contains(at(9)));
        assert!(TimeRange::until(at(10)).contains(at(10)));
        assert!(!TimeRange::until(at(10)).contains(at(11)));
    }

    #[test]
    fn test_well_formed() {
        assert!(TimeRange::between(at(1), at(1)).is_well_formed());
        assert!(!TimeRange::between(at(2), at(1)).is_well_formed());
        assert!(TimeRange::since(at(2)).is_well_formed());
    }

    #[test]
    fn test_point_serde_defaults() {
        let json = r#"{"vehicle_id":"V1","timestamp":{"secs_since_epoch":5,"nanos_since_epoch":0},"lng":1.0,"lat":2.0}"#;
        let fix: TrajectoryPoint = serde_json::from_str(json).unwrap();
        assert_eq!(fix.timestamp, at(5));
        assert!(fix.speed.is_none());
        assert!(fix.direction.is_none());
    }
}
