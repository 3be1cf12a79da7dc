//! Validation for coordinates, radii, time windows and polygon rings.

use crate::config::{Ring, TimeRange, TrajectoryPoint};
use crate::error::{GeoLocateError, Result};

/// Validates a longitude/latitude pair.
///
/// Longitude: [-180.0, 180.0], Latitude: [-90.0, 90.0]
///
/// # Examples
///
/// ```
/// use geolocate::compute::validation::validate_coordinate;
///
/// assert!(validate_coordinate(116.407, 39.904).is_ok());
/// assert!(validate_coordinate(200.0, 39.904).is_err());
/// assert!(validate_coordinate(116.407, f64::NAN).is_err());
/// ```
pub fn validate_coordinate(lng: f64, lat: f64) -> Result<()> {
    if !lng.is_finite() {
        return Err(GeoLocateError::InvalidInput(format!(
            "Longitude must be finite, got: {}",
            lng
        )));
    }

    if !lat.is_finite() {
        return Err(GeoLocateError::InvalidInput(format!(
            "Latitude must be finite, got: {}",
            lat
        )));
    }

    if !(-180.0..=180.0).contains(&lng) {
        return Err(GeoLocateError::InvalidInput(format!(
            "Longitude out of range [-180.0, 180.0]: {}",
            lng
        )));
    }

    if !(-90.0..=90.0).contains(&lat) {
        return Err(GeoLocateError::InvalidInput(format!(
            "Latitude out of range [-90.0, 90.0]: {}",
            lat
        )));
    }

    Ok(())
}

/// Validates a search radius in meters: finite and strictly positive.
pub fn validate_radius(radius_m: f64) -> Result<()> {
    if !radius_m.is_finite() || radius_m <= 0.0 {
        return Err(GeoLocateError::InvalidInput(format!(
            "Radius must be a positive finite number of meters, got: {}",
            radius_m
        )));
    }
    Ok(())
}

pub fn validate_time_range(range: &TimeRange) -> Result<()> {
    if !range.is_well_formed() {
        return Err(GeoLocateError::InvalidInput(format!(
            "Time range start {:?} is after end {:?}",
            range.start, range.end
        )));
    }
    Ok(())
}

pub fn validate_limit(limit: usize) -> Result<()> {
    if limit == 0 {
        return Err(GeoLocateError::InvalidInput(
            "Limit must be greater than zero".to_string(),
        ));
    }
    Ok(())
}

/// Validates a trajectory record before it is indexed.
pub fn validate_trajectory_point(point: &TrajectoryPoint) -> Result<()> {
    if point.vehicle_id.is_empty() {
        return Err(GeoLocateError::InvalidInput(
            "Vehicle id must not be empty".to_string(),
        ));
    }
    validate_coordinate(point.lng, point.lat).map_err(|e| {
        GeoLocateError::InvalidInput(format!("Vehicle {}: {}", point.vehicle_id, e))
    })
}

/// Validates one region ring: at least three distinct vertices, all in range.
///
/// Returns the reason as a plain string; callers attach the region id.
pub fn validate_ring(ring: &Ring) -> std::result::Result<(), String> {
    for (idx, coord) in ring.iter().enumerate() {
        validate_coordinate(coord[0], coord[1]).map_err(|e| format!("vertex {}: {}", idx, e))?;
    }

    let closed = ring.len() > 1 && ring.first() == ring.last();
    let distinct = if closed { ring.len() - 1 } else { ring.len() };
    if distinct < 3 {
        return Err(format!(
            "ring needs at least 3 distinct vertices, got {}",
            distinct
        ));
    }

    Ok(())
}
