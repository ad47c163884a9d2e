//! Geographic points and spherical distance.
//!
//! ## Summary
//! Points are always carried as (longitude, latitude), matching the GeoJSON
//! coordinate order used on the wire and by the storage layer. Distances are
//! great-circle distances on a sphere whose radius equals the one used by the
//! `PostgreSQL` `earthdistance` extension, so in-process and in-database
//! computations agree.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// Sphere radius in meters; identical to `earthdistance`'s `earth()`.
pub const EARTH_RADIUS_METERS: f64 = 6_378_168.0;

/// A validated point in geographic coordinates.
///
/// Serializes as a GeoJSON point: `{"type": "Point", "coordinates": [lon, lat]}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "GeoJsonPoint", into = "GeoJsonPoint")]
pub struct GeoPoint {
    longitude: f64,
    latitude: f64,
}

impl GeoPoint {
    /// ## Summary
    /// Creates a point from longitude and latitude, in that order.
    ///
    /// ## Errors
    /// Returns `ValidationError` if either coordinate is not finite or lies
    /// outside [-180, 180] / [-90, 90].
    pub fn new(longitude: f64, latitude: f64) -> CoreResult<Self> {
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(CoreError::ValidationError(format!(
                "longitude must be a finite number between -180 and 180, got {longitude}"
            )));
        }
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(CoreError::ValidationError(format!(
                "latitude must be a finite number between -90 and 90, got {latitude}"
            )));
        }
        Ok(Self {
            longitude,
            latitude,
        })
    }

    /// ## Summary
    /// Builds a point from a GeoJSON-style `[longitude, latitude]` slice.
    ///
    /// ## Errors
    /// Returns `ValidationError` unless the slice holds exactly two valid coordinates.
    pub fn from_coordinates(coordinates: &[f64]) -> CoreResult<Self> {
        match coordinates {
            [longitude, latitude] => Self::new(*longitude, *latitude),
            _ => Err(CoreError::ValidationError(
                "Invalid location format. Provide [longitude, latitude].".to_string(),
            )),
        }
    }

    #[must_use]
    pub const fn longitude(&self) -> f64 {
        self.longitude
    }

    #[must_use]
    pub const fn latitude(&self) -> f64 {
        self.latitude
    }

    #[must_use]
    pub const fn coordinates(&self) -> [f64; 2] {
        [self.longitude, self.latitude]
    }

    /// ## Summary
    /// Great-circle distance to `other` in meters (haversine formula).
    #[must_use]
    pub fn distance_meters(&self, other: &Self) -> f64 {
        let lat1 = self.latitude.to_radians();
        let lat2 = other.latitude.to_radians();
        let d_lat = lat2 - lat1;
        let d_lon = (other.longitude - self.longitude).to_radians();

        let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_METERS * a.sqrt().min(1.0).asin()
    }

    /// ## Summary
    /// Latitude interval guaranteed to contain every point within `radius_meters`.
    ///
    /// Any great-circle path is at least as long as its meridian component, so
    /// points outside this band can be discarded before computing distances.
    #[must_use]
    pub fn latitude_band(&self, radius_meters: f64) -> (f64, f64) {
        let delta = (radius_meters / EARTH_RADIUS_METERS).to_degrees();
        (
            (self.latitude - delta).max(-90.0),
            (self.latitude + delta).min(90.0),
        )
    }
}

impl std::fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.longitude, self.latitude)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
enum GeoJsonKind {
    Point,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct GeoJsonPoint {
    #[serde(rename = "type")]
    kind: GeoJsonKind,
    coordinates: Vec<f64>,
}

impl TryFrom<GeoJsonPoint> for GeoPoint {
    type Error = CoreError;

    fn try_from(value: GeoJsonPoint) -> Result<Self, Self::Error> {
        Self::from_coordinates(&value.coordinates)
    }
}

impl From<GeoPoint> for GeoJsonPoint {
    fn from(value: GeoPoint) -> Self {
        Self {
            kind: GeoJsonKind::Point,
            coordinates: value.coordinates().to_vec(),
        }
    }
}
