//! Geographic value types
//!
//! Coordinates and circle radii are plain values with their invariants
//! enforced at construction. Nothing here performs I/O.

use serde::{Deserialize, Serialize};

/// Smallest radius the selection circle may shrink to, in meters
pub const MIN_RADIUS_METERS: f64 = 1000.0;

/// Radius used before the user adjusts anything
pub const DEFAULT_RADIUS_METERS: f64 = 5000.0;

/// Latitude limit of the Web-Mercator projection
pub const MAX_MERCATOR_LATITUDE: f64 = 85.051_128_779_806_59;

/// Errors raised when building geographic values
#[derive(Debug, Clone, PartialEq)]
pub enum CoordinateError {
    /// Latitude outside [-90, 90] or not finite
    LatitudeOutOfRange(f64),
    /// Longitude outside [-180, 180] or not finite
    LongitudeOutOfRange(f64),
}

impl std::fmt::Display for CoordinateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CoordinateError::LatitudeOutOfRange(lat) => {
                write!(f, "latitude {} is outside [-90, 90]", lat)
            }
            CoordinateError::LongitudeOutOfRange(lon) => {
                write!(f, "longitude {} is outside [-180, 180]", lon)
            }
        }
    }
}

impl std::error::Error for CoordinateError {}

/// A point on the globe in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    /// Creates a coordinate, rejecting values outside the valid ranges
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, CoordinateError> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(CoordinateError::LatitudeOutOfRange(latitude));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(CoordinateError::LongitudeOutOfRange(longitude));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Builds a coordinate from an unconstrained map position.
    ///
    /// Longitude wraps around the antimeridian and latitude is clamped to
    /// the poles, so pointer positions beyond the world edge still produce
    /// a valid value.
    pub fn normalized(latitude: f64, longitude: f64) -> Self {
        let latitude = if latitude.is_finite() {
            latitude.clamp(-90.0, 90.0)
        } else {
            0.0
        };
        let longitude = if longitude.is_finite() {
            wrap_longitude(longitude)
        } else {
            0.0
        };
        Self {
            latitude,
            longitude,
        }
    }
}

impl Default for Coordinate {
    /// Fallback center used when the device position is unknown
    fn default() -> Self {
        Self {
            latitude: 20.0,
            longitude: 78.0,
        }
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.5}, {:.5}", self.latitude, self.longitude)
    }
}

fn wrap_longitude(longitude: f64) -> f64 {
    if (-180.0..=180.0).contains(&longitude) {
        return longitude;
    }
    let wrapped = (longitude + 180.0).rem_euclid(360.0) - 180.0;
    // rem_euclid maps +180 to -180; both name the same meridian
    if wrapped == -180.0 && longitude > 0.0 {
        180.0
    } else {
        wrapped
    }
}

/// Radius of the selection circle in meters, never below [`MIN_RADIUS_METERS`]
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Radius(f64);

impl Radius {
    /// Creates a radius, clamping to the minimum
    pub fn new(meters: f64) -> Self {
        if meters.is_finite() {
            Self(meters.max(MIN_RADIUS_METERS))
        } else {
            Self(MIN_RADIUS_METERS)
        }
    }

    /// Smallest permitted radius
    pub fn min() -> Self {
        Self(MIN_RADIUS_METERS)
    }

    pub fn meters(self) -> f64 {
        self.0
    }

    /// Returns the radius moved by `delta` meters, clamped at the minimum
    pub fn adjusted(self, delta: f64) -> Self {
        Self::new(self.0 + delta)
    }
}

impl Default for Radius {
    fn default() -> Self {
        Self(DEFAULT_RADIUS_METERS)
    }
}

impl std::fmt::Display for Radius {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.0 >= 10_000.0 {
            write!(f, "{:.1} km", self.0 / 1000.0)
        } else {
            write!(f, "{:.0} m", self.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coordinate_validates_ranges() {
        assert!(Coordinate::new(10.0, 20.0).is_ok());
        assert!(Coordinate::new(-90.0, 180.0).is_ok());
        assert_eq!(
            Coordinate::new(91.0, 0.0),
            Err(CoordinateError::LatitudeOutOfRange(91.0))
        );
        assert_eq!(
            Coordinate::new(0.0, -180.5),
            Err(CoordinateError::LongitudeOutOfRange(-180.5))
        );
        assert!(Coordinate::new(f64::NAN, 0.0).is_err());
    }

    #[test]
    fn normalized_wraps_longitude_and_clamps_latitude() {
        let coord = Coordinate::normalized(95.0, 190.0);
        assert_eq!(coord.latitude, 90.0);
        assert!((coord.longitude - -170.0).abs() < 1e-9);

        let coord = Coordinate::normalized(-10.0, -200.0);
        assert!((coord.longitude - 160.0).abs() < 1e-9);

        assert_eq!(Coordinate::normalized(0.0, 540.0).longitude, 180.0);
        assert_eq!(Coordinate::normalized(0.0, 45.0).longitude, 45.0);
    }

    #[test]
    fn default_center_is_fallback() {
        let coord = Coordinate::default();
        assert_eq!((coord.latitude, coord.longitude), (20.0, 78.0));
    }

    #[test]
    fn radius_never_drops_below_minimum() {
        let radius = Radius::default();
        assert_eq!(radius.meters(), 5000.0);
        assert_eq!(radius.adjusted(-10_000.0).meters(), 1000.0);
        assert_eq!(radius.adjusted(1000.0).meters(), 6000.0);
        assert_eq!(Radius::new(f64::NEG_INFINITY), Radius::min());

        let mut radius = Radius::min();
        for delta in [-1000.0, 3000.0, -500.0, -7000.0, 250.0] {
            radius = radius.adjusted(delta);
            assert!(radius.meters() >= MIN_RADIUS_METERS);
        }
    }

    #[test]
    fn radius_display_switches_units() {
        assert_eq!(Radius::new(5000.0).to_string(), "5000 m");
        assert_eq!(Radius::new(12_500.0).to_string(), "12.5 km");
    }
}
