//! Device position lookup used once at start-up

use crate::domain::geo::Coordinate;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GeolocationError {
    #[error("Location access was denied")]
    Denied,

    #[error("Location is unavailable: {0}")]
    Unavailable(String),
}

/// Source of the device's current position
pub trait Geolocator: Send + Sync {
    fn current_position(&self) -> Result<Coordinate, GeolocationError>;
}

/// Reports a position taken from configuration
#[derive(Debug, Clone, Copy)]
pub struct FixedPosition(pub Coordinate);

impl Geolocator for FixedPosition {
    fn current_position(&self) -> Result<Coordinate, GeolocationError> {
        Ok(self.0)
    }
}

/// Used where the platform offers no location service
#[derive(Debug, Clone, Copy, Default)]
pub struct NoGeolocation;

impl Geolocator for NoGeolocation {
    fn current_position(&self) -> Result<Coordinate, GeolocationError> {
        Err(GeolocationError::Unavailable(
            "no location service on this platform".to_string(),
        ))
    }
}

/// Picks the best position source: a configured fixed position wins, then
/// the platform service.
pub fn system_geolocator(fixed: Option<Coordinate>) -> Box<dyn Geolocator> {
    if let Some(position) = fixed {
        return Box::new(FixedPosition(position));
    }

    #[cfg(windows)]
    {
        Box::new(crate::platform::win32::geolocation::WinRtGeolocator)
    }

    #[cfg(not(windows))]
    {
        Box::new(NoGeolocation)
    }
}
