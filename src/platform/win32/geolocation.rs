//! Device position from the WinRT location service

use windows::Devices::Geolocation as winrt;

use crate::domain::geo::Coordinate;
use crate::platform::location::{GeolocationError, Geolocator};

/// Asks Windows for the current position; blocks, so only call it from a
/// dispatcher worker.
#[derive(Debug, Clone, Copy, Default)]
pub struct WinRtGeolocator;

impl Geolocator for WinRtGeolocator {
    fn current_position(&self) -> Result<Coordinate, GeolocationError> {
        let access = winrt::Geolocator::RequestAccessAsync()
            .and_then(|operation| operation.get())
            .map_err(unavailable)?;
        if access != winrt::GeolocationAccessStatus::Allowed {
            return Err(GeolocationError::Denied);
        }

        let locator = winrt::Geolocator::new().map_err(unavailable)?;
        let position = locator
            .GetGeopositionAsync()
            .and_then(|operation| operation.get())
            .and_then(|fix| fix.Coordinate())
            .and_then(|coordinate| coordinate.Point())
            .and_then(|point| point.Position())
            .map_err(unavailable)?;

        Coordinate::new(position.Latitude, position.Longitude)
            .map_err(|err| GeolocationError::Unavailable(err.to_string()))
    }
}

fn unavailable(err: windows::core::Error) -> GeolocationError {
    GeolocationError::Unavailable(err.message().to_string())
}
