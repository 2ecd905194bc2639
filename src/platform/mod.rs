//! Platform surfaces
//!
//! The console shell and the location fallbacks work everywhere; the map
//! window and the WinRT location service are Windows-only.

pub mod console;
pub mod location;

#[cfg(windows)]
pub mod win32;

pub use location::{GeolocationError, Geolocator, system_geolocator};
