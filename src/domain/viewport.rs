//! Web-Mercator camera for the map view
//!
//! Converts between geographic coordinates and pixels inside the map area.
//! Screen positions are relative to the top-left corner of the map area, not
//! the window.

use std::f64::consts::PI;

use crate::domain::geo::{Coordinate, MAX_MERCATOR_LATITUDE};

/// Edge length of one slippy-map tile in pixels
pub const TILE_SIZE: f64 = 256.0;

/// Ground resolution at the equator for zoom 0, in meters per pixel
const EQUATOR_METERS_PER_PIXEL: f64 = 156_543.033_92;

pub const MIN_ZOOM: f64 = 1.0;
pub const MAX_ZOOM: f64 = 19.0;

/// Camera over the map: what is centered, how far in, and how large the
/// drawing surface is.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    center: Coordinate,
    zoom: f64,
    width: f64,
    height: f64,
}

impl Viewport {
    pub fn new(center: Coordinate, zoom: f64, width: f64, height: f64) -> Self {
        Self {
            center,
            zoom: zoom.clamp(MIN_ZOOM, MAX_ZOOM),
            width: width.max(1.0),
            height: height.max(1.0),
        }
    }

    pub fn center(&self) -> Coordinate {
        self.center
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn size(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    /// Updates the drawing surface size, keeping the center
    pub fn resize(&mut self, width: f64, height: f64) {
        self.width = width.max(1.0);
        self.height = height.max(1.0);
    }

    /// Jumps to `center` at `zoom`
    pub fn fly_to(&mut self, center: Coordinate, zoom: f64) {
        self.center = center;
        self.zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
    }

    /// Screen position of a coordinate
    pub fn project(&self, coord: Coordinate) -> (f64, f64) {
        let (cx, cy) = world_pixel(self.center, self.zoom);
        let (x, y) = world_pixel(coord, self.zoom);
        (x - cx + self.width / 2.0, y - cy + self.height / 2.0)
    }

    /// Coordinate under a screen position
    ///
    /// # Returns
    /// A valid coordinate; positions off the world are clamped and wrapped
    pub fn unproject(&self, sx: f64, sy: f64) -> Coordinate {
        let (cx, cy) = world_pixel(self.center, self.zoom);
        from_world_pixel(
            cx + sx - self.width / 2.0,
            cy + sy - self.height / 2.0,
            self.zoom,
        )
    }

    /// Moves the map content by a pointer drag of (`dx`, `dy`) pixels
    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        self.center = self.unproject(self.width / 2.0 - dx, self.height / 2.0 - dy);
    }

    /// Zooms keeping the point under the cursor fixed
    ///
    /// # Arguments
    /// * `delta` - Zoom levels to add, negative to zoom out
    /// * `sx`, `sy` - Cursor position in map-area pixels
    pub fn zoom_at(&mut self, delta: f64, sx: f64, sy: f64) {
        let anchor = self.unproject(sx, sy);
        let zoom = (self.zoom + delta).clamp(MIN_ZOOM, MAX_ZOOM);
        if zoom == self.zoom {
            return;
        }
        self.zoom = zoom;

        let (ax, ay) = world_pixel(anchor, zoom);
        self.center = from_world_pixel(
            ax - (sx - self.width / 2.0),
            ay - (sy - self.height / 2.0),
            zoom,
        );
    }

    /// Ground resolution at `latitude` for the current zoom
    pub fn meters_per_pixel(&self, latitude: f64) -> f64 {
        let lat = latitude.clamp(-MAX_MERCATOR_LATITUDE, MAX_MERCATOR_LATITUDE);
        EQUATOR_METERS_PER_PIXEL * lat.to_radians().cos() / 2f64.powf(self.zoom)
    }

    /// Converts a ground distance at `latitude` to screen pixels
    pub fn meters_to_pixels(&self, meters: f64, latitude: f64) -> f64 {
        meters / self.meters_per_pixel(latitude)
    }
}

fn world_size(zoom: f64) -> f64 {
    TILE_SIZE * 2f64.powf(zoom)
}

fn world_pixel(coord: Coordinate, zoom: f64) -> (f64, f64) {
    let size = world_size(zoom);
    let lat = coord
        .latitude
        .clamp(-MAX_MERCATOR_LATITUDE, MAX_MERCATOR_LATITUDE)
        .to_radians();
    let x = (coord.longitude + 180.0) / 360.0 * size;
    let y = (1.0 - (lat.tan() + 1.0 / lat.cos()).ln() / PI) / 2.0 * size;
    (x, y)
}

fn from_world_pixel(x: f64, y: f64, zoom: f64) -> Coordinate {
    let size = world_size(zoom);
    let y = y.clamp(0.0, size);
    let longitude = x / size * 360.0 - 180.0;
    let n = PI - 2.0 * PI * y / size;
    let latitude = n.sinh().atan().to_degrees();
    Coordinate::normalized(latitude, longitude)
}
