//! Map view geometry
//!
//! Builds everything the map area shows for one frame as plain pixel
//! geometry: a graticule in place of raster tiles, the committed-center
//! marker, and the preview circle while selecting. Positions are relative
//! to the map area; `origin` places the area inside the window.

use crate::app::state::SelectionState;
use crate::domain::core::Rect;
use crate::domain::geo::Coordinate;
use crate::domain::viewport::{TILE_SIZE, Viewport};

pub const ATTRIBUTION: &str = "\u{a9} OpenStreetMap contributors";
pub const MARKER_LABEL: &str = "Your Selected Location";

/// Graticule spacings in degrees, coarse to fine
const GRID_STEPS: [f64; 16] = [
    30.0, 10.0, 5.0, 2.0, 1.0, 0.5, 0.2, 0.1, 0.05, 0.02, 0.01, 0.005, 0.002, 0.001, 0.0005,
    0.0002,
];

/// Minimum distance between graticule lines in pixels
const MIN_LINE_SPACING: f64 = 90.0;

/// Upper bound per direction so a degenerate viewport cannot explode
const MAX_LINES: usize = 256;

/// One graticule line across the whole map area
#[derive(Debug, Clone, PartialEq)]
pub struct GridLine {
    pub from: (f32, f32),
    pub to: (f32, f32),
    /// Every fifth line is drawn heavier and labelled
    pub major: bool,
    pub label: Option<String>,
}

/// A circle in map-area pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CircleShape {
    pub cx: f32,
    pub cy: f32,
    pub radius: f32,
}

/// Geometry of one map frame
#[derive(Debug, Clone, PartialEq)]
pub struct MapScene {
    pub origin: (f32, f32),
    pub width: f32,
    pub height: f32,
    pub graticule: Vec<GridLine>,
    /// Committed center, always present (may lie outside the area)
    pub marker: (f32, f32),
    /// Shown only while selecting with the pointer over the map
    pub preview: Option<CircleShape>,
    /// Graticule spacing in degrees
    pub grid_step: f64,
}

impl MapScene {
    pub fn build(state: &SelectionState, viewport: &Viewport, map_rect: Rect) -> Self {
        let (marker_x, marker_y) = viewport.project(state.center);

        let preview = state.preview_center().map(|center| {
            let (cx, cy) = viewport.project(center);
            CircleShape {
                cx: cx as f32,
                cy: cy as f32,
                radius: viewport.meters_to_pixels(state.radius.meters(), center.latitude) as f32,
            }
        });

        let grid_step = grid_step(viewport.zoom());

        Self {
            origin: (map_rect.x as f32, map_rect.y as f32),
            width: map_rect.w as f32,
            height: map_rect.h as f32,
            graticule: graticule(viewport, grid_step),
            marker: (marker_x as f32, marker_y as f32),
            preview,
            grid_step,
        }
    }

    /// True when the marker falls inside the map area
    pub fn marker_visible(&self) -> bool {
        let (x, y) = self.marker;
        (0.0..self.width).contains(&x) && (0.0..self.height).contains(&y)
    }
}

fn pixels_per_degree(zoom: f64) -> f64 {
    TILE_SIZE * 2f64.powf(zoom) / 360.0
}

/// Finest spacing that still keeps lines [`MIN_LINE_SPACING`] apart
pub fn grid_step(zoom: f64) -> f64 {
    let ppd = pixels_per_degree(zoom);
    GRID_STEPS
        .iter()
        .rev()
        .copied()
        .find(|step| step * ppd >= MIN_LINE_SPACING)
        .unwrap_or(GRID_STEPS[0])
}

fn graticule(viewport: &Viewport, step: f64) -> Vec<GridLine> {
    let (width, height) = viewport.size();
    let center = viewport.center();
    let ppd = pixels_per_degree(viewport.zoom());
    let mut lines = Vec::new();

    // Meridians: longitude is linear in x
    let half_span = width / 2.0 / ppd;
    let first = ((center.longitude - half_span) / step).ceil() as i64;
    let last = ((center.longitude + half_span) / step).floor() as i64;
    for k in (first..=last).take(MAX_LINES) {
        let longitude = k as f64 * step;
        let x = (width / 2.0 + (longitude - center.longitude) * ppd) as f32;
        let major = k % 5 == 0;
        lines.push(GridLine {
            from: (x, 0.0),
            to: (x, height as f32),
            major,
            label: major.then(|| format_degrees(longitude, 'E', 'W', step)),
        });
    }

    // Parallels: project each one, Mercator is not linear in y
    let top = viewport.unproject(width / 2.0, 0.0).latitude;
    let bottom = viewport.unproject(width / 2.0, height).latitude;
    let first = (bottom / step).ceil() as i64;
    let last = (top / step).floor() as i64;
    for k in (first..=last).take(MAX_LINES) {
        let latitude = k as f64 * step;
        let (_, y) = viewport.project(Coordinate::normalized(latitude, center.longitude));
        let major = k % 5 == 0;
        lines.push(GridLine {
            from: (0.0, y as f32),
            to: (width as f32, y as f32),
            major,
            label: major.then(|| format_degrees(latitude, 'N', 'S', step)),
        });
    }

    lines
}

fn format_degrees(value: f64, positive: char, negative: char, step: f64) -> String {
    let decimals = if step >= 1.0 {
        0
    } else {
        (-step.log10() - 1e-9).ceil() as usize
    };
    // Meridians past the antimeridian wrap back into -180..=180
    let value = if positive == 'E' {
        Coordinate::normalized(0.0, value).longitude
    } else {
        value
    };
    let hemisphere = if value < 0.0 { negative } else { positive };
    format!("{:.*}\u{b0}{}", decimals, value.abs(), hemisphere)
}
