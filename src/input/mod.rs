//! Input adapters
//!
//! Each surface (keyboard, buttons, pointer) is translated into the same
//! platform-neutral [`Intent`] values, so the controller holds the only copy
//! of the interaction rules.

pub mod buttons;
pub mod keyboard;
pub mod pointer;

use crate::domain::geo::Coordinate;

pub use buttons::button_intent;
pub use keyboard::{Key, key_intent};
pub use pointer::PointerTracker;

/// A user action, independent of where it came from
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    /// Grow or shrink the circle by this many meters
    AdjustRadius(f64),
    /// Enter select mode
    EnterSelectMode,
    /// Look up a city and center on it
    Search(String),
    /// Pointer is over this map position
    PointerMoved(Coordinate),
    /// Pointer left the map area
    PointerLeft,
    /// Click (press and release without dragging) at this map position
    MapClicked(Coordinate),
    /// Drag the map content by this many pixels
    Pan { dx: f64, dy: f64 },
    /// Zoom by `delta` levels around a point of the map area
    Zoom { delta: f64, x: f64, y: f64 },
}
