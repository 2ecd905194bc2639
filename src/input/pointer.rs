//! Pointer gesture tracking over the map area
//!
//! Positions are relative to the map area's top-left corner. A press that
//! moves less than [`DRAG_THRESHOLD`] pixels before release is a click;
//! anything further is a pan.

use crate::domain::viewport::Viewport;
use crate::input::Intent;

/// Movement below this many pixels between press and release is a click
pub const DRAG_THRESHOLD: f64 = 3.0;

/// Tracks press/drag state between pointer events
#[derive(Debug, Clone, Default)]
pub struct PointerTracker {
    pressed_at: Option<(f64, f64)>,
    last: Option<(f64, f64)>,
    dragging: bool,
}

impl PointerTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// True while a press has turned into a drag
    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    pub fn on_press(&mut self, x: f64, y: f64) {
        self.pressed_at = Some((x, y));
        self.last = Some((x, y));
        self.dragging = false;
    }

    /// Pointer moved; returns a pan while dragging, a hover otherwise
    pub fn on_move(&mut self, x: f64, y: f64, viewport: &Viewport) -> Option<Intent> {
        let Some((px, py)) = self.pressed_at else {
            return Some(Intent::PointerMoved(viewport.unproject(x, y)));
        };

        if !self.dragging && (x - px).hypot(y - py) < DRAG_THRESHOLD {
            return None;
        }
        self.dragging = true;

        let (lx, ly) = self.last.unwrap_or((px, py));
        self.last = Some((x, y));
        Some(Intent::Pan {
            dx: x - lx,
            dy: y - ly,
        })
    }

    /// Pointer released; a release without a drag is a click
    pub fn on_release(&mut self, x: f64, y: f64, viewport: &Viewport) -> Option<Intent> {
        let was_pressed = self.pressed_at.take().is_some();
        let was_dragging = std::mem::take(&mut self.dragging);
        self.last = None;

        (was_pressed && !was_dragging).then(|| Intent::MapClicked(viewport.unproject(x, y)))
    }

    /// Pointer left the map area; any press in progress is abandoned
    pub fn on_leave(&mut self) -> Intent {
        self.pressed_at = None;
        self.last = None;
        self.dragging = false;
        Intent::PointerLeft
    }

    /// Wheel notches (positive = away from the user) zoom in one level each
    pub fn on_wheel(&self, notches: f64, x: f64, y: f64) -> Intent {
        Intent::Zoom { delta: notches, x, y }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::geo::Coordinate;

    fn viewport() -> Viewport {
        Viewport::new(Coordinate::new(20.0, 78.0).unwrap(), 10.0, 800.0, 600.0)
    }

    #[test]
    fn hover_reports_map_position() {
        let mut tracker = PointerTracker::new();
        let viewport = viewport();
        assert_eq!(
            tracker.on_move(400.0, 300.0, &viewport),
            Some(Intent::PointerMoved(viewport.unproject(400.0, 300.0)))
        );
    }

    #[test]
    fn small_wiggle_is_still_a_click() {
        let mut tracker = PointerTracker::new();
        let viewport = viewport();
        tracker.on_press(100.0, 100.0);
        assert_eq!(tracker.on_move(101.0, 101.0, &viewport), None);
        assert_eq!(
            tracker.on_release(101.0, 101.0, &viewport),
            Some(Intent::MapClicked(viewport.unproject(101.0, 101.0)))
        );
    }

    #[test]
    fn drag_pans_and_suppresses_click() {
        let mut tracker = PointerTracker::new();
        let viewport = viewport();
        tracker.on_press(100.0, 100.0);
        assert_eq!(
            tracker.on_move(110.0, 100.0, &viewport),
            Some(Intent::Pan { dx: 10.0, dy: 0.0 })
        );
        assert_eq!(
            tracker.on_move(115.0, 95.0, &viewport),
            Some(Intent::Pan { dx: 5.0, dy: -5.0 })
        );
        assert!(tracker.is_dragging());
        assert_eq!(tracker.on_release(115.0, 95.0, &viewport), None);
        assert!(!tracker.is_dragging());
    }

    #[test]
    fn release_without_press_is_ignored() {
        let mut tracker = PointerTracker::new();
        assert_eq!(tracker.on_release(10.0, 10.0, &viewport()), None);
    }

    #[test]
    fn leaving_cancels_press() {
        let mut tracker = PointerTracker::new();
        let viewport = viewport();
        tracker.on_press(50.0, 50.0);
        assert_eq!(tracker.on_leave(), Intent::PointerLeft);
        assert_eq!(tracker.on_release(50.0, 50.0, &viewport), None);
    }

    #[test]
    fn wheel_zooms_around_pointer() {
        let tracker = PointerTracker::new();
        assert_eq!(
            tracker.on_wheel(1.0, 20.0, 30.0),
            Intent::Zoom {
                delta: 1.0,
                x: 20.0,
                y: 30.0
            }
        );
    }
}
