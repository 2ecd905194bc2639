//! Shell layout and hit testing
//!
//! The window is split into a toolbar (search on the left, radius and
//! select buttons on the right), the map area, and a status line.

use crate::domain::core::Rect;

pub const TOOLBAR_HEIGHT: i32 = 44;
pub const STATUS_HEIGHT: i32 = 24;
const MARGIN: i32 = 8;
const CONTROL_HEIGHT: i32 = TOOLBAR_HEIGHT - 2 * MARGIN;
const SEARCH_BOX_WIDTH: i32 = 260;
const SEARCH_BUTTON_WIDTH: i32 = 80;
const BUTTON_WIDTH: i32 = 96;

/// Interactive regions of the shell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Control {
    SearchBox,
    SearchButton,
    IncreaseRadius,
    DecreaseRadius,
    Select,
    Map,
    StatusBar,
}

impl Control {
    /// Caption drawn on push buttons
    pub fn label(self) -> Option<&'static str> {
        match self {
            Control::SearchButton => Some("Search"),
            Control::IncreaseRadius => Some("Increase"),
            Control::DecreaseRadius => Some("Decrease"),
            Control::Select => Some("Select"),
            Control::SearchBox | Control::Map | Control::StatusBar => None,
        }
    }

    pub fn is_button(self) -> bool {
        self.label().is_some()
    }
}

/// Pixel rectangles of every shell region for one window size
#[derive(Debug, Clone, PartialEq)]
pub struct ShellLayout {
    pub width: i32,
    pub height: i32,
    pub search_box: Rect,
    pub search_button: Rect,
    pub increase: Rect,
    pub decrease: Rect,
    pub select: Rect,
    pub map: Rect,
    pub status: Rect,
}

impl ShellLayout {
    pub fn compute(width: i32, height: i32) -> Self {
        let width = width.max(1);
        let height = height.max(TOOLBAR_HEIGHT + STATUS_HEIGHT + 1);

        let search_box = Rect::new(MARGIN, MARGIN, SEARCH_BOX_WIDTH, CONTROL_HEIGHT);
        let search_button = Rect::new(
            search_box.right() + MARGIN,
            MARGIN,
            SEARCH_BUTTON_WIDTH,
            CONTROL_HEIGHT,
        );

        // Right-aligned: Increase, Decrease, Select
        let select = Rect::new(
            width - MARGIN - BUTTON_WIDTH,
            MARGIN,
            BUTTON_WIDTH,
            CONTROL_HEIGHT,
        );
        let decrease = Rect::new(select.x - MARGIN - BUTTON_WIDTH, MARGIN, BUTTON_WIDTH, CONTROL_HEIGHT);
        let increase = Rect::new(decrease.x - MARGIN - BUTTON_WIDTH, MARGIN, BUTTON_WIDTH, CONTROL_HEIGHT);

        let map = Rect::new(0, TOOLBAR_HEIGHT, width, height - TOOLBAR_HEIGHT - STATUS_HEIGHT);
        let status = Rect::new(0, map.bottom(), width, STATUS_HEIGHT);

        Self {
            width,
            height,
            search_box,
            search_button,
            increase,
            decrease,
            select,
            map,
            status,
        }
    }

    /// Region under a window-relative point
    ///
    /// # Returns
    /// The control hit, or `None` for toolbar gaps and points outside the window
    pub fn hit_test(&self, x: i32, y: i32) -> Option<Control> {
        self.controls()
            .into_iter()
            .find(|(_, rect)| rect.contains_point(x, y))
            .map(|(control, _)| control)
    }

    pub fn rect_of(&self, control: Control) -> Rect {
        match control {
            Control::SearchBox => self.search_box,
            Control::SearchButton => self.search_button,
            Control::IncreaseRadius => self.increase,
            Control::DecreaseRadius => self.decrease,
            Control::Select => self.select,
            Control::Map => self.map,
            Control::StatusBar => self.status,
        }
    }

    /// Converts a window point to map-area coordinates
    pub fn to_map(&self, x: i32, y: i32) -> (f64, f64) {
        ((x - self.map.x) as f64, (y - self.map.y) as f64)
    }

    pub fn controls(&self) -> [(Control, Rect); 7] {
        [
            (Control::SearchBox, self.search_box),
            (Control::SearchButton, self.search_button),
            (Control::IncreaseRadius, self.increase),
            (Control::DecreaseRadius, self.decrease),
            (Control::Select, self.select),
            (Control::Map, self.map),
            (Control::StatusBar, self.status),
        ]
    }
}
