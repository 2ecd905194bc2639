//! Shell widget state that is not part of the selection: the search box
//! text and the status line.

use crate::app::state::{Mode, SelectionState};

pub const SEARCH_PLACEHOLDER: &str = "Enter City...";
const MAX_SEARCH_CHARS: usize = 128;

/// Single-line editable text field
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchBox {
    text: String,
    focused: bool,
    // First half of a surrogate pair typed as two UTF-16 units
    high_surrogate: Option<u16>,
}

impl SearchBox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    pub fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }

    /// Appends a typed character; control characters are dropped
    ///
    /// # Returns
    /// `true` when the text changed
    pub fn insert(&mut self, ch: char) -> bool {
        if ch.is_control() || self.text.chars().count() >= MAX_SEARCH_CHARS {
            return false;
        }
        self.text.push(ch);
        true
    }

    /// Appends one UTF-16 code unit as delivered by the window.
    ///
    /// A high surrogate is held until its low half arrives; unpaired halves
    /// are dropped.
    ///
    /// # Returns
    /// `true` when the text changed
    pub fn insert_utf16(&mut self, unit: u16) -> bool {
        if (0xD800..0xDC00).contains(&unit) {
            self.high_surrogate = Some(unit);
            return false;
        }
        let units: Vec<u16> = self.high_surrogate.take().into_iter().chain([unit]).collect();
        match char::decode_utf16(units).last() {
            Some(Ok(ch)) => self.insert(ch),
            _ => false,
        }
    }

    pub fn backspace(&mut self) {
        self.text.pop();
    }

    /// Trimmed query, or `None` when there is nothing to search for.
    /// The text stays in the box.
    pub fn submit(&self) -> Option<String> {
        let query = self.text.trim();
        (!query.is_empty()).then(|| query.to_string())
    }

    /// What the box shows: the text, or the placeholder when empty
    pub fn display_text(&self) -> (&str, bool) {
        if self.text.is_empty() {
            (SEARCH_PLACEHOLDER, true)
        } else {
            (&self.text, false)
        }
    }
}

/// Short description of the interaction mode
pub fn mode_label(mode: &Mode) -> &'static str {
    match mode {
        Mode::Idle => "Browsing",
        Mode::Selecting { .. } => "Select mode: click the map",
        Mode::AwaitingPrompt(_) => "Waiting for prompt",
    }
}

/// Text of the status line
pub fn status_line(state: &SelectionState, zoom: f64, notice: Option<&str>) -> String {
    let mut line = format!(
        "Radius {} | {} | Center {} | Zoom {:.0}",
        state.radius,
        mode_label(&state.mode),
        state.center,
        zoom
    );
    if let Some(notice) = notice {
        line.push_str(" | ");
        line.push_str(notice);
    }
    line
}
