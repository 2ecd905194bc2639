//! Keyboard mapping
//!
//! Keys arrive either as Windows virtual-key codes (map window) or as key
//! names typed into the console shell. Both are normalized into [`Key`] and
//! then into intents. The arrow keys are a second surface for the radius buttons and
//! produce exactly the same intents.

use crate::input::Intent;

/// Keys the map shell reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    ArrowUp,
    ArrowDown,
    Enter,
    Escape,
    Backspace,
    /// Any key we pass through untouched
    Other(u32),
}

impl Key {
    /// Convert a Windows virtual key code
    pub fn from_vk_code(vk_code: u32) -> Self {
        match vk_code {
            0x26 => Key::ArrowUp,   // VK_UP
            0x28 => Key::ArrowDown, // VK_DOWN
            0x0d => Key::Enter,     // VK_RETURN
            0x1b => Key::Escape,    // VK_ESCAPE
            0x08 => Key::Backspace, // VK_BACK
            other => Key::Other(other),
        }
    }

    /// Convert a typed arrow key name, case-insensitive
    ///
    /// # Arguments
    /// * `name` - "up" / "down" or the DOM names "ArrowUp" / "ArrowDown"
    ///
    /// # Returns
    /// The key, or `None` for any other word
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "up" | "arrowup" => Some(Key::ArrowUp),
            "down" | "arrowdown" => Some(Key::ArrowDown),
            _ => None,
        }
    }
}

/// Intent for a key press, if the key means anything to the map.
///
/// Arrow keys are global: they act whether or not the search box has focus.
pub fn key_intent(key: Key, radius_step: f64) -> Option<Intent> {
    match key {
        Key::ArrowUp => Some(Intent::AdjustRadius(radius_step)),
        Key::ArrowDown => Some(Intent::AdjustRadius(-radius_step)),
        _ => None,
    }
}
