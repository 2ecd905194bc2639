//! Shell button mapping

use crate::input::Intent;
use crate::ui::layout::Control;

/// Intent for a button press. `search_text` is the current search box
/// content; blank searches produce nothing.
pub fn button_intent(control: Control, radius_step: f64, search_text: &str) -> Option<Intent> {
    match control {
        Control::IncreaseRadius => Some(Intent::AdjustRadius(radius_step)),
        Control::DecreaseRadius => Some(Intent::AdjustRadius(-radius_step)),
        Control::Select => Some(Intent::EnterSelectMode),
        Control::SearchButton => {
            let city = search_text.trim();
            (!city.is_empty()).then(|| Intent::Search(city.to_string()))
        }
        Control::SearchBox | Control::Map | Control::StatusBar => None,
    }
}
