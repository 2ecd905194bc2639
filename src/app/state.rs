//! Selection state machine
//!
//! Owns what the map shows as committed (center, radius) and what is
//! transient (select mode, preview circle, a pending prompt). The machine is
//! pure: it never talks to the network or the window, it only returns the
//! effects the controller has to carry out.

use crate::domain::geo::{Coordinate, Radius};
use crate::domain::submission::SubmissionRequest;

/// Where a prompt request came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptOrigin {
    /// A click on the map while in select mode
    MapClick,
    /// A successful city search
    Search,
}

impl PromptOrigin {
    /// How the shell introduces the location when asking for a prompt
    pub fn label(self) -> &'static str {
        match self {
            PromptOrigin::MapClick => "Selected location",
            PromptOrigin::Search => "Search result",
        }
    }
}

/// Location and radius frozen at commit time, waiting for prompt text
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PendingPrompt {
    pub coordinate: Coordinate,
    pub radius: Radius,
    pub origin: PromptOrigin,
}

/// Interaction mode
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Mode {
    /// Pointer gestures do not select anything
    #[default]
    Idle,
    /// Pointer movement previews the circle, a click commits
    Selecting { preview: Option<Coordinate> },
    /// A location is committed and the shell is collecting prompt text
    AwaitingPrompt(PendingPrompt),
}

/// The single state instance behind the map view
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectionState {
    pub center: Coordinate,
    pub mode: Mode,
    pub radius: Radius,
}

impl SelectionState {
    pub fn new(center: Coordinate, radius: Radius) -> Self {
        Self {
            center,
            mode: Mode::Idle,
            radius,
        }
    }

    /// True only while in select mode
    pub fn selecting(&self) -> bool {
        matches!(self.mode, Mode::Selecting { .. })
    }

    /// Preview circle center, if one is shown
    pub fn preview_center(&self) -> Option<Coordinate> {
        match self.mode {
            Mode::Selecting { preview } => preview,
            _ => None,
        }
    }

    /// The prompt request currently outstanding, if any
    pub fn pending_prompt(&self) -> Option<PendingPrompt> {
        match self.mode {
            Mode::AwaitingPrompt(pending) => Some(pending),
            _ => None,
        }
    }
}

impl Default for SelectionState {
    fn default() -> Self {
        Self::new(Coordinate::default(), Radius::default())
    }
}

/// Events the state machine understands
#[derive(Debug, Clone, PartialEq)]
pub enum StateEvent {
    /// Select button pressed
    EnterSelectMode,
    /// Pointer moved over the map
    PointerMoved(Coordinate),
    /// Pointer left the map area
    PointerLeft,
    /// Map clicked
    MapClicked(Coordinate),
    /// Answer to a prompt request; `None` when the user dismissed it
    PromptAnswered(Option<String>),
    /// Radius change from a button or a key
    AdjustRadius(f64),
    /// Center moved without user selection (device position)
    Recenter(Coordinate),
    /// City search produced a coordinate
    SearchResolved(Coordinate),
}

/// Side effects requested by a transition
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Ask the user for prompt text
    RequestPrompt(PendingPrompt),
    /// Send the request to the processing endpoint
    Submit(SubmissionRequest),
}

/// State machine for selection transitions
pub struct StateMachine;

impl StateMachine {
    /// Processes an event
    ///
    /// # Arguments
    /// * `current` - State before the event
    /// * `event` - What happened
    ///
    /// # Returns
    /// The next state and the effects the controller has to run. Events that
    /// are not valid in the current mode leave the state as is.
    pub fn process_event(
        current: SelectionState,
        event: StateEvent,
    ) -> (SelectionState, Vec<Effect>) {
        let mut next = current;
        let mut effects = Vec::new();

        match (current.mode, event) {
            (Mode::Idle | Mode::Selecting { .. }, StateEvent::EnterSelectMode) => {
                next.mode = Mode::Selecting { preview: None };
            }

            (Mode::Selecting { .. }, StateEvent::PointerMoved(coord)) => {
                next.mode = Mode::Selecting {
                    preview: Some(coord),
                };
            }

            (Mode::Selecting { .. }, StateEvent::PointerLeft) => {
                next.mode = Mode::Selecting { preview: None };
            }

            (Mode::Selecting { .. }, StateEvent::MapClicked(coord)) => {
                let pending = PendingPrompt {
                    coordinate: coord,
                    radius: current.radius,
                    origin: PromptOrigin::MapClick,
                };
                next.center = coord;
                next.mode = Mode::AwaitingPrompt(pending);
                effects.push(Effect::RequestPrompt(pending));
            }

            (Mode::AwaitingPrompt(pending), StateEvent::PromptAnswered(answer)) => {
                next.mode = Mode::Idle;
                if let Some(request) = answer.as_deref().and_then(|text| {
                    SubmissionRequest::new(pending.coordinate, pending.radius, text)
                }) {
                    effects.push(Effect::Submit(request));
                }
            }

            (_, StateEvent::AdjustRadius(delta)) => {
                next.radius = current.radius.adjusted(delta);
            }

            (_, StateEvent::Recenter(coord)) => {
                next.center = coord;
            }

            (Mode::AwaitingPrompt(_), StateEvent::SearchResolved(coord)) => {
                // One prompt at a time; the late search result only moves the map
                next.center = coord;
            }

            (_, StateEvent::SearchResolved(coord)) => {
                let pending = PendingPrompt {
                    coordinate: coord,
                    radius: current.radius,
                    origin: PromptOrigin::Search,
                };
                next.center = coord;
                next.mode = Mode::AwaitingPrompt(pending);
                effects.push(Effect::RequestPrompt(pending));
            }

            // Invalid transitions - ignore event
            _ => {}
        }

        (next, effects)
    }

    /// Click-then-answer in one step, as the shell does with a modal prompt
    pub fn commit_selection(
        current: SelectionState,
        coord: Coordinate,
        prompt: &str,
    ) -> (SelectionState, Vec<Effect>) {
        let (clicked, mut effects) =
            Self::process_event(current, StateEvent::MapClicked(coord));
        if clicked.pending_prompt().is_none() {
            return (clicked, effects);
        }
        effects.retain(|effect| !matches!(effect, Effect::RequestPrompt(_)));

        let (answered, more) =
            Self::process_event(clicked, StateEvent::PromptAnswered(Some(prompt.to_string())));
        effects.extend(more);
        (answered, effects)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn coord(lat: f64, lon: f64) -> Coordinate {
        Coordinate::new(lat, lon).unwrap()
    }

    fn run(state: SelectionState, events: Vec<StateEvent>) -> (SelectionState, Vec<Effect>) {
        events.into_iter().fold((state, Vec::new()), |(state, mut all), event| {
            let (next, effects) = StateMachine::process_event(state, event);
            all.extend(effects);
            (next, all)
        })
    }

    fn submissions(effects: &[Effect]) -> Vec<&SubmissionRequest> {
        effects
            .iter()
            .filter_map(|effect| match effect {
                Effect::Submit(request) => Some(request),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn default_state_is_idle() {
        let state = SelectionState::default();
        assert!(!state.selecting());
        assert_eq!(state.preview_center(), None);
        assert_eq!(state.radius.meters(), 5000.0);
    }

    #[test]
    fn enter_select_mode_clears_preview() {
        let mut state = SelectionState::default();
        state.mode = Mode::Selecting {
            preview: Some(coord(1.0, 1.0)),
        };
        let (state, effects) = StateMachine::process_event(state, StateEvent::EnterSelectMode);
        assert!(state.selecting());
        assert_eq!(state.preview_center(), None);
        assert!(effects.is_empty());
    }

    #[test]
    fn pointer_move_is_ignored_when_idle() {
        let state = SelectionState::default();
        let (next, _) = StateMachine::process_event(state, StateEvent::PointerMoved(coord(1.0, 2.0)));
        assert_eq!(next, state);
    }

    #[test]
    fn pointer_leave_clears_preview_but_keeps_selecting() {
        let (state, _) = run(
            SelectionState::default(),
            vec![
                StateEvent::EnterSelectMode,
                StateEvent::PointerMoved(coord(5.0, 5.0)),
                StateEvent::PointerLeft,
            ],
        );
        assert!(state.selecting());
        assert_eq!(state.preview_center(), None);
    }

    #[test]
    fn click_outside_select_mode_does_nothing() {
        let state = SelectionState::default();
        let (next, effects) = StateMachine::process_event(state, StateEvent::MapClicked(coord(1.0, 1.0)));
        assert_eq!(next, state);
        assert!(effects.is_empty());
    }

    #[test]
    fn click_requests_prompt_and_moves_center() {
        let (state, effects) = run(
            SelectionState::default(),
            vec![StateEvent::EnterSelectMode, StateEvent::MapClicked(coord(3.0, 4.0))],
        );
        assert_eq!(state.center, coord(3.0, 4.0));
        assert!(!state.selecting());
        assert_eq!(state.preview_center(), None);
        assert_eq!(
            effects,
            vec![Effect::RequestPrompt(PendingPrompt {
                coordinate: coord(3.0, 4.0),
                radius: Radius::default(),
                origin: PromptOrigin::MapClick,
            })]
        );
    }

    #[test]
    fn commit_always_leaves_select_mode() {
        for prompt in ["", "   ", "hello"] {
            let (selecting, _) =
                StateMachine::process_event(SelectionState::default(), StateEvent::EnterSelectMode);
            let (state, _) = StateMachine::commit_selection(selecting, coord(1.0, 1.0), prompt);
            assert!(!state.selecting(), "prompt {prompt:?}");
            assert_eq!(state.mode, Mode::Idle);
        }
    }

    #[test]
    fn whitespace_prompt_counts_as_text() {
        let (selecting, _) =
            StateMachine::process_event(SelectionState::default(), StateEvent::EnterSelectMode);
        let (_, effects) = StateMachine::commit_selection(selecting, coord(10.0, 20.0), "   ");
        let sent = submissions(&effects);
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].prompt(), "   ");
    }

    #[test]
    fn empty_prompt_updates_center_without_submission() {
        let (selecting, _) =
            StateMachine::process_event(SelectionState::default(), StateEvent::EnterSelectMode);
        let (state, effects) = StateMachine::commit_selection(selecting, coord(7.0, 8.0), "");
        assert_eq!(state.center, coord(7.0, 8.0));
        assert_eq!(submissions(&effects).len(), 0);
    }

    #[test]
    fn dismissed_prompt_updates_center_without_submission() {
        let (state, effects) = run(
            SelectionState::default(),
            vec![
                StateEvent::EnterSelectMode,
                StateEvent::MapClicked(coord(7.0, 8.0)),
                StateEvent::PromptAnswered(None),
            ],
        );
        assert_eq!(state.center, coord(7.0, 8.0));
        assert_eq!(state.mode, Mode::Idle);
        assert!(submissions(&effects).is_empty());
    }

    #[test]
    fn non_empty_prompt_submits_once_with_current_radius() {
        let (selecting, _) = run(
            SelectionState::default(),
            vec![StateEvent::AdjustRadius(2000.0), StateEvent::EnterSelectMode],
        );
        let (_, effects) = StateMachine::commit_selection(selecting, coord(1.0, 2.0), "hello");
        let sent = submissions(&effects);
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].radius().meters(), 7000.0);
        assert_eq!(sent[0].prompt(), "hello");
    }

    #[test]
    fn radius_is_frozen_at_click_time() {
        let (state, effects) = run(
            SelectionState::default(),
            vec![
                StateEvent::EnterSelectMode,
                StateEvent::MapClicked(coord(1.0, 2.0)),
                StateEvent::AdjustRadius(3000.0),
                StateEvent::PromptAnswered(Some("why".into())),
            ],
        );
        assert_eq!(state.radius.meters(), 8000.0);
        assert_eq!(submissions(&effects)[0].radius().meters(), 5000.0);
    }

    #[test]
    fn select_move_commit_scenario() {
        let mut state = SelectionState::default();
        state.radius = Radius::new(5000.0);

        let (state, mut effects) = run(
            state,
            vec![StateEvent::EnterSelectMode, StateEvent::PointerMoved(coord(10.0, 20.0))],
        );
        assert_eq!(state.preview_center(), Some(coord(10.0, 20.0)));

        let (state, more) = StateMachine::commit_selection(state, coord(10.0, 20.0), "test");
        effects.extend(more);

        assert_eq!(
            state,
            SelectionState {
                center: coord(10.0, 20.0),
                mode: Mode::Idle,
                radius: Radius::new(5000.0),
            }
        );
        assert_eq!(state.preview_center(), None);
        assert_eq!(
            effects,
            vec![Effect::Submit(
                SubmissionRequest::new(coord(10.0, 20.0), Radius::new(5000.0), "test").unwrap()
            )]
        );
    }

    #[test]
    fn adjust_radius_clamps_at_minimum() {
        let (state, _) = StateMachine::process_event(
            SelectionState::default(),
            StateEvent::AdjustRadius(-10_000.0),
        );
        assert_eq!(state.radius.meters(), 1000.0);
    }

    #[test]
    fn adjust_radius_works_in_every_mode() {
        let (state, _) = run(
            SelectionState::default(),
            vec![
                StateEvent::AdjustRadius(1000.0),
                StateEvent::EnterSelectMode,
                StateEvent::AdjustRadius(1000.0),
                StateEvent::MapClicked(coord(0.0, 0.0)),
                StateEvent::AdjustRadius(-1000.0),
            ],
        );
        assert_eq!(state.radius.meters(), 6000.0);
    }

    #[test]
    fn recenter_keeps_mode_and_radius() {
        let (selecting, _) =
            StateMachine::process_event(SelectionState::default(), StateEvent::EnterSelectMode);
        let (state, effects) =
            StateMachine::process_event(selecting, StateEvent::Recenter(coord(-33.9, 151.2)));
        assert_eq!(state.center, coord(-33.9, 151.2));
        assert!(state.selecting());
        assert_eq!(state.radius, selecting.radius);
        assert!(effects.is_empty());
    }

    #[test]
    fn search_result_recenters_and_requests_prompt() {
        let (state, effects) = StateMachine::process_event(
            SelectionState::default(),
            StateEvent::SearchResolved(coord(48.85, 2.35)),
        );
        assert_eq!(state.center, coord(48.85, 2.35));
        assert_eq!(
            effects,
            vec![Effect::RequestPrompt(PendingPrompt {
                coordinate: coord(48.85, 2.35),
                radius: Radius::default(),
                origin: PromptOrigin::Search,
            })]
        );

        let (state, effects) =
            StateMachine::process_event(state, StateEvent::PromptAnswered(Some("museums".into())));
        assert_eq!(state.mode, Mode::Idle);
        assert_eq!(submissions(&effects).len(), 1);
    }

    #[test]
    fn search_result_during_pending_prompt_only_recenters() {
        let (state, _) = run(
            SelectionState::default(),
            vec![StateEvent::EnterSelectMode, StateEvent::MapClicked(coord(1.0, 1.0))],
        );
        let pending = state.pending_prompt();
        let (state, effects) =
            StateMachine::process_event(state, StateEvent::SearchResolved(coord(2.0, 2.0)));
        assert_eq!(state.center, coord(2.0, 2.0));
        assert_eq!(state.pending_prompt(), pending);
        assert!(effects.is_empty());
    }

    #[test]
    fn select_mode_is_blocked_while_prompt_is_pending() {
        let (state, _) = run(
            SelectionState::default(),
            vec![StateEvent::EnterSelectMode, StateEvent::MapClicked(coord(1.0, 1.0))],
        );
        let (next, _) = StateMachine::process_event(state, StateEvent::EnterSelectMode);
        assert_eq!(next, state);
    }
}
