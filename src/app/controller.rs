//! Application controller and coordination layer
//!
//! The controller owns the selection state and the map camera. Shells feed
//! it intents, prompt answers and dispatcher completions; it runs the state
//! machine, hands off-thread work to the dispatcher, and tells the shell what
//! to show through [`ShellCommand`]s.

use crate::app::dispatch::{Completion, Dispatch, Job};
use crate::app::state::{Effect, PendingPrompt, SelectionState, StateEvent, StateMachine};
use crate::config::MapConfig;
use crate::domain::core::Rect;
use crate::domain::geo::{Coordinate, Radius};
use crate::domain::viewport::Viewport;
use crate::input::Intent;
use crate::net::LookupError;
use crate::ui::map_view::MapScene;
use crate::ui::shell::status_line;

pub const PROMPT_MESSAGE: &str = "Enter your prompt:";
pub const CITY_NOT_FOUND: &str = "City not found.";

/// What the shell has to do after the controller handled something
#[derive(Debug, Clone, PartialEq)]
pub enum ShellCommand {
    /// Modal message the user acknowledges
    Alert(String),
    /// Collect prompt text and hand it to [`MapController::answer_prompt`]
    AskPrompt(PendingPrompt),
    /// State or camera changed, repaint
    Redraw,
}

/// Owns the selection state, the camera and the dispatcher handle
pub struct MapController {
    state: SelectionState,
    viewport: Viewport,
    dispatcher: Box<dyn Dispatch>,
    focus_zoom: f64,
    radius_step: f64,
    notice: Option<String>,
}

impl MapController {
    pub fn new(config: &MapConfig, dispatcher: Box<dyn Dispatch>) -> Self {
        let state = SelectionState::new(config.default_center, Radius::new(config.initial_radius));
        let viewport = Viewport::new(
            config.default_center,
            config.initial_zoom,
            config.window_width as f64,
            config.window_height as f64,
        );
        Self {
            state,
            viewport,
            dispatcher,
            focus_zoom: config.focus_zoom,
            radius_step: config.radius_step,
            notice: None,
        }
    }

    /// Kicks off the one-time device position probe
    pub fn start(&mut self) {
        log::info!("Probing device position, default center is {}", self.state.center);
        self.dispatcher.dispatch(Job::Locate);
    }

    /// Waits for dispatched work before the shell exits, so a submission
    /// made just before quitting still goes out. The results are left on the
    /// completion channel.
    pub fn finish(&mut self) {
        self.dispatcher.shutdown();
    }

    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn radius_step(&self) -> f64 {
        self.radius_step
    }

    /// Latest non-modal notice for the status line
    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    /// Keeps the camera the size of the map area
    pub fn resize_map(&mut self, width: f64, height: f64) {
        self.viewport.resize(width, height);
    }

    pub fn scene(&self, map_rect: Rect) -> MapScene {
        MapScene::build(&self.state, &self.viewport, map_rect)
    }

    pub fn status_text(&self) -> String {
        status_line(&self.state, self.viewport.zoom(), self.notice())
    }

    pub fn handle_intent(&mut self, intent: Intent) -> Vec<ShellCommand> {
        match intent {
            Intent::AdjustRadius(delta) => self.apply(StateEvent::AdjustRadius(delta)),
            Intent::EnterSelectMode => self.apply(StateEvent::EnterSelectMode),
            Intent::PointerMoved(coord) => self.apply(StateEvent::PointerMoved(coord)),
            Intent::PointerLeft => self.apply(StateEvent::PointerLeft),
            Intent::MapClicked(coord) => self.apply(StateEvent::MapClicked(coord)),
            Intent::Search(city) => self.search(city),
            Intent::Pan { dx, dy } => {
                self.viewport.pan_by(dx, dy);
                vec![ShellCommand::Redraw]
            }
            Intent::Zoom { delta, x, y } => {
                self.viewport.zoom_at(delta, x, y);
                vec![ShellCommand::Redraw]
            }
        }
    }

    /// Delivers the user's answer to the outstanding prompt request
    ///
    /// # Arguments
    /// * `answer` - Typed text, `None` when the dialog was dismissed
    pub fn answer_prompt(&mut self, answer: Option<String>) -> Vec<ShellCommand> {
        if self.state.pending_prompt().is_none() {
            log::debug!("Prompt answer arrived with no prompt outstanding");
            return Vec::new();
        }
        if answer.as_deref().is_none_or(str::is_empty) {
            log::info!("Prompt dismissed, nothing submitted");
        }
        self.apply(StateEvent::PromptAnswered(answer))
    }

    pub fn handle_completion(&mut self, completion: Completion) -> Vec<ShellCommand> {
        match completion {
            Completion::Located(Ok(position)) => {
                log::info!("Device position is {}", position);
                self.apply(StateEvent::Recenter(position))
            }
            Completion::Located(Err(err)) => {
                log::warn!("Error getting location: {}", err);
                Vec::new()
            }
            Completion::LookedUp { city, result } => self.lookup_finished(&city, result),
            Completion::Submitted { request, result } => {
                match result {
                    Ok(ack) => {
                        log::info!("Data sent successfully ({}): {}", ack.status, ack.body);
                        self.notice = Some(format!("Prompt sent for {}", request.coordinate()));
                    }
                    Err(err) => {
                        log::error!("Error sending data to server: {}", err);
                        self.notice = Some(format!("Submission failed: {err}"));
                    }
                }
                vec![ShellCommand::Redraw]
            }
        }
    }

    fn search(&mut self, city: String) -> Vec<ShellCommand> {
        let city = city.trim().to_string();
        if city.is_empty() {
            return Vec::new();
        }
        log::info!("Looking up {:?}", city);
        self.notice = Some(format!("Searching for {city}..."));
        self.dispatcher.dispatch(Job::Lookup { city });
        vec![ShellCommand::Redraw]
    }

    fn lookup_finished(
        &mut self,
        city: &str,
        result: Result<Coordinate, LookupError>,
    ) -> Vec<ShellCommand> {
        self.notice = None;
        match result {
            Ok(coord) => {
                log::info!("{:?} resolved to {}", city, coord);
                self.apply(StateEvent::SearchResolved(coord))
            }
            Err(LookupError::NotFound { .. }) => {
                log::info!("No place named {:?}", city);
                vec![ShellCommand::Alert(CITY_NOT_FOUND.to_string()), ShellCommand::Redraw]
            }
            Err(LookupError::EmptyQuery) => vec![ShellCommand::Redraw],
            Err(err) => {
                log::error!("Error fetching city coordinates for {:?}: {}", city, err);
                vec![
                    ShellCommand::Alert(format!("Could not look up {city}: {err}")),
                    ShellCommand::Redraw,
                ]
            }
        }
    }

    /// Runs one state transition and carries out its effects
    fn apply(&mut self, event: StateEvent) -> Vec<ShellCommand> {
        let before = self.state;
        let (next, effects) = StateMachine::process_event(before, event);
        self.state = next;

        if next.center != before.center {
            self.viewport.fly_to(next.center, self.focus_zoom);
        }

        let mut commands = Vec::new();
        for effect in effects {
            match effect {
                Effect::RequestPrompt(pending) => commands.push(ShellCommand::AskPrompt(pending)),
                Effect::Submit(request) => {
                    log::info!(
                        "Submitting prompt for {} within {}",
                        request.coordinate(),
                        request.radius()
                    );
                    self.dispatcher.dispatch(Job::Submit(request));
                }
            }
        }

        if next != before {
            commands.push(ShellCommand::Redraw);
        }
        commands
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::dispatch::fakes::RecordingDispatch;
    use crate::app::state::{Mode, PromptOrigin};
    use crate::domain::submission::SubmissionRequest;
    use crate::net::{Acknowledgement, SubmissionError};
    use crate::platform::location::GeolocationError;
    use pretty_assertions::assert_eq;

    fn coord(lat: f64, lon: f64) -> Coordinate {
        Coordinate::new(lat, lon).unwrap()
    }

    fn controller() -> (MapController, RecordingDispatch) {
        let jobs = RecordingDispatch::default();
        let controller = MapController::new(&MapConfig::default(), Box::new(jobs.clone()));
        (controller, jobs)
    }

    fn submissions(jobs: &[Job]) -> Vec<SubmissionRequest> {
        jobs.iter()
            .filter_map(|job| match job {
                Job::Submit(request) => Some(request.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn starts_at_default_center_and_probes_location() {
        let (mut controller, jobs) = controller();
        assert_eq!(controller.state().center, coord(20.0, 78.0));
        assert_eq!(controller.state().radius, Radius::new(5000.0));
        assert_eq!(controller.viewport().zoom(), 10.0);

        controller.start();
        assert_eq!(jobs.take(), vec![Job::Locate]);
    }

    #[test]
    fn located_position_recenters_and_flies() {
        let (mut controller, _) = controller();
        let here = coord(59.91, 10.75);
        let commands = controller.handle_completion(Completion::Located(Ok(here)));
        assert_eq!(commands, vec![ShellCommand::Redraw]);
        assert_eq!(controller.state().center, here);
        assert_eq!(controller.viewport().center(), here);
        assert_eq!(controller.viewport().zoom(), 12.0);
    }

    #[test]
    fn location_failure_keeps_default_center() {
        let (mut controller, _) = controller();
        let commands =
            controller.handle_completion(Completion::Located(Err(GeolocationError::Denied)));
        assert!(commands.is_empty());
        assert_eq!(controller.state().center, coord(20.0, 78.0));
        assert_eq!(controller.state().mode, Mode::Idle);
    }

    #[test]
    fn select_hover_click_answer_submits_once() {
        let (mut controller, jobs) = controller();
        controller.handle_intent(Intent::EnterSelectMode);
        controller.handle_intent(Intent::PointerMoved(coord(10.0, 20.0)));
        assert_eq!(controller.state().preview_center(), Some(coord(10.0, 20.0)));

        let commands = controller.handle_intent(Intent::MapClicked(coord(10.0, 20.0)));
        let pending = PendingPrompt {
            coordinate: coord(10.0, 20.0),
            radius: Radius::new(5000.0),
            origin: PromptOrigin::MapClick,
        };
        assert_eq!(
            commands,
            vec![ShellCommand::AskPrompt(pending), ShellCommand::Redraw]
        );
        assert!(!controller.state().selecting());
        assert_eq!(controller.state().preview_center(), None);

        controller.answer_prompt(Some("test".to_string()));
        let sent = submissions(&jobs.take());
        assert_eq!(sent.len(), 1);
        let body = sent[0].body();
        assert_eq!(
            (body.latitude, body.longitude, body.radius, body.prompt),
            (10.0, 20.0, 5000, "test")
        );
        assert_eq!(controller.state().center, coord(10.0, 20.0));
        assert_eq!(controller.state().mode, Mode::Idle);
    }

    #[test]
    fn dismissed_or_empty_prompt_submits_nothing() {
        for answer in [None, Some(String::new())] {
            let (mut controller, jobs) = controller();
            controller.handle_intent(Intent::EnterSelectMode);
            controller.handle_intent(Intent::MapClicked(coord(1.0, 2.0)));
            controller.answer_prompt(answer);
            assert!(submissions(&jobs.take()).is_empty());
            assert_eq!(controller.state().center, coord(1.0, 2.0));
            assert!(!controller.state().selecting());
        }
    }

    #[test]
    fn whitespace_prompt_is_sent_verbatim() {
        let (mut controller, jobs) = controller();
        controller.handle_intent(Intent::EnterSelectMode);
        controller.handle_intent(Intent::MapClicked(coord(1.0, 2.0)));
        controller.answer_prompt(Some("  hi ".to_string()));
        let sent = submissions(&jobs.take());
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].prompt(), "  hi ");

        controller.handle_intent(Intent::EnterSelectMode);
        controller.handle_intent(Intent::MapClicked(coord(1.0, 2.0)));
        controller.answer_prompt(Some("   ".to_string()));
        assert_eq!(submissions(&jobs.take()).len(), 1);
    }

    #[test]
    fn radius_changed_while_prompting_is_not_used() {
        let (mut controller, jobs) = controller();
        controller.handle_intent(Intent::EnterSelectMode);
        controller.handle_intent(Intent::MapClicked(coord(1.0, 2.0)));
        controller.handle_intent(Intent::AdjustRadius(3000.0));
        controller.answer_prompt(Some("x".to_string()));

        let sent = submissions(&jobs.take());
        assert_eq!(sent[0].radius(), Radius::new(5000.0));
        assert_eq!(controller.state().radius, Radius::new(8000.0));
    }

    #[test]
    fn stray_prompt_answer_is_ignored() {
        let (mut controller, jobs) = controller();
        assert!(controller.answer_prompt(Some("hello".to_string())).is_empty());
        assert!(jobs.take().is_empty());
    }

    #[test]
    fn radius_never_drops_below_minimum() {
        let (mut controller, _) = controller();
        controller.handle_intent(Intent::AdjustRadius(-10_000.0));
        assert_eq!(controller.state().radius, Radius::new(1000.0));
        controller.handle_intent(Intent::AdjustRadius(-controller.radius_step()));
        assert_eq!(controller.state().radius, Radius::new(1000.0));
    }

    #[test]
    fn search_dispatches_lookup_then_prompts() {
        let (mut controller, jobs) = controller();
        controller.handle_intent(Intent::Search("  Lisbon ".to_string()));
        assert_eq!(
            jobs.take(),
            vec![Job::Lookup {
                city: "Lisbon".to_string()
            }]
        );
        assert!(controller.notice().is_some());

        let lisbon = coord(38.72, -9.14);
        let commands = controller.handle_completion(Completion::LookedUp {
            city: "Lisbon".to_string(),
            result: Ok(lisbon),
        });
        assert!(matches!(
            commands.first(),
            Some(ShellCommand::AskPrompt(PendingPrompt {
                origin: PromptOrigin::Search,
                ..
            }))
        ));
        assert_eq!(controller.state().center, lisbon);
        assert_eq!(controller.viewport().center(), lisbon);
        assert_eq!(controller.notice(), None);

        controller.answer_prompt(Some("museums".to_string()));
        let sent = submissions(&jobs.take());
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].coordinate(), lisbon);
    }

    #[test]
    fn blank_search_does_nothing() {
        let (mut controller, jobs) = controller();
        assert!(controller.handle_intent(Intent::Search("   ".to_string())).is_empty());
        assert!(jobs.take().is_empty());
    }

    #[test]
    fn unknown_city_alerts_and_keeps_center() {
        let (mut controller, jobs) = controller();
        let commands = controller.handle_completion(Completion::LookedUp {
            city: "Atlantis".to_string(),
            result: Err(LookupError::NotFound {
                city: "Atlantis".to_string(),
            }),
        });
        assert_eq!(
            commands,
            vec![
                ShellCommand::Alert(CITY_NOT_FOUND.to_string()),
                ShellCommand::Redraw
            ]
        );
        assert_eq!(controller.state().center, coord(20.0, 78.0));
        assert_eq!(controller.state().mode, Mode::Idle);
        assert!(jobs.take().is_empty());
    }

    #[test]
    fn lookup_failure_alerts() {
        let (mut controller, _) = controller();
        let commands = controller.handle_completion(Completion::LookedUp {
            city: "Paris".to_string(),
            result: Err(LookupError::InvalidResponse("not json".to_string())),
        });
        assert!(matches!(commands.first(), Some(ShellCommand::Alert(text)) if text.contains("Paris")));
        assert_eq!(controller.state().center, coord(20.0, 78.0));
    }

    #[test]
    fn submission_outcomes_become_notices() {
        let (mut controller, _) = controller();
        let request = SubmissionRequest::new(coord(1.0, 2.0), Radius::default(), "x").unwrap();

        controller.handle_completion(Completion::Submitted {
            request: request.clone(),
            result: Err(SubmissionError::Rejected {
                status: 500,
                body: "boom".to_string(),
            }),
        });
        assert!(controller.notice().unwrap().starts_with("Submission failed"));
        assert!(controller.status_text().contains("Submission failed"));

        controller.handle_completion(Completion::Submitted {
            request,
            result: Ok(Acknowledgement {
                status: 200,
                body: "ok".to_string(),
            }),
        });
        assert!(controller.notice().unwrap().starts_with("Prompt sent"));
        assert_eq!(controller.state().mode, Mode::Idle);
    }

    #[test]
    fn hovering_outside_select_mode_changes_nothing() {
        let (mut controller, _) = controller();
        assert!(controller.handle_intent(Intent::PointerMoved(coord(5.0, 5.0))).is_empty());
        assert!(controller.handle_intent(Intent::MapClicked(coord(5.0, 5.0))).is_empty());
        assert_eq!(controller.state().center, coord(20.0, 78.0));
    }

    #[test]
    fn pan_and_zoom_move_the_camera_only() {
        let (mut controller, _) = controller();
        controller.resize_map(800.0, 600.0);
        let before = *controller.state();

        controller.handle_intent(Intent::Pan { dx: 100.0, dy: 0.0 });
        assert!(controller.viewport().center().longitude < 78.0);
        controller.handle_intent(Intent::Zoom {
            delta: 1.0,
            x: 400.0,
            y: 300.0,
        });
        assert_eq!(controller.viewport().zoom(), 11.0);
        assert_eq!(*controller.state(), before);
    }

    #[test]
    fn scene_reflects_preview() {
        let (mut controller, _) = controller();
        controller.resize_map(800.0, 600.0);
        controller.handle_intent(Intent::EnterSelectMode);
        let map = Rect::new(0, 0, 800, 600);
        assert_eq!(controller.scene(map).preview, None);
        controller.handle_intent(Intent::PointerMoved(coord(20.0, 78.0)));
        assert!(controller.scene(map).preview.is_some());
        controller.handle_intent(Intent::PointerLeft);
        assert_eq!(controller.scene(map).preview, None);
        assert!(controller.state().selecting());
    }
}
