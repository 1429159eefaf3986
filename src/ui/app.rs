//! Main TUI application state and logic

use crate::animation::{AnimationClock, Transition};
use crate::config::{AnimationSettings, LayoutConfig};
use crate::layout::Layout;
use crate::scene::Scene;
use crate::snapshot::SnapshotManager;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use futures::executor::LocalPool;
use futures::task::LocalSpawnExt;
use ratatui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout as PaneLayout},
    Frame, Terminal,
};
use std::cell::RefCell;
use std::io;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Poll timeout while a transition is running
const FRAME_INTERVAL: Duration = Duration::from_millis(16);

/// Poll timeout otherwise
const IDLE_INTERVAL: Duration = Duration::from_millis(50);

/// Delay between steps in auto-play mode
const PLAY_INTERVAL: Duration = Duration::from_secs(1);

/// A snapshot that could not be laid out
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorState {
    pub message: String,
    pub step: usize,
}

/// The main application state
pub struct App {
    history: SnapshotManager,
    position: usize,
    config: LayoutConfig,
    settings: AnimationSettings,

    /// Layout of the snapshot on screen, if it could be computed
    layout: Option<Layout>,
    scene: Rc<RefCell<Scene>>,
    clock: AnimationClock,
    pool: LocalPool,
    transition: Option<Transition>,
    started: Instant,

    /// Scroll offset of the diagram, in cells
    pub scroll_x: u16,
    pub scroll_y: u16,

    pub error_state: Option<ErrorState>,

    /// Whether the app should quit
    pub should_quit: bool,

    /// Status message to display
    pub status_message: String,

    /// Whether auto-play mode is active
    pub is_playing: bool,

    /// Last time a step was taken in play mode
    pub last_play_time: Instant,

    /// Last time space was pressed (for debouncing)
    pub last_space_press: Instant,
}

impl App {
    /// Create a new app showing the first snapshot of `history`
    pub fn new(
        history: SnapshotManager,
        config: LayoutConfig,
        settings: AnimationSettings,
    ) -> Self {
        let scene = Rc::new(RefCell::new(Scene::new()));
        let clock = AnimationClock::new(scene.clone(), settings.base_duration);
        let now = Instant::now();
        let mut app = App {
            history,
            position: 0,
            config,
            settings,
            layout: None,
            scene,
            clock,
            pool: LocalPool::new(),
            transition: None,
            started: now,
            scroll_x: 0,
            scroll_y: 0,
            error_state: None,
            should_quit: false,
            status_message: String::from("Ready!"),
            is_playing: false,
            last_play_time: now,
            last_space_press: now.checked_sub(Duration::from_secs(1)).unwrap_or(now),
        };
        app.show(0, false);
        app
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn total_steps(&self) -> usize {
        self.history.len()
    }

    pub fn layout(&self) -> Option<&Layout> {
        self.layout.as_ref()
    }

    pub fn scene(&self) -> Rc<RefCell<Scene>> {
        self.scene.clone()
    }

    pub fn is_animating(&self) -> bool {
        self.transition.is_some()
    }

    /// Run the TUI application
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        loop {
            self.tick();
            terminal.draw(|f| self.render(f))?;

            if self.should_quit {
                break;
            }

            // Handle auto-play mode, one step per interval once the last
            // transition has settled
            if self.is_playing
                && !self.is_animating()
                && self.last_play_time.elapsed() >= PLAY_INTERVAL
            {
                if self.show(self.position + 1, true) {
                    self.status_message = "Playing...".to_string();
                } else {
                    self.is_playing = false;
                    self.status_message = "Playback complete".to_string();
                }
                self.last_play_time = Instant::now();
            }

            let timeout = if self.is_animating() {
                FRAME_INTERVAL
            } else {
                IDLE_INTERVAL
            };
            if event::poll(timeout)? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key_event(key);
                    }
                }
            }
        }

        Ok(())
    }

    /// Advance the animation clock and run whatever it unblocked
    pub fn tick(&mut self) {
        self.clock.tick(self.started.elapsed());
        self.pool.run_until_stalled();
        if self.transition.as_ref().is_some_and(|t| t.is_finished()) {
            self.transition = None;
        }
    }

    /// Show snapshot `index`; returns false when there is no such snapshot
    ///
    /// With `animate` set (and animations enabled) the change from the
    /// snapshot on screen is animated. A snapshot that cannot be laid out
    /// puts the app in the error state and leaves the old diagram up.
    pub fn show(&mut self, index: usize, animate: bool) -> bool {
        if index >= self.history.len() {
            return false;
        }
        self.finish_transition();

        let computed = match self.history.get(index) {
            Some(snapshot) => Layout::compute(snapshot, &self.config),
            None => return false,
        };
        let mut next = match computed {
            Ok(layout) => layout,
            Err(err) => {
                tracing::warn!(step = index, %err, "snapshot could not be laid out");
                self.error_state = Some(ErrorState {
                    message: err.to_string(),
                    step: index,
                });
                self.layout = None;
                self.position = index;
                return true;
            }
        };
        let mut fresh = Scene::new();
        next.draw(&mut fresh);
        let previous_scene = std::mem::replace(&mut *self.scene.borrow_mut(), fresh);
        self.error_state = None;

        if let (true, Some(prev)) = (animate && self.settings.enabled, &self.layout) {
            // Tasks start at the clock's last tick
            self.clock.tick(self.started.elapsed());
            match Transition::plan(prev, &next, &previous_scene, &self.clock) {
                Ok(mut transition) => {
                    if let Some(future) = transition.take_future() {
                        let spawned = self.pool.spawner().spawn_local(async move {
                            if let Err(err) = future.await {
                                tracing::warn!(%err, "transition finished with an error");
                            }
                        });
                        if let Err(err) = spawned {
                            tracing::warn!(?err, "could not start transition");
                        }
                    }
                    self.transition = Some(transition);
                }
                Err(err) => {
                    tracing::warn!(step = index, %err, "transition could not be planned");
                    self.error_state = Some(ErrorState {
                        message: err.to_string(),
                        step: index,
                    });
                }
            }
        }

        tracing::debug!(step = index, animated = self.transition.is_some(), "showing step");
        self.layout = Some(next);
        self.position = index;
        true
    }

    /// Tear down a running transition, leaving every node at its target
    ///
    /// The scene stays on screen when animations are switched off or the
    /// next snapshot fails to lay out, so it must not be left half way.
    fn finish_transition(&mut self) {
        if let Some(mut transition) = self.transition.take() {
            transition.destroy();
            self.pool.run_until_stalled();
        }
    }

    /// Render the UI
    fn render(&mut self, frame: &mut Frame) {
        let chunks = PaneLayout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(1)])
            .split(frame.area());

        let title = match self.layout.as_ref().and_then(|l| {
            let diagram = l.diagram();
            diagram.current_frame().map(|f| diagram.frame(f).name.full.clone())
        }) {
            Some(name) => format!("Environment: {}", name),
            None => "Environment".to_string(),
        };

        let scene = self.scene.borrow();
        super::panes::render_diagram_pane(
            frame,
            chunks[0],
            &scene,
            &self.config,
            (self.scroll_x, self.scroll_y),
            &title,
        );

        super::panes::render_status_bar(
            frame,
            chunks[1],
            &super::panes::StatusRenderData {
                message: &self.status_message,
                current_step: self.position,
                total_steps: self.history.len(),
                error_state: self.error_state.as_ref(),
                is_playing: self.is_playing,
                is_animating: self.is_animating(),
                animations_enabled: self.settings.enabled,
            },
        );
    }

    /// Handle keyboard events
    pub fn handle_key_event(&mut self, key: KeyEvent) {
        let shift = key.modifiers.contains(KeyModifiers::SHIFT);
        match key.code {
            KeyCode::Char('q') | KeyCode::Char('Q') => {
                self.should_quit = true;
            }
            // Number keys step forward N times directly
            KeyCode::Char(c @ '1'..='9') => {
                self.is_playing = false;
                let n = c.to_digit(10).unwrap_or(1) as usize;
                let target = (self.position + n).min(self.history.len().saturating_sub(1));
                let stepped = target - self.position;
                self.show(target, stepped == 1);
                self.status_message = format!("Stepped forward {} step(s)", stepped);
            }
            KeyCode::Left if shift => self.scroll_x = self.scroll_x.saturating_sub(4),
            KeyCode::Right if shift => self.scroll_x = self.scroll_x.saturating_add(4),
            KeyCode::Char('h') => self.scroll_x = self.scroll_x.saturating_sub(4),
            KeyCode::Char('l') => self.scroll_x = self.scroll_x.saturating_add(4),
            KeyCode::Up | KeyCode::Char('k') => self.scroll_y = self.scroll_y.saturating_sub(1),
            KeyCode::Down | KeyCode::Char('j') => self.scroll_y = self.scroll_y.saturating_add(1),
            KeyCode::Left => {
                self.is_playing = false;
                self.step_backward();
            }
            KeyCode::Right => {
                self.is_playing = false;
                self.step_forward();
            }
            KeyCode::Char('a') => {
                self.settings.enabled = !self.settings.enabled;
                if !self.settings.enabled {
                    self.finish_transition();
                }
                self.status_message = if self.settings.enabled {
                    "Animations on".to_string()
                } else {
                    "Animations off".to_string()
                };
            }
            KeyCode::Char(' ') => {
                // Toggle auto-play mode (with 200ms debounce to prevent key repeat spam)
                if self.last_space_press.elapsed() >= Duration::from_millis(200) {
                    self.last_space_press = Instant::now();
                    self.is_playing = !self.is_playing;
                    if self.is_playing {
                        self.last_play_time = Instant::now()
                            .checked_sub(PLAY_INTERVAL)
                            .unwrap_or(Instant::now());
                        self.status_message = "Playing...".to_string();
                    } else {
                        self.status_message = "Paused".to_string();
                    }
                }
            }
            KeyCode::Enter => {
                // Jump to the last snapshot
                self.is_playing = false;
                let last = self.history.len().saturating_sub(1);
                self.show(last, false);
                self.status_message = "Jumped to end".to_string();
            }
            KeyCode::Backspace => {
                // Jump to the first snapshot
                self.is_playing = false;
                self.show(0, false);
                self.status_message = "Jumped to start".to_string();
            }
            _ => {}
        }
    }

    /// Step forward in execution
    fn step_forward(&mut self) {
        if self.show(self.position + 1, true) {
            self.status_message = "Stepped forward".to_string();
        } else {
            self.status_message = "Cannot step forward: at the last snapshot".to_string();
        }
    }

    /// Step backward in execution
    fn step_backward(&mut self) {
        let moved = match self.position.checked_sub(1) {
            Some(index) => self.show(index, true),
            None => false,
        };
        if moved {
            self.status_message = "Stepped backward".to_string();
        } else {
            self.status_message = "Cannot step backward: at the first snapshot".to_string();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{Attr, EntityKey};
    use crate::snapshot::{EnvId, EnvNode, RawValue, Snapshot};

    fn history(values: &[f64]) -> SnapshotManager {
        let mut history = SnapshotManager::new(usize::MAX);
        for &v in values {
            history
                .push(Snapshot::new(vec![
                    EnvNode::new("0", "global", None).bind("x", RawValue::Number { value: v })
                ]))
                .unwrap();
        }
        history
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_stepping_and_bounds() {
        let mut app = App::new(
            history(&[1.0, 2.0, 3.0]),
            LayoutConfig::default(),
            AnimationSettings::default(),
        );
        assert_eq!(app.position(), 0);
        app.handle_key_event(key(KeyCode::Left));
        assert_eq!(app.position(), 0);
        app.handle_key_event(key(KeyCode::Right));
        assert_eq!(app.position(), 1);
        assert!(app.is_animating());
        app.handle_key_event(key(KeyCode::Char('9')));
        assert_eq!(app.position(), 2);
        app.handle_key_event(key(KeyCode::Backspace));
        assert_eq!(app.position(), 0);
        app.handle_key_event(key(KeyCode::Enter));
        assert_eq!(app.position(), 2);
        assert!(!app.show(3, true));
    }

    #[test]
    fn test_animation_toggle_skips_transitions() {
        let mut app = App::new(
            history(&[1.0, 2.0]),
            LayoutConfig::default(),
            AnimationSettings::default(),
        );
        app.handle_key_event(key(KeyCode::Char('a')));
        app.handle_key_event(key(KeyCode::Right));
        assert_eq!(app.position(), 1);
        assert!(!app.is_animating());
    }

    #[test]
    fn test_layout_error_sets_error_state() {
        let mut history = history(&[1.0]);
        history
            .push(Snapshot::new(vec![EnvNode::new("1", "f", Some("missing"))]))
            .unwrap();
        let mut app = App::new(history, LayoutConfig::default(), AnimationSettings::default());
        app.handle_key_event(key(KeyCode::Right));
        assert_eq!(app.position(), 1);
        assert!(app.error_state.is_some());
        assert!(app.layout().is_none());
        app.handle_key_event(key(KeyCode::Left));
        assert!(app.error_state.is_none());
    }

    #[test]
    fn test_toggling_animations_mid_transition_settles_scene() {
        let mut history = SnapshotManager::new(usize::MAX);
        history
            .push(Snapshot::new(vec![
                EnvNode::new("0", "global", None).bind("x", RawValue::Number { value: 1.0 })
            ]))
            .unwrap();
        history
            .push(Snapshot::new(vec![EnvNode::new("0", "global", None)
                .bind("x", RawValue::Number { value: 1.0 })
                .bind("y", RawValue::Number { value: 2.0 })]))
            .unwrap();
        let mut app = App::new(history, LayoutConfig::default(), AnimationSettings::default());

        app.handle_key_event(key(KeyCode::Right));
        assert!(app.is_animating());
        app.handle_key_event(key(KeyCode::Char('a')));
        assert!(!app.is_animating());
        for _ in 0..5 {
            app.tick();
        }

        let scene = app.scene();
        let scene = scene.borrow();
        let y = scene
            .entity(&EntityKey::Binding(EnvId::new("0"), "y".to_string()))
            .unwrap();
        assert_eq!(scene.number(y, Attr::Opacity), 1.0);
    }
}
