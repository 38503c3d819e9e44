//! Scripted frontend for driving the screen flow in tests

use meteor_dodge::error::GameResult;
use meteor_dodge::frontend::{Frontend, InputEvent, Scene};
use meteor_dodge::game::HeldKeys;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneKind {
    Start,
    Playing,
    GameOver,
}

/// Replays keyboard events keyed by which screen is showing.
///
/// A reply fires the first time events are polled during the `visit`-th
/// appearance (1-based) of its screen.
#[derive(Debug, Default)]
pub struct ScriptedFrontend {
    replies: Vec<(SceneKind, usize, InputEvent)>,
    current: Option<SceneKind>,
    visits: Vec<SceneKind>,
    play_frames_this_visit: usize,
    quit_after_frames: Option<usize>,
    pub held: HeldKeys,
    /// Overlay text of every static screen drawn, in order
    pub screens: Vec<(SceneKind, Vec<String>)>,
    /// Overlay text of the most recent play frame
    pub last_hud: Vec<String>,
    /// Player x on every play frame drawn
    pub player_xs: Vec<i32>,
    pub play_frames: usize,
}

impl ScriptedFrontend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_visit(mut self, kind: SceneKind, visit: usize, event: InputEvent) -> Self {
        self.replies.push((kind, visit, event));
        self
    }

    /// Press ESC after this many frames of each play session
    pub fn quit_after_frames(mut self, frames: usize) -> Self {
        self.quit_after_frames = Some(frames);
        self
    }

    pub fn holding(mut self, held: HeldKeys) -> Self {
        self.held = held;
        self
    }

    pub fn visits(&self, kind: SceneKind) -> usize {
        self.visits.iter().filter(|k| **k == kind).count()
    }

    fn enter(&mut self, kind: SceneKind) {
        if self.current != Some(kind) {
            self.current = Some(kind);
            self.visits.push(kind);
            self.play_frames_this_visit = 0;
        }
    }
}

impl Frontend for ScriptedFrontend {
    fn poll_events(&mut self) -> GameResult<Vec<InputEvent>> {
        let Some(kind) = self.current else {
            return Ok(Vec::new());
        };
        let visit = self.visits(kind);

        if let Some(pos) = self
            .replies
            .iter()
            .position(|(k, v, _)| *k == kind && *v == visit)
        {
            let (_, _, event) = self.replies.remove(pos);
            return Ok(vec![event]);
        }

        if kind == SceneKind::Playing
            && self
                .quit_after_frames
                .is_some_and(|n| self.play_frames_this_visit >= n)
        {
            return Ok(vec![InputEvent::Escape]);
        }
        Ok(Vec::new())
    }

    fn held_keys(&self) -> HeldKeys {
        self.held
    }

    fn draw(&mut self, scene: &Scene<'_>) -> GameResult<()> {
        let text: Vec<String> = scene.overlay().into_iter().map(|l| l.text).collect();
        match scene {
            Scene::Start => {
                self.enter(SceneKind::Start);
                self.screens.push((SceneKind::Start, text));
            }
            Scene::GameOver { .. } => {
                self.enter(SceneKind::GameOver);
                self.screens.push((SceneKind::GameOver, text));
            }
            Scene::Playing(session) => {
                self.enter(SceneKind::Playing);
                self.player_xs.push(session.player().rect.x);
                self.play_frames += 1;
                self.play_frames_this_visit += 1;
                self.last_hud = text;
            }
        }
        Ok(())
    }
}
