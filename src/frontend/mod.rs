//! Drawing surface and keyboard/window input
//!
//! The game talks to its window through [`Frontend`]; the shipped
//! implementation draws into the terminal.

pub mod terminal;

use crate::error::GameResult;
use crate::game::{HeldKeys, Session};

pub use terminal::TerminalFrontend;

/// Discrete input events, drained once per tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    /// ENTER
    Confirm,
    /// ESC
    Escape,
    /// The window is going away (Ctrl+C in the terminal)
    Close,
    /// The surface changed size; static screens should redraw
    Resized,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const WHITE: Rgb = Rgb(255, 255, 255);
    pub const YELLOW: Rgb = Rgb(255, 255, 0);
    pub const RED: Rgb = Rgb(255, 0, 0);
}

/// One line of overlay text
#[derive(Debug, Clone, PartialEq)]
pub struct TextLine {
    pub text: String,
    pub color: Rgb,
    /// Title-sized text
    pub big: bool,
    /// Vertical position relative to the playfield center, in playfield units.
    /// `None` stacks the line in the top-left HUD.
    pub offset: Option<i32>,
}

impl TextLine {
    fn hud(text: String, color: Rgb) -> Self {
        Self {
            text,
            color,
            big: false,
            offset: None,
        }
    }

    fn centered(text: impl Into<String>, color: Rgb, big: bool, offset: i32) -> Self {
        Self {
            text: text.into(),
            color,
            big,
            offset: Some(offset),
        }
    }
}

/// What to put on screen this frame
#[derive(Debug, Clone, Copy)]
pub enum Scene<'a> {
    Start,
    Playing(&'a Session),
    GameOver { score: f64, high_score: f64 },
}

impl Scene<'_> {
    /// Text drawn over the background for this scene
    pub fn overlay(&self) -> Vec<TextLine> {
        match self {
            Scene::Start => vec![
                TextLine::centered("Meteor Dodge", Rgb::WHITE, true, -100),
                TextLine::centered(
                    "Say 'start' or press ENTER to begin. Say 'close' to exit.",
                    Rgb::WHITE,
                    false,
                    0,
                ),
            ],
            Scene::Playing(session) => {
                let record = session.record();
                vec![
                    TextLine::hud(
                        format!("Time: {}s", session.elapsed().as_secs()),
                        Rgb::WHITE,
                    ),
                    TextLine::hud(format!("Score: {}", record.display_score()), Rgb::WHITE),
                    TextLine::hud(
                        format!("High Score: {}", record.display_high_score()),
                        Rgb::YELLOW,
                    ),
                ]
            }
            Scene::GameOver { score, high_score } => vec![
                TextLine::centered("You Lost!", Rgb::RED, true, -100),
                TextLine::centered(format!("Score: {}", floor(*score)), Rgb::WHITE, false, -40),
                TextLine::centered(
                    format!("High Score: {}", floor(*high_score)),
                    Rgb::YELLOW,
                    false,
                    0,
                ),
                TextLine::centered(
                    "Say 'start again' or press ENTER to restart",
                    Rgb::WHITE,
                    false,
                    60,
                ),
                TextLine::centered("Say 'close' or press ESC to exit", Rgb::WHITE, false, 100),
            ],
        }
    }
}

fn floor(value: f64) -> u64 {
    value.max(0.0).floor() as u64
}

/// A window the game can draw into and read input from
pub trait Frontend {
    /// Drain every pending event without blocking
    fn poll_events(&mut self) -> GameResult<Vec<InputEvent>>;

    /// Arrow keys held right now
    fn held_keys(&self) -> HeldKeys;

    /// Draw one full frame
    fn draw(&mut self, scene: &Scene<'_>) -> GameResult<()>;
}

impl<F: Frontend + ?Sized> Frontend for Box<F> {
    fn poll_events(&mut self) -> GameResult<Vec<InputEvent>> {
        (**self).poll_events()
    }

    fn held_keys(&self) -> HeldKeys {
        (**self).held_keys()
    }

    fn draw(&mut self, scene: &Scene<'_>) -> GameResult<()> {
        (**self).draw(scene)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::Tuning;

    #[test]
    fn test_hud_lines() {
        let session = Session::new(Tuning::default(), 120.5);
        let lines = Scene::Playing(&session).overlay();
        let texts: Vec<&str> = lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, vec!["Time: 0s", "Score: 0", "High Score: 120"]);
        assert!(lines.iter().all(|l| l.offset.is_none()));
    }

    #[test]
    fn test_game_over_shows_floored_scores() {
        let lines = Scene::GameOver {
            score: 150.2,
            high_score: 150.2,
        }
        .overlay();
        assert!(lines.iter().any(|l| l.text == "Score: 150"));
        assert!(lines
            .iter()
            .any(|l| l.text == "High Score: 150" && l.color == Rgb::YELLOW));
    }
}
