//! Voice commands
//!
//! Turns transcripts into game intents and holds the state shared between
//! listener tasks and the render loop.

pub mod listener;

use crate::asr::Transcript;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};
use tracing::info;

pub use listener::{NoVoice, VoiceListener, VoiceSource, VoskVoice};

/// Most recent movement intent heard
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum VoiceDirection {
    #[default]
    None,
    Left,
    Right,
}

/// A keyword recognized in a transcript
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceCommand {
    Close,
    Stop,
    Left,
    Right,
    Start,
    StartAgain,
}

/// Which screen a listener serves; decides the keywords it reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListenMode {
    Gameplay,
    StartScreen,
    GameOver,
}

/// Keywords checked in priority order; earlier entries win
const GAMEPLAY_KEYWORDS: &[(&str, VoiceCommand)] = &[
    ("close", VoiceCommand::Close),
    ("stop", VoiceCommand::Stop),
    ("left", VoiceCommand::Left),
    ("right", VoiceCommand::Right),
];

const START_KEYWORDS: &[(&str, VoiceCommand)] = &[
    ("start", VoiceCommand::Start),
    ("close", VoiceCommand::Close),
];

const GAME_OVER_KEYWORDS: &[(&str, VoiceCommand)] = &[
    ("start again", VoiceCommand::StartAgain),
    ("close", VoiceCommand::Close),
];

impl ListenMode {
    /// Map a transcript to a command.
    ///
    /// Gameplay reacts to partial transcripts too; the screens only act on
    /// finalized utterances.
    pub fn interpret(self, transcript: &Transcript) -> Option<VoiceCommand> {
        let keywords = match (self, transcript) {
            (_, Transcript::Empty) => return None,
            (ListenMode::Gameplay, _) => GAMEPLAY_KEYWORDS,
            (_, Transcript::Partial(_)) => return None,
            (ListenMode::StartScreen, Transcript::Final(_)) => START_KEYWORDS,
            (ListenMode::GameOver, Transcript::Final(_)) => GAME_OVER_KEYWORDS,
        };

        let text = transcript.text()?;
        keywords
            .iter()
            .find(|(word, _)| text.contains(*word))
            .map(|&(_, command)| command)
    }

    pub fn label(self) -> &'static str {
        match self {
            ListenMode::Gameplay => "game",
            ListenMode::StartScreen => "start screen",
            ListenMode::GameOver => "game over",
        }
    }
}

/// State shared by the render loop and every listener task.
///
/// The direction sits behind a mutex so reads never tear; the run flag is
/// an atomic that any input source may clear.
#[derive(Debug)]
pub struct VoiceContext {
    direction: Mutex<VoiceDirection>,
    running: AtomicBool,
}

impl Default for VoiceContext {
    fn default() -> Self {
        Self::new()
    }
}

impl VoiceContext {
    pub fn new() -> Self {
        Self {
            direction: Mutex::new(VoiceDirection::None),
            running: AtomicBool::new(true),
        }
    }

    pub fn direction(&self) -> VoiceDirection {
        *self
            .direction
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_direction(&self, direction: VoiceDirection) {
        *self
            .direction
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = direction;
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Clear the run flag; every loop and listener winds down
    pub fn request_quit(&self) {
        if self.running.swap(false, Ordering::SeqCst) {
            info!("🛑 Quit requested");
        }
    }

    /// Apply a gameplay command. Later commands overwrite earlier ones.
    pub fn apply(&self, command: VoiceCommand) {
        match command {
            VoiceCommand::Close => self.request_quit(),
            VoiceCommand::Stop => self.set_direction(VoiceDirection::None),
            VoiceCommand::Left => self.set_direction(VoiceDirection::Left),
            VoiceCommand::Right => self.set_direction(VoiceDirection::Right),
            VoiceCommand::Start | VoiceCommand::StartAgain => {}
        }
    }
}

/// Screen-local decision slot written by a screen's listener
#[derive(Debug, Default)]
pub struct ScreenSignal {
    choice: Mutex<Option<VoiceCommand>>,
}

impl ScreenSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `command` unless a decision was already made
    pub fn post(&self, command: VoiceCommand) {
        let mut choice = self.choice.lock().unwrap_or_else(PoisonError::into_inner);
        if choice.is_none() {
            *choice = Some(command);
        }
    }

    pub fn choice(&self) -> Option<VoiceCommand> {
        *self.choice.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_decided(&self) -> bool {
        self.choice().is_some()
    }
}
