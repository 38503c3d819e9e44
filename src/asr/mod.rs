//! ASR (Automatic Speech Recognition) Module
//!
//! The game only needs two things from a recognizer: a finalized
//! transcript when an utterance ends, and the in-progress partial
//! transcript otherwise. Vosk is the shipped backend.

pub mod vosk;

use anyhow::Result;

// Re-export main types
pub use self::vosk::{VoskModel, VoskRecognizer};

/// Sample rate every recognizer is fed at
pub const SAMPLE_RATE: u32 = 16000;

/// What the recognizer made of the audio so far
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transcript {
    /// The utterance ended and this is its final text
    Final(String),
    /// The utterance is still going; best guess so far
    Partial(String),
    /// Nothing recognized yet
    Empty,
}

impl Transcript {
    /// Build a transcript from raw recognizer text, collapsing blanks to `Empty`
    pub fn finalized(text: &str) -> Self {
        match extract_text(text) {
            Some(text) => Transcript::Final(text),
            None => Transcript::Empty,
        }
    }

    pub fn partial(text: &str) -> Self {
        match extract_text(text) {
            Some(text) => Transcript::Partial(text),
            None => Transcript::Empty,
        }
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            Transcript::Final(text) | Transcript::Partial(text) => Some(text),
            Transcript::Empty => None,
        }
    }
}

/// Trait for stateful speech recognizers fed with 16 kHz mono audio
pub trait SpeechRecognizer: Send {
    /// Feed one block of samples and report the current transcript
    fn accept(&mut self, samples: &[i16]) -> Result<Transcript>;

    /// Drop any partially decoded utterance
    fn reset(&mut self);
}

impl<R: SpeechRecognizer + ?Sized> SpeechRecognizer for Box<R> {
    fn accept(&mut self, samples: &[i16]) -> Result<Transcript> {
        (**self).accept(samples)
    }

    fn reset(&mut self) {
        (**self).reset()
    }
}

/// Extract text from a recognizer result, filtering empty results
fn extract_text(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_lowercase())
    }
}
