//! ASR backend using Vosk

use super::{SpeechRecognizer, Transcript, SAMPLE_RATE};
use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};
use vosk::{Model, Recognizer};

/// A loaded Vosk model, shared by every recognizer the game creates
#[derive(Clone)]
pub struct VoskModel {
    model: Arc<Model>,
}

impl std::fmt::Debug for VoskModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VoskModel").finish()
    }
}

impl VoskModel {
    /// Load the model directory at `path`
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(anyhow::anyhow!("Vosk model not found at {}", path.display()));
        }

        // Kaldi logs to stderr, which would scribble over the terminal canvas
        vosk::set_log_level(vosk::LogLevel::Error);

        info!("Loading Vosk model from: {}", path.display());

        let model_str = path.to_str().ok_or_else(|| {
            anyhow::anyhow!("Vosk model path is not valid UTF-8: {}", path.display())
        })?;

        let model = Model::new(model_str).context("Failed to load Vosk model")?;

        Ok(Self {
            model: Arc::new(model),
        })
    }

    /// Create a fresh recognizer with its own decoding state
    pub fn recognizer(&self) -> Result<VoskRecognizer> {
        let recognizer = Recognizer::new(&self.model, SAMPLE_RATE as f32)
            .context("Failed to create Vosk recognizer")?;
        Ok(VoskRecognizer { recognizer })
    }
}

/// Vosk-based recognizer
pub struct VoskRecognizer {
    recognizer: Recognizer,
}

impl SpeechRecognizer for VoskRecognizer {
    fn accept(&mut self, samples: &[i16]) -> Result<Transcript> {
        match self.recognizer.accept_waveform(samples) {
            vosk::DecodingState::Finalized => {
                let result = self.recognizer.result();
                Ok(result
                    .single()
                    .map(|single| Transcript::finalized(single.text))
                    .unwrap_or(Transcript::Empty))
            }
            vosk::DecodingState::Running => {
                Ok(Transcript::partial(self.recognizer.partial_result().partial))
            }
            vosk::DecodingState::Failed => {
                debug!("Decoding failed for this chunk");
                Ok(Transcript::Empty)
            }
        }
    }

    fn reset(&mut self) {
        self.recognizer.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_model_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = VoskModel::load(&dir.path().join("no-such-model")).unwrap_err();
        assert!(err.to_string().contains("Vosk model not found"));
    }
}
