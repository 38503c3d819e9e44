//! Mock ASR for Testing
//!
//! Provides scripted recognizers and a voice source that hands them out.

use anyhow::Result;
use meteor_dodge::asr::{SpeechRecognizer, Transcript};
use meteor_dodge::audio;
use meteor_dodge::voice::{ListenMode, ScreenSignal, VoiceContext, VoiceListener, VoiceSource};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Recognizer that returns one scripted transcript per audio block
pub struct MockRecognizer {
    /// Queue of transcripts to return
    script: VecDeque<Transcript>,
    /// Record all audio blocks received (for verification)
    pub received_blocks: Arc<Mutex<Vec<Vec<i16>>>>,
}

impl MockRecognizer {
    pub fn new(script: Vec<Transcript>) -> Self {
        Self {
            script: script.into(),
            received_blocks: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Create a mock that finalizes a single phrase
    pub fn with_phrase(text: &str) -> Self {
        Self::new(vec![Transcript::finalized(text)])
    }
}

impl SpeechRecognizer for MockRecognizer {
    fn accept(&mut self, samples: &[i16]) -> Result<Transcript> {
        if let Ok(mut blocks) = self.received_blocks.lock() {
            blocks.push(samples.to_vec());
        }
        Ok(self.script.pop_front().unwrap_or(Transcript::Empty))
    }

    fn reset(&mut self) {
        self.script.clear();
    }
}

/// Voice source backed by scripted recognizers.
///
/// Each `listen` call for a mode consumes the next script queued for that
/// mode; modes without a script get a listener that hears nothing.
#[derive(Default)]
pub struct MockVoice {
    scripts: Mutex<HashMap<ListenMode, VecDeque<Vec<Transcript>>>>,
    failing: bool,
    /// Delay before each scripted phrase; `None` delivers them all at once
    gap: Option<Duration>,
    /// Modes a listener was opened for, in order
    pub opened: Mutex<Vec<ListenMode>>,
}

impl MockVoice {
    pub fn new() -> Self {
        Self::default()
    }

    /// A voice source whose device never opens
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    /// Speak each scripted phrase `gap` after the previous one
    pub fn with_gap(mut self, gap: Duration) -> Self {
        self.gap = Some(gap);
        self
    }

    /// Queue what the next listener for `mode` will hear
    pub fn script(self, mode: ListenMode, phrases: &[&str]) -> Self {
        let transcripts = phrases.iter().map(|p| Transcript::finalized(p)).collect();
        self.scripts
            .lock()
            .unwrap()
            .entry(mode)
            .or_default()
            .push_back(transcripts);
        self
    }

    pub fn opened(&self) -> Vec<ListenMode> {
        self.opened.lock().unwrap().clone()
    }
}

impl VoiceSource for MockVoice {
    fn listen(
        &self,
        mode: ListenMode,
        ctx: Arc<VoiceContext>,
        signal: Option<Arc<ScreenSignal>>,
    ) -> Result<VoiceListener> {
        if self.failing {
            anyhow::bail!("No default input device");
        }
        self.opened.lock().unwrap().push(mode);

        let script = self
            .scripts
            .lock()
            .unwrap()
            .get_mut(&mode)
            .and_then(|queue| queue.pop_front())
            .unwrap_or_default();

        // One block per scripted transcript, then the "device" goes quiet
        let (tx, rx) = audio::channel();
        let blocks = script.len();
        match self.gap {
            None => {
                for _ in 0..blocks {
                    tx.try_send(vec![0i16; 2048])?;
                }
            }
            Some(gap) => {
                tokio::spawn(async move {
                    for _ in 0..blocks {
                        tokio::time::sleep(gap).await;
                        if tx.send(vec![0i16; 2048]).await.is_err() {
                            break;
                        }
                    }
                });
            }
        }

        Ok(VoiceListener::spawn(
            MockRecognizer::new(script),
            rx,
            mode,
            ctx,
            signal,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_recognizer_replays_script() {
        let mut mock = MockRecognizer::with_phrase("go left");
        let blocks = mock.received_blocks.clone();
        assert_eq!(
            mock.accept(&[0i16; 100]).unwrap(),
            Transcript::Final("go left".to_string())
        );
        assert_eq!(mock.accept(&[0i16; 100]).unwrap(), Transcript::Empty);
        assert_eq!(blocks.lock().unwrap().len(), 2);
    }
}
