//! Background voice listener
//!
//! One listener per screen or play session. Audio blocks arrive on a
//! bounded channel from the capture callback; the listener task feeds
//! them to its recognizer and publishes whatever command it hears.

use super::{ListenMode, ScreenSignal, VoiceContext};
use crate::asr::{SpeechRecognizer, Transcript, VoskModel};
use crate::audio::{self, AudioCapture};
use anyhow::Result;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// How often an idle listener re-checks its stop conditions
pub const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Something that can start a listener for a screen
pub trait VoiceSource {
    fn listen(
        &self,
        mode: ListenMode,
        ctx: Arc<VoiceContext>,
        signal: Option<Arc<ScreenSignal>>,
    ) -> Result<VoiceListener>;
}

impl<S: VoiceSource + ?Sized> VoiceSource for Box<S> {
    fn listen(
        &self,
        mode: ListenMode,
        ctx: Arc<VoiceContext>,
        signal: Option<Arc<ScreenSignal>>,
    ) -> Result<VoiceListener> {
        (**self).listen(mode, ctx, signal)
    }
}

/// Microphone + Vosk listener factory.
///
/// The model is loaded once; each listener gets its own recognizer and
/// its own input stream.
#[derive(Debug, Clone)]
pub struct VoskVoice {
    model: VoskModel,
    device: Option<usize>,
}

impl VoskVoice {
    pub fn new(model: VoskModel, device: Option<usize>) -> Self {
        Self { model, device }
    }
}

impl VoiceSource for VoskVoice {
    fn listen(
        &self,
        mode: ListenMode,
        ctx: Arc<VoiceContext>,
        signal: Option<Arc<ScreenSignal>>,
    ) -> Result<VoiceListener> {
        let recognizer = self.model.recognizer()?;
        let (tx, rx) = audio::channel();
        let capture = AudioCapture::start(self.device, tx)?;
        info!("🎙️ Listening for voice commands ({})", mode.label());
        Ok(VoiceListener::spawn(recognizer, rx, mode, ctx, signal).with_capture(capture))
    }
}

/// Voice control switched off or unavailable; every screen runs keyboard-only
#[derive(Debug, Clone)]
pub struct NoVoice {
    reason: String,
}

impl NoVoice {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl VoiceSource for NoVoice {
    fn listen(
        &self,
        _mode: ListenMode,
        _ctx: Arc<VoiceContext>,
        _signal: Option<Arc<ScreenSignal>>,
    ) -> Result<VoiceListener> {
        Err(anyhow::anyhow!("voice control unavailable: {}", self.reason))
    }
}

/// Handle to a running listener task.
///
/// Call [`VoiceListener::shutdown`] to stop and join it. Dropping the handle
/// only signals the task, which then exits within one poll interval.
pub struct VoiceListener {
    mode: ListenMode,
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
    capture: Option<AudioCapture>,
}

impl std::fmt::Debug for VoiceListener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VoiceListener")
            .field("mode", &self.mode)
            .field("capture", &self.capture)
            .finish()
    }
}

impl VoiceListener {
    /// Start a listener task consuming `audio_rx`
    pub fn spawn<R>(
        recognizer: R,
        audio_rx: mpsc::Receiver<Vec<i16>>,
        mode: ListenMode,
        ctx: Arc<VoiceContext>,
        signal: Option<Arc<ScreenSignal>>,
    ) -> Self
    where
        R: SpeechRecognizer + 'static,
    {
        let stop = Arc::new(AtomicBool::new(false));
        let handle = tokio::spawn(listen_loop(
            recognizer,
            audio_rx,
            mode,
            ctx,
            signal,
            stop.clone(),
        ));

        Self {
            mode,
            stop,
            handle: Some(handle),
            capture: None,
        }
    }

    /// Tie the lifetime of an input stream to this listener
    pub fn with_capture(mut self, capture: AudioCapture) -> Self {
        self.capture = Some(capture);
        self
    }

    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, |h| h.is_finished())
    }

    /// Stop the task, close the input stream and wait for the task to exit
    pub async fn shutdown(mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(capture) = self.capture.take() {
            if capture.dropped_blocks() > 0 {
                debug!(
                    "{} audio blocks dropped on {}",
                    capture.dropped_blocks(),
                    capture.device_name()
                );
            }
        }
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                warn!("Voice listener ({}) ended abnormally: {}", self.mode.label(), e);
            }
        }
        debug!("Voice listener ({}) stopped", self.mode.label());
    }
}

impl Drop for VoiceListener {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
    }
}

async fn listen_loop<R: SpeechRecognizer + 'static>(
    mut recognizer: R,
    mut audio_rx: mpsc::Receiver<Vec<i16>>,
    mode: ListenMode,
    ctx: Arc<VoiceContext>,
    signal: Option<Arc<ScreenSignal>>,
    stop: Arc<AtomicBool>,
) {
    loop {
        if stop.load(Ordering::SeqCst) || !ctx.is_running() {
            break;
        }
        if signal.as_ref().is_some_and(|s| s.is_decided()) {
            break;
        }

        let block = match tokio::time::timeout(POLL_INTERVAL, audio_rx.recv()).await {
            Ok(Some(block)) => block,
            Ok(None) => {
                debug!("Audio channel closed ({})", mode.label());
                break;
            }
            // Timeout - re-check the stop conditions
            Err(_) => continue,
        };

        // Decoding blocks; keep it off the runtime workers
        let decoded = tokio::task::spawn_blocking(move || {
            let result = recognizer.accept(&block);
            (recognizer, result)
        })
        .await;
        let result = match decoded {
            Ok((returned, result)) => {
                recognizer = returned;
                result
            }
            Err(e) => {
                warn!("Recognizer task failed ({}): {}", mode.label(), e);
                break;
            }
        };

        let transcript = match result {
            Ok(transcript) => transcript,
            Err(e) => {
                debug!("Recognizer rejected audio block: {}", e);
                continue;
            }
        };

        if let Transcript::Final(text) = &transcript {
            info!("📝 You said ({}): {}", mode.label(), text);
        }

        let Some(command) = mode.interpret(&transcript) else {
            continue;
        };
        debug!("Voice command ({}): {:?}", mode.label(), command);

        match (mode, &signal) {
            (ListenMode::Gameplay, _) => ctx.apply(command),
            (_, Some(signal)) => signal.post(command),
            (_, None) => debug!("No screen signal to deliver {:?} to", command),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::voice::{VoiceCommand, VoiceDirection};
    use std::collections::VecDeque;

    /// Recognizer that replays a fixed script, one transcript per block
    struct Scripted(VecDeque<Transcript>);

    impl Scripted {
        fn new(script: Vec<Transcript>) -> Self {
            Self(script.into())
        }
    }

    impl SpeechRecognizer for Scripted {
        fn accept(&mut self, _samples: &[i16]) -> Result<Transcript> {
            Ok(self.0.pop_front().unwrap_or(Transcript::Empty))
        }

        fn reset(&mut self) {
            self.0.clear();
        }
    }

    async fn feed(tx: &mpsc::Sender<Vec<i16>>, blocks: usize) {
        for _ in 0..blocks {
            tx.send(vec![0i16; 16]).await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_gameplay_listener_publishes_direction() {
        let ctx = Arc::new(VoiceContext::new());
        let (tx, rx) = audio::channel();
        let listener = VoiceListener::spawn(
            Scripted::new(vec![
                Transcript::partial("left"),
                Transcript::Empty,
                Transcript::finalized("go right"),
            ]),
            rx,
            ListenMode::Gameplay,
            ctx.clone(),
            None,
        );

        feed(&tx, 3).await;
        drop(tx);
        listener.shutdown_when_drained().await;

        assert_eq!(ctx.direction(), VoiceDirection::Right);
        assert!(ctx.is_running());
    }

    #[tokio::test]
    async fn test_close_stops_listener_and_game() {
        let ctx = Arc::new(VoiceContext::new());
        let (tx, rx) = audio::channel();
        let listener = VoiceListener::spawn(
            Scripted::new(vec![Transcript::finalized("close")]),
            rx,
            ListenMode::Gameplay,
            ctx.clone(),
            None,
        );

        feed(&tx, 1).await;
        // Sender stays alive: the run flag alone must end the task
        listener.shutdown_when_drained().await;
        assert!(!ctx.is_running());
        drop(tx);
    }

    #[tokio::test]
    async fn test_screen_listener_posts_choice() {
        let ctx = Arc::new(VoiceContext::new());
        let signal = Arc::new(ScreenSignal::new());
        let (tx, rx) = audio::channel();
        let listener = VoiceListener::spawn(
            Scripted::new(vec![
                Transcript::partial("start"),
                Transcript::finalized("start again"),
            ]),
            rx,
            ListenMode::GameOver,
            ctx.clone(),
            Some(signal.clone()),
        );

        feed(&tx, 2).await;
        drop(tx);
        listener.shutdown_when_drained().await;
        assert_eq!(signal.choice(), Some(VoiceCommand::StartAgain));
        assert!(ctx.is_running());
    }

    #[tokio::test]
    async fn test_shutdown_without_audio() {
        let ctx = Arc::new(VoiceContext::new());
        let (_tx, rx) = audio::channel();
        let listener = VoiceListener::spawn(
            Scripted::new(Vec::new()),
            rx,
            ListenMode::StartScreen,
            ctx,
            None,
        );

        tokio::time::timeout(Duration::from_secs(1), listener.shutdown())
            .await
            .expect("listener should stop within a poll interval");
    }

    #[tokio::test]
    async fn test_listener_exits_when_run_flag_clears() {
        let ctx = Arc::new(VoiceContext::new());
        let (_tx, rx) = audio::channel();
        let listener = VoiceListener::spawn(
            Scripted::new(Vec::new()),
            rx,
            ListenMode::Gameplay,
            ctx.clone(),
            None,
        );

        ctx.request_quit();
        for _ in 0..100 {
            if listener.is_finished() {
                break;
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
        assert!(listener.is_finished());
    }

    /// Records which thread each block was decoded on
    struct ThreadRecorder(Arc<std::sync::Mutex<Vec<std::thread::ThreadId>>>);

    impl SpeechRecognizer for ThreadRecorder {
        fn accept(&mut self, _samples: &[i16]) -> Result<Transcript> {
            self.0.lock().unwrap().push(std::thread::current().id());
            Ok(Transcript::Empty)
        }

        fn reset(&mut self) {}
    }

    #[tokio::test]
    async fn test_decoding_runs_off_the_runtime_thread() {
        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        let (tx, rx) = audio::channel();
        let listener = VoiceListener::spawn(
            ThreadRecorder(seen.clone()),
            rx,
            ListenMode::Gameplay,
            Arc::new(VoiceContext::new()),
            None,
        );

        feed(&tx, 3).await;
        drop(tx);
        listener.shutdown_when_drained().await;

        // The test runtime is single-threaded, so its worker is this thread
        let runtime_thread = std::thread::current().id();
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 3);
        assert!(seen.iter().all(|id| *id != runtime_thread));
    }

    #[test]
    fn test_no_voice_refuses_to_listen() {
        let source = NoVoice::new("disabled by --no-voice");
        let err = source
            .listen(ListenMode::Gameplay, Arc::new(VoiceContext::new()), None)
            .unwrap_err();
        assert!(err.to_string().contains("--no-voice"));
    }

    impl VoiceListener {
        /// Wait for the task to exit on its own (senders dropped or a stop
        /// condition reached), then join it
        async fn shutdown_when_drained(self) {
            for _ in 0..200 {
                if self.is_finished() {
                    break;
                }
                tokio::time::sleep(POLL_INTERVAL).await;
            }
            assert!(self.is_finished(), "listener did not finish on its own");
            self.shutdown().await;
        }
    }
}
