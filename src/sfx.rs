//! Sound effects
//!
//! rodio's output stream is not `Send`, so a dedicated audio thread owns
//! it and receives effects over a channel.

use rodio::buffer::SamplesBuffer;
use rodio::source::{self, SineWave};
use rodio::Source;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

const SAMPLE_RATE: u32 = 44_100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    Start,
    Collision,
    NewHighScore,
}

/// Commands sent to the audio thread
enum SoundCommand {
    Play(Effect),
}

/// Thread-safe handle to the sound engine.
///
/// A muted engine has no thread and ignores every request.
#[derive(Clone)]
pub struct SoundEngine {
    sender: Option<mpsc::Sender<SoundCommand>>,
}

impl std::fmt::Debug for SoundEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SoundEngine")
            .field("enabled", &self.sender.is_some())
            .finish()
    }
}

impl SoundEngine {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::channel::<SoundCommand>();

        // Spawn dedicated audio thread
        thread::spawn(move || {
            Self::audio_thread(receiver);
        });

        Self {
            sender: Some(sender),
        }
    }

    pub fn muted() -> Self {
        Self { sender: None }
    }

    fn audio_thread(receiver: mpsc::Receiver<SoundCommand>) {
        use rodio::OutputStream;

        // Initialize audio output on this thread
        let (stream, stream_handle) = match OutputStream::try_default() {
            Ok(s) => s,
            Err(e) => {
                warn!("🔇 Failed to initialize audio output: {}", e);
                return;
            }
        };

        // Keep stream alive
        let _stream = stream;
        info!("🔊 Audio thread started");

        while let Ok(cmd) = receiver.recv() {
            match cmd {
                SoundCommand::Play(effect) => {
                    debug!("🔊 Playing {:?}", effect);
                    match rodio::Sink::try_new(&stream_handle) {
                        Ok(sink) => {
                            sink.append(effect_source(effect));
                            sink.detach();
                        }
                        Err(e) => warn!("❌ Failed to create audio sink: {}", e),
                    }
                }
            }
        }

        info!("🔇 Audio thread stopped");
    }

    /// Queue an effect; never blocks and never fails the caller
    pub fn play(&self, effect: Effect) {
        if let Some(sender) = &self.sender {
            if sender.send(SoundCommand::Play(effect)).is_err() {
                debug!("Audio thread gone, dropping {:?}", effect);
            }
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.sender.is_some()
    }
}

/// A playable, finite source for an effect
pub fn effect_source(effect: Effect) -> Box<dyn Source<Item = f32> + Send> {
    match effect {
        Effect::Start => Box::new(notes(&[440.0, 660.0], 0.1)),
        Effect::NewHighScore => Box::new(notes(&[523.0, 659.0, 784.0, 1047.0], 0.1)),
        Effect::Collision => Box::new(SamplesBuffer::new(
            1,
            SAMPLE_RATE,
            sweep(400.0, 60.0, 0.45),
        )),
    }
}

/// Short sine notes played one after another
fn notes(freqs: &[f32], len: f32) -> impl Source<Item = f32> + Send {
    let tones: Vec<_> = freqs
        .iter()
        .map(|&freq| {
            let mut tone = SineWave::new(freq).take_duration(Duration::from_secs_f32(len));
            tone.set_filter_fadeout();
            tone.amplify(0.15)
        })
        .collect();
    source::from_iter(tones)
}

/// Falling sawtooth
fn sweep(from: f32, to: f32, len: f32) -> Vec<f32> {
    let mut phase = 0.0f32;
    (0..seconds(len))
        .map(|i| {
            let t = i as f32 / SAMPLE_RATE as f32;
            let freq = from + (to - from) * (t / len);
            phase = (phase + freq / SAMPLE_RATE as f32).fract();
            (phase * 2.0 - 1.0) * 0.15 * (1.0 - t / len)
        })
        .collect()
}

fn seconds(s: f32) -> usize {
    (SAMPLE_RATE as f32 * s) as usize
}
