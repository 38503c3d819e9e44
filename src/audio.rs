//! Audio capture module using cpal
//!
//! The cpal callback only copies each block into a bounded channel; the
//! voice listener task on the other end does the recognition work.

use crate::asr::SAMPLE_RATE;
use anyhow::{Context, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Samples per block delivered by the device
pub const BLOCK_SIZE: usize = 2048;

/// Blocks buffered between the device and the recognizer (~4s of audio)
pub const CHANNEL_CAPACITY: usize = 32;

/// A live microphone stream. Dropping it closes the stream, which in turn
/// closes the channel handed to [`AudioCapture::start`].
pub struct AudioCapture {
    _stream: cpal::Stream,
    device_name: String,
    dropped: Arc<AtomicU64>,
}

impl std::fmt::Debug for AudioCapture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioCapture")
            .field("device_name", &self.device_name)
            .finish()
    }
}

impl AudioCapture {
    /// Open the selected (or default) input device at 16 kHz mono and start
    /// pushing blocks into `tx`
    pub fn start(device_index: Option<usize>, tx: mpsc::Sender<Vec<i16>>) -> Result<Self> {
        let host = cpal::default_host();

        let device = if let Some(idx) = device_index {
            host.input_devices()?
                .nth(idx)
                .context("Device index out of range")?
        } else {
            host.default_input_device()
                .context("No default input device")?
        };

        let device_name = device.name().unwrap_or_else(|_| "Unknown".to_string());
        info!("Using audio device: {}", device_name);

        let config = cpal::StreamConfig {
            channels: 1,
            sample_rate: cpal::SampleRate(SAMPLE_RATE),
            buffer_size: cpal::BufferSize::Fixed(BLOCK_SIZE as u32),
        };

        let dropped = Arc::new(AtomicU64::new(0));
        let dropped_in_callback = dropped.clone();

        let stream = device
            .build_input_stream(
                &config,
                move |data: &[i16], _: &cpal::InputCallbackInfo| {
                    if let Err(mpsc::error::TrySendError::Full(_)) = tx.try_send(data.to_vec()) {
                        let count = dropped_in_callback.fetch_add(1, Ordering::Relaxed);
                        if count % 100 == 0 {
                            warn!("Recognizer lagging, dropped {} audio blocks", count + 1);
                        }
                    }
                },
                |err| {
                    warn!("Audio stream error: {}", err);
                },
                None,
            )
            .context("Failed to open 16kHz mono input stream")?;

        stream.play().context("Failed to start audio stream")?;
        debug!("Audio capture started on {}", device_name);

        Ok(Self {
            _stream: stream,
            device_name,
            dropped,
        })
    }

    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    /// Blocks discarded because the channel was full
    pub fn dropped_blocks(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// Names of the available input devices, in index order
pub fn list_input_devices() -> Result<Vec<String>> {
    let host = cpal::default_host();
    Ok(host
        .input_devices()?
        .map(|device| device.name().unwrap_or_else(|_| "Unknown".to_string()))
        .collect())
}

/// Bounded channel sized for the capture callback
pub fn channel() -> (mpsc::Sender<Vec<i16>>, mpsc::Receiver<Vec<i16>>) {
    mpsc::channel(CHANNEL_CAPACITY)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_is_bounded() {
        let (tx, _rx) = channel();
        for _ in 0..CHANNEL_CAPACITY {
            tx.try_send(vec![0i16; 4]).unwrap();
        }
        assert!(matches!(
            tx.try_send(vec![0i16; 4]),
            Err(mpsc::error::TrySendError::Full(_))
        ));
    }
}
