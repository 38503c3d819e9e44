use crate::game::Tuning;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    // Speech
    pub voice_enabled: bool,
    pub vosk_model_path: String,
    pub audio_device: Option<usize>,

    // Persistence
    pub high_score_path: String,

    // Feedback
    pub sound_enabled: bool,

    // Meta
    pub log_level: String,
    pub log_file: String,

    // Gameplay
    pub tuning: Tuning,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            voice_enabled: true,
            vosk_model_path: data_dir()
                .join("models/vosk-model-small-en-us-0.15")
                .to_string_lossy()
                .to_string(),
            audio_device: None,
            high_score_path: data_dir()
                .join("high_score.txt")
                .to_string_lossy()
                .to_string(),
            sound_enabled: true,
            log_level: "INFO".to_string(),
            log_file: data_dir()
                .join("meteor-dodge.log")
                .to_string_lossy()
                .to_string(),
            tuning: Tuning::default(),
        }
    }
}

impl Config {
    /// Load config from the default location, creating it when missing
    pub fn load() -> Result<Self> {
        Self::load_from(&config_path())
    }

    /// Load config from `path`.
    ///
    /// A corrupt file is moved aside to `*.json.corrupt` and defaults are used.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            match serde_json::from_str(&content) {
                Ok(config) => Ok(config),
                Err(e) => {
                    tracing::warn!("⚠️ Config file corrupted or invalid, using defaults: {}", e);
                    let backup_path = path.with_extension("json.corrupt");
                    if let Err(e) = std::fs::rename(path, &backup_path) {
                        tracing::debug!("Could not back up corrupt config file: {}", e);
                    }
                    Ok(Self::default())
                }
            }
        } else {
            let config = Self::default();
            if let Err(e) = config.save_to(path) {
                tracing::debug!("Could not write default config to {:?}: {}", path, e);
            }
            Ok(config)
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("meteor-dodge")
        .join("config.json")
}

fn data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("meteor-dodge")
}
