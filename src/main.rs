//! Meteor Dodge - dodge falling meteors by keyboard or by voice
//!
//! Arrow keys move the ship; saying "left", "right" or "stop" does too.

use anyhow::{Context, Result};
use clap::Parser;
use meteor_dodge::app::App;
use meteor_dodge::asr::VoskModel;
use meteor_dodge::audio;
use meteor_dodge::config::Config;
use meteor_dodge::frontend::TerminalFrontend;
use meteor_dodge::score::HighScoreStore;
use meteor_dodge::sfx::SoundEngine;
use meteor_dodge::voice::{NoVoice, VoiceSource, VoskVoice};
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Audio input device index (see --list-devices)
    #[arg(short, long)]
    device: Option<usize>,

    /// Path to the Vosk model directory
    #[arg(long)]
    model: Option<PathBuf>,

    /// Where the high score is kept
    #[arg(long)]
    high_score_file: Option<PathBuf>,

    /// Keyboard only, do not open the microphone
    #[arg(long)]
    no_voice: bool,

    /// Disable sound effects
    #[arg(long)]
    mute: bool,

    /// Use this config file instead of the default one
    #[arg(long)]
    config: Option<PathBuf>,

    /// Seed for meteor placement
    #[arg(long)]
    seed: Option<u64>,

    /// Print the audio input devices and exit
    #[arg(long)]
    list_devices: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if args.list_devices {
        for (i, name) in audio::list_input_devices()?.iter().enumerate() {
            println!("  [{}] {}", i, name);
        }
        return Ok(());
    }

    let mut config = match &args.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    apply_overrides(&mut config, &args);
    config.tuning.validate()?;

    init_logging(&config)?;
    info!("☄️ Meteor Dodge v{} starting...", env!("CARGO_PKG_VERSION"));

    let store = HighScoreStore::new(&config.high_score_path);
    info!("High score file: {:?}", store.path());

    let sound = if config.sound_enabled {
        SoundEngine::new()
    } else {
        SoundEngine::muted()
    };

    let voice = voice_source(&config);
    let frontend = TerminalFrontend::new(&config.tuning)?;

    let mut app = App::new(frontend, voice, store, config.tuning.clone()).with_sound(sound);
    if let Some(seed) = args.seed {
        app = app.with_seed(seed);
    }

    let result = app.run().await;
    // Restore the terminal before any error gets printed
    drop(app);
    result?;
    Ok(())
}

fn apply_overrides(config: &mut Config, args: &Args) {
    if let Some(device) = args.device {
        config.audio_device = Some(device);
    }
    if let Some(model) = &args.model {
        config.vosk_model_path = model.to_string_lossy().to_string();
    }
    if let Some(path) = &args.high_score_file {
        config.high_score_path = path.to_string_lossy().to_string();
    }
    if args.no_voice {
        config.voice_enabled = false;
    }
    if args.mute {
        config.sound_enabled = false;
    }
    if args.verbose {
        config.log_level = "DEBUG".to_string();
    }
}

/// Logs go to a file; the terminal belongs to the game
fn init_logging(config: &Config) -> Result<()> {
    let path = PathBuf::from(&config.log_file);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("Failed to open log file {}", path.display()))?;

    let level = config.log_level.to_lowercase();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to set up logging: {}", e))?;
    Ok(())
}

fn voice_source(config: &Config) -> Box<dyn VoiceSource> {
    if !config.voice_enabled {
        info!("🔇 Voice control disabled");
        return Box::new(NoVoice::new("disabled in config"));
    }

    match VoskModel::load(&PathBuf::from(&config.vosk_model_path)) {
        Ok(model) => Box::new(VoskVoice::new(model, config.audio_device)),
        Err(e) => {
            warn!("⚠️ Voice control unavailable, playing keyboard only: {:#}", e);
            Box::new(NoVoice::new(e.to_string()))
        }
    }
}
