//! High score persistence
//!
//! The high score lives in a plain text file holding a single decimal
//! number. A missing file means no high score yet.

use crate::error::{GameError, GameResult};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Reads and writes the persisted high score
#[derive(Debug, Clone)]
pub struct HighScoreStore {
    path: PathBuf,
}

impl HighScoreStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the high score, treating a missing or corrupt file as zero.
    ///
    /// A corrupt file is renamed to `*.corrupt` so the next save starts clean.
    pub fn load(&self) -> f64 {
        match self.try_load() {
            Ok(score) => score,
            Err(GameError::HighScore(msg)) => {
                warn!("⚠️ High score file unreadable, starting from 0: {}", msg);
                let backup = self.path.with_extension("corrupt");
                if let Err(e) = std::fs::rename(&self.path, &backup) {
                    debug!("Could not back up corrupt high score file: {}", e);
                }
                0.0
            }
            Err(e) => {
                warn!("⚠️ Could not read high score, starting from 0: {}", e);
                0.0
            }
        }
    }

    /// Load the high score, surfacing parse failures
    pub fn try_load(&self) -> GameResult<f64> {
        if !self.path.exists() {
            debug!("No high score file at {:?}", self.path);
            return Ok(0.0);
        }

        let content = std::fs::read_to_string(&self.path)?;
        parse_score(&content)
    }

    /// Overwrite the file with `score`
    pub fn save(&self, score: f64) -> GameResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(&self.path, score.to_string())?;
        info!("🏆 Saved high score {:.1} to {:?}", score, self.path);
        Ok(())
    }
}

fn parse_score(content: &str) -> GameResult<f64> {
    let trimmed = content.trim();
    let score: f64 = trimmed
        .parse()
        .map_err(|e| GameError::HighScore(format!("'{}' is not a number: {}", trimmed, e)))?;

    if !score.is_finite() || score < 0.0 {
        return Err(GameError::HighScore(format!(
            "'{}' is not a valid score",
            trimmed
        )));
    }
    Ok(score)
}

/// Score of the running session plus the best score seen so far
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScoreRecord {
    pub score: f64,
    pub high_score: f64,
}

impl ScoreRecord {
    pub fn new(high_score: f64) -> Self {
        Self {
            score: 0.0,
            high_score,
        }
    }

    /// Whole seconds shown on screen
    pub fn display_score(&self) -> u64 {
        self.score.max(0.0).floor() as u64
    }

    pub fn display_high_score(&self) -> u64 {
        self.high_score.max(0.0).floor() as u64
    }

    /// Settle the final score, persisting it when it beats the high score.
    ///
    /// Returns true when a new high score was recorded.
    pub fn settle(&mut self, store: &HighScoreStore) -> bool {
        if self.score <= self.high_score {
            return false;
        }

        self.high_score = self.score;
        if let Err(e) = store.save(self.score) {
            warn!("⚠️ Failed to persist high score: {}", e);
        }
        true
    }
}
