#![allow(dead_code)]

pub mod mock_asr;
pub mod mock_frontend;

use meteor_dodge::game::Tuning;
use meteor_dodge::score::HighScoreStore;
use tempfile::TempDir;

pub struct TestContext {
    pub temp_dir: TempDir,
    pub store: HighScoreStore,
}

impl TestContext {
    pub fn new() -> Self {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let store = HighScoreStore::new(temp_dir.path().join("high_score.txt"));
        Self { temp_dir, store }
    }

    /// Start from an existing high score on disk
    pub fn with_high_score(score: f64) -> Self {
        let ctx = Self::new();
        ctx.store.save(score).expect("Failed to seed high score");
        ctx
    }
}

/// Tuning where every meteor spans most of the field, so the first batch
/// always lands on the player within a few dozen ticks
pub fn deadly_tuning() -> Tuning {
    Tuning {
        obstacle_width: 900,
        obstacle_speed: 50,
        spawn_interval_ms: 200,
        spawn_interval_step_ms: 0,
        spawn_interval_floor_ms: 200,
        batch_size: 1,
        ..Tuning::default()
    }
}
