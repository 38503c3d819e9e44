//! Game state and per-tick update
//!
//! A `Session` owns everything that belongs to one play-through: the
//! player, the meteors, the spawn timer and the score. The play loop
//! feeds it one `TickInput` per frame and reacts to the `TickOutcome`.

pub mod entities;

use crate::error::{GameError, GameResult};
use crate::score::ScoreRecord;
use crate::voice::VoiceDirection;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

pub use entities::{Obstacle, Player, Rect};

/// Gameplay constants, all in playfield units, milliseconds or ticks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub width: i32,
    pub height: i32,
    pub player_width: i32,
    pub player_height: i32,
    pub obstacle_width: i32,
    pub obstacle_height: i32,
    /// Pixels per tick while an arrow key is held
    pub keyboard_speed: i32,
    /// Pixels per tick while a voice direction is active
    pub voice_speed: i32,
    pub obstacle_speed: i32,
    pub spawn_interval_ms: u64,
    pub spawn_interval_step_ms: u64,
    pub spawn_interval_floor_ms: u64,
    pub batch_size: usize,
    pub target_fps: u32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            width: 1000,
            height: 800,
            player_width: 60,
            player_height: 80,
            obstacle_width: 30,
            obstacle_height: 40,
            keyboard_speed: 5,
            voice_speed: 3,
            obstacle_speed: 2,
            spawn_interval_ms: 2000,
            spawn_interval_step_ms: 50,
            spawn_interval_floor_ms: 200,
            batch_size: 3,
            target_fps: 60,
        }
    }
}

impl Tuning {
    /// Reject values that would make the playfield unplayable
    pub fn validate(&self) -> GameResult<()> {
        if self.width <= self.player_width || self.width <= self.obstacle_width {
            return Err(GameError::Config(format!(
                "playfield width {} must exceed sprite widths",
                self.width
            )));
        }
        if self.height <= self.player_height {
            return Err(GameError::Config(format!(
                "playfield height {} must exceed player height {}",
                self.height, self.player_height
            )));
        }
        if self.obstacle_speed <= 0 {
            return Err(GameError::Config("obstacle_speed must be positive".into()));
        }
        if self.spawn_interval_floor_ms == 0 || self.spawn_interval_ms < self.spawn_interval_floor_ms
        {
            return Err(GameError::Config(
                "spawn interval must start at or above a non-zero floor".into(),
            ));
        }
        if self.target_fps == 0 {
            return Err(GameError::Config("target_fps must be positive".into()));
        }
        Ok(())
    }

    pub fn tick_duration(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.target_fps as f64)
    }
}

/// Arrow keys currently held down
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeldKeys {
    pub left: bool,
    pub right: bool,
}

/// Everything one tick needs from the outside world
#[derive(Debug, Clone, Copy)]
pub struct TickInput {
    /// Milliseconds since the previous tick
    pub dt_ms: u64,
    /// Wall-clock time since the session started
    pub elapsed: Duration,
    pub keys: HeldKeys,
    pub voice: VoiceDirection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Running,
    Collision,
}

/// State of one play-through
#[derive(Debug, Clone)]
pub struct Session {
    tuning: Tuning,
    player: Player,
    obstacles: Vec<Obstacle>,
    spawn_interval_ms: u64,
    spawn_timer_ms: u64,
    elapsed: Duration,
    record: ScoreRecord,
}

impl Session {
    pub fn new(tuning: Tuning, high_score: f64) -> Self {
        let player = Player::new(
            tuning.width,
            tuning.height,
            tuning.player_width,
            tuning.player_height,
        );
        Self {
            spawn_interval_ms: tuning.spawn_interval_ms,
            tuning,
            player,
            obstacles: Vec::new(),
            spawn_timer_ms: 0,
            elapsed: Duration::ZERO,
            record: ScoreRecord::new(high_score),
        }
    }

    /// Advance the session by one frame
    pub fn tick<R: Rng + ?Sized>(&mut self, input: &TickInput, rng: &mut R) -> TickOutcome {
        self.spawn_timer_ms += input.dt_ms;
        self.elapsed = self.elapsed.max(input.elapsed);
        self.record.score = self.elapsed.as_secs_f64();

        if self.spawn_timer_ms > self.spawn_interval_ms {
            self.spawn_batch(rng);
            self.spawn_interval_ms = self
                .spawn_interval_ms
                .saturating_sub(self.tuning.spawn_interval_step_ms)
                .max(self.tuning.spawn_interval_floor_ms);
            self.spawn_timer_ms = 0;
        }

        self.move_player(input.keys, input.voice);

        if self.advance_obstacles() {
            TickOutcome::Collision
        } else {
            TickOutcome::Running
        }
    }

    /// Drop a batch of meteors at distinct random columns above the field
    pub fn spawn_batch<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let columns = (self.tuning.width - self.tuning.obstacle_width + 1).max(1) as usize;
        let count = self.tuning.batch_size.min(columns);

        for x in rand::seq::index::sample(rng, columns, count) {
            self.obstacles.push(Obstacle::above(
                x as i32,
                self.tuning.obstacle_width,
                self.tuning.obstacle_height,
                self.tuning.obstacle_speed,
            ));
        }
        debug!(
            "Spawned {} meteors, next batch in {}ms",
            count, self.spawn_interval_ms
        );
    }

    /// Apply keyboard and voice movement. Each source is clamped on its own
    /// and both apply in the same tick.
    pub fn move_player(&mut self, keys: HeldKeys, voice: VoiceDirection) {
        let speed = self.tuning.keyboard_speed;
        if keys.left {
            self.player.shift(-speed);
        }
        if keys.right {
            self.player.shift(speed);
        }

        let speed = self.tuning.voice_speed;
        match voice {
            VoiceDirection::Left => self.player.shift(-speed),
            VoiceDirection::Right => self.player.shift(speed),
            VoiceDirection::None => {}
        }
    }

    /// Move every meteor down, dropping the ones that left the field.
    ///
    /// Returns true on the first meteor that hits the player; the rest are
    /// left untouched for this tick.
    pub fn advance_obstacles(&mut self) -> bool {
        let height = self.tuning.height;
        let player = self.player.rect;
        let mut i = 0;

        while i < self.obstacles.len() {
            let meteor = &mut self.obstacles[i];
            meteor.fall();
            if meteor.is_below(height) {
                self.obstacles.swap_remove(i);
                continue;
            }
            if meteor.rect.overlaps(&player) {
                return true;
            }
            i += 1;
        }
        false
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    pub fn obstacles_mut(&mut self) -> &mut Vec<Obstacle> {
        &mut self.obstacles
    }

    pub fn spawn_interval_ms(&self) -> u64 {
        self.spawn_interval_ms
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn record(&self) -> &ScoreRecord {
        &self.record
    }

    pub fn record_mut(&mut self) -> &mut ScoreRecord {
        &mut self.record
    }
}
