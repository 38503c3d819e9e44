//! Screen flow and the play loop
//!
//! `App::run` walks Start -> Playing -> GameOver and loops back to Playing
//! on restart with a brand new `Session`.

use crate::error::GameResult;
use crate::frontend::{Frontend, InputEvent, Scene};
use crate::game::{Session, TickInput, TickOutcome, Tuning};
use crate::score::{HighScoreStore, ScoreRecord};
use crate::screens::{self, ScreenChoice};
use crate::sfx::{Effect, SoundEngine};
use crate::voice::{ListenMode, VoiceContext, VoiceDirection, VoiceSource};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// How a play session ended
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SessionEnd {
    /// Hit a meteor with this final record
    Collision(ScoreRecord),
    /// The run flag was cleared mid-game
    Quit,
}

pub struct App<F, V> {
    frontend: F,
    voice: V,
    store: HighScoreStore,
    sound: SoundEngine,
    tuning: Tuning,
    ctx: Arc<VoiceContext>,
    rng: StdRng,
}

impl<F: Frontend, V: VoiceSource> App<F, V> {
    pub fn new(frontend: F, voice: V, store: HighScoreStore, tuning: Tuning) -> Self {
        Self {
            frontend,
            voice,
            store,
            sound: SoundEngine::muted(),
            tuning,
            ctx: Arc::new(VoiceContext::new()),
            rng: StdRng::from_entropy(),
        }
    }

    pub fn with_sound(mut self, sound: SoundEngine) -> Self {
        self.sound = sound;
        self
    }

    /// Make meteor placement reproducible
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn context(&self) -> Arc<VoiceContext> {
        self.ctx.clone()
    }

    pub fn frontend(&self) -> &F {
        &self.frontend
    }

    pub fn voice(&self) -> &V {
        &self.voice
    }

    /// Run until the player quits
    pub async fn run(&mut self) -> GameResult<()> {
        let choice = screens::start_screen(&mut self.frontend, &self.voice, &self.ctx).await?;
        if choice == ScreenChoice::Quit {
            info!("👋 Closed from the start screen");
            return Ok(());
        }

        let mut round = 0u32;
        loop {
            round += 1;
            info!("🚀 Round {} starting", round);

            let record = match self.play().await? {
                SessionEnd::Collision(record) => record,
                SessionEnd::Quit => break,
            };

            let choice = screens::game_over_screen(
                &mut self.frontend,
                &self.voice,
                &self.ctx,
                record.score,
                record.high_score,
            )
            .await?;
            if choice == ScreenChoice::Quit {
                break;
            }
        }

        info!("👋 Goodbye after {} round(s)", round);
        Ok(())
    }

    /// Play one session from a fresh state until collision or quit
    pub async fn play(&mut self) -> GameResult<SessionEnd> {
        let mut session = Session::new(self.tuning.clone(), self.store.load());
        self.ctx.set_direction(VoiceDirection::None);
        self.sound.play(Effect::Start);

        let listener = match self
            .voice
            .listen(ListenMode::Gameplay, self.ctx.clone(), None)
        {
            Ok(listener) => Some(listener),
            Err(e) => {
                warn!("⚠️ Voice control unavailable, keyboard only: {}", e);
                None
            }
        };

        let result = self.play_loop(&mut session).await;

        if let Some(listener) = listener {
            listener.shutdown().await;
        }
        result
    }

    async fn play_loop(&mut self, session: &mut Session) -> GameResult<SessionEnd> {
        let mut ticker = tokio::time::interval(self.tuning.tick_duration());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let started = Instant::now();
        let mut last = started;

        while self.ctx.is_running() {
            ticker.tick().await;
            let now = Instant::now();
            let dt_ms = now.duration_since(last).as_millis() as u64;
            last = now;

            for event in self.frontend.poll_events()? {
                match event {
                    InputEvent::Escape | InputEvent::Close => self.ctx.request_quit(),
                    InputEvent::Confirm | InputEvent::Resized => {}
                }
            }
            if !self.ctx.is_running() {
                break;
            }

            let input = TickInput {
                dt_ms,
                elapsed: now.duration_since(started),
                keys: self.frontend.held_keys(),
                voice: self.ctx.direction(),
            };

            if session.tick(&input, &mut self.rng) == TickOutcome::Collision {
                return Ok(SessionEnd::Collision(self.finish(session)));
            }

            self.frontend.draw(&Scene::Playing(session))?;
        }

        debug!("Play loop stopped by run flag");
        Ok(SessionEnd::Quit)
    }

    fn finish(&mut self, session: &mut Session) -> ScoreRecord {
        self.sound.play(Effect::Collision);

        let record = session.record_mut();
        let previous = record.high_score;
        if record.settle(&self.store) {
            info!(
                "🏆 New high score {:.1} (was {:.1})",
                record.score, previous
            );
            self.sound.play(Effect::NewHighScore);
        } else {
            info!("💥 Hit after {:.1}s", record.score);
        }
        *record
    }
}
