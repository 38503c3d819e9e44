//! Start and game-over screens
//!
//! Each screen draws once, then waits for ENTER/ESC/window close or for
//! its own voice listener to hear a decision.

use crate::error::GameResult;
use crate::frontend::{Frontend, InputEvent, Scene};
use crate::voice::{ListenMode, ScreenSignal, VoiceCommand, VoiceContext, VoiceSource};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// How often a waiting screen checks keyboard and voice
pub const SCREEN_POLL: Duration = Duration::from_millis(10);

/// Outcome of a waiting screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenChoice {
    Play,
    Quit,
}

/// Title screen: ENTER or "start" plays, ESC, window close or "close" quits
pub async fn start_screen<F, V>(
    frontend: &mut F,
    voice: &V,
    ctx: &Arc<VoiceContext>,
) -> GameResult<ScreenChoice>
where
    F: Frontend + ?Sized,
    V: VoiceSource + ?Sized,
{
    wait_for_choice(frontend, voice, ctx, ListenMode::StartScreen, Scene::Start).await
}

/// Shown after a collision: ENTER or "start again" restarts
pub async fn game_over_screen<F, V>(
    frontend: &mut F,
    voice: &V,
    ctx: &Arc<VoiceContext>,
    score: f64,
    high_score: f64,
) -> GameResult<ScreenChoice>
where
    F: Frontend + ?Sized,
    V: VoiceSource + ?Sized,
{
    let scene = Scene::GameOver { score, high_score };
    wait_for_choice(frontend, voice, ctx, ListenMode::GameOver, scene).await
}

async fn wait_for_choice<F, V>(
    frontend: &mut F,
    voice: &V,
    ctx: &Arc<VoiceContext>,
    mode: ListenMode,
    scene: Scene<'_>,
) -> GameResult<ScreenChoice>
where
    F: Frontend + ?Sized,
    V: VoiceSource + ?Sized,
{
    let signal = Arc::new(ScreenSignal::new());
    let listener = match voice.listen(mode, ctx.clone(), Some(signal.clone())) {
        Ok(listener) => Some(listener),
        Err(e) => {
            warn!("⚠️ Voice unavailable on {} screen, keyboard only: {}", mode.label(), e);
            None
        }
    };

    let result = poll_choice(frontend, ctx, &signal, &scene).await;

    // Released on every exit path, including errors
    if let Some(listener) = listener {
        listener.shutdown().await;
    }

    let choice = result?;
    info!("{} screen: {:?}", mode.label(), choice);
    Ok(choice)
}

async fn poll_choice<F: Frontend + ?Sized>(
    frontend: &mut F,
    ctx: &VoiceContext,
    signal: &ScreenSignal,
    scene: &Scene<'_>,
) -> GameResult<ScreenChoice> {
    frontend.draw(scene)?;
    let mut ticker = tokio::time::interval(SCREEN_POLL);

    loop {
        ticker.tick().await;

        for event in frontend.poll_events()? {
            match event {
                InputEvent::Confirm => return Ok(ScreenChoice::Play),
                InputEvent::Escape | InputEvent::Close => {
                    ctx.request_quit();
                    return Ok(ScreenChoice::Quit);
                }
                InputEvent::Resized => frontend.draw(scene)?,
            }
        }

        match signal.choice() {
            Some(VoiceCommand::Start | VoiceCommand::StartAgain) => return Ok(ScreenChoice::Play),
            Some(VoiceCommand::Close) => {
                ctx.request_quit();
                return Ok(ScreenChoice::Quit);
            }
            Some(other) => debug!("Ignoring {:?} on a waiting screen", other),
            None => {}
        }

        if !ctx.is_running() {
            return Ok(ScreenChoice::Quit);
        }
    }
}
