//! Terminal frontend using crossterm
//!
//! The playfield is scaled onto the terminal and drawn with half-block
//! characters, giving two pixels per character cell.

use super::{Frontend, InputEvent, Rgb, Scene, TextLine};
use crate::error::GameResult;
use crate::game::{HeldKeys, Rect, Session, Tuning};
use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, KeyboardEnhancementFlags,
    PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
};
use crossterm::style::{self, Attribute, Color};
use crossterm::{cursor, execute, queue, terminal};
use std::io::{self, Stdout, Write};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Without release events a key counts as held this long after its last
/// press or auto-repeat
const KEY_HOLD: Duration = Duration::from_millis(180);

const SKY_TOP: Rgb = Rgb(8, 10, 32);
const SKY_BOTTOM: Rgb = Rgb(40, 22, 60);
const STAR: Rgb = Rgb(200, 200, 230);
const PLAYER: Rgb = Rgb(80, 200, 255);
const PLAYER_COCKPIT: Rgb = Rgb(230, 250, 255);
const METEOR: Rgb = Rgb(170, 90, 40);
const METEOR_CORE: Rgb = Rgb(255, 150, 60);

/// Tracks which arrow keys are down
#[derive(Debug)]
pub struct KeyTracker {
    reports_release: bool,
    left: Option<Instant>,
    right: Option<Instant>,
}

impl KeyTracker {
    pub fn new(reports_release: bool) -> Self {
        Self {
            reports_release,
            left: None,
            right: None,
        }
    }

    /// Update held state from a key event, returning a discrete event if any
    pub fn on_key(&mut self, key: &KeyEvent, now: Instant) -> Option<InputEvent> {
        let pressed = matches!(key.kind, KeyEventKind::Press | KeyEventKind::Repeat);

        match key.code {
            KeyCode::Left => {
                self.left = pressed.then_some(now);
                None
            }
            KeyCode::Right => {
                self.right = pressed.then_some(now);
                None
            }
            KeyCode::Enter if key.kind == KeyEventKind::Press => Some(InputEvent::Confirm),
            KeyCode::Esc if key.kind == KeyEventKind::Press => Some(InputEvent::Escape),
            KeyCode::Char('c')
                if key.kind == KeyEventKind::Press
                    && key.modifiers.contains(KeyModifiers::CONTROL) =>
            {
                Some(InputEvent::Close)
            }
            _ => None,
        }
    }

    pub fn held(&self, now: Instant) -> HeldKeys {
        let active = |since: Option<Instant>| match since {
            Some(_) if self.reports_release => true,
            Some(at) => now.duration_since(at) < KEY_HOLD,
            None => false,
        };
        HeldKeys {
            left: active(self.left),
            right: active(self.right),
        }
    }
}

/// Pixel grid with two rows per terminal line
struct PixelBuf {
    w: usize,
    h: usize,
    px: Vec<Rgb>,
}

impl PixelBuf {
    fn new(w: usize, h: usize) -> Self {
        Self {
            w,
            h,
            px: vec![SKY_TOP; w * h],
        }
    }

    fn resize(&mut self, w: usize, h: usize) {
        self.w = w;
        self.h = h;
        self.px.resize(w * h, SKY_TOP);
    }

    fn set(&mut self, x: i32, y: i32, c: Rgb) {
        if x >= 0 && y >= 0 && (x as usize) < self.w && (y as usize) < self.h {
            self.px[y as usize * self.w + x as usize] = c;
        }
    }

    fn get(&self, x: usize, y: usize) -> Rgb {
        self.px[y * self.w + x]
    }

    fn fill_rect(&mut self, x: i32, y: i32, w: i32, h: i32, c: Rgb) {
        for dy in 0..h {
            for dx in 0..w {
                self.set(x + dx, y + dy, c);
            }
        }
    }

    fn render(&self, out: &mut impl Write) -> io::Result<()> {
        queue!(out, cursor::MoveTo(0, 0))?;
        let rows = self.h / 2;
        for row in 0..rows {
            queue!(out, cursor::MoveTo(0, row as u16))?;
            let mut prev: Option<(Rgb, Rgb)> = None;
            for col in 0..self.w {
                let top = self.get(col, row * 2);
                let bot = self.get(col, row * 2 + 1);
                if prev != Some((top, bot)) {
                    queue!(
                        out,
                        style::SetForegroundColor(color(top)),
                        style::SetBackgroundColor(color(bot))
                    )?;
                    prev = Some((top, bot));
                }
                queue!(out, style::Print('\u{2580}'))?; // ▀
            }
        }
        queue!(out, style::ResetColor)
    }
}

fn color(c: Rgb) -> Color {
    Color::Rgb {
        r: c.0,
        g: c.1,
        b: c.2,
    }
}

fn lerp(a: u8, b: u8, t: f32) -> u8 {
    (a as f32 + (b as f32 - a as f32) * t).round() as u8
}

/// Maps playfield units onto the pixel grid
#[derive(Debug, Clone, Copy)]
struct Viewport {
    field_w: i32,
    field_h: i32,
    px_w: i32,
    px_h: i32,
}

impl Viewport {
    fn x(&self, x: i32) -> i32 {
        (x as i64 * self.px_w as i64 / self.field_w as i64) as i32
    }

    fn y(&self, y: i32) -> i32 {
        (y as i64 * self.px_h as i64 / self.field_h as i64) as i32
    }

    /// Pixel rectangle covering `rect`, at least one pixel each way
    fn rect(&self, rect: &Rect) -> (i32, i32, i32, i32) {
        let x0 = self.x(rect.x);
        let y0 = self.y(rect.y);
        let w = (self.x(rect.right()) - x0).max(1);
        let h = (self.y(rect.bottom()) - y0).max(1);
        (x0, y0, w, h)
    }
}

/// Full-screen terminal canvas. Restores the terminal when dropped.
pub struct TerminalFrontend {
    out: Stdout,
    buf: PixelBuf,
    cols: u16,
    rows: u16,
    field_w: i32,
    field_h: i32,
    keys: KeyTracker,
    enhanced: bool,
}

impl TerminalFrontend {
    /// Take over the terminal: raw mode, alternate screen, hidden cursor
    pub fn new(tuning: &Tuning) -> GameResult<Self> {
        terminal::enable_raw_mode()?;
        let mut out = io::stdout();
        execute!(
            out,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            terminal::DisableLineWrap,
        )?;

        // Release events make held arrows exact; not every terminal has them
        let enhanced = matches!(terminal::supports_keyboard_enhancement(), Ok(true));
        if enhanced {
            execute!(
                out,
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            )?;
        }
        debug!("Keyboard release events: {}", enhanced);

        let (cols, rows) = terminal::size()?;
        Ok(Self {
            out,
            buf: PixelBuf::new(cols as usize, rows as usize * 2),
            cols,
            rows,
            field_w: tuning.width,
            field_h: tuning.height,
            keys: KeyTracker::new(enhanced),
            enhanced,
        })
    }

    fn viewport(&self) -> Viewport {
        Viewport {
            field_w: self.field_w,
            field_h: self.field_h,
            px_w: self.buf.w as i32,
            px_h: self.buf.h as i32,
        }
    }

    fn paint_background(&mut self) {
        let (w, h) = (self.buf.w, self.buf.h);
        for y in 0..h {
            let t = if h > 1 { y as f32 / (h - 1) as f32 } else { 0.0 };
            let sky = Rgb(
                lerp(SKY_TOP.0, SKY_BOTTOM.0, t),
                lerp(SKY_TOP.1, SKY_BOTTOM.1, t),
                lerp(SKY_TOP.2, SKY_BOTTOM.2, t),
            );
            for x in 0..w {
                // Fixed pseudo-random starfield
                let hash = (x as u32).wrapping_mul(73_856_093) ^ (y as u32).wrapping_mul(19_349_663);
                let c = if hash % 97 == 0 { STAR } else { sky };
                self.buf.set(x as i32, y as i32, c);
            }
        }
    }

    fn paint_session(&mut self, session: &Session) {
        let view = self.viewport();

        for meteor in session.obstacles() {
            let (x, y, w, h) = view.rect(&meteor.rect);
            self.buf.fill_rect(x, y, w, h, METEOR);
            if w > 2 && h > 2 {
                self.buf.fill_rect(x + 1, y + 1, w - 2, h - 2, METEOR_CORE);
            }
        }

        let (x, y, w, h) = view.rect(&session.player().rect);
        self.buf.fill_rect(x, y, w, h, PLAYER);
        if w > 2 {
            self.buf.fill_rect(x + w / 2 - 1, y, 2.min(w), (h / 3).max(1), PLAYER_COCKPIT);
        }
    }

    fn print_overlay(&mut self, lines: &[TextLine]) -> io::Result<()> {
        let mut hud_row = 0u16;
        for line in lines {
            let text = if line.big {
                line.text.to_uppercase()
            } else {
                line.text.clone()
            };
            let len = text.chars().count() as u16;

            let (col, row) = match line.offset {
                None => {
                    hud_row += 1;
                    (1, hud_row - 1)
                }
                Some(offset) => {
                    let y = (self.field_h / 2 + offset).clamp(0, self.field_h - 1);
                    let row = (y as i64 * self.rows as i64 / self.field_h as i64) as u16;
                    (self.cols.saturating_sub(len) / 2, row)
                }
            };

            queue!(
                self.out,
                cursor::MoveTo(col, row),
                style::SetForegroundColor(color(line.color)),
                style::SetBackgroundColor(Color::Reset),
            )?;
            if line.big {
                queue!(self.out, style::SetAttribute(Attribute::Bold))?;
            }
            queue!(
                self.out,
                style::Print(&text),
                style::SetAttribute(Attribute::Reset)
            )?;
        }
        queue!(self.out, style::ResetColor)
    }
}

impl Frontend for TerminalFrontend {
    fn poll_events(&mut self) -> GameResult<Vec<InputEvent>> {
        let mut events = Vec::new();
        while event::poll(Duration::ZERO)? {
            match event::read()? {
                Event::Key(key) => {
                    if let Some(ev) = self.keys.on_key(&key, Instant::now()) {
                        events.push(ev);
                    }
                }
                Event::Resize(cols, rows) => {
                    self.cols = cols;
                    self.rows = rows;
                    self.buf.resize(cols as usize, rows as usize * 2);
                    queue!(self.out, terminal::Clear(terminal::ClearType::All))?;
                    events.push(InputEvent::Resized);
                }
                _ => {}
            }
        }
        Ok(events)
    }

    fn held_keys(&self) -> HeldKeys {
        self.keys.held(Instant::now())
    }

    fn draw(&mut self, scene: &Scene<'_>) -> GameResult<()> {
        self.paint_background();
        if let Scene::Playing(session) = scene {
            self.paint_session(session);
        }
        self.buf.render(&mut self.out)?;
        self.print_overlay(&scene.overlay())?;
        self.out.flush()?;
        Ok(())
    }
}

impl Drop for TerminalFrontend {
    fn drop(&mut self) {
        if self.enhanced {
            let _ = execute!(self.out, PopKeyboardEnhancementFlags);
        }
        let result = execute!(
            self.out,
            style::ResetColor,
            terminal::LeaveAlternateScreen,
            cursor::Show,
            terminal::EnableLineWrap,
        )
        .and_then(|_| terminal::disable_raw_mode());
        if let Err(e) = result {
            warn!("Failed to restore terminal: {}", e);
        }
    }
}
