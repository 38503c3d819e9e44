//! Playfield geometry: rectangles, the player sprite and falling meteors.

/// Axis-aligned rectangle in playfield units
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    pub fn right(&self) -> i32 {
        self.x + self.w
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.h
    }

    /// True when both axes overlap by a non-zero amount.
    /// Rectangles that only share an edge do not overlap.
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }
}

/// The player-controlled sprite
#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    pub rect: Rect,
    max_x: i32,
}

impl Player {
    /// Place the player on the bottom edge, horizontally centered
    pub fn new(field_width: i32, field_height: i32, width: i32, height: i32) -> Self {
        let max_x = (field_width - width).max(0);
        Self {
            rect: Rect::new((field_width / 2).min(max_x), field_height - height, width, height),
            max_x,
        }
    }

    /// Shift horizontally by `dx`, clamped into `[0, field_width - width]`
    pub fn shift(&mut self, dx: i32) {
        self.rect.x = (self.rect.x + dx).clamp(0, self.max_x);
    }

    pub fn max_x(&self) -> i32 {
        self.max_x
    }
}

/// A falling meteor
#[derive(Debug, Clone, PartialEq)]
pub struct Obstacle {
    pub rect: Rect,
    pub velocity: i32,
}

impl Obstacle {
    /// A meteor whose bottom edge sits on the top of the playfield
    pub fn above(x: i32, width: i32, height: i32, velocity: i32) -> Self {
        Self {
            rect: Rect::new(x, -height, width, height),
            velocity,
        }
    }

    pub fn fall(&mut self) {
        self.rect.y += self.velocity;
    }

    /// The bottom edge has passed the bottom of the playfield
    pub fn is_below(&self, field_height: i32) -> bool {
        self.rect.bottom() > field_height
    }
}
