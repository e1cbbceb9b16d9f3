//! Scrolling entities
//!
//! Everything but the plane drifts left at a fixed per-kind speed. Scrollers
//! kill themselves once they are well past the left edge; that is the only
//! cleanup path.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::entity::{Footprint, Footprinted, Mortal, Rect, Update};
use super::mask::Mask;
use super::sprites::Sprites;
use crate::consts::DESPAWN_X;
use crate::tuning::Tuning;

/// Which edge an obstacle grows from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Anchor {
    Floor,
    Ceiling,
}

/// Spawnable entity kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScrollerKind {
    Coin,
    Obstacle { anchor: Anchor },
    Cloud,
}

/// A coin, obstacle or cloud
#[derive(Debug, Clone)]
pub struct Scroller {
    pub id: u32,
    pub kind: ScrollerKind,
    /// Top-left corner
    pub pos: Vec2,
    /// Leftward speed (pixels/s)
    pub speed: f32,
    mask: Mask,
    alive: bool,
}

impl Scroller {
    pub fn new(id: u32, kind: ScrollerKind, pos: Vec2, speed: f32, mask: Mask) -> Self {
        Self {
            id,
            kind,
            pos,
            speed,
            mask,
            alive: true,
        }
    }

    /// Spawn a coin just past the right edge, around mid-height
    pub fn spawn_coin(id: u32, rng: &mut impl Rng, sprites: &Sprites, tuning: &Tuning) -> Self {
        let center = spawn_center(rng, tuning);
        let mask = sprites.coin.clone();
        let pos = center - half_size(&mask);
        Self::new(id, ScrollerKind::Coin, pos, tuning.coin_speed, mask)
    }

    /// Spawn a cloud just past the right edge with a random drift speed
    pub fn spawn_cloud(id: u32, rng: &mut impl Rng, sprites: &Sprites, tuning: &Tuning) -> Self {
        let center = spawn_center(rng, tuning);
        let speed = if tuning.cloud_speed_min < tuning.cloud_speed_max {
            rng.random_range(tuning.cloud_speed_min..tuning.cloud_speed_max)
        } else {
            tuning.cloud_speed_min
        };
        let mask = sprites.cloud.clone();
        let pos = center - half_size(&mask);
        Self::new(id, ScrollerKind::Cloud, pos, speed, mask)
    }

    /// Spawn an obstacle hanging from the ceiling or rising from the floor
    pub fn spawn_obstacle(
        id: u32,
        rng: &mut impl Rng,
        sprites: &Sprites,
        tuning: &Tuning,
    ) -> Self {
        let anchor = if rng.random_bool(0.5) {
            Anchor::Floor
        } else {
            Anchor::Ceiling
        };
        let x = tuning.window_width + jitter(rng, tuning.spawn_jitter_x);
        // Sink the base a little past the edge so the spire looks rooted
        let sink = rng.random_range(10.0..50.0);
        let (mask, y) = match anchor {
            Anchor::Floor => {
                let mask = sprites.obstacle.clone();
                let y = tuning.window_height + sink - mask.height() as f32;
                (mask, y)
            }
            Anchor::Ceiling => (sprites.obstacle.flipped_vertical(), -sink),
        };
        let pos = Vec2::new(x - mask.width() as f32 / 2.0, y);
        Self::new(
            id,
            ScrollerKind::Obstacle { anchor },
            pos,
            tuning.obstacle_speed,
            mask,
        )
    }

    pub fn rect(&self) -> Rect {
        Rect::new(
            self.pos.x,
            self.pos.y,
            self.mask.width() as f32,
            self.mask.height() as f32,
        )
    }
}

impl Update for Scroller {
    fn update(&mut self, dt: f32) {
        if !self.alive {
            return;
        }
        self.pos.x -= self.speed * crate::sanitize_dt(dt);
        if self.rect().right() < DESPAWN_X {
            self.alive = false;
        }
    }
}

impl Footprinted for Scroller {
    fn footprint(&self) -> Footprint<'_> {
        Footprint::new(self.pos, &self.mask)
    }
}

impl Mortal for Scroller {
    fn is_alive(&self) -> bool {
        self.alive
    }

    fn kill(&mut self) {
        self.alive = false;
    }
}

fn jitter(rng: &mut impl Rng, (lo, hi): (f32, f32)) -> f32 {
    if lo < hi { rng.random_range(lo..hi) } else { lo }
}

fn spawn_center(rng: &mut impl Rng, tuning: &Tuning) -> Vec2 {
    let x = tuning.window_width + jitter(rng, tuning.spawn_jitter_x);
    let spread = tuning.spawn_jitter_y.abs();
    let y = tuning.window_height / 2.0 + jitter(rng, (-spread, spread));
    Vec2::new(x, y)
}

fn half_size(mask: &Mask) -> Vec2 {
    Vec2::new(mask.width() as f32, mask.height() as f32) / 2.0
}

/// Endless background strip: two copies of one tile side by side
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Background {
    /// Horizontal offset of the strip's left edge (always in `(-tile, 0]`)
    pub offset: f32,
    pub tile_width: f32,
    pub speed: f32,
}

impl Background {
    pub fn new(tile_width: f32, speed: f32) -> Self {
        Self {
            offset: 0.0,
            tile_width,
            speed,
        }
    }

    /// Center of the double-width strip
    #[inline]
    pub fn center_x(&self) -> f32 {
        self.offset + self.tile_width
    }
}

impl Update for Background {
    fn update(&mut self, dt: f32) {
        self.offset -= self.speed * crate::sanitize_dt(dt);
        // Both halves are identical, so snapping back is invisible
        if self.center_x() <= 0.0 {
            self.offset = 0.0;
        }
    }
}
