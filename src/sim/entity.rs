//! Entity capabilities
//!
//! Anything the session simulates picks the capabilities it needs:
//! per-frame [`Update`], a collision [`Footprint`], and a finite lifetime
//! through [`Mortal`].

use glam::{IVec2, Vec2};
use serde::{Deserialize, Serialize};

use super::mask::Mask;

/// Advances internal state by `dt` seconds of wall-clock time
pub trait Update {
    fn update(&mut self, dt: f32);
}

/// Exposes a pixel-accurate collision footprint
pub trait Footprinted {
    fn footprint(&self) -> Footprint<'_>;
}

/// Finite lifetime. Once dead, an entity stays dead.
pub trait Mortal {
    fn is_alive(&self) -> bool;
    fn kill(&mut self);
}

/// Axis-aligned bounds in screen space (y down)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    #[inline]
    pub fn left(&self) -> f32 {
        self.x
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    #[inline]
    pub fn top(&self) -> f32 {
        self.y
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.w / 2.0, self.y + self.h / 2.0)
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.left() < other.right()
            && other.left() < self.right()
            && self.top() < other.bottom()
            && other.top() < self.bottom()
    }
}

/// A mask placed in the world
#[derive(Debug, Clone, Copy)]
pub struct Footprint<'a> {
    /// Top-left corner in screen space
    pub origin: Vec2,
    pub mask: &'a Mask,
}

impl<'a> Footprint<'a> {
    pub fn new(origin: Vec2, mask: &'a Mask) -> Self {
        Self { origin, mask }
    }

    /// Bounds of the mask canvas
    pub fn rect(&self) -> Rect {
        Rect::new(
            self.origin.x,
            self.origin.y,
            self.mask.width() as f32,
            self.mask.height() as f32,
        )
    }

    /// Pixel origin, rounded like a sprite blit
    #[inline]
    pub fn pixel_origin(&self) -> IVec2 {
        self.origin.round().as_ivec2()
    }

    /// Pixel-exact overlap test
    pub fn overlaps(&self, other: &Footprint<'_>) -> bool {
        let offset = other.pixel_origin() - self.pixel_origin();
        self.mask.overlaps(other.mask, offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_edges() {
        let rect = Rect::new(10.0, 20.0, 30.0, 40.0);
        assert_eq!(rect.right(), 40.0);
        assert_eq!(rect.bottom(), 60.0);
        assert_eq!(rect.center(), Vec2::new(25.0, 40.0));
        assert!(rect.intersects(&Rect::new(39.0, 59.0, 5.0, 5.0)));
        assert!(!rect.intersects(&Rect::new(40.0, 20.0, 5.0, 5.0)));
    }

    #[test]
    fn test_footprint_overlap_uses_world_offsets() {
        let solid = Mask::filled(10, 10);
        let a = Footprint::new(Vec2::new(100.0, 100.0), &solid);
        let touching = Footprint::new(Vec2::new(109.0, 100.0), &solid);
        let apart = Footprint::new(Vec2::new(110.0, 100.0), &solid);
        assert!(a.overlaps(&touching));
        assert!(touching.overlaps(&a));
        assert!(!a.overlaps(&apart));
    }

    #[test]
    fn test_footprint_rounds_like_blit() {
        let solid = Mask::filled(4, 4);
        let a = Footprint::new(Vec2::new(0.0, 0.0), &solid);
        // 3.6 rounds to 4: just past the edge
        let b = Footprint::new(Vec2::new(3.6, 0.0), &solid);
        assert!(!a.overlaps(&b));
        let c = Footprint::new(Vec2::new(3.4, 0.0), &solid);
        assert!(a.overlaps(&c));
    }
}
