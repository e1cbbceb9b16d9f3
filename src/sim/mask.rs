//! Pixel coverage masks for exact collision
//!
//! A mask is a packed boolean grid, one bit per pixel, rows padded to whole
//! `u64` words. Bits past `width` in each row are always zero so whole words
//! can be ANDed without trimming.

use glam::IVec2;

/// Alpha values above this count as solid
pub const ALPHA_THRESHOLD: u8 = 127;

const WORD_BITS: u32 = 64;

/// A per-pixel opacity mask
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mask {
    width: u32,
    height: u32,
    /// Words per row
    stride: u32,
    bits: Vec<u64>,
}

impl Mask {
    /// An empty (fully transparent) mask
    pub fn new(width: u32, height: u32) -> Self {
        let stride = width.div_ceil(WORD_BITS);
        Self {
            width,
            height,
            stride,
            bits: vec![0; (stride * height) as usize],
        }
    }

    /// A fully solid mask
    pub fn filled(width: u32, height: u32) -> Self {
        Self::from_fn(width, height, |_, _| true)
    }

    /// Build a mask by sampling a predicate at every pixel
    pub fn from_fn(width: u32, height: u32, mut solid: impl FnMut(u32, u32) -> bool) -> Self {
        let mut mask = Self::new(width, height);
        for y in 0..height {
            for x in 0..width {
                if solid(x, y) {
                    mask.set(x, y, true);
                }
            }
        }
        mask
    }

    /// Build a mask from a row-major alpha channel.
    ///
    /// Missing samples (a short buffer) are treated as transparent.
    pub fn from_alpha(width: u32, height: u32, alpha: &[u8]) -> Self {
        Self::from_fn(width, height, |x, y| {
            alpha
                .get((y * width + x) as usize)
                .is_some_and(|&a| a > ALPHA_THRESHOLD)
        })
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Read a pixel (out of bounds reads as transparent)
    pub fn get(&self, x: u32, y: u32) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        let word = self.bits[(y * self.stride + x / WORD_BITS) as usize];
        word >> (x % WORD_BITS) & 1 == 1
    }

    /// Write a pixel (out of bounds writes are ignored)
    pub fn set(&mut self, x: u32, y: u32, solid: bool) {
        if x >= self.width || y >= self.height {
            return;
        }
        let word = &mut self.bits[(y * self.stride + x / WORD_BITS) as usize];
        let bit = 1u64 << (x % WORD_BITS);
        if solid {
            *word |= bit;
        } else {
            *word &= !bit;
        }
    }

    /// Number of solid pixels
    pub fn count(&self) -> u32 {
        self.bits.iter().map(|w| w.count_ones()).sum()
    }

    /// 64 bits of row `y` starting at column `x`; columns past the row read as 0
    fn row_bits(&self, y: u32, x: u32) -> u64 {
        let start = (y * self.stride) as usize;
        let row = &self.bits[start..start + self.stride as usize];
        let index = (x / WORD_BITS) as usize;
        let shift = x % WORD_BITS;
        let lo = row.get(index).copied().unwrap_or(0) >> shift;
        if shift == 0 {
            lo
        } else {
            lo | row.get(index + 1).copied().unwrap_or(0) << (WORD_BITS - shift)
        }
    }

    /// True if any solid pixel of `other`, placed with its top-left corner at
    /// `offset` relative to this mask's top-left, lands on a solid pixel here.
    pub fn overlaps(&self, other: &Mask, offset: IVec2) -> bool {
        // Bounding-box reject
        let x0 = offset.x.max(0);
        let y0 = offset.y.max(0);
        let x1 = (offset.x + other.width as i32).min(self.width as i32);
        let y1 = (offset.y + other.height as i32).min(self.height as i32);
        if x0 >= x1 || y0 >= y1 {
            return false;
        }

        for y in y0..y1 {
            let other_y = (y - offset.y) as u32;
            let mut x = x0;
            while x < x1 {
                let span = (x1 - x).min(WORD_BITS as i32) as u32;
                let keep = if span == WORD_BITS { u64::MAX } else { (1u64 << span) - 1 };
                let a = self.row_bits(y as u32, x as u32);
                let b = other.row_bits(other_y, (x - offset.x) as u32);
                if a & b & keep != 0 {
                    return true;
                }
                x += WORD_BITS as i32;
            }
        }
        false
    }

    /// Mirror top to bottom
    pub fn flipped_vertical(&self) -> Self {
        Self::from_fn(self.width, self.height, |x, y| self.get(x, self.height - 1 - y))
    }

    /// Rotate counter-clockwise on screen by `degrees`, growing the canvas to
    /// the rotated bounding box. Nearest-neighbour sampling about the centre.
    pub fn rotated(&self, degrees: f32) -> Self {
        if !degrees.is_finite() || degrees.rem_euclid(360.0) == 0.0 {
            return self.clone();
        }

        let (sin, cos) = degrees.to_radians().sin_cos();
        let (w, h) = (self.width as f32, self.height as f32);
        // Shave float noise so a quarter turn does not grow by a pixel
        let out_w = (w * cos.abs() + h * sin.abs() - 1e-3).ceil().max(1.0) as u32;
        let out_h = (w * sin.abs() + h * cos.abs() - 1e-3).ceil().max(1.0) as u32;

        let src_cx = w / 2.0;
        let src_cy = h / 2.0;
        let dst_cx = out_w as f32 / 2.0;
        let dst_cy = out_h as f32 / 2.0;

        // Screen y points down, so a visual CCW turn of a source point (x, y)
        // lands at (x cos + y sin, -x sin + y cos). Sample with the inverse.
        Self::from_fn(out_w, out_h, |u, v| {
            let du = u as f32 + 0.5 - dst_cx;
            let dv = v as f32 + 0.5 - dst_cy;
            let sx = du * cos - dv * sin + src_cx;
            let sy = du * sin + dv * cos + src_cy;
            sx >= 0.0 && sy >= 0.0 && self.get(sx as u32, sy as u32)
        })
    }
}
