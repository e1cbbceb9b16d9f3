//! Sprite footprints
//!
//! The sim never touches pixels directly; it only needs the coverage of each
//! sprite. An asset loader builds these from image alpha with
//! [`Mask::from_alpha`]; headless runs use the procedural shapes below.

use super::mask::Mask;
use crate::tuning::Tuning;

/// Number of plane animation frames
pub const PLANE_FRAMES: usize = 3;

/// Collision masks for every sprite the session spawns
#[derive(Debug, Clone)]
pub struct Sprites {
    /// Plane animation frames (all the same size)
    pub plane_frames: Vec<Mask>,
    pub coin: Mask,
    /// Floor-anchored obstacle; the ceiling variant is mirrored at spawn
    pub obstacle: Mask,
    pub cloud: Mask,
    /// Width of one background tile
    pub background_width: f32,
}

impl Sprites {
    /// Procedural shapes sized relative to the window
    pub fn procedural(tuning: &Tuning) -> Self {
        let scale = tuning.window_width / 480.0;
        let px = |v: f32| ((v * scale).round() as u32).max(1);

        let (plane_w, plane_h) = (px(88.0), px(73.0) / 2);
        // Fuselage ellipse; the wing strip moves with the flap frame
        let plane_frames = (0..PLANE_FRAMES)
            .map(|frame| {
                let wing_y = plane_h as f32 * (0.25 + 0.25 * frame as f32);
                Mask::from_fn(plane_w, plane_h, |x, y| {
                    let nx = (x as f32 + 0.5) / plane_w as f32 * 2.0 - 1.0;
                    let ny = (y as f32 + 0.5) / plane_h as f32 * 2.0 - 1.0;
                    let body = nx * nx + ny * ny * 2.5 <= 1.0;
                    let wing = (y as f32 - wing_y).abs() < 2.0
                        && (x as f32) > plane_w as f32 * 0.3
                        && (x as f32) < plane_w as f32 * 0.6;
                    body || wing
                })
            })
            .collect();

        let coin_d = px(32.0);
        let r = coin_d as f32 / 2.0;
        let coin = Mask::from_fn(coin_d, coin_d, |x, y| {
            let dx = x as f32 + 0.5 - r;
            let dy = y as f32 + 0.5 - r;
            dx * dx + dy * dy <= r * r
        });

        // Rock spire: wide at the base, pointed at the top
        let (obs_w, obs_h) = (px(70.0), px(300.0));
        let obstacle = Mask::from_fn(obs_w, obs_h, |x, y| {
            let half = obs_w as f32 / 2.0 * (y as f32 + 1.0) / obs_h as f32;
            (x as f32 + 0.5 - obs_w as f32 / 2.0).abs() <= half
        });

        let cloud = Mask::filled(px(120.0), px(50.0));

        Self {
            plane_frames,
            coin,
            obstacle,
            cloud,
            background_width: tuning.window_width,
        }
    }

    /// Size of a plane frame in pixels
    pub fn plane_size(&self) -> (u32, u32) {
        self.plane_frames
            .first()
            .map(|m| (m.width(), m.height()))
            .unwrap_or((0, 0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_procedural_shapes_are_solid() {
        let sprites = Sprites::procedural(&Tuning::default());
        assert_eq!(sprites.plane_frames.len(), PLANE_FRAMES);
        for frame in &sprites.plane_frames {
            assert!(frame.count() > 0);
            assert_eq!((frame.width(), frame.height()), sprites.plane_size());
        }
        assert!(sprites.coin.count() > 0);
        assert!(sprites.cloud.count() > 0);
        // Spire base is wider than its tip
        let base = (0..sprites.obstacle.width())
            .filter(|&x| sprites.obstacle.get(x, sprites.obstacle.height() - 1))
            .count();
        let tip = (0..sprites.obstacle.width())
            .filter(|&x| sprites.obstacle.get(x, 0))
            .count();
        assert!(base > tip);
    }
}
