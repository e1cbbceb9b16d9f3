//! The player's glider
//!
//! Gravity pulls it down, thrust snaps its vertical velocity upward, and the
//! nose pitch follows the velocity through a first-order low-pass filter.

use glam::Vec2;

use super::entity::{Footprint, Footprinted, Update};
use super::mask::Mask;
use crate::tuning::Tuning;

/// Plane physics constants, copied out of [`Tuning`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaneParams {
    pub gravity: f32,
    pub thrust: f32,
    pub rotation_gain: f32,
    pub rotation_smoothing: f32,
    pub animation_rate: f32,
    /// Lowest allowed y of the sprite's top edge
    pub min_y: f32,
    /// Highest allowed y of the sprite's top edge
    pub max_y: f32,
    /// Where the plane rests between episodes
    pub home: Vec2,
}

impl PlaneParams {
    pub fn from_tuning(tuning: &Tuning, frame_size: (u32, u32)) -> Self {
        let height = frame_size.1 as f32;
        let min_y = tuning.top_margin;
        let max_y = (tuning.window_height - tuning.bottom_margin - height).max(min_y);
        // Mid-left of the window, vertically centred
        let home = Vec2::new(
            tuning.window_width / 20.0,
            (tuning.window_height / 2.0 - height / 2.0).clamp(min_y, max_y),
        );
        Self {
            gravity: tuning.gravity,
            thrust: tuning.thrust,
            rotation_gain: tuning.rotation_gain,
            rotation_smoothing: tuning.rotation_smoothing,
            animation_rate: tuning.animation_rate,
            min_y,
            max_y,
            home,
        }
    }
}

/// The glider
#[derive(Debug, Clone)]
pub struct Plane {
    /// Top-left of the unrotated frame
    pub pos: Vec2,
    /// Vertical velocity (pixels/s, positive is down)
    pub velocity: f32,
    /// Degrees, positive is nose up
    pub rotation_current: f32,
    pub rotation_target: f32,
    /// Fractional animation frame
    pub frame_phase: f32,
    thrusting: bool,
    params: PlaneParams,
    frames: Vec<Mask>,
    /// Current frame rotated by `rotation_current`
    mask: Mask,
}

impl Plane {
    /// Create a plane at its home position.
    ///
    /// An empty frame list yields a plane with a 1x1 empty footprint.
    pub fn new(params: PlaneParams, frames: Vec<Mask>) -> Self {
        let frames = if frames.is_empty() {
            vec![Mask::new(1, 1)]
        } else {
            frames
        };
        let mask = frames[0].clone();
        Self {
            pos: params.home,
            velocity: 0.0,
            rotation_current: 0.0,
            rotation_target: 0.0,
            frame_phase: 0.0,
            thrusting: false,
            params,
            frames,
            mask,
        }
    }

    /// Record whether thrust should be applied on the next update
    #[inline]
    pub fn set_thrust(&mut self, thrusting: bool) {
        self.thrusting = thrusting;
    }

    #[inline]
    pub fn is_thrusting(&self) -> bool {
        self.thrusting
    }

    #[inline]
    pub fn params(&self) -> &PlaneParams {
        &self.params
    }

    /// Size of the unrotated frame
    pub fn size(&self) -> Vec2 {
        let frame = &self.frames[0];
        Vec2::new(frame.width() as f32, frame.height() as f32)
    }

    /// Centre of the unrotated frame; rotation pivots here
    pub fn center(&self) -> Vec2 {
        self.pos + self.size() / 2.0
    }

    /// Index of the animation frame currently shown
    pub fn frame_index(&self) -> usize {
        (self.frame_phase as usize).min(self.frames.len() - 1)
    }

    /// Put the plane back at home, level and at rest
    pub fn reset(&mut self) {
        self.pos = self.params.home;
        self.velocity = 0.0;
        self.rotation_current = 0.0;
        self.rotation_target = 0.0;
        self.frame_phase = 0.0;
        self.thrusting = false;
        self.refresh_mask();
    }

    /// Animate only: no thrust, no gravity
    pub fn idle(&mut self, dt: f32) {
        self.animate(crate::sanitize_dt(dt));
        self.refresh_mask();
    }

    fn integrate(&mut self, dt: f32) {
        if self.thrusting {
            // Reassignment, not an impulse: holding thrust never stacks
            self.velocity = self.params.thrust;
        }

        self.velocity += self.params.gravity * dt;
        self.pos.y += self.velocity * dt;

        if self.pos.y < self.params.min_y {
            self.pos.y = self.params.min_y;
            self.velocity = 0.0;
        } else if self.pos.y > self.params.max_y {
            self.pos.y = self.params.max_y;
            self.velocity = 0.0;
        }
        // NaN never survives the clamp
        if !self.pos.y.is_finite() {
            self.pos.y = self.params.home.y;
            self.velocity = 0.0;
        }
    }

    fn pitch(&mut self, dt: f32) {
        self.rotation_target = -self.velocity * self.params.rotation_gain;
        // Clamp the blend so a long frame cannot overshoot the target
        let blend = (self.params.rotation_smoothing * dt).min(1.0);
        self.rotation_current += (self.rotation_target - self.rotation_current) * blend;
    }

    fn animate(&mut self, dt: f32) {
        let count = self.frames.len() as f32;
        self.frame_phase = (self.frame_phase + self.params.animation_rate * dt).rem_euclid(count);
    }

    fn refresh_mask(&mut self) {
        self.mask = self.frames[self.frame_index()].rotated(self.rotation_current);
    }
}

impl Update for Plane {
    fn update(&mut self, dt: f32) {
        let dt = crate::sanitize_dt(dt);
        self.integrate(dt);
        self.pitch(dt);
        self.animate(dt);
        self.refresh_mask();
    }
}

impl Footprinted for Plane {
    fn footprint(&self) -> Footprint<'_> {
        let half = Vec2::new(self.mask.width() as f32, self.mask.height() as f32) / 2.0;
        Footprint::new(self.center() - half, &self.mask)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::sprites::Sprites;
    use proptest::prelude::*;

    fn plane() -> Plane {
        let tuning = Tuning::default();
        let sprites = Sprites::procedural(&tuning);
        let params = PlaneParams::from_tuning(&tuning, sprites.plane_size());
        Plane::new(params, sprites.plane_frames)
    }

    #[test]
    fn test_gravity_pulls_down() {
        let mut plane = plane();
        let y0 = plane.pos.y;
        plane.update(0.1);
        assert!((plane.velocity - 20.0).abs() < 1e-4);
        assert!(plane.pos.y > y0);
        // Falling means nose down
        assert!(plane.rotation_target < 0.0);
        assert!(plane.rotation_current < 0.0);
    }

    #[test]
    fn test_thrust_is_reassignment() {
        let mut a = plane();
        let mut b = plane();
        a.set_thrust(true);
        for _ in 0..5 {
            b.set_thrust(true);
        }
        a.update(0.016);
        b.update(0.016);
        assert_eq!(a.velocity, b.velocity);
        assert!((a.velocity - (-200.0 + 200.0 * 0.016)).abs() < 1e-4);

        // A second thrusting frame restarts from the thrust value
        a.update(0.016);
        assert!((a.velocity - (-200.0 + 200.0 * 0.016)).abs() < 1e-4);
    }

    #[test]
    fn test_clamp_zeroes_velocity() {
        let mut plane = plane();
        for _ in 0..600 {
            plane.update(1.0 / 60.0);
        }
        assert_eq!(plane.pos.y, plane.params().max_y);
        assert_eq!(plane.velocity, 0.0);

        plane.set_thrust(true);
        for _ in 0..600 {
            plane.update(1.0 / 60.0);
        }
        assert_eq!(plane.pos.y, plane.params().min_y);
    }

    #[test]
    fn test_animation_wraps() {
        let mut plane = plane();
        plane.update(0.25); // 2.5 frames
        assert_eq!(plane.frame_index(), 2);
        plane.update(0.1); // 3.5 wraps to 0.5
        assert_eq!(plane.frame_index(), 0);
        assert!(plane.frame_phase < 3.0);
    }

    #[test]
    fn test_rotated_footprint_stays_centred() {
        let mut plane = plane();
        let level = plane.footprint().rect().center();
        plane.rotation_current = 25.0;
        plane.refresh_mask();
        let tilted = plane.footprint();
        assert!(tilted.mask.width() as f32 > plane.size().x - 1.0);
        assert!(tilted.rect().center().distance(level) < 1e-3);
    }

    #[test]
    fn test_reset_restores_home() {
        let mut plane = plane();
        plane.set_thrust(true);
        plane.update(0.5);
        plane.reset();
        assert_eq!(plane.pos, plane.params().home);
        assert_eq!(plane.velocity, 0.0);
        assert!(!plane.is_thrusting());
        assert_eq!(plane.rotation_current, 0.0);
    }

    #[test]
    fn test_bad_dt_is_ignored() {
        let mut plane = plane();
        let before = plane.pos;
        plane.update(-1.0);
        plane.update(f32::NAN);
        assert_eq!(plane.pos, before);
        assert_eq!(plane.velocity, 0.0);
    }

    proptest! {
        #[test]
        fn prop_stays_in_band(
            steps in proptest::collection::vec((0.0f32..2.0, any::<bool>()), 1..200)
        ) {
            let mut plane = plane();
            for (dt, thrust) in steps {
                plane.set_thrust(thrust);
                plane.update(dt);
                prop_assert!(plane.pos.y >= plane.params().min_y);
                prop_assert!(plane.pos.y <= plane.params().max_y);
            }
        }
    }
}
