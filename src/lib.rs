//! Nose Flyer - a pose-controlled side-scrolling glider
//!
//! Core modules:
//! - `sim`: Session state machine, entities, physics and pixel collision
//! - `platform`: Pose input handoff between the camera thread and the game loop
//! - `game`: Fixed timestep driver that feeds input snapshots into the sim
//! - `tuning`: Data-driven gameplay constants

pub mod game;
pub mod platform;
pub mod sim;
pub mod tuning;

pub use game::Game;
pub use tuning::{Tuning, TuningError};

/// Game configuration constants (defaults for [`Tuning`])
pub mod consts {
    /// Fixed simulation timestep (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 4;
    /// Longest frame the driver will simulate in one go (seconds)
    pub const MAX_FRAME_DT: f32 = 0.1;

    /// Window dimensions
    pub const WINDOW_WIDTH: f32 = 480.0;
    pub const WINDOW_HEIGHT: f32 = 800.0;

    /// Safe vertical band for the plane
    pub const TOP_MARGIN: f32 = 10.0;
    pub const BOTTOM_MARGIN: f32 = 10.0;

    /// Plane physics (pixels/s and pixels/s²)
    pub const GRAVITY: f32 = 200.0;
    pub const THRUST: f32 = -200.0;
    /// Degrees of nose pitch per pixel/s of vertical velocity
    pub const ROTATION_GAIN: f32 = 0.06;
    /// First-order smoothing rate for pitch (1/s)
    pub const ROTATION_SMOOTHING: f32 = 3.0;
    /// Animation frames advanced per second
    pub const ANIMATION_RATE: f32 = 10.0;

    /// Scroll speeds (pixels/s)
    pub const BACKGROUND_SPEED: f32 = 120.0;
    pub const COIN_SPEED: f32 = 200.0;
    pub const OBSTACLE_SPEED: f32 = 120.0;
    pub const CLOUD_SPEED_MIN: f32 = 100.0;
    pub const CLOUD_SPEED_MAX: f32 = 180.0;

    /// Scrollers die once their right edge passes this x
    pub const DESPAWN_X: f32 = -100.0;

    /// Spawn periods (seconds)
    pub const COIN_PERIOD: f32 = 3.0;
    pub const CLOUD_PERIOD: f32 = 7.0;
    pub const OBSTACLE_PERIOD: f32 = 5.0;

    /// Session timing (seconds)
    pub const CALIBRATION_SECONDS: f32 = 3.0;
    pub const PLAY_SECONDS: f32 = 30.0;
    pub const GAME_OVER_SECONDS: f32 = 10.0;

    /// Control signal below this means "nose up", i.e. thrust
    pub const THRUST_THRESHOLD: f32 = 0.3;
    /// Control signal published when no pose is available
    pub const NEUTRAL_SIGNAL: f32 = 0.5;
}

/// Clamp a frame delta to something the integrators can use.
///
/// Negative and non-finite deltas become zero.
#[inline]
pub fn sanitize_dt(dt: f32) -> f32 {
    if dt.is_finite() && dt > 0.0 { dt } else { 0.0 }
}
