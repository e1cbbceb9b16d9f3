//! Gameplay tuning
//!
//! Every knob the simulation reads lives here. Loaded from JSON on startup,
//! any field left out falls back to the value in [`crate::consts`].

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::*;

/// Errors raised while loading a tuning file
#[derive(Debug, Error)]
pub enum TuningError {
    #[error("failed to read tuning file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse tuning file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid tuning: {0}")]
    Invalid(String),
}

/// Static gameplay configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    /// RNG seed for spawn jitter
    pub seed: u64,

    // === Geometry ===
    pub window_width: f32,
    pub window_height: f32,
    pub top_margin: f32,
    pub bottom_margin: f32,

    // === Plane ===
    pub gravity: f32,
    /// Velocity assigned while thrusting (negative is up)
    pub thrust: f32,
    pub rotation_gain: f32,
    pub rotation_smoothing: f32,
    pub animation_rate: f32,

    // === Scrolling ===
    pub background_speed: f32,
    pub coin_speed: f32,
    pub obstacle_speed: f32,
    pub cloud_speed_min: f32,
    pub cloud_speed_max: f32,
    /// Extra distance beyond the right edge where scrollers appear
    pub spawn_jitter_x: (f32, f32),
    /// Vertical spread around the window center for coins and clouds
    pub spawn_jitter_y: f32,

    // === Spawn periods ===
    pub coin_period: f32,
    pub cloud_period: f32,
    pub obstacle_period: f32,

    // === Session ===
    pub calibration_seconds: f32,
    pub play_seconds: f32,
    pub game_over_seconds: f32,
    pub thrust_threshold: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            seed: 0x5EED_F1E5,

            window_width: WINDOW_WIDTH,
            window_height: WINDOW_HEIGHT,
            top_margin: TOP_MARGIN,
            bottom_margin: BOTTOM_MARGIN,

            gravity: GRAVITY,
            thrust: THRUST,
            rotation_gain: ROTATION_GAIN,
            rotation_smoothing: ROTATION_SMOOTHING,
            animation_rate: ANIMATION_RATE,

            background_speed: BACKGROUND_SPEED,
            coin_speed: COIN_SPEED,
            obstacle_speed: OBSTACLE_SPEED,
            cloud_speed_min: CLOUD_SPEED_MIN,
            cloud_speed_max: CLOUD_SPEED_MAX,
            spawn_jitter_x: (40.0, 100.0),
            spawn_jitter_y: 250.0,

            coin_period: COIN_PERIOD,
            cloud_period: CLOUD_PERIOD,
            obstacle_period: OBSTACLE_PERIOD,

            calibration_seconds: CALIBRATION_SECONDS,
            play_seconds: PLAY_SECONDS,
            game_over_seconds: GAME_OVER_SECONDS,
            thrust_threshold: THRUST_THRESHOLD,
        }
    }
}

impl Tuning {
    /// Parse and validate a JSON tuning document
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Read a JSON tuning file from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TuningError> {
        let json = std::fs::read_to_string(path.as_ref())?;
        let tuning = Self::from_json(&json)?;
        log::info!("Loaded tuning from {}", path.as_ref().display());
        Ok(tuning)
    }

    /// Load a tuning file, falling back to defaults on any error
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        match Self::load(path.as_ref()) {
            Ok(tuning) => tuning,
            Err(e) => {
                log::warn!("{e}; using default tuning");
                Self::default()
            }
        }
    }

    /// Reject values the simulation cannot run with
    pub fn validate(&self) -> Result<(), TuningError> {
        let positive = [
            ("window_width", self.window_width),
            ("window_height", self.window_height),
            ("coin_period", self.coin_period),
            ("cloud_period", self.cloud_period),
            ("obstacle_period", self.obstacle_period),
            ("calibration_seconds", self.calibration_seconds),
            ("play_seconds", self.play_seconds),
            ("game_over_seconds", self.game_over_seconds),
        ];
        for (name, value) in positive {
            // NaN fails this comparison too
            if !(value > 0.0) {
                return Err(TuningError::Invalid(format!(
                    "{name} must be positive, got {value}"
                )));
            }
        }

        if self.top_margin < 0.0 || self.bottom_margin < 0.0 {
            return Err(TuningError::Invalid("margins must not be negative".into()));
        }
        if self.top_margin + self.bottom_margin >= self.window_height {
            return Err(TuningError::Invalid(
                "margins leave no room for the plane".into(),
            ));
        }
        if self.cloud_speed_min > self.cloud_speed_max {
            return Err(TuningError::Invalid(
                "cloud_speed_min exceeds cloud_speed_max".into(),
            ));
        }
        if self.spawn_jitter_x.0 > self.spawn_jitter_x.1 {
            return Err(TuningError::Invalid("spawn_jitter_x range is reversed".into()));
        }
        if !(0.0..=1.0).contains(&self.thrust_threshold) {
            return Err(TuningError::Invalid(
                "thrust_threshold must lie in [0, 1]".into(),
            ));
        }
        Ok(())
    }
}
