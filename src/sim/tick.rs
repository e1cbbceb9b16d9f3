//! Per-frame session update
//!
//! One call interprets the input for the current session state, moves every
//! entity, runs the collision pass and applies any transition. Nothing here
//! blocks or fails; bad input is corrected in place.

use serde::{Deserialize, Serialize};

use super::collision::{check_coin_collisions, check_obstacle_collision};
use super::entity::Update;
use super::state::{EndReason, GameEvent, GameState, SessionState};
use crate::consts::{MAX_FRAME_DT, NEUTRAL_SIGNAL};
use crate::sanitize_dt;

/// Slack for f32 rounding when summing fixed steps against the hold time
const COUNTDOWN_EPSILON: f32 = 1e-4;

/// Input for a single tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TickInput {
    /// Normalized vertical nose position (0 = top of frame)
    pub signal: f32,
    /// Whole pose inside the calibration box
    pub calibrated: bool,
}

impl Default for TickInput {
    fn default() -> Self {
        Self {
            signal: NEUTRAL_SIGNAL,
            calibrated: false,
        }
    }
}

/// Advance the session by `dt` seconds
pub fn tick(state: &mut GameState, input: &TickInput, dt: f32) {
    // A stalled caller cannot push more than one frame's worth through
    let dt = sanitize_dt(dt).min(MAX_FRAME_DT);
    state.clock += f64::from(dt);

    // The backdrop scrolls in every state
    state.background.update(dt);

    match state.session {
        SessionState::WaitingForPlayer => {
            state.plane.idle(dt);
            if input.calibrated {
                // The frame that steps into the box counts toward the hold
                state.enter_countdown();
                advance_countdown(state, 0.0, dt);
            }
        }

        SessionState::CalibrationCountdown { elapsed, .. } => {
            state.plane.idle(dt);
            if !input.calibrated {
                // Any interruption discards the whole hold
                state.cancel_countdown();
            } else {
                advance_countdown(state, elapsed, dt);
            }
        }

        SessionState::Playing {
            coin_score,
            deadline_seconds,
            ..
        } => tick_playing(state, input, dt, coin_score, deadline_seconds),

        SessionState::GameOver {
            final_score,
            display_duration,
            ..
        } => {
            update_scrollers(state, dt);
            let since_end = state
                .play_ended_at
                .map(|end| (state.clock - end).max(0.0) as f32)
                .unwrap_or(display_duration);
            if since_end >= display_duration {
                state.enter_waiting();
                state.events.push(GameEvent::Reset);
            } else {
                state.session = SessionState::GameOver {
                    elapsed_since_end: since_end,
                    final_score,
                    display_duration,
                };
            }
        }
    }

    // Nothing dead survives into the next collision pass
    state.sweep_dead();
}

fn advance_countdown(state: &mut GameState, elapsed: f32, dt: f32) {
    let required = state.tuning.calibration_seconds;
    let elapsed = elapsed + dt;
    if elapsed + COUNTDOWN_EPSILON >= required {
        state.enter_playing();
    } else {
        state.session = SessionState::CalibrationCountdown { elapsed, required };
    }
}

fn tick_playing(
    state: &mut GameState,
    input: &TickInput,
    dt: f32,
    coin_score: u32,
    deadline_seconds: f32,
) {
    // Recomputed from the start timestamp every frame, never accumulated
    let elapsed = state.play_elapsed();

    let signal = if input.signal.is_finite() {
        input.signal
    } else {
        NEUTRAL_SIGNAL
    };
    state.plane.set_thrust(signal < state.tuning.thrust_threshold);
    state.plane.update(dt);

    for _ in 0..state.timers.coin.advance(dt) {
        state.spawn_coin();
    }
    for _ in 0..state.timers.cloud.advance(dt) {
        state.spawn_cloud();
    }
    for _ in 0..state.timers.obstacle.advance(dt) {
        state.spawn_obstacle();
    }

    update_scrollers(state, dt);

    // Fatal check first; a crash frame scores no coins
    if check_obstacle_collision(&state.plane, &state.obstacles) {
        state.session = SessionState::Playing {
            elapsed_play_time: elapsed,
            coin_score,
            deadline_seconds,
        };
        state.enter_game_over(EndReason::Crashed);
        return;
    }

    let collected = check_coin_collisions(&state.plane, &mut state.coins);
    if collected > 0 {
        log::debug!("Collected {collected} coin(s)");
        state.events.push(GameEvent::CoinsCollected { count: collected });
    }

    state.session = SessionState::Playing {
        elapsed_play_time: elapsed,
        coin_score: coin_score.saturating_add(collected),
        deadline_seconds,
    };

    if elapsed >= deadline_seconds {
        state.enter_game_over(EndReason::TimeUp);
    }
}

fn update_scrollers(state: &mut GameState, dt: f32) {
    for scroller in state
        .coins
        .iter_mut()
        .chain(state.obstacles.iter_mut())
        .chain(state.clouds.iter_mut())
    {
        scroller.update(dt);
    }
}
