//! Session state and world storage
//!
//! `GameState` owns the plane, one ordered collection per scroller kind, the
//! spawn timers, and the session's monotonic clock. Only the `enter_*`
//! methods change the session; `tick` decides when to call them.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::entity::{Footprinted, Mortal};
use super::player::{Plane, PlaneParams};
use super::scroller::{Background, Scroller, ScrollerKind};
use super::sprites::Sprites;
use crate::tuning::Tuning;

/// Where the player is in the ready-up / play / results cycle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state")]
pub enum SessionState {
    /// Nobody in the calibration box yet
    WaitingForPlayer,
    /// Player is holding still inside the box
    CalibrationCountdown { elapsed: f32, required: f32 },
    /// Active episode
    Playing {
        elapsed_play_time: f32,
        coin_score: u32,
        deadline_seconds: f32,
    },
    /// Results screen
    GameOver {
        elapsed_since_end: f32,
        final_score: u32,
        display_duration: f32,
    },
}

impl SessionState {
    /// Short tag for logs and the UI
    pub fn name(&self) -> &'static str {
        match self {
            SessionState::WaitingForPlayer => "waiting",
            SessionState::CalibrationCountdown { .. } => "calibrating",
            SessionState::Playing { .. } => "playing",
            SessionState::GameOver { .. } => "game_over",
        }
    }

    /// One-line HUD text
    pub fn status_text(&self) -> String {
        match *self {
            SessionState::WaitingForPlayer => "Step into the box to start".to_string(),
            SessionState::CalibrationCountdown { elapsed, required } => {
                let left = (required - elapsed).max(0.0).ceil() as u32;
                format!("Hold still... {left}")
            }
            SessionState::Playing {
                elapsed_play_time,
                coin_score,
                deadline_seconds,
            } => {
                let left = (deadline_seconds - elapsed_play_time).max(0.0).ceil() as u32;
                let score = time_score(elapsed_play_time) + coin_score;
                format!("Score: {score}  Time: {left}s")
            }
            SessionState::GameOver { final_score, .. } => {
                format!("Game over! Final score: {final_score}")
            }
        }
    }
}

/// Whole seconds survived
#[inline]
pub fn time_score(elapsed: f32) -> u32 {
    elapsed.max(0.0).floor() as u32
}

/// Periodic spawn trigger advanced by simulation time
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpawnTimer {
    pub period: f32,
    accumulator: f32,
    armed: bool,
}

impl SpawnTimer {
    pub fn new(period: f32) -> Self {
        Self {
            period,
            accumulator: 0.0,
            armed: false,
        }
    }

    /// Start counting from zero
    pub fn arm(&mut self) {
        self.accumulator = 0.0;
        self.armed = true;
    }

    pub fn disarm(&mut self) {
        self.accumulator = 0.0;
        self.armed = false;
    }

    #[inline]
    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Advance and return how many spawns are due: never more than one.
    ///
    /// Time beyond the period is kept modulo the period, so one long step
    /// cannot queue a burst.
    pub fn advance(&mut self, dt: f32) -> u32 {
        if !self.armed || !(self.period > 0.0) || !dt.is_finite() || dt <= 0.0 {
            return 0;
        }
        self.accumulator += dt;
        if self.accumulator < self.period {
            return 0;
        }
        self.accumulator = (self.accumulator - self.period) % self.period;
        1
    }
}

/// One timer per spawnable kind
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpawnTimers {
    pub coin: SpawnTimer,
    pub cloud: SpawnTimer,
    pub obstacle: SpawnTimer,
}

impl SpawnTimers {
    pub fn from_tuning(tuning: &Tuning) -> Self {
        Self {
            coin: SpawnTimer::new(tuning.coin_period),
            cloud: SpawnTimer::new(tuning.cloud_period),
            obstacle: SpawnTimer::new(tuning.obstacle_period),
        }
    }

    pub fn arm_all(&mut self) {
        self.coin.arm();
        self.cloud.arm();
        self.obstacle.arm();
    }

    pub fn disarm_all(&mut self) {
        self.coin.disarm();
        self.cloud.disarm();
        self.obstacle.disarm();
    }
}

/// Why an episode ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EndReason {
    Crashed,
    TimeUp,
}

/// Things that happened during a tick, for UI and logging
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    CalibrationStarted,
    CalibrationCancelled,
    EpisodeStarted,
    Spawned { kind: ScrollerKind },
    CoinsCollected { count: u32 },
    EpisodeEnded { reason: EndReason, final_score: u32 },
    Reset,
}

/// Complete session state
#[derive(Debug, Clone)]
pub struct GameState {
    pub tuning: Tuning,
    pub session: SessionState,
    /// Monotonic session clock (seconds)
    pub clock: f64,
    /// Clock value when the current episode started
    pub play_started_at: Option<f64>,
    /// Clock value when the last episode ended
    pub play_ended_at: Option<f64>,
    pub plane: Plane,
    pub background: Background,
    pub coins: Vec<Scroller>,
    pub obstacles: Vec<Scroller>,
    pub clouds: Vec<Scroller>,
    pub timers: SpawnTimers,
    /// Events recorded since the last drain
    pub events: Vec<GameEvent>,
    sprites: Sprites,
    rng: Pcg32,
    next_id: u32,
}

impl GameState {
    /// New session with procedural sprites
    pub fn new(tuning: Tuning) -> Self {
        let sprites = Sprites::procedural(&tuning);
        Self::with_sprites(tuning, sprites)
    }

    /// New session with loaded sprite masks
    pub fn with_sprites(tuning: Tuning, sprites: Sprites) -> Self {
        let params = PlaneParams::from_tuning(&tuning, sprites.plane_size());
        let plane = Plane::new(params, sprites.plane_frames.clone());
        let background = Background::new(sprites.background_width, tuning.background_speed);
        Self {
            session: SessionState::WaitingForPlayer,
            clock: 0.0,
            play_started_at: None,
            play_ended_at: None,
            plane,
            background,
            coins: Vec::new(),
            obstacles: Vec::new(),
            clouds: Vec::new(),
            timers: SpawnTimers::from_tuning(&tuning),
            events: Vec::new(),
            sprites,
            rng: Pcg32::seed_from_u64(tuning.seed),
            next_id: 1,
            tuning,
        }
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);
        id
    }

    /// Seconds since the current episode started, from the session clock
    pub fn play_elapsed(&self) -> f32 {
        self.play_started_at
            .map(|start| (self.clock - start).max(0.0) as f32)
            .unwrap_or(0.0)
    }

    /// (time score, coin score) for the HUD
    pub fn scores(&self) -> (u32, u32) {
        match self.session {
            SessionState::Playing {
                elapsed_play_time,
                coin_score,
                ..
            } => (time_score(elapsed_play_time), coin_score),
            _ => (0, 0),
        }
    }

    /// Live spawnables across all kinds
    pub fn spawnable_count(&self) -> usize {
        self.coins.len() + self.obstacles.len() + self.clouds.len()
    }

    pub fn spawn_coin(&mut self) {
        let id = self.next_entity_id();
        let coin = Scroller::spawn_coin(id, &mut self.rng, &self.sprites, &self.tuning);
        self.record_spawn(&coin);
        self.coins.push(coin);
    }

    pub fn spawn_cloud(&mut self) {
        let id = self.next_entity_id();
        let cloud = Scroller::spawn_cloud(id, &mut self.rng, &self.sprites, &self.tuning);
        self.record_spawn(&cloud);
        self.clouds.push(cloud);
    }

    pub fn spawn_obstacle(&mut self) {
        let id = self.next_entity_id();
        let obstacle = Scroller::spawn_obstacle(id, &mut self.rng, &self.sprites, &self.tuning);
        self.record_spawn(&obstacle);
        self.obstacles.push(obstacle);
    }

    fn record_spawn(&mut self, scroller: &Scroller) {
        log::debug!(
            "Spawned {:?} #{} at ({:.0}, {:.0})",
            scroller.kind,
            scroller.id,
            scroller.pos.x,
            scroller.pos.y
        );
        self.events.push(GameEvent::Spawned {
            kind: scroller.kind,
        });
    }

    /// Register an externally built scroller in the collection for its kind
    pub fn register(&mut self, scroller: Scroller) {
        match scroller.kind {
            ScrollerKind::Coin => self.coins.push(scroller),
            ScrollerKind::Obstacle { .. } => self.obstacles.push(scroller),
            ScrollerKind::Cloud => self.clouds.push(scroller),
        }
    }

    /// Drop dead entities from every collection
    pub fn sweep_dead(&mut self) {
        self.coins.retain(|c| c.is_alive());
        self.obstacles.retain(|o| o.is_alive());
        self.clouds.retain(|c| c.is_alive());
    }

    /// Kill and drop every spawnable
    pub fn clear_spawnables(&mut self) {
        for scroller in self
            .coins
            .iter_mut()
            .chain(self.obstacles.iter_mut())
            .chain(self.clouds.iter_mut())
        {
            scroller.kill();
        }
        self.sweep_dead();
    }

    /// Full reset into the lobby
    pub fn enter_waiting(&mut self) {
        self.clear_spawnables();
        self.timers.disarm_all();
        self.plane.reset();
        self.play_started_at = None;
        self.play_ended_at = None;
        self.session = SessionState::WaitingForPlayer;
        log::info!("Waiting for player");
    }

    pub fn enter_countdown(&mut self) {
        self.session = SessionState::CalibrationCountdown {
            elapsed: 0.0,
            required: self.tuning.calibration_seconds,
        };
        self.events.push(GameEvent::CalibrationStarted);
        log::info!(
            "Calibration started ({:.1}s hold required)",
            self.tuning.calibration_seconds
        );
    }

    pub fn cancel_countdown(&mut self) {
        if let SessionState::CalibrationCountdown { elapsed, .. } = self.session {
            log::info!("Calibration cancelled after {elapsed:.2}s");
        }
        self.session = SessionState::WaitingForPlayer;
        self.events.push(GameEvent::CalibrationCancelled);
    }

    pub fn enter_playing(&mut self) {
        self.clear_spawnables();
        self.plane.reset();
        self.play_started_at = Some(self.clock);
        self.play_ended_at = None;
        self.timers.arm_all();
        self.session = SessionState::Playing {
            elapsed_play_time: 0.0,
            coin_score: 0,
            deadline_seconds: self.tuning.play_seconds,
        };
        self.events.push(GameEvent::EpisodeStarted);
        log::info!("Episode started ({:.0}s limit)", self.tuning.play_seconds);
    }

    pub fn enter_game_over(&mut self, reason: EndReason) {
        let (elapsed, coins) = match self.session {
            SessionState::Playing {
                elapsed_play_time,
                coin_score,
                ..
            } => (elapsed_play_time, coin_score),
            _ => (0.0, 0),
        };
        let final_score = time_score(elapsed) + coins;
        self.timers.disarm_all();
        self.plane.set_thrust(false);
        self.play_ended_at = Some(self.clock);
        self.session = SessionState::GameOver {
            elapsed_since_end: 0.0,
            final_score,
            display_duration: self.tuning.game_over_seconds,
        };
        self.events.push(GameEvent::EpisodeEnded {
            reason,
            final_score,
        });
        let time_points = time_score(elapsed);
        log::info!(
            "Episode ended ({reason:?}) after {elapsed:.2}s: \
             {time_points} time + {coins} coins = {final_score}"
        );
    }

    /// Take the events recorded since the last call
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Top-left of where the plane's footprint currently sits
    pub fn plane_origin(&self) -> Vec2 {
        self.plane.footprint().origin
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_waits() {
        let state = GameState::new(Tuning::default());
        assert_eq!(state.session, SessionState::WaitingForPlayer);
        assert_eq!(state.spawnable_count(), 0);
        assert!(!state.timers.coin.is_armed());
        assert_eq!(state.scores(), (0, 0));
    }

    #[test]
    fn test_spawn_timer_periods() {
        let mut timer = SpawnTimer::new(3.0);
        assert_eq!(timer.advance(10.0), 0); // disarmed
        timer.arm();
        assert_eq!(timer.advance(2.9), 0);
        assert_eq!(timer.advance(0.2), 1);
        assert_eq!(timer.advance(2.8), 0);
        assert_eq!(timer.advance(0.2), 1);
        timer.disarm();
        assert_eq!(timer.advance(100.0), 0);
    }

    #[test]
    fn test_spawn_timer_fires_once_per_step() {
        let mut timer = SpawnTimer::new(3.0);
        timer.arm();
        assert_eq!(timer.advance(6.0), 1);
        assert_eq!(timer.advance(1.0e8), 1);
        assert_eq!(timer.advance(f32::MAX), 1);
        assert_eq!(timer.advance(f32::INFINITY), 0);
        // Leftover never reaches a full period
        assert_eq!(timer.advance(0.0), 0);
    }

    #[test]
    fn test_spawn_registers_by_kind() {
        let mut state = GameState::new(Tuning::default());
        state.spawn_coin();
        state.spawn_cloud();
        state.spawn_obstacle();
        assert_eq!(state.coins.len(), 1);
        assert_eq!(state.clouds.len(), 1);
        assert_eq!(state.obstacles.len(), 1);
        // IDs are unique
        assert_ne!(state.coins[0].id, state.clouds[0].id);
        assert_eq!(state.drain_events().len(), 3);
        assert!(state.events.is_empty());
    }

    #[test]
    fn test_game_over_sums_scores() {
        let mut state = GameState::new(Tuning::default());
        state.session = SessionState::Playing {
            elapsed_play_time: 12.7,
            coin_score: 4,
            deadline_seconds: 30.0,
        };
        state.timers.arm_all();
        state.enter_game_over(EndReason::Crashed);
        match state.session {
            SessionState::GameOver { final_score, .. } => assert_eq!(final_score, 16),
            other => panic!("unexpected state {other:?}"),
        }
        assert!(!state.timers.obstacle.is_armed());
    }

    #[test]
    fn test_status_text() {
        let countdown = SessionState::CalibrationCountdown {
            elapsed: 0.5,
            required: 3.0,
        };
        assert_eq!(countdown.status_text(), "Hold still... 3");
        let over = SessionState::GameOver {
            elapsed_since_end: 0.0,
            final_score: 42,
            display_duration: 10.0,
        };
        assert!(over.status_text().contains("42"));
    }
}
