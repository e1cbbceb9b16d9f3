//! Fixed timestep driver
//!
//! Owns the session and the input cell the pose thread writes into. Each
//! rendered frame reads the cell once and runs as many fixed ticks as the
//! elapsed time allows.

use std::sync::Arc;

use crate::consts::{MAX_FRAME_DT, MAX_SUBSTEPS, SIM_DT};
use crate::platform::InputCell;
use crate::sanitize_dt;
use crate::sim::{GameEvent, GameState, RenderView, Sprites, TickInput, tick};
use crate::tuning::Tuning;

pub struct Game {
    pub state: GameState,
    input: Arc<InputCell>,
    accumulator: f32,
    ticks: u64,
}

impl Game {
    pub fn new(tuning: Tuning) -> Self {
        Self::with_state(GameState::new(tuning))
    }

    pub fn with_sprites(tuning: Tuning, sprites: Sprites) -> Self {
        Self::with_state(GameState::with_sprites(tuning, sprites))
    }

    fn with_state(state: GameState) -> Self {
        Self {
            state,
            input: Arc::new(InputCell::new()),
            accumulator: 0.0,
            ticks: 0,
        }
    }

    /// Handle for the producer side
    pub fn input(&self) -> Arc<InputCell> {
        Arc::clone(&self.input)
    }

    /// Total fixed ticks run so far
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Run simulation ticks for one rendered frame; returns how many ran
    pub fn advance(&mut self, frame_dt: f32) -> u32 {
        let dt = sanitize_dt(frame_dt).min(MAX_FRAME_DT);
        self.accumulator += dt;

        // One snapshot per frame, shared by every substep
        let input: TickInput = self.input.snapshot().into();

        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            tick(&mut self.state, &input, SIM_DT);
            self.accumulator -= SIM_DT;
            substeps += 1;
        }

        if substeps == MAX_SUBSTEPS && self.accumulator >= SIM_DT {
            log::debug!("Dropping {:.3}s of simulation backlog", self.accumulator);
            self.accumulator = 0.0;
        }

        self.ticks += u64::from(substeps);
        substeps
    }

    pub fn view(&self) -> RenderView {
        RenderView::capture(&self.state)
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        self.state.drain_events()
    }

    /// Back to the waiting screen with a neutral input
    pub fn restart(&mut self) {
        self.state.enter_waiting();
        self.input.reset();
        self.accumulator = 0.0;
    }
}
