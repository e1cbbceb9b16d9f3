//! Nose Flyer entry point
//!
//! Headless native runner: a scripted pose source stands in for the camera,
//! and the session is logged instead of drawn.

use std::time::{Duration, Instant};

use nose_flyer::consts::SIM_DT;
use nose_flyer::platform::{PoseProducer, ProducerConfig, ScriptedPose};
use nose_flyer::sim::{GameEvent, SessionState};
use nose_flyer::{Game, Tuning};

const TUNING_ENV: &str = "NOSE_FLYER_TUNING";
const SECONDS_ENV: &str = "NOSE_FLYER_SECONDS";
const DEFAULT_RUN_SECONDS: f32 = 60.0;

fn run_seconds() -> f32 {
    match std::env::var(SECONDS_ENV) {
        Ok(raw) => match raw.parse::<f32>() {
            Ok(secs) if secs.is_finite() && secs > 0.0 => secs,
            _ => {
                log::warn!("Ignoring {SECONDS_ENV}={raw:?}, using {DEFAULT_RUN_SECONDS}s");
                DEFAULT_RUN_SECONDS
            }
        },
        Err(_) => DEFAULT_RUN_SECONDS,
    }
}

fn log_event(event: &GameEvent) {
    match event {
        GameEvent::Spawned { kind } => log::debug!("Spawned {kind:?}"),
        GameEvent::CoinsCollected { count } => log::info!("Collected {count} coin(s)"),
        other => log::info!("{other:?}"),
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Nose Flyer (headless) starting...");

    let tuning = match std::env::var(TUNING_ENV) {
        Ok(path) => Tuning::load_or_default(path),
        Err(_) => Tuning::default(),
    };
    let run_for = run_seconds();

    let mut game = Game::new(tuning);
    let source = ScriptedPose::new(4.0, ProducerConfig::default().poll_interval.as_secs_f32())
        .with_dropouts(50);
    let mut producer = match PoseProducer::spawn(source, game.input(), ProducerConfig::default()) {
        Ok(producer) => producer,
        Err(e) => {
            log::error!("Failed to start pose producer: {e}");
            return;
        }
    };

    let frame = Duration::from_secs_f32(SIM_DT);
    let started = Instant::now();
    let mut last = started;
    let mut last_status = String::new();

    while started.elapsed().as_secs_f32() < run_for {
        let now = Instant::now();
        let dt = now.duration_since(last).as_secs_f32();
        last = now;

        game.advance(dt);
        for event in game.drain_events() {
            log_event(&event);
        }

        let view = game.view();
        if view.status != last_status && !matches!(view.session, SessionState::Playing { .. }) {
            log::info!("[{}] {}", view.session.name(), view.status);
            last_status = view.status;
        }

        if let Some(rest) = frame.checked_sub(now.elapsed()) {
            std::thread::sleep(rest);
        }
    }

    producer.stop();
    let view = game.view();
    log::info!(
        "Done after {} ticks, final state {} ({})",
        game.ticks(),
        view.session.name(),
        view.status
    );
}
