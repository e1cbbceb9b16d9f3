//! Lock-free handoff between the pose thread and the game loop
//!
//! The producer publishes a control signal and a calibration flag; the game
//! loop reads one snapshot per frame. Both live in a single `AtomicU64` so a
//! reader never sees a signal from one publish paired with a flag from another.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::consts::NEUTRAL_SIGNAL;
use crate::sim::TickInput;

const CALIBRATED_BIT: u64 = 1 << 32;

/// One consistent reading of the shared input
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InputSnapshot {
    /// Normalized vertical nose position in `[0, 1]`
    pub signal: f32,
    pub calibrated: bool,
}

impl Default for InputSnapshot {
    fn default() -> Self {
        Self {
            signal: NEUTRAL_SIGNAL,
            calibrated: false,
        }
    }
}

impl From<InputSnapshot> for TickInput {
    fn from(snapshot: InputSnapshot) -> Self {
        TickInput {
            signal: snapshot.signal,
            calibrated: snapshot.calibrated,
        }
    }
}

/// Single-writer / single-reader input cell
#[derive(Debug)]
pub struct InputCell {
    packed: AtomicU64,
}

impl Default for InputCell {
    fn default() -> Self {
        Self::new()
    }
}

impl InputCell {
    /// A cell holding the neutral default
    pub fn new() -> Self {
        Self {
            packed: AtomicU64::new(pack(InputSnapshot::default())),
        }
    }

    /// Publish a new reading.
    ///
    /// Non-finite signals are replaced by the neutral value; the rest are
    /// clamped to `[0, 1]`.
    pub fn publish(&self, signal: f32, calibrated: bool) {
        let signal = if signal.is_finite() {
            signal.clamp(0.0, 1.0)
        } else {
            NEUTRAL_SIGNAL
        };
        self.packed
            .store(pack(InputSnapshot { signal, calibrated }), Ordering::Relaxed);
    }

    /// Read the latest published value; never blocks
    pub fn snapshot(&self) -> InputSnapshot {
        unpack(self.packed.load(Ordering::Relaxed))
    }

    /// Go back to the neutral default
    pub fn reset(&self) {
        self.packed
            .store(pack(InputSnapshot::default()), Ordering::Relaxed);
    }
}

fn pack(snapshot: InputSnapshot) -> u64 {
    let flag = if snapshot.calibrated { CALIBRATED_BIT } else { 0 };
    u64::from(snapshot.signal.to_bits()) | flag
}

fn unpack(packed: u64) -> InputSnapshot {
    InputSnapshot {
        signal: f32::from_bits(packed as u32),
        calibrated: packed & CALIBRATED_BIT != 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_defaults_to_neutral() {
        let cell = InputCell::new();
        assert_eq!(cell.snapshot(), InputSnapshot::default());
        assert_eq!(cell.snapshot().signal, 0.5);
        assert!(!cell.snapshot().calibrated);
    }

    #[test]
    fn test_publish_and_read() {
        let cell = InputCell::new();
        cell.publish(0.25, true);
        assert_eq!(
            cell.snapshot(),
            InputSnapshot {
                signal: 0.25,
                calibrated: true
            }
        );
        cell.reset();
        assert_eq!(cell.snapshot(), InputSnapshot::default());
    }

    #[test]
    fn test_publish_sanitizes() {
        let cell = InputCell::new();
        cell.publish(f32::NAN, true);
        assert_eq!(cell.snapshot().signal, NEUTRAL_SIGNAL);
        cell.publish(3.0, false);
        assert_eq!(cell.snapshot().signal, 1.0);
        cell.publish(-0.5, false);
        assert_eq!(cell.snapshot().signal, 0.0);
    }

    #[test]
    fn test_cross_thread_handoff() {
        let cell = Arc::new(InputCell::new());
        let writer = Arc::clone(&cell);
        let handle = std::thread::spawn(move || {
            for i in 0..1000 {
                let signal = i as f32 / 1000.0;
                writer.publish(signal, i % 2 == 0);
            }
        });
        // Every read is some whole published value
        for _ in 0..1000 {
            let snap = cell.snapshot();
            assert!((0.0..=1.0).contains(&snap.signal));
        }
        handle.join().unwrap();
        let last = cell.snapshot();
        assert!((last.signal - 0.999).abs() < 1e-6);
        assert!(!last.calibrated);
    }
}
