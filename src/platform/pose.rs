//! Pose-derived control signal
//!
//! A [`PoseSource`] yields keypoint detections (or nothing, when no person is
//! found). [`PoseTracker`] turns that stream into the two published values:
//! the smoothed nose height and whether the whole body sits inside the
//! calibration region. [`PoseProducer`] runs a tracker on its own thread and
//! writes into the shared [`InputCell`].

use std::collections::VecDeque;
use std::io;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::{RecvTimeoutError, Sender, bounded};
use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::input::{InputCell, InputSnapshot};
use crate::consts::NEUTRAL_SIGNAL;

/// Number of body keypoints a pose carries
pub const KEYPOINT_COUNT: usize = 17;

/// COCO body keypoints, in model output order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Keypoint {
    Nose,
    LeftEye,
    RightEye,
    LeftEar,
    RightEar,
    LeftShoulder,
    RightShoulder,
    LeftElbow,
    RightElbow,
    LeftWrist,
    RightWrist,
    LeftHip,
    RightHip,
    LeftKnee,
    RightKnee,
    LeftAnkle,
    RightAnkle,
}

impl Keypoint {
    pub const ALL: [Keypoint; KEYPOINT_COUNT] = [
        Keypoint::Nose,
        Keypoint::LeftEye,
        Keypoint::RightEye,
        Keypoint::LeftEar,
        Keypoint::RightEar,
        Keypoint::LeftShoulder,
        Keypoint::RightShoulder,
        Keypoint::LeftElbow,
        Keypoint::RightElbow,
        Keypoint::LeftWrist,
        Keypoint::RightWrist,
        Keypoint::LeftHip,
        Keypoint::RightHip,
        Keypoint::LeftKnee,
        Keypoint::RightKnee,
        Keypoint::LeftAnkle,
        Keypoint::RightAnkle,
    ];

    /// Map a model output index to a keypoint
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

/// One detected person, keypoints normalized to `[0, 1]` (origin top-left)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    keypoints: [Option<Vec2>; KEYPOINT_COUNT],
}

impl Pose {
    /// A pose with no detected keypoints
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builder-style setter
    pub fn with(mut self, keypoint: Keypoint, position: Vec2) -> Self {
        self.set(keypoint, position);
        self
    }

    pub fn set(&mut self, keypoint: Keypoint, position: Vec2) {
        self.keypoints[keypoint.index()] = Some(position);
    }

    pub fn get(&self, keypoint: Keypoint) -> Option<Vec2> {
        self.keypoints[keypoint.index()]
    }

    pub fn nose_y(&self) -> Option<f32> {
        self.get(Keypoint::Nose).map(|p| p.y)
    }

    /// Detected keypoints only
    pub fn detected(&self) -> impl Iterator<Item = Vec2> + '_ {
        self.keypoints.iter().flatten().copied()
    }
}

/// Normalized box the player must stand inside to calibrate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibrationRegion {
    pub min: Vec2,
    pub max: Vec2,
}

impl Default for CalibrationRegion {
    fn default() -> Self {
        Self {
            min: Vec2::new(0.15, 0.05),
            max: Vec2::new(0.85, 0.98),
        }
    }
}

impl CalibrationRegion {
    pub fn contains(&self, point: Vec2) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }

    /// True when something was detected and every detected keypoint is inside
    pub fn contains_pose(&self, pose: &Pose) -> bool {
        let mut any = false;
        for point in pose.detected() {
            if !self.contains(point) {
                return false;
            }
            any = true;
        }
        any
    }
}

/// Moving average over the last few samples
#[derive(Debug, Clone)]
pub struct SignalSmoother {
    window: usize,
    history: VecDeque<f32>,
}

impl SignalSmoother {
    /// Window is at least one sample; history starts at the neutral value
    pub fn new(window: usize) -> Self {
        let window = window.max(1);
        Self {
            window,
            history: std::iter::repeat_n(NEUTRAL_SIGNAL, window).collect(),
        }
    }

    /// Add a sample and return the current average
    pub fn push(&mut self, sample: f32) -> f32 {
        if self.history.len() == self.window {
            self.history.pop_front();
        }
        self.history.push_back(sample);
        self.value()
    }

    pub fn value(&self) -> f32 {
        self.history.iter().sum::<f32>() / self.history.len() as f32
    }
}

/// Anything that can be polled for the current pose
pub trait PoseSource: Send {
    /// `None` when no person was found or inference failed
    fn next_pose(&mut self) -> Option<Pose>;
}

impl<F> PoseSource for F
where
    F: FnMut() -> Option<Pose> + Send,
{
    fn next_pose(&mut self) -> Option<Pose> {
        self()
    }
}

/// Deterministic synthetic player: a standing body whose nose bobs on a sine
#[derive(Debug, Clone)]
pub struct ScriptedPose {
    phase: f32,
    step: f32,
    amplitude: f32,
    /// Every n-th poll returns no detection; 0 disables dropouts
    dropout_every: u32,
    polls: u32,
}

impl ScriptedPose {
    /// `period` seconds per full bob, sampled every `step` seconds
    pub fn new(period: f32, step: f32) -> Self {
        let period = if period > 0.0 { period } else { 1.0 };
        Self {
            phase: 0.0,
            step: std::f32::consts::TAU * step.max(0.0) / period,
            amplitude: 0.3,
            dropout_every: 0,
            polls: 0,
        }
    }

    pub fn with_dropouts(mut self, every: u32) -> Self {
        self.dropout_every = every;
        self
    }

    fn body(nose_y: f32) -> Pose {
        let mut pose = Pose::empty().with(Keypoint::Nose, Vec2::new(0.5, nose_y));
        let shoulders = nose_y + 0.12;
        pose.set(Keypoint::LeftShoulder, Vec2::new(0.42, shoulders));
        pose.set(Keypoint::RightShoulder, Vec2::new(0.58, shoulders));
        pose.set(Keypoint::LeftHip, Vec2::new(0.45, 0.7));
        pose.set(Keypoint::RightHip, Vec2::new(0.55, 0.7));
        pose.set(Keypoint::LeftAnkle, Vec2::new(0.45, 0.95));
        pose.set(Keypoint::RightAnkle, Vec2::new(0.55, 0.95));
        pose
    }
}

impl PoseSource for ScriptedPose {
    fn next_pose(&mut self) -> Option<Pose> {
        self.polls = self.polls.wrapping_add(1);
        let nose_y = NEUTRAL_SIGNAL - self.amplitude * self.phase.sin();
        self.phase = (self.phase + self.step) % std::f32::consts::TAU;
        if self.dropout_every > 0 && self.polls % self.dropout_every == 0 {
            return None;
        }
        Some(Self::body(nose_y))
    }
}

/// Producer tuning
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProducerConfig {
    pub poll_interval: Duration,
    /// Consecutive misses before calibration is dropped
    pub miss_tolerance: u32,
    pub region: CalibrationRegion,
    pub smoothing_window: usize,
}

impl Default for ProducerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(10),
            miss_tolerance: 3,
            region: CalibrationRegion::default(),
            smoothing_window: 2,
        }
    }
}

/// Turns a stream of detections into published input values
#[derive(Debug, Clone)]
pub struct PoseTracker {
    smoother: SignalSmoother,
    region: CalibrationRegion,
    miss_tolerance: u32,
    misses: u32,
    current: InputSnapshot,
}

impl PoseTracker {
    pub fn new(config: &ProducerConfig) -> Self {
        Self {
            smoother: SignalSmoother::new(config.smoothing_window),
            region: config.region,
            miss_tolerance: config.miss_tolerance,
            misses: 0,
            current: InputSnapshot::default(),
        }
    }

    /// Fold in one poll result. A miss keeps the last signal and only clears
    /// calibration once the tolerance is used up.
    pub fn observe(&mut self, pose: Option<Pose>) -> InputSnapshot {
        match pose {
            Some(pose) => {
                if self.is_source_lost() {
                    log::info!("Pose source recovered after {} missed polls", self.misses);
                }
                self.misses = 0;
                if let Some(y) = pose.nose_y().filter(|y| y.is_finite()) {
                    self.current.signal = self.smoother.push(y.clamp(0.0, 1.0));
                }
                self.current.calibrated = self.region.contains_pose(&pose);
            }
            None => {
                let was_lost = self.is_source_lost();
                self.misses = self.misses.saturating_add(1);
                if self.is_source_lost() {
                    self.current.calibrated = false;
                    if !was_lost {
                        log::warn!(
                            "Pose source returned nothing for {} polls in a row",
                            self.misses
                        );
                    }
                }
            }
        }
        self.current
    }

    /// True once the consecutive miss count has reached the tolerance
    pub fn is_source_lost(&self) -> bool {
        self.misses > 0 && self.misses >= self.miss_tolerance
    }

    pub fn current(&self) -> InputSnapshot {
        self.current
    }
}

/// Background thread feeding an [`InputCell`]
///
/// Stopped and joined by [`PoseProducer::stop`] or on drop.
#[derive(Debug)]
pub struct PoseProducer {
    stop_tx: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl PoseProducer {
    pub fn spawn<S>(
        mut source: S,
        cell: Arc<InputCell>,
        config: ProducerConfig,
    ) -> io::Result<Self>
    where
        S: PoseSource + 'static,
    {
        let (stop_tx, stop_rx) = bounded::<()>(0);
        let handle = std::thread::Builder::new()
            .name("pose-producer".into())
            .spawn(move || {
                log::info!("Pose producer started ({:?} poll)", config.poll_interval);
                let mut tracker = PoseTracker::new(&config);
                loop {
                    match stop_rx.recv_timeout(config.poll_interval) {
                        Err(RecvTimeoutError::Timeout) => {}
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                    let before = tracker.current().calibrated;
                    let snapshot = tracker.observe(source.next_pose());
                    if snapshot.calibrated != before {
                        let change = if snapshot.calibrated { "acquired" } else { "lost" };
                        log::debug!("Calibration {change}");
                    }
                    cell.publish(snapshot.signal, snapshot.calibrated);
                }
                log::info!("Pose producer stopped");
            })?;

        Ok(Self {
            stop_tx: Some(stop_tx),
            handle: Some(handle),
        })
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Signal the thread and wait for it. Idempotent.
    pub fn stop(&mut self) {
        // Dropping the sender disconnects the channel and wakes the thread
        self.stop_tx.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("Pose producer thread panicked");
            }
        }
    }
}

impl Drop for PoseProducer {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    fn standing(nose_y: f32) -> Pose {
        ScriptedPose::body(nose_y)
    }

    #[test]
    fn test_keypoint_indices() {
        assert_eq!(Keypoint::from_index(0), Some(Keypoint::Nose));
        assert_eq!(Keypoint::from_index(16), Some(Keypoint::RightAnkle));
        assert_eq!(Keypoint::from_index(17), None);
        for (i, kp) in Keypoint::ALL.iter().enumerate() {
            assert_eq!(kp.index(), i);
        }
    }

    #[test]
    fn test_region_requires_detection() {
        let region = CalibrationRegion::default();
        assert!(!region.contains_pose(&Pose::empty()));
        assert!(region.contains_pose(&standing(0.4)));
    }

    #[test]
    fn test_region_rejects_partial_body() {
        let region = CalibrationRegion::default();
        let pose = standing(0.4).with(Keypoint::LeftWrist, Vec2::new(0.05, 0.5));
        assert!(!region.contains_pose(&pose));
    }

    #[test]
    fn test_smoother_starts_neutral() {
        let mut smoother = SignalSmoother::new(2);
        assert_eq!(smoother.value(), 0.5);
        assert!((smoother.push(0.1) - 0.3).abs() < 1e-6);
        assert!((smoother.push(0.1) - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_smoother_zero_window() {
        let mut smoother = SignalSmoother::new(0);
        assert_eq!(smoother.push(0.2), 0.2);
    }

    #[test]
    fn test_tracker_keeps_signal_on_miss() {
        let config = ProducerConfig {
            smoothing_window: 1,
            ..Default::default()
        };
        let mut tracker = PoseTracker::new(&config);
        let snap = tracker.observe(Some(standing(0.2)));
        assert!(snap.calibrated);
        assert!((snap.signal - 0.2).abs() < 1e-6);

        let snap = tracker.observe(None);
        assert!((snap.signal - 0.2).abs() < 1e-6);
        assert!(snap.calibrated);
    }

    #[test]
    fn test_tracker_drops_calibration_after_tolerance() {
        let config = ProducerConfig::default();
        let mut tracker = PoseTracker::new(&config);
        tracker.observe(Some(standing(0.4)));
        assert!(tracker.observe(None).calibrated);
        assert!(tracker.observe(None).calibrated);
        assert!(!tracker.observe(None).calibrated);

        // A fresh detection restores it immediately
        assert!(tracker.observe(Some(standing(0.4))).calibrated);
    }

    #[test]
    fn test_tracker_flags_lost_source_at_tolerance() {
        let mut tracker = PoseTracker::new(&ProducerConfig::default());
        tracker.observe(Some(standing(0.4)));
        assert!(!tracker.is_source_lost());

        tracker.observe(None);
        tracker.observe(None);
        assert!(!tracker.is_source_lost());
        tracker.observe(None);
        assert!(tracker.is_source_lost());
        // Stays lost without re-warning while misses continue
        tracker.observe(None);
        assert!(tracker.is_source_lost());

        tracker.observe(Some(standing(0.4)));
        assert!(!tracker.is_source_lost());
    }

    #[test]
    fn test_tracker_ignores_missing_nose() {
        let config = ProducerConfig {
            smoothing_window: 1,
            ..Default::default()
        };
        let mut tracker = PoseTracker::new(&config);
        tracker.observe(Some(standing(0.3)));
        let headless = Pose::empty().with(Keypoint::LeftHip, Vec2::new(0.5, 0.7));
        let snap = tracker.observe(Some(headless));
        assert!((snap.signal - 0.3).abs() < 1e-6);
        assert!(snap.calibrated);
    }

    #[test]
    fn test_scripted_pose_bobs_inside_region() {
        let region = CalibrationRegion::default();
        let mut source = ScriptedPose::new(2.0, 0.01);
        let mut lo = f32::MAX;
        let mut hi = f32::MIN;
        for _ in 0..400 {
            let pose = source.next_pose().unwrap();
            assert!(region.contains_pose(&pose));
            let y = pose.nose_y().unwrap();
            lo = lo.min(y);
            hi = hi.max(y);
        }
        assert!(lo < 0.3);
        assert!(hi > 0.7);
    }

    #[test]
    fn test_scripted_dropouts() {
        let mut source = ScriptedPose::new(1.0, 0.01).with_dropouts(4);
        let misses = (0..20).filter(|_| source.next_pose().is_none()).count();
        assert_eq!(misses, 5);
    }

    #[test]
    fn test_closure_source() {
        let mut calls = 0;
        let mut source = move || {
            calls += 1;
            (calls % 2 == 0).then(Pose::empty)
        };
        assert!(source.next_pose().is_none());
        assert!(source.next_pose().is_some());
    }

    #[test]
    fn test_producer_publishes_and_stops() {
        let cell = Arc::new(InputCell::new());
        let config = ProducerConfig {
            poll_interval: Duration::from_millis(1),
            ..Default::default()
        };
        let source = || Some(ScriptedPose::body(0.25));
        let mut producer = PoseProducer::spawn(source, Arc::clone(&cell), config).unwrap();
        assert!(producer.is_running());

        let deadline = Instant::now() + Duration::from_secs(2);
        while !cell.snapshot().calibrated && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(1));
        }
        producer.stop();
        assert!(!producer.is_running());

        let snap = cell.snapshot();
        assert!(snap.calibrated);
        assert!(snap.signal < 0.5);

        // Idempotent
        producer.stop();
    }

    #[test]
    fn test_producer_stops_on_drop() {
        let cell = Arc::new(InputCell::new());
        let source = ScriptedPose::new(1.0, 0.01);
        let producer = PoseProducer::spawn(source, cell, ProducerConfig::default()).unwrap();
        drop(producer);
    }
}
