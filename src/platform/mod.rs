//! Platform layer
//!
//! Everything between the camera side and the simulation:
//! - `input`: the lock-free cell the game loop reads each frame
//! - `pose`: keypoint types, calibration geometry and the producer thread

pub mod input;
pub mod pose;

pub use input::{InputCell, InputSnapshot};
pub use pose::{
    CalibrationRegion, Keypoint, Pose, PoseProducer, PoseSource, ProducerConfig, ScriptedPose,
    SignalSmoother,
};
