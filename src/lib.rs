//! Real-time pose skeleton overlay for camera streams.
//!
//! Frames are captured with OpenCV, passed through a [`engine::PoseEngine`] and annotated by
//! [`overlay::PoseOverlay`] with the detected skeletons, a decorative red nose and running
//! performance statistics.

use log::LevelFilter;
use thiserror::Error;

pub mod config;
pub mod drawing;
pub mod engine;
pub mod metrics;
pub mod overlay;
pub mod paint;
pub mod pipeline;
pub mod pose;
pub mod remote;
pub mod skeleton;

pub use drawing::{Color, Drawing, Shape};
pub use engine::{DnnPoseEngine, PoseEngine, StubEngine};
pub use metrics::{Averages, FrameStats, StatusLine};
pub use overlay::PoseOverlay;
pub use pipeline::{jpeg_to_mat, mat_to_jpeg, run_pipeline, CameraSource, PipelineConfig, Resolution};
pub use pose::{BodyPart, Keypoint, Pose};

#[derive(Error, Debug)]
pub enum PoseCameraError {
    #[error("Zenoh error {0:?}")]
    ZenohError(#[from] zenoh::Error),
    #[error("Skeleton uses keypoint {0:?} which the engine does not emit")]
    UnknownSkeletonLabel(String),
    #[error("Unknown keypoint label {0:?}")]
    UnknownLabel(String),
    #[error("Unexpected model output: {0}")]
    MalformedOutput(String),
    #[error("Unable to open video source {0}")]
    CameraUnavailable(String),
}

/// macro-use only, not part of public API.
#[doc(hidden)]
pub fn init_logger(calling_crate: &'static str) {
    let log_level = LevelFilter::Debug;
    env_logger::Builder::new()
        .filter(Some(calling_crate), log_level)
        .filter(Some(env!("CARGO_CRATE_NAME")), log_level)
        .filter(Some("zenoh"), LevelFilter::Warn)
        .parse_default_env()
        .try_init()
        .ok();
}

/// Initializes logging to *stderr* at *debug* level for the calling crate and this library.
///
/// `RUST_LOG` overrides the defaults. Does nothing if a logger is already registered.
#[macro_export]
macro_rules! init_logger {
    () => {
        $crate::init_logger(env!("CARGO_CRATE_NAME"))
    };
}
