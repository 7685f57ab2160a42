//! Frame and overlay transport over zenoh.

use std::sync::Arc;

use zenoh::prelude::r#async::*;

use crate::config::ZenohArgs;
use crate::PoseCameraError;

/// JPEG encoded processed frames.
pub const IMAGE_TOPIC: &str = "pose-camera/image";
/// SVG overlay for the most recent frame.
pub const OVERLAY_TOPIC: &str = "pose-camera/overlay";

pub fn zenoh_config(args: &ZenohArgs) -> Config {
    let mut zenoh_config = Config::default();
    if !args.listen.is_empty() {
        zenoh_config.listen.endpoints = args.listen.clone();
        log::info!(
            "Configured listening endpoints {:?}",
            zenoh_config.listen.endpoints
        );
    }
    if !args.connect.is_empty() {
        zenoh_config.connect.endpoints = args.connect.clone();
        log::info!(
            "Configured connect endpoints {:?}",
            zenoh_config.connect.endpoints
        );
    }
    zenoh_config
}

pub async fn open_session(args: &ZenohArgs) -> Result<Arc<zenoh::Session>, PoseCameraError> {
    let zenoh_session = zenoh::open(zenoh_config(args))
        .res()
        .await
        .map_err(PoseCameraError::ZenohError)?;
    Ok(zenoh_session.into_arc())
}
