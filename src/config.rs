//! Command line arguments shared by the binaries.

use std::path::PathBuf;

use clap::Args;

use crate::pipeline::{PipelineConfig, Resolution};

#[derive(Args, Debug, Clone)]
pub struct PoseArgs {
    /// Flip video horizontally.
    #[arg(long)]
    pub mirror: bool,

    /// PoseNet model with the pose decoder, in a format OpenCV DNN can import.
    ///
    /// Defaults to the Edge TPU model matching --res. Those use a custom decoder op that
    /// OpenCV cannot load, so pass a converted model here when running with OpenCV DNN.
    #[arg(long)]
    pub model: Option<PathBuf>,

    /// Resolution.
    #[arg(long, value_enum, default_value = "640x480")]
    pub res: Resolution,

    /// Which video source to use.
    #[arg(long, default_value = "/dev/video0")]
    pub videosrc: String,

    /// Request H.264 compressed input from the camera.
    #[arg(long)]
    pub h264: bool,
}

impl PoseArgs {
    pub fn model_path(&self) -> PathBuf {
        self.model
            .clone()
            .unwrap_or_else(|| self.res.default_model())
    }

    pub fn pipeline_config(&self, use_appsrc: bool) -> PipelineConfig {
        PipelineConfig {
            src_size: self.res.src_size(),
            appsink_size: self.res.appsink_size(),
            use_appsrc,
            mirror: self.mirror,
            videosrc: self.videosrc.clone(),
            h264: self.h264,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct ZenohArgs {
    /// Endpoints to connect to.
    #[arg(short = 'e', long)]
    pub connect: Vec<zenoh_config::EndPoint>,

    /// Endpoints to listen on.
    #[arg(long)]
    pub listen: Vec<zenoh_config::EndPoint>,
}
