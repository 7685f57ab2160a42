use clap::Parser;
use pose_camera::config::{PoseArgs, ZenohArgs};
use pose_camera::remote::{open_session, IMAGE_TOPIC};
use pose_camera::{mat_to_jpeg, CameraSource, PoseCameraError};
use zenoh::prelude::r#async::*;

/// Publishes processed camera frames as JPEG.
#[derive(Parser, Debug)]
#[command()]
struct Args {
    #[command(flatten)]
    pose: PoseArgs,

    #[command(flatten)]
    zenoh: ZenohArgs,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    pose_camera::init_logger!();
    let args: Args = Args::parse();

    let zenoh_session = open_session(&args.zenoh).await?;

    let publisher = zenoh_session
        .declare_publisher(IMAGE_TOPIC)
        .congestion_control(CongestionControl::Drop)
        .priority(Priority::InteractiveHigh)
        .res()
        .await
        .map_err(PoseCameraError::ZenohError)?;

    let mut camera_source = CameraSource::new(&args.pose.pipeline_config(false))?;

    while let Some(frame) = camera_source.next_frame()? {
        let data = mat_to_jpeg(&frame.image)?;

        publisher
            .put(data)
            .res()
            .await
            .map_err(PoseCameraError::ZenohError)?;
    }
    log::info!("Video source exhausted");
    Ok(())
}
