use std::path::PathBuf;

use clap::Parser;
use opencv::prelude::*;
use pose_camera::config::ZenohArgs;
use pose_camera::pipeline::present;
use pose_camera::remote::{open_session, IMAGE_TOPIC, OVERLAY_TOPIC};
use pose_camera::{
    jpeg_to_mat, DnnPoseEngine, Drawing, PoseCameraError, PoseEngine, PoseOverlay, Resolution,
    StubEngine,
};
use zenoh::prelude::r#async::*;

/// Draws pose skeletons over frames received from a camera driver and publishes the overlay.
#[derive(Parser, Debug)]
#[command()]
struct Args {
    /// PoseNet model with the pose decoder, in a format OpenCV DNN can import.
    ///
    /// Defaults to the Edge TPU model matching --res. Those use a custom decoder op that
    /// OpenCV cannot load, so pass a converted model here when running with OpenCV DNN.
    #[arg(long)]
    model: Option<PathBuf>,

    /// Resolution of the received frames.
    #[arg(long, value_enum, default_value = "640x480")]
    res: Resolution,

    /// Skip inference and only draw statistics.
    #[arg(long)]
    no_inference: bool,

    #[command(flatten)]
    zenoh: ZenohArgs,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    pose_camera::init_logger!();
    let args: Args = Args::parse();

    let engine: Box<dyn PoseEngine> = if args.no_inference {
        Box::<StubEngine>::default()
    } else {
        let model = args.model.unwrap_or_else(|| args.res.default_model());
        log::info!("Loading model: {}", model.display());
        Box::new(DnnPoseEngine::new(&model, args.res.model_input_size())?)
    };
    let mut overlay = PoseOverlay::new(engine)?;

    let zenoh_session = open_session(&args.zenoh).await?;

    let subscriber = zenoh_session
        .declare_subscriber(IMAGE_TOPIC)
        .best_effort()
        .res()
        .await
        .map_err(PoseCameraError::ZenohError)?;

    let publisher = zenoh_session
        .declare_publisher(OVERLAY_TOPIC)
        .congestion_control(CongestionControl::Drop)
        .res()
        .await
        .map_err(PoseCameraError::ZenohError)?;

    loop {
        let msg = subscriber.recv_async().await?;
        let payload: Vec<u8> = msg.value.try_into()?;

        let mut frame = jpeg_to_mat(&payload)?;
        let mut drawing = Drawing::new(frame.cols(), frame.rows());
        overlay.render(&frame, &mut drawing)?;

        publisher
            .put(drawing.to_svg())
            .res()
            .await
            .map_err(PoseCameraError::ZenohError)?;

        if !present(&mut frame, &drawing, 1.0)? {
            return Ok(());
        }
    }
}
