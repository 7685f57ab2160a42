use clap::Parser;
use pose_camera::config::PoseArgs;
use pose_camera::{run_pipeline, DnnPoseEngine, PoseOverlay};

/// Draws pose skeletons over a camera stream.
#[derive(Parser, Debug)]
#[command()]
struct Args {
    #[command(flatten)]
    pose: PoseArgs,

    /// Paint the overlay on the full capture-size frame.
    #[arg(long)]
    source_overlay: bool,
}

fn main() -> anyhow::Result<()> {
    pose_camera::init_logger!();
    let args: Args = Args::parse();

    let model = args.pose.model_path();
    log::info!("Loading model: {}", model.display());
    let engine = DnnPoseEngine::new(&model, args.pose.res.model_input_size())?;
    let mut overlay = PoseOverlay::new(engine)?;

    run_pipeline(
        |image, drawing| {
            overlay.render(image, drawing)?;
            Ok(())
        },
        &args.pose.pipeline_config(args.source_overlay),
    )
}
