use clap::Parser;
use pose_camera::config::PoseArgs;
use pose_camera::{run_pipeline, PoseOverlay, StubEngine};

/// Runs the overlay loop with inference stubbed out.
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

    log::info!("Inference disabled, would load {}", args.pose.model_path().display());
    let mut overlay = PoseOverlay::new(StubEngine::default())?;

    run_pipeline(
        |image, drawing| {
            overlay.render(image, drawing)?;
            Ok(())
        },
        &args.pose.pipeline_config(args.source_overlay),
    )
}
