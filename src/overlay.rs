use std::time::Instant;

use opencv::core::Mat;

use crate::drawing::{shadow_text, Color, Drawing, DEFAULT_FONT_SIZE};
use crate::engine::PoseEngine;
use crate::metrics::{FrameStats, StatusLine};
use crate::pose::DEFAULT_THRESHOLD;
use crate::skeleton::{draw_pose, validate_topology};

/// Where the status line is drawn.
pub const STATUS_POSITION: (i32, i32) = (10, 20);

/// Per-frame callback: runs inference, updates the frame statistics and draws the overlay.
pub struct PoseOverlay<E> {
    engine: E,
    stats: FrameStats,
    color: Color,
    threshold: f32,
}

impl<E: PoseEngine> PoseOverlay<E> {
    /// Fails if the skeleton references a keypoint the engine does not emit.
    pub fn new(engine: E) -> anyhow::Result<Self> {
        validate_topology(&engine.labels())?;
        Ok(Self {
            engine,
            stats: FrameStats::new(Instant::now()),
            color: Color::Yellow,
            threshold: DEFAULT_THRESHOLD,
        })
    }

    pub fn stats(&self) -> &FrameStats {
        &self.stats
    }

    /// Processes one frame and draws onto `drawing`.
    pub fn render(&mut self, image: &Mat, drawing: &mut Drawing) -> anyhow::Result<StatusLine> {
        let start_time = Instant::now();
        let (poses, inference_ms) = self.engine.detect_poses(image)?;
        let end_time = Instant::now();
        self.stats.record(start_time, end_time, inference_ms);

        let status = self.stats.status_line(poses.len());
        let text = status.to_string();
        println!("{text}");

        let (x, y) = STATUS_POSITION;
        shadow_text(drawing, x, y, &text, DEFAULT_FONT_SIZE);
        for pose in &poses {
            draw_pose(drawing, pose, self.color, self.threshold);
        }
        Ok(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drawing::Shape;
    use crate::pose::{BodyPart, Pose};

    struct NoLeftKnee;

    impl PoseEngine for NoLeftKnee {
        fn labels(&self) -> Vec<&'static str> {
            BodyPart::labels()
                .into_iter()
                .filter(|label| *label != "left knee")
                .collect()
        }

        fn detect_poses(&mut self, _image: &Mat) -> anyhow::Result<(Vec<Pose>, f64)> {
            Ok((Vec::new(), 0.0))
        }
    }

    #[test]
    fn refuses_engine_missing_skeleton_labels() {
        assert!(PoseOverlay::new(NoLeftKnee).is_err());
    }

    #[test]
    fn status_line_is_drawn_first() {
        let mut overlay = PoseOverlay::new(crate::engine::StubEngine::default()).unwrap();
        let mut drawing = Drawing::new(640, 480);
        let status = overlay.render(&Mat::default(), &mut drawing).unwrap();

        match &drawing.shapes()[1] {
            Shape::Text { insert, text, .. } => {
                assert_eq!(*insert, STATUS_POSITION);
                assert_eq!(*text, status.to_string());
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
