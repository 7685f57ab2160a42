//! Running frame statistics.

use std::fmt;
use std::time::Instant;

/// Running sums over every frame since the accumulator was created.
///
/// Averages are plain means over all frames, not a sliding window.
#[derive(Debug, Clone)]
pub struct FrameStats {
    frames: u32,
    fps_samples: u32,
    sum_fps: f64,
    sum_process_ms: f64,
    sum_inference_ms: f64,
    last_time: Instant,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Averages {
    pub inference_ms: f64,
    pub process_ms: f64,
    pub fps: f64,
}

impl FrameStats {
    /// Starts accumulating. `start` seeds the timestamp the first frame's FPS is measured from.
    pub fn new(start: Instant) -> Self {
        Self {
            frames: 0,
            fps_samples: 0,
            sum_fps: 0.0,
            sum_process_ms: 0.0,
            sum_inference_ms: 0.0,
            last_time: start,
        }
    }

    /// Records one frame processed between `start` and `end`, of which the engine reported
    /// spending `inference_ms` on inference.
    ///
    /// A frame finishing at the same instant as the previous one adds no FPS sample.
    pub fn record(&mut self, start: Instant, end: Instant, inference_ms: f64) {
        self.frames += 1;

        let since_last = end.saturating_duration_since(self.last_time).as_secs_f64();
        if since_last > 0.0 {
            self.sum_fps += 1.0 / since_last;
            self.fps_samples += 1;
        }

        let wall_ms = end.saturating_duration_since(start).as_secs_f64() * 1000.0;
        self.sum_process_ms += wall_ms - inference_ms;
        self.sum_inference_ms += inference_ms;
        self.last_time = end;
    }

    pub fn frames(&self) -> u32 {
        self.frames
    }

    pub fn averages(&self) -> Averages {
        let mean = |sum: f64, n: u32| if n == 0 { 0.0 } else { sum / f64::from(n) };
        Averages {
            inference_ms: mean(self.sum_inference_ms, self.frames),
            process_ms: mean(self.sum_process_ms, self.frames),
            fps: mean(self.sum_fps, self.fps_samples),
        }
    }

    pub fn status_line(&self, poses: usize) -> StatusLine {
        StatusLine {
            averages: self.averages(),
            poses,
        }
    }
}

/// The per-frame status text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatusLine {
    pub averages: Averages,
    pub poses: usize,
}

impl fmt::Display for StatusLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PoseNet: {:.1}ms Frame IO: {:.2}ms TrueFPS: {:.2} Nposes {}",
            self.averages.inference_ms, self.averages.process_ms, self.averages.fps, self.poses
        )
    }
}
