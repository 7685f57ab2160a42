//! Frame acquisition and presentation.

use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use opencv::core::{self, Mat, Size, Vector};
use opencv::prelude::*;
use opencv::{highgui, imgcodecs, imgproc, videoio};

use crate::drawing::Drawing;
use crate::paint::paint;
use crate::PoseCameraError;

const WINDOW: &str = "pose camera";
const KEY_ESC: i32 = 27;

const DEFAULT_MODEL_TEMPLATE: (&str, &str) = (
    "models/posenet_mobilenet_v1_075_",
    "_quant_decoder_edgetpu.tflite",
);

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Resolution {
    #[value(name = "480x360")]
    Res480x360,
    #[value(name = "640x480")]
    Res640x480,
    #[value(name = "1280x720")]
    Res1280x720,
}

impl Resolution {
    /// Size frames are captured at.
    pub fn src_size(self) -> Size {
        match self {
            Resolution::Res480x360 | Resolution::Res640x480 => Size::new(640, 480),
            Resolution::Res1280x720 => Size::new(1280, 720),
        }
    }

    /// Size frames are resized to before inference and drawing.
    pub fn appsink_size(self) -> Size {
        match self {
            Resolution::Res480x360 => Size::new(480, 360),
            Resolution::Res640x480 => Size::new(640, 480),
            Resolution::Res1280x720 => Size::new(1280, 720),
        }
    }

    /// Input tensor size of the default model.
    pub fn model_input_size(self) -> Size {
        match self {
            Resolution::Res480x360 => Size::new(481, 353),
            Resolution::Res640x480 => Size::new(641, 481),
            Resolution::Res1280x720 => Size::new(1281, 721),
        }
    }

    pub fn default_model(self) -> PathBuf {
        let input = self.model_input_size();
        let (prefix, suffix) = DEFAULT_MODEL_TEMPLATE;
        PathBuf::from(format!(
            "{prefix}{}_{}{suffix}",
            input.height, input.width
        ))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub src_size: Size,
    pub appsink_size: Size,
    /// Paint the overlay onto the full capture-size frame instead of the processed frame.
    pub use_appsrc: bool,
    pub mirror: bool,
    pub videosrc: String,
    pub h264: bool,
}

impl PipelineConfig {
    /// Scale from processing-size geometry to the presented frame.
    pub fn overlay_scale(&self) -> f64 {
        if self.use_appsrc {
            f64::from(self.src_size.width) / f64::from(self.appsink_size.width)
        } else {
            1.0
        }
    }
}

/// A captured frame, before and after resizing to the processing size.
pub struct Frame {
    pub source: Mat,
    pub image: Mat,
}

pub struct CameraSource {
    capture: videoio::VideoCapture,
    appsink_size: Size,
    mirror: bool,
}

impl CameraSource {
    pub fn new(config: &PipelineConfig) -> anyhow::Result<Self> {
        let mut capture = videoio::VideoCapture::from_file(&config.videosrc, videoio::CAP_ANY)?;
        if !capture.is_opened()? {
            return Err(PoseCameraError::CameraUnavailable(config.videosrc.clone()).into());
        }
        if config.h264 {
            let fourcc = videoio::VideoWriter::fourcc('H', '2', '6', '4')?;
            capture.set(videoio::CAP_PROP_FOURCC, f64::from(fourcc))?;
        }
        capture.set(
            videoio::CAP_PROP_FRAME_WIDTH,
            f64::from(config.src_size.width),
        )?;
        capture.set(
            videoio::CAP_PROP_FRAME_HEIGHT,
            f64::from(config.src_size.height),
        )?;
        log::info!(
            "Opened {} at {}x{}",
            config.videosrc,
            capture.get(videoio::CAP_PROP_FRAME_WIDTH)?,
            capture.get(videoio::CAP_PROP_FRAME_HEIGHT)?
        );
        Ok(Self {
            capture,
            appsink_size: config.appsink_size,
            mirror: config.mirror,
        })
    }

    /// Reads the next frame. Returns `None` once the source is exhausted.
    pub fn next_frame(&mut self) -> anyhow::Result<Option<Frame>> {
        loop {
            let mut frame = Mat::default();
            if !self.capture.read(&mut frame)? {
                return Ok(None);
            }
            if frame.size()?.width == 0 {
                thread::sleep(Duration::from_millis(50));
                continue;
            }
            if self.mirror {
                let mut flipped = Mat::default();
                core::flip(&frame, &mut flipped, 1)?;
                frame = flipped;
            }
            let image = resize(&frame, self.appsink_size)?;
            return Ok(Some(Frame {
                source: frame,
                image,
            }));
        }
    }
}

pub fn resize(frame: &Mat, size: Size) -> opencv::Result<Mat> {
    if frame.size()? == size {
        return Ok(frame.clone());
    }
    let mut resized = Mat::default();
    imgproc::resize(frame, &mut resized, size, 0.0, 0.0, imgproc::INTER_LINEAR)?;
    Ok(resized)
}

pub fn jpeg_to_mat(data: &[u8]) -> opencv::Result<Mat> {
    let buffer = Vector::<u8>::from_slice(data);
    imgcodecs::imdecode(&buffer, imgcodecs::IMREAD_COLOR)
}

pub fn mat_to_jpeg(frame: &Mat) -> opencv::Result<Vec<u8>> {
    let mut buffer: Vector<u8> = Default::default();
    imgcodecs::imencode_def(".jpg", frame, &mut buffer)?;
    Ok(buffer.to_vec())
}

/// Paints `drawing` onto `frame` and shows it. Returns `false` when the user asked to quit.
pub fn present(frame: &mut Mat, drawing: &Drawing, scale: f64) -> anyhow::Result<bool> {
    paint(drawing, frame, scale)?;
    highgui::imshow(WINDOW, &*frame)?;
    let key = highgui::poll_key()?;
    Ok(key != KEY_ESC && key != i32::from(b'q'))
}

/// Captures frames until the source is exhausted or the window is closed, calling `callback`
/// with each processed frame and a fresh overlay drawing.
pub fn run_pipeline<F>(mut callback: F, config: &PipelineConfig) -> anyhow::Result<()>
where
    F: FnMut(&Mat, &mut Drawing) -> anyhow::Result<()>,
{
    highgui::named_window_def(WINDOW)?;
    let mut camera_source = CameraSource::new(config)?;
    let scale = config.overlay_scale();

    while let Some(frame) = camera_source.next_frame()? {
        let mut drawing = Drawing::new(config.appsink_size.width, config.appsink_size.height);
        callback(&frame.image, &mut drawing)?;

        let mut presented = if config.use_appsrc {
            frame.source
        } else {
            frame.image
        };
        if !present(&mut presented, &drawing, scale)? {
            log::info!("Stopped by user");
            return Ok(());
        }
    }
    log::info!("Video source exhausted");
    Ok(())
}
