//! Pose inference engines.

use std::path::Path;

use anyhow::Context;
use opencv::core::{self, Mat, Scalar, Size, Vector, CV_32F};
use opencv::dnn;
use opencv::prelude::*;

use crate::pose::{BodyPart, Keypoint, Pose};
use crate::PoseCameraError;

/// Runs pose inference on a frame.
pub trait PoseEngine {
    /// Labels of the keypoints this engine emits.
    fn labels(&self) -> Vec<&'static str> {
        BodyPart::labels().to_vec()
    }

    /// Detects poses in `image`, returning them together with the inference time in
    /// milliseconds as measured by the engine.
    fn detect_poses(&mut self, image: &Mat) -> anyhow::Result<(Vec<Pose>, f64)>;
}

impl<E: PoseEngine + ?Sized> PoseEngine for Box<E> {
    fn labels(&self) -> Vec<&'static str> {
        (**self).labels()
    }

    fn detect_poses(&mut self, image: &Mat) -> anyhow::Result<(Vec<Pose>, f64)> {
        (**self).detect_poses(image)
    }
}

/// PoseNet model with the pose decoder in the graph, run through OpenCV's DNN module.
///
/// The model has four outputs: keypoint coordinates `[N, 17, 2]` as (y, x) in input tensor
/// pixels, keypoint scores `[N, 17]`, pose scores `[N]` and the number of valid poses `[1]`.
pub struct DnnPoseEngine {
    net: dnn::Net,
    output_names: Vector<String>,
    input_size: Size,
}

impl DnnPoseEngine {
    /// Loads the model at `model`. `input_size` is the size of the model's input tensor.
    pub fn new(model: &Path, input_size: Size) -> anyhow::Result<Self> {
        let model = model.to_string_lossy();
        let net = dnn::read_net(&model, "", "").with_context(|| {
            format!(
                "OpenCV DNN could not import {model}. Edge TPU builds need a converted model passed with --model"
            )
        })?;
        let output_names = net.get_unconnected_out_layers_names()?;
        log::debug!(
            "Model outputs {:?}, input {}x{}",
            output_names,
            input_size.width,
            input_size.height
        );
        Ok(Self {
            net,
            output_names,
            input_size,
        })
    }
}

impl PoseEngine for DnnPoseEngine {
    fn detect_poses(&mut self, image: &Mat) -> anyhow::Result<(Vec<Pose>, f64)> {
        let blob = dnn::blob_from_image(
            image,
            1.0,
            self.input_size,
            Scalar::default(),
            true,
            false,
            CV_32F,
        )?;
        self.net.set_input(&blob, "", 1.0, Scalar::default())?;

        let mut outputs: Vector<Mat> = Vector::new();
        self.net.forward(&mut outputs, &self.output_names)?;

        let mut layer_times: Vector<f64> = Vector::new();
        let ticks = self.net.get_perf_profile(&mut layer_times)?;
        let inference_ms = ticks as f64 * 1000.0 / core::get_tick_frequency()?;

        let mut tensors = Vec::with_capacity(outputs.len());
        for (name, output) in self.output_names.iter().zip(&outputs) {
            tensors.push((name, output.data_typed::<f32>()?.to_vec()));
        }
        let decoded = PosenetOutputs::classify(tensors)?;

        let scale = (
            image.cols() as f32 / self.input_size.width as f32,
            image.rows() as f32 / self.input_size.height as f32,
        );
        Ok((decoded.poses(scale), inference_ms))
    }
}

/// Raw decoder outputs, identified by their element counts.
#[derive(Debug, Clone, PartialEq)]
pub struct PosenetOutputs {
    pub keypoints: Vec<f32>,
    pub keypoint_scores: Vec<f32>,
    pub pose_scores: Vec<f32>,
    pub count: usize,
}

impl PosenetOutputs {
    /// Sorts the four named output tensors by size: count `1`, pose scores `N`, keypoint
    /// scores `17N`, keypoint coordinates `34N`.
    ///
    /// A single-pose model has two tensors of size 1. The count is then the one whose name
    /// mentions a count, and the layout is rejected when the names do not tell them apart.
    pub fn classify(mut tensors: Vec<(String, Vec<f32>)>) -> Result<Self, PoseCameraError> {
        if tensors.len() != 4 {
            return Err(PoseCameraError::MalformedOutput(format!(
                "expected 4 output tensors, got {}",
                tensors.len()
            )));
        }
        tensors.sort_by_key(|(name, data)| (data.len(), !is_count_name(name)));
        let (_, keypoints) = tensors.pop().unwrap_or_default();
        let (_, keypoint_scores) = tensors.pop().unwrap_or_default();
        let (scores_name, pose_scores) = tensors.pop().unwrap_or_default();
        let (count_name, count) = tensors.pop().unwrap_or_default();

        if pose_scores.len() == 1 && (!is_count_name(&count_name) || is_count_name(&scores_name))
        {
            return Err(PoseCameraError::MalformedOutput(format!(
                "cannot tell the pose count from the pose scores in outputs {count_name:?} and {scores_name:?}"
            )));
        }

        let parts = BodyPart::ALL.len();
        let n = pose_scores.len();
        if count.len() != 1 || keypoint_scores.len() != n * parts || keypoints.len() != n * parts * 2
        {
            return Err(PoseCameraError::MalformedOutput(format!(
                "unexpected output sizes {}, {}, {}, {}",
                count.len(),
                pose_scores.len(),
                keypoint_scores.len(),
                keypoints.len()
            )));
        }

        Ok(Self {
            keypoints,
            keypoint_scores,
            pose_scores,
            count: (count[0].max(0.0) as usize).min(n),
        })
    }

    /// Builds poses, scaling keypoints from input tensor pixels to image pixels by `scale`
    /// (x, y).
    pub fn poses(&self, scale: (f32, f32)) -> Vec<Pose> {
        let parts = BodyPart::ALL.len();
        (0..self.count)
            .map(|pose_index| {
                let mut pose = Pose::new(self.pose_scores[pose_index]);
                for (part_index, part) in BodyPart::ALL.into_iter().enumerate() {
                    let i = pose_index * parts + part_index;
                    let y = self.keypoints[i * 2];
                    let x = self.keypoints[i * 2 + 1];
                    pose.insert(Keypoint::new(
                        part,
                        x * scale.0,
                        y * scale.1,
                        self.keypoint_scores[i],
                    ));
                }
                pose
            })
            .collect()
    }
}

fn is_count_name(name: &str) -> bool {
    let name = name.to_ascii_lowercase();
    name.contains("count") || name.contains("num")
}

/// Reports no poses and a fixed inference time. Used to run the overlay without a model.
#[derive(Debug, Clone)]
pub struct StubEngine {
    inference_ms: f64,
}

impl StubEngine {
    pub fn new(inference_ms: f64) -> Self {
        Self { inference_ms }
    }
}

impl Default for StubEngine {
    fn default() -> Self {
        Self::new(100.0)
    }
}

impl PoseEngine for StubEngine {
    fn detect_poses(&mut self, _image: &Mat) -> anyhow::Result<(Vec<Pose>, f64)> {
        Ok((Vec::new(), self.inference_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn outputs(n: usize, count: f32) -> Vec<(String, Vec<f32>)> {
        let parts = BodyPart::ALL.len();
        let keypoints: Vec<f32> = (0..n * parts)
            .flat_map(|i| [i as f32, 2.0 * i as f32])
            .collect();
        let keypoint_scores: Vec<f32> = (0..n * parts).map(|i| i as f32 / 100.0).collect();
        let pose_scores: Vec<f32> = (0..n).map(|i| 0.5 + i as f32 / 10.0).collect();
        // deliberately out of order
        vec![
            ("pose_scores".to_string(), pose_scores),
            ("num_poses".to_string(), vec![count]),
            ("keypoints".to_string(), keypoints),
            ("keypoint_scores".to_string(), keypoint_scores),
        ]
    }

    #[test]
    fn decodes_poses_in_count() {
        let decoded = PosenetOutputs::classify(outputs(10, 2.0)).unwrap();
        let poses = decoded.poses((1.0, 1.0));

        assert_eq!(poses.len(), 2);
        assert_eq!(poses[0].len(), 17);
        assert_relative_eq!(poses[1].score(), 0.6);

        let nose = poses[1].get(BodyPart::Nose).unwrap();
        // keypoint 17: y = 17, x = 34
        assert_eq!((nose.x, nose.y), (34.0, 17.0));
        assert_relative_eq!(nose.score, 0.17);
    }

    #[test]
    fn scales_to_image_pixels() {
        let decoded = PosenetOutputs::classify(outputs(1, 1.0)).unwrap();
        let poses = decoded.poses((2.0, 0.5));
        let left_eye = poses[0].get(BodyPart::LeftEye).unwrap();
        assert_eq!((left_eye.x, left_eye.y), (4.0, 0.5));
    }

    #[test]
    fn count_is_clamped_to_available_poses() {
        let decoded = PosenetOutputs::classify(outputs(3, 7.0)).unwrap();
        assert_eq!(decoded.count, 3);
        let decoded = PosenetOutputs::classify(outputs(3, -1.0)).unwrap();
        assert!(decoded.poses((1.0, 1.0)).is_empty());
    }

    #[test]
    fn rejects_wrong_layouts() {
        assert!(matches!(
            PosenetOutputs::classify(vec![("count".to_string(), vec![1.0])]),
            Err(PoseCameraError::MalformedOutput(_))
        ));
        let mut tensors = outputs(2, 1.0);
        tensors[2].1.pop();
        assert!(PosenetOutputs::classify(tensors).is_err());
    }

    #[test]
    fn single_pose_count_is_found_by_name() {
        // pose scores come before the count, a size-only sort would swap them
        let mut tensors = outputs(1, 1.0);
        tensors[0].1 = vec![0.63];
        let decoded = PosenetOutputs::classify(tensors).unwrap();
        assert_eq!(decoded.count, 1);
        assert_relative_eq!(decoded.pose_scores[0], 0.63);

        let mut tensors = outputs(1, 1.0);
        tensors.reverse();
        assert_eq!(PosenetOutputs::classify(tensors).unwrap().count, 1);
    }

    #[test]
    fn single_pose_without_count_name_is_rejected() {
        let mut tensors = outputs(1, 1.0);
        tensors[1].0 = "Identity_3".to_string();
        assert!(matches!(
            PosenetOutputs::classify(tensors),
            Err(PoseCameraError::MalformedOutput(_))
        ));
    }

    #[test]
    fn stub_engine_reports_nothing() {
        let mut engine = StubEngine::default();
        let (poses, inference_ms) = engine.detect_poses(&Mat::default()).unwrap();
        assert!(poses.is_empty());
        assert_eq!(inference_ms, 100.0);
        assert_eq!(engine.labels().len(), 17);
    }
}
