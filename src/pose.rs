use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::PoseCameraError;

/// Minimum keypoint score for a keypoint to be drawn or used in derived geometry.
pub const DEFAULT_THRESHOLD: f32 = 0.2;

/// The 17 keypoint labels a body pose model emits, in model output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BodyPart {
    Nose,
    LeftEye,
    RightEye,
    LeftEar,
    RightEar,
    LeftShoulder,
    RightShoulder,
    LeftElbow,
    RightElbow,
    LeftWrist,
    RightWrist,
    LeftHip,
    RightHip,
    LeftKnee,
    RightKnee,
    LeftAnkle,
    RightAnkle,
}

impl BodyPart {
    pub const ALL: [BodyPart; 17] = [
        BodyPart::Nose,
        BodyPart::LeftEye,
        BodyPart::RightEye,
        BodyPart::LeftEar,
        BodyPart::RightEar,
        BodyPart::LeftShoulder,
        BodyPart::RightShoulder,
        BodyPart::LeftElbow,
        BodyPart::RightElbow,
        BodyPart::LeftWrist,
        BodyPart::RightWrist,
        BodyPart::LeftHip,
        BodyPart::RightHip,
        BodyPart::LeftKnee,
        BodyPart::RightKnee,
        BodyPart::LeftAnkle,
        BodyPart::RightAnkle,
    ];

    pub fn label(self) -> &'static str {
        match self {
            BodyPart::Nose => "nose",
            BodyPart::LeftEye => "left eye",
            BodyPart::RightEye => "right eye",
            BodyPart::LeftEar => "left ear",
            BodyPart::RightEar => "right ear",
            BodyPart::LeftShoulder => "left shoulder",
            BodyPart::RightShoulder => "right shoulder",
            BodyPart::LeftElbow => "left elbow",
            BodyPart::RightElbow => "right elbow",
            BodyPart::LeftWrist => "left wrist",
            BodyPart::RightWrist => "right wrist",
            BodyPart::LeftHip => "left hip",
            BodyPart::RightHip => "right hip",
            BodyPart::LeftKnee => "left knee",
            BodyPart::RightKnee => "right knee",
            BodyPart::LeftAnkle => "left ankle",
            BodyPart::RightAnkle => "right ankle",
        }
    }

    /// All labels, in model output order.
    pub fn labels() -> [&'static str; 17] {
        Self::ALL.map(BodyPart::label)
    }
}

impl fmt::Display for BodyPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for BodyPart {
    type Err = PoseCameraError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BodyPart::ALL
            .into_iter()
            .find(|part| part.label() == s)
            .ok_or_else(|| PoseCameraError::UnknownLabel(s.to_owned()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Keypoint {
    pub part: BodyPart,
    /// Position in image pixels.
    pub x: f32,
    pub y: f32,
    pub score: f32,
}

impl Keypoint {
    pub fn new(part: BodyPart, x: f32, y: f32, score: f32) -> Self {
        Self { part, x, y, score }
    }

    pub fn is_visible(&self, threshold: f32) -> bool {
        self.score >= threshold
    }

    /// Pixel position truncated toward zero.
    pub fn pixel(&self) -> (i32, i32) {
        (self.x as i32, self.y as i32)
    }
}

/// One detected person in one frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Pose {
    keypoints: BTreeMap<BodyPart, Keypoint>,
    score: f32,
}

impl Pose {
    pub fn new(score: f32) -> Self {
        Self {
            keypoints: BTreeMap::new(),
            score,
        }
    }

    pub fn with_keypoint(mut self, keypoint: Keypoint) -> Self {
        self.insert(keypoint);
        self
    }

    /// Inserts a keypoint, replacing any previous keypoint for the same body part.
    pub fn insert(&mut self, keypoint: Keypoint) {
        self.keypoints.insert(keypoint.part, keypoint);
    }

    pub fn get(&self, part: BodyPart) -> Option<&Keypoint> {
        self.keypoints.get(&part)
    }

    pub fn keypoints(&self) -> impl Iterator<Item = &Keypoint> {
        self.keypoints.values()
    }

    pub fn len(&self) -> usize {
        self.keypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keypoints.is_empty()
    }

    pub fn score(&self) -> f32 {
        self.score
    }
}

/// Pixel positions of the keypoints whose score reaches `threshold`.
pub fn visible_keypoints(pose: &Pose, threshold: f32) -> BTreeMap<BodyPart, (i32, i32)> {
    pose.keypoints()
        .filter(|keypoint| keypoint.is_visible(threshold))
        .map(|keypoint| (keypoint.part, keypoint.pixel()))
        .collect()
}
