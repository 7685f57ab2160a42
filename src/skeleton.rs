use std::collections::{BTreeMap, HashSet};

use crate::drawing::{Color, Drawing};
use crate::pose::{visible_keypoints, BodyPart, Pose};
use crate::PoseCameraError;

pub const KEYPOINT_RADIUS: i32 = 5;
pub const EDGE_WIDTH: i32 = 2;

/// Ear distance is divided by this to get the radius of the nose decoration.
const NOSE_RADIUS_DIVISOR: f32 = 1.4;

/// Anatomically valid keypoint connections.
pub const EDGES: [(BodyPart, BodyPart); 19] = [
    (BodyPart::Nose, BodyPart::LeftEye),
    (BodyPart::Nose, BodyPart::RightEye),
    (BodyPart::Nose, BodyPart::LeftEar),
    (BodyPart::Nose, BodyPart::RightEar),
    (BodyPart::LeftEar, BodyPart::LeftEye),
    (BodyPart::RightEar, BodyPart::RightEye),
    (BodyPart::LeftEye, BodyPart::RightEye),
    (BodyPart::LeftShoulder, BodyPart::RightShoulder),
    (BodyPart::LeftShoulder, BodyPart::LeftElbow),
    (BodyPart::LeftShoulder, BodyPart::LeftHip),
    (BodyPart::RightShoulder, BodyPart::RightElbow),
    (BodyPart::RightShoulder, BodyPart::RightHip),
    (BodyPart::LeftElbow, BodyPart::LeftWrist),
    (BodyPart::RightElbow, BodyPart::RightWrist),
    (BodyPart::LeftHip, BodyPart::RightHip),
    (BodyPart::LeftHip, BodyPart::LeftKnee),
    (BodyPart::RightHip, BodyPart::RightKnee),
    (BodyPart::LeftKnee, BodyPart::LeftAnkle),
    (BodyPart::RightKnee, BodyPart::RightAnkle),
];

/// Checks that every edge endpoint is a label the engine can emit.
pub fn validate_topology(engine_labels: &[&str]) -> Result<(), PoseCameraError> {
    let labels: HashSet<&str> = engine_labels.iter().copied().collect();
    for (a, b) in EDGES {
        for part in [a, b] {
            if !labels.contains(part.label()) {
                return Err(PoseCameraError::UnknownSkeletonLabel(part.label().to_owned()));
            }
        }
    }
    Ok(())
}

/// Draws the keypoints, the nose decoration and the skeleton edges of one pose.
pub fn draw_pose(drawing: &mut Drawing, pose: &Pose, color: Color, threshold: f32) {
    for keypoint in pose.keypoints().filter(|kp| kp.is_visible(threshold)) {
        drawing.circle(
            keypoint.pixel(),
            KEYPOINT_RADIUS,
            Color::Cyan,
            keypoint.score,
            color,
        );
    }

    let visible = visible_keypoints(pose, threshold);

    draw_nose(drawing, &visible, color);

    for (a, b) in EDGES {
        let (Some(&start), Some(&end)) = (visible.get(&a), visible.get(&b)) else {
            continue;
        };
        // the nose decoration covers these
        if a == BodyPart::Nose || b == BodyPart::Nose {
            continue;
        }
        drawing.line(start, end, color, EDGE_WIDTH);
    }
}

/// Radius of the nose decoration, derived from the horizontal distance between the ears.
pub fn nose_radius(left_ear: (i32, i32), right_ear: (i32, i32)) -> i32 {
    let dx_ears = (left_ear.0 - right_ear.0).abs();
    (dx_ears as f32 / NOSE_RADIUS_DIVISOR) as i32
}

/// Red circle over the nose. Drawn only when the nose and both ears are visible.
fn draw_nose(drawing: &mut Drawing, visible: &BTreeMap<BodyPart, (i32, i32)>, color: Color) {
    let (Some(&nose), Some(&left_ear), Some(&right_ear)) = (
        visible.get(&BodyPart::Nose),
        visible.get(&BodyPart::LeftEar),
        visible.get(&BodyPart::RightEar),
    ) else {
        return;
    };
    drawing.circle(nose, nose_radius(left_ear, right_ear), Color::Red, 1.0, color);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drawing::Shape;
    use crate::pose::{Keypoint, DEFAULT_THRESHOLD};

    fn full_pose(score: f32) -> Pose {
        let mut pose = Pose::new(score);
        for (i, part) in BodyPart::ALL.into_iter().enumerate() {
            pose.insert(Keypoint::new(part, 10.0 * i as f32, 5.0 * i as f32, score));
        }
        pose
    }

    fn lines(drawing: &Drawing) -> Vec<((i32, i32), (i32, i32))> {
        drawing
            .shapes()
            .iter()
            .filter_map(|shape| match shape {
                Shape::Line { start, end, .. } => Some((*start, *end)),
                _ => None,
            })
            .collect()
    }

    fn red_circles(drawing: &Drawing) -> Vec<(i32, i32, i32)> {
        drawing
            .shapes()
            .iter()
            .filter_map(|shape| match shape {
                Shape::Circle {
                    center,
                    radius,
                    fill: Color::Red,
                    ..
                } => Some((center.0, center.1, *radius)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn topology_matches_body_parts() {
        validate_topology(&BodyPart::labels()).unwrap();
    }

    #[test]
    fn topology_rejects_missing_label() {
        let labels: Vec<&str> = BodyPart::labels()
            .into_iter()
            .filter(|label| *label != "left knee")
            .collect();
        match validate_topology(&labels) {
            Err(PoseCameraError::UnknownSkeletonLabel(label)) => assert_eq!(label, "left knee"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn edges_touching_nose_are_never_drawn() {
        let pose = full_pose(0.9);
        let mut drawing = Drawing::new(640, 480);
        draw_pose(&mut drawing, &pose, Color::Yellow, DEFAULT_THRESHOLD);

        let nose_edges = EDGES
            .iter()
            .filter(|(a, b)| *a == BodyPart::Nose || *b == BodyPart::Nose)
            .count();
        assert_eq!(lines(&drawing).len(), EDGES.len() - nose_edges);
    }

    #[test]
    fn edge_drawn_iff_both_endpoints_visible() {
        for hidden in BodyPart::ALL {
            let mut pose = full_pose(0.9);
            let keypoint = *pose.get(hidden).unwrap();
            pose.insert(Keypoint { score: 0.1, ..keypoint });

            let mut drawing = Drawing::new(640, 480);
            draw_pose(&mut drawing, &pose, Color::Yellow, DEFAULT_THRESHOLD);
            let drawn = lines(&drawing);

            for (a, b) in EDGES {
                let start = pose.get(a).unwrap().pixel();
                let end = pose.get(b).unwrap().pixel();
                let expected = a != hidden && b != hidden && a != BodyPart::Nose && b != BodyPart::Nose;
                assert_eq!(drawn.contains(&(start, end)), expected, "edge {a}-{b}, hidden {hidden}");
            }
        }
    }

    #[test]
    fn keypoint_circles_use_score_as_opacity() {
        let pose = Pose::new(1.0)
            .with_keypoint(Keypoint::new(BodyPart::LeftWrist, 30.0, 40.0, 0.75))
            .with_keypoint(Keypoint::new(BodyPart::RightWrist, 50.0, 40.0, 0.1));
        let mut drawing = Drawing::new(640, 480);
        draw_pose(&mut drawing, &pose, Color::Yellow, DEFAULT_THRESHOLD);

        assert_eq!(
            drawing.shapes(),
            &[Shape::Circle {
                center: (30, 40),
                radius: KEYPOINT_RADIUS,
                fill: Color::Cyan,
                fill_opacity: 0.75,
                stroke: Color::Yellow,
            }]
        );
    }

    #[test]
    fn nose_radius_comes_from_ear_distance() {
        let pose = Pose::new(1.0)
            .with_keypoint(Keypoint::new(BodyPart::Nose, 120.0, 60.0, 0.9))
            .with_keypoint(Keypoint::new(BodyPart::LeftEar, 100.0, 55.0, 0.9))
            .with_keypoint(Keypoint::new(BodyPart::RightEar, 140.0, 58.0, 0.9));
        let mut drawing = Drawing::new(640, 480);
        draw_pose(&mut drawing, &pose, Color::Yellow, DEFAULT_THRESHOLD);

        assert_eq!(red_circles(&drawing), vec![(120, 60, 28)]);
        assert_eq!(nose_radius((140, 0), (100, 0)), 28);
    }

    #[test]
    fn nose_decoration_needs_both_ears() {
        let pose = Pose::new(1.0)
            .with_keypoint(Keypoint::new(BodyPart::Nose, 120.0, 60.0, 0.9))
            .with_keypoint(Keypoint::new(BodyPart::RightEar, 140.0, 58.0, 0.9));
        let mut drawing = Drawing::new(640, 480);
        draw_pose(&mut drawing, &pose, Color::Yellow, DEFAULT_THRESHOLD);
        assert!(red_circles(&drawing).is_empty());

        let pose = pose.with_keypoint(Keypoint::new(BodyPart::LeftEar, 100.0, 55.0, 0.05));
        let mut drawing = Drawing::new(640, 480);
        draw_pose(&mut drawing, &pose, Color::Yellow, DEFAULT_THRESHOLD);
        assert!(red_circles(&drawing).is_empty());
    }

    #[test]
    fn edges_use_draw_color_and_width() {
        for color in [Color::Yellow, Color::White] {
            let pose = full_pose(0.9);
            let mut drawing = Drawing::new(640, 480);
            draw_pose(&mut drawing, &pose, color, DEFAULT_THRESHOLD);

            let edges: Vec<&Shape> = drawing
                .shapes()
                .iter()
                .filter(|shape| matches!(shape, Shape::Line { .. }))
                .collect();
            assert_eq!(edges.len(), 15);
            for edge in edges {
                assert!(
                    matches!(edge, Shape::Line { stroke, stroke_width: 2, .. } if *stroke == color),
                    "{edge:?}"
                );
            }
        }
    }

    #[test]
    fn nose_decoration_is_opaque_red_with_draw_color_stroke() {
        let pose = Pose::new(1.0)
            .with_keypoint(Keypoint::new(BodyPart::Nose, 120.0, 60.0, 0.3))
            .with_keypoint(Keypoint::new(BodyPart::LeftEar, 100.0, 55.0, 0.9))
            .with_keypoint(Keypoint::new(BodyPart::RightEar, 140.0, 58.0, 0.9));
        let mut drawing = Drawing::new(640, 480);
        draw_pose(&mut drawing, &pose, Color::White, DEFAULT_THRESHOLD);

        let nose = Shape::Circle {
            center: (120, 60),
            radius: 28,
            fill: Color::Red,
            fill_opacity: 1.0,
            stroke: Color::White,
        };
        assert_eq!(
            drawing.shapes().iter().filter(|shape| **shape == nose).count(),
            1
        );
        assert_eq!(red_circles(&drawing).len(), 1);
    }
}
