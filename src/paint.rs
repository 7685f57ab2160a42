//! Rasterises a [`Drawing`] onto a video frame.

use opencv::core::{Mat, Point, Scalar, Vec3b};
use opencv::imgproc;
use opencv::prelude::*;

use crate::drawing::{Color, Drawing, Shape};

const FONT_FACE: i32 = imgproc::FONT_HERSHEY_SIMPLEX;

fn scalar(color: Color) -> Scalar {
    // frames are BGR
    let (r, g, b) = color.rgb();
    Scalar::new(f64::from(b), f64::from(g), f64::from(r), 0.0)
}

fn point((x, y): (i32, i32), scale: f64) -> Point {
    Point::new(
        (f64::from(x) * scale).round() as i32,
        (f64::from(y) * scale).round() as i32,
    )
}

fn length(value: i32, scale: f64) -> i32 {
    ((f64::from(value) * scale).round() as i32).max(1)
}

/// Paints every shape of `drawing` onto `frame`, scaling geometry by `scale`.
pub fn paint(drawing: &Drawing, frame: &mut Mat, scale: f64) -> opencv::Result<()> {
    for shape in drawing.shapes() {
        match shape {
            Shape::Circle {
                center,
                radius,
                fill,
                fill_opacity,
                stroke,
            } => {
                let center = point(*center, scale);
                let radius = length(*radius, scale);
                fill_circle(frame, center, radius, scalar(*fill), *fill_opacity)?;
                imgproc::circle(frame, center, radius, scalar(*stroke), 1, imgproc::LINE_AA, 0)?;
            }
            Shape::Line {
                start,
                end,
                stroke,
                stroke_width,
            } => {
                imgproc::line(
                    frame,
                    point(*start, scale),
                    point(*end, scale),
                    scalar(*stroke),
                    length(*stroke_width, scale),
                    imgproc::LINE_AA,
                    0,
                )?;
            }
            Shape::Text {
                insert,
                text,
                fill,
                font_size,
            } => {
                let pixel_height = length(*font_size as i32, scale);
                let font_scale = imgproc::get_font_scale_from_height(FONT_FACE, pixel_height, 1)?;
                imgproc::put_text(
                    frame,
                    text,
                    point(*insert, scale),
                    FONT_FACE,
                    font_scale,
                    scalar(*fill),
                    1,
                    imgproc::LINE_AA,
                    false,
                )?;
            }
        }
    }
    Ok(())
}

/// Blends a filled circle into the pixels it covers. Only the circle's bounding box is touched.
fn fill_circle(
    frame: &mut Mat,
    center: Point,
    radius: i32,
    color: Scalar,
    opacity: f32,
) -> opencv::Result<()> {
    let opacity = f64::from(opacity.clamp(0.0, 1.0));
    if opacity >= 1.0 {
        return imgproc::circle(frame, center, radius, color, imgproc::FILLED, imgproc::LINE_AA, 0);
    }
    if opacity <= 0.0 {
        return Ok(());
    }

    let x0 = (center.x - radius).max(0);
    let x1 = (center.x + radius).min(frame.cols() - 1);
    let y0 = (center.y - radius).max(0);
    let y1 = (center.y + radius).min(frame.rows() - 1);
    let radius_sq = i64::from(radius) * i64::from(radius);

    for y in y0..=y1 {
        for x in x0..=x1 {
            let dx = i64::from(x - center.x);
            let dy = i64::from(y - center.y);
            if dx * dx + dy * dy > radius_sq {
                continue;
            }
            let pixel = frame.at_2d_mut::<Vec3b>(y, x)?;
            for channel in 0..3 {
                let blended =
                    f64::from(pixel[channel]) * (1.0 - opacity) + color[channel] * opacity;
                pixel[channel] = blended.round().clamp(0.0, 255.0) as u8;
            }
        }
    }
    Ok(())
}
