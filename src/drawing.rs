//! Vector overlay canvas.
//!
//! A [`Drawing`] records shapes in the order they were added. It is filled in by the frame
//! callback and later either painted onto a video frame (see [`crate::paint`]) or serialised
//! to SVG.

pub const DEFAULT_FONT_SIZE: u32 = 16;

const FONT_STYLE: &str = "font-family:sans-serif";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    Black,
    White,
    Yellow,
    Cyan,
    Red,
}

impl Color {
    /// SVG color keyword.
    pub fn name(self) -> &'static str {
        match self {
            Color::Black => "black",
            Color::White => "white",
            Color::Yellow => "yellow",
            Color::Cyan => "cyan",
            Color::Red => "red",
        }
    }

    pub fn rgb(self) -> (u8, u8, u8) {
        match self {
            Color::Black => (0, 0, 0),
            Color::White => (255, 255, 255),
            Color::Yellow => (255, 255, 0),
            Color::Cyan => (0, 255, 255),
            Color::Red => (255, 0, 0),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Circle {
        center: (i32, i32),
        radius: i32,
        fill: Color,
        fill_opacity: f32,
        stroke: Color,
    },
    Line {
        start: (i32, i32),
        end: (i32, i32),
        stroke: Color,
        stroke_width: i32,
    },
    Text {
        insert: (i32, i32),
        text: String,
        fill: Color,
        font_size: u32,
    },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Drawing {
    width: i32,
    height: i32,
    shapes: Vec<Shape>,
}

impl Drawing {
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            width,
            height,
            shapes: Vec::new(),
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    pub fn clear(&mut self) {
        self.shapes.clear();
    }

    pub fn circle(
        &mut self,
        center: (i32, i32),
        radius: i32,
        fill: Color,
        fill_opacity: f32,
        stroke: Color,
    ) {
        self.shapes.push(Shape::Circle {
            center,
            radius,
            fill,
            fill_opacity,
            stroke,
        });
    }

    pub fn line(&mut self, start: (i32, i32), end: (i32, i32), stroke: Color, stroke_width: i32) {
        self.shapes.push(Shape::Line {
            start,
            end,
            stroke,
            stroke_width,
        });
    }

    pub fn text(&mut self, insert: (i32, i32), text: &str, fill: Color, font_size: u32) {
        self.shapes.push(Shape::Text {
            insert,
            text: text.to_owned(),
            fill,
            font_size,
        });
    }

    pub fn to_svg(&self) -> String {
        let mut svg = format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
            w = self.width,
            h = self.height
        );
        for shape in &self.shapes {
            let element = match shape {
                Shape::Circle {
                    center: (cx, cy),
                    radius,
                    fill,
                    fill_opacity,
                    stroke,
                } => format!(
                    r#"<circle cx="{cx}" cy="{cy}" r="{radius}" fill="{}" fill-opacity="{fill_opacity}" stroke="{}"/>"#,
                    fill.name(),
                    stroke.name()
                ),
                Shape::Line {
                    start: (x1, y1),
                    end: (x2, y2),
                    stroke,
                    stroke_width,
                } => format!(
                    r#"<line x1="{x1}" y1="{y1}" x2="{x2}" y2="{y2}" stroke="{}" stroke-width="{stroke_width}"/>"#,
                    stroke.name()
                ),
                Shape::Text {
                    insert: (x, y),
                    text,
                    fill,
                    font_size,
                } => format!(
                    r#"<text x="{x}" y="{y}" fill="{}" font-size="{font_size}" style="{FONT_STYLE}">{}</text>"#,
                    fill.name(),
                    escape_xml(text)
                ),
            };
            svg.push_str(&element);
        }
        svg.push_str("</svg>");
        svg
    }
}

fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            c => escaped.push(c),
        }
    }
    escaped
}

/// Draws `text` with a one pixel black drop shadow so it stays legible on any background.
pub fn shadow_text(drawing: &mut Drawing, x: i32, y: i32, text: &str, font_size: u32) {
    drawing.text((x + 1, y + 1), text, Color::Black, font_size);
    drawing.text((x, y), text, Color::White, font_size);
}
