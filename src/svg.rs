//! SVG textual emission primitives: the handful of drawable shapes the map
//! renderer composes, and the XML document wrapper that serializes them.
//! Shapes are ordinary Rust values with a `render` method that writes their
//! tag text directly, rather than a virtual render hierarchy.

use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

/// A 2D point. Serializes as a two-element array, matching the
/// `[dx, dy]` offsets used in the request document's render settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point(pub f64, pub f64);

/// A tagged union of the three color representations the request document
/// may supply: a named CSS-ish color, or an RGB/RGBA tuple.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Color {
    Rgba(u8, u8, u8, f64),
    Rgb(u8, u8, u8),
    Named(String),
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Color::Named(name) => write!(f, "{name}"),
            Color::Rgb(r, g, b) => write!(f, "rgb({r},{g},{b})"),
            Color::Rgba(r, g, b, a) => write!(f, "rgba({r},{g},{b},{a})"),
        }
    }
}

pub struct Polyline {
    pub points: Vec<Point>,
    pub stroke: Color,
    pub stroke_width: f64,
}

pub struct Circle {
    pub center: Point,
    pub radius: f64,
    pub fill: Color,
}

pub struct Text {
    pub position: Point,
    pub offset: Point,
    pub font_size: u32,
    pub font_family: &'static str,
    pub font_weight: Option<&'static str>,
    pub data: String,
    pub fill: Color,
    pub stroke: Option<Color>,
    pub stroke_width: Option<f64>,
}

pub enum Drawable {
    Polyline(Polyline),
    Circle(Circle),
    Text(Text),
}

/// Escapes the five XML-significant characters, `&` first so that escaping
/// the others doesn't double-escape the ampersands it just introduced.
fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

impl Polyline {
    fn render(&self, out: &mut String) {
        write!(out, "<polyline points=\"").unwrap();
        for (i, p) in self.points.iter().enumerate() {
            if i > 0 {
                out.push(' ');
            }
            write!(out, "{},{}", p.0, p.1).unwrap();
        }
        write!(
            out,
            "\" fill=\"none\" stroke=\"{}\" stroke-width=\"{}\" stroke-linecap=\"round\" stroke-linejoin=\"round\"/>",
            self.stroke, self.stroke_width
        )
        .unwrap();
    }
}

impl Circle {
    fn render(&self, out: &mut String) {
        write!(
            out,
            "<circle cx=\"{}\" cy=\"{}\" r=\"{}\" fill=\"{}\"/>",
            self.center.0, self.center.1, self.radius, self.fill
        )
        .unwrap();
    }
}

impl Text {
    fn render(&self, out: &mut String) {
        write!(
            out,
            "<text x=\"{}\" y=\"{}\" dx=\"{}\" dy=\"{}\" font-size=\"{}\" font-family=\"{}\"",
            self.position.0, self.position.1, self.offset.0, self.offset.1, self.font_size, self.font_family
        )
        .unwrap();
        if let Some(weight) = self.font_weight {
            write!(out, " font-weight=\"{weight}\"").unwrap();
        }
        write!(out, " fill=\"{}\"", self.fill).unwrap();
        if let Some(stroke) = &self.stroke {
            write!(out, " stroke=\"{stroke}\"").unwrap();
        }
        if let Some(width) = self.stroke_width {
            write!(
                out,
                " stroke-width=\"{width}\" stroke-linecap=\"round\" stroke-linejoin=\"round\""
            )
            .unwrap();
        }
        write!(out, ">{}</text>", escape_xml(&self.data)).unwrap();
    }
}

/// An ordered list of drawables, later ones painting over earlier ones.
#[derive(Default)]
pub struct Document {
    drawables: Vec<Drawable>,
}

impl Document {
    pub fn new() -> Self {
        Document::default()
    }

    pub fn push(&mut self, drawable: Drawable) {
        self.drawables.push(drawable);
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\" ?>\n");
        out.push_str("<svg xmlns=\"http://www.w3.org/2000/svg\" version=\"1.1\">\n");
        for drawable in &self.drawables {
            match drawable {
                Drawable::Polyline(p) => p.render(&mut out),
                Drawable::Circle(c) => c.render(&mut out),
                Drawable::Text(t) => t.render(&mut out),
            }
            out.push('\n');
        }
        out.push_str("</svg>");
        out
    }
}
