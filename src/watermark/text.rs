//! Text shaping and glyph outlines for the watermark layers
//!
//! Text is shaped with rustybuzz and each glyph outline is converted into a
//! tiny-skia path, so overlay text can be filled like any other shape.

use rustybuzz::ttf_parser::{GlyphId, OutlineBuilder};
use rustybuzz::{Face, UnicodeBuffer};
use tiny_skia_path::{Path, PathBuilder};

use crate::error::{Error, Result};

const DEJAVU_SANS: &[u8] = include_bytes!("../../assets/fonts/DejaVuSans.ttf");
const DEJAVU_SANS_BOLD: &[u8] = include_bytes!("../../assets/fonts/DejaVuSans-Bold.ttf");

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Weight {
    Regular,
    Bold,
}

/// The embedded faces used by every overlay
pub struct Fonts {
    regular: Face<'static>,
    bold: Face<'static>,
}

impl Fonts {
    pub fn embedded() -> Result<Self> {
        Ok(Self {
            regular: parse_face(DEJAVU_SANS, "DejaVu Sans")?,
            bold: parse_face(DEJAVU_SANS_BOLD, "DejaVu Sans Bold")?,
        })
    }

    pub fn face(&self, weight: Weight) -> &Face<'static> {
        match weight {
            Weight::Regular => &self.regular,
            Weight::Bold => &self.bold,
        }
    }

    /// Shape `text` at `size` pixels
    pub fn shape(&self, weight: Weight, text: &str, size: f32) -> ShapedText {
        shape_text(self.face(weight), text, size)
    }
}

fn parse_face(data: &'static [u8], name: &str) -> Result<Face<'static>> {
    Face::from_slice(data, 0).ok_or_else(|| Error::Font(format!("Cannot parse embedded font {}", name)))
}

/// A run of text laid out on a baseline at the origin
#[derive(Debug, Clone)]
pub struct ShapedText {
    /// `None` for whitespace-only text
    pub path: Option<Path>,
    /// Advance width in pixels
    pub width: f32,
    /// Font size in pixels
    pub size: f32,
}

/// Shape a single line; y grows downwards and the baseline sits at y = 0
pub fn shape_text(face: &Face, text: &str, size: f32) -> ShapedText {
    let mut buffer = UnicodeBuffer::new();
    buffer.push_str(text);
    let glyphs = rustybuzz::shape(face, &[], buffer);

    let scale = size / face.units_per_em() as f32;
    let mut outline = GlyphOutline {
        builder: PathBuilder::new(),
        scale,
        x: 0.0,
        y: 0.0,
    };

    let mut pen = 0.0;
    for (info, pos) in glyphs.glyph_infos().iter().zip(glyphs.glyph_positions()) {
        outline.x = pen + pos.x_offset as f32 * scale;
        outline.y = -(pos.y_offset as f32) * scale;
        // Glyphs without an outline (spaces) simply add nothing
        let _ = face.outline_glyph(GlyphId(info.glyph_id as u16), &mut outline);
        pen += pos.x_advance as f32 * scale;
    }

    ShapedText {
        path: outline.builder.finish(),
        width: pen,
        size,
    }
}

/// Font units are y-up; the surface is y-down
struct GlyphOutline {
    builder: PathBuilder,
    scale: f32,
    x: f32,
    y: f32,
}

impl GlyphOutline {
    fn map(&self, x: f32, y: f32) -> (f32, f32) {
        (self.x + x * self.scale, self.y - y * self.scale)
    }
}

impl OutlineBuilder for GlyphOutline {
    fn move_to(&mut self, x: f32, y: f32) {
        let (x, y) = self.map(x, y);
        self.builder.move_to(x, y);
    }

    fn line_to(&mut self, x: f32, y: f32) {
        let (x, y) = self.map(x, y);
        self.builder.line_to(x, y);
    }

    fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        let (x1, y1) = self.map(x1, y1);
        let (x, y) = self.map(x, y);
        self.builder.quad_to(x1, y1, x, y);
    }

    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        let (x1, y1) = self.map(x1, y1);
        let (x2, y2) = self.map(x2, y2);
        let (x, y) = self.map(x, y);
        self.builder.cubic_to(x1, y1, x2, y2, x, y);
    }

    fn close(&mut self) {
        self.builder.close();
    }
}
