//! Drawing surface with a save/restore state stack
//!
//! Each overlay layer works in its own coordinate system. `Canvas::layer`
//! brackets a pass with save/restore so transforms and opacity never leak
//! from one pass into the next.

use tiny_skia::{
    Color, FillRule, GradientStop, Paint, Pixmap, PixmapMut, Point, Rect, Shader, SpreadMode,
    Stroke,
};
use tiny_skia_path::{Path, PathBuilder, Transform};

use super::text::ShapedText;

/// An RGB color plus its own opacity, before the canvas opacity is applied
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const fn with_alpha(self, a: f32) -> Self {
        Self { a, ..self }
    }

    fn to_color(self, opacity: f32) -> Color {
        let mut color = Color::from_rgba8(self.r, self.g, self.b, 255);
        color.apply_opacity((self.a * opacity).clamp(0.0, 1.0));
        color
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAlign {
    Left,
    Center,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Baseline {
    Alphabetic,
    Middle,
}

#[derive(Debug, Clone, Copy)]
struct DrawState {
    transform: Transform,
    opacity: f32,
}

impl Default for DrawState {
    fn default() -> Self {
        Self {
            transform: Transform::identity(),
            opacity: 1.0,
        }
    }
}

pub struct Canvas<'a> {
    pixmap: PixmapMut<'a>,
    state: DrawState,
    stack: Vec<DrawState>,
}

impl<'a> Canvas<'a> {
    pub fn new(pixmap: &'a mut Pixmap) -> Self {
        Self {
            pixmap: pixmap.as_mut(),
            state: DrawState::default(),
            stack: Vec::new(),
        }
    }

    pub fn width(&self) -> f32 {
        self.pixmap.width() as f32
    }

    pub fn height(&self) -> f32 {
        self.pixmap.height() as f32
    }

    pub fn save(&mut self) {
        self.stack.push(self.state);
    }

    /// Unbalanced restores reset to the initial state
    pub fn restore(&mut self) {
        self.state = self.stack.pop().unwrap_or_default();
    }

    /// Run `draw` between a save and the matching restore
    pub fn layer<F>(&mut self, draw: F)
    where
        F: FnOnce(&mut Self),
    {
        self.save();
        draw(self);
        self.restore();
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn translate(&mut self, x: f32, y: f32) {
        self.state.transform = self.state.transform.pre_translate(x, y);
    }

    pub fn rotate(&mut self, degrees: f32) {
        self.state.transform = self.state.transform.pre_concat(Transform::from_rotate(degrees));
    }

    /// Opacity multiplied into every subsequent draw
    pub fn set_opacity(&mut self, opacity: f32) {
        self.state.opacity = opacity.clamp(0.0, 1.0);
    }

    fn solid(&self, color: Rgba) -> Paint<'static> {
        let mut paint = Paint::default();
        paint.set_color(color.to_color(self.state.opacity));
        paint.anti_alias = true;
        paint
    }

    pub fn stroke_path(&mut self, path: &Path, color: Rgba, width: f32) {
        let paint = self.solid(color);
        let stroke = Stroke {
            width,
            ..Stroke::default()
        };
        self.pixmap
            .stroke_path(path, &paint, &stroke, self.state.transform, None);
    }

    pub fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Rgba) {
        if let Some(rect) = Rect::from_xywh(x, y, w, h) {
            let paint = self.solid(color);
            self.pixmap.fill_rect(rect, &paint, self.state.transform, None);
        }
    }

    /// Draw a straight segment
    pub fn line(&mut self, from: (f32, f32), to: (f32, f32), color: Rgba, width: f32) {
        let mut pb = PathBuilder::new();
        pb.move_to(from.0, from.1);
        pb.line_to(to.0, to.1);
        if let Some(path) = pb.finish() {
            self.stroke_path(&path, color, width);
        }
    }

    pub fn stroke_circle(&mut self, cx: f32, cy: f32, radius: f32, color: Rgba, width: f32) {
        if let Some(path) = PathBuilder::from_circle(cx, cy, radius) {
            self.stroke_path(&path, color, width);
        }
    }

    /// Fill `path` with a linear gradient running from `start` to `end`
    pub fn fill_linear_gradient(
        &mut self,
        path: &Path,
        start: (f32, f32),
        end: (f32, f32),
        colors: [Rgba; 2],
    ) {
        let shader = tiny_skia::LinearGradient::new(
            Point::from_xy(start.0, start.1),
            Point::from_xy(end.0, end.1),
            self.stops(colors),
            SpreadMode::Pad,
            Transform::identity(),
        );
        self.fill_shader(path, shader);
    }

    /// Fill `path` with a radial gradient centred on `center`
    pub fn fill_radial_gradient(
        &mut self,
        path: &Path,
        center: (f32, f32),
        radius: f32,
        colors: [Rgba; 2],
    ) {
        let center = Point::from_xy(center.0, center.1);
        let shader = tiny_skia::RadialGradient::new(
            center,
            center,
            radius,
            self.stops(colors),
            SpreadMode::Pad,
            Transform::identity(),
        );
        self.fill_shader(path, shader);
    }

    fn stops(&self, colors: [Rgba; 2]) -> Vec<GradientStop> {
        vec![
            GradientStop::new(0.0, colors[0].to_color(self.state.opacity)),
            GradientStop::new(1.0, colors[1].to_color(self.state.opacity)),
        ]
    }

    fn fill_shader(&mut self, path: &Path, shader: Option<Shader<'static>>) {
        // Degenerate gradients have no shader; nothing to draw
        let Some(shader) = shader else {
            return;
        };
        let paint = Paint {
            shader,
            anti_alias: true,
            ..Paint::default()
        };
        self.pixmap
            .fill_path(path, &paint, FillRule::Winding, self.state.transform, None);
    }

    /// Fill pre-shaped text anchored at `(x, y)`
    pub fn fill_text(
        &mut self,
        text: &ShapedText,
        x: f32,
        y: f32,
        color: Rgba,
        align: TextAlign,
        baseline: Baseline,
    ) {
        let Some(path) = text.path.as_ref() else {
            return;
        };
        let dx = match align {
            TextAlign::Left => 0.0,
            TextAlign::Center => -text.width / 2.0,
        };
        let dy = match baseline {
            Baseline::Alphabetic => 0.0,
            Baseline::Middle => text.size * 0.35,
        };
        let paint = self.solid(color);
        let transform = self.state.transform.pre_translate(x + dx, y + dy);
        self.pixmap
            .fill_path(path, &paint, FillRule::Winding, transform, None);
    }
}

/// Closed rectangle with rounded corners built from quadratic curves
pub fn rounded_rect(x: f32, y: f32, w: f32, h: f32, r: f32) -> Option<Path> {
    let r = r.min(w / 2.0).min(h / 2.0).max(0.0);
    let mut pb = PathBuilder::new();
    pb.move_to(x + r, y);
    pb.line_to(x + w - r, y);
    pb.quad_to(x + w, y, x + w, y + r);
    pb.line_to(x + w, y + h - r);
    pb.quad_to(x + w, y + h, x + w - r, y + h);
    pb.line_to(x + r, y + h);
    pb.quad_to(x, y + h, x, y + h - r);
    pb.line_to(x, y + r);
    pb.quad_to(x, y, x + r, y);
    pb.close();
    pb.finish()
}
