//! The seven overlay passes, drawn in order over a rendered page
//!
//! All passes are deterministic for a given surface size, context and
//! timestamp. Opacities are deliberately low so the page stays legible.

use std::f32::consts::PI;

use chrono::{DateTime, Local};
use tiny_skia_path::PathBuilder;

use super::canvas::{rounded_rect, Baseline, Canvas, Rgba, TextAlign};
use super::text::{Fonts, Weight};
use super::WatermarkContext;

/// Primary watermark tone
pub const BASE_COLOR: Rgba = Rgba::new(208, 84, 113, 1.0);
/// Secondary tone for interference patterns
pub const ACCENT_COLOR: Rgba = Rgba::new(41, 98, 155, 1.0);
const WHITE: Rgba = Rgba::new(255, 255, 255, 1.0);

/// Short validation phrase used by the tiles and the badge
pub const VALIDATION_PHRASE: &str = "VALIDADO - GAMC";
pub const SEAL_TOP: &str = "CERTIFICADO";
pub const SEAL_BOTTOM: &str = "VALIDADO";
pub const MICROTEXT: &str = "GOBIERNO AUTÓNOMO MUNICIPAL DE COCHABAMBA · DOCUMENTO VERIFICADO · ";
pub const GHOST_TEXT: &str = "COPIA CONTROLADA";

/// Angle of the tiled background text, in degrees
pub const TILE_ANGLE: f32 = -36.0;
/// Opacity of the ghost text
pub const GHOST_OPACITY: f32 = 0.01;
/// Inset of the microtext border
pub const MICROTEXT_INSET: f32 = 4.0;
pub const MICROTEXT_SIZE: f32 = 4.0;

/// Everything a pass may read
pub struct LayerInput<'a> {
    pub fonts: &'a Fonts,
    pub context: &'a WatermarkContext,
    pub now: &'a DateTime<Local>,
}

pub type LayerFn = fn(&mut Canvas<'_>, &LayerInput<'_>);

/// Passes in drawing order
pub const LAYERS: [(&str, LayerFn); 7] = [
    ("tiled_text", tiled_text),
    ("moire", moire),
    ("central_seal", central_seal),
    ("corner_badge", corner_badge),
    ("microtext_border", microtext_border),
    ("ghost_text", ghost_text),
    ("guilloche", guilloche),
];

/// Rotated repeating text over three times the page extent, plus faint
/// vertical security lines
pub fn tiled_text(canvas: &mut Canvas<'_>, input: &LayerInput<'_>) {
    let (w, h) = (canvas.width(), canvas.height());
    let label = format!("{} · {}", VALIDATION_PHRASE, input.context.document_id);
    let shaped = input.fonts.shape(Weight::Bold, &label, 14.0);

    let step_x = shaped.width + 60.0;
    let step_y = 80.0;
    let reach = 1.5 * w.max(h);

    canvas.layer(|c| {
        c.translate(w / 2.0, h / 2.0);
        c.rotate(TILE_ANGLE);

        let mut row = 0;
        let mut y = -reach;
        while y <= reach {
            // Stagger alternate rows
            let offset = if row % 2 == 0 { 0.0 } else { step_x / 2.0 };
            let mut x = -reach - offset;
            while x <= reach {
                c.set_opacity(0.05);
                c.fill_rect(x - 6.0, y - shaped.size - 2.0, shaped.width + 12.0, shaped.size + 8.0, WHITE);
                c.set_opacity(0.07);
                c.fill_text(&shaped, x, y, BASE_COLOR, TextAlign::Left, Baseline::Alphabetic);
                x += step_x;
            }
            y += step_y;
            row += 1;
        }
    });

    canvas.layer(|c| {
        c.set_opacity(0.03);
        let mut x = 0.0;
        while x <= w {
            c.line((x, 0.0), (x, h), ACCENT_COLOR, 0.5);
            x += 12.0;
        }
    });
}

/// Two sets of concentric circles whose overlap produces interference
/// fringes when the page is photographed or scanned
pub fn moire(canvas: &mut Canvas<'_>, _input: &LayerInput<'_>) {
    let (w, h) = (canvas.width(), canvas.height());
    let max_radius = 0.4 * w.max(h);
    let centers = [
        ((0.3 * w, 0.3 * h), BASE_COLOR),
        ((0.7 * w, 0.7 * h), ACCENT_COLOR),
    ];

    canvas.layer(|c| {
        c.set_opacity(0.04);
        for ((cx, cy), color) in centers {
            let mut radius = 10.0;
            while radius <= max_radius {
                c.stroke_circle(cx, cy, radius, color, 0.5);
                radius += 10.0;
            }
        }
    });
}

/// Central seal: two rings, a radial gradient, captions, date and time,
/// the document identifier, and 36 radial tick marks
pub fn central_seal(canvas: &mut Canvas<'_>, input: &LayerInput<'_>) {
    let (w, h) = (canvas.width(), canvas.height());
    let radius = seal_radius(w, h);
    if radius < 1.0 {
        return;
    }

    let fonts = input.fonts;
    let caption_top = fonts.shape(Weight::Bold, SEAL_TOP, 18.0);
    let caption_bottom = fonts.shape(Weight::Bold, SEAL_BOTTOM, 18.0);
    let date = fonts.shape(Weight::Regular, &input.now.format("%d/%m/%Y").to_string(), 13.0);
    let time = fonts.shape(Weight::Regular, &input.now.format("%H:%M:%S").to_string(), 11.0);
    let id = fonts.shape(Weight::Regular, &input.context.document_id, 8.0);

    canvas.layer(|c| {
        c.translate(w / 2.0, h / 2.0);

        if let Some(disc) = PathBuilder::from_circle(0.0, 0.0, radius) {
            c.set_opacity(1.0);
            c.fill_radial_gradient(
                &disc,
                (0.0, 0.0),
                radius,
                [BASE_COLOR.with_alpha(0.10), ACCENT_COLOR.with_alpha(0.03)],
            );
        }

        c.set_opacity(0.18);
        c.stroke_circle(0.0, 0.0, radius, BASE_COLOR, 4.0);
        c.stroke_circle(0.0, 0.0, radius * 0.85, BASE_COLOR, 1.5);

        for tick in 0..36 {
            let angle = tick as f32 * 10.0 * PI / 180.0;
            let (sin, cos) = angle.sin_cos();
            let inner = radius + 4.0;
            let outer = radius + 12.0;
            c.line((inner * cos, inner * sin), (outer * cos, outer * sin), BASE_COLOR, 1.0);
        }

        c.set_opacity(0.22);
        c.fill_text(&caption_top, 0.0, -radius * 0.25, BASE_COLOR, TextAlign::Center, Baseline::Middle);
        c.fill_text(&caption_bottom, 0.0, 0.0, BASE_COLOR, TextAlign::Center, Baseline::Middle);
        c.fill_text(&date, 0.0, radius * 0.25, BASE_COLOR, TextAlign::Center, Baseline::Middle);
        c.fill_text(&time, 0.0, radius * 0.42, BASE_COLOR, TextAlign::Center, Baseline::Middle);
        c.fill_text(&id, 0.0, -radius * 0.5, BASE_COLOR, TextAlign::Center, Baseline::Middle);
    });
}

/// Seal radius for a surface
pub fn seal_radius(width: f32, height: f32) -> f32 {
    width.min(height) * 0.2
}

/// Rounded badge near the bottom-right corner with the identifier
pub fn corner_badge(canvas: &mut Canvas<'_>, input: &LayerInput<'_>) {
    let (w, h) = (canvas.width(), canvas.height());
    let caption = input.fonts.shape(Weight::Bold, VALIDATION_PHRASE, 14.0);
    let id = input.fonts.shape(Weight::Regular, &input.context.document_id, 8.0);

    let Some(badge) = rounded_rect(-100.0, -28.0, 200.0, 56.0, 10.0) else {
        return;
    };

    canvas.layer(|c| {
        c.translate(w - 120.0, h - 60.0);

        c.set_opacity(1.0);
        c.fill_linear_gradient(
            &badge,
            (-100.0, 0.0),
            (100.0, 0.0),
            [BASE_COLOR.with_alpha(0.14), ACCENT_COLOR.with_alpha(0.14)],
        );

        c.set_opacity(0.35);
        c.stroke_path(&badge, BASE_COLOR, 1.5);

        c.set_opacity(0.7);
        c.fill_text(&caption, 0.0, -7.0, BASE_COLOR, TextAlign::Center, Baseline::Middle);
        c.fill_text(&id, 0.0, 13.0, BASE_COLOR, TextAlign::Center, Baseline::Middle);
    });
}

/// Tiny repeated text along all four edges, illegible on screen
pub fn microtext_border(canvas: &mut Canvas<'_>, input: &LayerInput<'_>) {
    let (w, h) = (canvas.width(), canvas.height());
    let unit = input.fonts.shape(Weight::Regular, MICROTEXT, MICROTEXT_SIZE);
    if unit.width <= 0.0 {
        return;
    }

    let run = |length: f32| {
        let repeats = (length / unit.width).ceil() as usize + 1;
        input
            .fonts
            .shape(Weight::Regular, &MICROTEXT.repeat(repeats), MICROTEXT_SIZE)
    };
    let horizontal = run(w);
    let vertical = run(h);
    let inset = MICROTEXT_INSET;

    canvas.layer(|c| {
        c.set_opacity(0.3);

        // Top and bottom read left to right
        c.fill_text(&horizontal, 0.0, inset, BASE_COLOR, TextAlign::Left, Baseline::Middle);
        c.fill_text(&horizontal, 0.0, h - inset, BASE_COLOR, TextAlign::Left, Baseline::Middle);

        // Left side runs bottom to top
        c.layer(|c| {
            c.translate(inset, h);
            c.rotate(-90.0);
            c.fill_text(&vertical, 0.0, 0.0, BASE_COLOR, TextAlign::Left, Baseline::Middle);
        });

        // Right side runs top to bottom
        c.layer(|c| {
            c.translate(w - inset, 0.0);
            c.rotate(90.0);
            c.fill_text(&vertical, 0.0, 0.0, BASE_COLOR, TextAlign::Left, Baseline::Middle);
        });
    });
}

/// Large diagonal text at 1% opacity, drawn at 45° and again a further 90°
pub fn ghost_text(canvas: &mut Canvas<'_>, input: &LayerInput<'_>) {
    let (w, h) = (canvas.width(), canvas.height());
    let size = (w.min(h) * 0.08).max(8.0);
    let label = format!("{} {}", GHOST_TEXT, input.context.document_id);
    let shaped = input.fonts.shape(Weight::Bold, &label, size);

    canvas.layer(|c| {
        c.set_opacity(GHOST_OPACITY);
        c.translate(w / 2.0, h / 2.0);
        c.rotate(45.0);
        c.fill_text(&shaped, 0.0, 0.0, BASE_COLOR, TextAlign::Center, Baseline::Middle);
        c.rotate(90.0);
        c.fill_text(&shaped, 0.0, 0.0, BASE_COLOR, TextAlign::Center, Baseline::Middle);
    });
}

/// Closed rosette around the centre: 72 segments at 5° steps with the
/// radius modulated by a sine of the angle
pub fn guilloche(canvas: &mut Canvas<'_>, _input: &LayerInput<'_>) {
    let (w, h) = (canvas.width(), canvas.height());
    let base = w.min(h) * 0.3;
    let amplitude = 20.0;
    let lobes = 8.0;

    let mut pb = PathBuilder::new();
    for step in 0..72 {
        let angle = step as f32 * 5.0 * PI / 180.0;
        let radius = base + amplitude * (lobes * angle).sin();
        let (sin, cos) = angle.sin_cos();
        let (x, y) = (radius * cos, radius * sin);
        if step == 0 {
            pb.move_to(x, y);
        } else {
            pb.line_to(x, y);
        }
    }
    pb.close();
    let Some(path) = pb.finish() else {
        return;
    };

    canvas.layer(|c| {
        c.translate(w / 2.0, h / 2.0);
        c.set_opacity(0.06);
        c.stroke_path(&path, ACCENT_COLOR, 1.0);
    });
}
