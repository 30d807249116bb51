//! Multi-layer security watermark
//!
//! Stamps a rendered page with seven overlay passes (tiled text, moiré,
//! central seal, corner badge, microtext border, ghost text and a
//! guilloché rosette). The surface is modified in place and keeps its
//! dimensions.
//!
//! # Example
//!
//! ```no_run
//! use cert_verify::watermark::{apply_watermark, WatermarkContext};
//! use tiny_skia::{Color, Pixmap};
//!
//! let mut page = Pixmap::new(893, 1263).unwrap();
//! page.fill(Color::WHITE);
//!
//! let context = WatermarkContext::new();
//! apply_watermark(&mut page, &context).unwrap();
//! ```

pub mod canvas;
pub mod layers;
pub mod text;

use chrono::{DateTime, Local, Timelike};
use tiny_skia::Pixmap;
use tracing::{debug, trace};

use crate::error::Result;

pub use canvas::Canvas;
pub use layers::LAYERS;
pub use text::Fonts;

/// Per-surface identity stamped into every layer
///
/// Created once per rendering surface and shared by all of its pages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatermarkContext {
    pub document_id: String,
    pub generated_at: DateTime<Local>,
}

impl WatermarkContext {
    /// Context stamped with the current time
    pub fn new() -> Self {
        let now = Local::now();
        Self {
            document_id: document_id_for(&now),
            generated_at: now,
        }
    }

    pub fn with_id(document_id: impl Into<String>, generated_at: DateTime<Local>) -> Self {
        Self {
            document_id: document_id.into(),
            generated_at,
        }
    }
}

impl Default for WatermarkContext {
    fn default() -> Self {
        Self::new()
    }
}

/// `DOC-<yyyymmddHHMMSS>-<4 hex digits>` derived from `at`
pub fn document_id_for(at: &DateTime<Local>) -> String {
    format!(
        "DOC-{}-{:04x}",
        at.format("%Y%m%d%H%M%S"),
        at.nanosecond() & 0xffff
    )
}

/// Draw all passes, sampling the seal's date and time now
pub fn apply_watermark(pixmap: &mut Pixmap, context: &WatermarkContext) -> Result<()> {
    apply_watermark_at(pixmap, context, Local::now())
}

/// Draw all passes with an explicit timestamp for the seal
pub fn apply_watermark_at(
    pixmap: &mut Pixmap,
    context: &WatermarkContext,
    now: DateTime<Local>,
) -> Result<()> {
    let fonts = Fonts::embedded()?;
    let input = layers::LayerInput {
        fonts: &fonts,
        context,
        now: &now,
    };

    let (width, height) = (pixmap.width(), pixmap.height());
    let mut canvas = Canvas::new(pixmap);
    for (name, pass) in LAYERS {
        trace!(layer = name, "Drawing watermark layer");
        canvas.layer(|c| pass(c, &input));
    }

    debug!(
        document_id = %context.document_id,
        width,
        height,
        "Watermark applied"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tiny_skia::Color;

    fn white(w: u32, h: u32) -> Pixmap {
        let mut pixmap = Pixmap::new(w, h).unwrap();
        pixmap.fill(Color::WHITE);
        pixmap
    }

    fn fixed_time() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 5, 17, 10, 30, 0).unwrap()
    }

    #[test]
    fn test_same_inputs_same_pixels() {
        let context = WatermarkContext::with_id("DOC-20240517103000-00ff", fixed_time());
        let mut first = white(240, 320);
        let mut second = white(240, 320);

        apply_watermark_at(&mut first, &context, fixed_time()).unwrap();
        apply_watermark_at(&mut second, &context, fixed_time()).unwrap();

        assert_eq!(first.data(), second.data());
    }

    #[test]
    fn test_dimensions_unchanged_and_pixels_drawn() {
        let context = WatermarkContext::with_id("DOC-X", fixed_time());
        let blank = white(240, 320);
        let mut page = blank.clone();

        apply_watermark_at(&mut page, &context, fixed_time()).unwrap();

        assert_eq!((page.width(), page.height()), (240, 320));
        assert_ne!(page.data(), blank.data());
    }

    #[test]
    fn test_identifier_changes_output() {
        let mut a = white(240, 320);
        let mut b = white(240, 320);
        apply_watermark_at(&mut a, &WatermarkContext::with_id("DOC-A", fixed_time()), fixed_time()).unwrap();
        apply_watermark_at(&mut b, &WatermarkContext::with_id("DOC-B", fixed_time()), fixed_time()).unwrap();
        assert_ne!(a.data(), b.data());
    }

    #[test]
    fn test_seal_time_changes_output() {
        let context = WatermarkContext::with_id("DOC-X", fixed_time());
        let mut a = white(240, 320);
        let mut b = white(240, 320);
        apply_watermark_at(&mut a, &context, fixed_time()).unwrap();
        apply_watermark_at(&mut b, &context, fixed_time() + chrono::Duration::hours(1)).unwrap();
        assert_ne!(a.data(), b.data());
    }

    #[test]
    fn test_document_id_format() {
        let at = Local.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let id = document_id_for(&at);
        assert_eq!(id, "DOC-20240102030405-0000");

        let id = WatermarkContext::new().document_id;
        assert!(id.starts_with("DOC-"));
        assert_eq!(id.len(), "DOC-20240102030405-0000".len());
    }

    #[test]
    fn test_tiny_surface() {
        let context = WatermarkContext::with_id("DOC-X", fixed_time());
        let mut page = white(1, 1);
        apply_watermark_at(&mut page, &context, fixed_time()).unwrap();
        assert_eq!((page.width(), page.height()), (1, 1));
    }
}
