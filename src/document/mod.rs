//! Document decoding seam
//!
//! The verification pipeline treats page decoding as a black box: bytes go
//! in, a handle with N independently rasterisable pages comes out. The
//! default implementation is backed by lopdf; anything implementing
//! [`DocumentDecoder`] can replace it.

pub mod pdf;
pub mod temp;

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use tiny_skia::Pixmap;

use crate::error::Result;

pub use pdf::{PdfDecoder, PdfDocument};
pub use temp::{ResourceLedger, TempDocument};

/// Page dimensions in PDF points (1/72 inch)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSize {
    pub width: f32,
    pub height: f32,
}

impl PageSize {
    /// US Letter, used when a page declares no media box
    pub fn letter() -> Self {
        Self { width: 612.0, height: 792.0 }
    }

    /// Pixel dimensions at the given raster scale (at least 1×1)
    pub fn scaled(&self, scale: f32) -> (u32, u32) {
        let w = (self.width * scale).round().max(1.0) as u32;
        let h = (self.height * scale).round().max(1.0) as u32;
        (w, h)
    }
}

/// A decoded, multi-page document.
///
/// Page numbers are 1-based everywhere.
pub trait DecodedDocument: Send + Sync + fmt::Debug {
    /// Number of pages
    fn page_count(&self) -> usize;

    /// Size of one page
    fn page_size(&self, page_number: usize) -> Result<PageSize>;

    /// Rasterise one page onto a fresh surface at `scale` pixels per point.
    ///
    /// Potentially expensive; callers run it off the async executor.
    fn rasterize(&self, page_number: usize, scale: f32) -> Result<Pixmap>;
}

/// Turns the fetched bytes (stored at `path`) into a [`DecodedDocument`].
pub trait DocumentDecoder: Send + Sync {
    /// Fails if the file is not a well-formed document
    fn decode(&self, path: &Path) -> Result<Arc<dyn DecodedDocument>>;
}
