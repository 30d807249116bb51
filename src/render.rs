//! Page rendering
//!
//! Rasterises one page and composites the watermark onto it. Both steps
//! run on the blocking pool; the overlay passes run synchronously once the
//! raster exists.

use tiny_skia::Pixmap;
use tracing::debug;

use crate::error::{Error, Result};
use crate::session::PageRef;
use crate::watermark::{self, WatermarkContext};

/// Render `page` at `scale` and stamp it with `context`
pub async fn render_page(page: &PageRef, scale: f32, context: &WatermarkContext) -> Result<Pixmap> {
    let page = page.clone();
    let context = context.clone();

    tokio::task::spawn_blocking(move || {
        let mut pixmap = page.document.rasterize(page.page_number, scale)?;
        watermark::apply_watermark(&mut pixmap, &context)?;
        debug!(
            page = page.page_number,
            width = pixmap.width(),
            height = pixmap.height(),
            "Rendered page"
        );
        Ok(pixmap)
    })
    .await
    .map_err(|e| Error::Render(format!("Render task failed: {}", e)))?
}
