//! lopdf-backed document decoder
//!
//! Resolves the page tree and each page's media box. Rasterising produces a
//! blank white surface of the page's size; painting the page content stream
//! is left to a full rasteriser plugged in through [`DocumentDecoder`].

use std::path::Path;
use std::sync::Arc;

use lopdf::{Dictionary, Document, Object, ObjectId};
use tiny_skia::{Color, Pixmap};
use tracing::debug;

use super::{DecodedDocument, DocumentDecoder, PageSize};
use crate::error::{Error, Result};

/// Page-tree inheritance is never this deep in real files; stop on cycles.
const MAX_PARENT_DEPTH: usize = 32;

/// Decoder for PDF documents
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfDecoder;

impl DocumentDecoder for PdfDecoder {
    fn decode(&self, path: &Path) -> Result<Arc<dyn DecodedDocument>> {
        Ok(Arc::new(PdfDocument::open(path)?))
    }
}

/// A loaded PDF with its pages in document order
#[derive(Debug)]
pub struct PdfDocument {
    pages: Vec<ObjectId>,
    sizes: Vec<PageSize>,
    title: Option<String>,
    author: Option<String>,
}

impl PdfDocument {
    /// Load from a file
    pub fn open(path: &Path) -> Result<Self> {
        let doc = Document::load(path).map_err(|e| Error::Decode(e.to_string()))?;
        Self::from_document(doc)
    }

    /// Load from raw bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let doc = Document::load_mem(bytes).map_err(|e| Error::Decode(e.to_string()))?;
        Self::from_document(doc)
    }

    fn from_document(doc: Document) -> Result<Self> {
        // get_pages walks the tree in order, keyed by 1-based page number
        let pages: Vec<ObjectId> = doc.get_pages().into_values().collect();
        let sizes = pages
            .iter()
            .map(|id| resolve_media_box(&doc, *id))
            .collect::<Result<Vec<_>>>()
            .map_err(|e| match e {
                // A broken page tree means a damaged document
                Error::Pdf(e) => Error::Decode(e.to_string()),
                other => other,
            })?;

        let title = info_string(&doc, b"Title");
        let author = info_string(&doc, b"Author");

        debug!(pages = pages.len(), "Decoded PDF document");
        Ok(Self {
            pages,
            sizes,
            title,
            author,
        })
    }

    /// Document title from the Info dictionary
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Document author from the Info dictionary
    pub fn author(&self) -> Option<&str> {
        self.author.as_deref()
    }

    fn check_page(&self, page_number: usize) -> Result<usize> {
        if page_number == 0 || page_number > self.pages.len() {
            return Err(Error::General(format!(
                "Page {} out of range (document has {} pages)",
                page_number,
                self.pages.len()
            )));
        }
        Ok(page_number - 1)
    }
}

impl DecodedDocument for PdfDocument {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_size(&self, page_number: usize) -> Result<PageSize> {
        let index = self.check_page(page_number)?;
        Ok(self.sizes[index])
    }

    fn rasterize(&self, page_number: usize, scale: f32) -> Result<Pixmap> {
        let size = self.page_size(page_number)?;
        let (width, height) = size.scaled(scale);
        let mut pixmap = Pixmap::new(width, height).ok_or_else(|| {
            Error::Render(format!("Cannot allocate {}x{} surface", width, height))
        })?;
        pixmap.fill(Color::WHITE);
        Ok(pixmap)
    }
}

/// Read a text entry of the trailer's Info dictionary
fn info_string(doc: &Document, key: &[u8]) -> Option<String> {
    let info = match doc.trailer.get(b"Info").ok()? {
        Object::Reference(id) => doc.get_object(*id).ok()?,
        other => other,
    };
    let bytes = info.as_dict().ok()?.get(key).ok()?.as_str().ok()?;
    String::from_utf8(bytes.to_vec()).ok()
}

/// Find the page's MediaBox, following `Parent` links for inherited values
fn resolve_media_box(doc: &Document, page_id: ObjectId) -> Result<PageSize> {
    let mut current = page_id;

    for _ in 0..MAX_PARENT_DEPTH {
        let dict = doc.get_object(current)?.as_dict()?;

        if let Ok(media_box) = dict.get(b"MediaBox") {
            return parse_media_box(doc, media_box);
        }

        match parent_of(dict) {
            Some(parent) => current = parent,
            None => break,
        }
    }

    // No media box anywhere in the chain
    Ok(PageSize::letter())
}

fn parent_of(dict: &Dictionary) -> Option<ObjectId> {
    match dict.get(b"Parent") {
        Ok(Object::Reference(id)) => Some(*id),
        _ => None,
    }
}

/// Parse `[llx lly urx ury]`, which may itself be an indirect reference
fn parse_media_box(doc: &Document, obj: &Object) -> Result<PageSize> {
    let array = match obj {
        Object::Array(arr) => arr,
        Object::Reference(id) => doc.get_object(*id)?.as_array()?,
        _ => return Err(Error::Decode("MediaBox is not an array".to_string())),
    };

    if array.len() != 4 {
        return Err(Error::Decode(format!(
            "MediaBox has {} entries, expected 4",
            array.len()
        )));
    }

    let nums = array
        .iter()
        .map(|o| o.as_float().map_err(|_| Error::Decode("MediaBox entry is not a number".to_string())))
        .collect::<Result<Vec<f32>>>()?;

    Ok(PageSize {
        width: (nums[2] - nums[0]).abs(),
        height: (nums[3] - nums[1]).abs(),
    })
}
