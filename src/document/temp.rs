//! Temporary local copy of a fetched document
//!
//! Each successful download is written to a temp file that the session owns
//! until it is superseded or torn down. Dropping the handle deletes the file,
//! so a resource can be released at most once.

use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::Result;

/// Counts temporary documents that have been created but not yet released.
#[derive(Debug, Clone, Default)]
pub struct ResourceLedger {
    outstanding: Arc<AtomicUsize>,
}

impl ResourceLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live temporary documents
    pub fn outstanding(&self) -> usize {
        self.outstanding.load(Ordering::SeqCst)
    }
}

/// A fetched document body stored on disk.
#[derive(Debug)]
pub struct TempDocument {
    file: NamedTempFile,
    ledger: ResourceLedger,
}

impl TempDocument {
    /// Write `bytes` to a fresh temp file and record it in `ledger`
    pub fn create(bytes: &[u8], ledger: &ResourceLedger) -> Result<Self> {
        let mut file = tempfile::Builder::new()
            .prefix("certificado-")
            .suffix(".pdf")
            .tempfile()?;
        file.write_all(bytes)?;
        file.flush()?;

        ledger.outstanding.fetch_add(1, Ordering::SeqCst);
        debug!(path = %file.path().display(), size = bytes.len(), "Created temporary document");

        Ok(Self {
            file,
            ledger: ledger.clone(),
        })
    }

    /// Location of the stored bytes
    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

impl Drop for TempDocument {
    fn drop(&mut self) {
        // NamedTempFile removes the file itself when dropped right after this
        self.ledger.outstanding.fetch_sub(1, Ordering::SeqCst);
        debug!(path = %self.file.path().display(), "Released temporary document");
    }
}
