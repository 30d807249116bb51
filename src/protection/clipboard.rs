//! Clipboard-write capability
//!
//! The interceptor swaps the active provider for a rejecting stand-in while
//! protection is on. Platforms may refuse the swap, in which case the slot
//! reports an error and the caller carries on without it.

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use thiserror::Error;
use tracing::debug;

use crate::alert::AlertTimer;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClipboardError {
    #[error("Clipboard write denied while the document is protected")]
    Denied,

    #[error("Clipboard capability cannot be replaced on this platform")]
    Locked,
}

/// Programmatic clipboard writes
pub trait ClipboardProvider: Send + Sync {
    fn write_text(&self, text: &str) -> Result<(), ClipboardError>;

    /// Write arbitrary data of `mime_type`
    fn write(&self, mime_type: &str, data: &[u8]) -> Result<(), ClipboardError>;
}

/// Holder of the current clipboard provider
pub struct ClipboardSlot {
    current: RwLock<Arc<dyn ClipboardProvider>>,
    replaceable: bool,
}

impl ClipboardSlot {
    pub fn new(provider: Arc<dyn ClipboardProvider>) -> Self {
        Self {
            current: RwLock::new(provider),
            replaceable: true,
        }
    }

    /// A slot whose provider cannot be swapped out
    pub fn locked(provider: Arc<dyn ClipboardProvider>) -> Self {
        Self {
            current: RwLock::new(provider),
            replaceable: false,
        }
    }

    pub fn current(&self) -> Arc<dyn ClipboardProvider> {
        Arc::clone(&self.current.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Install `provider` and return the one it replaced
    pub fn replace(
        &self,
        provider: Arc<dyn ClipboardProvider>,
    ) -> Result<Arc<dyn ClipboardProvider>, ClipboardError> {
        if !self.replaceable {
            return Err(ClipboardError::Locked);
        }
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        Ok(std::mem::replace(&mut *current, provider))
    }

    pub fn write_text(&self, text: &str) -> Result<(), ClipboardError> {
        self.current().write_text(text)
    }

    pub fn write(&self, mime_type: &str, data: &[u8]) -> Result<(), ClipboardError> {
        self.current().write(mime_type, data)
    }
}

impl fmt::Debug for ClipboardSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClipboardSlot")
            .field("replaceable", &self.replaceable)
            .finish_non_exhaustive()
    }
}

/// Stand-in that refuses every write and raises the alert
pub struct RejectingClipboard {
    alert: AlertTimer,
}

impl RejectingClipboard {
    pub fn new(alert: AlertTimer) -> Self {
        Self { alert }
    }

    fn reject(&self, what: &str) -> Result<(), ClipboardError> {
        debug!(what, "Rejected clipboard write");
        self.alert.activate();
        Err(ClipboardError::Denied)
    }
}

impl ClipboardProvider for RejectingClipboard {
    fn write_text(&self, _text: &str) -> Result<(), ClipboardError> {
        self.reject("text")
    }

    fn write(&self, mime_type: &str, _data: &[u8]) -> Result<(), ClipboardError> {
        self.reject(mime_type)
    }
}

/// Provider that keeps the last written text in memory
#[derive(Debug, Default)]
pub struct MemoryClipboard {
    contents: RwLock<Option<(String, Vec<u8>)>>,
}

impl MemoryClipboard {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Last written text, if the last write was text
    pub fn text(&self) -> Option<String> {
        let contents = self.contents.read().unwrap_or_else(PoisonError::into_inner);
        contents
            .as_ref()
            .filter(|(mime, _)| mime == "text/plain")
            .and_then(|(_, data)| String::from_utf8(data.clone()).ok())
    }
}

impl ClipboardProvider for MemoryClipboard {
    fn write_text(&self, text: &str) -> Result<(), ClipboardError> {
        self.write("text/plain", text.as_bytes())
    }

    fn write(&self, mime_type: &str, data: &[u8]) -> Result<(), ClipboardError> {
        let mut contents = self.contents.write().unwrap_or_else(PoisonError::into_inner);
        *contents = Some((mime_type.to_string(), data.to_vec()));
        Ok(())
    }
}
