//! Transient alert flag
//!
//! `activate()` raises the flag and schedules a single reset. Calling it
//! again while the flag is up replaces the pending reset, so rapid repeats
//! extend one visibility window instead of producing separate pulses.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::error::{Error, Result};

/// Default visibility window
pub const DEFAULT_ALERT_DURATION: Duration = Duration::from_millis(3000);

/// Boolean flag that switches itself off after a fixed delay
#[derive(Debug, Clone)]
pub struct AlertTimer {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    duration: Duration,
    visible: watch::Sender<bool>,
    /// Bumped by every activation; a reset only applies to its own
    generation: AtomicU64,
    pending: Mutex<Option<JoinHandle<()>>>,
    runtime: Handle,
}

impl AlertTimer {
    /// Create a timer bound to the current tokio runtime
    pub fn new(duration: Duration) -> Result<Self> {
        let runtime = Handle::try_current()
            .map_err(|e| Error::General(format!("Alert timer needs a tokio runtime: {}", e)))?;
        let (visible, _) = watch::channel(false);

        Ok(Self {
            inner: Arc::new(Inner {
                duration,
                visible,
                generation: AtomicU64::new(0),
                pending: Mutex::new(None),
                runtime,
            }),
        })
    }

    /// Raise the flag and (re)start the reset delay
    pub fn activate(&self) {
        let mut pending = self
            .inner
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if let Some(previous) = pending.take() {
            previous.abort();
        }

        let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.inner.visible.send_replace(true);

        let inner = Arc::downgrade(&self.inner);
        let duration = self.inner.duration;
        *pending = Some(self.inner.runtime.spawn(async move {
            tokio::time::sleep(duration).await;
            if let Some(inner) = inner.upgrade() {
                inner.dismiss(generation);
            }
        }));
    }

    /// Whether the alert is currently showing
    pub fn is_visible(&self) -> bool {
        *self.inner.visible.borrow()
    }

    /// Observe flag changes
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.inner.visible.subscribe()
    }

}

impl Inner {
    /// Lower the flag unless a later activation has taken over
    fn dismiss(&self, generation: u64) -> bool {
        let lowered = self.visible.send_if_modified(|visible| {
            if self.generation.load(Ordering::SeqCst) != generation || !*visible {
                return false;
            }
            *visible = false;
            true
        });
        if lowered {
            debug!("Alert dismissed");
        }
        lowered
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        let pending = self.pending.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(task) = pending.take() {
            task.abort();
        }
    }
}
