//! Certificate viewer
//!
//! Ties the pieces together the way the presentation shell sees them: a
//! session controller producing snapshots, a watermark context shared by
//! every page, and copy protection that is active exactly while the
//! snapshot holds a valid document.

use std::sync::Arc;

use tiny_skia::Pixmap;
use tokio::sync::watch;
use tracing::debug;

use crate::alert::AlertTimer;
use crate::config::ViewerConfig;
use crate::document::{DocumentDecoder, PdfDecoder};
use crate::error::Result;
use crate::messages;
use crate::protection::{ClipboardSlot, ProtectionInterceptor, ProtectionTargets};
use crate::render;
use crate::session::{PageRef, SessionController, SessionHandle, ViewerSnapshot};
use crate::watermark::WatermarkContext;

pub struct CertificateViewer {
    controller: SessionController,
    interceptor: Arc<ProtectionInterceptor>,
    alert: AlertTimer,
    context: WatermarkContext,
    render_scale: f32,
}

impl CertificateViewer {
    /// Viewer using the PDF decoder. Must be created inside a tokio runtime.
    pub fn new(
        config: ViewerConfig,
        targets: ProtectionTargets,
        clipboard: Arc<ClipboardSlot>,
    ) -> Result<Self> {
        Self::with_decoder(config, targets, clipboard, Arc::new(PdfDecoder))
    }

    pub fn with_decoder(
        config: ViewerConfig,
        targets: ProtectionTargets,
        clipboard: Arc<ClipboardSlot>,
        decoder: Arc<dyn DocumentDecoder>,
    ) -> Result<Self> {
        let alert = AlertTimer::new(config.alert_duration)?;
        let render_scale = config.render_scale;
        let controller = SessionController::with_decoder(config, decoder)?;
        let interceptor = Arc::new(ProtectionInterceptor::new(targets, clipboard, alert.clone()));

        let protection = Arc::clone(&interceptor);
        controller.set_observer(Arc::new(move |snapshot: &ViewerSnapshot| {
            protection.set_active(snapshot.is_valid());
        }));

        Ok(Self {
            controller,
            interceptor,
            alert,
            context: WatermarkContext::new(),
            render_scale,
        })
    }

    /// Verify `code`, replacing whatever was shown before
    pub fn open(&self, code: Option<&str>) -> SessionHandle {
        self.controller.start(code)
    }

    pub fn retry(&self) -> SessionHandle {
        self.controller.retry()
    }

    pub fn snapshot(&self) -> ViewerSnapshot {
        self.controller.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<ViewerSnapshot> {
        self.controller.subscribe()
    }

    /// Wait for the current session to reach `Valid` or `Invalid`, or to be
    /// dropped by `close` or a newer `open`. A dropped session returns the
    /// snapshot as it stands, which may still be `Validating`.
    pub async fn settled(&self) -> ViewerSnapshot {
        let token = self.controller.cancellation();
        let mut updates = self.controller.subscribe();
        let terminal = tokio::select! {
            result = updates.wait_for(|snapshot| snapshot.state.is_terminal()) => {
                result.ok().map(|snapshot| snapshot.clone())
            }
            _ = token.cancelled() => None,
        };
        terminal.unwrap_or_else(|| self.controller.snapshot())
    }

    pub fn activate_alert(&self) {
        self.alert.activate();
    }

    pub fn alert_visible(&self) -> bool {
        self.alert.is_visible()
    }

    pub fn is_protected(&self) -> bool {
        self.interceptor.is_active()
    }

    pub fn watermark_context(&self) -> &WatermarkContext {
        &self.context
    }

    /// Render one page with the security overlays
    pub async fn render_page(&self, page: &PageRef) -> Result<Pixmap> {
        render::render_page(page, self.render_scale, &self.context).await
    }

    /// Footer lines for a verified certificate
    pub fn footer(&self) -> Option<[String; 2]> {
        if !self.snapshot().is_valid() {
            return None;
        }
        let code = self.controller.code().unwrap_or_default();
        Some(messages::verification_footer(&self.context.generated_at, code.trim()))
    }

    pub fn controller(&self) -> &SessionController {
        &self.controller
    }

    /// Abort the session, release its document and lift protection
    pub fn close(&self) {
        self.controller.teardown();
        self.interceptor.set_active(false);
        debug!("Viewer closed");
    }
}

impl Drop for CertificateViewer {
    fn drop(&mut self) {
        self.close();
    }
}
