//! Viewer end to end: protection follows the displayed document

mod common;

use std::sync::Arc;
use std::time::Duration;

use cert_verify::messages;
use cert_verify::protection::{
    ClipboardError, ClipboardSlot, EventHub, KeyCombo, MemoryClipboard, ProtectionTargets, UserAction,
};
use cert_verify::CertificateViewer;
use tempfile::TempDir;

use common::Backend;

struct Surface {
    document: Arc<EventHub>,
    window: Arc<EventHub>,
    container: Arc<EventHub>,
    clipboard: Arc<MemoryClipboard>,
    slot: Arc<ClipboardSlot>,
}

impl Surface {
    fn new() -> Self {
        let clipboard = MemoryClipboard::new();
        Self {
            document: EventHub::new("document"),
            window: EventHub::new("window"),
            container: EventHub::new("container"),
            slot: Arc::new(ClipboardSlot::new(clipboard.clone())),
            clipboard,
        }
    }

    fn targets(&self) -> ProtectionTargets {
        ProtectionTargets {
            document: self.document.clone(),
            window: self.window.clone(),
            container: self.container.clone(),
        }
    }

    fn listeners(&self) -> usize {
        self.document.listener_count() + self.window.listener_count() + self.container.listener_count()
    }
}

#[tokio::test]
async fn test_protection_follows_validity() {
    let backend = Backend::start().await;
    let surface = Surface::new();
    let viewer = CertificateViewer::new(backend.config(), surface.targets(), surface.slot.clone()).unwrap();

    viewer.open(Some("demo123")).finished().await;
    assert!(viewer.snapshot().is_valid());
    assert!(viewer.is_protected());
    assert_eq!(surface.listeners(), 6);

    // A new code drops protection while it validates, and it stays off on failure
    viewer.open(Some("missing")).finished().await;
    assert_eq!(viewer.snapshot().error_message(), Some(messages::NOT_FOUND));
    assert!(!viewer.is_protected());
    assert_eq!(surface.listeners(), 0);

    viewer.open(Some("demo123")).finished().await;
    assert!(viewer.is_protected());

    viewer.close();
    assert!(!viewer.is_protected());
    assert_eq!(surface.listeners(), 0);
}

#[tokio::test]
async fn test_blocked_actions_raise_alert() {
    let backend = Backend::start().await;
    let surface = Surface::new();
    let viewer = CertificateViewer::new(backend.config(), surface.targets(), surface.slot.clone()).unwrap();

    viewer.open(Some("demo123")).finished().await;
    assert!(!viewer.alert_visible());

    let outcome = surface.document.dispatch(UserAction::KeyDown(KeyCombo::ctrl("p")));
    assert!(outcome.default_prevented);
    assert!(viewer.alert_visible());

    let outcome = surface.window.dispatch(UserAction::BeforePrint);
    assert_eq!(outcome.notice, Some(messages::PRINT_BLOCKED));

    assert!(surface.container.dispatch(UserAction::Copy).default_prevented);
    assert_eq!(surface.slot.write_text("robado"), Err(ClipboardError::Denied));
    assert_eq!(surface.clipboard.text(), None);

    viewer.close();
    surface.slot.write_text("libre").unwrap();
    assert_eq!(surface.clipboard.text().as_deref(), Some("libre"));
}

#[tokio::test]
async fn test_render_pages_and_footer() {
    let backend = Backend::start().await;
    let surface = Surface::new();
    let viewer = CertificateViewer::new(backend.config(), surface.targets(), surface.slot.clone()).unwrap();

    viewer.open(Some("multi")).finished().await;
    let snapshot = viewer.snapshot();
    assert_eq!(snapshot.pages().len(), 3);

    let out = TempDir::new().unwrap();
    for page in snapshot.pages() {
        let pixmap = viewer.render_page(page).await.unwrap();
        // 200×300 pt at the default 1.5 scale
        assert_eq!((pixmap.width(), pixmap.height()), (300, 450));
        let path = out.path().join(format!("page-{:03}.png", page.page_number));
        pixmap.save_png(&path).unwrap();
        assert!(path.exists());
    }

    let [date, code] = viewer.footer().unwrap();
    assert!(date.starts_with("Fecha de verificación: "));
    assert_eq!(code, "Código de verificación: multi");
}

#[tokio::test]
async fn test_same_context_for_every_page() {
    let backend = Backend::start().await;
    let surface = Surface::new();
    let viewer = CertificateViewer::new(backend.config(), surface.targets(), surface.slot.clone()).unwrap();

    let id = viewer.watermark_context().document_id.clone();
    viewer.open(Some("demo123")).finished().await;
    viewer.open(Some("multi")).finished().await;

    assert_eq!(viewer.watermark_context().document_id, id);
    assert!(id.starts_with("DOC-"));
}

#[tokio::test]
async fn test_dropping_viewer_lifts_protection() {
    let backend = Backend::start().await;
    let surface = Surface::new();
    let viewer = CertificateViewer::new(backend.config(), surface.targets(), surface.slot.clone()).unwrap();

    viewer.open(Some("demo123")).finished().await;
    assert_eq!(surface.listeners(), 6);

    drop(viewer);
    assert_eq!(surface.listeners(), 0);
    assert!(!surface.document.dispatch(UserAction::ContextMenu).default_prevented);
}

#[tokio::test]
async fn test_settled_returns_when_closed_mid_session() {
    let backend = Backend::start().await;
    let surface = Surface::new();
    let viewer = CertificateViewer::new(backend.config(), surface.targets(), surface.slot.clone()).unwrap();

    let handle = viewer.open(Some("slowish"));
    viewer.close();

    let snapshot = tokio::time::timeout(Duration::from_secs(2), viewer.settled())
        .await
        .unwrap();
    assert!(!snapshot.state.is_terminal());
    assert!(!viewer.is_protected());

    handle.finished().await;
    assert!(!viewer.snapshot().is_valid());
}
