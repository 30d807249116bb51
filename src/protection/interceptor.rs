//! Copy-protection interceptor
//!
//! Two states. Entering `active` subscribes one listener per protected
//! event (document, then window, then container) and tries to swap the
//! clipboard for a rejecting stand-in. Leaving `active` drops the
//! subscriptions in reverse order and puts the original clipboard back.

use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, info, warn};

use crate::alert::AlertTimer;
use crate::messages;

use super::clipboard::{ClipboardProvider, ClipboardSlot, RejectingClipboard};
use super::events::{subscribe, Event, EventKind, EventTarget, Listener, Subscription, UserAction};

/// The three places protected actions are delivered to
#[derive(Clone)]
pub struct ProtectionTargets {
    pub document: Arc<dyn EventTarget>,
    pub window: Arc<dyn EventTarget>,
    pub container: Arc<dyn EventTarget>,
}

/// Subscriptions in attach order
const PLAN: [(Slot, EventKind); 6] = [
    (Slot::Document, EventKind::ContextMenu),
    (Slot::Document, EventKind::KeyDown),
    (Slot::Document, EventKind::DragStart),
    (Slot::Window, EventKind::BeforePrint),
    (Slot::Container, EventKind::SelectStart),
    (Slot::Container, EventKind::Copy),
];

#[derive(Debug, Clone, Copy)]
enum Slot {
    Document,
    Window,
    Container,
}

impl ProtectionTargets {
    fn get(&self, slot: Slot) -> &Arc<dyn EventTarget> {
        match slot {
            Slot::Document => &self.document,
            Slot::Window => &self.window,
            Slot::Container => &self.container,
        }
    }
}

struct ActiveProtection {
    /// Attach order; released back to front
    subscriptions: Vec<Subscription>,
    /// Provider to restore, if the override succeeded
    original_clipboard: Option<Arc<dyn ClipboardProvider>>,
}

pub struct ProtectionInterceptor {
    targets: ProtectionTargets,
    clipboard: Arc<ClipboardSlot>,
    alert: AlertTimer,
    active: Mutex<Option<ActiveProtection>>,
}

impl ProtectionInterceptor {
    pub fn new(targets: ProtectionTargets, clipboard: Arc<ClipboardSlot>, alert: AlertTimer) -> Self {
        Self {
            targets,
            clipboard,
            alert,
            active: Mutex::new(None),
        }
    }

    pub fn is_active(&self) -> bool {
        self.lock().is_some()
    }

    pub fn alert(&self) -> &AlertTimer {
        &self.alert
    }

    /// Move to the requested state; repeated calls with the same value do nothing
    pub fn set_active(&self, active: bool) {
        let mut state = self.lock();
        match (state.is_some(), active) {
            (false, true) => *state = Some(self.attach()),
            (true, false) => {
                if let Some(protection) = state.take() {
                    self.detach(protection);
                }
            }
            _ => {}
        }
    }

    fn attach(&self) -> ActiveProtection {
        let subscriptions: Vec<Subscription> = PLAN
            .iter()
            .map(|(slot, kind)| subscribe(self.targets.get(*slot), *kind, self.listener(*kind)))
            .collect();

        let stand_in = Arc::new(RejectingClipboard::new(self.alert.clone()));
        let original_clipboard = match self.clipboard.replace(stand_in) {
            Ok(original) => Some(original),
            Err(e) => {
                warn!(error = %e, "Could not override clipboard writes");
                None
            }
        };

        info!(
            listeners = subscriptions.len(),
            clipboard_overridden = original_clipboard.is_some(),
            "Document protection activated"
        );

        ActiveProtection {
            subscriptions,
            original_clipboard,
        }
    }

    fn detach(&self, mut protection: ActiveProtection) {
        while let Some(subscription) = protection.subscriptions.pop() {
            drop(subscription);
        }

        if let Some(original) = protection.original_clipboard.take() {
            if let Err(e) = self.clipboard.replace(original) {
                warn!(error = %e, "Could not restore clipboard writes");
            }
        }

        info!("Document protection deactivated");
    }

    fn listener(&self, kind: EventKind) -> Listener {
        let alert = self.alert.clone();
        Arc::new(move |event: &mut Event| {
            if !suppresses(event.action()) {
                return;
            }
            event.prevent_default();
            let notice = match kind {
                EventKind::BeforePrint => messages::PRINT_BLOCKED,
                _ => messages::COPY_BLOCKED,
            };
            event.set_notice(notice);
            alert.activate();
            debug!(action = ?event.action(), "Blocked user action");
        })
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<ActiveProtection>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for ProtectionInterceptor {
    fn drop(&mut self) {
        self.set_active(false);
    }
}

/// Whether an action is suppressed while protection is on
pub fn suppresses(action: &UserAction) -> bool {
    match action {
        UserAction::KeyDown(combo) => combo.is_blocked(),
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protection::clipboard::{ClipboardError, MemoryClipboard};
    use crate::protection::events::EventHub;
    use crate::protection::keys::KeyCombo;
    use std::time::Duration;

    struct Fixture {
        document: Arc<EventHub>,
        window: Arc<EventHub>,
        container: Arc<EventHub>,
        clipboard: Arc<MemoryClipboard>,
        slot: Arc<ClipboardSlot>,
        interceptor: ProtectionInterceptor,
    }

    fn fixture_with(slot: impl FnOnce(Arc<MemoryClipboard>) -> ClipboardSlot) -> Fixture {
        let document = EventHub::new("document");
        let window = EventHub::new("window");
        let container = EventHub::new("container");
        let clipboard = MemoryClipboard::new();
        let slot = Arc::new(slot(clipboard.clone()));
        let alert = AlertTimer::new(Duration::from_millis(3000)).unwrap();

        let targets = ProtectionTargets {
            document: document.clone(),
            window: window.clone(),
            container: container.clone(),
        };
        let interceptor = ProtectionInterceptor::new(targets, slot.clone(), alert);

        Fixture {
            document,
            window,
            container,
            clipboard,
            slot,
            interceptor,
        }
    }

    fn fixture() -> Fixture {
        fixture_with(|clipboard| ClipboardSlot::new(clipboard))
    }

    fn total_listeners(f: &Fixture) -> usize {
        f.document.listener_count() + f.window.listener_count() + f.container.listener_count()
    }

    #[tokio::test(start_paused = true)]
    async fn test_inactive_allows_everything() {
        let f = fixture();
        assert!(!f.interceptor.is_active());
        assert_eq!(total_listeners(&f), 0);

        let outcome = f.document.dispatch(UserAction::ContextMenu);
        assert!(!outcome.default_prevented);
        assert!(!f.interceptor.alert().is_visible());

        f.slot.write_text("texto").unwrap();
        assert_eq!(f.clipboard.text().as_deref(), Some("texto"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_activation_attaches_each_listener_once() {
        let f = fixture();
        f.interceptor.set_active(true);
        f.interceptor.set_active(true);

        assert!(f.interceptor.is_active());
        assert_eq!(f.document.listener_count(), 3);
        assert_eq!(f.window.listener_count(), 1);
        assert_eq!(f.container.listener_count(), 2);
        assert_eq!(f.document.listener_count_for(EventKind::KeyDown), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_blocks_actions_and_raises_alert() {
        let f = fixture();
        f.interceptor.set_active(true);

        for (hub, action) in [
            (&f.document, UserAction::ContextMenu),
            (&f.document, UserAction::DragStart),
            (&f.document, UserAction::KeyDown(KeyCombo::ctrl("c"))),
            (&f.document, UserAction::KeyDown(KeyCombo::key("F12"))),
            (&f.container, UserAction::SelectStart),
            (&f.container, UserAction::Copy),
        ] {
            let outcome = hub.dispatch(action);
            assert!(outcome.default_prevented);
            assert_eq!(outcome.notice, Some(messages::COPY_BLOCKED));
        }
        assert!(f.interceptor.alert().is_visible());

        let outcome = f.window.dispatch(UserAction::BeforePrint);
        assert!(outcome.default_prevented);
        assert_eq!(outcome.notice, Some(messages::PRINT_BLOCKED));
    }

    #[tokio::test(start_paused = true)]
    async fn test_ordinary_keys_pass_through() {
        let f = fixture();
        f.interceptor.set_active(true);

        let outcome = f.document.dispatch(UserAction::KeyDown(KeyCombo::key("a")));
        assert!(!outcome.default_prevented);
        assert!(!f.interceptor.alert().is_visible());
    }

    #[tokio::test(start_paused = true)]
    async fn test_alert_extends_on_repeated_blocks() {
        let f = fixture();
        f.interceptor.set_active(true);

        f.document.dispatch(UserAction::ContextMenu);
        tokio::time::sleep(Duration::from_millis(2000)).await;
        f.document.dispatch(UserAction::ContextMenu);
        tokio::time::sleep(Duration::from_millis(2000)).await;
        assert!(f.interceptor.alert().is_visible());

        tokio::time::sleep(Duration::from_millis(1001)).await;
        assert!(!f.interceptor.alert().is_visible());
    }

    #[tokio::test(start_paused = true)]
    async fn test_clipboard_override_and_restore() {
        let f = fixture();
        f.interceptor.set_active(true);

        assert_eq!(f.slot.write_text("secreto"), Err(ClipboardError::Denied));
        assert_eq!(f.clipboard.text(), None);
        assert!(f.interceptor.alert().is_visible());

        f.interceptor.set_active(false);
        f.slot.write_text("libre").unwrap();
        assert_eq!(f.clipboard.text().as_deref(), Some("libre"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_deactivation_detaches_everything() {
        let f = fixture();
        for _ in 0..3 {
            f.interceptor.set_active(true);
            f.interceptor.set_active(false);
            f.interceptor.set_active(false);
        }
        assert!(!f.interceptor.is_active());
        assert_eq!(total_listeners(&f), 0);

        let outcome = f.window.dispatch(UserAction::BeforePrint);
        assert!(!outcome.default_prevented);
    }

    #[tokio::test(start_paused = true)]
    async fn test_locked_clipboard_degrades_gracefully() {
        let f = fixture_with(|clipboard| ClipboardSlot::locked(clipboard));
        f.interceptor.set_active(true);

        // Listeners still work without the clipboard override
        assert!(f.interceptor.is_active());
        assert!(f.container.dispatch(UserAction::Copy).default_prevented);
        f.slot.write_text("permitido").unwrap();

        f.interceptor.set_active(false);
        assert_eq!(total_listeners(&f), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_deactivates() {
        let f = fixture();
        f.interceptor.set_active(true);
        let Fixture {
            document,
            window,
            container,
            clipboard,
            slot,
            interceptor,
        } = f;
        drop(interceptor);

        assert_eq!(document.listener_count() + window.listener_count() + container.listener_count(), 0);
        slot.write_text("libre").unwrap();
        assert_eq!(clipboard.text().as_deref(), Some("libre"));
    }
}
