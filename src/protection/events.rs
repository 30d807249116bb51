//! User-action events and the targets that dispatch them
//!
//! A target keeps an ordered listener list per event kind. Subscribing
//! returns a [`Subscription`] guard; dropping the guard removes exactly the
//! listener it added, so attach and detach are always paired.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::trace;

use super::keys::KeyCombo;

/// Kinds of event a listener can subscribe to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    ContextMenu,
    KeyDown,
    DragStart,
    SelectStart,
    BeforePrint,
    Copy,
}

/// A discrete user action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserAction {
    ContextMenu,
    KeyDown(KeyCombo),
    DragStart,
    SelectStart,
    BeforePrint,
    Copy,
}

impl UserAction {
    pub fn kind(&self) -> EventKind {
        match self {
            UserAction::ContextMenu => EventKind::ContextMenu,
            UserAction::KeyDown(_) => EventKind::KeyDown,
            UserAction::DragStart => EventKind::DragStart,
            UserAction::SelectStart => EventKind::SelectStart,
            UserAction::BeforePrint => EventKind::BeforePrint,
            UserAction::Copy => EventKind::Copy,
        }
    }
}

/// An action being dispatched; listeners may cancel its default behaviour
#[derive(Debug)]
pub struct Event {
    action: UserAction,
    default_prevented: bool,
    notice: Option<&'static str>,
}

impl Event {
    pub fn new(action: UserAction) -> Self {
        Self {
            action,
            default_prevented: false,
            notice: None,
        }
    }

    pub fn action(&self) -> &UserAction {
        &self.action
    }

    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    /// Attach a message for the user explaining the suppression
    pub fn set_notice(&mut self, notice: &'static str) {
        self.notice = Some(notice);
    }
}

/// What happened to a dispatched action
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchOutcome {
    pub default_prevented: bool,
    pub notice: Option<&'static str>,
}

pub type Listener = Arc<dyn Fn(&mut Event) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Something user actions are delivered to
pub trait EventTarget: Send + Sync {
    /// Target name for logs
    fn name(&self) -> &str;

    fn add_listener(&self, kind: EventKind, listener: Listener) -> ListenerId;

    /// Returns false if `id` was not registered for `kind`
    fn remove_listener(&self, kind: EventKind, id: ListenerId) -> bool;
}

/// Subscribe `listener` and return the guard that removes it
pub fn subscribe(target: &Arc<dyn EventTarget>, kind: EventKind, listener: Listener) -> Subscription {
    let id = target.add_listener(kind, listener);
    Subscription {
        target: Arc::clone(target),
        kind,
        id,
    }
}

/// Removes its listener on drop
pub struct Subscription {
    target: Arc<dyn EventTarget>,
    kind: EventKind,
    id: ListenerId,
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("target", &self.target.name())
            .field("kind", &self.kind)
            .field("id", &self.id)
            .finish()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.target.remove_listener(self.kind, self.id);
        trace!(target_name = self.target.name(), kind = ?self.kind, "Listener detached");
    }
}

/// In-process event target
pub struct EventHub {
    name: String,
    next_id: AtomicU64,
    listeners: Mutex<Vec<(ListenerId, EventKind, Listener)>>,
}

impl EventHub {
    pub fn new(name: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            next_id: AtomicU64::new(1),
            listeners: Mutex::new(Vec::new()),
        })
    }

    /// Deliver `action` to every listener of its kind, in registration order
    pub fn dispatch(&self, action: UserAction) -> DispatchOutcome {
        let kind = action.kind();
        // Listeners run outside the lock so they may touch this target
        let matching: Vec<Listener> = self
            .lock()
            .iter()
            .filter(|(_, k, _)| *k == kind)
            .map(|(_, _, listener)| Arc::clone(listener))
            .collect();

        let mut event = Event::new(action);
        for listener in matching {
            listener(&mut event);
        }

        DispatchOutcome {
            default_prevented: event.default_prevented,
            notice: event.notice,
        }
    }

    pub fn listener_count(&self) -> usize {
        self.lock().len()
    }

    pub fn listener_count_for(&self, kind: EventKind) -> usize {
        self.lock().iter().filter(|(_, k, _)| *k == kind).count()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<(ListenerId, EventKind, Listener)>> {
        self.listeners.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for EventHub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventHub")
            .field("name", &self.name)
            .field("listeners", &self.listener_count())
            .finish()
    }
}

impl EventTarget for EventHub {
    fn name(&self) -> &str {
        &self.name
    }

    fn add_listener(&self, kind: EventKind, listener: Listener) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.lock().push((id, kind, listener));
        id
    }

    fn remove_listener(&self, kind: EventKind, id: ListenerId) -> bool {
        let mut listeners = self.lock();
        let before = listeners.len();
        listeners.retain(|(i, k, _)| !(*i == id && *k == kind));
        listeners.len() != before
    }
}
