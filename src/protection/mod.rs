//! Copy protection for a displayed certificate
//!
//! While a valid document is on screen, context menus, copying, dragging,
//! text selection, printing and the extraction shortcuts are suppressed and
//! each attempt raises the transient alert. These are deterrents only; the
//! document bytes remain reachable by a determined user.

pub mod clipboard;
pub mod events;
pub mod interceptor;
pub mod keys;

pub use clipboard::{ClipboardError, ClipboardProvider, ClipboardSlot, MemoryClipboard};
pub use events::{DispatchOutcome, EventHub, EventKind, EventTarget, UserAction};
pub use interceptor::{ProtectionInterceptor, ProtectionTargets};
pub use keys::KeyCombo;
