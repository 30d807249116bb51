//! Keyboard combinations that extract the document

use std::fmt;

/// A key press with its modifier state
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct KeyCombo {
    /// Key name as reported by the platform, e.g. `"c"`, `"S"`, `"F12"`
    pub key: String,
    pub ctrl: bool,
    pub meta: bool,
    pub shift: bool,
}

impl KeyCombo {
    /// A bare key with no modifiers
    pub fn key(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ..Self::default()
        }
    }

    /// `key` with Ctrl held
    pub fn ctrl(key: impl Into<String>) -> Self {
        Self {
            ctrl: true,
            ..Self::key(key)
        }
    }

    /// `key` with Meta (Cmd) held
    pub fn meta(key: impl Into<String>) -> Self {
        Self {
            meta: true,
            ..Self::key(key)
        }
    }

    pub fn with_shift(mut self) -> Self {
        self.shift = true;
        self
    }

    /// Copy, print, save, save-as, developer tools, view source or F12
    pub fn is_blocked(&self) -> bool {
        if self.key.eq_ignore_ascii_case("f12") {
            return true;
        }
        if !(self.ctrl || self.meta) {
            return false;
        }
        // Shift only distinguishes save-as and developer tools; both stay blocked
        matches!(
            self.key.to_ascii_lowercase().as_str(),
            "c" | "p" | "s" | "i" | "u"
        )
    }
}

impl fmt::Display for KeyCombo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ctrl {
            write!(f, "Ctrl+")?;
        }
        if self.meta {
            write!(f, "Meta+")?;
        }
        if self.shift {
            write!(f, "Shift+")?;
        }
        write!(f, "{}", self.key)
    }
}
