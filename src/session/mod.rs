//! Verification sessions
//!
//! A session turns one verification code into either a list of displayable
//! pages or a terminal error. The [`SessionController`] owns the lifecycle;
//! the types here are what it publishes to the presentation shell.

pub mod classify;
pub mod controller;
pub mod transport;

use std::fmt;
use std::sync::Arc;

use crate::document::DecodedDocument;
use crate::error::{Error, Result};
use crate::messages;

pub use controller::{SessionController, SessionHandle, StateObserver};
pub use transport::HttpTransport;

/// Progress checkpoints, in the order a successful session reaches them
pub mod progress {
    pub const REQUEST_BUILT: u8 = 10;
    pub const REQUEST_SENT: u8 = 20;
    pub const HEADERS_RECEIVED: u8 = 50;
    pub const BODY_DOWNLOADED: u8 = 70;
    pub const RESOURCE_CREATED: u8 = 80;
    pub const DOCUMENT_DECODED: u8 = 90;
    pub const PAGES_ENUMERATED: u8 = 100;
}

/// A verification code that passed validation.
///
/// The original string is kept as supplied; trimming is only used to decide
/// whether it is blank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationCode(String);

impl VerificationCode {
    /// Validate a possibly missing code
    pub fn parse(raw: Option<&str>) -> Result<Self> {
        match raw {
            Some(code) if !code.trim().is_empty() => Ok(Self(code.to_string())),
            _ => Err(Error::InvalidCode),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VerificationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Category of a user-visible failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Connection,
    Security,
    Timeout,
    Cors,
    Generic,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Connection => "connection",
            Self::Security => "security",
            Self::Timeout => "timeout",
            Self::Cors => "cors",
            Self::Generic => "generic",
        }
    }

    /// Headline message shown for this kind
    pub fn message(&self) -> &'static str {
        match self {
            Self::Connection => messages::CONNECTION,
            Self::Security => messages::SECURITY,
            Self::Timeout => messages::TIMEOUT,
            Self::Cors => messages::CORS,
            Self::Generic => messages::GENERIC,
        }
    }

    /// Remediation hint; generic failures have none
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::Connection => Some(messages::CONNECTION_HINT),
            Self::Security => Some(messages::SECURITY_HINT),
            Self::Timeout => Some(messages::TIMEOUT_HINT),
            Self::Cors => Some(messages::CORS_HINT),
            Self::Generic => None,
        }
    }
}

/// Extra information attached to a classified failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorDetail {
    pub kind: ErrorKind,
    pub suggestion: String,
}

impl ErrorDetail {
    /// Detail for a kind, or `None` when the kind carries no suggestion
    pub fn for_kind(kind: ErrorKind) -> Option<Self> {
        kind.suggestion().map(|s| Self {
            kind,
            suggestion: s.to_string(),
        })
    }

    /// Help link offered for connectivity problems
    pub fn help_url(&self) -> Option<&'static str> {
        match self.kind {
            ErrorKind::Connection => Some(messages::CONNECTION_HELP_URL),
            _ => None,
        }
    }
}

/// One page of a decoded document.
///
/// All refs from one fetch share the same document handle, which stays alive
/// for as long as any of them does.
#[derive(Clone)]
pub struct PageRef {
    pub document: Arc<dyn DecodedDocument>,
    /// 1-based
    pub page_number: usize,
}

impl fmt::Debug for PageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageRef")
            .field("page_number", &self.page_number)
            .field("page_count", &self.document.page_count())
            .finish()
    }
}

/// Enumerate every page of a document in order
pub fn enumerate_pages(document: &Arc<dyn DecodedDocument>) -> Vec<PageRef> {
    (1..=document.page_count())
        .map(|page_number| PageRef {
            document: Arc::clone(document),
            page_number,
        })
        .collect()
}

/// Where a session currently stands
#[derive(Debug, Clone)]
pub enum SessionState {
    Validating { progress: u8 },
    Valid { pages: Vec<PageRef> },
    Invalid { message: String, detail: Option<ErrorDetail> },
}

impl SessionState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Validating { .. })
    }
}

/// What the presentation shell observes
#[derive(Debug, Clone)]
pub struct ViewerSnapshot {
    pub state: SessionState,
    pub progress: u8,
}

impl ViewerSnapshot {
    /// Fresh session, nothing done yet
    pub fn validating() -> Self {
        Self {
            state: SessionState::Validating { progress: 0 },
            progress: 0,
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self.state, SessionState::Valid { .. })
    }

    pub fn pages(&self) -> &[PageRef] {
        match &self.state {
            SessionState::Valid { pages } => pages,
            _ => &[],
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match &self.state {
            SessionState::Invalid { message, .. } => Some(message),
            _ => None,
        }
    }

    pub fn error_detail(&self) -> Option<&ErrorDetail> {
        match &self.state {
            SessionState::Invalid { detail, .. } => detail.as_ref(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_validation() {
        assert!(VerificationCode::parse(Some("demo123")).is_ok());
        assert!(VerificationCode::parse(Some("  demo123 ")).is_ok());
        assert!(matches!(VerificationCode::parse(Some("")), Err(Error::InvalidCode)));
        assert!(matches!(VerificationCode::parse(Some(" \t\n")), Err(Error::InvalidCode)));
        assert!(matches!(VerificationCode::parse(None), Err(Error::InvalidCode)));
    }

    #[test]
    fn test_code_kept_verbatim() {
        let code = VerificationCode::parse(Some(" abc ")).unwrap();
        assert_eq!(code.as_str(), " abc ");
    }

    #[test]
    fn test_kind_table() {
        assert_eq!(ErrorKind::Timeout.message(), messages::TIMEOUT);
        assert_eq!(ErrorKind::Cors.suggestion(), Some(messages::CORS_HINT));
        assert_eq!(ErrorKind::Generic.suggestion(), None);
        assert!(ErrorDetail::for_kind(ErrorKind::Generic).is_none());
    }

    #[test]
    fn test_help_url_only_for_connection() {
        let conn = ErrorDetail::for_kind(ErrorKind::Connection).unwrap();
        assert!(conn.help_url().is_some());
        let sec = ErrorDetail::for_kind(ErrorKind::Security).unwrap();
        assert!(sec.help_url().is_none());
    }

    #[test]
    fn test_snapshot_accessors() {
        let snapshot = ViewerSnapshot::validating();
        assert!(!snapshot.is_valid());
        assert!(snapshot.pages().is_empty());
        assert!(snapshot.error_message().is_none());

        let snapshot = ViewerSnapshot {
            state: SessionState::Invalid {
                message: "boom".into(),
                detail: ErrorDetail::for_kind(ErrorKind::Timeout),
            },
            progress: 20,
        };
        assert!(snapshot.state.is_terminal());
        assert_eq!(snapshot.error_message(), Some("boom"));
        assert_eq!(snapshot.error_detail().unwrap().kind, ErrorKind::Timeout);
    }
}
