//! Error types for the certificate verification library

use thiserror::Error;

use crate::session::ErrorKind;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the certificate verification library
#[derive(Error, Debug)]
pub enum Error {
    /// Verification code missing or blank after trimming
    #[error("No verification code was provided")]
    InvalidCode,

    /// Transport-level failure (connectivity, TLS, timeout, cross-origin)
    #[error("Network error ({kind:?}): {message}")]
    Network {
        /// Classified failure kind
        kind: ErrorKind,
        /// Underlying transport message
        message: String,
    },

    /// Backend answered with a non-2xx status
    #[error("Server returned status {status}")]
    Server {
        /// HTTP status code
        status: u16,
        /// Response body text, if any
        message: Option<String>,
    },

    /// Response does not declare the expected document media type
    #[error("Unexpected content type: {}", .0.as_deref().unwrap_or("<none>"))]
    WrongContentType(Option<String>),

    /// Response body was empty
    #[error("Server returned an empty document")]
    EmptyBody,

    /// Body could not be decoded as a document
    #[error("Document could not be decoded: {0}")]
    Decode(String),

    /// Decoded document has no pages
    #[error("Document has no pages")]
    NoPages,

    /// Session was superseded, torn down or otherwise aborted on purpose
    #[error("Operation cancelled")]
    Cancelled,

    /// PDF processing error
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Font error
    #[error("Font error: {0}")]
    Font(String),

    /// Rasterisation or drawing error
    #[error("Render error: {0}")]
    Render(String),

    /// Invalid configuration value
    #[error("Configuration error: {0}")]
    Config(String),

    /// General error
    #[error("{0}")]
    General(String),
}

impl Error {
    /// True for the intentionally aborted path, which is never shown to the user.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancelled_detection() {
        assert!(Error::Cancelled.is_cancelled());
        assert!(!Error::EmptyBody.is_cancelled());
        assert!(!Error::Network {
            kind: ErrorKind::Timeout,
            message: "timed out".into(),
        }
        .is_cancelled());
    }

    #[test]
    fn test_content_type_display() {
        assert_eq!(
            Error::WrongContentType(Some("text/html".into())).to_string(),
            "Unexpected content type: text/html"
        );
        assert_eq!(
            Error::WrongContentType(None).to_string(),
            "Unexpected content type: <none>"
        );
    }
}
