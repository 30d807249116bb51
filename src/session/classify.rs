//! Failure classification
//!
//! Turns any session failure into the single `(message, detail)` pair the
//! user sees. Transport errors are classified from their structured flags
//! where reqwest provides them; otherwise an ordered, case-insensitive
//! substring table is matched against the error text. The table is a
//! best-effort heuristic and makes no claim to be exhaustive.

use std::error::Error as StdError;

use crate::error::Error;
use crate::messages;

use super::{ErrorDetail, ErrorKind};

/// Substring signatures, first match wins
const SIGNATURES: &[(ErrorKind, &[&str])] = &[
    (
        ErrorKind::Connection,
        &[
            "failed to fetch",
            "networkerror",
            "network request failed",
            "connection refused",
            "connection reset",
            "dns error",
        ],
    ),
    (ErrorKind::Security, &["certificate", "ssl", "https", "tls"]),
    (ErrorKind::Timeout, &["timeout", "timed out"]),
    (ErrorKind::Cors, &["cors", "cross-origin"]),
];

/// Classify free text against the signature table
pub fn classify_message(text: &str) -> ErrorKind {
    let lower = text.to_lowercase();
    SIGNATURES
        .iter()
        .find(|(_, needles)| needles.iter().any(|n| lower.contains(n)))
        .map(|(kind, _)| *kind)
        .unwrap_or(ErrorKind::Generic)
}

/// Classify a reqwest failure, preferring its structured flags
pub fn classify_transport(err: &reqwest::Error) -> ErrorKind {
    if err.is_timeout() {
        return ErrorKind::Timeout;
    }

    let text = transport_text(err);
    if err.is_connect() {
        // TLS handshake failures surface as connect errors too
        return match classify_message(&text) {
            ErrorKind::Security => ErrorKind::Security,
            _ => ErrorKind::Connection,
        };
    }

    classify_message(&text)
}

/// Error text including its source chain, with the request URL removed so
/// that an `https://` endpoint cannot masquerade as a security failure.
pub fn transport_text(err: &reqwest::Error) -> String {
    let mut text = error_chain(err);
    if let Some(url) = err.url() {
        text = text.replace(url.as_str(), "");
    }
    text
}

fn error_chain(err: &dyn StdError) -> String {
    let mut parts = vec![err.to_string()];
    let mut source = err.source();
    while let Some(inner) = source {
        parts.push(inner.to_string());
        source = inner.source();
    }
    parts.join(": ")
}

/// Map a failure to the message and optional detail shown to the user.
///
/// `Cancelled` never reaches here; the controller drops it first.
pub fn describe(err: &Error) -> (String, Option<ErrorDetail>) {
    match err {
        Error::InvalidCode => (messages::INVALID_CODE.to_string(), None),
        Error::Network { kind, .. } => (kind.message().to_string(), ErrorDetail::for_kind(*kind)),
        Error::Server { status, message } => (describe_status(*status, message.as_deref()), None),
        Error::WrongContentType(_) => (messages::NOT_A_DOCUMENT.to_string(), None),
        Error::EmptyBody => (messages::EMPTY_DOCUMENT.to_string(), None),
        Error::Decode(_) => (messages::CORRUPT_DOCUMENT.to_string(), None),
        Error::NoPages => (messages::NO_PAGES.to_string(), None),
        other => {
            let kind = classify_message(&other.to_string());
            (kind.message().to_string(), ErrorDetail::for_kind(kind))
        }
    }
}

fn describe_status(status: u16, body: Option<&str>) -> String {
    match status {
        404 => messages::NOT_FOUND.to_string(),
        403 => messages::FORBIDDEN.to_string(),
        s if s >= 500 => messages::SERVER_ERROR.to_string(),
        s => match body.map(str::trim) {
            Some(text) if !text.is_empty() => text.to_string(),
            _ => messages::status_error(s),
        },
    }
}
