//! Runtime error types
//!
//! Three of the runtime's four failure classes get a type here:
//! configuration errors fail fast at registration ([`BindError`]),
//! navigation errors travel through the navigate callback ([`NavError`]),
//! and handler errors are isolated per callback ([`HandlerError`]).
//! Resource-load errors are best-effort and only reach the diagnostics
//! sink.

use skiff_css::SelectorError;
use skiff_html::ParseError;

/// Registration-time configuration error; `bind` and spec building fail
/// fast on these
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BindError {
    #[error("invalid selector: {0}")]
    Selector(#[from] SelectorError),
    #[error("malformed event key `{0}`")]
    EventKey(String),
    #[error("invalid delegation selector in `{key}`: {source}")]
    DelegationSelector {
        key: String,
        source: SelectorError,
    },
}

/// Navigation failure; the live document is untouched when one of these
/// is reported
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NavError {
    #[error("invalid url `{url}`: {source}")]
    Url {
        url: String,
        source: url::ParseError,
    },
    #[error("request failed: {0}")]
    Request(String),
    #[error("http status {0}")]
    HttpStatus(u16),
    #[error("unparseable document: {0}")]
    Parse(#[from] ParseError),
}

/// Failure inside a controller callback; logged and recorded, never
/// allowed to abort sibling work
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct HandlerError {
    pub message: String,
}

impl HandlerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<String> for HandlerError {
    fn from(message: String) -> Self {
        Self { message }
    }
}

impl From<&str> for HandlerError {
    fn from(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}
