//! Error types for the router.

use axum::http::StatusCode;
use thiserror::Error;

use crate::auth::AuthError;
use crate::routing::pattern::PatternError;

/// Main error type for routing, handlers and response writing.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed route pattern, raised at registration time.
    #[error("invalid route pattern: {0}")]
    Pattern(#[from] PatternError),

    /// Request body could not be decoded for its declared content type.
    #[error("body parse error: {0}")]
    BodyParse(#[from] BodyParseError),

    /// A write was attempted after the response was already sent.
    #[error("response already sent")]
    ResponseAlreadySent,

    /// Header name or value rejected by the HTTP layer.
    #[error("invalid header {0:?}")]
    InvalidHeader(String),

    /// Response body could not be serialized to JSON.
    #[error("JSON encode error: {0}")]
    Json(#[from] serde_json::Error),

    /// Response body could not be serialized to XML.
    #[error("XML encode error: {0}")]
    Xml(#[from] quick_xml::SeError),

    /// Authentication failure surfaced to a handler.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Request could not be assembled (test entry point).
    #[error("HTTP error: {0}")]
    Http(#[from] axum::http::Error),

    /// Free-form handler failure.
    #[error("{0}")]
    Handler(String),
}

impl Error {
    /// Build a handler error from any displayable value.
    pub fn handler(msg: impl std::fmt::Display) -> Self {
        Error::Handler(msg.to_string())
    }

    /// Status used when this error escapes a handler before anything was sent.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::BodyParse(_) => StatusCode::BAD_REQUEST,
            Error::Auth(AuthError::MissingCredential) => StatusCode::BAD_REQUEST,
            Error::Auth(AuthError::MissingKey) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Auth(_) => StatusCode::UNAUTHORIZED,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Failure to decode a request body.
#[derive(Debug, Error)]
pub enum BodyParseError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid XML: {0}")]
    Xml(#[from] quick_xml::de::DeError),

    #[error("unsupported content type {0:?}")]
    UnsupportedContentType(String),
}

/// Result type alias using the router [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
