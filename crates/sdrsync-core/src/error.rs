//! Error types for sdrsync.
//!
//! All fallible operations across the workspace return [`Result<T>`], which
//! uses [`Error`] as the error type. Transport failures, malformed bodies,
//! schema mismatches, and server-side rejections are all captured here.

use std::fmt;

/// The error type for all sdrsync operations.
///
/// Variants follow the failure modes of a read-modify-write exchange with
/// an SDR control server: the request never completes, the response cannot
/// be decoded, the addressed device does not exist, the document does not
/// have the expected shape, or the server refuses the new value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// A network-level failure (connection refused, reset, DNS, HTTP 5xx).
    #[error("transport error: {0}")]
    Transport(String),

    /// Timed out waiting for the server to answer.
    #[error("timeout waiting for response")]
    Timeout,

    /// The response body is not well-formed JSON.
    #[error("parse error: {0}")]
    Parse(String),

    /// The addressed device set or channel does not exist on the server.
    #[error("not found: {0}")]
    NotFound(String),

    /// The document does not carry the expected field for its device type.
    ///
    /// Never papered over with a default value: a fabricated zero would
    /// retune live hardware.
    #[error("schema error: {device_type}: cannot locate {field}")]
    Schema {
        /// Device type or channel kind the lookup was performed for.
        device_type: String,
        /// The field (or JSON pointer) that could not be resolved.
        field: String,
    },

    /// The server validated and refused a written value.
    #[error("rejected by server: {0}")]
    Rejected(String),

    /// An invalid parameter was supplied (bad URL, unknown hint, overflow).
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

impl Error {
    /// Shorthand for building an [`Error::Schema`].
    pub fn schema(device_type: impl Into<String>, field: impl Into<String>) -> Self {
        Error::Schema {
            device_type: device_type.into(),
            field: field.into(),
        }
    }

    /// Classify this error for log lines and failure accounting.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Transport(_) | Error::Timeout => ErrorKind::Transport,
            Error::Parse(_) => ErrorKind::Parse,
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::Schema { .. } => ErrorKind::Schema,
            Error::Rejected(_) => ErrorKind::Rejected,
            Error::InvalidParameter(_) => ErrorKind::InvalidParameter,
        }
    }
}

/// Coarse failure class of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Transport,
    Parse,
    NotFound,
    Schema,
    Rejected,
    InvalidParameter,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::Transport => "TransportError",
            ErrorKind::Parse => "ParseError",
            ErrorKind::NotFound => "NotFoundError",
            ErrorKind::Schema => "SchemaError",
            ErrorKind::Rejected => "RejectedError",
            ErrorKind::InvalidParameter => "InvalidParameter",
        };
        write!(f, "{s}")
    }
}

/// A convenience `Result` alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;
