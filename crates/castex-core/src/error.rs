//! Error types for castex.
//!
//! A single error type with explicit variants for transport, protocol,
//! input validation and upload failures. A failed feed page is not an
//! error at this level: the fetcher folds it into a truncated outcome.

use std::fmt;
use thiserror::Error;

/// The unified error type for castex operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Network transport errors (DNS, TLS, connection, timeout).
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Non-success responses from the feed API.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Input validation errors (subject id, format, keys, URLs).
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InvalidInputError),

    /// Storage write failed.
    #[error("upload failed: {0}")]
    Upload(#[from] UploadError),

    /// Payload could not be serialized or a response could not be decoded.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Pagination stopped early and the caller asked for complete exports only.
    #[error("export truncated after {fetched} records: {reason}")]
    Truncated { fetched: usize, reason: String },
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

/// Transport-level errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Network connection failed.
    #[error("connection failed: {message}")]
    Connection { message: String },

    /// Request timed out.
    #[error("request timed out")]
    Timeout,

    /// Generic HTTP error.
    #[error("HTTP error: {message}")]
    Http { message: String },
}

/// A non-success response from the feed API.
#[derive(Debug)]
pub struct ProtocolError {
    /// HTTP status code.
    pub status: u16,
    /// Upstream error code (if present).
    pub code: Option<String>,
    /// Error message from the server.
    pub message: Option<String>,
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HTTP {}", self.status)?;
        if let Some(ref code) = self.code {
            write!(f, " [{}]", code)?;
        }
        if let Some(ref message) = self.message {
            write!(f, ": {}", message)?;
        }
        Ok(())
    }
}

impl std::error::Error for ProtocolError {}

impl ProtocolError {
    /// Create a new protocol error.
    pub fn new(status: u16, code: Option<String>, message: Option<String>) -> Self {
        Self {
            status,
            code,
            message,
        }
    }

    /// Rate limiting or a server-side fault; worth another attempt.
    pub fn is_retryable(&self) -> bool {
        self.status == 429 || self.status >= 500
    }
}

/// Input validation errors.
#[derive(Debug, Error)]
pub enum InvalidInputError {
    /// Invalid subject identifier.
    #[error("invalid fid '{value}': {reason}")]
    Fid { value: String, reason: String },

    /// Unsupported export format.
    #[error("unsupported export format '{value}' (expected json or csv)")]
    Format { value: String },

    /// Invalid storage key.
    #[error("invalid object key '{value}': {reason}")]
    ObjectKey { value: String, reason: String },

    /// Invalid base URL.
    #[error("invalid URL '{value}': {reason}")]
    Url { value: String, reason: String },

    /// Upstream record did not have the expected shape.
    #[error("invalid record: {reason}")]
    Record { reason: String },

    /// Generic invalid input.
    #[error("invalid input: {message}")]
    Other { message: String },
}

/// Storage write failures.
#[derive(Debug, Error)]
pub enum UploadError {
    /// An object already exists under the key.
    #[error("object '{key}' already exists")]
    AlreadyExists { key: String },

    /// The store answered with a non-success status.
    #[error("store rejected upload with HTTP {status}{}", fmt_detail(.code, .message))]
    Rejected {
        status: u16,
        code: Option<String>,
        message: Option<String>,
    },

    /// The store could not be reached.
    #[error("transport: {0}")]
    Transport(TransportError),

    /// Local filesystem failure.
    #[error("IO error: {message}")]
    Io { message: String },
}

fn fmt_detail(code: &Option<String>, message: &Option<String>) -> String {
    match (code, message) {
        (Some(code), Some(message)) => format!(" [{}]: {}", code, message),
        (Some(code), None) => format!(" [{}]", code),
        (None, Some(message)) => format!(": {}", message),
        (None, None) => String::new(),
    }
}

impl Error {
    /// True for failures of a single feed request that another attempt may fix.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Transport(_) => true,
            Error::Protocol(e) => e.is_retryable(),
            _ => false,
        }
    }
}
