//! # Error Hierarchy
//!
//! Structured error types for the codec, built with `thiserror`.
//! No `Box<dyn Error>`, no `.unwrap()` outside tests.
//!
//! Every failure of decode or encode is an explicit [`Error`] value returned
//! to the immediate caller. The variants mirror the failure taxonomy of the
//! codec: syntax, tag payloads, alias cycles, unsupported host values,
//! marshal hook failures, and file access.

use thiserror::Error;

/// Result alias used throughout the codec.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type for decoding and encoding documents.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// The document text is not well-formed YAML.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// A recognized tag carried a payload that cannot be decoded
    /// (bad base64, impossible calendar date, unparsable type string).
    #[error("{0}")]
    Decode(String),

    /// An alias chain resolves back to a node that is still being decoded.
    #[error("{0}")]
    Cycle(String),

    /// The encoder found no dispatch path for a host value.
    #[error("{0}")]
    UnsupportedType(String),

    /// A marshal hook returned an error or panicked.
    #[error("{0}")]
    Encode(String),

    /// A file could not be read.
    #[error("open {path}: {reason}")]
    File {
        /// The path that was requested.
        path: String,
        /// Why the read failed.
        reason: String,
    },
}

impl Error {
    /// Build a [`Error::File`] from an I/O failure.
    ///
    /// A missing file is reported as "no such file or directory" so that
    /// callers can tell it apart from a decode failure of an existing file.
    pub fn file(path: impl Into<String>, err: &std::io::Error) -> Self {
        let reason = match err.kind() {
            std::io::ErrorKind::NotFound => "no such file or directory".to_string(),
            _ => err.to_string(),
        };
        Error::File {
            path: path.into(),
            reason,
        }
    }
}

/// A syntax error with the 1-based position where it was detected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("yaml: line {line}, column {column}: {message}")]
pub struct ParseError {
    /// Human-readable description, e.g. "did not find expected key".
    pub message: String,
    /// 1-based line number.
    pub line: usize,
    /// 1-based column number.
    pub column: usize,
}

impl ParseError {
    /// Create a parse error at the given position.
    pub fn new(message: impl Into<String>, line: usize, column: usize) -> Self {
        Self {
            message: message.into(),
            line,
            column,
        }
    }
}

/// Error returned by a host [`Marshaler`](crate::Marshaler) hook.
///
/// Hooks may also panic with a `MarshalError` payload; the extension
/// boundary recovers the message either way.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct MarshalError {
    message: String,
}

impl MarshalError {
    /// Create a marshal error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The message carried by this error.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<&str> for MarshalError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl From<String> for MarshalError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}
