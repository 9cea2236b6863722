//! Error types for reading set-file documents.
//!
//! Problems come in two tiers. [`Warning`]s are recoverable: they accumulate
//! on the reader while the read continues with a substituted value.
//! [`ParseError`]s are fatal: they abort the whole read, and the partially
//! populated object graph must be treated as invalid.

use std::fmt;

use thiserror::Error;

/// Result type for document reading operations.
pub type Result<T> = std::result::Result<T, ParseError>;

/// A non-fatal diagnostic recorded while reading a document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Warning {
    /// One-based line number the message refers to.
    pub line: u64,
    /// Human-readable description of the problem.
    pub message: String,
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "on line {}: {}", self.line, self.message)
    }
}

/// Fatal error raised while reading a document.
#[derive(Error, Debug)]
pub enum ParseError {
    /// The underlying byte stream failed.
    #[error("error reading input: {0}")]
    Io(#[from] std::io::Error),

    /// A line contained bytes that are not valid UTF-8.
    #[error("invalid UTF-8 sequence on line {0}")]
    InvalidUtf8(u64),

    /// A date-time field did not parse completely.
    #[error("expected a date and time instead of '{0}'")]
    ExpectedDateTime(String),

    /// A point field did not match the `(x,y)` form.
    #[error("expected (x,y) instead of '{0}'")]
    ExpectedPoint(String),

    /// An enumerated value matched none of the offered candidates, under the
    /// strict decoding policy.
    #[error("unrecognized value '{read}', expected e.g. '{expected}'")]
    UnrecognizedValue { read: String, expected: String },

    /// A bug in the calling code, not in the document.
    #[error("internal error: {0}")]
    Internal(String),
}
