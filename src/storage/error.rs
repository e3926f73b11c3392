//! Errors surfaced by the string store.
//!
//! Every store operation validates its inputs and the stored value before it
//! mutates anything, so an `Err` always means the store was left untouched.

use thiserror::Error;

/// Errors returned by [`StringStore`](crate::storage::StringStore) operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The stored bytes are not text, so they cannot be read as a number.
    #[error("value is not valid UTF-8 text and cannot be used as a number")]
    TypeMismatch,

    /// The stored (or supplied) text is not a base-10 signed 64-bit integer.
    #[error("value is not an integer or out of range")]
    NotAnInteger,

    /// The stored (or supplied) text is not a finite decimal float.
    #[error("value is not a valid float")]
    NotAFloat,

    /// Integer arithmetic left the signed 64-bit range.
    #[error("increment or decrement would overflow")]
    OutOfRange,

    /// A float increment produced NaN or an infinity.
    #[error("increment would produce NaN or Infinity")]
    NanOrInfinity,

    /// The value would grow past [`MAX_VALUE_SIZE`](crate::storage::MAX_VALUE_SIZE).
    #[error("string exceeds maximum allowed size (proto-max-bulk-len)")]
    ValueTooLarge,

    /// Malformed arguments: conflicting options, a bad bit, a negative offset.
    #[error("{0}")]
    InvalidArgument(String),
}

impl StoreError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        StoreError::InvalidArgument(msg.into())
    }
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
