//! Error types for the book search client.
//!
//! # Design
//! Variants carry plain `String` payloads instead of wrapping the underlying
//! library errors, so an `ApiError` is `Clone` and can be stored inside a
//! delivered `LoadOutcome` or flattened into a C error code. Non-200 responses
//! keep the raw status and body for debugging.

use thiserror::Error;

/// Errors produced while building, executing or parsing a search.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApiError {
    /// The query was empty after trimming whitespace.
    #[error("search query is empty")]
    EmptyQuery,

    /// The composed request URL did not pass URL validation.
    #[error("invalid request URL: {0}")]
    InvalidUrl(String),

    /// The request never produced a response (connect failure, timeout, DNS).
    #[error("transport failed: {0}")]
    Transport(String),

    /// The server answered with something other than 200.
    #[error("HTTP {status}: {body}")]
    HttpError { status: u16, body: String },

    /// The response body could not be decoded into the expected shape.
    #[error("deserialization failed: {0}")]
    DeserializationError(String),

    /// Cover bytes could not be decoded into an image.
    #[error("image decode failed: {0}")]
    Image(String),

    /// A configuration value could not be interpreted.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The load was superseded by a newer one or the loader was reset.
    #[error("load cancelled")]
    Cancelled,

    /// A background worker panicked or was torn down.
    #[error("background worker failed: {0}")]
    Worker(String),
}
