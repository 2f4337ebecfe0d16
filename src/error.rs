//! Error types for the tracking engine.

use thiserror::Error;

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors surfaced by the engine's public operations.
///
/// The engine performs no automatic retries; the host decides whether to
/// try again on the next change event.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The backing store could not be read or written. A change that hits
    /// this is not silently dropped: the baseline is left where it was, so
    /// the next attempt diffs against the same prior content.
    #[error("timestamp store unavailable: {0}")]
    StorageUnavailable(#[from] std::io::Error),

    /// Persisted data did not parse as a snapshot. Fails the operation the
    /// same way `StorageUnavailable` does; the file on disk is never
    /// replaced with an empty store.
    #[error("timestamp store is not readable as a snapshot: {0}")]
    Deserialization(#[from] serde_json::Error),

    /// An edit script did not tile the old and new line ranges. Fatal to
    /// the single `record_change` call that detected it; the persisted
    /// snapshot is untouched since writes only happen after a fully
    /// computed replacement.
    #[error("malformed edit script: {0}")]
    MalformedEditScript(String),

    /// The content source could not produce the document's current text.
    #[error("no content available for document '{0}'")]
    ContentUnavailable(String),
}
