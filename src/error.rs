//! Error types for the gallery index

use thiserror::Error;

/// Result type alias for gallery index operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the gallery index
///
/// Contract violations (missing column, unrecognized kind, empty predicate)
/// indicate a code/schema mismatch and are never retried. Index failures are
/// transient: live streams keep the previous snapshot and wait for the next
/// change notification.
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Row is missing required column '{column}'")]
    MissingColumn { column: String },

    #[error("Unrecognized media kind code {code} (expected 1 = image or 3 = video)")]
    UnrecognizedKind { code: i64 },

    #[error("Column '{column}' holds {found}, expected {expected}")]
    ColumnType {
        column: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("Predicate combinator requires at least one term")]
    EmptyPredicate,

    #[error("Timestamp {seconds}s does not fit in millisecond precision")]
    TimestampRange { seconds: i64 },

    #[error("Content index query failed: {message}")]
    Index { message: String },

    #[error("Geocoder lookup failed: {message}")]
    Geocode { message: String },

    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Whether a live stream may recover by simply re-running the query later
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::Index { .. } | Error::Io(_))
    }
}
