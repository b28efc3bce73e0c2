//! Custom error types for the attack tree builder.
//!
//! Every stage of the pipeline reports through `AttackTreeError`, so the
//! caller decides whether to abort. Nothing is written to disk once an
//! error has been raised.

use std::path::PathBuf;

use crate::models::ThreatId;

/// The main error type for attack tree operations.
#[derive(Debug, thiserror::Error)]
pub enum AttackTreeError {
    /// I/O error (missing catalog, unwritable output, etc.)
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: Option<PathBuf>,
        #[source]
        source: std::io::Error,
    },

    /// The catalog is not valid JSON or does not match the threat shape
    #[error("Invalid threat catalog {path:?}: {source}")]
    Json {
        path: Option<PathBuf>,
        #[source]
        source: serde_json::Error,
    },

    /// A threat carries neither children nor leaf data
    #[error("Malformed threat node {id}: {reason}")]
    MalformedNode { id: ThreatId, reason: String },

    /// Root id/category mismatch or duplicated threat ids
    #[error("Invariant violated: {0}")]
    InvariantViolation(String),

    /// Aggregating over zero threats has no defined mean
    #[error("Cannot aggregate an empty set of threats")]
    EmptyChildren,

    /// Nesting deeper than root -> branch -> leaf
    #[error("Threat {id} nests deeper than two levels below the root")]
    UnsupportedDepth { id: ThreatId },

    /// A configuration value outside its supported range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Graph or layout inconsistency while drawing
    #[error("Render error: {0}")]
    Render(String),
}

/// Result type alias using AttackTreeError
pub type AttackTreeResult<T> = Result<T, AttackTreeError>;

impl AttackTreeError {
    /// Create an I/O error with path context
    pub fn io(source: std::io::Error, path: impl Into<Option<PathBuf>>) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a JSON error with path context
    pub fn json(source: serde_json::Error, path: impl Into<Option<PathBuf>>) -> Self {
        Self::Json {
            path: path.into(),
            source,
        }
    }

    /// Create a malformed node error
    pub fn malformed(id: ThreatId, reason: impl Into<String>) -> Self {
        Self::MalformedNode {
            id,
            reason: reason.into(),
        }
    }
}

/// Convert from raw I/O errors (without path context)
impl From<std::io::Error> for AttackTreeError {
    fn from(source: std::io::Error) -> Self {
        Self::Io { path: None, source }
    }
}

/// Convert from raw JSON errors (without path context)
impl From<serde_json::Error> for AttackTreeError {
    fn from(source: serde_json::Error) -> Self {
        Self::Json { path: None, source }
    }
}
