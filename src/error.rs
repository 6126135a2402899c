//! Error types for cord2ner.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for cord2ner operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for cord2ner operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// An annotation file is not valid JSON or lacks a required key.
    #[error("Malformed annotation {}: {reason}", path.display())]
    MalformedAnnotation { path: PathBuf, reason: String },

    /// The image of an annotation exists under neither root.
    #[error("Image not found under any root: {}", path.display())]
    UnresolvableImagePath { path: PathBuf },

    /// A tag outside the CORD vocabulary reached the registration layer.
    #[error("Unknown tag: {0}")]
    UnknownTag(String),

    /// The download provider did not hand back a usable root set.
    #[error("Invalid roots: {0}")]
    InvalidRoots(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error while exporting.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Create a malformed annotation error.
    pub fn malformed(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Error::MalformedAnnotation {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Create an invalid roots error.
    pub fn invalid_roots(msg: impl Into<String>) -> Self {
        Error::InvalidRoots(msg.into())
    }
}
