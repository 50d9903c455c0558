//! Error types for the strata domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.
//!
//! Errors fall into two families. Expected outcomes (`NotFound`, `Conflict`)
//! are ordinary results a caller is meant to branch on. Precondition
//! violations (`Locked`, `InvalidCycle`, `MissingRoot`, ...) point at a caller
//! or configuration bug. [`Error::is_expected`] tells them apart.

use thiserror::Error;

/// The top-level error type for all strata operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Layer registry errors ---
    #[error("Layer error: {0}")]
    Layer(#[from] LayerError),

    // --- Context tree errors ---
    #[error("Tree error: {0}")]
    Tree(#[from] TreeError),

    // --- Backing store errors ---
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification of an [`Error`], stable across variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    Conflict,
    Locked,
    InvalidCycle,
    MissingRoot,
    Reserved,
    InvalidInput,
    Storage,
}

impl Error {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Layer(e) => match e {
                LayerError::NotFound(_) => ErrorKind::NotFound,
                LayerError::Conflict(_) => ErrorKind::Conflict,
                LayerError::Locked(_) => ErrorKind::Locked,
                LayerError::Reserved(_) => ErrorKind::Reserved,
                LayerError::InvalidName { .. } => ErrorKind::InvalidInput,
            },
            Error::Tree(e) => match e {
                TreeError::PathNotFound(_) | TreeError::LayerNotFound { .. } => {
                    ErrorKind::NotFound
                }
                TreeError::ReservedSegment { .. } | TreeError::RootImmutable(_) => {
                    ErrorKind::Reserved
                }
                TreeError::InvalidCycle { .. } => ErrorKind::InvalidCycle,
                TreeError::MissingRoot => ErrorKind::MissingRoot,
                TreeError::CorruptIndex(_) => ErrorKind::Storage,
            },
            Error::Store(_) | Error::Serialization(_) => ErrorKind::Storage,
            Error::Config { .. } => ErrorKind::InvalidInput,
        }
    }

    /// True for outcomes a caller should handle as a normal result
    /// (something was not there, or a name was already taken).
    pub fn is_expected(&self) -> bool {
        matches!(self.kind(), ErrorKind::NotFound | ErrorKind::Conflict)
    }

    /// Stable machine-readable code for API responses.
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::Layer(LayerError::NotFound(_)) => "LAYER_NOT_FOUND",
            Error::Layer(LayerError::Conflict(_)) => "LAYER_CONFLICT",
            Error::Layer(LayerError::Locked(_)) => "LAYER_LOCKED",
            Error::Layer(LayerError::Reserved(_)) => "LAYER_RESERVED",
            Error::Layer(LayerError::InvalidName { .. }) => "INVALID_LAYER_NAME",
            Error::Tree(TreeError::PathNotFound(_)) => "PATH_NOT_FOUND",
            Error::Tree(TreeError::LayerNotFound { .. }) => "PATH_LAYER_NOT_FOUND",
            Error::Tree(TreeError::ReservedSegment { .. }) => "RESERVED_SEGMENT",
            Error::Tree(TreeError::InvalidCycle { .. }) => "INVALID_CYCLE",
            Error::Tree(TreeError::MissingRoot) => "MISSING_ROOT",
            Error::Tree(TreeError::RootImmutable(_)) => "ROOT_IMMUTABLE",
            Error::Tree(TreeError::CorruptIndex(_)) => "CORRUPT_INDEX",
            Error::Store(_) => "STORE_ERROR",
            Error::Config { .. } => "CONFIG_ERROR",
            Error::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }
}

// --- Bounded context errors ---

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayerError {
    #[error("Layer not found: {0}")]
    NotFound(String),

    #[error("Layer name already in use: {0}")]
    Conflict(String),

    #[error("Layer is locked: {0}")]
    Locked(String),

    #[error("Layer is built-in and can not be modified: {0}")]
    Reserved(String),

    #[error("Invalid layer name \"{name}\": {reason}")]
    InvalidName { name: String, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    #[error("Path not found: {0}")]
    PathNotFound(String),

    #[error("Layer \"{segment}\" not found at path \"{path}\"")]
    LayerNotFound { segment: String, path: String },

    #[error("Layer \"{segment}\" is internal and can not be used in path \"{path}\"")]
    ReservedSegment { segment: String, path: String },

    #[error("Destination path \"{to}\" includes layer \"{layer}\" moved from \"{from}\"")]
    InvalidCycle {
        from: String,
        to: String,
        layer: String,
    },

    #[error("Root layer not found in the layer index")]
    MissingRoot,

    #[error("The root node can not be changed: {0}")]
    RootImmutable(String),

    #[error("Persisted tree index is corrupt: {0}")]
    CorruptIndex(String),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization failed: {0}")]
    Serialization(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_is_expected() {
        let err = Error::Layer(LayerError::Conflict("docs".into()));
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert!(err.is_expected());
        assert_eq!(err.error_code(), "LAYER_CONFLICT");
    }

    #[test]
    fn locked_is_a_precondition_violation() {
        let err = Error::Layer(LayerError::Locked("projects".into()));
        assert_eq!(err.kind(), ErrorKind::Locked);
        assert!(!err.is_expected());
    }

    #[test]
    fn cycle_error_displays_paths() {
        let err = Error::Tree(TreeError::InvalidCycle {
            from: "/a/b".into(),
            to: "/a/b/c".into(),
            layer: "b".into(),
        });
        let msg = err.to_string();
        assert!(msg.contains("/a/b/c"));
        assert!(msg.contains("\"b\""));
        assert_eq!(err.kind(), ErrorKind::InvalidCycle);
    }

    #[test]
    fn missing_path_layer_is_not_found() {
        let err = Error::from(TreeError::LayerNotFound {
            segment: "alpha".into(),
            path: "/projects/alpha".into(),
        });
        assert!(err.is_expected());
        assert_eq!(err.error_code(), "PATH_LAYER_NOT_FOUND");
    }
}
