//! Error types for neural field networks.

use thiserror::Error;

/// Errors raised while building, initializing or stepping a network.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// The predecessor graph contains a cycle through the named layer.
    #[error("cycle detected through layer '{0}'")]
    CycleDetected(String),

    /// A layer has the wrong number of predecessors for its kind.
    #[error("layer '{layer}' expects {expected} predecessor(s), got {actual}")]
    InvalidArity {
        layer: String,
        expected: String,
        actual: usize,
    },

    /// `step` was called before a successful `init`.
    #[error("network is not initialized")]
    NotInitialized,

    /// A workspace was asked to convolve before its kernel spectrum was
    /// recomputed.
    #[error("kernel transform is stale")]
    StaleKernelTransform,

    #[error("unknown layer '{0}'")]
    UnknownLayer(String),

    #[error("a layer named '{0}' already exists")]
    DuplicateLayer(String),

    #[error("unknown function '{0}'")]
    UnknownFunction(String),

    #[error("invalid shape: {0}")]
    InvalidShape(String),

    /// A predecessor or stimulus does not match the layer's shape.
    #[error("shape mismatch on layer '{layer}': expected {expected}, got {actual}")]
    ShapeMismatch {
        layer: String,
        expected: String,
        actual: String,
    },

    #[error("invalid parameters for layer '{layer}': {reason}")]
    InvalidParameters { layer: String, reason: String },

    #[error("layer '{0}' is not an input")]
    NotAnInput(String),

    /// Only buffered layers may feed a delayed connection.
    #[error("layer '{0}' is not buffered and cannot feed a delayed connection")]
    NotBuffered(String),
}

pub type Result<T> = std::result::Result<T, Error>;
