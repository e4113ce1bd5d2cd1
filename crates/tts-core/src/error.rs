//! Unified error types for the TTS pipeline.

use std::path::PathBuf;

use crate::types::Stage;

/// Main error type for TTS operations.
#[derive(Debug, thiserror::Error)]
pub enum TtsError {
    /// Invalid or incomplete configuration (unsupported language, unknown
    /// identifier, missing vocabulary file).
    #[error("configuration error: {0}")]
    Config(String),

    /// Failure reported by the text frontend (unknown grapheme, unknown phone).
    #[error("frontend error: {0}")]
    Frontend(String),

    /// A tensor does not fit the input slot it is bound to.
    #[error("binding shape error on slot '{slot}': expected {expected}, got {actual:?}")]
    BindingShape {
        slot: String,
        expected: String,
        actual: Vec<usize>,
    },

    /// Model artifact could not be loaded by the inference runtime.
    #[error("model load failed for {path}: {reason}")]
    ModelLoad { path: PathBuf, reason: String },

    /// The inference runtime failed while executing a model.
    #[error("runtime execution error: {0}")]
    Runtime(String),

    /// Output could not be written.
    #[error("failed to persist {path}: {source}")]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A single utterance failed at the given stage.
    #[error("utterance '{id}' failed at {stage} stage")]
    Utterance {
        id: String,
        stage: Stage,
        #[source]
        source: Box<TtsError>,
    },

    /// Invalid input provided.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Internal error (should not happen in normal operation).
    #[error("internal error: {0}")]
    Internal(String),
}

/// Convenience type alias for Results with TtsError.
pub type TtsResult<T> = Result<T, TtsError>;

impl TtsError {
    /// Create a config error with message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a frontend error with message.
    pub fn frontend(msg: impl Into<String>) -> Self {
        Self::Frontend(msg.into())
    }

    /// Create a binding shape error.
    pub fn binding_shape(
        slot: impl Into<String>,
        expected: impl Into<String>,
        actual: &[usize],
    ) -> Self {
        Self::BindingShape {
            slot: slot.into(),
            expected: expected.into(),
            actual: actual.to_vec(),
        }
    }

    /// Create a model load error.
    pub fn model_load(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::ModelLoad {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a runtime execution error with message.
    pub fn runtime(msg: impl Into<String>) -> Self {
        Self::Runtime(msg.into())
    }

    /// Create a persistence error for the given path.
    pub fn persistence(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Persistence {
            path: path.into(),
            source,
        }
    }

    /// Create an invalid input error with message.
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create an internal error with message.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Attach the utterance id and stage to a per-utterance failure.
    pub fn in_utterance(self, id: impl Into<String>, stage: Stage) -> Self {
        Self::Utterance {
            id: id.into(),
            stage,
            source: Box::new(self),
        }
    }

    /// The innermost error, skipping utterance wrappers.
    pub fn root(&self) -> &TtsError {
        match self {
            Self::Utterance { source, .. } => source.root(),
            other => other,
        }
    }
}

impl From<serde_json::Error> for TtsError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}
