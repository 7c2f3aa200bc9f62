//! Error types for the codec engine layer.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by a [`CodecEngine`](super::CodecEngine).
#[derive(Error, Debug)]
pub enum EngineError {
    /// An operation was attempted before `load` succeeded.
    #[error("Engine is not loaded")]
    NotLoaded,

    /// Engine assets could not be resolved or verified.
    #[error("Failed to load engine from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// The engine process could not be started.
    #[error("Failed to launch engine: {source}")]
    Spawn {
        #[source]
        source: io::Error,
    },

    /// Working file names must be plain names inside the engine file system.
    #[error("Invalid working file name: '{0}'")]
    InvalidFileName(String),

    /// A working file does not exist.
    #[error("Working file not found: {0}")]
    FileNotFound(String),

    /// Any other I/O failure, with the operation that hit it.
    #[error("I/O error in {operation}: {source}")]
    Io {
        operation: String,
        #[source]
        source: io::Error,
    },
}

impl EngineError {
    /// Create a load failure.
    pub fn load_failed(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::LoadFailed {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an I/O error with context.
    pub fn io(operation: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            source,
        }
    }
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
