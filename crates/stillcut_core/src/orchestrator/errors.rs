//! Error types for the orchestrator pipeline.
//!
//! Errors carry context that chains through layers:
//! Run → Step → Engine operation → Detail

use std::io;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::artifact::ArtifactError;
use crate::engine::EngineError;

/// Caller-facing classification of a failed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureKind {
    EngineLoadFailure,
    EngineInvocationFailure,
    InputReadFailure,
    NoInputProvided,
    UnsupportedInput,
    ArtifactFailure,
    SetupFailure,
}

/// Top-level pipeline error with run context.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// `submit` was called without a source.
    #[error("No input video provided")]
    NoInputProvided,

    /// The source is not an `.mp4` file.
    #[error("Unsupported input '{}': only .mp4 files are accepted", .path.display())]
    UnsupportedInput { path: PathBuf },

    /// The engine could not be loaded.
    #[error("Run '{run_id}' could not load the engine: {source}")]
    EngineLoad {
        run_id: String,
        #[source]
        source: EngineError,
    },

    /// A step failed during execution.
    #[error("Run '{run_id}' failed at step '{step_name}': {source}")]
    StepFailed {
        run_id: String,
        step_name: String,
        #[source]
        source: StepError,
    },

    /// The output could not be published.
    #[error("Run '{run_id}' could not publish its output: {source}")]
    Artifact {
        run_id: String,
        #[source]
        source: ArtifactError,
    },

    /// Failed to set up the run (log file, directories).
    #[error("Run '{run_id}' setup failed: {message}")]
    SetupFailed { run_id: String, message: String },
}

impl PipelineError {
    /// Create a step failed error.
    pub fn step_failed(
        run_id: impl Into<String>,
        step_name: impl Into<String>,
        source: StepError,
    ) -> Self {
        Self::StepFailed {
            run_id: run_id.into(),
            step_name: step_name.into(),
            source,
        }
    }

    /// Create a setup failed error.
    pub fn setup_failed(run_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SetupFailed {
            run_id: run_id.into(),
            message: message.into(),
        }
    }

    /// Classify this error.
    pub fn kind(&self) -> FailureKind {
        match self {
            PipelineError::NoInputProvided => FailureKind::NoInputProvided,
            PipelineError::UnsupportedInput { .. } => FailureKind::UnsupportedInput,
            PipelineError::EngineLoad { .. } => FailureKind::EngineLoadFailure,
            PipelineError::StepFailed { source, .. } => match source {
                StepError::InputRead { .. } => FailureKind::InputReadFailure,
                _ => FailureKind::EngineInvocationFailure,
            },
            PipelineError::Artifact { .. } => FailureKind::ArtifactFailure,
            PipelineError::SetupFailed { .. } => FailureKind::SetupFailure,
        }
    }
}

/// Error from a pipeline step with operation context.
#[derive(Error, Debug)]
pub enum StepError {
    /// Input validation failed.
    #[error("Input validation failed: {0}")]
    InvalidInput(String),

    /// Output validation failed.
    #[error("Output validation failed: {0}")]
    InvalidOutput(String),

    /// The source video could not be read.
    #[error("Failed to read input {}: {source}", .path.display())]
    InputRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// An engine pass exited unsuccessfully.
    #[error("{stage} failed with exit code {exit_code}: {message}")]
    EngineInvocation {
        stage: String,
        exit_code: i32,
        message: String,
    },

    /// More decision lines arrived than the capture could hold.
    #[error("Diagnostic log overflowed: {discarded} lines beyond the capacity of {capacity} were lost")]
    LogOverflow { capacity: usize, discarded: usize },

    /// The engine itself reported an error.
    #[error(transparent)]
    Engine(#[from] EngineError),
}

impl StepError {
    /// Create an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Create an invalid output error.
    pub fn invalid_output(message: impl Into<String>) -> Self {
        Self::InvalidOutput(message.into())
    }

    /// Create an input read error.
    pub fn input_read(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::InputRead {
            path: path.into(),
            source,
        }
    }

    /// Create an engine invocation error.
    pub fn engine_invocation(
        stage: impl Into<String>,
        exit_code: i32,
        message: impl Into<String>,
    ) -> Self {
        Self::EngineInvocation {
            stage: stage.into(),
            exit_code,
            message: message.into(),
        }
    }

    /// Create a log overflow error.
    pub fn log_overflow(capacity: usize, discarded: usize) -> Self {
        Self::LogOverflow {
            capacity,
            discarded,
        }
    }
}

/// Result type for step operations.
pub type StepResult<T> = Result<T, StepError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;
