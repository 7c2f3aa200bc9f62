//! Core types for the orchestrator pipeline.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::artifact::ArtifactHandle;
use crate::config::Settings;
use crate::decision::{DropInterval, Segment, Selection};
use crate::engine::CodecEngine;
use crate::logging::RunLogger;

/// Progress callback type for reporting pipeline progress.
///
/// Arguments: (step_name, percent_complete, message)
pub type ProgressCallback = Box<dyn Fn(&str, u32, &str) + Send + Sync>;

/// Read-only context passed to pipeline steps.
///
/// Holds the engine and shared resources that steps use but do not own.
/// Mutable state goes in [`PipelineRun`].
pub struct Context<'a> {
    /// Loaded codec engine.
    pub engine: &'a dyn CodecEngine,
    /// Application settings.
    pub settings: &'a Settings,
    /// Run identifier.
    pub run_id: String,
    /// Per-run logger.
    pub logger: Arc<RunLogger>,
    progress_callback: Option<&'a ProgressCallback>,
}

impl<'a> Context<'a> {
    pub fn new(
        engine: &'a dyn CodecEngine,
        settings: &'a Settings,
        run_id: impl Into<String>,
        logger: Arc<RunLogger>,
    ) -> Self {
        Self {
            engine,
            settings,
            run_id: run_id.into(),
            logger,
            progress_callback: None,
        }
    }

    /// Set the progress callback.
    pub fn with_progress_callback(mut self, callback: Option<&'a ProgressCallback>) -> Self {
        self.progress_callback = callback;
        self
    }

    /// Report progress to callback (if set).
    pub fn report_progress(&self, step_name: &str, percent: u32, message: &str) {
        if let Some(callback) = self.progress_callback {
            callback(step_name, percent, message);
        }
    }
}

/// Lifecycle of one run.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RunPhase {
    #[default]
    Idle,
    Loading,
    DiagnosticPass,
    Parsing,
    Selecting,
    SecondPass,
    Ready,
    Failed(String),
}

impl RunPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunPhase::Ready | RunPhase::Failed(_))
    }
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunPhase::Idle => f.write_str("idle"),
            RunPhase::Loading => f.write_str("loading"),
            RunPhase::DiagnosticPass => f.write_str("diagnostic pass"),
            RunPhase::Parsing => f.write_str("parsing"),
            RunPhase::Selecting => f.write_str("selecting"),
            RunPhase::SecondPass => f.write_str("second pass"),
            RunPhase::Ready => f.write_str("ready"),
            RunPhase::Failed(reason) => write!(f, "failed: {}", reason),
        }
    }
}

/// Mutable state that accumulates results from pipeline steps.
///
/// Each step fills in its own field; later steps only read earlier ones.
#[derive(Debug, Clone, Default)]
pub struct PipelineRun {
    pub run_id: String,
    /// Source video on disk.
    pub source: PathBuf,
    /// When the run started (RFC 3339).
    pub started_at: String,
    pub phase: RunPhase,
    /// Engine log captured during the diagnostic pass.
    pub diagnostic_lines: Option<Vec<String>>,
    /// Diagnostic lines lost to a full log channel.
    pub log_overflow: usize,
    /// Number of decision records parsed.
    pub records_parsed: usize,
    pub segments: Option<Vec<Segment>>,
    pub selection: Option<Selection>,
    /// `-vf` value used for the second pass.
    pub filter: Option<String>,
    /// Bytes of the second-pass output.
    pub output: Option<Vec<u8>>,
}

impl PipelineRun {
    pub fn new(run_id: impl Into<String>, source: impl Into<PathBuf>) -> Self {
        Self {
            run_id: run_id.into(),
            source: source.into(),
            started_at: chrono::Local::now().to_rfc3339(),
            ..Default::default()
        }
    }

    /// File stem of the source, used to name the artifact.
    pub fn source_stem(&self) -> String {
        self.source
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "output".to_string())
    }
}

/// Result of executing a pipeline step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// Step completed successfully.
    Success,
    /// Step was skipped (nothing to do, but not an error).
    Skipped(String),
}

/// What a successful submission returns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: String,
    pub source: PathBuf,
    pub artifact: ArtifactHandle,
    /// Intervals removed by the second pass, ascending.
    pub intervals: Vec<DropInterval>,
    /// Every static second found, including spans under the threshold.
    pub total_dropped_secs: f64,
    /// Seconds actually removed.
    pub excised_secs: f64,
    pub filter: String,
    pub steps_completed: Vec<String>,
    pub log_path: PathBuf,
}
