//! Pipeline orchestrator for coordinating runs.
//!
//! A run takes one source video through two engine passes. Each run is a
//! sequence of steps that validate, execute, and record their results in
//! a [`PipelineRun`].
//!
//! # Architecture
//!
//! ```text
//! Session::submit
//!     ├── load engine (once per session)
//!     └── Pipeline
//!         ├── Step: DiagnosticPass
//!         ├── Step: Parse
//!         ├── Step: Select
//!         └── Step: Excise
//!     ├── cleanup working files
//!     └── publish artifact
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use stillcut_core::config::Settings;
//! use stillcut_core::engine::{EngineAssets, FfmpegEngine};
//! use stillcut_core::orchestrator::Session;
//!
//! let engine = FfmpegEngine::new(".temp/engine");
//! let mut session = Session::new(engine, EngineAssets::native("ffmpeg"), Settings::default());
//!
//! let report = session.submit(Some(Path::new("talk.mp4"))).unwrap();
//! println!("Removed {}s", report.excised_secs);
//! ```

mod errors;
mod pipeline;
mod session;
mod step;
pub mod steps;
mod types;

pub use errors::{FailureKind, PipelineError, PipelineResult, StepError, StepResult};
pub use pipeline::{Pipeline, PipelineRunResult};
pub use session::Session;
pub use step::PipelineStep;
pub use steps::{DiagnosticPassStep, ExciseStep, ParseStep, SelectStep};
pub use types::{
    Context, PipelineRun, ProgressCallback, RunPhase, RunReport, StepOutcome,
};

/// Create the standard pipeline with all steps in order:
///
/// 1. DiagnosticPass - run the decimation graph and capture its log
/// 2. Parse - decision records reduced to keep/drop segments
/// 3. Select - drop spans longer than the threshold
/// 4. Excise - second pass with the synthesized selection filter
pub fn create_standard_pipeline() -> Pipeline {
    Pipeline::new()
        .with_step(DiagnosticPassStep::new())
        .with_step(ParseStep::new())
        .with_step(SelectStep::new())
        .with_step(ExciseStep::new())
}
