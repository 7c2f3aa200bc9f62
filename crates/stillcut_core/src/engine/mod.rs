//! Codec engine abstraction.
//!
//! The engine does all decoding, filtering and encoding. The pipeline only
//! sees three capabilities:
//!
//! - `load(assets)` - resolve and verify the engine, once per session
//! - `exec(argv)` - run one command-line style invocation, delivering log
//!   lines and progress to an [`ExecObserver`] while it runs
//! - a small file system holding working files (`input.mp4`, `output.mp4`)
//!
//! [`FfmpegEngine`] implements this with a native ffmpeg executable and a
//! private scratch directory.

mod channel;
mod errors;
mod ffmpeg;
mod progress;

use std::path::PathBuf;

pub use channel::{CapturedLog, LogChannel};
pub use errors::{EngineError, EngineResult};
pub use ffmpeg::FfmpegEngine;
pub use progress::{EngineProgress, ProgressTracker};

/// Working file the source video is staged under.
pub const INPUT_FILE: &str = "input.mp4";

/// Working file every pass writes its result to.
pub const OUTPUT_FILE: &str = "output.mp4";

/// Locations of the engine's assets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineAssets {
    /// Core engine entry point (for native engines, the executable).
    pub core: PathBuf,
    /// Compiled engine module, for engines that ship one separately.
    pub wasm: Option<PathBuf>,
    /// Worker script, for engines that run off the calling thread.
    pub worker: Option<PathBuf>,
}

impl EngineAssets {
    /// Assets for a native executable engine.
    pub fn native(core: impl Into<PathBuf>) -> Self {
        Self {
            core: core.into(),
            wasm: None,
            worker: None,
        }
    }
}

/// Exit status of an engine invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitStatus {
    /// Exit code, `None` if the invocation was terminated abnormally.
    pub code: Option<i32>,
}

impl ExitStatus {
    pub fn from_code(code: i32) -> Self {
        Self { code: Some(code) }
    }

    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Exit code for error reporting (-1 when terminated without one).
    pub fn code_or_signal(&self) -> i32 {
        self.code.unwrap_or(-1)
    }
}

/// Subscription for events emitted during an invocation.
pub trait ExecObserver {
    /// A log line from the engine.
    fn on_log(&self, line: &str);

    /// A progress update. Ignored by default.
    fn on_progress(&self, _progress: EngineProgress) {}
}

/// External codec engine.
///
/// Invocations are blocking: `exec` returns once the engine has finished
/// and every log line has been delivered to the observer. One engine
/// instance serves one run at a time; working files use fixed names.
pub trait CodecEngine: Send + Sync {
    /// Short engine name for logs and errors.
    fn name(&self) -> &str;

    /// Resolve the engine assets and make the engine ready.
    fn load(&mut self, assets: &EngineAssets) -> EngineResult<()>;

    /// Whether `load` has succeeded.
    fn is_loaded(&self) -> bool;

    /// Run one invocation.
    fn exec(&self, argv: &[String], observer: &dyn ExecObserver) -> EngineResult<ExitStatus>;

    /// Create or replace a working file.
    fn write_file(&self, name: &str, data: &[u8]) -> EngineResult<()>;

    /// Read a working file.
    fn read_file(&self, name: &str) -> EngineResult<Vec<u8>>;

    /// List working file names.
    fn list_dir(&self) -> EngineResult<Vec<String>>;

    /// Remove a working file.
    fn unlink(&self, name: &str) -> EngineResult<()>;
}

/// Reject names that would escape the engine's file system.
pub(crate) fn validate_file_name(name: &str) -> EngineResult<()> {
    let invalid = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains('/')
        || name.contains('\\');
    if invalid {
        return Err(EngineError::InvalidFileName(name.to_string()));
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod testing;
