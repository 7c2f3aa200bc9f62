//! Scripted in-memory engine for pipeline tests.

use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use super::{
    validate_file_name, CodecEngine, EngineAssets, EngineError, EngineProgress, EngineResult,
    ExecObserver, ExitStatus, OUTPUT_FILE,
};

/// What one `exec` call does.
#[derive(Debug, Clone, Default)]
pub struct ScriptedExec {
    pub lines: Vec<String>,
    pub exit_code: i32,
    /// Bytes written to `output.mp4` when the call succeeds.
    pub output: Option<Vec<u8>>,
    /// Fail with an engine error instead of exiting.
    pub spawn_error: bool,
}

impl ScriptedExec {
    pub fn ok(lines: Vec<String>, output: &[u8]) -> Self {
        Self {
            lines,
            exit_code: 0,
            output: Some(output.to_vec()),
            spawn_error: false,
        }
    }

    pub fn exit(code: i32) -> Self {
        Self {
            exit_code: code,
            lines: vec!["Conversion failed!".to_string()],
            ..Default::default()
        }
    }
}

/// Shared view of what the engine saw, usable after the engine moves.
#[derive(Clone, Default)]
pub struct EngineProbe {
    pub files: Arc<Mutex<BTreeMap<String, Vec<u8>>>>,
    pub calls: Arc<Mutex<Vec<Vec<String>>>>,
    pub loads: Arc<AtomicUsize>,
    pub unlink_failures: Arc<AtomicUsize>,
}

impl EngineProbe {
    pub fn file_names(&self) -> Vec<String> {
        self.files.lock().keys().cloned().collect()
    }

    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().clone()
    }

    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

pub struct ScriptedEngine {
    loaded: bool,
    fail_load: bool,
    fail_unlink: bool,
    script: Mutex<VecDeque<ScriptedExec>>,
    probe: EngineProbe,
}

impl ScriptedEngine {
    pub fn new(script: Vec<ScriptedExec>) -> Self {
        Self {
            loaded: false,
            fail_load: false,
            fail_unlink: false,
            script: Mutex::new(script.into()),
            probe: EngineProbe::default(),
        }
    }

    pub fn failing_load() -> Self {
        Self {
            fail_load: true,
            ..Self::new(Vec::new())
        }
    }

    pub fn with_failing_unlink(mut self) -> Self {
        self.fail_unlink = true;
        self
    }

    pub fn push(&self, exec: ScriptedExec) {
        self.script.lock().push_back(exec);
    }

    pub fn probe(&self) -> EngineProbe {
        self.probe.clone()
    }
}

impl CodecEngine for ScriptedEngine {
    fn name(&self) -> &str {
        "scripted"
    }

    fn load(&mut self, assets: &EngineAssets) -> EngineResult<()> {
        self.probe.loads.fetch_add(1, Ordering::SeqCst);
        if self.fail_load {
            return Err(EngineError::load_failed(&assets.core, "core asset unavailable"));
        }
        self.loaded = true;
        Ok(())
    }

    fn is_loaded(&self) -> bool {
        self.loaded
    }

    fn exec(&self, argv: &[String], observer: &dyn ExecObserver) -> EngineResult<ExitStatus> {
        if !self.loaded {
            return Err(EngineError::NotLoaded);
        }
        self.probe.calls.lock().push(argv.to_vec());

        let step = self.script.lock().pop_front().unwrap_or_default();
        if step.spawn_error {
            return Err(EngineError::Spawn {
                source: std::io::ErrorKind::NotFound.into(),
            });
        }

        let total = step.lines.len().max(1) as f64;
        for (i, line) in step.lines.iter().enumerate() {
            observer.on_log(line);
            observer.on_progress(EngineProgress {
                time_secs: i as f64,
                ratio: Some((i + 1) as f64 / total),
            });
        }

        if step.exit_code == 0 {
            if let Some(output) = step.output {
                self.probe.files.lock().insert(OUTPUT_FILE.to_string(), output);
            }
        }
        Ok(ExitStatus::from_code(step.exit_code))
    }

    fn write_file(&self, name: &str, data: &[u8]) -> EngineResult<()> {
        validate_file_name(name)?;
        self.probe.files.lock().insert(name.to_string(), data.to_vec());
        Ok(())
    }

    fn read_file(&self, name: &str) -> EngineResult<Vec<u8>> {
        self.probe
            .files
            .lock()
            .get(name)
            .cloned()
            .ok_or_else(|| EngineError::FileNotFound(name.to_string()))
    }

    fn list_dir(&self) -> EngineResult<Vec<String>> {
        Ok(self.probe.file_names())
    }

    fn unlink(&self, name: &str) -> EngineResult<()> {
        if self.fail_unlink {
            self.probe.unlink_failures.fetch_add(1, Ordering::SeqCst);
            return Err(EngineError::io(
                format!("removing {}", name),
                std::io::ErrorKind::PermissionDenied.into(),
            ));
        }
        self.probe
            .files
            .lock()
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| EngineError::FileNotFound(name.to_string()))
    }
}

/// A decimation log line as ffmpeg prints it at debug verbosity.
pub fn decimate_line(decision: &str, pts: u32, time: u32) -> String {
    format!(
        "[Parsed_mpdecimate_4 @ 0x55d0c1a2f2c0] {} pts:{} pts_time:{} drop_count:0 keep_count:1",
        decision, pts, time
    )
}
