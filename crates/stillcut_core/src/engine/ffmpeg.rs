//! Native ffmpeg engine.
//!
//! Runs the ffmpeg executable as a subprocess. The engine's file system is
//! a scratch directory used as the child's working directory, so argv can
//! refer to working files by bare name exactly as with an in-memory engine.

use std::fs;
use std::io::{BufRead, BufReader, ErrorKind, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use super::errors::{EngineError, EngineResult};
use super::progress::ProgressTracker;
use super::{validate_file_name, CodecEngine, EngineAssets, ExecObserver, ExitStatus};

/// ffmpeg subprocess engine with a scratch-directory file system.
pub struct FfmpegEngine {
    /// Directory holding working files.
    scratch_dir: PathBuf,
    /// Verified executable, set once `load` succeeds.
    binary: Option<PathBuf>,
}

impl FfmpegEngine {
    pub fn new(scratch_dir: impl Into<PathBuf>) -> Self {
        Self {
            scratch_dir: scratch_dir.into(),
            binary: None,
        }
    }

    /// Directory holding working files.
    pub fn scratch_dir(&self) -> &Path {
        &self.scratch_dir
    }

    /// Resolve a working file name inside the scratch directory.
    fn resolve(&self, name: &str) -> EngineResult<PathBuf> {
        if self.binary.is_none() {
            return Err(EngineError::NotLoaded);
        }
        validate_file_name(name)?;
        Ok(self.scratch_dir.join(name))
    }

    #[cfg(test)]
    fn loaded_for_test(scratch_dir: &Path) -> Self {
        fs::create_dir_all(scratch_dir).unwrap();
        Self {
            scratch_dir: scratch_dir.to_path_buf(),
            binary: Some(PathBuf::from("ffmpeg")),
        }
    }
}

impl CodecEngine for FfmpegEngine {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    fn load(&mut self, assets: &EngineAssets) -> EngineResult<()> {
        if assets.wasm.is_some() || assets.worker.is_some() {
            tracing::debug!("ffmpeg engine ignores wasm/worker assets");
        }

        let output = Command::new(&assets.core)
            .arg("-version")
            .stdin(Stdio::null())
            .output()
            .map_err(|e| EngineError::load_failed(&assets.core, e.to_string()))?;

        if !output.status.success() {
            return Err(EngineError::load_failed(
                &assets.core,
                format!("'-version' exited with {:?}", output.status.code()),
            ));
        }

        let banner = String::from_utf8_lossy(&output.stdout);
        if let Some(first) = banner.lines().next() {
            tracing::info!("Loaded {}", first);
        }

        fs::create_dir_all(&self.scratch_dir)
            .map_err(|e| EngineError::io("creating scratch directory", e))?;

        self.binary = Some(assets.core.clone());
        Ok(())
    }

    fn is_loaded(&self) -> bool {
        self.binary.is_some()
    }

    fn exec(&self, argv: &[String], observer: &dyn ExecObserver) -> EngineResult<ExitStatus> {
        let binary = self.binary.as_ref().ok_or(EngineError::NotLoaded)?;

        let mut cmd = Command::new(binary);
        cmd.arg("-nostdin")
            .arg("-y")
            .args(argv)
            .current_dir(&self.scratch_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());

        tracing::debug!("Running ffmpeg: {:?}", cmd);

        let mut child = cmd.spawn().map_err(|source| EngineError::Spawn { source })?;

        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| EngineError::io("capturing ffmpeg stderr", ErrorKind::BrokenPipe.into()))?;

        if let Err(e) = forward_stderr(stderr, observer) {
            // Stop ffmpeg before the caller removes its working files
            let _ = child.kill();
            let _ = child.wait();
            return Err(e);
        }

        let status = child
            .wait()
            .map_err(|e| EngineError::io("waiting for ffmpeg", e))?;

        Ok(ExitStatus {
            code: status.code(),
        })
    }

    fn write_file(&self, name: &str, data: &[u8]) -> EngineResult<()> {
        let path = self.resolve(name)?;
        fs::write(&path, data).map_err(|e| EngineError::io(format!("writing {}", name), e))
    }

    fn read_file(&self, name: &str) -> EngineResult<Vec<u8>> {
        let path = self.resolve(name)?;
        fs::read(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => EngineError::FileNotFound(name.to_string()),
            _ => EngineError::io(format!("reading {}", name), e),
        })
    }

    fn list_dir(&self) -> EngineResult<Vec<String>> {
        if self.binary.is_none() {
            return Err(EngineError::NotLoaded);
        }

        let entries = fs::read_dir(&self.scratch_dir)
            .map_err(|e| EngineError::io("listing scratch directory", e))?;

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| EngineError::io("listing scratch directory", e))?;
            names.push(entry.file_name().to_string_lossy().to_string());
        }
        names.sort();
        Ok(names)
    }

    fn unlink(&self, name: &str) -> EngineResult<()> {
        let path = self.resolve(name)?;
        fs::remove_file(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => EngineError::FileNotFound(name.to_string()),
            _ => EngineError::io(format!("removing {}", name), e),
        })
    }
}

/// Deliver stderr to the observer line by line until EOF.
fn forward_stderr(stderr: impl Read, observer: &dyn ExecObserver) -> EngineResult<()> {
    let mut tracker = ProgressTracker::new();
    let mut reader = BufReader::new(stderr);
    let mut buf = Vec::new();

    loop {
        buf.clear();
        let read = reader
            .read_until(b'\n', &mut buf)
            .map_err(|e| EngineError::io("reading ffmpeg stderr", e))?;
        if read == 0 {
            return Ok(());
        }

        let chunk = String::from_utf8_lossy(&buf);
        // Status lines are terminated by '\r' and share one '\n' line.
        for line in chunk.split(['\r', '\n']).filter(|l| !l.trim().is_empty()) {
            observer.on_log(line);
            if let Some(progress) = tracker.observe(line) {
                observer.on_progress(progress);
            }
        }
    }
}

impl Drop for FfmpegEngine {
    fn drop(&mut self) {
        // Only succeeds when the run cleanup left the directory empty.
        if self.binary.is_some() {
            let _ = fs::remove_dir(&self.scratch_dir);
        }
    }
}
