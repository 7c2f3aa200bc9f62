//! Session - drives runs against one engine instance.

use std::path::Path;
use std::sync::Arc;

use chrono::Local;
use uuid::Uuid;

use crate::artifact::{ArtifactHandle, ArtifactResult, ArtifactStore};
use crate::config::Settings;
use crate::engine::{CodecEngine, EngineAssets, EngineResult, INPUT_FILE, OUTPUT_FILE};
use crate::logging::{LogCallback, LogConfig, RunLogger};

use super::errors::{PipelineError, PipelineResult};
use super::pipeline::Pipeline;
use super::types::{Context, PipelineRun, ProgressCallback, RunPhase, RunReport};
use super::create_standard_pipeline;

/// Owns the engine and the most recent artifact.
///
/// The engine is loaded lazily by the first submission and stays loaded for
/// the life of the session; a failed load is retried on the next
/// submission. `submit` takes `&mut self`, so runs never overlap.
pub struct Session<E: CodecEngine> {
    engine: E,
    assets: EngineAssets,
    settings: Settings,
    store: ArtifactStore,
    pipeline: Pipeline,
    log_callback: Option<Arc<dyn Fn(&str) + Send + Sync>>,
    progress_callback: Option<ProgressCallback>,
    current: Option<ArtifactHandle>,
    phase: RunPhase,
}

impl<E: CodecEngine> Session<E> {
    /// Create a session. Artifacts go to `settings.paths.output_folder`,
    /// run logs to `settings.paths.logs_folder`.
    pub fn new(engine: E, assets: EngineAssets, settings: Settings) -> Self {
        let store = ArtifactStore::new(&settings.paths.output_folder);
        Self {
            engine,
            assets,
            settings,
            store,
            pipeline: create_standard_pipeline(),
            log_callback: None,
            progress_callback: None,
            current: None,
            phase: RunPhase::Idle,
        }
    }

    /// Receive every formatted run log line.
    pub fn with_log_callback(mut self, callback: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.log_callback = Some(Arc::new(callback));
        self
    }

    /// Receive step and engine progress.
    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// Phase of the latest run.
    pub fn phase(&self) -> &RunPhase {
        &self.phase
    }

    /// Artifact of the latest successful run, if still live.
    pub fn current_artifact(&self) -> Option<&ArtifactHandle> {
        self.current.as_ref()
    }

    /// Revoke the current artifact, if any.
    ///
    /// For callers that have exported the output elsewhere and are done with
    /// the published copy. The session holds no artifact afterwards.
    pub fn release_artifact(&mut self) -> ArtifactResult<()> {
        match self.current.take() {
            Some(handle) => self.store.revoke(&handle),
            None => Ok(()),
        }
    }

    /// Process one source video.
    ///
    /// The previous artifact is revoked first, whatever the outcome of this
    /// run. Working files are removed from the engine afterwards on success
    /// and failure alike.
    pub fn submit(&mut self, source: Option<&Path>) -> PipelineResult<RunReport> {
        self.revoke_current();
        self.phase = RunPhase::Idle;

        let result = self.run(source);
        if let Err(e) = &result {
            self.phase = RunPhase::Failed(e.to_string());
        }
        result
    }

    fn run(&mut self, source: Option<&Path>) -> PipelineResult<RunReport> {
        let source = source.ok_or(PipelineError::NoInputProvided)?;
        if !is_mp4(source) {
            return Err(PipelineError::UnsupportedInput {
                path: source.to_path_buf(),
            });
        }

        let stem = source
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "input".to_string());
        let run_id = new_run_id(&stem);
        let problems = self.settings.validate();
        if !problems.is_empty() {
            return Err(PipelineError::setup_failed(
                &run_id,
                format!("invalid settings: {}", problems.join("; ")),
            ));
        }

        let logger = Arc::new(
            self.create_logger(&run_id)
                .map_err(|e| PipelineError::setup_failed(&run_id, e.to_string()))?,
        );
        logger.info(&format!("stillcut {} - run {}", crate::version(), run_id));
        logger.info(&format!("Source: {}", source.display()));

        self.phase = RunPhase::Loading;
        if let Err(e) = self.ensure_loaded(&logger) {
            logger.error(&format!("Engine load failed: {}", e));
            logger.flush();
            return Err(PipelineError::EngineLoad {
                run_id,
                source: e,
            });
        }

        let mut run = PipelineRun::new(&run_id, source);
        let outcome = {
            let ctx = Context::new(&self.engine, &self.settings, &run_id, Arc::clone(&logger))
                .with_progress_callback(self.progress_callback.as_ref());
            self.pipeline.run(&ctx, &mut run)
        };
        self.phase = run.phase.clone();

        self.cleanup(&logger);

        let steps = match outcome {
            Ok(steps) => steps,
            Err(e) => {
                logger.error(&format!("Run failed in {} phase", run.phase));
                logger.flush();
                return Err(e);
            }
        };

        let output = run.output.take().unwrap_or_default();
        let artifact = match self.store.publish(&output, &run.source_stem()) {
            Ok(artifact) => artifact,
            Err(e) => {
                logger.error(&format!("Failed to publish output: {}", e));
                logger.flush();
                return Err(PipelineError::Artifact { run_id, source: e });
            }
        };
        logger.success(&format!(
            "Published {} ({} bytes)",
            artifact.path.display(),
            artifact.size_bytes
        ));
        logger.flush();

        self.current = Some(artifact.clone());
        run.phase = RunPhase::Ready;
        self.phase = RunPhase::Ready;

        let selection = run.selection.take().unwrap_or_default();
        Ok(RunReport {
            excised_secs: selection.excised_secs(),
            run_id,
            source: run.source,
            artifact,
            intervals: selection.intervals,
            total_dropped_secs: selection.total_dropped_secs,
            filter: run.filter.unwrap_or_default(),
            steps_completed: steps.steps_completed,
            log_path: logger.log_path().to_path_buf(),
        })
    }

    fn create_logger(&self, run_id: &str) -> std::io::Result<RunLogger> {
        let callback = self.log_callback.clone().map(|cb| {
            let forward: LogCallback = Box::new(move |line: &str| cb(line));
            forward
        });
        RunLogger::new(
            run_id,
            &self.settings.paths.logs_folder,
            LogConfig::from_settings(&self.settings.logging),
            callback,
        )
    }

    fn ensure_loaded(&mut self, logger: &RunLogger) -> EngineResult<()> {
        if self.engine.is_loaded() {
            logger.debug(&format!("{} engine already loaded", self.engine.name()));
            return Ok(());
        }

        logger.info(&format!(
            "Loading {} engine from {}",
            self.engine.name(),
            self.assets.core.display()
        ));
        self.engine.load(&self.assets)?;
        logger.success("Engine loaded");
        Ok(())
    }

    /// Remove working files, logging instead of failing.
    fn cleanup(&self, logger: &RunLogger) {
        let present = match self.engine.list_dir() {
            Ok(names) => names,
            Err(e) => {
                logger.warn(&format!("Could not list working files: {}", e));
                return;
            }
        };

        for name in [INPUT_FILE, OUTPUT_FILE] {
            if !present.iter().any(|n| n == name) {
                continue;
            }
            match self.engine.unlink(name) {
                Ok(()) => logger.debug(&format!("Removed working file {}", name)),
                Err(e) => logger.warn(&format!("Failed to remove working file {}: {}", name, e)),
            }
        }
    }

    fn revoke_current(&mut self) {
        if let Some(handle) = self.current.take() {
            if let Err(e) = self.store.revoke(&handle) {
                tracing::warn!("Failed to revoke artifact {}: {}", handle.path.display(), e);
            }
        }
    }
}

fn is_mp4(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("mp4"))
}

fn new_run_id(stem: &str) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!(
        "{}_{}_{}",
        stem,
        Local::now().format("%Y%m%d-%H%M%S"),
        &suffix[..6]
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::testing::{decimate_line, ScriptedEngine, ScriptedExec};
    use crate::logging::init_test_tracing;
    use crate::orchestrator::FailureKind;
    use std::fs;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::{tempdir, TempDir};

    struct Fixture {
        dir: TempDir,
        source: PathBuf,
        settings: Settings,
    }

    impl Fixture {
        fn new() -> Self {
            init_test_tracing();
            let dir = tempdir().unwrap();
            let source = dir.path().join("talk.mp4");
            fs::write(&source, b"source-bytes").unwrap();

            let mut settings = Settings::default();
            settings.paths.output_folder = dir.path().join("out").to_string_lossy().to_string();
            settings.paths.logs_folder = dir.path().join("logs").to_string_lossy().to_string();

            Self {
                dir,
                source,
                settings,
            }
        }

        fn session(&self, engine: ScriptedEngine) -> Session<ScriptedEngine> {
            Session::new(engine, EngineAssets::native("ffmpeg"), self.settings.clone())
        }
    }

    /// keep@0, drop@1, drop@5, keep@6 with unrelated chatter in between.
    fn scenario_log() -> Vec<String> {
        vec![
            "Input #0, mov,mp4,m4a,3gp,3g2,mj2, from 'input.mp4':".to_string(),
            "  Duration: 00:00:07.00, start: 0.000000, bitrate: 512 kb/s".to_string(),
            decimate_line("keep", 0, 0),
            "[Parsed_mpdecimate_4 @ 0x55d0c1a2f2c0] configured hi=64 lo=30 frac=0.33".to_string(),
            decimate_line("drop", 1, 1),
            "[libx264 @ 0x55d0c1a31000] frame I:1 Avg QP:20.00".to_string(),
            decimate_line("drop", 2, 5),
            decimate_line("keep", 3, 6),
        ]
    }

    fn happy_engine() -> ScriptedEngine {
        ScriptedEngine::new(vec![
            ScriptedExec::ok(scenario_log(), b"diagnostic"),
            ScriptedExec::ok(vec!["frame=  2 time=00:00:02.00".to_string()], b"excised"),
        ])
    }

    #[test]
    fn happy_path_publishes_excised_output() {
        let fx = Fixture::new();
        let engine = happy_engine();
        let probe = engine.probe();
        let mut session = fx.session(engine);

        let report = session.submit(Some(&fx.source)).unwrap();

        assert_eq!(report.intervals.len(), 1);
        assert_eq!(report.intervals[0].start, 1.0);
        assert_eq!(report.intervals[0].end, 6.0);
        assert_eq!(report.total_dropped_secs, 5.0);
        assert_eq!(report.excised_secs, 5.0);
        assert_eq!(
            report.filter,
            "select='not(gte(t,1)*lt(t,6))',setpts=N/FRAME_RATE/TB"
        );
        assert_eq!(
            report.steps_completed,
            vec!["DiagnosticPass", "Parse", "Select", "Excise"]
        );
        assert_eq!(fs::read(&report.artifact.path).unwrap(), b"excised");
        assert!(report.log_path.exists());
        assert_eq!(session.phase(), &RunPhase::Ready);
        assert_eq!(session.current_artifact(), Some(&report.artifact));

        let calls = probe.calls();
        assert_eq!(calls.len(), 2);
        assert!(calls[0].contains(&"-loglevel".to_string()));
        assert!(calls[0].contains(&"-an".to_string()));
        assert_eq!(calls[1][3], report.filter);
    }

    #[test]
    fn source_is_staged_as_input_file() {
        let fx = Fixture::new();
        let engine = happy_engine();
        let probe = engine.probe();
        let mut session = fx.session(engine);

        session.submit(Some(&fx.source)).unwrap();

        // Staged, used by both passes, then cleaned up
        assert_eq!(probe.calls()[0][1], INPUT_FILE);
        assert_eq!(probe.calls()[1][1], INPUT_FILE);
        assert!(probe.file_names().is_empty());
    }

    #[test]
    fn no_drops_runs_identity_second_pass() {
        let fx = Fixture::new();
        let engine = ScriptedEngine::new(vec![
            ScriptedExec::ok(
                vec![decimate_line("keep", 0, 0), decimate_line("keep", 1, 1)],
                b"diagnostic",
            ),
            ScriptedExec::ok(Vec::new(), b"reencoded"),
        ]);
        let probe = engine.probe();
        let mut session = fx.session(engine);

        let report = session.submit(Some(&fx.source)).unwrap();

        assert!(report.intervals.is_empty());
        assert_eq!(report.total_dropped_secs, 0.0);
        assert_eq!(report.filter, "select='1',setpts=N/FRAME_RATE/TB");
        assert_eq!(probe.calls().len(), 2);
        let log = fs::read_to_string(&report.log_path).unwrap();
        assert!(log.contains("output keeps every frame"));
    }

    #[test]
    fn threshold_above_span_accounts_without_excising() {
        let mut fx = Fixture::new();
        fx.settings.excision.duration_threshold_secs = 10.0;
        let mut session = fx.session(happy_engine());

        let report = session.submit(Some(&fx.source)).unwrap();

        assert!(report.intervals.is_empty());
        assert_eq!(report.total_dropped_secs, 5.0);
        assert_eq!(report.excised_secs, 0.0);
    }

    #[test]
    fn missing_input_is_rejected() {
        let fx = Fixture::new();
        let engine = happy_engine();
        let probe = engine.probe();
        let mut session = fx.session(engine);

        let err = session.submit(None).unwrap_err();

        assert_eq!(err.kind(), FailureKind::NoInputProvided);
        assert_eq!(probe.load_count(), 0);
        assert!(matches!(session.phase(), RunPhase::Failed(_)));
    }

    #[test]
    fn non_mp4_input_is_rejected_before_engine() {
        let fx = Fixture::new();
        let engine = happy_engine();
        let probe = engine.probe();
        let mut session = fx.session(engine);

        let mkv = fx.dir.path().join("talk.mkv");
        fs::write(&mkv, b"x").unwrap();
        let err = session.submit(Some(&mkv)).unwrap_err();

        assert_eq!(err.kind(), FailureKind::UnsupportedInput);
        assert_eq!(probe.load_count(), 0);
    }

    #[test]
    fn uppercase_extension_is_accepted() {
        assert!(is_mp4(Path::new("/videos/TALK.MP4")));
        assert!(!is_mp4(Path::new("/videos/talk")));
        assert!(!is_mp4(Path::new("/videos/talk.mp4.part")));
    }

    #[test]
    fn unreadable_input_fails_with_read_error() {
        let fx = Fixture::new();
        let engine = happy_engine();
        let probe = engine.probe();
        let mut session = fx.session(engine);

        let missing = fx.dir.path().join("gone.mp4");
        let err = session.submit(Some(&missing)).unwrap_err();

        assert_eq!(err.kind(), FailureKind::InputReadFailure);
        assert!(probe.calls().is_empty());
        assert_eq!(
            session.phase(),
            &RunPhase::Failed(err.to_string())
        );
    }

    #[test]
    fn invalid_settings_fail_before_engine() {
        let mut fx = Fixture::new();
        fx.settings.engine.log_capacity = 0;
        let engine = happy_engine();
        let probe = engine.probe();
        let mut session = fx.session(engine);

        let err = session.submit(Some(&fx.source)).unwrap_err();

        assert_eq!(err.kind(), FailureKind::SetupFailure);
        assert!(err.to_string().contains("engine.log_capacity"));
        assert_eq!(probe.load_count(), 0);
        assert!(probe.calls().is_empty());
    }

    #[test]
    fn engine_load_failure_is_retried_next_submission() {
        let fx = Fixture::new();
        let engine = ScriptedEngine::failing_load();
        let probe = engine.probe();
        let mut session = fx.session(engine);

        let err = session.submit(Some(&fx.source)).unwrap_err();
        assert_eq!(err.kind(), FailureKind::EngineLoadFailure);

        let err = session.submit(Some(&fx.source)).unwrap_err();
        assert_eq!(err.kind(), FailureKind::EngineLoadFailure);
        assert_eq!(probe.load_count(), 2);
    }

    #[test]
    fn diagnostic_failure_skips_remaining_steps_and_cleans_up() {
        let fx = Fixture::new();
        let engine = ScriptedEngine::new(vec![ScriptedExec::exit(1)]);
        let probe = engine.probe();
        let mut session = fx.session(engine);

        let err = session.submit(Some(&fx.source)).unwrap_err();

        assert_eq!(err.kind(), FailureKind::EngineInvocationFailure);
        assert!(err.to_string().contains("DiagnosticPass"));
        assert_eq!(probe.calls().len(), 1);
        assert!(probe.file_names().is_empty());
        assert!(session.current_artifact().is_none());
    }

    #[test]
    fn second_pass_failure_publishes_nothing() {
        let fx = Fixture::new();
        let engine = ScriptedEngine::new(vec![
            ScriptedExec::ok(scenario_log(), b"diagnostic"),
            ScriptedExec::exit(1),
        ]);
        let probe = engine.probe();
        let mut session = fx.session(engine);

        let err = session.submit(Some(&fx.source)).unwrap_err();

        assert_eq!(err.kind(), FailureKind::EngineInvocationFailure);
        assert!(err.to_string().contains("Excise"));
        assert!(probe.file_names().is_empty());
        assert!(session.current_artifact().is_none());
        let published = fs::read_dir(fx.dir.path().join("out"))
            .map(|entries| entries.count())
            .unwrap_or(0);
        assert_eq!(published, 0);
    }

    #[test]
    fn engine_error_during_exec_fails_run() {
        let fx = Fixture::new();
        let engine = ScriptedEngine::new(vec![ScriptedExec {
            spawn_error: true,
            ..Default::default()
        }]);
        let mut session = fx.session(engine);

        let err = session.submit(Some(&fx.source)).unwrap_err();
        assert_eq!(err.kind(), FailureKind::EngineInvocationFailure);
    }

    #[test]
    fn cleanup_failures_do_not_fail_the_run() {
        let fx = Fixture::new();
        let engine = happy_engine().with_failing_unlink();
        let probe = engine.probe();
        let mut session = fx.session(engine);

        let report = session.submit(Some(&fx.source)).unwrap();

        assert_eq!(probe.unlink_failures.load(Ordering::SeqCst), 2);
        let log = fs::read_to_string(&report.log_path).unwrap();
        assert!(log.contains("Failed to remove working file input.mp4"));
    }

    #[test]
    fn previous_artifact_is_revoked_on_next_submission() {
        let fx = Fixture::new();
        let mut session = fx.session(happy_engine());

        let first = session.submit(Some(&fx.source)).unwrap();
        assert!(first.artifact.path.exists());

        // Second run fails; the first artifact is gone regardless
        session.engine().push(ScriptedExec::exit(1));
        session.submit(Some(&fx.source)).unwrap_err();

        assert!(!first.artifact.path.exists());
        assert!(session.current_artifact().is_none());
        assert!(session.store().export(&first.artifact, fx.dir.path().join("copy.mp4")).is_err());
    }

    #[test]
    fn released_artifact_is_removed_after_export() {
        let fx = Fixture::new();
        let mut session = fx.session(happy_engine());

        let report = session.submit(Some(&fx.source)).unwrap();
        let dest = fx.dir.path().join("final.mp4");
        session.store().export(&report.artifact, &dest).unwrap();

        session.release_artifact().unwrap();

        assert!(!report.artifact.path.exists());
        assert!(session.current_artifact().is_none());
        assert_eq!(fs::read(&dest).unwrap(), b"excised");
        let published = fs::read_dir(fx.dir.path().join("out")).unwrap().count();
        assert_eq!(published, 0);

        // Nothing left to release
        session.release_artifact().unwrap();
    }

    #[test]
    fn engine_is_loaded_once_across_runs() {
        let fx = Fixture::new();
        let engine = happy_engine();
        engine.push(ScriptedExec::ok(scenario_log(), b"diagnostic"));
        engine.push(ScriptedExec::ok(Vec::new(), b"second"));
        let probe = engine.probe();
        let mut session = fx.session(engine);

        let first = session.submit(Some(&fx.source)).unwrap();
        let second = session.submit(Some(&fx.source)).unwrap();

        assert_eq!(probe.load_count(), 1);
        assert!(session.engine().is_loaded());
        assert_ne!(first.artifact.id, second.artifact.id);
        assert!(!first.artifact.path.exists());
        assert_eq!(fs::read(&second.artifact.path).unwrap(), b"second");
    }

    #[test]
    fn callbacks_receive_log_and_progress() {
        let fx = Fixture::new();
        let lines = Arc::new(AtomicUsize::new(0));
        let progress = Arc::new(AtomicUsize::new(0));
        let (lines_seen, progress_seen) = (Arc::clone(&lines), Arc::clone(&progress));

        let mut session = fx
            .session(happy_engine())
            .with_log_callback(move |_| {
                lines_seen.fetch_add(1, Ordering::SeqCst);
            })
            .with_progress_callback(Box::new(move |_, _, _| {
                progress_seen.fetch_add(1, Ordering::SeqCst);
            }));

        session.submit(Some(&fx.source)).unwrap();

        assert!(lines.load(Ordering::SeqCst) > 0);
        assert!(progress.load(Ordering::SeqCst) > 0);
    }

    #[test]
    fn engine_chatter_does_not_count_against_log_capacity() {
        let mut fx = Fixture::new();
        // keep, configured, drop, drop, keep
        fx.settings.engine.log_capacity = 5;
        let mut chatty = vec![
            "[h264 @ 0x55d0c1a30000] nal_unit_type: 7(SPS), nal_ref_idc: 3".to_string();
            6
        ];
        chatty.extend(scenario_log());
        let engine = ScriptedEngine::new(vec![
            ScriptedExec::ok(chatty, b"diagnostic"),
            ScriptedExec::ok(Vec::new(), b"excised"),
        ]);
        let mut session = fx.session(engine);

        let report = session.submit(Some(&fx.source)).unwrap();

        assert_eq!(report.intervals.len(), 1);
        assert_eq!(report.total_dropped_secs, 5.0);
    }

    #[test]
    fn log_overflow_fails_the_run() {
        let mut fx = Fixture::new();
        fx.settings.engine.log_capacity = 3;
        let engine = happy_engine();
        let probe = engine.probe();
        let mut session = fx.session(engine);

        let err = session.submit(Some(&fx.source)).unwrap_err();

        assert_eq!(err.kind(), FailureKind::EngineInvocationFailure);
        assert!(err.to_string().contains("DiagnosticPass"));
        assert!(matches!(
            err,
            PipelineError::StepFailed {
                source: crate::orchestrator::StepError::LogOverflow {
                    capacity: 3,
                    discarded: 2
                },
                ..
            }
        ));
        // The second pass never ran and nothing was published
        assert_eq!(probe.calls().len(), 1);
        assert!(session.current_artifact().is_none());
        assert!(probe.file_names().is_empty());
    }
}
