//! Diagnostic pass - runs the decimation graph and captures its verdicts.

use std::fs;
use std::path::Path;

use crate::engine::{LogChannel, INPUT_FILE};
use crate::filter::{diagnostic_argv, diagnostic_graph, display_argv};
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, PipelineRun, RunPhase, StepOutcome};

use super::{last_engine_line, StepObserver};

/// Stages the source in the engine and runs the diagnostic graph at debug
/// verbosity, capturing the decimation stage's lines for the parser.
/// A capture that overflowed fails the step.
pub struct DiagnosticPassStep;

impl DiagnosticPassStep {
    pub fn new() -> Self {
        Self
    }

    fn stage_input(&self, ctx: &Context, source: &Path) -> StepResult<()> {
        let bytes = fs::read(source).map_err(|e| StepError::input_read(source, e))?;
        ctx.logger.info(&format!(
            "Staging {} ({} bytes) as {}",
            source.display(),
            bytes.len(),
            INPUT_FILE
        ));
        ctx.engine.write_file(INPUT_FILE, &bytes)?;
        Ok(())
    }
}

impl Default for DiagnosticPassStep {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineStep for DiagnosticPassStep {
    fn name(&self) -> &str {
        "DiagnosticPass"
    }

    fn description(&self) -> &str {
        "Diagnostic Pass"
    }

    fn phase(&self) -> RunPhase {
        RunPhase::DiagnosticPass
    }

    fn validate_input(&self, ctx: &Context, _run: &PipelineRun) -> StepResult<()> {
        if !ctx.engine.is_loaded() {
            return Err(StepError::invalid_input("engine is not loaded"));
        }
        Ok(())
    }

    fn execute(&self, ctx: &Context, run: &mut PipelineRun) -> StepResult<StepOutcome> {
        self.stage_input(ctx, &run.source)?;

        let graph = diagnostic_graph(&ctx.settings.detection);
        let argv = diagnostic_argv(&graph);
        ctx.logger.command(&display_argv(ctx.engine.name(), &argv));

        ctx.logger.clear_tail();
        ctx.logger.reset_progress();
        let channel = LogChannel::bounded(ctx.settings.engine.log_capacity);
        let observer = StepObserver {
            ctx,
            step_name: self.name(),
            capture: Some(&channel),
        };

        let status = ctx.engine.exec(&argv, &observer)?;
        if !status.success() {
            ctx.logger.show_tail(ctx.engine.name());
            return Err(StepError::engine_invocation(
                "Diagnostic pass",
                status.code_or_signal(),
                last_engine_line(ctx),
            ));
        }

        let captured = channel.drain();
        run.log_overflow = captured.overflow;
        if captured.overflow > 0 {
            let capacity = ctx.settings.engine.log_capacity;
            ctx.logger.error(&format!(
                "Log capacity of {} lines reached; {} diagnostic lines were discarded",
                capacity, captured.overflow
            ));
            return Err(StepError::log_overflow(capacity, captured.overflow));
        }
        ctx.logger
            .info(&format!("Captured {} diagnostic lines", captured.lines.len()));

        run.diagnostic_lines = Some(captured.lines);
        Ok(StepOutcome::Success)
    }

    fn validate_output(&self, _ctx: &Context, run: &PipelineRun) -> StepResult<()> {
        if run.diagnostic_lines.is_none() {
            return Err(StepError::invalid_output("diagnostic log was not captured"));
        }
        Ok(())
    }
}
