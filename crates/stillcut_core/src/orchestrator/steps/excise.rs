//! Excise step - second engine pass that removes the selected spans.

use crate::decision::Selection;
use crate::engine::OUTPUT_FILE;
use crate::filter::{display_argv, excision_argv, selection_filter, synthesize};
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, PipelineRun, RunPhase, StepOutcome};

use super::{last_engine_line, StepObserver};

/// Synthesizes the selection filter, re-encodes the staged input with it,
/// and reads back the result.
///
/// Runs even when nothing is selected; the identity filter still produces
/// a re-encoded, audio-free copy.
pub struct ExciseStep;

impl ExciseStep {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ExciseStep {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineStep for ExciseStep {
    fn name(&self) -> &str {
        "Excise"
    }

    fn description(&self) -> &str {
        "Second Pass"
    }

    fn phase(&self) -> RunPhase {
        RunPhase::SecondPass
    }

    fn validate_input(&self, ctx: &Context, run: &PipelineRun) -> StepResult<()> {
        if run.selection.is_none() {
            return Err(StepError::invalid_input("no selection to apply"));
        }
        if !ctx.engine.is_loaded() {
            return Err(StepError::invalid_input("engine is not loaded"));
        }
        Ok(())
    }

    fn execute(&self, ctx: &Context, run: &mut PipelineRun) -> StepResult<StepOutcome> {
        let selection = run.selection.as_ref();
        let intervals = selection
            .map(|s| s.intervals.as_slice())
            .unwrap_or_default();
        if selection.map_or(true, Selection::is_identity) {
            ctx.logger
                .info("No span exceeds the threshold; output keeps every frame");
        }

        let filter = selection_filter(&synthesize(intervals));
        let argv = excision_argv(&filter);
        ctx.logger.command(&display_argv(ctx.engine.name(), &argv));

        ctx.logger.clear_tail();
        ctx.logger.reset_progress();
        let observer = StepObserver {
            ctx,
            step_name: self.name(),
            capture: None,
        };

        let status = ctx.engine.exec(&argv, &observer)?;
        if !status.success() {
            ctx.logger.show_tail(ctx.engine.name());
            return Err(StepError::engine_invocation(
                "Second pass",
                status.code_or_signal(),
                last_engine_line(ctx),
            ));
        }

        let bytes = ctx.engine.read_file(OUTPUT_FILE)?;
        ctx.logger
            .info(&format!("Read {} bytes from {}", bytes.len(), OUTPUT_FILE));

        run.filter = Some(filter);
        run.output = Some(bytes);
        Ok(StepOutcome::Success)
    }

    fn validate_output(&self, _ctx: &Context, run: &PipelineRun) -> StepResult<()> {
        match &run.output {
            Some(bytes) if !bytes.is_empty() => Ok(()),
            _ => Err(StepError::invalid_output("second pass produced no output")),
        }
    }
}
