//! Select step - picks the drop spans long enough to cut.

use crate::decision::select;
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, PipelineRun, RunPhase, StepOutcome};

pub struct SelectStep;

impl SelectStep {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SelectStep {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineStep for SelectStep {
    fn name(&self) -> &str {
        "Select"
    }

    fn description(&self) -> &str {
        "Select Drop Intervals"
    }

    fn phase(&self) -> RunPhase {
        RunPhase::Selecting
    }

    fn validate_input(&self, _ctx: &Context, run: &PipelineRun) -> StepResult<()> {
        if run.segments.is_none() {
            return Err(StepError::invalid_input("no segments to select from"));
        }
        Ok(())
    }

    fn execute(&self, ctx: &Context, run: &mut PipelineRun) -> StepResult<StepOutcome> {
        let threshold = ctx.settings.excision.duration_threshold_secs;
        let segments = run.segments.as_deref().unwrap_or_default();
        let selection = select(segments, threshold);

        ctx.logger.section(&format!("Drop spans longer than {}s", threshold));
        for interval in &selection.intervals {
            ctx.logger.info(&format!(
                "{} -> {} ({}s)",
                interval.start,
                interval.end,
                interval.duration()
            ));
        }
        ctx.logger.info(&format!(
            "Static time found: {}s, to excise: {}s in {} intervals",
            selection.total_dropped_secs,
            selection.excised_secs(),
            selection.intervals.len()
        ));

        run.selection = Some(selection);
        Ok(StepOutcome::Success)
    }

    fn validate_output(&self, _ctx: &Context, run: &PipelineRun) -> StepResult<()> {
        let Some(selection) = &run.selection else {
            return Err(StepError::invalid_output("selection was not recorded"));
        };

        let ordered = selection
            .intervals
            .windows(2)
            .all(|pair| pair[0].end <= pair[1].start);
        let non_empty = selection.intervals.iter().all(|i| i.end > i.start);
        if !ordered || !non_empty {
            return Err(StepError::invalid_output(
                "drop intervals must be non-empty, ascending and disjoint",
            ));
        }
        Ok(())
    }
}
