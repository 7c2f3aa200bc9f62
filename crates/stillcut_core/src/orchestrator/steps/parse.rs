//! Parse step - turns the captured diagnostic log into boundary segments.

use crate::decision::{parse_report, reduce, Decision};
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, PipelineRun, RunPhase, StepOutcome};

/// Parses decision records and reduces them to keep/drop segments.
///
/// Never fails on content: a log without decision lines yields the single
/// terminal `Keep` segment.
pub struct ParseStep;

impl ParseStep {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ParseStep {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineStep for ParseStep {
    fn name(&self) -> &str {
        "Parse"
    }

    fn description(&self) -> &str {
        "Parse Decisions"
    }

    fn phase(&self) -> RunPhase {
        RunPhase::Parsing
    }

    fn validate_input(&self, _ctx: &Context, run: &PipelineRun) -> StepResult<()> {
        if run.diagnostic_lines.is_none() {
            return Err(StepError::invalid_input("no diagnostic log to parse"));
        }
        Ok(())
    }

    fn execute(&self, ctx: &Context, run: &mut PipelineRun) -> StepResult<StepOutcome> {
        let lines = run.diagnostic_lines.as_deref().unwrap_or_default();
        let report = parse_report(lines);

        ctx.logger.info(&format!(
            "Parsed {} decision records from {} decimation lines",
            report.records.len(),
            report.considered
        ));
        if !report.unmatched.is_empty() {
            ctx.logger.info(&format!(
                "{} decimation lines did not carry a decision",
                report.unmatched.len()
            ));
            if ctx.settings.logging.log_unmatched_lines {
                for line in &report.unmatched {
                    ctx.logger.info(&format!("  unmatched: {}", line));
                }
            }
        }

        let segments = reduce(&report.records);
        let drops = segments
            .iter()
            .filter(|s| s.decision == Decision::Drop)
            .count();
        ctx.logger.info(&format!(
            "Reduced to {} segments ({} drop runs)",
            segments.len(),
            drops
        ));
        tracing::debug!(
            "Segments: {}",
            segments
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(" ")
        );

        run.records_parsed = report.records.len();
        run.segments = Some(segments);
        Ok(StepOutcome::Success)
    }

    fn validate_output(&self, _ctx: &Context, run: &PipelineRun) -> StepResult<()> {
        match run.segments.as_deref() {
            Some([.., last]) if last.decision == Decision::Keep => Ok(()),
            _ => Err(StepError::invalid_output(
                "segment list must end with a keep boundary",
            )),
        }
    }
}
