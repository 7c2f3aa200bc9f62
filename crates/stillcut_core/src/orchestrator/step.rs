//! Pipeline step trait definition.
//!
//! All pipeline steps implement this trait, providing a consistent
//! interface for validation and execution.

use super::errors::StepResult;
use super::types::{Context, PipelineRun, RunPhase, StepOutcome};

/// Trait for pipeline steps.
///
/// The pipeline runner moves the run into [`phase`](PipelineStep::phase)
/// and then calls these methods in order:
///
/// 1. `validate_input` - Check that earlier steps left what this one needs
/// 2. `execute` - Perform the step's work
/// 3. `validate_output` - Verify the step recorded valid output
///
/// # Example
///
/// ```ignore
/// struct SelectStep;
///
/// impl PipelineStep for SelectStep {
///     fn name(&self) -> &str { "Select" }
///     fn phase(&self) -> RunPhase { RunPhase::Selecting }
///
///     fn validate_input(&self, _ctx: &Context, run: &PipelineRun) -> StepResult<()> {
///         if run.segments.is_none() {
///             return Err(StepError::invalid_input("No segments"));
///         }
///         Ok(())
///     }
///
///     fn execute(&self, ctx: &Context, run: &mut PipelineRun) -> StepResult<StepOutcome> {
///         run.selection = Some(select(..));
///         Ok(StepOutcome::Success)
///     }
///
///     fn validate_output(&self, _ctx: &Context, run: &PipelineRun) -> StepResult<()> {
///         Ok(())
///     }
/// }
/// ```
pub trait PipelineStep: Send + Sync {
    /// Get the step name (for logging and error context).
    fn name(&self) -> &str;

    /// Phase the run is in while this step executes.
    fn phase(&self) -> RunPhase;

    /// Validate inputs before execution.
    fn validate_input(&self, ctx: &Context, run: &PipelineRun) -> StepResult<()>;

    /// Execute the step's main work, recording results in `run`.
    ///
    /// Use `ctx.logger` for logging and `ctx.report_progress()` for progress.
    fn execute(&self, ctx: &Context, run: &mut PipelineRun) -> StepResult<StepOutcome>;

    /// Validate outputs after execution.
    ///
    /// Called after `execute` returns `Success`.
    fn validate_output(&self, ctx: &Context, run: &PipelineRun) -> StepResult<()>;

    /// Human-readable description of what this step does.
    fn description(&self) -> &str {
        self.name()
    }
}
