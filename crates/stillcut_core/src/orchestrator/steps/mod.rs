//! Pipeline step implementations.
//!
//! Each step handles one phase of a run: the diagnostic engine pass,
//! decision parsing, interval selection, and the excising second pass.

mod diagnostic;
mod excise;
mod parse;
mod select;

pub use diagnostic::DiagnosticPassStep;
pub use excise::ExciseStep;
pub use parse::ParseStep;
pub use select::SelectStep;

use crate::decision::is_diagnostic_line;
use crate::engine::{EngineProgress, ExecObserver, LogChannel};

use super::types::Context;

/// Forwards engine events to the run logger and progress callback, and
/// optionally captures decimation-stage lines into a channel.
struct StepObserver<'c, 'a> {
    ctx: &'c Context<'a>,
    step_name: &'c str,
    capture: Option<&'c LogChannel>,
}

impl ExecObserver for StepObserver<'_, '_> {
    fn on_log(&self, line: &str) {
        self.ctx.logger.output_line(line);
        if let Some(channel) = self.capture.filter(|_| is_diagnostic_line(line)) {
            channel.push(line);
        }
    }

    fn on_progress(&self, progress: EngineProgress) {
        let Some(percent) = progress.percent() else {
            return;
        };
        self.ctx.logger.progress(percent, progress.time_secs);
        self.ctx.report_progress(
            self.step_name,
            percent,
            &format!("{}% (transcoded time: {:.1}s)", percent, progress.time_secs),
        );
    }
}

/// Last engine line, for error messages.
fn last_engine_line(ctx: &Context) -> String {
    ctx.logger
        .tail()
        .pop()
        .unwrap_or_else(|| "no engine output".to_string())
}
