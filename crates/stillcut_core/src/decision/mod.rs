//! Decision stream analysis.
//!
//! Pure functions over the decimation filter's per-frame verdicts:
//!
//! ```text
//! log lines --parse--> DecisionRecord --reduce--> Segment --select--> Selection
//! ```
//!
//! None of these touch the engine, and none of them fail: malformed input
//! is skipped by the parser and everything downstream is total.

mod parser;
mod reducer;
mod selector;
mod types;

pub use parser::{
    is_diagnostic_line, parse, parse_line, parse_report, ParseReport, DIAGNOSTIC_STAGE_MARKER,
};
pub use reducer::{reduce, terminal_boundary};
pub use selector::select;
pub use types::{Decision, DecisionRecord, DropInterval, Segment, Selection};
