//! Decision log parser.
//!
//! Turns raw engine diagnostic lines into [`DecisionRecord`]s. Parsing is
//! two explicit steps per line:
//!
//! 1. [`is_diagnostic_line`] - keep only lines emitted by the decimation stage
//! 2. regex match for `keep|drop ... pts_time:<seconds>`
//!
//! Lines failing either step are skipped; the engine log is full of
//! unrelated chatter at debug verbosity.

use std::sync::LazyLock;

use regex::Regex;

use super::types::{Decision, DecisionRecord};

/// Substring identifying lines from the decimation filter stage.
pub const DIAGNOSTIC_STAGE_MARKER: &str = "mpdecimate";

static DECISION_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(keep|drop)\s+pts:\S*\s+pts_time:(\d+(?:\.\d+)?)")
        .expect("decision line pattern is valid")
});

/// Result of parsing with bookkeeping about skipped lines.
#[derive(Debug, Clone, Default)]
pub struct ParseReport {
    /// Parsed records in observation order.
    pub records: Vec<DecisionRecord>,
    /// Lines that carried the stage marker.
    pub considered: usize,
    /// Marker lines that did not match the decision pattern.
    pub unmatched: Vec<String>,
}

/// Whether a line originates from the decimation stage.
pub fn is_diagnostic_line(line: &str) -> bool {
    line.contains(DIAGNOSTIC_STAGE_MARKER)
}

/// Parse a single line, if it is a decision line.
pub fn parse_line(line: &str) -> Option<DecisionRecord> {
    let caps = DECISION_LINE.captures(line)?;
    let decision = Decision::from_token(caps.get(1)?.as_str())?;
    let timestamp_secs = caps.get(2)?.as_str().parse::<f64>().ok()?;
    Some(DecisionRecord::new(decision, timestamp_secs))
}

/// Parse diagnostic lines into decision records.
pub fn parse<I, S>(lines: I) -> Vec<DecisionRecord>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    parse_report(lines).records
}

/// Parse diagnostic lines, also reporting marker lines that failed to match.
pub fn parse_report<I, S>(lines: I) -> ParseReport
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut report = ParseReport::default();

    for line in lines {
        let line = line.as_ref();
        if !is_diagnostic_line(line) {
            continue;
        }
        report.considered += 1;

        match parse_line(line) {
            Some(record) => report.records.push(record),
            None => report.unmatched.push(line.to_string()),
        }
    }

    report
}
