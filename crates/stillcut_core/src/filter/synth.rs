//! Selection expression synthesis for the second pass.

use crate::decision::DropInterval;

/// Expression that selects every frame.
pub const IDENTITY_EXPRESSION: &str = "1";

/// Timestamp renormalisation applied after selection so the output
/// timeline stays contiguous.
pub const RENORMALIZE_PTS: &str = "setpts=N/FRAME_RATE/TB";

/// Build the frame-selection expression excluding every interval.
///
/// Each interval contributes "t not in [start, end)"; the predicates are
/// multiplied together (logical AND over 0/1) in ascending order, so a frame
/// survives only if it lies outside every interval. No intervals yields
/// [`IDENTITY_EXPRESSION`].
pub fn synthesize(intervals: &[DropInterval]) -> String {
    if intervals.is_empty() {
        return IDENTITY_EXPRESSION.to_string();
    }

    let mut ordered = intervals.to_vec();
    ordered.sort_by(|a, b| a.start.total_cmp(&b.start));

    ordered
        .iter()
        .map(|i| format!("not(gte(t,{})*lt(t,{}))", i.start, i.end))
        .collect::<Vec<_>>()
        .join("*")
}

/// Full `-vf` value for the second pass: selection plus renormalisation.
pub fn selection_filter(expression: &str) -> String {
    format!("select='{}',{}", expression, RENORMALIZE_PTS)
}
