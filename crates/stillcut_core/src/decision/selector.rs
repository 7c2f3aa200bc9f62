//! Drop-interval selector.

use super::types::{Decision, DropInterval, Segment, Selection};

/// Select drop spans longer than `duration_threshold` seconds.
///
/// Every `Drop` segment is paired with the boundary that follows it. The
/// pair's duration always counts toward `total_dropped_secs`; it becomes an
/// interval only when the duration strictly exceeds the threshold. `Keep`
/// pairs are never examined.
pub fn select(segments: &[Segment], duration_threshold: f64) -> Selection {
    let mut selection = Selection::default();

    for pair in segments.windows(2) {
        let (current, next) = (&pair[0], &pair[1]);
        if current.decision != Decision::Drop {
            continue;
        }

        let duration = next.start_timestamp - current.start_timestamp;
        selection.total_dropped_secs += duration;

        if duration > duration_threshold {
            selection
                .intervals
                .push(DropInterval::new(current.start_timestamp, next.start_timestamp));
        }
    }

    selection
}
