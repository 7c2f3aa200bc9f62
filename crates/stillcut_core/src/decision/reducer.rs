//! Run reducer: collapses the per-frame stream into boundary segments.

use super::types::{Decision, DecisionRecord, Segment};

/// Timestamp of the terminal `Keep` boundary for `records`.
///
/// This is the record count, i.e. the index one past the last record. The
/// diagnostic pass samples one frame per second, so index and seconds
/// coincide and a trailing drop run is closed one unit past its last frame.
pub fn terminal_boundary(records: &[DecisionRecord]) -> f64 {
    records.len() as f64
}

/// Reduce decision records to alternating keep/drop segments.
///
/// A segment is emitted whenever the decision changes, the first record
/// always emits, and a terminal `Keep` boundary is appended under the same
/// rule. The result therefore always ends in `Keep`, and every `Drop`
/// segment has a following boundary.
pub fn reduce(records: &[DecisionRecord]) -> Vec<Segment> {
    let mut segments: Vec<Segment> = Vec::new();

    let sentinel = DecisionRecord::new(Decision::Keep, terminal_boundary(records));

    for record in records.iter().chain(std::iter::once(&sentinel)) {
        let changed = segments
            .last()
            .map_or(true, |last| last.decision != record.decision);
        if changed {
            segments.push(Segment::new(record.decision, record.timestamp_secs));
        }
    }

    segments
}

#[cfg(test)]
mod tests {
    use super::*;
    use Decision::{Drop, Keep};

    fn records(spec: &[(Decision, f64)]) -> Vec<DecisionRecord> {
        spec.iter()
            .map(|&(d, t)| DecisionRecord::new(d, t))
            .collect()
    }

    fn changes(records: &[DecisionRecord]) -> usize {
        let mut decisions: Vec<Decision> = records.iter().map(|r| r.decision).collect();
        decisions.push(Keep);
        decisions.windows(2).filter(|w| w[0] != w[1]).count()
    }

    #[test]
    fn scenario_collapses_duplicate_drops() {
        let input = records(&[(Keep, 0.0), (Drop, 1.0), (Drop, 5.0), (Keep, 6.0)]);
        let segments = reduce(&input);

        assert_eq!(
            segments,
            vec![
                Segment::new(Keep, 0.0),
                Segment::new(Drop, 1.0),
                Segment::new(Keep, 6.0),
            ]
        );
    }

    #[test]
    fn trailing_drop_run_is_closed_by_terminal_boundary() {
        let input = records(&[(Keep, 0.0), (Keep, 1.0), (Drop, 2.0), (Drop, 3.0)]);
        let segments = reduce(&input);

        assert_eq!(segments.len(), 3);
        assert_eq!(segments[1], Segment::new(Drop, 2.0));
        assert_eq!(segments[2], Segment::new(Keep, 4.0));
    }

    #[test]
    fn empty_stream_yields_only_terminal_boundary() {
        assert_eq!(reduce(&[]), vec![Segment::new(Keep, 0.0)]);
    }

    #[test]
    fn stream_starting_with_drop() {
        let input = records(&[(Drop, 0.0), (Drop, 1.0), (Keep, 2.0)]);
        let segments = reduce(&input);

        assert_eq!(segments[0], Segment::new(Drop, 0.0));
        assert_eq!(segments.last(), Some(&Segment::new(Keep, 2.0)));
    }

    #[test]
    fn segment_count_follows_alternations_not_run_lengths() {
        // Same alternation pattern, different duplicate counts per run.
        let patterns: [&[usize]; 4] = [&[1, 1, 1], &[5, 2, 9], &[1, 7], &[3, 3, 3, 3, 3]];

        for runs in patterns {
            let mut input = Vec::new();
            let mut t = 0.0;
            for (i, &len) in runs.iter().enumerate() {
                let decision = if i % 2 == 0 { Keep } else { Drop };
                for _ in 0..len {
                    input.push(DecisionRecord::new(decision, t));
                    t += 1.0;
                }
            }

            let segments = reduce(&input);
            assert_eq!(segments.len(), changes(&input) + 1, "runs {:?}", runs);
            assert!(segments.windows(2).all(|w| w[0].decision != w[1].decision));
            assert_eq!(segments.last().map(|s| s.decision), Some(Keep));
        }
    }
}
