//! Decision stream types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Per-frame verdict emitted by the decimation filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    /// Frame differs enough from its predecessor to be kept.
    Keep,
    /// Frame is a near-duplicate and would be decimated.
    Drop,
}

impl Decision {
    /// Parse the token used in the engine's diagnostic output.
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "keep" => Some(Decision::Keep),
            "drop" => Some(Decision::Drop),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Keep => "keep",
            Decision::Drop => "drop",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One analysed frame: what the filter decided and when.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DecisionRecord {
    pub decision: Decision,
    pub timestamp_secs: f64,
}

impl DecisionRecord {
    pub fn new(decision: Decision, timestamp_secs: f64) -> Self {
        Self {
            decision,
            timestamp_secs,
        }
    }
}

/// Boundary event: the point at which the stream switched to `decision`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub decision: Decision,
    pub start_timestamp: f64,
}

impl Segment {
    pub fn new(decision: Decision, start_timestamp: f64) -> Self {
        Self {
            decision,
            start_timestamp,
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.decision, self.start_timestamp)
    }
}

/// Contiguous span eligible for excision. Always `end > start`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DropInterval {
    pub start: f64,
    pub end: f64,
}

impl DropInterval {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    /// Length of the span in seconds.
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// Output of the drop-interval selector.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    /// Drop spans longer than the threshold, ascending.
    pub intervals: Vec<DropInterval>,
    /// Sum of every drop span, retained or not.
    pub total_dropped_secs: f64,
}

impl Selection {
    /// Seconds that the second pass will actually remove.
    pub fn excised_secs(&self) -> f64 {
        self.intervals.iter().map(DropInterval::duration).sum()
    }

    pub fn is_identity(&self) -> bool {
        self.intervals.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decision_tokens_round_trip() {
        assert_eq!(Decision::from_token("keep"), Some(Decision::Keep));
        assert_eq!(Decision::from_token("drop"), Some(Decision::Drop));
        assert_eq!(Decision::from_token("DROP"), None);
        assert_eq!(Decision::Drop.to_string(), "drop");
    }

    #[test]
    fn selection_sums_excised_span() {
        let selection = Selection {
            intervals: vec![DropInterval::new(1.0, 6.0), DropInterval::new(10.0, 14.5)],
            total_dropped_secs: 11.0,
        };
        assert!((selection.excised_secs() - 9.5).abs() < f64::EPSILON);
        assert!(!selection.is_identity());
    }

    #[test]
    fn segment_displays_compactly() {
        assert_eq!(Segment::new(Decision::Keep, 6.0).to_string(), "keep@6");
    }
}
