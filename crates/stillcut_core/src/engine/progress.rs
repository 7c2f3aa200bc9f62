//! Progress extraction from ffmpeg's stderr.
//!
//! ffmpeg prints the input duration once (`Duration: 00:01:02.50, ...`)
//! and then periodic status lines (`frame= 12 ... time=00:00:04.00 ...`).

use std::sync::LazyLock;

use regex::Regex;

static DURATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Duration:\s*(\d+):(\d{2}):(\d{2}(?:\.\d+)?)").expect("duration pattern is valid")
});

static TIME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"time=\s*(\d+):(\d{2}):(\d{2}(?:\.\d+)?)").expect("time pattern is valid")
});

/// Progress of a running engine invocation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineProgress {
    /// Media time processed so far.
    pub time_secs: f64,
    /// Fraction complete (0.0 - 1.0) when the input duration is known.
    pub ratio: Option<f64>,
}

impl EngineProgress {
    /// Percent complete, clamped to 0..=100.
    pub fn percent(&self) -> Option<u32> {
        self.ratio
            .map(|r| (r.clamp(0.0, 1.0) * 100.0).round() as u32)
    }
}

/// Tracks duration and time markers across the lines of one invocation.
#[derive(Debug, Default)]
pub struct ProgressTracker {
    duration_secs: Option<f64>,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn duration_secs(&self) -> Option<f64> {
        self.duration_secs
    }

    /// Feed one line; returns progress if the line carried a time marker.
    pub fn observe(&mut self, line: &str) -> Option<EngineProgress> {
        if self.duration_secs.is_none() {
            if let Some(secs) = capture_clock(&DURATION, line) {
                self.duration_secs = Some(secs);
                return None;
            }
        }

        let time_secs = capture_clock(&TIME, line)?;
        let ratio = self
            .duration_secs
            .filter(|d| *d > 0.0)
            .map(|d| (time_secs / d).min(1.0));

        Some(EngineProgress { time_secs, ratio })
    }
}

/// Parse an `HH:MM:SS.ss` clock captured by `pattern` into seconds.
fn capture_clock(pattern: &Regex, line: &str) -> Option<f64> {
    let caps = pattern.captures(line)?;
    let hours: f64 = caps.get(1)?.as_str().parse().ok()?;
    let minutes: f64 = caps.get(2)?.as_str().parse().ok()?;
    let seconds: f64 = caps.get(3)?.as_str().parse().ok()?;
    Some(hours * 3600.0 + minutes * 60.0 + seconds)
}
