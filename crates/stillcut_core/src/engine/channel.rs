//! Bounded log capture for engine invocations.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, SyncSender};

use super::ExecObserver;

/// Lines captured from one invocation.
#[derive(Debug, Clone, Default)]
pub struct CapturedLog {
    /// Lines in the order the engine emitted them.
    pub lines: Vec<String>,
    /// Lines discarded because the channel was full.
    pub overflow: usize,
}

/// Bounded, buffered channel the engine writes log lines into.
///
/// The engine never blocks on a full channel: excess lines are counted as
/// overflow. The consumer drains it after the invocation has returned.
pub struct LogChannel {
    sender: SyncSender<String>,
    receiver: Receiver<String>,
    overflow: AtomicUsize,
}

impl LogChannel {
    /// Create a channel holding at most `capacity` lines.
    pub fn bounded(capacity: usize) -> Self {
        let (sender, receiver) = mpsc::sync_channel(capacity);
        Self {
            sender,
            receiver,
            overflow: AtomicUsize::new(0),
        }
    }

    /// Push a line, counting it as overflow when the channel is full.
    pub fn push(&self, line: &str) {
        if self.sender.try_send(line.to_string()).is_err() {
            self.overflow.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Number of lines dropped so far.
    pub fn overflow(&self) -> usize {
        self.overflow.load(Ordering::Relaxed)
    }

    /// Close the channel and collect everything buffered.
    pub fn drain(self) -> CapturedLog {
        let Self {
            sender,
            receiver,
            overflow,
        } = self;
        drop(sender);

        CapturedLog {
            lines: receiver.into_iter().collect(),
            overflow: overflow.into_inner(),
        }
    }
}

impl ExecObserver for LogChannel {
    fn on_log(&self, line: &str) {
        self.push(line);
    }
}
