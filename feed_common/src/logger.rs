//! Injectable logging collaborator for the feed components.
//!
//! Components receive a `FeedLogger` instead of writing to a global target,
//! so a test can hand in a `MemoryLogger` and assert on exactly what was
//! reported. Production code uses `LogSink`, which forwards every event to the
//! `log` facade under the `feed` target.
use std::sync::Mutex;

use log::{debug, error, info};

/// Target used by [`LogSink`] for every event.
pub const LOG_TARGET: &str = "feed";

/// Receiver of informational and error events.
pub trait FeedLogger {
    /// Records an informational event.
    fn info(&self, message: &str);

    /// Records an error event.
    fn error(&self, message: &str);

    /// Records a low-level progress event. Ignored unless overridden.
    fn debug(&self, _message: &str) {}
}

impl<L: FeedLogger + ?Sized> FeedLogger for &L {
    fn info(&self, message: &str) {
        (**self).info(message)
    }

    fn error(&self, message: &str) {
        (**self).error(message)
    }

    fn debug(&self, message: &str) {
        (**self).debug(message)
    }
}

/// Forwards events to the `log` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl FeedLogger for LogSink {
    fn info(&self, message: &str) {
        info!(target: LOG_TARGET, "{}", message);
    }

    fn error(&self, message: &str) {
        error!(target: LOG_TARGET, "{}", message);
    }

    fn debug(&self, message: &str) {
        debug!(target: LOG_TARGET, "{}", message);
    }
}

/// Severity of a captured event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    /// Informational event.
    Info,
    /// Error event.
    Error,
    /// Progress event.
    Debug,
}

/// One event captured by [`MemoryLogger`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    /// Event severity.
    pub level: Level,
    /// Rendered message.
    pub message: String,
}

/// Keeps every event in memory, in order.
#[derive(Debug, Default)]
pub struct MemoryLogger {
    entries: Mutex<Vec<LogEntry>>,
}

impl MemoryLogger {
    /// Creates an empty logger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all captured events.
    pub fn entries(&self) -> Vec<LogEntry> {
        self.lock().clone()
    }

    /// Messages captured at `level`.
    pub fn messages(&self, level: Level) -> Vec<String> {
        self.lock()
            .iter()
            .filter(|e| e.level == level)
            .map(|e| e.message.clone())
            .collect()
    }

    /// Error messages captured so far.
    pub fn errors(&self) -> Vec<String> {
        self.messages(Level::Error)
    }

    fn push(&self, level: Level, message: &str) {
        self.lock().push(LogEntry {
            level,
            message: message.to_owned(),
        });
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<LogEntry>> {
        // A panicking writer cannot leave the vector half-updated.
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl FeedLogger for MemoryLogger {
    fn info(&self, message: &str) {
        self.push(Level::Info, message);
    }

    fn error(&self, message: &str) {
        self.push(Level::Error, message);
    }

    fn debug(&self, message: &str) {
        self.push(Level::Debug, message);
    }
}
