//! Run logs, printed to stdout and streamed via Server-Sent Events (SSE).
//!
//! Every entry carries the id of the run that produced it so a client
//! watching `/api/logs` can follow its own upload.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Log level for frontend display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// A single log entry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    /// Run that emitted the entry (absent for server-wide messages)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,
    pub level: LogLevel,
    pub message: String,
    /// Nesting depth for display
    #[serde(default)]
    pub indent: u8,
    pub timestamp: DateTime<Utc>,
}

impl LogEntry {
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            run_id: None,
            level,
            message: message.into(),
            indent: 0,
            timestamp: Utc::now(),
        }
    }

    pub fn with_indent(mut self, indent: u8) -> Self {
        self.indent = indent;
        self
    }

    pub fn with_run(mut self, run_id: impl Into<String>) -> Self {
        self.run_id = Some(run_id.into());
        self
    }
}

/// Global log broadcaster
pub static LOG_BROADCASTER: Lazy<LogBroadcaster> = Lazy::new(LogBroadcaster::new);

/// Broadcasts log entries to all connected SSE clients
pub struct LogBroadcaster {
    sender: broadcast::Sender<LogEntry>,
}

impl LogBroadcaster {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(256);
        Self { sender }
    }

    /// Print an entry and send it to all subscribers
    pub fn log(&self, entry: LogEntry) {
        let prefix = match entry.level {
            LogLevel::Info => "   ",
            LogLevel::Success => "   ✓",
            LogLevel::Warning => "   ⚠️",
            LogLevel::Error => "   ❌",
        };
        let indent = "   ".repeat(entry.indent as usize);
        println!("{}{} {}", indent, prefix, entry.message);

        // No receivers is fine
        let _ = self.sender.send(entry);
    }

    /// Get a receiver for SSE streaming
    pub fn subscribe(&self) -> broadcast::Receiver<LogEntry> {
        self.sender.subscribe()
    }
}

impl Default for LogBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

/// Logger bound to one run.
#[derive(Debug, Clone)]
pub struct RunLogger {
    run_id: String,
}

impl RunLogger {
    pub fn new(run_id: impl Into<String>) -> Self {
        Self { run_id: run_id.into() }
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    fn emit(&self, level: LogLevel, msg: impl Into<String>, indent: u8) {
        LOG_BROADCASTER.log(
            LogEntry::new(level, msg)
                .with_indent(indent)
                .with_run(self.run_id.clone()),
        );
    }

    pub fn info(&self, msg: impl Into<String>) {
        self.emit(LogLevel::Info, msg, 0);
    }

    pub fn info_indent(&self, msg: impl Into<String>, indent: u8) {
        self.emit(LogLevel::Info, msg, indent);
    }

    pub fn success(&self, msg: impl Into<String>) {
        self.emit(LogLevel::Success, msg, 0);
    }

    pub fn warning(&self, msg: impl Into<String>) {
        self.emit(LogLevel::Warning, msg, 0);
    }

    pub fn warning_indent(&self, msg: impl Into<String>, indent: u8) {
        self.emit(LogLevel::Warning, msg, indent);
    }

    pub fn error(&self, msg: impl Into<String>) {
        self.emit(LogLevel::Error, msg, 0);
    }
}

/// Server-wide message (no run id).
pub fn log_info(msg: impl Into<String>) {
    LOG_BROADCASTER.log(LogEntry::new(LogLevel::Info, msg));
}
