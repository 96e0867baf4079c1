//! The execution console shown under the editor.
//!
//! Holds the most recent status messages, oldest first. Entries are also
//! written to `tracing` so that headless runs keep the same record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

/// Maximum number of entries kept.
pub const CONSOLE_CAPACITY: usize = 50;

/// Severity of a console entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsoleLevel {
    Info,
    Success,
    Warn,
    Error,
}

impl fmt::Display for ConsoleLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Info => "info",
            Self::Success => "success",
            Self::Warn => "warn",
            Self::Error => "error",
        };
        f.write_str(s)
    }
}

/// One console line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsoleEntry {
    pub timestamp: DateTime<Utc>,
    pub level: ConsoleLevel,
    pub message: String,
}

impl fmt::Display for ConsoleEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {:>7} {}",
            self.timestamp.format("%H:%M:%S"),
            self.level,
            self.message
        )
    }
}

/// Capped, append-only log of status messages.
#[derive(Debug, Clone, Default)]
pub struct ExecutionConsole {
    entries: VecDeque<ConsoleEntry>,
}

impl ExecutionConsole {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an entry, dropping the oldest once the log is full.
    pub fn push(&mut self, level: ConsoleLevel, message: impl Into<String>) {
        let message = message.into();
        match level {
            ConsoleLevel::Info | ConsoleLevel::Success => {
                tracing::info!(level = %level, "{message}");
            }
            ConsoleLevel::Warn => tracing::warn!("{message}"),
            ConsoleLevel::Error => tracing::error!("{message}"),
        }

        if self.entries.len() == CONSOLE_CAPACITY {
            self.entries.pop_front();
        }
        self.entries.push_back(ConsoleEntry {
            timestamp: Utc::now(),
            level,
            message,
        });
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.push(ConsoleLevel::Info, message);
    }

    pub fn success(&mut self, message: impl Into<String>) {
        self.push(ConsoleLevel::Success, message);
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.push(ConsoleLevel::Warn, message);
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.push(ConsoleLevel::Error, message);
    }

    /// Entries, oldest first.
    pub fn entries(&self) -> impl Iterator<Item = &ConsoleEntry> {
        self.entries.iter()
    }

    /// The newest entry.
    #[must_use]
    pub fn last(&self) -> Option<&ConsoleEntry> {
        self.entries.back()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
