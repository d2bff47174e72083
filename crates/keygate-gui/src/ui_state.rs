//! UI-specific state (ephemeral)

use std::collections::VecDeque;

const MAX_LOG_ENTRIES: usize = 200;

/// UI-specific state that doesn't need to be persisted
#[derive(Clone)]
pub struct UiState {
    /// Whether the host wants the key dialog shown
    pub dialog_open: bool,

    /// Whether the dialog may be closed without a key
    pub dialog_dismissible: bool,

    /// Technical log visibility
    pub technical_log_expanded: bool,

    /// Hide info entries in the technical log
    pub log_problems_only: bool,

    /// Technical log entries (max 200)
    pub technical_log: VecDeque<LogEntry>,
}

impl UiState {
    pub fn new() -> Self {
        Self {
            dialog_open: false,
            dialog_dismissible: true,
            technical_log_expanded: false,
            log_problems_only: false,
            technical_log: VecDeque::with_capacity(MAX_LOG_ENTRIES),
        }
    }

    /// Ask for the dialog; `dismissible = false` forces the user through it.
    pub fn open_dialog(&mut self, dismissible: bool) {
        self.dialog_open = true;
        self.dialog_dismissible = dismissible;
    }

    pub fn close_dialog(&mut self) {
        self.dialog_open = false;
    }

    /// Log entries honoring the problems-only filter
    pub fn visible_log_entries(&self) -> impl Iterator<Item = &LogEntry> {
        let problems_only = self.log_problems_only;
        self.technical_log
            .iter()
            .filter(move |entry| !problems_only || entry.level != LogLevel::Info)
    }

    /// Add a log entry, maintaining max 200 entries
    pub fn add_log_entry(&mut self, entry: LogEntry) {
        if self.technical_log.len() >= MAX_LOG_ENTRIES {
            self.technical_log.pop_front();
        }
        self.technical_log.push_back(entry);
    }
}

impl Default for UiState {
    fn default() -> Self {
        Self::new()
    }
}

/// Technical log entry
#[derive(Clone)]
pub struct LogEntry {
    pub timestamp: String,
    pub level: LogLevel,
    pub message: String,
}

/// Log level for coloring
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warning,
    Error,
}
