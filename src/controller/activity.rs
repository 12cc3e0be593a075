//! Operator-facing activity log: what the session did, in plain words.

use std::collections::VecDeque;

use jiff::Timestamp;

/// Oldest lines are dropped past this.
const CAPACITY: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityLevel {
    Info,
    Success,
    Warn,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityLine {
    pub at: Timestamp,
    pub level: ActivityLevel,
    pub text: String,
}

/// Bounded ring of activity lines.
#[derive(Debug, Default)]
pub(super) struct ActivityLog {
    lines: VecDeque<ActivityLine>,
}

impl ActivityLog {
    pub(super) fn push(&mut self, level: ActivityLevel, text: String) {
        if self.lines.len() == CAPACITY {
            self.lines.pop_front();
        }
        self.lines.push_back(ActivityLine {
            at: Timestamp::now(),
            level,
            text,
        });
    }

    pub(super) fn info(&mut self, text: impl Into<String>) {
        self.push(ActivityLevel::Info, text.into());
    }

    pub(super) fn success(&mut self, text: impl Into<String>) {
        self.push(ActivityLevel::Success, text.into());
    }

    pub(super) fn warn(&mut self, text: impl Into<String>) {
        self.push(ActivityLevel::Warn, text.into());
    }

    pub(super) fn error(&mut self, text: impl Into<String>) {
        self.push(ActivityLevel::Error, text.into());
    }

    pub(super) fn clear(&mut self) {
        self.lines.clear();
    }

    pub(super) fn lines(&self) -> Vec<ActivityLine> {
        self.lines.iter().cloned().collect()
    }
}
