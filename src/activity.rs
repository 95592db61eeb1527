use bevy::prelude::Resource;
use chrono::{DateTime, Local};
use std::collections::VecDeque;

use crate::config::MAX_LOG_MESSAGES;

#[derive(Clone, Debug)]
pub struct LogMessage {
    pub clock_time: DateTime<Local>,
    pub message: String,
}

/// Operator-facing history of edits and save results.
#[derive(Debug, Default, Resource)]
pub struct ActivityLog {
    pub logs: VecDeque<LogMessage>,
}

impl ActivityLog {
    pub fn new() -> Self {
        Self {
            logs: VecDeque::with_capacity(MAX_LOG_MESSAGES),
        }
    }

    pub fn clear_logs(&mut self) {
        self.logs.clear();
    }

    pub fn push_log(&mut self, message: impl Into<String>) {
        let log_msg = LogMessage {
            clock_time: Local::now(),
            message: message.into(),
        };

        if self.logs.len() >= MAX_LOG_MESSAGES {
            self.logs.pop_front();
        }
        self.logs.push_back(log_msg);
    }
}
