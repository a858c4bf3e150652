//! User-visible notifications.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::Mutex;
use tracing::{info, warn};

pub const WALLET_REQUIRED: &str = "Please connect your wallet first";
pub const SUBMIT_SUCCEEDED: &str = "Claim submitted successfully! Your data is encrypted and secure.";
pub const SUBMIT_FAILED: &str = "Failed to submit claim. Please try again.";

/// Notices kept for the board. Older ones are dropped first.
const BOARD_CAPACITY: usize = 100;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Success,
    Error,
    /// Blocks the action until the user does something (connect a wallet).
    Blocking,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
    pub at: DateTime<Utc>,
}

impl Notice {
    pub fn new(level: NoticeLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            at: Utc::now(),
        }
    }
}

pub trait NoticeSink: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Bounded, newest-last notice history.
#[derive(Default)]
pub struct NoticeBoard {
    notices: Mutex<VecDeque<Notice>>,
}

impl NoticeBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Up to `limit` notices, newest first.
    pub fn recent(&self, limit: usize) -> Vec<Notice> {
        let notices = self.notices.lock().unwrap_or_else(|p| p.into_inner());
        notices.iter().rev().take(limit).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.notices.lock().unwrap_or_else(|p| p.into_inner()).len()
    }
}

impl NoticeSink for NoticeBoard {
    fn notify(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Success => info!(text = %notice.message, "notice"),
            NoticeLevel::Error | NoticeLevel::Blocking => warn!(text = %notice.message, level = ?notice.level, "notice"),
        }

        let mut notices = self.notices.lock().unwrap_or_else(|p| p.into_inner());
        if notices.len() == BOARD_CAPACITY {
            notices.pop_front();
        }
        notices.push_back(notice);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recent_returns_newest_first() {
        let board = NoticeBoard::new();
        board.notify(Notice::new(NoticeLevel::Blocking, WALLET_REQUIRED));
        board.notify(Notice::new(NoticeLevel::Success, SUBMIT_SUCCEEDED));

        let recent = board.recent(10);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].message, SUBMIT_SUCCEEDED);
        assert_eq!(recent[1].level, NoticeLevel::Blocking);
        assert_eq!(board.recent(1).len(), 1);
    }

    #[test]
    fn board_is_bounded() {
        let board = NoticeBoard::new();
        for i in 0..(BOARD_CAPACITY + 5) {
            board.notify(Notice::new(NoticeLevel::Error, format!("n{i}")));
        }
        assert_eq!(board.len(), BOARD_CAPACITY);
        assert_eq!(board.recent(1)[0].message, format!("n{}", BOARD_CAPACITY + 4));
    }
}
