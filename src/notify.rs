//! User-facing notices
//!
//! Out-of-region interactions are rejected with a blocking alert; failed
//! fetches become non-blocking toasts. Both go through a [`NotificationSink`]
//! so that nothing fails silently.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::MapError;

/// How the page should present a notice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    /// Blocking dialog, used for rejected interactions
    Alert,
    /// Non-blocking message, used for failed fetches
    Toast,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl Notice {
    pub fn alert<S: Into<String>>(message: S) -> Self {
        Self {
            level: NoticeLevel::Alert,
            message: message.into(),
            created_at: Utc::now(),
        }
    }

    pub fn toast<S: Into<String>>(message: S) -> Self {
        Self {
            level: NoticeLevel::Toast,
            message: message.into(),
            created_at: Utc::now(),
        }
    }

    /// Notice for a failed workflow. Region rejections are alerts, everything
    /// else is a toast.
    #[must_use]
    pub fn from_error(err: &MapError) -> Self {
        match err {
            MapError::OutOfRegion { .. } => Self::alert(err.user_message()),
            _ => Self::toast(err.user_message()),
        }
    }
}

/// Receives every notice produced by the map workflows
pub trait NotificationSink: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Logs notices and keeps the most recent ones for the page to poll.
#[derive(Debug)]
pub struct RecentNotices {
    capacity: usize,
    notices: Mutex<VecDeque<Notice>>,
}

impl RecentNotices {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            notices: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    /// Oldest first
    #[must_use]
    pub fn snapshot(&self) -> Vec<Notice> {
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }
}

impl Default for RecentNotices {
    fn default() -> Self {
        Self::new(20)
    }
}

impl NotificationSink for RecentNotices {
    fn notify(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Alert => info!(message = %notice.message, "alert"),
            NoticeLevel::Toast => warn!(message = %notice.message, "toast"),
        }

        let mut notices = self.notices.lock().unwrap_or_else(PoisonError::into_inner);
        if notices.len() == self.capacity {
            notices.pop_front();
        }
        notices.push_back(notice);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_levels() {
        let alert = Notice::from_error(&MapError::out_of_region(52.0, 13.0));
        assert_eq!(alert.level, NoticeLevel::Alert);
        assert_eq!(alert.message, "Bitte innerhalb Österreichs klicken.");

        let toast = Notice::from_error(&MapError::api("timeout"));
        assert_eq!(toast.level, NoticeLevel::Toast);
    }

    #[test]
    fn test_recent_notices_drops_oldest() {
        let sink = RecentNotices::new(2);
        sink.notify(Notice::toast("eins"));
        sink.notify(Notice::toast("zwei"));
        sink.notify(Notice::alert("drei"));

        let messages: Vec<_> = sink.snapshot().into_iter().map(|n| n.message).collect();
        assert_eq!(messages, vec!["zwei", "drei"]);
    }

    #[test]
    fn test_level_serializes_lowercase() {
        let json = serde_json::to_value(Notice::toast("x")).unwrap();
        assert_eq!(json["level"], "toast");
    }
}
