//! Transient notices that expire on their own.
//!
//! Each notice stores its expiry time; readers pass the current time and
//! only see what has not yet expired. Sticky notices have no expiry and stay
//! until the board is cleared.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// How long a notice stays visible after being posted.
pub const NOTICE_TTL_SECS: i64 = 4;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Notice {
    pub message: String,
    /// `None` never expires.
    pub expires_at: Option<DateTime<Utc>>,
}

impl Notice {
    fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map_or(true, |at| at > now)
    }
}

#[derive(Debug, Clone)]
pub struct NoticeBoard {
    ttl: Duration,
    notices: Vec<Notice>,
}

impl NoticeBoard {
    pub fn new() -> Self {
        Self::with_ttl(Duration::seconds(NOTICE_TTL_SECS))
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self { ttl, notices: vec![] }
    }

    /// Replace whatever is showing with a fresh set of messages.
    pub fn post<I, S>(&mut self, messages: I, now: DateTime<Utc>)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.replace(messages, Some(now + self.ttl));
    }

    /// Replace whatever is showing with messages that stay until cleared.
    pub fn post_sticky<I, S>(&mut self, messages: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.replace(messages, None);
    }

    fn replace<I, S>(&mut self, messages: I, expires_at: Option<DateTime<Utc>>)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.notices = messages
            .into_iter()
            .map(|m| Notice { message: m.into(), expires_at })
            .collect();
    }

    pub fn active(&self, now: DateTime<Utc>) -> Vec<&str> {
        self.notices
            .iter()
            .filter(|n| n.is_live(now))
            .map(|n| n.message.as_str())
            .collect()
    }

    pub fn prune(&mut self, now: DateTime<Utc>) {
        self.notices.retain(|n| n.is_live(now));
    }

    pub fn clear(&mut self) {
        self.notices.clear();
    }
}

impl Default for NoticeBoard {
    fn default() -> Self {
        Self::new()
    }
}
