//! Record key generation.

use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicI64, Ordering};

use crate::config::KeyMode;

pub const KEY_PREFIX: &str = "photo-";

/// Source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Issues `photo-<epoch millis>` keys.
pub struct KeyGenerator {
    mode: KeyMode,
    last_issued: AtomicI64,
}

impl KeyGenerator {
    pub fn new(mode: KeyMode) -> Self {
        Self {
            mode,
            last_issued: AtomicI64::new(i64::MIN),
        }
    }

    /// Never issue a monotonic key at or below `issued`.
    pub fn resume_after(&self, issued: i64) {
        self.last_issued.fetch_max(issued, Ordering::SeqCst);
    }

    pub fn next_key(&self, now: DateTime<Utc>) -> String {
        let millis = now.timestamp_millis();
        let issued = match self.mode {
            KeyMode::Timestamp => millis,
            KeyMode::Monotonic => {
                // Bump past the last issued value when the clock has not advanced.
                let previous = self
                    .last_issued
                    .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                        Some(millis.max(last.saturating_add(1)))
                    })
                    .unwrap_or(millis);
                millis.max(previous.saturating_add(1))
            }
        };
        format!("{}{}", KEY_PREFIX, issued)
    }
}

/// The millisecond value of a `photo-` key, if it is one.
pub fn key_millis(key: &str) -> Option<i64> {
    key.strip_prefix(KEY_PREFIX)?.parse().ok()
}
