//! Strictly increasing message timestamps

use chrono::Utc;
use std::sync::atomic::{AtomicI64, Ordering};

/// Issues millisecond timestamps that never repeat or go backwards.
///
/// Several placeholders are often created within the same millisecond; each
/// still receives a distinct, increasing timestamp.
#[derive(Debug, Default)]
pub struct MessageClock {
    last: AtomicI64,
}

impl MessageClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next(&self) -> i64 {
        self.next_after(Utc::now().timestamp_millis())
    }

    fn next_after(&self, now: i64) -> i64 {
        let mut issued = now;
        let _ = self
            .last
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                issued = now.max(last + 1);
                Some(issued)
            });
        issued
    }
}
