//! Write throttling for streamed content.
//!
//! The in-memory accumulator is authoritative; the throttle only decides
//! when the accumulated content is pushed outward, and at what weight.

use crate::config::ThrottleConfig;
use tokio::time::Instant;

/// What to do with the accumulated content after a delta
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteDecision {
    /// Keep buffering
    Skip,
    /// Lightweight update (progress notifier only)
    Notify,
    /// Persist to the store (and notify)
    Persist,
}

#[derive(Debug, Clone)]
pub struct WriteThrottle {
    config: ThrottleConfig,
    last_notify: Instant,
    last_persist: Instant,
    unnotified_chars: usize,
    unpersisted_chars: usize,
}

impl WriteThrottle {
    pub fn new(config: ThrottleConfig, now: Instant) -> Self {
        Self {
            config,
            last_notify: now,
            last_persist: now,
            unnotified_chars: 0,
            unpersisted_chars: 0,
        }
    }

    /// Account for `chars` new characters arriving at `now`.
    pub fn record(&mut self, chars: usize, now: Instant) -> WriteDecision {
        self.unnotified_chars += chars;
        self.unpersisted_chars += chars;

        let since_persist = now.saturating_duration_since(self.last_persist);
        if since_persist >= self.config.persist_interval
            || self.unpersisted_chars >= self.config.persist_chars
        {
            self.last_persist = now;
            self.last_notify = now;
            self.unpersisted_chars = 0;
            self.unnotified_chars = 0;
            return WriteDecision::Persist;
        }

        let since_notify = now.saturating_duration_since(self.last_notify);
        if since_notify >= self.config.ui_interval || self.unnotified_chars >= self.config.ui_chars
        {
            self.last_notify = now;
            self.unnotified_chars = 0;
            return WriteDecision::Notify;
        }

        WriteDecision::Skip
    }
}
