//! Per-sender rate limiting.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use mcu_plugin_api::PlayerId;

/// Last successful request time per sender. Entries are never removed by
/// disconnects; an old entry simply compares as "not limited".
#[derive(Debug)]
pub struct CooldownTracker {
    window: Duration,
    last_issued: HashMap<PlayerId, Instant>,
}

impl CooldownTracker {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_issued: HashMap::new(),
        }
    }

    /// Time left before `sender` may issue again, or `None` if not limited.
    pub fn remaining(&self, sender: PlayerId, now: Instant) -> Option<Duration> {
        let last = self.last_issued.get(&sender)?;
        let elapsed = now.saturating_duration_since(*last);
        if elapsed < self.window {
            Some(self.window - elapsed)
        } else {
            None
        }
    }

    /// Record a request at `now`. The stored time only ever moves forward.
    pub fn record(&mut self, sender: PlayerId, now: Instant) {
        self.last_issued
            .entry(sender)
            .and_modify(|last| *last = (*last).max(now))
            .or_insert(now);
    }

    pub fn last_issued(&self, sender: PlayerId) -> Option<Instant> {
        self.last_issued.get(&sender).copied()
    }

    pub fn clear(&mut self) {
        self.last_issued.clear();
    }
}

/// Round a remaining duration up to whole seconds, so "limited" never reads as 0.
pub fn whole_secs_ceil(remaining: Duration) -> u64 {
    let secs = remaining.as_secs();
    if remaining.subsec_nanos() > 0 {
        secs + 1
    } else {
        secs
    }
}
