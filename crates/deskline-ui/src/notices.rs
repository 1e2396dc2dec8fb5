use std::collections::VecDeque;
use std::time::{Duration, Instant};

use deskline_domain::Notice;

struct ActiveNotice {
    notice: Notice,
    expires_at: Instant,
}

/// Toast queue drawn over the current screen. Every notice lives for
/// the configured TTL and then falls off on the next prune.
pub struct NoticeQueue {
    ttl: Duration,
    entries: VecDeque<ActiveNotice>,
}

impl NoticeQueue {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: VecDeque::new(),
        }
    }

    pub fn push(&mut self, notice: Notice) {
        self.push_at(notice, Instant::now());
    }

    pub fn push_at(&mut self, notice: Notice, now: Instant) {
        self.entries.push_back(ActiveNotice {
            notice,
            expires_at: now + self.ttl,
        });
    }

    /// Drops expired notices. Returns whether anything fell off.
    pub fn prune(&mut self) -> bool {
        self.prune_at(Instant::now())
    }

    pub fn prune_at(&mut self, now: Instant) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.expires_at > now);
        self.entries.len() != before
    }

    pub fn visible(&self) -> impl Iterator<Item = &Notice> {
        self.entries.iter().map(|entry| &entry.notice)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
