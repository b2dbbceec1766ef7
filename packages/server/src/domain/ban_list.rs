//! Timed bans keyed by platform identity.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::value_object::{Identity, Timestamp};

/// A ban window: active while `now < start_time + duration`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BanEntry {
    pub start_time: i64,
    pub duration: i64,
}

impl BanEntry {
    pub fn new(start_time: Timestamp, duration_millis: i64) -> Self {
        Self {
            start_time: start_time.value(),
            duration: duration_millis,
        }
    }

    pub fn expires_at(&self) -> i64 {
        self.start_time.saturating_add(self.duration)
    }

    pub fn is_active(&self, now: Timestamp) -> bool {
        now.value() < self.expires_at()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BanList {
    entries: HashMap<Identity, BanEntry>,
}

impl BanList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ban `identity`, replacing any previous entry. Empty identities are ignored.
    pub fn ban(&mut self, identity: Identity, entry: BanEntry) {
        if identity.is_empty() {
            return;
        }
        self.entries.insert(identity, entry);
    }

    pub fn is_banned(&self, identity: &Identity, now: Timestamp) -> bool {
        self.entries
            .get(identity)
            .is_some_and(|entry| entry.is_active(now))
    }

    /// Drop entries whose window has passed.
    pub fn purge_expired(&mut self, now: Timestamp) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.is_active(now));
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
