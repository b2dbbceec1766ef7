//! Public/private player slot accounting.
//!
//! `public_used + public_free == max_players - private_slots` and
//! `private_used + private_free == private_slots` hold after every call: the
//! free counts are derived, and acquire/release refuse to leave the bounds.

use serde::Serialize;

use super::error::RepositoryError;

/// Which pool a connection draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotKind {
    Public,
    Private,
}

impl SlotKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Private => "private",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotPool {
    max_players: u32,
    private_slots: u32,
    public_used: u32,
    private_used: u32,
}

impl SlotPool {
    /// `private_slots` is clamped to `max_players`.
    pub fn new(max_players: u32, private_slots: u32) -> Self {
        Self {
            max_players,
            private_slots: private_slots.min(max_players),
            public_used: 0,
            private_used: 0,
        }
    }

    pub fn public_capacity(&self) -> u32 {
        self.max_players - self.private_slots
    }

    pub fn private_capacity(&self) -> u32 {
        self.private_slots
    }

    pub fn public_used(&self) -> u32 {
        self.public_used
    }

    pub fn private_used(&self) -> u32 {
        self.private_used
    }

    pub fn public_free(&self) -> u32 {
        self.public_capacity() - self.public_used
    }

    pub fn private_free(&self) -> u32 {
        self.private_capacity() - self.private_used
    }

    pub fn is_public_full(&self) -> bool {
        self.public_free() == 0
    }

    pub fn is_private_full(&self) -> bool {
        self.private_free() == 0
    }

    pub fn total_used(&self) -> u32 {
        self.public_used + self.private_used
    }

    /// Pick the pool for a newly joining client.
    ///
    /// Invited clients go to a private slot while one is free.
    pub fn kind_for(&self, invited: bool) -> SlotKind {
        if invited && !self.is_private_full() {
            SlotKind::Private
        } else {
            SlotKind::Public
        }
    }

    pub fn acquire(&mut self, kind: SlotKind) -> Result<(), RepositoryError> {
        match kind {
            SlotKind::Public if !self.is_public_full() => self.public_used += 1,
            SlotKind::Private if !self.is_private_full() => self.private_used += 1,
            _ => return Err(RepositoryError::NoSlotAvailable(kind.as_str())),
        }
        Ok(())
    }

    /// Give a slot back. Releasing from an empty pool is a no-op.
    pub fn release(&mut self, kind: SlotKind) {
        match kind {
            SlotKind::Public => self.public_used = self.public_used.saturating_sub(1),
            SlotKind::Private => self.private_used = self.private_used.saturating_sub(1),
        }
    }
}
