//! Short-lived search intents awaiting a location.
//!
//! Each identity is either idle or awaiting a location for one intent. A newer
//! intent replaces the old one; an expired one reads as idle and is evicted.

use dashmap::DashMap;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::enrichment::SearchIntent;
use crate::types::Identity;

pub const PENDING_TTL: Duration = Duration::from_secs(300);

#[derive(Debug, Clone)]
pub enum PendingState {
    Idle,
    AwaitingLocation {
        intent: SearchIntent,
        expires_at: Instant,
    },
}

#[derive(Debug)]
pub struct PendingIntentStore {
    entries: DashMap<Identity, PendingState>,
    ttl: Duration,
}

impl Default for PendingIntentStore {
    fn default() -> Self {
        Self::new(PENDING_TTL)
    }
}

impl PendingIntentStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    pub fn set_pending(&self, identity: Identity, intent: SearchIntent) {
        self.set_pending_at(identity, intent, Instant::now());
    }

    pub fn set_pending_at(&self, identity: Identity, intent: SearchIntent, now: Instant) {
        self.entries.insert(
            identity,
            PendingState::AwaitingLocation {
                intent,
                expires_at: now + self.ttl,
            },
        );
    }

    /// The live intent, if any. Does not consume it.
    pub fn get_pending(&self, identity: Identity) -> Option<SearchIntent> {
        self.get_pending_at(identity, Instant::now())
    }

    pub fn get_pending_at(&self, identity: Identity, now: Instant) -> Option<SearchIntent> {
        match self.state_at(identity, now) {
            PendingState::AwaitingLocation { intent, .. } => Some(intent),
            PendingState::Idle => None,
        }
    }

    pub fn state_at(&self, identity: Identity, now: Instant) -> PendingState {
        if self
            .entries
            .remove_if(&identity, |_, state| is_expired(state, now))
            .is_some()
        {
            debug!(identity = %identity, "Pending search intent expired");
            return PendingState::Idle;
        }

        self.entries
            .get(&identity)
            .map(|entry| entry.value().clone())
            .unwrap_or(PendingState::Idle)
    }

    pub fn clear(&self, identity: Identity) {
        self.entries.remove(&identity);
    }

    pub fn contains(&self, identity: Identity) -> bool {
        self.entries.contains_key(&identity)
    }
}

fn is_expired(state: &PendingState, now: Instant) -> bool {
    matches!(state, PendingState::AwaitingLocation { expires_at, .. } if now > *expires_at)
}
