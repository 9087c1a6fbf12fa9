//! Per-identity sliding-window admission control.

use dashmap::DashMap;
use std::collections::VecDeque;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::types::Identity;

pub const DEFAULT_WINDOW: Duration = Duration::from_secs(60);

/// Tracked identities above which idle windows are pruned on admission.
const PRUNE_THRESHOLD: usize = 1024;

/// Admits at most `limit` requests per identity in any trailing window.
///
/// Windows are sharded by identity; calls for the same identity serialize on
/// their shard entry.
#[derive(Debug, Default)]
pub struct RateGovernor {
    windows: DashMap<Identity, VecDeque<Instant>>,
}

impl RateGovernor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn admit(&self, identity: Identity, limit: usize, window: Duration) -> bool {
        self.admit_at(identity, limit, window, Instant::now())
    }

    pub fn admit_at(&self, identity: Identity, limit: usize, window: Duration, now: Instant) -> bool {
        if limit == 0 {
            return false;
        }

        let admitted = {
            let mut timestamps = self.windows.entry(identity).or_default();
            evict(&mut timestamps, window, now);

            if timestamps.len() < limit {
                timestamps.push_back(now);
                true
            } else {
                debug!(identity = %identity, limit, "Rate limit reached");
                false
            }
        };

        if self.windows.len() > PRUNE_THRESHOLD {
            self.prune_at(window, now);
        }
        admitted
    }

    /// Drop identities with nothing left inside the window.
    pub fn prune_at(&self, window: Duration, now: Instant) {
        self.windows.retain(|_, timestamps| {
            evict(timestamps, window, now);
            !timestamps.is_empty()
        });
    }

    /// Identities currently holding a window.
    pub fn tracked(&self) -> usize {
        self.windows.len()
    }

    /// Requests currently counted against `identity`.
    pub fn in_window(&self, identity: Identity) -> usize {
        self.windows.get(&identity).map(|w| w.len()).unwrap_or(0)
    }
}

fn evict(timestamps: &mut VecDeque<Instant>, window: Duration, now: Instant) {
    while let Some(oldest) = timestamps.front() {
        if now.saturating_duration_since(*oldest) > window {
            timestamps.pop_front();
        } else {
            break;
        }
    }
}
