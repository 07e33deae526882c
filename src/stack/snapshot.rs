//! Snapshots for audit and rollback.
//!
//! A snapshot is a clone of the game state, the stack entries and the
//! resolution state. All three are persistent structures or small values, so
//! taking a snapshot is O(1) and the copy is independent of the live value
//! by construction.
//!
//! The store keeps at most `max_snapshots` entries, evicting the oldest, and
//! optionally drops entries older than `max_age` ticks.

use std::collections::VecDeque;

use im::Vector;
use serde::{Deserialize, Serialize};

use super::effect::StackEffect;
use super::system::StackResolutionState;
use crate::core::{GameState, SnapshotConfig};

/// Unique identifier for a snapshot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SnapshotId(pub u64);

impl std::fmt::Display for SnapshotId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Snapshot({})", self.0)
    }
}

/// A retained copy of everything needed to roll back.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GameStateSnapshot {
    pub id: SnapshotId,
    /// Logical tick at capture.
    pub timestamp: u64,
    pub reason: String,
    pub game_state: GameState,
    pub entries: Vector<StackEffect>,
    pub resolution: StackResolutionState,
}

/// Bounded snapshot retention.
#[derive(Clone, Debug)]
pub struct SnapshotStore {
    snapshots: VecDeque<GameStateSnapshot>,
    config: SnapshotConfig,
    next_id: u64,
}

impl SnapshotStore {
    /// Create an empty store.
    #[must_use]
    pub fn new(config: SnapshotConfig) -> Self {
        Self {
            snapshots: VecDeque::new(),
            config,
            next_id: 1,
        }
    }

    /// Retain a snapshot and return its id.
    pub fn push(
        &mut self,
        now: u64,
        reason: impl Into<String>,
        game_state: GameState,
        entries: Vector<StackEffect>,
        resolution: StackResolutionState,
    ) -> SnapshotId {
        let id = SnapshotId(self.next_id);
        self.next_id += 1;

        self.snapshots.push_back(GameStateSnapshot {
            id,
            timestamp: now,
            reason: reason.into(),
            game_state,
            entries,
            resolution,
        });
        self.prune(now);
        id
    }

    /// Drop snapshots over the count cap or past the age limit.
    ///
    /// The newest snapshot is always kept.
    pub fn prune(&mut self, now: u64) {
        let cap = self.config.max_snapshots.max(1);
        while self.snapshots.len() > cap {
            self.snapshots.pop_front();
        }
        if let Some(max_age) = self.config.max_age {
            while self.snapshots.len() > 1
                && self
                    .snapshots
                    .front()
                    .is_some_and(|s| now.saturating_sub(s.timestamp) > max_age)
            {
                self.snapshots.pop_front();
            }
        }
    }

    /// Get a snapshot by id.
    #[must_use]
    pub fn get(&self, id: SnapshotId) -> Option<&GameStateSnapshot> {
        self.snapshots.iter().find(|s| s.id == id)
    }

    /// Most recent snapshot.
    #[must_use]
    pub fn latest(&self) -> Option<&GameStateSnapshot> {
        self.snapshots.back()
    }

    /// Iterate oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &GameStateSnapshot> {
        self.snapshots.iter()
    }

    /// Number of retained snapshots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Check if no snapshots are retained.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{GameConfig, PlayerId};

    fn push(store: &mut SnapshotStore, now: u64) -> SnapshotId {
        store.push(
            now,
            "test",
            GameState::new(&GameConfig::new(), 1),
            Vector::new(),
            StackResolutionState::idle(PlayerId::ONE),
        )
    }

    #[test]
    fn test_count_cap_evicts_oldest() {
        let mut store = SnapshotStore::new(SnapshotConfig { max_snapshots: 3, ..SnapshotConfig::default() });
        let first = push(&mut store, 0);
        for tick in 1..=3 {
            push(&mut store, tick);
        }

        assert_eq!(store.len(), 3);
        assert!(store.get(first).is_none());
        assert_eq!(store.latest().unwrap().timestamp, 3);
    }

    #[test]
    fn test_age_limit() {
        let mut store = SnapshotStore::new(SnapshotConfig { max_age: Some(5), ..SnapshotConfig::default() });
        let old = push(&mut store, 0);
        let recent = push(&mut store, 4);
        push(&mut store, 8);

        assert!(store.get(old).is_none());
        assert!(store.get(recent).is_some());
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_newest_always_kept() {
        let mut store = SnapshotStore::new(SnapshotConfig { max_snapshots: 0, max_age: Some(0), snapshot_on_begin: true });
        let id = push(&mut store, 10);
        store.prune(100);
        assert!(store.get(id).is_some());
    }
}
