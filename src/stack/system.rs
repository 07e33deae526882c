//! The effect stack state machine.
//!
//! ```text
//!            add_effect                 pass × 2               begin_resolution
//!   Idle ───────────────▶ Open ─────────────────▶ BothPassed ─────────────────▶ Resolving
//!    ▲                     ▲  ▲ add_effect (responses)                              │
//!    │                     │  └──── enqueue_triggered ◀─────────────────────────────┤
//!    └─────────────────────┴────────────── stack empties ◀── resolve_next_effect ───┘
//! ```
//!
//! Entries resolve strictly LIFO. Priority never reorders the stack; it only
//! orders triggered entries pushed in one batch. The speed lock is the
//! fastest speed still on the stack: while a Counter entry is pending only
//! Counter responses may be added.
//!
//! The stack never owns game state. Resolution takes the caller's state by
//! reference and hands back a new one; snapshots keep their own clone.

use im::Vector;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use super::effect::{EffectSource, EffectTarget, RuntimeParams, Speed, StackEffect, StackEffectId};
use super::error::{ResolveFailure, StackError};
use super::snapshot::{GameStateSnapshot, SnapshotId, SnapshotStore};
use crate::cards::CardEffect;
use crate::core::{GameConfig, GameState, PlayerId, PlayerMap, SnapshotConfig};
use crate::effects::{EffectResolver, ResolutionDetail, ResolverContext};
use crate::error::ErrorKind;
use crate::triggers::{GameEvent, TriggeredEffect};

/// Bookkeeping for priority and resolution.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackResolutionState {
    /// Player who may add or pass next.
    pub priority_player: PlayerId,
    /// Slowest speed that may still be added.
    pub speed_lock: Option<Speed>,
    pub passed: PlayerMap<bool>,
    pub consecutive_passes: u32,
    pub resolving: bool,
    /// Set if and only if `resolving`.
    pub resolving_index: Option<usize>,
}

impl StackResolutionState {
    /// Idle bookkeeping with priority on `player`.
    #[must_use]
    pub fn idle(player: PlayerId) -> Self {
        Self {
            priority_player: player,
            speed_lock: None,
            passed: PlayerMap::with_value(false),
            consecutive_passes: 0,
            resolving: false,
            resolving_index: None,
        }
    }

    fn both_passed(&self) -> bool {
        self.passed.iter().all(|(_, passed)| *passed)
    }

    fn reopen(&mut self, priority_player: PlayerId) {
        self.priority_player = priority_player;
        self.passed = PlayerMap::with_value(false);
        self.consecutive_passes = 0;
    }
}

/// Observable phase of the stack.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StackPhase {
    Idle,
    Open,
    BothPassed,
    Resolving,
}

/// Result of a successful pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PassOutcome {
    /// Both players have passed in a row on a non-empty stack.
    pub both_passed: bool,
    /// Holder of priority after the pass.
    pub priority_player: PlayerId,
}

/// Result of resolving one entry.
#[derive(Clone, Debug)]
pub struct ResolutionStep {
    /// State after the effect. The caller adopts it.
    pub state: GameState,
    /// Events for the trigger system.
    pub events: Vec<GameEvent>,
    pub detail: ResolutionDetail,
    /// Snapshot taken before the entry resolved.
    pub snapshot_id: SnapshotId,
    /// Entry removed by a counter effect.
    pub countered: Option<StackEffectId>,
    /// The stack emptied and returned to Idle.
    pub complete: bool,
}

/// The effect stack for one match.
///
/// ## Example
///
/// ```
/// use card_tactics::cards::{CardEffect, EffectParams, HealParams};
/// use card_tactics::core::{GameConfig, GameState, PlayerId};
/// use card_tactics::effects::ResolverId;
/// use card_tactics::stack::{EffectSource, Speed, StackPhase, StackSystem};
///
/// let config = GameConfig::new();
/// let state = GameState::new(&config, 7);
/// let mut stack = StackSystem::from_config(&config);
///
/// let heal = CardEffect::new("1:heal", "Mend", ResolverId::Heal, EffectParams::Heal(HealParams::default()));
/// stack.add_effect(heal, EffectSource::System, PlayerId::ONE, Speed::Action, None, None).unwrap();
///
/// assert_eq!(stack.phase(), StackPhase::Open);
/// assert_eq!(stack.priority_player(), PlayerId::TWO);
///
/// stack.pass_priority(PlayerId::TWO).unwrap();
/// assert!(stack.pass_priority(PlayerId::ONE).unwrap().both_passed);
/// assert!(stack.begin_resolution(&state).is_ok());
/// ```
#[derive(Clone, Debug)]
pub struct StackSystem {
    /// Index 0 = bottom, last = top.
    entries: Vector<StackEffect>,
    resolution: StackResolutionState,
    snapshots: SnapshotStore,
    snapshot_on_begin: bool,
    starting_player: PlayerId,
    resolver: EffectResolver,
    clock: u64,
    next_id: u64,
}

impl StackSystem {
    /// Create an idle stack.
    #[must_use]
    pub fn new(starting_player: PlayerId, snapshots: SnapshotConfig) -> Self {
        Self {
            entries: Vector::new(),
            resolution: StackResolutionState::idle(starting_player),
            snapshot_on_begin: snapshots.snapshot_on_begin,
            snapshots: SnapshotStore::new(snapshots),
            starting_player,
            resolver: EffectResolver::new(),
            clock: 0,
            next_id: 1,
        }
    }

    /// Create an idle stack from match configuration.
    #[must_use]
    pub fn from_config(config: &GameConfig) -> Self {
        Self::new(config.starting_player, config.snapshots.clone())
    }

    // === Inspection ===

    /// Number of entries on the stack.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the stack is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries, bottom to top.
    #[must_use]
    pub fn entries(&self) -> &Vector<StackEffect> {
        &self.entries
    }

    /// The entry that resolves next.
    #[must_use]
    pub fn top(&self) -> Option<&StackEffect> {
        self.entries.back()
    }

    /// Get an entry by id.
    #[must_use]
    pub fn get(&self, id: StackEffectId) -> Option<&StackEffect> {
        self.entries.iter().find(|e| e.id == id)
    }

    #[must_use]
    pub fn resolution_state(&self) -> &StackResolutionState {
        &self.resolution
    }

    #[must_use]
    pub fn priority_player(&self) -> PlayerId {
        self.resolution.priority_player
    }

    #[must_use]
    pub fn speed_lock(&self) -> Option<Speed> {
        self.resolution.speed_lock
    }

    #[must_use]
    pub fn is_resolving(&self) -> bool {
        self.resolution.resolving
    }

    #[must_use]
    pub fn resolving_index(&self) -> Option<usize> {
        self.resolution.resolving_index
    }

    /// Current logical tick.
    #[must_use]
    pub fn now(&self) -> u64 {
        self.clock
    }

    /// Retained snapshots.
    #[must_use]
    pub fn snapshots(&self) -> &SnapshotStore {
        &self.snapshots
    }

    /// Current phase of the state machine.
    #[must_use]
    pub fn phase(&self) -> StackPhase {
        if self.resolution.resolving {
            StackPhase::Resolving
        } else if self.entries.is_empty() {
            StackPhase::Idle
        } else if self.resolution.both_passed() {
            StackPhase::BothPassed
        } else {
            StackPhase::Open
        }
    }

    /// Change the player who receives priority whenever the stack idles.
    ///
    /// Takes effect immediately if the stack is idle.
    pub fn set_starting_player(&mut self, player: PlayerId) {
        self.starting_player = player;
        if self.phase() == StackPhase::Idle {
            self.resolution.priority_player = player;
        }
    }

    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    fn push_entry(&mut self, mut entry: StackEffect) -> StackEffectId {
        entry.id = StackEffectId::new(self.next_id);
        self.next_id += 1;
        entry.created_at = self.tick();
        entry.can_respond = true;

        let id = entry.id;
        self.resolution.speed_lock = self.resolution.speed_lock.max(Some(entry.speed));
        self.entries.push_back(entry);
        id
    }

    fn recompute_speed_lock(&mut self) {
        self.resolution.speed_lock = self.entries.iter().map(|e| e.speed).max();
    }

    fn reset_to_idle(&mut self) {
        self.resolution = StackResolutionState::idle(self.starting_player);
    }

    // === Protocol ===

    /// Push an effect on behalf of `controller`.
    ///
    /// Fails while resolving, below the speed lock, or when the stack is
    /// non-empty and `controller` does not hold priority. On success priority
    /// passes to the opponent and both pass flags clear.
    pub fn add_effect(
        &mut self,
        effect: CardEffect,
        source: EffectSource,
        controller: PlayerId,
        speed: Speed,
        target: Option<EffectTarget>,
        params: Option<RuntimeParams>,
    ) -> Result<StackEffectId, StackError> {
        self.check_open(controller)?;
        self.check_speed(speed)?;
        self.check_priority(controller)?;

        let entry = StackEffect::new(effect, source, controller, speed)
            .with_target(target)
            .with_params(params.unwrap_or_default());
        let id = self.push_entry(entry);
        self.resolution.reopen(controller.opponent());

        debug!(
            %id,
            %controller,
            %speed,
            size = self.entries.len(),
            lock = ?self.resolution.speed_lock,
            "effect added to stack"
        );
        Ok(id)
    }

    /// Add every effect of one card play as a single response.
    ///
    /// Each effect must pass the gates of [`add_effect`](Self::add_effect);
    /// nothing is pushed unless all do. Effects are pushed in order, so the
    /// last one resolves first, and priority passes to the opponent once.
    pub fn add_effects(
        &mut self,
        effects: Vec<CardEffect>,
        source: EffectSource,
        controller: PlayerId,
        target: Option<EffectTarget>,
        params: Option<RuntimeParams>,
    ) -> Result<Vec<StackEffectId>, StackError> {
        self.check_open(controller)?;
        for effect in &effects {
            self.check_speed(effect.speed)?;
        }
        self.check_priority(controller)?;

        let params = params.unwrap_or_default();
        let ids: Vec<StackEffectId> = effects
            .into_iter()
            .map(|effect| {
                let speed = effect.speed;
                let entry = StackEffect::new(effect, source, controller, speed)
                    .with_target(target)
                    .with_params(params);
                self.push_entry(entry)
            })
            .collect();
        if !ids.is_empty() {
            self.resolution.reopen(controller.opponent());
        }

        debug!(count = ids.len(), %controller, size = self.entries.len(), "card effects added to stack");
        Ok(ids)
    }

    fn check_open(&self, controller: PlayerId) -> Result<(), StackError> {
        if !controller.is_valid() {
            return Err(StackError::InvalidPlayer(controller));
        }
        if self.resolution.resolving {
            return Err(StackError::ResolutionInProgress);
        }
        Ok(())
    }

    fn check_priority(&self, controller: PlayerId) -> Result<(), StackError> {
        if !self.entries.is_empty() && controller != self.resolution.priority_player {
            return Err(StackError::NotPriorityHolder {
                player: controller,
                holder: self.resolution.priority_player,
            });
        }
        Ok(())
    }

    fn check_speed(&self, speed: Speed) -> Result<(), StackError> {
        match self.resolution.speed_lock {
            Some(lock) if speed < lock => Err(StackError::SpeedBelowLock { speed, lock }),
            _ => Ok(()),
        }
    }

    /// Pass priority.
    pub fn pass_priority(&mut self, player: PlayerId) -> Result<PassOutcome, StackError> {
        if !player.is_valid() {
            return Err(StackError::InvalidPlayer(player));
        }
        if self.resolution.resolving {
            return Err(StackError::ResolutionInProgress);
        }
        if player != self.resolution.priority_player {
            return Err(StackError::NotPriorityHolder {
                player,
                holder: self.resolution.priority_player,
            });
        }

        self.resolution.passed[player] = true;
        self.resolution.priority_player = player.opponent();
        self.resolution.consecutive_passes += 1;

        let both_passed = !self.entries.is_empty() && self.resolution.both_passed();
        debug!(%player, both_passed, passes = self.resolution.consecutive_passes, "priority passed");

        Ok(PassOutcome {
            both_passed,
            priority_player: self.resolution.priority_player,
        })
    }

    /// Enter the Resolving state.
    ///
    /// Returns the id of the snapshot taken on entry, if the policy takes one.
    pub fn begin_resolution(&mut self, current: &GameState) -> Result<Option<SnapshotId>, StackError> {
        if self.entries.is_empty() {
            return Err(StackError::EmptyStack);
        }
        if self.resolution.resolving {
            return Err(StackError::AlreadyResolving);
        }
        if !self.resolution.both_passed() {
            return Err(StackError::PriorityNotExhausted);
        }

        let snapshot = if self.snapshot_on_begin {
            Some(self.create_game_state_snapshot(current, "begin resolution"))
        } else {
            None
        };

        let top = self.entries.len() - 1;
        self.resolution.resolving = true;
        self.resolution.resolving_index = Some(top);
        if let Some(entry) = self.entries.get_mut(top) {
            entry.can_respond = false;
        }

        debug!(size = self.entries.len(), snapshot = ?snapshot, "resolution started");
        Ok(snapshot)
    }

    /// Resolve the entry at the resolving index.
    ///
    /// On failure the entry stays in place and the returned
    /// [`ResolveFailure`] carries the snapshot taken just before the attempt.
    pub fn resolve_next_effect(&mut self, current: &GameState) -> Result<ResolutionStep, ResolveFailure> {
        if !self.resolution.resolving {
            return Err(ResolveFailure::rejected(StackError::NotResolving));
        }
        let len = self.entries.len();
        let index = match self.resolution.resolving_index {
            Some(index) if index < len => index,
            other => {
                let err = StackError::IndexOutOfRange { index: other.unwrap_or(usize::MAX), len };
                error!(code = err.code(), "resolution state is corrupt");
                return Err(ResolveFailure::rejected(err));
            }
        };
        let Some(entry) = self.entries.get(index).cloned() else {
            return Err(ResolveFailure::rejected(StackError::IndexOutOfRange { index, len }));
        };

        let snapshot_id = self.create_game_state_snapshot(current, format!("resolve {}", entry.effect.name));
        let ctx = ResolverContext::new(&self.entries);

        let resolution = match self.resolver.resolve_effect(&entry, current, &ctx) {
            Ok(resolution) => resolution,
            Err(err) => {
                if err.kind() == ErrorKind::Fatal {
                    error!(id = %entry.id, code = err.code(), error = %err, %snapshot_id, "fatal error during resolution");
                } else {
                    warn!(id = %entry.id, code = err.code(), error = %err, %snapshot_id, "effect failed to resolve");
                }
                return Err(ResolveFailure {
                    error: StackError::Resolution(err),
                    snapshot_id: Some(snapshot_id),
                });
            }
        };

        self.entries.remove(index);
        if let Some(countered) = resolution.countered {
            if let Some(pos) = self.entries.iter().position(|e| e.id == countered) {
                self.entries.remove(pos);
            }
        }
        self.recompute_speed_lock();

        let complete = self.entries.is_empty();
        if complete {
            self.reset_to_idle();
        } else {
            let top = self.entries.len() - 1;
            self.resolution.resolving_index = Some(top);
            if let Some(next) = self.entries.get_mut(top) {
                next.can_respond = false;
            }
        }

        info!(
            id = %entry.id,
            effect = %entry.effect.name,
            remaining = self.entries.len(),
            "{}",
            resolution.detail.description
        );

        Ok(ResolutionStep {
            state: resolution.state,
            events: resolution.events,
            detail: resolution.detail,
            snapshot_id,
            countered: resolution.countered,
            complete,
        })
    }

    /// Push triggered effects produced by the trigger system.
    ///
    /// `triggered` is expected highest priority first; entries are pushed in
    /// reverse so the highest priority ends on top and resolves first. These
    /// pushes are engine-injected and skip the priority and speed checks. Any
    /// resolution in progress ends and the stack reopens with priority on the
    /// opponent of the top entry's controller.
    pub fn enqueue_triggered(&mut self, triggered: Vec<TriggeredEffect>) -> Vec<StackEffectId> {
        if triggered.is_empty() {
            return Vec::new();
        }

        let mut ids: Vec<StackEffectId> = triggered
            .into_iter()
            .rev()
            .map(|t| self.push_entry(t.effect))
            .collect();
        ids.reverse();

        self.resolution.resolving = false;
        self.resolution.resolving_index = None;
        let holder = self
            .top()
            .map_or(self.starting_player, |top| top.controller.opponent());
        self.resolution.reopen(holder);

        debug!(count = ids.len(), size = self.entries.len(), "triggered effects enqueued");
        ids
    }

    /// Drop every entry and reset to Idle. Snapshots are kept.
    ///
    /// Only for fatal-error recovery: pending effects are lost.
    pub fn clear_stack(&mut self) {
        let dropped = self.entries.len();
        self.entries.clear();
        self.reset_to_idle();
        warn!(dropped, "stack cleared");
    }

    // === Snapshots ===

    /// Capture game state, entries and resolution state.
    pub fn create_game_state_snapshot(&mut self, state: &GameState, reason: impl Into<String>) -> SnapshotId {
        let now = self.tick();
        let reason = reason.into();
        let id = self.snapshots.push(
            now,
            reason.clone(),
            state.clone(),
            self.entries.clone(),
            self.resolution.clone(),
        );
        debug!(%id, reason, retained = self.snapshots.len(), "snapshot taken");
        id
    }

    /// Get a retained snapshot.
    #[must_use]
    pub fn snapshot(&self, id: SnapshotId) -> Option<&GameStateSnapshot> {
        self.snapshots.get(id)
    }

    /// Restore entries and resolution state from a snapshot.
    ///
    /// Returns the snapshot's game state for the caller to adopt; the stack
    /// never touches the caller's state itself.
    pub fn rollback_to_snapshot(&mut self, id: SnapshotId) -> Result<GameState, StackError> {
        let snapshot = self.snapshots.get(id).ok_or(StackError::SnapshotNotFound(id))?;
        self.entries = snapshot.entries.clone();
        self.resolution = snapshot.resolution.clone();
        let state = snapshot.game_state.clone();

        debug!(%id, size = self.entries.len(), "rolled back to snapshot");
        Ok(state)
    }

    // === Self-check ===

    /// Check internal consistency. Returns every violated constraint.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut violations = Vec::new();
        let len = self.entries.len();

        let mut seen = std::collections::BTreeSet::new();
        for entry in &self.entries {
            if !Speed::ALL.contains(&entry.speed) {
                violations.push(format!("{} has an unrecognized speed", entry.id));
            }
            if !entry.controller.is_valid() {
                violations.push(format!("{} has invalid controller {}", entry.id, entry.controller));
            }
            if !seen.insert(entry.id) {
                violations.push(format!("{} appears more than once", entry.id));
            }
        }

        match (self.resolution.resolving, self.resolution.resolving_index) {
            (true, None) => violations.push("resolving without a resolving index".to_string()),
            (false, Some(index)) => {
                violations.push(format!("resolving index {} set while not resolving", index));
            }
            (true, Some(index)) if index >= len => {
                violations.push(format!("resolving index {} outside a stack of {}", index, len));
            }
            _ => {}
        }

        match self.resolution.speed_lock {
            Some(lock) if !self.entries.iter().any(|e| e.speed >= lock) => {
                violations.push(format!("speed lock {} not justified by any entry", lock));
            }
            None if len > 0 => violations.push("non-empty stack without a speed lock".to_string()),
            _ => {}
        }

        if !self.resolution.priority_player.is_valid() {
            violations.push(format!("priority held by invalid {}", self.resolution.priority_player));
        }

        violations
    }
}

impl Default for StackSystem {
    fn default() -> Self {
        Self::new(PlayerId::ONE, SnapshotConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::{EffectParams, HealParams};
    use crate::effects::ResolverId;

    fn effect(name: &str) -> CardEffect {
        CardEffect::new(format!("t:{}", name), name, ResolverId::Heal, EffectParams::Heal(HealParams::default()))
    }

    fn add(stack: &mut StackSystem, player: PlayerId, speed: Speed) -> Result<StackEffectId, StackError> {
        stack.add_effect(effect("e"), EffectSource::System, player, speed, None, None)
    }

    #[test]
    fn test_new_stack_is_idle() {
        let stack = StackSystem::default();
        assert_eq!(stack.phase(), StackPhase::Idle);
        assert!(stack.is_empty());
        assert!(stack.validate().is_empty());
    }

    #[test]
    fn test_add_flips_priority() {
        let mut stack = StackSystem::default();
        add(&mut stack, PlayerId::ONE, Speed::Action).unwrap();

        assert_eq!(stack.priority_player(), PlayerId::TWO);
        assert_eq!(stack.speed_lock(), Some(Speed::Action));
        assert_eq!(stack.phase(), StackPhase::Open);
    }

    #[test]
    fn test_non_holder_rejected() {
        let mut stack = StackSystem::default();
        add(&mut stack, PlayerId::ONE, Speed::Action).unwrap();

        let err = add(&mut stack, PlayerId::ONE, Speed::Action).unwrap_err();
        assert_eq!(err.code(), "NOT_PRIORITY_HOLDER");
        assert_eq!(stack.len(), 1);
    }

    #[test]
    fn test_speed_lock() {
        let mut stack = StackSystem::default();
        add(&mut stack, PlayerId::ONE, Speed::Reaction).unwrap();

        let err = add(&mut stack, PlayerId::TWO, Speed::Action).unwrap_err();
        assert_eq!(err, StackError::SpeedBelowLock { speed: Speed::Action, lock: Speed::Reaction });

        add(&mut stack, PlayerId::TWO, Speed::Counter).unwrap();
        assert_eq!(stack.speed_lock(), Some(Speed::Counter));
    }

    #[test]
    fn test_add_clears_passes() {
        let mut stack = StackSystem::default();
        add(&mut stack, PlayerId::ONE, Speed::Action).unwrap();
        stack.pass_priority(PlayerId::TWO).unwrap();
        add(&mut stack, PlayerId::ONE, Speed::Action).unwrap();

        assert_eq!(stack.resolution_state().consecutive_passes, 0);
        assert!(stack.resolution_state().passed.iter().all(|(_, p)| !p));
    }

    #[test]
    fn test_pass_requires_priority() {
        let mut stack = StackSystem::default();
        add(&mut stack, PlayerId::ONE, Speed::Action).unwrap();

        assert!(stack.pass_priority(PlayerId::ONE).is_err());
        let outcome = stack.pass_priority(PlayerId::TWO).unwrap();
        assert!(!outcome.both_passed);
        assert_eq!(outcome.priority_player, PlayerId::ONE);

        let outcome = stack.pass_priority(PlayerId::ONE).unwrap();
        assert!(outcome.both_passed);
        assert_eq!(stack.phase(), StackPhase::BothPassed);
    }

    #[test]
    fn test_passing_on_empty_stack() {
        let mut stack = StackSystem::default();
        assert!(!stack.pass_priority(PlayerId::ONE).unwrap().both_passed);
        assert!(!stack.pass_priority(PlayerId::TWO).unwrap().both_passed);
    }

    #[test]
    fn test_begin_resolution_guards() {
        let state = GameState::new(&GameConfig::new(), 1);
        let mut stack = StackSystem::default();

        assert_eq!(stack.begin_resolution(&state), Err(StackError::EmptyStack));

        add(&mut stack, PlayerId::ONE, Speed::Action).unwrap();
        assert_eq!(stack.begin_resolution(&state), Err(StackError::PriorityNotExhausted));

        stack.pass_priority(PlayerId::TWO).unwrap();
        stack.pass_priority(PlayerId::ONE).unwrap();
        assert!(stack.begin_resolution(&state).unwrap().is_some());
        assert_eq!(stack.resolving_index(), Some(0));
        assert_eq!(stack.begin_resolution(&state), Err(StackError::AlreadyResolving));

        assert_eq!(add(&mut stack, PlayerId::TWO, Speed::Counter), Err(StackError::ResolutionInProgress));
        assert!(stack.validate().is_empty());
    }

    #[test]
    fn test_resolve_requires_resolving() {
        let state = GameState::new(&GameConfig::new(), 1);
        let mut stack = StackSystem::default();
        let failure = stack.resolve_next_effect(&state).unwrap_err();
        assert_eq!(failure.error, StackError::NotResolving);
        assert_eq!(failure.snapshot_id, None);
    }

    #[test]
    fn test_clear_stack() {
        let mut stack = StackSystem::default();
        add(&mut stack, PlayerId::ONE, Speed::Counter).unwrap();
        stack.clear_stack();

        assert_eq!(stack.phase(), StackPhase::Idle);
        assert_eq!(stack.speed_lock(), None);
        assert_eq!(stack.priority_player(), PlayerId::ONE);
    }

    #[test]
    fn test_snapshot_rollback_restores_stack() {
        let state = GameState::new(&GameConfig::new(), 1);
        let mut stack = StackSystem::default();
        add(&mut stack, PlayerId::ONE, Speed::Action).unwrap();

        let id = stack.create_game_state_snapshot(&state, "before response");
        let entries = stack.entries().clone();
        let resolution = stack.resolution_state().clone();

        add(&mut stack, PlayerId::TWO, Speed::Reaction).unwrap();
        let restored = stack.rollback_to_snapshot(id).unwrap();

        assert_eq!(restored, state);
        assert_eq!(stack.entries(), &entries);
        assert_eq!(stack.resolution_state(), &resolution);
    }

    #[test]
    fn test_rollback_unknown_snapshot() {
        let mut stack = StackSystem::default();
        let err = stack.rollback_to_snapshot(SnapshotId(99)).unwrap_err();
        assert_eq!(err.code(), "SNAPSHOT_NOT_FOUND");
    }

    #[test]
    fn test_set_starting_player_when_idle() {
        let mut stack = StackSystem::default();
        stack.set_starting_player(PlayerId::TWO);
        assert_eq!(stack.priority_player(), PlayerId::TWO);
    }

    #[test]
    fn test_validate_detects_unjustified_lock() {
        let mut stack = StackSystem::default();
        add(&mut stack, PlayerId::ONE, Speed::Action).unwrap();
        stack.resolution.speed_lock = Some(Speed::Counter);

        let violations = stack.validate();
        assert_eq!(violations.len(), 1);
        assert!(violations[0].contains("not justified"));
    }

    #[test]
    fn test_add_effects_is_one_response() {
        let mut stack = StackSystem::default();
        let ids = stack
            .add_effects(vec![effect("a"), effect("b")], EffectSource::System, PlayerId::ONE, None, None)
            .unwrap();

        assert_eq!(ids.len(), 2);
        assert_eq!(stack.top().map(|e| e.id), Some(ids[1]));
        assert_eq!(stack.priority_player(), PlayerId::TWO);

        // Player one no longer holds priority, so nothing from the batch lands.
        let err = stack
            .add_effects(vec![effect("c")], EffectSource::System, PlayerId::ONE, None, None)
            .unwrap_err();
        assert_eq!(err.code(), "NOT_PRIORITY_HOLDER");
        assert_eq!(stack.len(), 2);
    }
}
