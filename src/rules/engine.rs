//! Match coordinator.
//!
//! `MatchEngine` owns everything one match needs: the authoritative game
//! state, the effect stack, the trigger system and the card library. The
//! session layer hands it validated, authenticated player actions one at a
//! time; each call returns immediately with what happened. Waiting for the
//! next response is the caller's business.
//!
//! Per action:
//!
//! 1. The action is checked by [`StateValidator::validate_action`].
//! 2. A checkpoint snapshot is taken.
//! 3. Moves, draws and phase changes mutate state directly. Card plays push
//!    their `on_play` effects and register the rest as one-shot triggers.
//!    Passes may start resolution, which runs until the stack empties,
//!    triggered effects reopen it, or an effect fails.
//! 4. The state and the stack are validated; on failure the checkpoint is
//!    restored.

use serde_json::json;
use thiserror::Error;
use tracing::{debug, error, info};

use super::validator::{StateValidator, ValidationReport};
use crate::cards::{CardId, CardLibrary, ParseError, ON_PLAY};
use crate::core::{ActionKind, EntityId, GameConfig, GameState, PlayerAction, PlayerId, Position};
use crate::effects::ResolutionDetail;
use crate::error::ErrorKind;
use crate::stack::{
    EffectSource, EffectTarget, ResolveFailure, RuntimeParams, SnapshotId, StackError, StackEffectId,
    StackPhase, StackSystem,
};
use crate::triggers::{GameEvent, GameEventType, TriggerSystem, TriggeredEffect};

/// Errors returned by [`MatchEngine`].
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("invalid action: {}", .0.messages().join("; "))]
    InvalidAction(ValidationReport),

    #[error("{0} is not in the card library")]
    UnknownCard(CardId),

    #[error("{0} requires an empty stack")]
    StackNotEmpty(&'static str),

    #[error(transparent)]
    Stack(#[from] StackError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Resolution(#[from] ResolveFailure),

    #[error("state invariants violated, restored {restored}: {}", .violations.join("; "))]
    InvariantViolation {
        violations: Vec<String>,
        restored: SnapshotId,
    },
}

impl EngineError {
    /// Classify the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidAction(_) | Self::StackNotEmpty(_) => ErrorKind::ProtocolViolation,
            Self::UnknownCard(_) => ErrorKind::DispatchFailure,
            Self::Stack(e) => e.kind(),
            Self::Parse(e) => e.kind(),
            Self::Resolution(e) => e.kind(),
            Self::InvariantViolation { .. } => ErrorKind::InvariantFailure,
        }
    }

    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidAction(_) => "INVALID_ACTION",
            Self::UnknownCard(_) => "UNKNOWN_CARD",
            Self::StackNotEmpty(_) => "STACK_NOT_EMPTY",
            Self::Stack(e) => e.code(),
            Self::Parse(e) => e.code(),
            Self::Resolution(e) => e.code(),
            Self::InvariantViolation { .. } => "INVARIANT_VIOLATION",
        }
    }

    /// Snapshot the caller may roll back to, if the error carries one.
    #[must_use]
    pub fn snapshot_id(&self) -> Option<SnapshotId> {
        match self {
            Self::Resolution(failure) => failure.snapshot_id,
            Self::InvariantViolation { restored, .. } => Some(*restored),
            _ => None,
        }
    }
}

/// What one call changed.
#[derive(Clone, Debug)]
pub struct ActionOutcome {
    /// Stack entries pushed, by the action or by triggers.
    pub added: Vec<StackEffectId>,
    /// One record per resolved effect, in resolution order.
    pub resolved: Vec<ResolutionDetail>,
    /// Events raised, in order.
    pub events: Vec<GameEvent>,
    pub stack_phase: StackPhase,
    pub priority_player: PlayerId,
    /// Source of the card this action played. Pass it to
    /// [`MatchEngine::retire_source`] when that card leaves play.
    pub played: Option<EffectSource>,
}

#[derive(Default)]
struct Batch {
    added: Vec<StackEffectId>,
    played: Option<EffectSource>,
    resolved: Vec<ResolutionDetail>,
    events: Vec<GameEvent>,
}

#[derive(Clone, Copy)]
struct Checkpoint {
    snapshot: SnapshotId,
    log_len: usize,
}

/// Runs one match.
///
/// ## Example
///
/// ```
/// use card_tactics::cards::{CardId, CardLibrary};
/// use card_tactics::core::{ActionKind, GameConfig, PlayerAction, PlayerId};
/// use card_tactics::rules::MatchEngine;
///
/// let mut library = CardLibrary::new();
/// library
///     .load_json(r#"[{ "id": 1, "name": "Tribute", "effects": { "gain_victory_points": { "amount": 2 } } }]"#)
///     .unwrap();
///
/// let mut engine = MatchEngine::new(GameConfig::new(), library, 42);
/// engine.state_mut().add_to_hand(PlayerId::ONE, CardId::new(1));
///
/// let (turn, phase) = (engine.state().turn, engine.state().phase);
/// let play = ActionKind::PlayCard { card: CardId::new(1), target: None, actor: None };
/// engine.submit_action(&PlayerAction::new(PlayerId::ONE, turn, phase, play)).unwrap();
/// engine.submit_action(&PlayerAction::new(PlayerId::TWO, turn, phase, ActionKind::PassPriority)).unwrap();
/// let outcome = engine
///     .submit_action(&PlayerAction::new(PlayerId::ONE, turn, phase, ActionKind::PassPriority))
///     .unwrap();
///
/// assert_eq!(outcome.resolved.len(), 1);
/// assert_eq!(engine.state().player(PlayerId::ONE).victory_points, 2);
/// ```
#[derive(Clone, Debug)]
pub struct MatchEngine {
    config: GameConfig,
    state: GameState,
    stack: StackSystem,
    triggers: TriggerSystem,
    library: CardLibrary,
    log: Vec<ResolutionDetail>,
    plays: u32,
}

impl MatchEngine {
    /// Start a match on an empty board.
    #[must_use]
    pub fn new(config: GameConfig, library: CardLibrary, seed: u64) -> Self {
        let state = GameState::new(&config, seed);
        Self::with_state(config, library, state)
    }

    /// Resume a match from an existing state.
    #[must_use]
    pub fn with_state(config: GameConfig, library: CardLibrary, state: GameState) -> Self {
        let mut stack = StackSystem::from_config(&config);
        stack.set_starting_player(state.current_player);
        Self {
            config,
            state,
            stack,
            triggers: TriggerSystem::new(),
            library,
            log: Vec::new(),
            plays: 0,
        }
    }

    // === Accessors ===

    #[must_use]
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// The authoritative game state.
    #[must_use]
    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// Mutable state, for match setup (placing summons, dealing cards).
    pub fn state_mut(&mut self) -> &mut GameState {
        &mut self.state
    }

    #[must_use]
    pub fn stack(&self) -> &StackSystem {
        &self.stack
    }

    #[must_use]
    pub fn triggers(&self) -> &TriggerSystem {
        &self.triggers
    }

    #[must_use]
    pub fn library(&self) -> &CardLibrary {
        &self.library
    }

    /// Every effect resolved so far, oldest first.
    #[must_use]
    pub fn resolution_log(&self) -> &[ResolutionDetail] {
        &self.log
    }

    /// Add cards to the library. Nothing is added if any card is malformed.
    pub fn load_cards(&mut self, json: &str) -> Result<usize, EngineError> {
        Ok(self.library.load_json(json)?)
    }

    // === Actions ===

    /// Apply one player action.
    pub fn submit_action(&mut self, action: &PlayerAction) -> Result<ActionOutcome, EngineError> {
        let report = StateValidator::validate_action(&self.state, action, &self.config);
        if !report.is_valid() {
            debug!(
                player = %action.player,
                action = action.kind.as_str(),
                violations = ?report.messages(),
                "action rejected"
            );
            return Err(EngineError::InvalidAction(report));
        }

        let checkpoint = self.checkpoint(action.kind.as_str());
        let mut batch = Batch::default();
        let player = action.player;

        match &action.kind {
            ActionKind::Move { from, to } => {
                self.require_idle("move")?;
                self.move_summon(*from, *to);
            }
            ActionKind::DrawCard => {
                self.require_idle("draw")?;
                let card = self.state.draw_card(player);
                debug!(%player, card = ?card, "card drawn");
            }
            ActionKind::EndPhase => {
                self.require_idle("end phase")?;
                self.end_phase(&mut batch);
            }
            ActionKind::PlayCard { card, target, actor } => {
                self.play_card(player, *card, *target, *actor, &mut batch)?;
            }
            ActionKind::PassPriority => {
                let outcome = self.stack.pass_priority(player)?;
                if outcome.both_passed {
                    self.stack.begin_resolution(&self.state)?;
                    self.drain(&mut batch)?;
                }
            }
        }

        self.check_invariants(checkpoint)?;
        Ok(self.outcome(batch))
    }

    /// Continue a resolution halted by a failed effect.
    ///
    /// The failed entry is retried. Use [`rollback`](Self::rollback) or
    /// [`abort`](Self::abort) to give up on it instead.
    pub fn resume_resolution(&mut self) -> Result<ActionOutcome, EngineError> {
        if !self.stack.is_resolving() {
            return Err(StackError::NotResolving.into());
        }
        let checkpoint = self.checkpoint("resume");
        let mut batch = Batch::default();
        self.drain(&mut batch)?;
        self.check_invariants(checkpoint)?;
        Ok(self.outcome(batch))
    }

    /// Raise an event from outside the action flow (e.g. an attack
    /// declaration from the combat layer). Returns the entries it triggered.
    pub fn raise_event(&mut self, event: GameEvent) -> Vec<StackEffectId> {
        let mut batch = Batch::default();
        let fired = self.collect_triggered(std::slice::from_ref(&event));
        self.enqueue(fired, &mut batch);
        batch.added
    }

    /// Restore the stack and state from a snapshot.
    pub fn rollback(&mut self, id: SnapshotId) -> Result<(), EngineError> {
        self.state = self.stack.rollback_to_snapshot(id)?;
        info!(%id, stack = self.stack.len(), "match rolled back");
        Ok(())
    }

    /// Drop every pending effect. Pending effects are lost.
    pub fn abort(&mut self) {
        self.stack.clear_stack();
    }

    /// Remove the listeners of a source that left play.
    pub fn retire_source(&mut self, source: EffectSource) -> usize {
        self.triggers.cleanup_expired_triggers(&source)
    }

    // === Internals ===

    fn checkpoint(&mut self, reason: &str) -> Checkpoint {
        Checkpoint {
            snapshot: self.stack.create_game_state_snapshot(&self.state, format!("before {}", reason)),
            log_len: self.log.len(),
        }
    }

    fn require_idle(&self, action: &'static str) -> Result<(), EngineError> {
        if self.stack.is_empty() {
            Ok(())
        } else {
            Err(EngineError::StackNotEmpty(action))
        }
    }

    fn move_summon(&mut self, from: Position, to: Position) {
        let mover = self.state.active_summons().find(|s| s.position == from).map(|s| s.id);
        if let Some(summon) = mover.and_then(|id| self.state.summon_mut(id)) {
            summon.position = to;
            debug!(summon = %summon.id, %from, %to, "summon moved");
        }
    }

    fn end_phase(&mut self, batch: &mut Batch) {
        if let Some(next) = self.config.next_phase(self.state.phase) {
            debug!(from = %self.state.phase, to = %next, "phase advanced");
            self.state.phase = next;
            return;
        }

        let ending = self.state.current_player;
        let ended = GameEvent::new(GameEventType::TurnEnded, ending).with_data("turn", self.state.turn);

        self.state.turn += 1;
        self.state.current_player = ending.opponent();
        self.state.phase = self.config.first_phase();
        self.state.expire_modifiers(self.state.turn);
        self.stack.set_starting_player(self.state.current_player);

        let started = GameEvent::new(GameEventType::TurnStarted, self.state.current_player)
            .with_data("turn", self.state.turn);
        info!(turn = self.state.turn, player = %self.state.current_player, "turn started");

        let events = [ended, started];
        let fired = self.collect_triggered(&events);
        self.enqueue(fired, batch);
        batch.events.extend(events);
    }

    fn play_card(
        &mut self,
        player: PlayerId,
        card: CardId,
        target: Option<EffectTarget>,
        actor: Option<EntityId>,
        batch: &mut Batch,
    ) -> Result<(), EngineError> {
        let name = self
            .library
            .get(card)
            .map(|def| def.name.clone())
            .ok_or(EngineError::UnknownCard(card))?;
        let effects = self.library.effects(card).map(<[_]>::to_vec).unwrap_or_default();
        let (on_play, listeners): (Vec<_>, Vec<_>) = effects.into_iter().partition(|e| e.trigger == ON_PLAY);

        self.plays += 1;
        let source = EffectSource::PlayedCard { card, play: self.plays };
        let params = actor.map(|a| RuntimeParams::default().with_actor(a));
        let ids = self.stack.add_effects(on_play, source, player, target, params)?;

        self.state.remove_from_hand(player, card);
        self.state.player_mut(player).discard.push_back(card);
        for effect in listeners {
            self.triggers
                .register_trigger(effect, source, player, target, params.unwrap_or_default());
        }
        info!(%player, %card, play = self.plays, name = %name, pushed = ids.len(), "card played");
        batch.added.extend(ids.iter().copied());
        batch.played = Some(source);

        let mut event = GameEvent::new(GameEventType::CardEntersPlay, player)
            .with_source(json!({ "card": card.raw(), "play": self.plays, "name": name }));
        if let Some(top) = ids.last() {
            event = event.with_target(json!({ "stack_effect": top.raw(), "card": card.raw() }));
        }

        // A play never answers itself. Other copies of the card may.
        let mut fired = self.collect_triggered(std::slice::from_ref(&event));
        fired.retain(|t| t.effect.source != source);
        self.enqueue(fired, batch);
        batch.events.push(event);
        Ok(())
    }

    /// Resolve until the stack empties, triggers reopen it, the match ends or
    /// an effect fails.
    fn drain(&mut self, batch: &mut Batch) -> Result<(), EngineError> {
        while self.stack.is_resolving() {
            let step = match self.stack.resolve_next_effect(&self.state) {
                Ok(step) => step,
                Err(failure) => {
                    if failure.kind() == ErrorKind::Fatal {
                        error!(code = failure.code(), snapshot = ?failure.snapshot_id, "halting resolution");
                        self.stack.clear_stack();
                    }
                    return Err(failure.into());
                }
            };

            self.state = step.state;
            self.log.push(step.detail.clone());
            batch.resolved.push(step.detail);

            let fired = self.collect_triggered(&step.events);
            batch.events.extend(step.events);
            self.enqueue(fired, batch);

            if self.state.is_completed() {
                info!(status = ?self.state.status, pending = self.stack.len(), "match completed");
                break;
            }
        }
        Ok(())
    }

    fn collect_triggered(&self, events: &[GameEvent]) -> Vec<TriggeredEffect> {
        let mut fired: Vec<TriggeredEffect> = events
            .iter()
            .flat_map(|event| self.triggers.process_game_event(event, &self.state))
            .collect();
        fired.sort_by(|a, b| b.effect.priority.cmp(&a.effect.priority));
        fired
    }

    /// Push fired triggers. Listeners registered by a played card fire once.
    fn enqueue(&mut self, fired: Vec<TriggeredEffect>, batch: &mut Batch) {
        if fired.is_empty() {
            return;
        }
        for triggered in &fired {
            if matches!(triggered.effect.source, EffectSource::Card(_) | EffectSource::PlayedCard { .. }) {
                self.triggers.unregister(triggered.listener);
            }
        }
        batch.added.extend(self.stack.enqueue_triggered(fired));
    }

    fn check_invariants(&mut self, checkpoint: Checkpoint) -> Result<(), EngineError> {
        let mut violations = StateValidator::validate_state(&self.state, &self.config).messages();
        violations.extend(self.stack.validate());
        if violations.is_empty() {
            return Ok(());
        }

        error!(?violations, snapshot = %checkpoint.snapshot, "invariant failure, restoring checkpoint");
        self.state = self.stack.rollback_to_snapshot(checkpoint.snapshot)?;
        self.log.truncate(checkpoint.log_len);
        Err(EngineError::InvariantViolation {
            violations,
            restored: checkpoint.snapshot,
        })
    }

    fn outcome(&self, batch: Batch) -> ActionOutcome {
        ActionOutcome {
            added: batch.added,
            resolved: batch.resolved,
            events: batch.events,
            stack_phase: self.stack.phase(),
            priority_player: self.stack.priority_player(),
            played: batch.played,
        }
    }
}
