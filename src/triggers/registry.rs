//! Trigger system.
//!
//! Card effects whose trigger key is not `on_play` become listeners. When an
//! event is processed, every listener for its type whose source is still in
//! play and whose predicates hold produces a stack entry, ready for
//! `StackSystem::enqueue_triggered`.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use super::condition::{speed_for_trigger_key, TriggerCondition, TriggerTiming};
use super::event::{GameEvent, GameEventType};
use crate::cards::CardEffect;
use crate::core::{EntityId, GameState, PlayerId};
use crate::stack::{EffectSource, EffectTarget, RuntimeParams, StackEffect, StackEffectId};

/// Unique identifier for a registered listener.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ListenerId(pub u32);

impl ListenerId {
    /// Create a new listener ID.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for ListenerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Listener({})", self.0)
    }
}

/// A registered trigger.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Listener {
    pub id: ListenerId,
    /// Entry pushed when the trigger fires. Its speed comes from the trigger key.
    pub template: StackEffect,
    pub condition: TriggerCondition,
}

impl Listener {
    /// The source that owns this listener.
    #[must_use]
    pub fn source(&self) -> EffectSource {
        self.template.source
    }

    /// Higher fires first.
    #[must_use]
    pub fn priority(&self) -> i32 {
        self.template.priority
    }
}

/// A trigger that fired, ready for the stack.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TriggeredEffect {
    pub listener: ListenerId,
    pub effect: StackEffect,
    pub timing: TriggerTiming,
    /// The event that caused this trigger.
    pub event: GameEvent,
}

/// Listeners indexed by event type.
#[derive(Clone, Debug, Default)]
pub struct TriggerSystem {
    by_event_type: FxHashMap<GameEventType, Vec<Listener>>,
    next_id: u32,
}

impl TriggerSystem {
    /// Create an empty trigger system.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a card effect as a listener under its trigger key.
    ///
    /// Returns `None` without registering when the key has no event mapping
    /// or the controller is not a valid player.
    pub fn register_trigger(
        &mut self,
        effect: CardEffect,
        source: EffectSource,
        controller: PlayerId,
        target: Option<EffectTarget>,
        params: RuntimeParams,
    ) -> Option<ListenerId> {
        let Some(condition) = TriggerCondition::for_key(&effect.trigger) else {
            debug!(trigger = %effect.trigger, effect = %effect.id, "trigger key has no event mapping");
            return None;
        };
        if !controller.is_valid() {
            warn!(%controller, effect = %effect.id, "refusing trigger for invalid controller");
            return None;
        }

        let speed = speed_for_trigger_key(&effect.trigger);
        if speed != effect.speed {
            warn!(
                effect = %effect.id,
                trigger = %effect.trigger,
                parsed = %effect.speed,
                triggered = %speed,
                "trigger speed differs from parsed speed"
            );
        }

        self.next_id += 1;
        let id = ListenerId::new(self.next_id);
        let template = StackEffect::new(effect, source, controller, speed)
            .with_target(target)
            .with_params(params);

        debug!(%id, event = %condition.event_type, "trigger registered");
        self.by_event_type
            .entry(condition.event_type)
            .or_default()
            .push(Listener { id, template, condition });
        Some(id)
    }

    /// Find every listener that fires for `event`.
    ///
    /// Listeners whose source has left play are skipped. The result is
    /// sorted by priority, highest first; ties keep registration order.
    #[must_use]
    pub fn process_game_event(&self, event: &GameEvent, state: &GameState) -> Vec<TriggeredEffect> {
        let Some(listeners) = self.by_event_type.get(&event.event_type) else {
            return Vec::new();
        };

        let mut fired: Vec<TriggeredEffect> = listeners
            .iter()
            .filter(|l| source_in_play(l.source(), state))
            .filter(|l| l.condition.matches(event))
            .map(|l| {
                let mut effect = l.template.clone();
                if effect.target.is_none() {
                    effect.target = target_from_event(event);
                }
                TriggeredEffect {
                    listener: l.id,
                    effect,
                    timing: l.condition.timing,
                    event: event.clone(),
                }
            })
            .collect();

        fired.sort_by(|a, b| b.effect.priority.cmp(&a.effect.priority));

        if !fired.is_empty() {
            debug!(event = %event.event_type, count = fired.len(), "triggers fired");
        }
        fired
    }

    /// Remove every listener owned by `source`. Returns how many were removed.
    pub fn cleanup_expired_triggers(&mut self, source: &EffectSource) -> usize {
        let mut removed = 0;
        self.by_event_type.retain(|_, listeners| {
            let before = listeners.len();
            listeners.retain(|l| l.source() != *source);
            removed += before - listeners.len();
            !listeners.is_empty()
        });
        if removed > 0 {
            debug!(?source, removed, "expired triggers removed");
        }
        removed
    }

    /// Remove one listener.
    pub fn unregister(&mut self, id: ListenerId) -> Option<Listener> {
        let mut found = None;
        self.by_event_type.retain(|_, listeners| {
            if let Some(pos) = listeners.iter().position(|l| l.id == id) {
                found = Some(listeners.remove(pos));
            }
            !listeners.is_empty()
        });
        found
    }

    /// Listeners for one event type, in registration order.
    #[must_use]
    pub fn listeners_for(&self, event_type: GameEventType) -> &[Listener] {
        self.by_event_type.get(&event_type).map_or(&[], Vec::as_slice)
    }

    /// Total listener count.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_event_type.values().map(Vec::len).sum()
    }

    /// Check if no listeners are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_event_type.is_empty()
    }

    /// Iterate all listeners.
    pub fn iter(&self) -> impl Iterator<Item = &Listener> {
        self.by_event_type.values().flatten()
    }
}

fn source_in_play(source: EffectSource, state: &GameState) -> bool {
    match source {
        EffectSource::Summon(id) => state.summon(id).is_some_and(|s| s.is_active()),
        EffectSource::Building(id) => state.building(id).is_some(),
        EffectSource::Card(_) | EffectSource::PlayedCard { .. } | EffectSource::System => true,
    }
}

/// Default target for a triggered entry registered without one.
fn target_from_event(event: &GameEvent) -> Option<EffectTarget> {
    let payload = event.target.as_ref()?;
    let id_field = |key: &str| payload.get(key).and_then(Value::as_u64);
    let entity = || id_field("id").and_then(|id| u32::try_from(id).ok()).map(EntityId::new);

    match event.event_type {
        GameEventType::SummonDefeated
        | GameEventType::SummonEntersPlay
        | GameEventType::DamageDealt
        | GameEventType::HealingApplied
        | GameEventType::AttackDeclared => entity().map(EffectTarget::Summon),
        GameEventType::BuildingDestroyed => entity().map(EffectTarget::Building),
        GameEventType::CardEntersPlay => {
            id_field("stack_effect").map(|id| EffectTarget::StackEntry(StackEffectId::new(id)))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::{CardEffectParser, CardId, EffectParams, HealParams, ReviveParams};
    use crate::combat::Attributes;
    use crate::core::{GameConfig, Position, RoleFamily};
    use crate::effects::ResolverId;
    use crate::stack::Speed;
    use serde_json::json;

    fn revive_effect() -> CardEffect {
        CardEffect::new(
            "7:return_from_defeat",
            "Second Wind",
            ResolverId::ReturnFromDefeat,
            EffectParams::ReturnFromDefeat(ReviveParams::default()),
        )
        .with_trigger("on_summon_defeated")
        .with_speed(Speed::Counter)
    }

    fn defeat_event(owner: PlayerId, id: u64) -> GameEvent {
        GameEvent::new(GameEventType::SummonDefeated, owner)
            .with_target(json!({ "id": id, "owner": owner.to_string() }))
    }

    #[test]
    fn test_listener_id() {
        let id = ListenerId::new(3);
        assert_eq!(id.raw(), 3);
        assert_eq!(format!("{}", id), "Listener(3)");
    }

    #[test]
    fn test_register_and_fire() {
        let state = GameState::new(&GameConfig::new(), 1);
        let mut triggers = TriggerSystem::new();
        let id = triggers
            .register_trigger(revive_effect(), EffectSource::Card(CardId::new(7)), PlayerId::ONE, None, RuntimeParams::default())
            .unwrap();
        assert_eq!(triggers.len(), 1);

        let fired = triggers.process_game_event(&defeat_event(PlayerId::ONE, 5), &state);
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].listener, id);
        assert_eq!(fired[0].effect.speed, Speed::Counter);
        assert_eq!(fired[0].effect.target, Some(EffectTarget::Summon(EntityId::new(5))));
        assert_eq!(fired[0].timing, TriggerTiming::After);

        // The opponent's summon does not satisfy `target.owner == self`.
        assert!(triggers.process_game_event(&defeat_event(PlayerId::TWO, 6), &state).is_empty());
    }

    #[test]
    fn test_unmapped_key_is_noop() {
        let mut triggers = TriggerSystem::new();
        let effect = revive_effect().with_trigger("on_moon_rise");
        assert!(triggers
            .register_trigger(effect, EffectSource::System, PlayerId::ONE, None, RuntimeParams::default())
            .is_none());
        assert!(triggers.is_empty());
    }

    #[test]
    fn test_invalid_controller_refused() {
        let mut triggers = TriggerSystem::new();
        assert!(triggers
            .register_trigger(revive_effect(), EffectSource::System, PlayerId(7), None, RuntimeParams::default())
            .is_none());
        assert!(triggers.is_empty());
    }

    #[test]
    fn test_trigger_speed_overrides_parsed_speed() {
        let state = GameState::new(&GameConfig::new(), 1);
        let mut triggers = TriggerSystem::new();
        let effect = revive_effect().with_speed(Speed::Action);
        triggers.register_trigger(effect, EffectSource::System, PlayerId::ONE, None, RuntimeParams::default());

        let fired = triggers.process_game_event(&defeat_event(PlayerId::ONE, 2), &state);
        assert_eq!(fired[0].effect.speed, Speed::Counter);
        assert_eq!(fired[0].effect.effect.speed, Speed::Action);
    }

    #[test]
    fn test_sorted_by_priority() {
        let state = GameState::new(&GameConfig::new(), 1);
        let mut triggers = TriggerSystem::new();
        let low = CardEffect::new("1:heal", "Low", ResolverId::Heal, EffectParams::Heal(HealParams::default()))
            .with_trigger("on_turn_start")
            .with_priority(100);
        let high = low.clone().with_priority(150);
        let low_id = triggers.register_trigger(low, EffectSource::System, PlayerId::ONE, None, RuntimeParams::default());
        let high_id = triggers.register_trigger(high, EffectSource::System, PlayerId::TWO, None, RuntimeParams::default());

        let fired = triggers.process_game_event(&GameEvent::new(GameEventType::TurnStarted, PlayerId::ONE), &state);
        let order: Vec<_> = fired.iter().map(|t| Some(t.listener)).collect();
        assert_eq!(order, vec![high_id, low_id]);
    }

    #[test]
    fn test_source_must_be_in_play() {
        let mut state = GameState::new(&GameConfig::new(), 1);
        let guard = state.add_summon(PlayerId::ONE, "Guard", RoleFamily::Warrior, 1, Position::new(0, 0), Attributes::default());
        let mut triggers = TriggerSystem::new();
        let effect = CardEffect::new("2:heal", "Vigil", ResolverId::Heal, EffectParams::Heal(HealParams::default()))
            .with_trigger("on_turn_start");
        triggers.register_trigger(effect, EffectSource::Summon(guard), PlayerId::ONE, None, RuntimeParams::default());

        let event = GameEvent::new(GameEventType::TurnStarted, PlayerId::ONE);
        assert_eq!(triggers.process_game_event(&event, &state).len(), 1);

        state.summons.remove(&guard);
        assert!(triggers.process_game_event(&event, &state).is_empty());
    }

    #[test]
    fn test_cleanup_and_unregister() {
        let mut triggers = TriggerSystem::new();
        let source = EffectSource::Card(CardId::new(7));
        let first = triggers.register_trigger(revive_effect(), source, PlayerId::ONE, None, RuntimeParams::default());
        triggers.register_trigger(revive_effect(), source, PlayerId::ONE, None, RuntimeParams::default());
        let other = triggers
            .register_trigger(revive_effect(), EffectSource::System, PlayerId::TWO, None, RuntimeParams::default())
            .unwrap();

        assert!(first.is_some());
        assert_eq!(triggers.cleanup_expired_triggers(&source), 2);
        assert_eq!(triggers.len(), 1);
        assert_eq!(triggers.unregister(other).map(|l| l.id), Some(other));
        assert!(triggers.is_empty());
    }

    #[test]
    fn test_parsed_card_registers_non_play_effects() {
        let mut effects = serde_json::Map::new();
        effects.insert("heal".into(), json!({ "base_power": 4 }));
        effects.insert("return_from_defeat".into(), json!({}));
        let parsed = CardEffectParser::parse(CardId::new(9), "Phoenix Rite", &effects, None, Speed::Action).unwrap();

        let mut triggers = TriggerSystem::new();
        let registered = parsed
            .into_iter()
            .filter_map(|e| triggers.register_trigger(e, EffectSource::System, PlayerId::ONE, None, RuntimeParams::default()))
            .count();
        assert_eq!(registered, 2);
        assert_eq!(triggers.listeners_for(GameEventType::SummonDefeated).len(), 1);
    }
}
