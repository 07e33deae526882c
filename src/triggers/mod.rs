//! Event-driven triggers.
//!
//! Card effects with a trigger key other than `on_play` listen for game
//! events. Handlers and the match engine raise events; the trigger system
//! matches them against listeners and returns stack entries to push.
//!
//! ## Key Components
//!
//! - [`GameEvent`]: An event with JSON payloads
//! - [`TriggerCondition`]: Event type, predicates and timing for a trigger key
//! - [`TriggerSystem`]: Listener storage and event matching
//!
//! ## Example Usage
//!
//! ```
//! use card_tactics::cards::{CardEffect, CardId, EffectParams, ReviveParams};
//! use card_tactics::core::{GameConfig, GameState, PlayerId};
//! use card_tactics::effects::ResolverId;
//! use card_tactics::stack::{EffectSource, RuntimeParams};
//! use card_tactics::triggers::{GameEvent, GameEventType, TriggerSystem};
//! use serde_json::json;
//!
//! let mut triggers = TriggerSystem::new();
//! let revive = CardEffect::new(
//!     "7:return_from_defeat",
//!     "Second Wind",
//!     ResolverId::ReturnFromDefeat,
//!     EffectParams::ReturnFromDefeat(ReviveParams::default()),
//! )
//! .with_trigger("on_summon_defeated");
//! triggers.register_trigger(revive, EffectSource::Card(CardId::new(7)), PlayerId::ONE, None, RuntimeParams::default());
//!
//! let state = GameState::new(&GameConfig::new(), 42);
//! let event = GameEvent::new(GameEventType::SummonDefeated, PlayerId::ONE)
//!     .with_target(json!({ "id": 3, "owner": "player1" }));
//! assert_eq!(triggers.process_game_event(&event, &state).len(), 1);
//! ```

mod condition;
mod event;
mod registry;

pub use condition::{
    lookup_field, speed_for_trigger_key, ConditionOperator, ConditionValue, Predicate,
    TriggerCondition, TriggerTiming, COUNTER_TRIGGER_KEYS,
};
pub use event::{GameEvent, GameEventType};
pub use registry::{Listener, ListenerId, TriggerSystem, TriggeredEffect};
