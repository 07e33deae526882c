//! # card-tactics
//!
//! The rules engine of a turn-based tactical card game: what happens when a
//! card or ability is played, in what order competing effects resolve, and
//! how combat math is applied.
//!
//! ## Design Principles
//!
//! 1. **Deterministic**: Same state, same actions, same seed, same result.
//!    Timestamps are logical ticks and critical rolls come from RNG state
//!    stored in the game state.
//!
//! 2. **Caller Owns State**: The stack never holds the authoritative game
//!    state. Resolution takes it by reference and hands back a new one.
//!
//! 3. **Closed Dispatch**: Resolvers, event types and effect parameters are
//!    closed enums, with explicit `Unknown` variants for data-driven content.
//!
//! ## Architecture
//!
//! - **Persistent Data Structures**: O(1) cloning via `im-rs`, so snapshots
//!   are cheap and independent by construction.
//!
//! - **Explicit Results**: Every failure is a typed error with a kind and a
//!   stable code; structural checks return exhaustive violation lists.
//!
//! ## Modules
//!
//! - `core`: Entity IDs, players, board, state, actions, RNG, configuration
//! - `cards`: Card data, effect parsing and the card library
//! - `combat`: Attributes, derived stats, damage and healing formulas
//! - `effects`: Resolver dispatch and effect handlers
//! - `triggers`: Game events and event-driven triggers
//! - `stack`: The effect stack state machine and snapshots
//! - `rules`: State validation and the match coordinator
//! - `error`: Shared error taxonomy

pub mod core;
pub mod cards;
pub mod combat;
pub mod effects;
pub mod triggers;
pub mod stack;
pub mod rules;
pub mod error;

// Re-export commonly used types
pub use crate::core::{
    ActionKind, EntityId, GameConfig, GameRng, GameRngState, GameState, Phase, PlayerAction,
    PlayerId, PlayerMap, Position, SnapshotConfig,
};

pub use crate::cards::{CardEffect, CardEffectParser, CardId, CardLibrary, EffectParams, RawCardDefinition};

pub use crate::combat::{Attributes, DamageStyle, DerivedStats};

pub use crate::effects::{EffectResolver, ResolutionDetail, ResolveError, ResolverContext, ResolverId};

pub use crate::triggers::{GameEvent, GameEventType, TriggerCondition, TriggerSystem, TriggeredEffect};

pub use crate::stack::{
    EffectSource, EffectTarget, GameStateSnapshot, SnapshotId, Speed, StackEffect, StackError,
    StackSystem,
};

pub use crate::rules::{EngineError, MatchEngine, StateValidator, ValidationReport};

pub use crate::error::ErrorKind;
