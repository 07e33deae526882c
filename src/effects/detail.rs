//! Resolution records for logging and replay.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::cards::CardId;
use crate::combat::StatKind;
use crate::core::{EntityId, PlayerId};
use crate::stack::StackEffectId;

/// One discrete change made by an effect.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StateChange {
    HpChanged { entity: EntityId, before: u32, after: u32 },
    ShieldChanged { entity: EntityId, before: u32, after: u32 },
    ModifierAdded {
        entity: EntityId,
        stat: StatKind,
        amount: i32,
        expires_after_turn: Option<u32>,
    },
    SummonDefeated { entity: EntityId },
    SummonReturned { entity: EntityId, hp: u32 },
    CardsDrawn { player: PlayerId, cards: Vec<CardId> },
    CardsDiscarded { player: PlayerId, cards: Vec<CardId> },
    VictoryPointsChanged { player: PlayerId, before: u32, after: u32 },
    BuildingDestroyed { entity: EntityId },
    EffectCountered { effect: StackEffectId },
    MatchCompleted { winner: Option<PlayerId> },
}

/// What one resolved effect did.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionDetail {
    pub effect_id: StackEffectId,
    pub effect_name: String,
    /// Human-readable summary, e.g. "Knight healed for 18 HP".
    pub description: String,
    /// Entities touched, in order of first touch.
    pub affected: SmallVec<[EntityId; 4]>,
    pub changes: Vec<StateChange>,
}

impl ResolutionDetail {
    /// Start an empty record for an effect.
    #[must_use]
    pub fn new(effect_id: StackEffectId, effect_name: impl Into<String>) -> Self {
        Self {
            effect_id,
            effect_name: effect_name.into(),
            description: String::new(),
            affected: SmallVec::new(),
            changes: Vec::new(),
        }
    }

    /// Record an affected entity once.
    pub fn touch(&mut self, entity: EntityId) {
        if !self.affected.contains(&entity) {
            self.affected.push(entity);
        }
    }

    /// Record a change.
    pub fn record(&mut self, change: StateChange) {
        self.changes.push(change);
    }
}
