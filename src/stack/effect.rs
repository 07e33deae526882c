//! Live stack entries.

use serde::{Deserialize, Serialize};

use crate::cards::{CardEffect, CardId};
use crate::core::{EntityId, PlayerId, Position};

/// Response speed tier.
///
/// Once a tier is on the stack, only effects of that tier or faster may be
/// added until it resolves.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Speed {
    #[default]
    Action,
    Reaction,
    Counter,
}

impl Speed {
    /// All tiers, slowest first.
    pub const ALL: [Speed; 3] = [Speed::Action, Speed::Reaction, Speed::Counter];

    /// Base priority of the tier: 100, 200 or 300.
    #[must_use]
    pub const fn base_priority(self) -> i32 {
        match self {
            Self::Action => 100,
            Self::Reaction => 200,
            Self::Counter => 300,
        }
    }

    /// Stable name of the tier.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Action => "action",
            Self::Reaction => "reaction",
            Self::Counter => "counter",
        }
    }
}

impl std::fmt::Display for Speed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unique identifier for a stack entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StackEffectId(pub u64);

impl StackEffectId {
    /// Placeholder for entries that have not been pushed yet.
    pub const UNASSIGNED: StackEffectId = StackEffectId(0);

    /// Create a new stack entry ID.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for StackEffectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "StackEffect({})", self.0)
    }
}

/// What put an effect on the stack.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EffectSource {
    Card(CardId),
    /// One play of a card. Every play is numbered, so copies of the same
    /// card keep separate listeners.
    PlayedCard { card: CardId, play: u32 },
    Summon(EntityId),
    Building(EntityId),
    /// Engine-generated.
    System,
}

/// What an effect is aimed at.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EffectTarget {
    Summon(EntityId),
    Building(EntityId),
    Player(PlayerId),
    Position(Position),
    /// Another entry on the stack (counter effects).
    StackEntry(StackEffectId),
}

/// Per-instance overrides supplied when an effect is added.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RuntimeParams {
    /// Summon whose attributes drive the formulas. Defaults to the source
    /// summon, if the source is one.
    pub actor: Option<EntityId>,
    /// Skip the critical roll and use this result.
    pub force_critical: Option<bool>,
    /// Replace the computed amount.
    pub amount_override: Option<u32>,
}

impl RuntimeParams {
    /// Set the acting summon (builder pattern).
    #[must_use]
    pub fn with_actor(mut self, actor: EntityId) -> Self {
        self.actor = Some(actor);
        self
    }

    /// Force the critical roll (builder pattern).
    #[must_use]
    pub fn with_critical(mut self, critical: bool) -> Self {
        self.force_critical = Some(critical);
        self
    }

    /// Override the computed amount (builder pattern).
    #[must_use]
    pub fn with_amount(mut self, amount: u32) -> Self {
        self.amount_override = Some(amount);
        self
    }
}

/// An effect on the stack.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackEffect {
    pub id: StackEffectId,
    pub effect: CardEffect,
    pub source: EffectSource,
    pub controller: PlayerId,
    pub target: Option<EffectTarget>,
    pub speed: Speed,
    pub priority: i32,
    /// Logical tick at which the entry was pushed.
    pub created_at: u64,
    /// False once the entry is resolving.
    pub can_respond: bool,
    pub params: RuntimeParams,
}

impl StackEffect {
    /// Wrap a card effect. The id and timestamp are assigned when pushed.
    #[must_use]
    pub fn new(effect: CardEffect, source: EffectSource, controller: PlayerId, speed: Speed) -> Self {
        Self {
            id: StackEffectId::UNASSIGNED,
            priority: effect.priority,
            effect,
            source,
            controller,
            target: None,
            speed,
            created_at: 0,
            can_respond: true,
            params: RuntimeParams::default(),
        }
    }

    /// Set the target (builder pattern).
    #[must_use]
    pub fn with_target(mut self, target: Option<EffectTarget>) -> Self {
        self.target = target;
        self
    }

    /// Set runtime parameters (builder pattern).
    #[must_use]
    pub fn with_params(mut self, params: RuntimeParams) -> Self {
        self.params = params;
        self
    }

    /// The acting summon: explicit actor, else the source summon.
    #[must_use]
    pub fn actor(&self) -> Option<EntityId> {
        self.params.actor.or(match self.source {
            EffectSource::Summon(id) => Some(id),
            _ => None,
        })
    }
}
