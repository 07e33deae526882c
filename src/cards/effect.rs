//! Parsed card effects.
//!
//! A [`CardEffect`] is the immutable, typed form of one entry in a card's
//! raw effect map. Its parameters are an [`EffectParams`] variant that
//! carries only the fields its family needs; they are checked once by the
//! parser and never re-validated at resolution time.

use serde::{Deserialize, Serialize};

use super::requirements::Requirements;
use crate::combat::{DamageStyle, StatKind};
use crate::effects::ResolverId;
use crate::stack::Speed;

/// Parameters for `heal`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct HealParams {
    pub base_power: u32,
}

/// Parameters for the damage families.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct DamageParams {
    /// Weapon power for physical and ranged damage, base power for magical.
    #[serde(alias = "weapon_power", alias = "base_power")]
    pub power: u32,
}

/// Parameters for `draw_cards`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct DrawParams {
    #[serde(alias = "amount")]
    pub count: u32,
}

impl Default for DrawParams {
    fn default() -> Self {
        Self { count: 1 }
    }
}

/// Parameters for `stat_boost`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StatBoostParams {
    pub stat: StatKind,
    pub amount: i32,
    /// Number of turns the modifier lasts, counting the current one.
    /// `None` lasts until the summon leaves play.
    #[serde(default, alias = "duration")]
    pub duration_turns: Option<u32>,
}

/// Parameters for `damage_shield`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct ShieldParams {
    pub amount: u32,
}

/// Parameters for `return_from_defeat`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviveParams {
    /// Percentage of max HP restored.
    pub hp_percent: u32,
}

impl Default for ReviveParams {
    fn default() -> Self {
        Self { hp_percent: 50 }
    }
}

/// Parameters for `gain_victory_points`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct VictoryPointParams {
    pub amount: u32,
}

impl Default for VictoryPointParams {
    fn default() -> Self {
        Self { amount: 1 }
    }
}

/// Typed parameters, one variant per effect family.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EffectParams {
    Heal(HealParams),
    Damage { style: DamageStyle, params: DamageParams },
    DrawCards(DrawParams),
    StatBoost(StatBoostParams),
    DamageShield(ShieldParams),
    ReturnFromDefeat(ReviveParams),
    CounterEffect,
    DestroyBuilding,
    GainVictoryPoints(VictoryPointParams),
    /// Parameters of an effect type with no handler, kept verbatim as JSON.
    Unknown { raw: String },
}

/// An immutable effect descriptor produced by the parser.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardEffect {
    /// `"<card id>:<effect type>"`.
    pub id: String,
    pub name: String,
    pub description: String,
    /// Trigger key such as `"on_play"` or `"on_summon_defeated"`.
    pub trigger: String,
    pub requirements: Option<Requirements>,
    pub resolver: ResolverId,
    pub params: EffectParams,
    /// Raw effect-type key the parameters came from.
    pub source_type: String,
    pub priority: i32,
    /// Speed the card declared for this effect.
    pub speed: Speed,
}

impl CardEffect {
    /// Create a bare effect that fires on play at the base priority of `speed`.
    ///
    /// Mostly useful for tests and engine-generated effects; content goes
    /// through [`CardEffectParser`](super::CardEffectParser).
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, resolver: ResolverId, params: EffectParams) -> Self {
        let name = name.into();
        Self {
            id: id.into(),
            description: format!("{} effect", resolver.as_str()),
            source_type: resolver.as_str().to_string(),
            name,
            trigger: "on_play".to_string(),
            requirements: None,
            resolver,
            params,
            priority: Speed::Action.base_priority(),
            speed: Speed::Action,
        }
    }

    /// Set the trigger key (builder pattern).
    #[must_use]
    pub fn with_trigger(mut self, trigger: impl Into<String>) -> Self {
        self.trigger = trigger.into();
        self
    }

    /// Set the priority (builder pattern).
    #[must_use]
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Set the declared speed (builder pattern).
    #[must_use]
    pub fn with_speed(mut self, speed: Speed) -> Self {
        self.speed = speed;
        self
    }

    /// Set requirements (builder pattern).
    #[must_use]
    pub fn with_requirements(mut self, requirements: Requirements) -> Self {
        self.requirements = Some(requirements);
        self
    }
}
