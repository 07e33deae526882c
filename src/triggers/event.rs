//! Game events.
//!
//! Events are raised by effect handlers and by the match engine, and carry
//! JSON payloads so trigger predicates can address their fields by dotted
//! path (`target.owner`, `data.amount`). Players inside payloads are written
//! as `"player1"` / `"player2"`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::core::PlayerId;

/// The closed set of event types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GameEventType {
    CardEntersPlay,
    SummonEntersPlay,
    SummonDefeated,
    DamageDealt,
    HealingApplied,
    AttackDeclared,
    BuildingDestroyed,
    TurnStarted,
    TurnEnded,
    EffectCountered,
    VictoryPointsGained,
}

impl GameEventType {
    /// Wire name, e.g. `"SUMMON_DEFEATED"`.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::CardEntersPlay => "CARD_ENTERS_PLAY",
            Self::SummonEntersPlay => "SUMMON_ENTERS_PLAY",
            Self::SummonDefeated => "SUMMON_DEFEATED",
            Self::DamageDealt => "DAMAGE_DEALT",
            Self::HealingApplied => "HEALING_APPLIED",
            Self::AttackDeclared => "ATTACK_DECLARED",
            Self::BuildingDestroyed => "BUILDING_DESTROYED",
            Self::TurnStarted => "TURN_STARTED",
            Self::TurnEnded => "TURN_ENDED",
            Self::EffectCountered => "EFFECT_COUNTERED",
            Self::VictoryPointsGained => "VICTORY_POINTS_GAINED",
        }
    }
}

impl std::fmt::Display for GameEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A game event with contextual data.
///
/// `player` is the acting player: the one who played the card, dealt the
/// damage or gained the points. For `SummonDefeated` and `SummonEntersPlay`
/// it is the summon's owner.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameEvent {
    pub event_type: GameEventType,
    pub player: PlayerId,
    pub source: Option<Value>,
    pub target: Option<Value>,
    pub data: Map<String, Value>,
}

impl GameEvent {
    /// Create a new event with no payload.
    #[must_use]
    pub fn new(event_type: GameEventType, player: PlayerId) -> Self {
        Self {
            event_type,
            player,
            source: None,
            target: None,
            data: Map::new(),
        }
    }

    /// Set the source payload (builder pattern). `Null` leaves it unset.
    #[must_use]
    pub fn with_source(mut self, source: Value) -> Self {
        self.source = (!source.is_null()).then_some(source);
        self
    }

    /// Set the target payload (builder pattern). `Null` leaves it unset.
    #[must_use]
    pub fn with_target(mut self, target: Value) -> Self {
        self.target = (!target.is_null()).then_some(target);
        self
    }

    /// Add a data field (builder pattern).
    #[must_use]
    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }
}
