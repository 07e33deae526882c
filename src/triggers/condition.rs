//! Trigger conditions.
//!
//! A condition names the event type it listens for, a list of predicates
//! that must all hold, and a timing tag. Predicates address event fields by
//! dotted path:
//!
//! - `controller` is the event's acting player
//! - `source.*` and `target.*` descend into the source and target payloads
//! - `data.*` descends into the data map; a bare unknown segment is looked
//!   up in the data map too
//!
//! The values `"self"` and `"opponent"` resolve against the acting player
//! before comparison. A predicate whose field is missing never holds.
//!
//! Trigger keys on card effects map to conditions through a fixed table:
//!
//! | key                      | event               | predicates            | timing  |
//! |--------------------------|---------------------|-----------------------|---------|
//! | `on_play`                | `CARD_ENTERS_PLAY`  |                       | after   |
//! | `on_card_played_counter` | `CARD_ENTERS_PLAY`  |                       | before  |
//! | `on_summon_enters`       | `SUMMON_ENTERS_PLAY`|                       | after   |
//! | `on_summon_defeated`     | `SUMMON_DEFEATED`   | `target.owner == self`| after   |
//! | `instead_of_defeat`      | `SUMMON_DEFEATED`   | `target.owner == self`| instead |
//! | `on_damage_taken`        | `DAMAGE_DEALT`      | `data.amount > 0`     | after   |
//! | `on_heal`                | `HEALING_APPLIED`   | `data.amount > 0`     | after   |
//! | `on_attack_declared`     | `ATTACK_DECLARED`   |                       | before  |
//! | `on_building_destroyed`  | `BUILDING_DESTROYED`|                       | after   |
//! | `on_turn_start`          | `TURN_STARTED`      |                       | after   |
//! | `on_turn_end`            | `TURN_ENDED`        |                       | after   |
//! | `on_effect_countered`    | `EFFECT_COUNTERED`  |                       | after   |

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::event::{GameEvent, GameEventType};
use crate::stack::Speed;

/// Trigger keys whose effects the trigger system treats as Counter speed.
pub const COUNTER_TRIGGER_KEYS: [&str; 4] = [
    "on_summon_defeated",
    "on_card_played_counter",
    "instead_of_defeat",
    "on_attack_declared",
];

/// Speed the trigger system assigns to effects registered under `key`.
#[must_use]
pub fn speed_for_trigger_key(key: &str) -> Speed {
    if COUNTER_TRIGGER_KEYS.contains(&key) {
        Speed::Counter
    } else {
        Speed::Action
    }
}

/// When a trigger fires relative to its event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerTiming {
    /// Before the event resolves (can respond to it).
    Before,
    /// After the event resolves (most common).
    #[default]
    After,
    /// Instead of the event (replacement effect).
    Instead,
}

/// Comparison applied by a predicate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionOperator {
    Equals,
    NotEquals,
    GreaterThan,
    LessThan,
    Contains,
}

/// Right-hand side of a predicate.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ConditionValue {
    Literal(Value),
    /// `"self"`: the event's acting player.
    ActingPlayer,
    /// `"opponent"`: the other player.
    Opponent,
}

impl ConditionValue {
    /// Interpret a raw value, recognizing `"self"` and `"opponent"`.
    #[must_use]
    pub fn from_raw(raw: Value) -> Self {
        match raw.as_str() {
            Some("self") => Self::ActingPlayer,
            Some("opponent") => Self::Opponent,
            _ => Self::Literal(raw),
        }
    }

    fn resolve(&self, event: &GameEvent) -> Value {
        match self {
            Self::Literal(value) => value.clone(),
            Self::ActingPlayer => Value::String(event.player.to_string()),
            Self::Opponent => Value::String(event.player.opponent().to_string()),
        }
    }
}

/// One field comparison.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Predicate {
    pub field: String,
    pub operator: ConditionOperator,
    pub value: ConditionValue,
}

impl Predicate {
    /// Create a predicate.
    ///
    /// ```
    /// use card_tactics::core::PlayerId;
    /// use card_tactics::triggers::{ConditionOperator, GameEvent, GameEventType, Predicate};
    /// use serde_json::json;
    ///
    /// let own_summon = Predicate::new("target.owner", ConditionOperator::Equals, "self");
    /// let event = GameEvent::new(GameEventType::SummonDefeated, PlayerId::ONE)
    ///     .with_target(json!({ "owner": "player1" }));
    /// assert!(own_summon.evaluate(&event));
    /// ```
    #[must_use]
    pub fn new(field: impl Into<String>, operator: ConditionOperator, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            operator,
            value: ConditionValue::from_raw(value.into()),
        }
    }

    /// Check the predicate against an event.
    #[must_use]
    pub fn evaluate(&self, event: &GameEvent) -> bool {
        let Some(actual) = lookup_field(event, &self.field) else {
            return false;
        };
        let expected = self.value.resolve(event);

        match self.operator {
            ConditionOperator::Equals => loose_eq(&actual, &expected),
            ConditionOperator::NotEquals => !loose_eq(&actual, &expected),
            ConditionOperator::GreaterThan => compare(&actual, &expected).is_some_and(|o| o.is_gt()),
            ConditionOperator::LessThan => compare(&actual, &expected).is_some_and(|o| o.is_lt()),
            ConditionOperator::Contains => contains(&actual, &expected),
        }
    }
}

/// Event type, predicates and timing for one trigger key.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TriggerCondition {
    pub event_type: GameEventType,
    pub predicates: Vec<Predicate>,
    pub timing: TriggerTiming,
}

impl TriggerCondition {
    /// Listen for `event_type` after it happens, with no predicates.
    #[must_use]
    pub fn on(event_type: GameEventType) -> Self {
        Self {
            event_type,
            predicates: Vec::new(),
            timing: TriggerTiming::After,
        }
    }

    /// Add a predicate (builder pattern).
    #[must_use]
    pub fn with_predicate(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    /// Set the timing (builder pattern).
    #[must_use]
    pub fn with_timing(mut self, timing: TriggerTiming) -> Self {
        self.timing = timing;
        self
    }

    /// Check the event type and every predicate.
    #[must_use]
    pub fn matches(&self, event: &GameEvent) -> bool {
        self.event_type == event.event_type && self.predicates.iter().all(|p| p.evaluate(event))
    }

    /// Condition for a trigger key, or `None` if the key is not triggerable.
    #[must_use]
    pub fn for_key(key: &str) -> Option<Self> {
        use ConditionOperator::{Equals, GreaterThan};
        use GameEventType::*;

        let condition = match key {
            "on_play" => Self::on(CardEntersPlay),
            "on_card_played_counter" => Self::on(CardEntersPlay).with_timing(TriggerTiming::Before),
            "on_summon_enters" => Self::on(SummonEntersPlay),
            "on_summon_defeated" => {
                Self::on(SummonDefeated).with_predicate(Predicate::new("target.owner", Equals, "self"))
            }
            "instead_of_defeat" => Self::on(SummonDefeated)
                .with_predicate(Predicate::new("target.owner", Equals, "self"))
                .with_timing(TriggerTiming::Instead),
            "on_damage_taken" => Self::on(DamageDealt).with_predicate(Predicate::new("data.amount", GreaterThan, 0)),
            "on_heal" => Self::on(HealingApplied).with_predicate(Predicate::new("data.amount", GreaterThan, 0)),
            "on_attack_declared" => Self::on(AttackDeclared).with_timing(TriggerTiming::Before),
            "on_building_destroyed" => Self::on(BuildingDestroyed),
            "on_turn_start" => Self::on(TurnStarted),
            "on_turn_end" => Self::on(TurnEnded),
            "on_effect_countered" => Self::on(EffectCountered),
            _ => return None,
        };
        Some(condition)
    }
}

/// Resolve a dotted path against an event.
#[must_use]
pub fn lookup_field(event: &GameEvent, path: &str) -> Option<Value> {
    let mut segments = path.split('.');
    let head = segments.next()?;

    let root = match head {
        "controller" => Value::String(event.player.to_string()),
        "source" => event.source.clone()?,
        "target" => event.target.clone()?,
        "data" => Value::Object(event.data.clone()),
        other => event.data.get(other)?.clone(),
    };

    segments.try_fold(root, |value, segment| match value {
        Value::Object(mut map) => map.remove(segment),
        Value::Array(mut items) => {
            let index: usize = segment.parse().ok()?;
            (index < items.len()).then(|| items.swap_remove(index))
        }
        _ => None,
    })
}

fn loose_eq(a: &Value, b: &Value) -> bool {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}

fn compare(a: &Value, b: &Value) -> Option<std::cmp::Ordering> {
    a.as_f64()?.partial_cmp(&b.as_f64()?)
}

fn contains(haystack: &Value, needle: &Value) -> bool {
    match haystack {
        Value::String(s) => needle.as_str().is_some_and(|n| s.contains(n)),
        Value::Array(items) => items.iter().any(|item| loose_eq(item, needle)),
        Value::Object(map) => needle.as_str().is_some_and(|key| map.contains_key(key)),
        _ => false,
    }
}
