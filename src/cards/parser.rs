//! Card effect parser.
//!
//! Turns a card's raw effect map into one [`CardEffect`] per key. Three fixed
//! tables drive the conversion:
//!
//! | effect type                      | resolver             | trigger key              | priority adj. |
//! |----------------------------------|----------------------|--------------------------|---------------|
//! | `heal`                           | `heal`               | `on_play`                | 0             |
//! | `physical_damage`/`melee_damage` | `physical_damage`    | `on_play`                | +5            |
//! | `ranged_damage`/`bow_damage`     | `ranged_damage`      | `on_play`                | +5            |
//! | `magical_damage`                 | `magical_damage`     | `on_play`                | +5            |
//! | `draw_cards`                     | `draw_cards`         | `on_play`                | 0             |
//! | `stat_boost`                     | `stat_boost`         | `on_play`                | +2            |
//! | `damage_shield`                  | `damage_shield`      | `on_attack_declared`     | +10           |
//! | `return_from_defeat`             | `return_from_defeat` | `on_summon_defeated`     | +50           |
//! | `counter_effect`                 | `counter_effect`     | `on_card_played_counter` | +40           |
//! | `destroy_building`               | `destroy_building`   | `on_play`                | +5            |
//! | `gain_victory_points`            | `gain_victory_points`| `on_play`                | 0             |
//!
//! Priority is `base(speed) + adjustment`, with base 100/200/300 for
//! Action/Reaction/Counter. An unknown effect type parses to
//! [`ResolverId::Unknown`] and fails only when it is resolved. A parameter
//! object may override the trigger key with a `"trigger"` string.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

use super::definition::{CardId, RawCardDefinition};
use super::effect::{CardEffect, DamageParams, EffectParams};
use super::requirements::Requirements;
use crate::combat::DamageStyle;
use crate::effects::ResolverId;
use crate::error::ErrorKind;
use crate::stack::Speed;

/// Default trigger key.
pub const ON_PLAY: &str = "on_play";

/// Malformed card data.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("{card}: invalid parameters for `{effect_type}`: {message}")]
    InvalidParams {
        card: CardId,
        effect_type: String,
        message: String,
    },

    #[error("{card}: invalid requirements: {message}")]
    InvalidRequirements { card: CardId, message: String },

    #[error("{0} is already registered")]
    DuplicateCard(CardId),

    #[error("invalid card data: {0}")]
    InvalidJson(String),
}

impl ParseError {
    /// Classify the error.
    pub const fn kind(&self) -> ErrorKind {
        ErrorKind::DispatchFailure
    }

    /// Stable machine-readable code.
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidParams { .. } => "INVALID_PARAMS",
            Self::InvalidRequirements { .. } => "INVALID_REQUIREMENTS",
            Self::DuplicateCard(_) => "DUPLICATE_CARD",
            Self::InvalidJson(_) => "INVALID_CARD_DATA",
        }
    }
}

/// Converts raw card data into [`CardEffect`]s.
#[derive(Clone, Copy, Debug, Default)]
pub struct CardEffectParser;

impl CardEffectParser {
    /// Parse every effect of a raw card definition.
    pub fn parse_definition(def: &RawCardDefinition) -> Result<Vec<CardEffect>, ParseError> {
        Self::parse(def.id, &def.name, &def.effects, def.requirements.as_ref(), def.speed)
    }

    /// Parse one effect per key of `effects`, in key order.
    ///
    /// ```
    /// use card_tactics::cards::{CardEffectParser, CardId};
    /// use card_tactics::effects::ResolverId;
    /// use card_tactics::stack::Speed;
    /// use serde_json::json;
    ///
    /// let raw = json!({ "heal": { "base_power": 50 }, "teleport": {} });
    /// let effects = CardEffectParser::parse(
    ///     CardId::new(1), "Odd Charm", raw.as_object().unwrap(), None, Speed::Action,
    /// ).unwrap();
    ///
    /// assert_eq!(effects[0].resolver, ResolverId::Heal);
    /// assert_eq!(effects[1].resolver, ResolverId::Unknown("teleport".into()));
    /// assert_eq!(effects[1].description, "teleport effect");
    /// ```
    pub fn parse(
        card: CardId,
        name: &str,
        effects: &Map<String, Value>,
        requirements: Option<&Value>,
        speed: Speed,
    ) -> Result<Vec<CardEffect>, ParseError> {
        let requirements = match requirements {
            Some(raw) => Requirements::from_value(raw).map_err(|e| ParseError::InvalidRequirements {
                card,
                message: e.to_string(),
            })?,
            None => None,
        };

        effects
            .iter()
            .map(|(effect_type, raw)| {
                let effect = Self::parse_one(card, name, effect_type, raw, requirements, speed)?;
                debug!(
                    effect = %effect.id,
                    resolver = effect.resolver.as_str(),
                    trigger = %effect.trigger,
                    priority = effect.priority,
                    "parsed card effect"
                );
                Ok(effect)
            })
            .collect()
    }

    fn parse_one(
        card: CardId,
        name: &str,
        effect_type: &str,
        raw: &Value,
        requirements: Option<Requirements>,
        speed: Speed,
    ) -> Result<CardEffect, ParseError> {
        let resolver = Self::resolver_for(effect_type);
        let params = Self::params_for(&resolver, raw).map_err(|e| ParseError::InvalidParams {
            card,
            effect_type: effect_type.to_string(),
            message: e.to_string(),
        })?;

        let trigger = raw
            .get("trigger")
            .and_then(Value::as_str)
            .unwrap_or_else(|| Self::trigger_key_for(effect_type))
            .to_string();

        Ok(CardEffect {
            id: format!("{}:{}", card.raw(), effect_type),
            name: name.to_string(),
            description: Self::describe(effect_type, &params),
            trigger,
            requirements,
            resolver,
            params,
            source_type: effect_type.to_string(),
            priority: Self::priority_for(effect_type, speed),
            speed,
        })
    }

    /// Effect type to resolver.
    #[must_use]
    pub fn resolver_for(effect_type: &str) -> ResolverId {
        match effect_type {
            "melee_damage" => ResolverId::PhysicalDamage,
            "bow_damage" => ResolverId::RangedDamage,
            other => ResolverId::from_name(other),
        }
    }

    /// Effect type to trigger key.
    #[must_use]
    pub fn trigger_key_for(effect_type: &str) -> &'static str {
        match effect_type {
            "return_from_defeat" => "on_summon_defeated",
            "counter_effect" => "on_card_played_counter",
            "damage_shield" => "on_attack_declared",
            _ => ON_PLAY,
        }
    }

    /// `base(speed) + adjustment(effect_type)`.
    #[must_use]
    pub fn priority_for(effect_type: &str, speed: Speed) -> i32 {
        let adjustment = match effect_type {
            "return_from_defeat" => 50,
            "counter_effect" => 40,
            "damage_shield" => 10,
            "physical_damage" | "melee_damage" | "ranged_damage" | "bow_damage" | "magical_damage"
            | "destroy_building" => 5,
            "stat_boost" => 2,
            _ => 0,
        };
        speed.base_priority() + adjustment
    }

    fn params_for(resolver: &ResolverId, raw: &Value) -> Result<EffectParams, serde_json::Error> {
        let params = match resolver {
            ResolverId::Heal => EffectParams::Heal(decode(raw)?),
            ResolverId::PhysicalDamage => damage(DamageStyle::Physical, raw)?,
            ResolverId::RangedDamage => damage(DamageStyle::Ranged, raw)?,
            ResolverId::MagicalDamage => damage(DamageStyle::Magical, raw)?,
            ResolverId::DrawCards => EffectParams::DrawCards(decode(raw)?),
            ResolverId::StatBoost => EffectParams::StatBoost(decode(raw)?),
            ResolverId::DamageShield => EffectParams::DamageShield(decode(raw)?),
            ResolverId::ReturnFromDefeat => EffectParams::ReturnFromDefeat(decode(raw)?),
            ResolverId::CounterEffect => EffectParams::CounterEffect,
            ResolverId::DestroyBuilding => EffectParams::DestroyBuilding,
            ResolverId::GainVictoryPoints => EffectParams::GainVictoryPoints(decode(raw)?),
            ResolverId::Unknown(_) => EffectParams::Unknown { raw: raw.to_string() },
        };
        Ok(params)
    }

    fn describe(effect_type: &str, params: &EffectParams) -> String {
        match params {
            EffectParams::Heal(p) => format!("Restore HP to a summon (power {})", p.base_power),
            EffectParams::Damage { style, params } => {
                format!("Deal {} damage (power {})", style.as_str(), params.power)
            }
            EffectParams::DrawCards(p) if p.count == 1 => "Draw a card".to_string(),
            EffectParams::DrawCards(p) => format!("Draw {} cards", p.count),
            EffectParams::StatBoost(p) => match p.duration_turns {
                Some(turns) => format!("{:+} {} for {} turn(s)", p.amount, p.stat.as_str(), turns),
                None => format!("{:+} {}", p.amount, p.stat.as_str()),
            },
            EffectParams::DamageShield(p) => format!("Shield a summon from {} damage", p.amount),
            EffectParams::ReturnFromDefeat(p) => {
                format!("Return a defeated summon with {}% HP", p.hp_percent)
            }
            EffectParams::CounterEffect => "Counter an effect on the stack".to_string(),
            EffectParams::DestroyBuilding => "Destroy a building".to_string(),
            EffectParams::GainVictoryPoints(p) => format!("Gain {} victory point(s)", p.amount),
            EffectParams::Unknown { .. } => format!("{} effect", effect_type),
        }
    }

    /// Check structural constraints on a parsed effect.
    ///
    /// Returns every violated constraint; an empty list means valid.
    #[must_use]
    pub fn validate(effect: &CardEffect) -> Vec<String> {
        let mut violations = Vec::new();
        if effect.id.is_empty() {
            violations.push("effect id is empty".to_string());
        }
        if effect.name.is_empty() {
            violations.push("effect name is empty".to_string());
        }
        if effect.resolver.as_str().is_empty() {
            violations.push("resolver is empty".to_string());
        }
        if effect.trigger.is_empty() {
            violations.push("trigger key is empty".to_string());
        }
        if effect.priority < 0 {
            violations.push(format!("priority {} is negative", effect.priority));
        }
        violations
    }
}

/// Decode a parameter object. `null` and non-object markers such as `true`
/// count as an empty object.
fn decode<T: DeserializeOwned>(raw: &Value) -> Result<T, serde_json::Error> {
    if raw.is_object() {
        serde_json::from_value(raw.clone())
    } else {
        serde_json::from_value(Value::Object(Map::new()))
    }
}

fn damage(style: DamageStyle, raw: &Value) -> Result<EffectParams, serde_json::Error> {
    let params: DamageParams = decode(raw)?;
    Ok(EffectParams::Damage { style, params })
}
