//! Raw card definitions: the card data boundary.
//!
//! The content layer ships cards as JSON. Each card lists its effects as a
//! map from effect-type key to a parameter object, with optional requirements
//! and a speed tag:
//!
//! ```json
//! {
//!   "id": 7,
//!   "name": "Mend",
//!   "effects": { "heal": { "base_power": 50 } },
//!   "requirements": { "controls_magist": true },
//!   "speed": "action"
//! }
//! ```
//!
//! The parser is the only consumer of this shape.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::stack::Speed;

/// Unique identifier for a card definition.
///
/// This identifies the kind of card ("Mend"), not a copy in a hand.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CardId(pub u32);

impl CardId {
    /// Create a new card ID.
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

impl std::fmt::Display for CardId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Card({})", self.0)
    }
}

/// A card as delivered by the content layer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawCardDefinition {
    pub id: CardId,
    pub name: String,
    /// Effect-type key to parameter object. Key order is preserved.
    #[serde(default)]
    pub effects: Map<String, Value>,
    #[serde(default)]
    pub requirements: Option<Value>,
    /// Default speed for every effect on the card.
    #[serde(default)]
    pub speed: Speed,
}

impl RawCardDefinition {
    /// Create a definition with no effects.
    #[must_use]
    pub fn new(id: CardId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            effects: Map::new(),
            requirements: None,
            speed: Speed::default(),
        }
    }

    /// Add an effect (builder pattern).
    #[must_use]
    pub fn with_effect(mut self, effect_type: impl Into<String>, params: Value) -> Self {
        self.effects.insert(effect_type.into(), params);
        self
    }

    /// Set raw requirements (builder pattern).
    #[must_use]
    pub fn with_requirements(mut self, requirements: Value) -> Self {
        self.requirements = Some(requirements);
        self
    }

    /// Set the speed (builder pattern).
    #[must_use]
    pub fn with_speed(mut self, speed: Speed) -> Self {
        self.speed = speed;
        self
    }

    /// Parse a single definition from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
