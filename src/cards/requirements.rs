//! Structured card requirements.
//!
//! Raw requirement objects use a handful of spellings for the same flag
//! (`controls_warrior`, `requires_warrior`, `warrior`). They are normalized
//! here once, at parse time. A requirement object whose every field is at
//! its default is treated as absent.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::RoleFamily;

/// Resources paid when the effect resolves successfully.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct Cost {
    /// Cards discarded from the front of the hand.
    #[serde(alias = "discard_cards")]
    pub discard: u32,
    pub victory_points: u32,
}

impl Cost {
    /// Check whether the cost is free.
    #[must_use]
    pub fn is_free(&self) -> bool {
        self.discard == 0 && self.victory_points == 0
    }
}

/// Conditions the controller must meet before an effect resolves.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct Requirements {
    #[serde(alias = "requires_warrior", alias = "warrior")]
    pub controls_warrior: bool,
    #[serde(alias = "requires_scout", alias = "scout")]
    pub controls_scout: bool,
    #[serde(alias = "requires_magist", alias = "magist")]
    pub controls_magist: bool,
    /// Some active summon of the controller has at least this level.
    #[serde(alias = "level")]
    pub min_level: Option<u8>,
    /// The controller has at least this many active summons.
    pub min_summons: Option<u32>,
    /// The controller owns at least one building.
    pub requires_building: bool,
    pub cost: Cost,
}

impl Requirements {
    /// Normalize a raw requirement object.
    ///
    /// Returns `Ok(None)` when nothing is required.
    pub fn from_value(raw: &Value) -> Result<Option<Self>, serde_json::Error> {
        if raw.is_null() {
            return Ok(None);
        }
        let parsed: Self = serde_json::from_value(raw.clone())?;
        Ok((!parsed.is_empty()).then_some(parsed))
    }

    /// Check whether no requirement is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Role families the controller must control.
    pub fn required_roles(&self) -> impl Iterator<Item = RoleFamily> + '_ {
        [
            (self.controls_warrior, RoleFamily::Warrior),
            (self.controls_scout, RoleFamily::Scout),
            (self.controls_magist, RoleFamily::Magist),
        ]
        .into_iter()
        .filter_map(|(required, role)| required.then_some(role))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_absent_and_empty() {
        assert_eq!(Requirements::from_value(&Value::Null).unwrap(), None);
        assert_eq!(Requirements::from_value(&json!({})).unwrap(), None);
        assert_eq!(Requirements::from_value(&json!({ "warrior": false })).unwrap(), None);
    }

    #[test]
    fn test_aliases() {
        let req = Requirements::from_value(&json!({ "requires_scout": true, "level": 3 }))
            .unwrap()
            .unwrap();
        assert!(req.controls_scout);
        assert_eq!(req.min_level, Some(3));
        assert_eq!(req.required_roles().collect::<Vec<_>>(), vec![RoleFamily::Scout]);
    }

    #[test]
    fn test_cost() {
        let req = Requirements::from_value(&json!({ "cost": { "discard_cards": 1 } }))
            .unwrap()
            .unwrap();
        assert_eq!(req.cost, Cost { discard: 1, victory_points: 0 });
        assert!(!req.cost.is_free());
    }

    #[test]
    fn test_malformed() {
        assert!(Requirements::from_value(&json!({ "min_level": "high" })).is_err());
    }
}
