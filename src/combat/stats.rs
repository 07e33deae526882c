//! Attributes and derived stats.
//!
//! Derived stats are closed-form functions of a summon's attributes and
//! level. Players can compute them by hand, so the formulas are fixed:
//!
//! ```text
//! max_hp      = 50 + VIT × 5 + level × 10
//! movement    = 2 + SPD / 5
//! to_hit      = min(95, 60 + ACC + LCK / 2)     (percent)
//! crit_chance = min(50, 5 + LCK / 2)            (percent)
//! ```

use serde::{Deserialize, Serialize};

/// Raw summon attributes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct Attributes {
    pub strength: u32,
    pub intelligence: u32,
    pub accuracy: u32,
    pub defense: u32,
    pub magic_defense: u32,
    pub spirit: u32,
    pub speed: u32,
    pub luck: u32,
    pub vitality: u32,
}

/// An attribute that effects can modify.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatKind {
    Strength,
    Intelligence,
    Accuracy,
    Defense,
    MagicDefense,
    Spirit,
    Speed,
    Luck,
    Vitality,
}

impl StatKind {
    /// Stable name of the stat.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Strength => "strength",
            Self::Intelligence => "intelligence",
            Self::Accuracy => "accuracy",
            Self::Defense => "defense",
            Self::MagicDefense => "magic_defense",
            Self::Spirit => "spirit",
            Self::Speed => "speed",
            Self::Luck => "luck",
            Self::Vitality => "vitality",
        }
    }
}

impl Attributes {
    /// Read one attribute.
    #[must_use]
    pub fn get(&self, stat: StatKind) -> u32 {
        match stat {
            StatKind::Strength => self.strength,
            StatKind::Intelligence => self.intelligence,
            StatKind::Accuracy => self.accuracy,
            StatKind::Defense => self.defense,
            StatKind::MagicDefense => self.magic_defense,
            StatKind::Spirit => self.spirit,
            StatKind::Speed => self.speed,
            StatKind::Luck => self.luck,
            StatKind::Vitality => self.vitality,
        }
    }

    fn slot_mut(&mut self, stat: StatKind) -> &mut u32 {
        match stat {
            StatKind::Strength => &mut self.strength,
            StatKind::Intelligence => &mut self.intelligence,
            StatKind::Accuracy => &mut self.accuracy,
            StatKind::Defense => &mut self.defense,
            StatKind::MagicDefense => &mut self.magic_defense,
            StatKind::Spirit => &mut self.spirit,
            StatKind::Speed => &mut self.speed,
            StatKind::Luck => &mut self.luck,
            StatKind::Vitality => &mut self.vitality,
        }
    }

    /// Return a copy with `delta` applied to one attribute, saturating at 0.
    #[must_use]
    pub fn adjusted(mut self, stat: StatKind, delta: i32) -> Self {
        let slot = self.slot_mut(stat);
        *slot = slot.saturating_add_signed(delta);
        self
    }
}

/// A timed attribute change on a summon.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StatModifier {
    pub stat: StatKind,
    pub amount: i32,
    /// Last turn on which the modifier applies. `None` never expires.
    pub expires_after_turn: Option<u32>,
}

impl StatModifier {
    /// Check whether the modifier is still active on `turn`.
    #[must_use]
    pub fn active_on(&self, turn: u32) -> bool {
        self.expires_after_turn.is_none_or(|last| turn <= last)
    }
}

/// Stats derived from attributes and level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DerivedStats {
    pub max_hp: u32,
    pub movement: u32,
    /// Base chance to hit, in percent.
    pub to_hit: u32,
    /// Critical-hit chance, in percent.
    pub crit_chance: u32,
}

impl DerivedStats {
    /// Derive stats for a summon.
    ///
    /// ```
    /// use card_tactics::combat::{Attributes, DerivedStats};
    ///
    /// let attrs = Attributes { vitality: 8, speed: 12, accuracy: 20, luck: 10, ..Attributes::default() };
    /// let stats = DerivedStats::from_attributes(&attrs, 2);
    ///
    /// assert_eq!(stats.max_hp, 110);
    /// assert_eq!(stats.movement, 4);
    /// assert_eq!(stats.to_hit, 85);
    /// assert_eq!(stats.crit_chance, 10);
    /// ```
    #[must_use]
    pub fn from_attributes(attrs: &Attributes, level: u8) -> Self {
        Self {
            max_hp: max_hp(attrs, level),
            movement: movement(attrs),
            to_hit: to_hit(attrs),
            crit_chance: crit_chance(attrs),
        }
    }
}

/// `50 + VIT × 5 + level × 10`
#[must_use]
pub fn max_hp(attrs: &Attributes, level: u8) -> u32 {
    50u32
        .saturating_add(attrs.vitality.saturating_mul(5))
        .saturating_add(u32::from(level) * 10)
}

/// `2 + SPD / 5`
#[must_use]
pub fn movement(attrs: &Attributes) -> u32 {
    2 + attrs.speed / 5
}

/// `min(95, 60 + ACC + LCK / 2)`
#[must_use]
pub fn to_hit(attrs: &Attributes) -> u32 {
    60u32
        .saturating_add(attrs.accuracy)
        .saturating_add(attrs.luck / 2)
        .min(95)
}

/// `min(50, 5 + LCK / 2)`
#[must_use]
pub fn crit_chance(attrs: &Attributes) -> u32 {
    (5 + attrs.luck / 2).min(50)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_summon() {
        let attrs = Attributes { vitality: 8, speed: 12, accuracy: 20, luck: 10, ..Attributes::default() };
        let stats = DerivedStats::from_attributes(&attrs, 2);
        assert_eq!(stats, DerivedStats { max_hp: 110, movement: 4, to_hit: 85, crit_chance: 10 });
    }

    #[test]
    fn test_caps() {
        let attrs = Attributes { accuracy: 60, luck: 200, ..Attributes::default() };
        assert_eq!(to_hit(&attrs), 95);
        assert_eq!(crit_chance(&attrs), 50);
    }

    #[test]
    fn test_baseline() {
        let attrs = Attributes::default();
        assert_eq!(max_hp(&attrs, 0), 50);
        assert_eq!(movement(&attrs), 2);
        assert_eq!(to_hit(&attrs), 60);
        assert_eq!(crit_chance(&attrs), 5);
    }

    #[test]
    fn test_adjusted_saturates() {
        let attrs = Attributes { strength: 3, ..Attributes::default() };
        assert_eq!(attrs.adjusted(StatKind::Strength, 4).strength, 7);
        assert_eq!(attrs.adjusted(StatKind::Strength, -10).strength, 0);
        assert_eq!(attrs.adjusted(StatKind::Luck, 2).get(StatKind::Luck), 2);
    }

    #[test]
    fn test_modifier_expiry() {
        let timed = StatModifier { stat: StatKind::Defense, amount: 2, expires_after_turn: Some(3) };
        assert!(timed.active_on(3));
        assert!(!timed.active_on(4));

        let permanent = StatModifier { stat: StatKind::Defense, amount: 2, expires_after_turn: None };
        assert!(permanent.active_on(100));
    }
}
