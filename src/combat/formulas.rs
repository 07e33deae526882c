//! Damage and healing formulas.
//!
//! All formulas are evaluated as exact rational arithmetic on integers and
//! floored once at the end, so results never depend on float rounding and
//! players can reproduce them by hand:
//!
//! ```text
//! physical = STR × (1 + power/100) × (STR / DEF) × crit
//! ranged   = ((STR + ACC) / 2) × (1 + power/100) × (STR / DEF) × crit
//! magical  = INT × (1 + power/100) × (INT / MDF) × crit
//! healing  = SPI × (1 + power/100) × crit
//! ```
//!
//! `crit` is 1 normally and 3/2 on a critical hit. Damage is clamped to a
//! minimum of 1; healing is not. A defense of 0 is treated as 1.

use serde::{Deserialize, Serialize};

use super::stats::Attributes;

const CRIT_NUM: u128 = 3;
const CRIT_DEN: u128 = 2;

fn crit_factor(critical: bool) -> (u128, u128) {
    if critical {
        (CRIT_NUM, CRIT_DEN)
    } else {
        (1, 1)
    }
}

fn floor_div(numerator: u128, denominator: u128) -> u32 {
    u32::try_from(numerator / denominator.max(1)).unwrap_or(u32::MAX)
}

/// Which attack formula a damage effect uses.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DamageStyle {
    /// Melee weapon damage, scaled by strength.
    Physical,
    /// Bow damage, averaging strength and accuracy.
    Ranged,
    /// Spell damage, scaled by intelligence.
    Magical,
}

impl DamageStyle {
    /// Compute damage from attacker and defender attributes.
    #[must_use]
    pub fn damage(self, attacker: &Attributes, defender: &Attributes, power: u32, critical: bool) -> u32 {
        match self {
            Self::Physical => physical_damage(attacker.strength, power, defender.defense, critical),
            Self::Ranged => ranged_damage(
                attacker.strength,
                attacker.accuracy,
                power,
                defender.defense,
                critical,
            ),
            Self::Magical => {
                magical_damage(attacker.intelligence, power, defender.magic_defense, critical)
            }
        }
    }

    /// Stable name of the style.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Physical => "physical",
            Self::Ranged => "ranged",
            Self::Magical => "magical",
        }
    }
}

/// Physical damage: `STR × (1 + weaponPower/100) × (STR / DEF) × crit`, min 1.
///
/// ```
/// use card_tactics::combat::physical_damage;
///
/// assert_eq!(physical_damage(20, 150, 10, false), 100);
/// assert_eq!(physical_damage(20, 150, 10, true), 150);
/// ```
#[must_use]
pub fn physical_damage(strength: u32, weapon_power: u32, target_defense: u32, critical: bool) -> u32 {
    let (cn, cd) = crit_factor(critical);
    let str = u128::from(strength);
    let numerator = str * (100 + u128::from(weapon_power)) * str * cn;
    let denominator = 100 * u128::from(target_defense.max(1)) * cd;
    floor_div(numerator, denominator).max(1)
}

/// Ranged damage: `((STR + ACC) / 2) × (1 + weaponPower/100) × (STR / DEF) × crit`, min 1.
#[must_use]
pub fn ranged_damage(
    strength: u32,
    accuracy: u32,
    weapon_power: u32,
    target_defense: u32,
    critical: bool,
) -> u32 {
    let (cn, cd) = crit_factor(critical);
    let str = u128::from(strength);
    let numerator = (str + u128::from(accuracy)) * (100 + u128::from(weapon_power)) * str * cn;
    let denominator = 2 * 100 * u128::from(target_defense.max(1)) * cd;
    floor_div(numerator, denominator).max(1)
}

/// Magical damage: `INT × (1 + basePower/100) × (INT / MDF) × crit`, min 1.
///
/// ```
/// use card_tactics::combat::magical_damage;
///
/// assert_eq!(magical_damage(25, 200, 15, false), 125);
/// assert_eq!(magical_damage(3, 200, 40, false), 1);
/// ```
#[must_use]
pub fn magical_damage(intelligence: u32, base_power: u32, target_magic_defense: u32, critical: bool) -> u32 {
    let (cn, cd) = crit_factor(critical);
    let int = u128::from(intelligence);
    let numerator = int * (100 + u128::from(base_power)) * int * cn;
    let denominator = 100 * u128::from(target_magic_defense.max(1)) * cd;
    floor_div(numerator, denominator).max(1)
}

/// Healing: `SPI × (1 + basePower/100) × crit`, floored, no minimum.
#[must_use]
pub fn healing_amount(spirit: u32, base_power: u32, critical: bool) -> u32 {
    let (cn, cd) = crit_factor(critical);
    let numerator = u128::from(spirit) * (100 + u128::from(base_power)) * cn;
    floor_div(numerator, 100 * cd)
}
