//! Combat math: attributes, derived stats, damage and healing.
//!
//! Everything here is a pure function of its inputs. Effect handlers call
//! into this module; nothing in it reads or writes game state.

mod formulas;
mod stats;

pub use formulas::{healing_amount, magical_damage, physical_damage, ranged_damage, DamageStyle};
pub use stats::{crit_chance, max_hp, movement, to_hit, Attributes, DerivedStats, StatKind, StatModifier};
