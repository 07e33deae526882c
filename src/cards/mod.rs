//! Card system: raw definitions, parsed effects, requirements and the library.
//!
//! ## Key Types
//!
//! - `CardId`: Identifier for card definitions
//! - `RawCardDefinition`: Card data as delivered by the content layer
//! - `CardEffect`: Immutable typed effect descriptor
//! - `EffectParams`: Per-family parameters
//! - `Requirements`: Normalized play requirements and costs
//! - `CardEffectParser`: Raw data to `CardEffect`
//! - `CardLibrary`: Definition and parsed-effect lookup

pub mod definition;
pub mod effect;
pub mod parser;
pub mod registry;
pub mod requirements;

pub use definition::{CardId, RawCardDefinition};
pub use effect::{
    CardEffect, DamageParams, DrawParams, EffectParams, HealParams, ReviveParams, ShieldParams,
    StatBoostParams, VictoryPointParams,
};
pub use parser::{CardEffectParser, ParseError, ON_PLAY};
pub use registry::CardLibrary;
pub use requirements::{Cost, Requirements};
