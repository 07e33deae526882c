//! Effect stack and resolution.
//!
//! Players take turns holding priority. The holder may add an effect
//! (respond) or pass. When both players pass in a row the stack resolves from
//! the top, one entry per call, so the caller can feed each result's events
//! to the trigger system before continuing.
//!
//! ## Example Usage
//!
//! ```
//! use card_tactics::cards::{CardEffect, EffectParams, HealParams};
//! use card_tactics::core::{GameConfig, GameState, PlayerId};
//! use card_tactics::effects::ResolverId;
//! use card_tactics::stack::{EffectSource, Speed, StackError, StackSystem};
//!
//! let mut stack = StackSystem::from_config(&GameConfig::new());
//! let heal = CardEffect::new("1:heal", "Mend", ResolverId::Heal, EffectParams::Heal(HealParams::default()));
//!
//! stack.add_effect(heal.clone(), EffectSource::System, PlayerId::ONE, Speed::Reaction, None, None).unwrap();
//!
//! // Player two now holds priority, and Action speed is locked out.
//! let err = stack
//!     .add_effect(heal, EffectSource::System, PlayerId::TWO, Speed::Action, None, None)
//!     .unwrap_err();
//! assert!(matches!(err, StackError::SpeedBelowLock { .. }));
//! ```

mod effect;
mod error;
mod snapshot;
mod system;

pub use effect::{EffectSource, EffectTarget, RuntimeParams, Speed, StackEffect, StackEffectId};
pub use error::{ResolveFailure, StackError};
pub use snapshot::{GameStateSnapshot, SnapshotId, SnapshotStore};
pub use system::{PassOutcome, ResolutionStep, StackPhase, StackResolutionState, StackSystem};
