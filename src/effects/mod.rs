//! Effect resolution.
//!
//! - `ResolverId`: Closed set of resolvers plus `Unknown`
//! - `EffectResolver`: Dispatches a stack entry to its handler
//! - `ResolutionDetail`: What a resolved effect did, for logs and replay
//! - `check_requirements` / `pay_costs`: Requirement gate run before handlers
//!
//! Handlers work on a private copy of the game state. A failed resolution
//! returns an error and no state; a successful one returns the new state,
//! the events it raised and a detail record.

mod detail;
mod error;
mod handlers;
mod requirements;
mod resolver;

pub use detail::{ResolutionDetail, StateChange};
pub use error::ResolveError;
pub use requirements::{check_requirements, pay_costs};
pub use resolver::{EffectResolver, Resolution, ResolverContext, ResolverId};
