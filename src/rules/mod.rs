//! Match rules: structural validation and the match coordinator.
//!
//! - `StateValidator`: Exhaustive invariant checks on states and actions
//! - `MatchEngine`: Wires actions through the stack, resolver and triggers

mod engine;
mod validator;

pub use engine::{ActionOutcome, EngineError, MatchEngine};
pub use validator::{StateValidator, ValidationReport, Violation};
