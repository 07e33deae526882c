//! Shared error taxonomy.
//!
//! Domain errors (`StackError`, `ResolveError`, `ParseError`, `EngineError`)
//! live next to the code that raises them. Each one classifies itself with an
//! [`ErrorKind`] and a stable `code()` so the session layer can build a
//! player-facing message without inspecting engine internals.

use serde::{Deserialize, Serialize};

/// Classification of an engine failure.
///
/// - **ProtocolViolation**: the caller broke the priority protocol (wrong
///   player, acting while resolving, speed below lock). Nothing changed.
/// - **DispatchFailure**: an effect could not be resolved (unknown resolver,
///   unmet requirements, bad target). Nothing changed; the pre-attempt
///   snapshot is still valid for rollback.
/// - **InvariantFailure**: a structural check failed.
/// - **Fatal**: the state is inconsistent and resolution must halt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    ProtocolViolation,
    DispatchFailure,
    InvariantFailure,
    Fatal,
}

impl ErrorKind {
    /// Human-readable name of the kind.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ProtocolViolation => "protocol_violation",
            Self::DispatchFailure => "dispatch_failure",
            Self::InvariantFailure => "invariant_failure",
            Self::Fatal => "fatal",
        }
    }

    /// Returns true if the engine state is untouched after this error.
    pub const fn leaves_state_untouched(&self) -> bool {
        matches!(self, Self::ProtocolViolation | Self::DispatchFailure)
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
