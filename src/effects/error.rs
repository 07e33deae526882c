use thiserror::Error;

use crate::error::ErrorKind;

/// Errors raised while resolving a single effect.
///
/// Every variant except `InconsistentState` is raised before any mutation,
/// so the pre-attempt snapshot stays valid.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("No handler found for resolver `{0}`")]
    NoHandler(String),

    #[error("requirements not met: {}", .0.join("; "))]
    RequirementsNotMet(Vec<String>),

    #[error("`{0}` needs a target")]
    MissingTarget(String),

    #[error("invalid target: {0}")]
    InvalidTarget(String),

    #[error("no summon acts for `{0}`")]
    MissingActor(String),

    #[error("parameters do not fit resolver `{0}`")]
    ParamsMismatch(String),

    #[error("inconsistent state: {0}")]
    InconsistentState(String),
}

impl ResolveError {
    /// Classify the error.
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InconsistentState(_) => ErrorKind::Fatal,
            _ => ErrorKind::DispatchFailure,
        }
    }

    /// Stable machine-readable code.
    pub const fn code(&self) -> &'static str {
        match self {
            Self::NoHandler(_) => "NO_HANDLER",
            Self::RequirementsNotMet(_) => "REQUIREMENTS_NOT_MET",
            Self::MissingTarget(_) => "MISSING_TARGET",
            Self::InvalidTarget(_) => "INVALID_TARGET",
            Self::MissingActor(_) => "MISSING_ACTOR",
            Self::ParamsMismatch(_) => "PARAMS_MISMATCH",
            Self::InconsistentState(_) => "INCONSISTENT_STATE",
        }
    }
}
