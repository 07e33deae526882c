use thiserror::Error;

use super::effect::Speed;
use super::snapshot::SnapshotId;
use crate::core::PlayerId;
use crate::effects::ResolveError;
use crate::error::ErrorKind;

/// Errors raised by stack operations.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum StackError {
    #[error("the stack is resolving")]
    ResolutionInProgress,

    #[error("{speed} speed is below the current lock ({lock})")]
    SpeedBelowLock { speed: Speed, lock: Speed },

    #[error("{player} does not hold priority ({holder} does)")]
    NotPriorityHolder { player: PlayerId, holder: PlayerId },

    #[error("{0} is not a seat in this match")]
    InvalidPlayer(PlayerId),

    #[error("the stack is empty")]
    EmptyStack,

    #[error("resolution has already begun")]
    AlreadyResolving,

    #[error("both players must pass before resolution")]
    PriorityNotExhausted,

    #[error("the stack is not resolving")]
    NotResolving,

    #[error("{0} not found")]
    SnapshotNotFound(SnapshotId),

    #[error("resolving index {index} is outside a stack of {len}")]
    IndexOutOfRange { index: usize, len: usize },

    #[error(transparent)]
    Resolution(#[from] ResolveError),
}

impl StackError {
    /// Classify the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::IndexOutOfRange { .. } => ErrorKind::Fatal,
            Self::Resolution(e) => e.kind(),
            _ => ErrorKind::ProtocolViolation,
        }
    }

    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::ResolutionInProgress => "RESOLUTION_IN_PROGRESS",
            Self::SpeedBelowLock { .. } => "SPEED_BELOW_LOCK",
            Self::NotPriorityHolder { .. } => "NOT_PRIORITY_HOLDER",
            Self::InvalidPlayer(_) => "INVALID_PLAYER",
            Self::EmptyStack => "EMPTY_STACK",
            Self::AlreadyResolving => "ALREADY_RESOLVING",
            Self::PriorityNotExhausted => "PRIORITY_NOT_EXHAUSTED",
            Self::NotResolving => "NOT_RESOLVING",
            Self::SnapshotNotFound(_) => "SNAPSHOT_NOT_FOUND",
            Self::IndexOutOfRange { .. } => "INDEX_OUT_OF_RANGE",
            Self::Resolution(e) => e.code(),
        }
    }
}

/// A failed `resolve_next_effect`, with the snapshot taken before the attempt.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{error}")]
pub struct ResolveFailure {
    pub error: StackError,
    /// `None` when the call was rejected before a snapshot was taken.
    pub snapshot_id: Option<SnapshotId>,
}

impl ResolveFailure {
    pub(crate) fn rejected(error: StackError) -> Self {
        Self { error, snapshot_id: None }
    }

    /// Classify the error.
    pub fn kind(&self) -> ErrorKind {
        self.error.kind()
    }

    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        self.error.code()
    }
}
