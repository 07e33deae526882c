//! Player actions at the inbound boundary.
//!
//! The session layer deserializes and authenticates actions before handing
//! them to the engine. An action is tagged with who sent it and the turn and
//! phase the sender believed were current; the validator rejects stale tags.

use serde::{Deserialize, Serialize};

use super::config::Phase;
use super::entity::EntityId;
use super::player::PlayerId;
use super::position::Position;
use crate::cards::CardId;
use crate::stack::EffectTarget;

/// What the player wants to do.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionKind {
    /// Move the summon standing on `from` to `to`.
    Move { from: Position, to: Position },
    /// Play a card from hand. `actor` is the summon whose attributes drive
    /// the card's formulas.
    PlayCard {
        card: CardId,
        target: Option<EffectTarget>,
        actor: Option<EntityId>,
    },
    /// Pass priority on the open stack.
    PassPriority,
    /// Draw the top card of the deck.
    DrawCard,
    /// Advance to the next phase.
    EndPhase,
}

impl ActionKind {
    /// Stable name of the action type.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Move { .. } => "move",
            Self::PlayCard { .. } => "play_card",
            Self::PassPriority => "pass_priority",
            Self::DrawCard => "draw_card",
            Self::EndPhase => "end_phase",
        }
    }
}

/// A tagged player action.
///
/// ```
/// use card_tactics::core::{ActionKind, Phase, PlayerAction, PlayerId};
///
/// let action = PlayerAction::new(PlayerId::ONE, 1, Phase::Action, ActionKind::PassPriority)
///     .with_timestamp(17);
/// assert_eq!(action.kind.as_str(), "pass_priority");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerAction {
    pub player: PlayerId,
    pub turn: u32,
    pub phase: Phase,
    pub kind: ActionKind,
    /// Sender-side timestamp. Informational only; ordering never depends on it.
    pub timestamp: u64,
}

impl PlayerAction {
    /// Create an action with a zero timestamp.
    #[must_use]
    pub fn new(player: PlayerId, turn: u32, phase: Phase, kind: ActionKind) -> Self {
        Self {
            player,
            turn,
            phase,
            kind,
            timestamp: 0,
        }
    }

    /// Set the timestamp (builder pattern).
    #[must_use]
    pub fn with_timestamp(mut self, timestamp: u64) -> Self {
        self.timestamp = timestamp;
        self
    }
}
