//! Requirement checks and cost payment.

use crate::cards::{Cost, Requirements};
use crate::core::{GameState, PlayerId};

use super::detail::StateChange;

/// Check every requirement against the controller's board.
///
/// Returns all unmet requirements; an empty list means the effect may
/// resolve.
#[must_use]
pub fn check_requirements(req: &Requirements, controller: PlayerId, state: &GameState) -> Vec<String> {
    let mut unmet = Vec::new();

    for role in req.required_roles() {
        if !state.summons_of(controller).any(|s| s.role == role) {
            unmet.push(format!("must control an active {}", role.as_str()));
        }
    }

    if let Some(level) = req.min_level {
        if !state.summons_of(controller).any(|s| s.level >= level) {
            unmet.push(format!("requires a summon of level {} or higher", level));
        }
    }

    if let Some(needed) = req.min_summons {
        let count = state.summons_of(controller).count();
        if (count as u64) < u64::from(needed) {
            unmet.push(format!("requires {} active summons, controls {}", needed, count));
        }
    }

    if req.requires_building && state.buildings_of(controller).next().is_none() {
        unmet.push("requires a building".to_string());
    }

    let player = state.player(controller);
    if req.cost.discard as usize > player.hand.len() {
        unmet.push(format!(
            "cannot discard {} card(s) with {} in hand",
            req.cost.discard,
            player.hand.len()
        ));
    }
    if req.cost.victory_points > player.victory_points {
        unmet.push(format!(
            "cannot spend {} victory point(s) with {}",
            req.cost.victory_points, player.victory_points
        ));
    }

    unmet
}

/// Pay a cost that [`check_requirements`] accepted.
///
/// Discards come from the front of the hand.
pub fn pay_costs(cost: &Cost, controller: PlayerId, state: &mut GameState) -> Vec<StateChange> {
    let mut changes = Vec::new();
    if cost.is_free() {
        return changes;
    }

    let player = state.player_mut(controller);

    let mut discarded = Vec::new();
    for _ in 0..cost.discard {
        let Some(card) = player.hand.pop_front() else { break };
        player.discard.push_back(card);
        discarded.push(card);
    }
    if !discarded.is_empty() {
        changes.push(StateChange::CardsDiscarded { player: controller, cards: discarded });
    }

    if cost.victory_points > 0 {
        let before = player.victory_points;
        player.victory_points = before.saturating_sub(cost.victory_points);
        changes.push(StateChange::VictoryPointsChanged {
            player: controller,
            before,
            after: player.victory_points,
        });
    }

    changes
}
