//! Structural invariant checks.
//!
//! The validator is independent of the stack: it looks only at a game state
//! (or a proposed action against one) and reports every violated constraint.
//! It never stops at the first failure and never errors.

use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::core::{ActionKind, EntityId, GameConfig, GameState, MatchStatus, PlayerAction, PlayerId, Position};

/// One violated constraint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Violation {
    /// Stable machine-readable code, e.g. `"OCCUPANCY_CONFLICT"`.
    pub code: &'static str,
    pub message: String,
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

/// Every constraint a state or action violates.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub violations: Vec<Violation>,
}

impl ValidationReport {
    /// Check whether nothing was violated.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }

    /// Check whether a violation with `code` was reported.
    #[must_use]
    pub fn has(&self, code: &str) -> bool {
        self.violations.iter().any(|v| v.code == code)
    }

    /// Violation messages, prefixed with their codes.
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        self.violations.iter().map(ToString::to_string).collect()
    }

    fn push(&mut self, code: &'static str, message: impl Into<String>) {
        self.violations.push(Violation {
            code,
            message: message.into(),
        });
    }
}

/// Checks game states and proposed actions.
#[derive(Clone, Copy, Debug, Default)]
pub struct StateValidator;

impl StateValidator {
    /// Check the structural invariants of a game state.
    #[must_use]
    pub fn validate_state(state: &GameState, config: &GameConfig) -> ValidationReport {
        let mut report = ValidationReport::default();

        if state.board.width != config.board_width || state.board.height != config.board_height {
            report.push(
                "BOARD_DIMENSIONS",
                format!(
                    "board is {}x{}, expected {}x{}",
                    state.board.width, state.board.height, config.board_width, config.board_height
                ),
            );
        }

        let mut occupied: FxHashMap<Position, EntityId> = FxHashMap::default();
        let mut occupy = |report: &mut ValidationReport, id: EntityId, owner: PlayerId, position: Position| {
            if !owner.is_valid() {
                report.push("INVALID_OWNER", format!("{} is owned by invalid {}", id, owner));
            }
            if !state.board.contains(position) {
                report.push("OUT_OF_BOUNDS", format!("{} stands outside the board at {}", id, position));
            }
            if let Some(other) = occupied.insert(position, id) {
                report.push(
                    "OCCUPANCY_CONFLICT",
                    format!("{} and {} share {}", other, id, position),
                );
            }
        };
        for summon in state.active_summons() {
            occupy(&mut report, summon.id, summon.owner, summon.position);
        }
        for building in state.buildings.values() {
            occupy(&mut report, building.id, building.owner, building.position);
        }

        for player in PlayerId::all() {
            match state.territories.get(player) {
                Some(territory) if territory.owner != player => report.push(
                    "TERRITORY",
                    format!("{}'s territory is assigned to {}", player, territory.owner),
                ),
                Some(territory) if territory.depth() == 0 || territory.end_row > state.board.height => {
                    report.push("TERRITORY", format!("{}'s territory does not fit the board", player));
                }
                Some(_) => {}
                None => report.push("TERRITORY", format!("{} has no territory", player)),
            }
        }
        if let (Some(one), Some(two)) = (state.territories.get(PlayerId::ONE), state.territories.get(PlayerId::TWO)) {
            if one.overlaps(two) {
                report.push("TERRITORY", "territories overlap");
            }
        }

        if state.turn == 0 {
            report.push("INVALID_TURN", "turn number must be positive");
        }
        if !state.current_player.is_valid() {
            report.push("INVALID_PLAYER", format!("current player {} is not a seat", state.current_player));
        }
        if !config.phases.contains(&state.phase) {
            report.push("INVALID_PHASE", format!("phase {} is not enabled", state.phase));
        }

        if let MatchStatus::Completed { winner: Some(winner) } = state.status {
            match state.players.get(winner) {
                Some(p) if p.victory_points >= config.victory_target => {}
                Some(p) => report.push(
                    "WINNER_UNVERIFIED",
                    format!(
                        "{} declared winner with {} of {} victory points",
                        winner, p.victory_points, config.victory_target
                    ),
                ),
                None => report.push("WINNER_UNVERIFIED", format!("declared winner {} is not a seat", winner)),
            }
        }

        report
    }

    /// Check a proposed action against the current state.
    ///
    /// Moves, draws and phase changes belong to the player whose turn it is.
    /// Card plays and passes may come from either player; who holds priority
    /// is the stack's concern.
    #[must_use]
    pub fn validate_action(state: &GameState, action: &PlayerAction, config: &GameConfig) -> ValidationReport {
        let mut report = ValidationReport::default();

        if state.is_completed() {
            report.push("MATCH_COMPLETED", "the match is over");
        }
        if action.turn != state.turn {
            report.push("TURN_MISMATCH", format!("action is for turn {}, current turn is {}", action.turn, state.turn));
        }
        if action.phase != state.phase {
            report.push(
                "PHASE_MISMATCH",
                format!("action is for phase {}, current phase is {}", action.phase, state.phase),
            );
        }
        if !config.phases.contains(&action.phase) {
            report.push("INVALID_PHASE", format!("phase {} is not enabled", action.phase));
        }
        if !action.player.is_valid() {
            report.push("INVALID_PLAYER", format!("{} is not a seat", action.player));
            return report;
        }

        let turn_bound = matches!(action.kind, ActionKind::Move { .. } | ActionKind::DrawCard | ActionKind::EndPhase);
        if turn_bound && action.player != state.current_player {
            report.push(
                "NOT_ACTIVE_PLAYER",
                format!("{} cannot {} on {}'s turn", action.player, action.kind.as_str(), state.current_player),
            );
        }

        match &action.kind {
            ActionKind::Move { from, to } => Self::check_move(state, action.player, *from, *to, &mut report),
            ActionKind::PlayCard { card, actor, .. } => {
                if !state.player(action.player).has_in_hand(*card) {
                    report.push("CARD_NOT_IN_HAND", format!("{} is not in {}'s hand", card, action.player));
                }
                if let Some(actor) = actor {
                    let usable = state
                        .summon(*actor)
                        .is_some_and(|s| s.is_active() && s.owner == action.player);
                    if !usable {
                        report.push("INVALID_ACTOR", format!("{} cannot act for {}", actor, action.player));
                    }
                }
            }
            ActionKind::DrawCard => {
                if state.player(action.player).deck.is_empty() {
                    report.push("DECK_EMPTY", format!("{} has no cards to draw", action.player));
                }
            }
            ActionKind::PassPriority | ActionKind::EndPhase => {}
        }

        report
    }

    fn check_move(state: &GameState, player: PlayerId, from: Position, to: Position, report: &mut ValidationReport) {
        let mover = state.active_summons().find(|s| s.position == from);
        match mover {
            None => report.push("SOURCE_EMPTY", format!("no summon stands on {}", from)),
            Some(summon) if summon.owner != player => {
                report.push("NOT_OWNER", format!("{} at {} belongs to {}", summon.name, from, summon.owner));
            }
            Some(summon) => {
                let range = summon.derived().movement;
                if from.distance(to) > range {
                    report.push(
                        "OUT_OF_RANGE",
                        format!("{} moves {} cells, range is {}", summon.name, from.distance(to), range),
                    );
                }
            }
        }

        if !state.board.contains(to) {
            report.push("OUT_OF_BOUNDS", format!("{} is outside the board", to));
        } else if state.is_occupied(to) {
            report.push("DESTINATION_OCCUPIED", format!("{} is occupied", to));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::CardId;
    use crate::combat::Attributes;
    use crate::core::{BuildingKind, Phase, RoleFamily};

    fn setup() -> (GameConfig, GameState, EntityId) {
        let config = GameConfig::new();
        let mut state = GameState::new(&config, 7);
        let knight = state.add_summon(
            PlayerId::ONE,
            "Knight",
            RoleFamily::Warrior,
            1,
            Position::new(2, 1),
            Attributes { speed: 5, ..Attributes::default() },
        );
        (config, state, knight)
    }

    fn action(state: &GameState, player: PlayerId, kind: ActionKind) -> PlayerAction {
        PlayerAction::new(player, state.turn, state.phase, kind)
    }

    #[test]
    fn test_fresh_state_is_valid() {
        let (config, state, _) = setup();
        let report = StateValidator::validate_state(&state, &config);
        assert!(report.is_valid(), "{:?}", report.messages());
    }

    #[test]
    fn test_reports_every_violation() {
        let (config, mut state, knight) = setup();
        state.add_building(PlayerId::TWO, BuildingKind::Tower, Position::new(2, 1));
        state.summon_mut(knight).unwrap().position = Position::new(2, 1);
        state.add_summon(PlayerId::TWO, "Ghost", RoleFamily::Scout, 1, Position::new(40, 1), Attributes::default());
        state.turn = 0;
        state.current_player = PlayerId(5);

        let report = StateValidator::validate_state(&state, &config);
        assert!(report.has("OCCUPANCY_CONFLICT"));
        assert!(report.has("OUT_OF_BOUNDS"));
        assert!(report.has("INVALID_TURN"));
        assert!(report.has("INVALID_PLAYER"));
        assert_eq!(report.violations.len(), 4);
    }

    #[test]
    fn test_board_and_phase_checked_against_config() {
        let (_, state, _) = setup();
        let config = GameConfig { board_width: 8, phases: vec![Phase::Action, Phase::End], ..GameConfig::new() };

        let report = StateValidator::validate_state(&state, &config);
        assert!(report.has("BOARD_DIMENSIONS"));
        assert!(report.has("INVALID_PHASE"));
    }

    #[test]
    fn test_declared_winner_must_reach_target() {
        let (config, mut state, _) = setup();
        state.status = MatchStatus::Completed { winner: Some(PlayerId::TWO) };
        state.player_mut(PlayerId::TWO).victory_points = config.victory_target - 1;
        assert!(StateValidator::validate_state(&state, &config).has("WINNER_UNVERIFIED"));

        state.player_mut(PlayerId::TWO).victory_points = config.victory_target;
        assert!(StateValidator::validate_state(&state, &config).is_valid());
    }

    #[test]
    fn test_move_checks() {
        let (config, mut state, _) = setup();
        state.add_building(PlayerId::TWO, BuildingKind::Barracks, Position::new(3, 1));

        // Movement is 2 + 5 / 5 = 3.
        let ok = action(&state, PlayerId::ONE, ActionKind::Move { from: Position::new(2, 1), to: Position::new(2, 4) });
        assert!(StateValidator::validate_action(&state, &ok, &config).is_valid());

        let far = action(&state, PlayerId::ONE, ActionKind::Move { from: Position::new(2, 1), to: Position::new(2, 5) });
        assert!(StateValidator::validate_action(&state, &far, &config).has("OUT_OF_RANGE"));

        let blocked = action(&state, PlayerId::ONE, ActionKind::Move { from: Position::new(2, 1), to: Position::new(3, 1) });
        assert!(StateValidator::validate_action(&state, &blocked, &config).has("DESTINATION_OCCUPIED"));

        let empty = action(&state, PlayerId::ONE, ActionKind::Move { from: Position::new(0, 0), to: Position::new(-1, 0) });
        let report = StateValidator::validate_action(&state, &empty, &config);
        assert!(report.has("SOURCE_EMPTY"));
        assert!(report.has("OUT_OF_BOUNDS"));
    }

    #[test]
    fn test_move_belongs_to_active_player() {
        let (config, state, _) = setup();
        let theirs = action(&state, PlayerId::TWO, ActionKind::Move { from: Position::new(2, 1), to: Position::new(2, 2) });
        let report = StateValidator::validate_action(&state, &theirs, &config);
        assert!(report.has("NOT_ACTIVE_PLAYER"));
        assert!(report.has("NOT_OWNER"));
    }

    #[test]
    fn test_card_play_requires_card_in_hand() {
        let (config, mut state, _) = setup();
        let play = action(&state, PlayerId::TWO, ActionKind::PlayCard { card: CardId::new(3), target: None, actor: None });
        assert!(StateValidator::validate_action(&state, &play, &config).has("CARD_NOT_IN_HAND"));

        state.add_to_hand(PlayerId::TWO, CardId::new(3));
        assert!(StateValidator::validate_action(&state, &play, &config).is_valid());
    }

    #[test]
    fn test_stale_tags_rejected() {
        let (config, state, _) = setup();
        let stale = PlayerAction::new(PlayerId::ONE, state.turn + 1, Phase::End, ActionKind::PassPriority);
        let report = StateValidator::validate_action(&state, &stale, &config);
        assert!(report.has("TURN_MISMATCH"));
        assert!(report.has("PHASE_MISMATCH"));
    }
}
