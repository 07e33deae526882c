//! Match configuration.
//!
//! `GameConfig` fixes the board geometry, territories, victory target, phase
//! order and snapshot retention for a match. It can be built in code with the
//! `with_*` builder methods or loaded from JSON by the content layer; missing
//! fields fall back to the defaults below.

use serde::{Deserialize, Serialize};

use super::player::PlayerId;
use super::position::Territory;

/// Default board edge length.
pub const DEFAULT_BOARD_SIZE: u32 = 12;

/// Default number of rows each player starts with.
pub const DEFAULT_TERRITORY_DEPTH: u32 = 3;

/// Default number of victory points needed to win.
pub const DEFAULT_VICTORY_TARGET: u32 = 10;

/// Default cap on retained snapshots.
pub const DEFAULT_MAX_SNAPSHOTS: usize = 50;

/// Turn phases, in play order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Upkeep: turn-start triggers fire.
    Start,
    /// The active player draws.
    Draw,
    /// Movement, attacks and card plays.
    Action,
    /// Cleanup before the turn passes.
    End,
}

impl Phase {
    /// All phases in play order.
    pub const ALL: [Phase; 4] = [Phase::Start, Phase::Draw, Phase::Action, Phase::End];

    /// Stable name of the phase.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Draw => "draw",
            Self::Action => "action",
            Self::End => "end",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot retention policy for the stack system.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapshotConfig {
    /// Maximum snapshots retained; the oldest is evicted first.
    pub max_snapshots: usize,

    /// Maximum snapshot age in logical ticks. `None` keeps snapshots until
    /// they are evicted by count.
    pub max_age: Option<u64>,

    /// Take a snapshot when resolution begins.
    pub snapshot_on_begin: bool,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            max_snapshots: DEFAULT_MAX_SNAPSHOTS,
            max_age: None,
            snapshot_on_begin: true,
        }
    }
}

/// Complete match configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Board width in cells.
    pub board_width: u32,

    /// Board height in cells.
    pub board_height: u32,

    /// Rows owned by each player at their end of the board.
    pub territory_depth: u32,

    /// Victory points needed to win.
    pub victory_target: u32,

    /// Player who acts first and who receives priority when the stack idles.
    pub starting_player: PlayerId,

    /// Phases enabled for this match, in order.
    pub phases: Vec<Phase>,

    /// Snapshot retention.
    pub snapshots: SnapshotConfig,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            board_width: DEFAULT_BOARD_SIZE,
            board_height: DEFAULT_BOARD_SIZE,
            territory_depth: DEFAULT_TERRITORY_DEPTH,
            victory_target: DEFAULT_VICTORY_TARGET,
            starting_player: PlayerId::ONE,
            phases: Phase::ALL.to_vec(),
            snapshots: SnapshotConfig::default(),
        }
    }
}

impl GameConfig {
    /// Create the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Set the victory point target.
    #[must_use]
    pub fn with_victory_target(mut self, target: u32) -> Self {
        self.victory_target = target;
        self
    }

    /// Set the starting player.
    #[must_use]
    pub fn with_starting_player(mut self, player: PlayerId) -> Self {
        self.starting_player = player;
        self
    }

    /// Set the territory depth.
    #[must_use]
    pub fn with_territory_depth(mut self, depth: u32) -> Self {
        self.territory_depth = depth;
        self
    }

    /// Set the snapshot policy.
    #[must_use]
    pub fn with_snapshots(mut self, snapshots: SnapshotConfig) -> Self {
        self.snapshots = snapshots;
        self
    }

    /// Territories implied by the board height and depth.
    ///
    /// Player one owns the first rows, player two the last rows.
    #[must_use]
    pub fn territory_for(&self, player: PlayerId) -> Territory {
        let depth = self.territory_depth.min(self.board_height / 2);
        if player == PlayerId::ONE {
            Territory { owner: player, first_row: 0, end_row: depth }
        } else {
            Territory {
                owner: player,
                first_row: self.board_height - depth,
                end_row: self.board_height,
            }
        }
    }

    /// The phase that follows `phase`, or `None` if `phase` ends the turn.
    #[must_use]
    pub fn next_phase(&self, phase: Phase) -> Option<Phase> {
        let index = self.phases.iter().position(|p| *p == phase)?;
        self.phases.get(index + 1).copied()
    }

    /// The first enabled phase of a turn.
    #[must_use]
    pub fn first_phase(&self) -> Phase {
        self.phases.first().copied().unwrap_or(Phase::Action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GameConfig::new();
        assert_eq!(config.board_width, 12);
        assert_eq!(config.board_height, 12);
        assert_eq!(config.victory_target, 10);
        assert_eq!(config.snapshots.max_snapshots, 50);
        assert!(config.snapshots.snapshot_on_begin);
    }

    #[test]
    fn test_from_json_partial() {
        let config = GameConfig::from_json(r#"{ "victory_target": 5, "starting_player": 1 }"#).unwrap();
        assert_eq!(config.victory_target, 5);
        assert_eq!(config.starting_player, PlayerId::TWO);
        assert_eq!(config.board_width, DEFAULT_BOARD_SIZE);
    }

    #[test]
    fn test_territories() {
        let config = GameConfig::new();
        let t1 = config.territory_for(PlayerId::ONE);
        let t2 = config.territory_for(PlayerId::TWO);

        assert_eq!((t1.first_row, t1.end_row), (0, 3));
        assert_eq!((t2.first_row, t2.end_row), (9, 12));
    }

    #[test]
    fn test_phase_order() {
        let config = GameConfig::new();
        assert_eq!(config.first_phase(), Phase::Start);
        assert_eq!(config.next_phase(Phase::Draw), Some(Phase::Action));
        assert_eq!(config.next_phase(Phase::End), None);
    }

    #[test]
    fn test_phase_serde_names() {
        assert_eq!(serde_json::to_string(&Phase::Action).unwrap(), "\"action\"");
    }
}
