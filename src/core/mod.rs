//! Core engine types: entities, players, board geometry, state, actions,
//! RNG and configuration.
//!
//! Everything here is plain data. Behavior lives in `stack`, `effects`,
//! `triggers` and `rules`.

pub mod entity;
pub mod player;
pub mod position;
pub mod rng;
pub mod config;
pub mod action;
pub mod state;

pub use entity::EntityId;
pub use player::{PlayerId, PlayerMap, PLAYER_COUNT};
pub use position::{Position, Territory};
pub use rng::{GameRng, GameRngState};
pub use config::{
    GameConfig, Phase, SnapshotConfig, DEFAULT_BOARD_SIZE, DEFAULT_MAX_SNAPSHOTS,
    DEFAULT_TERRITORY_DEPTH, DEFAULT_VICTORY_TARGET,
};
pub use action::{ActionKind, PlayerAction};
pub use state::{
    Board, Building, BuildingKind, GameState, MatchStatus, Occupant, PlayerState, RoleFamily,
    Summon, SummonStatus,
};
