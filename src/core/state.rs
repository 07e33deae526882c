//! Game state: board, players, summons and buildings.
//!
//! `GameState` is plain data. It is built from `im` persistent structures, so
//! `clone()` is O(1) and shares structure with the original; writes to either
//! copy never show through the other. The stack system relies on this for
//! snapshots, and effect handlers rely on it to mutate a private copy and
//! return it only on success.
//!
//! ## Ownership
//!
//! The caller (a match/session coordinator) owns the authoritative value and
//! passes it into the engine for each operation. The engine hands back a new
//! value; it never keeps a reference to the caller's state.

use im::{OrdMap, Vector};
use serde::{Deserialize, Serialize};

use super::config::{GameConfig, Phase};
use super::entity::EntityId;
use super::player::{PlayerId, PlayerMap};
use super::position::{Position, Territory};
use super::rng::{GameRng, GameRngState};
use crate::cards::CardId;
use crate::combat::{Attributes, DerivedStats, StatModifier};

/// Summon class families. Card requirements check which families a player
/// controls.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleFamily {
    Warrior,
    Scout,
    Magist,
}

impl RoleFamily {
    /// Stable name of the family.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Warrior => "warrior",
            Self::Scout => "scout",
            Self::Magist => "magist",
        }
    }
}

/// Whether a summon is on the board.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SummonStatus {
    Active,
    /// Off the board. Keeps its last position so it can be returned there.
    Defeated,
}

/// A summoned unit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summon {
    pub id: EntityId,
    pub owner: PlayerId,
    pub name: String,
    pub role: RoleFamily,
    pub level: u8,
    pub position: Position,
    /// Base attributes, before modifiers.
    pub attributes: Attributes,
    pub current_hp: u32,
    /// Absorbs damage before HP.
    pub shield: u32,
    pub status: SummonStatus,
    pub modifiers: Vector<StatModifier>,
}

impl Summon {
    /// Create an active summon at full HP.
    pub fn new(
        id: EntityId,
        owner: PlayerId,
        name: impl Into<String>,
        role: RoleFamily,
        level: u8,
        position: Position,
        attributes: Attributes,
    ) -> Self {
        let max_hp = DerivedStats::from_attributes(&attributes, level).max_hp;
        Self {
            id,
            owner,
            name: name.into(),
            role,
            level,
            position,
            attributes,
            current_hp: max_hp,
            shield: 0,
            status: SummonStatus::Active,
            modifiers: Vector::new(),
        }
    }

    /// Attributes with every modifier applied.
    #[must_use]
    pub fn effective_attributes(&self) -> Attributes {
        self.modifiers
            .iter()
            .fold(self.attributes, |attrs, m| attrs.adjusted(m.stat, m.amount))
    }

    /// Derived stats from effective attributes.
    #[must_use]
    pub fn derived(&self) -> DerivedStats {
        DerivedStats::from_attributes(&self.effective_attributes(), self.level)
    }

    /// Check whether the summon is on the board.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == SummonStatus::Active
    }
}

/// Building types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildingKind {
    Tower,
    Barracks,
    Shrine,
}

impl BuildingKind {
    /// Stable name of the building type.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Tower => "tower",
            Self::Barracks => "barracks",
            Self::Shrine => "shrine",
        }
    }
}

/// A building on the board.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Building {
    pub id: EntityId,
    pub owner: PlayerId,
    pub kind: BuildingKind,
    pub position: Position,
}

/// Per-player state.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerState {
    pub hand: Vector<CardId>,
    /// Draw pile; the front is the top.
    pub deck: Vector<CardId>,
    pub discard: Vector<CardId>,
    pub victory_points: u32,
}

impl PlayerState {
    /// Check whether the hand holds `card`.
    #[must_use]
    pub fn has_in_hand(&self, card: CardId) -> bool {
        self.hand.contains(&card)
    }
}

/// Board geometry stored with the state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Board {
    pub width: u32,
    pub height: u32,
}

impl Board {
    /// Check that a cell lies on the board.
    #[must_use]
    pub fn contains(&self, position: Position) -> bool {
        position.in_bounds(self.width, self.height)
    }
}

/// Match progress.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchStatus {
    InProgress,
    Completed { winner: Option<PlayerId> },
}

/// Anything standing on a cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Occupant {
    Summon(EntityId),
    Building(EntityId),
}

impl Occupant {
    /// Entity id of the occupant.
    #[must_use]
    pub fn id(self) -> EntityId {
        match self {
            Self::Summon(id) | Self::Building(id) => id,
        }
    }
}

/// Complete game state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    pub board: Board,
    pub players: PlayerMap<PlayerState>,
    pub territories: PlayerMap<Territory>,
    pub summons: OrdMap<EntityId, Summon>,
    pub buildings: OrdMap<EntityId, Building>,

    /// Turn number (starts at 1).
    pub turn: u32,
    /// Player whose turn it is.
    pub current_player: PlayerId,
    pub phase: Phase,
    pub status: MatchStatus,

    /// Copied from the config so handlers can detect a win without it.
    pub victory_target: u32,

    /// Deterministic RNG position.
    pub rng: GameRngState,

    next_entity_id: u32,
}

impl GameState {
    /// Create an empty board for a new match.
    #[must_use]
    pub fn new(config: &GameConfig, seed: u64) -> Self {
        Self {
            board: Board {
                width: config.board_width,
                height: config.board_height,
            },
            players: PlayerMap::with_default(),
            territories: PlayerMap::new(|p| config.territory_for(p)),
            summons: OrdMap::new(),
            buildings: OrdMap::new(),
            turn: 1,
            current_player: config.starting_player,
            phase: config.first_phase(),
            status: MatchStatus::InProgress,
            victory_target: config.victory_target,
            rng: GameRng::new(seed).state(),
            next_entity_id: 1,
        }
    }

    /// Allocate a new entity ID.
    pub fn alloc_entity(&mut self) -> EntityId {
        let id = EntityId::new(self.next_entity_id);
        self.next_entity_id += 1;
        id
    }

    // === Players ===

    /// Get a player's state. Panics on an invalid seat.
    #[must_use]
    pub fn player(&self, player: PlayerId) -> &PlayerState {
        &self.players[player]
    }

    /// Get a player's mutable state. Panics on an invalid seat.
    pub fn player_mut(&mut self, player: PlayerId) -> &mut PlayerState {
        &mut self.players[player]
    }

    /// Put a card into a player's hand.
    pub fn add_to_hand(&mut self, player: PlayerId, card: CardId) {
        self.players[player].hand.push_back(card);
    }

    /// Remove one copy of a card from a player's hand.
    ///
    /// Returns true if the card was found and removed.
    pub fn remove_from_hand(&mut self, player: PlayerId, card: CardId) -> bool {
        let hand = &mut self.players[player].hand;
        match hand.index_of(&card) {
            Some(index) => {
                hand.remove(index);
                true
            }
            None => false,
        }
    }

    /// Replace a player's deck (front = top).
    pub fn set_deck(&mut self, player: PlayerId, deck: impl IntoIterator<Item = CardId>) {
        self.players[player].deck = deck.into_iter().collect();
    }

    /// Draw the top card of a player's deck into their hand.
    pub fn draw_card(&mut self, player: PlayerId) -> Option<CardId> {
        let card = self.players[player].deck.pop_front()?;
        self.players[player].hand.push_back(card);
        Some(card)
    }

    // === Board ===

    /// Place a new active summon and return its id.
    pub fn add_summon(
        &mut self,
        owner: PlayerId,
        name: impl Into<String>,
        role: RoleFamily,
        level: u8,
        position: Position,
        attributes: Attributes,
    ) -> EntityId {
        let id = self.alloc_entity();
        let summon = Summon::new(id, owner, name, role, level, position, attributes);
        self.summons.insert(id, summon);
        id
    }

    /// Place a new building and return its id.
    pub fn add_building(&mut self, owner: PlayerId, kind: BuildingKind, position: Position) -> EntityId {
        let id = self.alloc_entity();
        self.buildings.insert(id, Building { id, owner, kind, position });
        id
    }

    /// Get a summon (active or defeated).
    #[must_use]
    pub fn summon(&self, id: EntityId) -> Option<&Summon> {
        self.summons.get(&id)
    }

    /// Get a mutable summon.
    pub fn summon_mut(&mut self, id: EntityId) -> Option<&mut Summon> {
        self.summons.get_mut(&id)
    }

    /// Get a building.
    #[must_use]
    pub fn building(&self, id: EntityId) -> Option<&Building> {
        self.buildings.get(&id)
    }

    /// Active summons, in id order.
    pub fn active_summons(&self) -> impl Iterator<Item = &Summon> {
        self.summons.values().filter(|s| s.is_active())
    }

    /// Active summons controlled by `player`.
    pub fn summons_of(&self, player: PlayerId) -> impl Iterator<Item = &Summon> {
        self.active_summons().filter(move |s| s.owner == player)
    }

    /// Buildings owned by `player`.
    pub fn buildings_of(&self, player: PlayerId) -> impl Iterator<Item = &Building> {
        self.buildings.values().filter(move |b| b.owner == player)
    }

    /// Whatever stands on a cell, if anything. Defeated summons do not occupy.
    #[must_use]
    pub fn occupant_at(&self, position: Position) -> Option<Occupant> {
        self.active_summons()
            .find(|s| s.position == position)
            .map(|s| Occupant::Summon(s.id))
            .or_else(|| {
                self.buildings
                    .values()
                    .find(|b| b.position == position)
                    .map(|b| Occupant::Building(b.id))
            })
    }

    /// Check whether a cell is occupied.
    #[must_use]
    pub fn is_occupied(&self, position: Position) -> bool {
        self.occupant_at(position).is_some()
    }

    /// Drop stat modifiers that ended before `turn`.
    pub fn expire_modifiers(&mut self, turn: u32) {
        let expiring: Vec<EntityId> = self
            .summons
            .values()
            .filter(|s| s.modifiers.iter().any(|m| !m.active_on(turn)))
            .map(|s| s.id)
            .collect();
        for id in expiring {
            if let Some(summon) = self.summons.get_mut(&id) {
                summon.modifiers.retain(|m| m.active_on(turn));
            }
        }
    }

    // === Randomness ===

    /// Roll against a percentage chance, advancing the stored RNG.
    pub fn roll_percent(&mut self, chance: u32) -> bool {
        let mut rng = GameRng::from_state(&self.rng);
        let hit = rng.check_percent(chance);
        self.rng = rng.state();
        hit
    }

    // === Status ===

    /// Check whether the match has ended.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        matches!(self.status, MatchStatus::Completed { .. })
    }

    // === Encoding ===

    /// Encode the state for transport or persistence.
    pub fn to_bytes(&self) -> Result<Vec<u8>, bincode::Error> {
        bincode::serialize(self)
    }

    /// Decode a state produced by [`GameState::to_bytes`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, bincode::Error> {
        bincode::deserialize(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_state() -> GameState {
        GameState::new(&GameConfig::new(), 42)
    }

    #[test]
    fn test_new_state() {
        let state = test_state();
        assert_eq!(state.turn, 1);
        assert_eq!(state.current_player, PlayerId::ONE);
        assert_eq!(state.phase, Phase::Start);
        assert_eq!(state.board, Board { width: 12, height: 12 });
        assert!(!state.is_completed());
    }

    #[test]
    fn test_summon_full_hp() {
        let mut state = test_state();
        let attrs = Attributes { vitality: 4, ..Attributes::default() };
        let id = state.add_summon(PlayerId::ONE, "Knight", RoleFamily::Warrior, 1, Position::new(0, 0), attrs);

        let summon = state.summon(id).unwrap();
        assert_eq!(summon.current_hp, 80);
        assert!(summon.is_active());
    }

    #[test]
    fn test_occupancy_ignores_defeated() {
        let mut state = test_state();
        let pos = Position::new(3, 3);
        let id = state.add_summon(PlayerId::ONE, "Knight", RoleFamily::Warrior, 1, pos, Attributes::default());

        assert_eq!(state.occupant_at(pos), Some(Occupant::Summon(id)));

        state.summon_mut(id).unwrap().status = SummonStatus::Defeated;
        assert!(!state.is_occupied(pos));
    }

    #[test]
    fn test_hand_and_deck() {
        let mut state = test_state();
        state.set_deck(PlayerId::ONE, [CardId::new(1), CardId::new(2)]);

        assert_eq!(state.draw_card(PlayerId::ONE), Some(CardId::new(1)));
        assert!(state.player(PlayerId::ONE).has_in_hand(CardId::new(1)));
        assert!(state.remove_from_hand(PlayerId::ONE, CardId::new(1)));
        assert!(!state.remove_from_hand(PlayerId::ONE, CardId::new(1)));
    }

    #[test]
    fn test_clone_is_independent() {
        let mut state = test_state();
        let id = state.add_summon(PlayerId::ONE, "Knight", RoleFamily::Warrior, 1, Position::new(0, 0), Attributes::default());

        let copy = state.clone();
        state.summon_mut(id).unwrap().current_hp = 1;

        assert_ne!(copy.summon(id).unwrap().current_hp, 1);
    }

    #[test]
    fn test_effective_attributes_and_expiry() {
        let mut state = test_state();
        let id = state.add_summon(PlayerId::ONE, "Knight", RoleFamily::Warrior, 1, Position::new(0, 0), Attributes::default());
        state.summon_mut(id).unwrap().modifiers.push_back(StatModifier {
            stat: crate::combat::StatKind::Strength,
            amount: 5,
            expires_after_turn: Some(1),
        });

        assert_eq!(state.summon(id).unwrap().effective_attributes().strength, 5);

        let before = state.clone();
        state.expire_modifiers(2);
        assert_eq!(state.summon(id).unwrap().effective_attributes().strength, 0);
        assert_eq!(before.summon(id).unwrap().modifiers.len(), 1);
    }

    #[test]
    fn test_expiry_keeps_permanent_and_current_modifiers() {
        let mut state = test_state();
        let id = state.add_summon(PlayerId::ONE, "Knight", RoleFamily::Warrior, 1, Position::new(0, 0), Attributes::default());
        let other = state.add_summon(PlayerId::TWO, "Archer", RoleFamily::Scout, 1, Position::new(0, 11), Attributes::default());
        for expires_after_turn in [Some(2), Some(3), None] {
            state.summon_mut(id).unwrap().modifiers.push_back(StatModifier {
                stat: crate::combat::StatKind::Speed,
                amount: 1,
                expires_after_turn,
            });
        }

        state.expire_modifiers(3);
        let left: Vec<_> = state.summon(id).unwrap().modifiers.iter().map(|m| m.expires_after_turn).collect();
        assert_eq!(left, vec![Some(3), None]);
        assert!(state.summon(other).unwrap().modifiers.is_empty());
    }

    #[test]
    fn test_roll_is_deterministic() {
        let mut a = test_state();
        let mut b = test_state();
        let rolls_a: Vec<bool> = (0..20).map(|_| a.roll_percent(50)).collect();
        let rolls_b: Vec<bool> = (0..20).map(|_| b.roll_percent(50)).collect();
        assert_eq!(rolls_a, rolls_b);
        assert_eq!(a.rng, b.rng);
    }

    #[test]
    fn test_bincode_encoding() {
        let mut state = test_state();
        state.add_summon(PlayerId::TWO, "Archer", RoleFamily::Scout, 2, Position::new(4, 10), Attributes::default());
        state.add_to_hand(PlayerId::ONE, CardId::new(9));

        let bytes = state.to_bytes().unwrap();
        assert_eq!(GameState::from_bytes(&bytes).unwrap(), state);
    }
}
