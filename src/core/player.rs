//! Player identification and per-player data storage.
//!
//! ## PlayerId
//!
//! A match always has exactly two players: `PlayerId(0)` ("player1") and
//! `PlayerId(1)` ("player2"). The id is a plain `u8` so that it survives
//! deserialization from untrusted data; [`PlayerId::is_valid`] tells the
//! validator whether a stored value is one of the two seats.
//!
//! ## PlayerMap
//!
//! Per-player data backed by a `Vec` with one slot per seat.

use serde::{Deserialize, Serialize};
use std::ops::{Index, IndexMut};

/// Number of seats in a match.
pub const PLAYER_COUNT: usize = 2;

/// Player identifier (0-based seat index).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PlayerId(pub u8);

impl PlayerId {
    /// The first seat.
    pub const ONE: PlayerId = PlayerId(0);
    /// The second seat.
    pub const TWO: PlayerId = PlayerId(1);

    /// Create a new player ID.
    #[must_use]
    pub const fn new(id: u8) -> Self {
        Self(id)
    }

    /// Get the raw seat index (0-based).
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Check that this id names one of the two seats.
    #[must_use]
    pub const fn is_valid(self) -> bool {
        (self.0 as usize) < PLAYER_COUNT
    }

    /// The other seat.
    ///
    /// ```
    /// use card_tactics::core::PlayerId;
    ///
    /// assert_eq!(PlayerId::ONE.opponent(), PlayerId::TWO);
    /// assert_eq!(PlayerId::TWO.opponent(), PlayerId::ONE);
    /// ```
    #[must_use]
    pub const fn opponent(self) -> Self {
        Self(1 - (self.0 & 1))
    }

    /// Iterate over both seats.
    pub fn all() -> impl Iterator<Item = PlayerId> {
        (0..PLAYER_COUNT as u8).map(PlayerId)
    }
}

impl std::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "player{}", self.0 as u16 + 1)
    }
}

/// Per-player data storage with O(1) access.
///
/// ```
/// use card_tactics::core::{PlayerId, PlayerMap};
///
/// let mut points: PlayerMap<u32> = PlayerMap::with_value(0);
/// points[PlayerId::TWO] += 3;
/// assert_eq!(points[PlayerId::ONE], 0);
/// assert_eq!(points[PlayerId::TWO], 3);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlayerMap<T> {
    data: Vec<T>,
}

impl<T> PlayerMap<T> {
    /// Create a new PlayerMap with values from a factory function.
    pub fn new(factory: impl Fn(PlayerId) -> T) -> Self {
        Self {
            data: PlayerId::all().map(factory).collect(),
        }
    }

    /// Create a new PlayerMap with both entries set to the same value.
    pub fn with_value(value: T) -> Self
    where
        T: Clone,
    {
        Self::new(|_| value.clone())
    }

    /// Create a new PlayerMap with default values.
    pub fn with_default() -> Self
    where
        T: Default,
    {
        Self::new(|_| T::default())
    }

    /// Get a player's data, or `None` for an invalid seat.
    #[must_use]
    pub fn get(&self, player: PlayerId) -> Option<&T> {
        self.data.get(player.index())
    }

    /// Get a mutable reference to a player's data, or `None` for an invalid seat.
    pub fn get_mut(&mut self, player: PlayerId) -> Option<&mut T> {
        self.data.get_mut(player.index())
    }

    /// Number of stored seats.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if no seats are stored (only possible for deserialized data).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Iterate over (PlayerId, &T) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (PlayerId, &T)> {
        self.data
            .iter()
            .enumerate()
            .map(|(i, v)| (PlayerId(i as u8), v))
    }

    /// Iterate over (PlayerId, &mut T) pairs.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (PlayerId, &mut T)> {
        self.data
            .iter_mut()
            .enumerate()
            .map(|(i, v)| (PlayerId(i as u8), v))
    }
}

/// Indexing panics on an invalid seat; callers holding untrusted ids should
/// go through [`PlayerMap::get`].
impl<T> Index<PlayerId> for PlayerMap<T> {
    type Output = T;

    fn index(&self, player: PlayerId) -> &Self::Output {
        &self.data[player.index()]
    }
}

impl<T> IndexMut<PlayerId> for PlayerMap<T> {
    fn index_mut(&mut self, player: PlayerId) -> &mut Self::Output {
        &mut self.data[player.index()]
    }
}
