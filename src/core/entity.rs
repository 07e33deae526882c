//! Entity identification for board objects.
//!
//! Summons and buildings share one id space. Ids are allocated by
//! [`GameState`](super::GameState) and never reused within a match, so a
//! defeated summon keeps its id and can be returned to play later.
//!
//! ```
//! use card_tactics::core::EntityId;
//!
//! let id = EntityId::new(7);
//! assert_eq!(id.raw(), 7);
//! assert_eq!(format!("{}", id), "Entity(7)");
//! ```

use serde::{Deserialize, Serialize};

/// Unique identifier for a summon or building.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(pub u32);

impl EntityId {
    /// Create an entity ID.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl From<u32> for EntityId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Entity({})", self.0)
    }
}
