//! Card library for definition lookup.
//!
//! The `CardLibrary` stores the raw definitions for a match together with
//! their parsed effects. Cards are parsed once, when they are registered, so
//! malformed content is rejected before a match starts.

use rustc_hash::FxHashMap;

use super::definition::{CardId, RawCardDefinition};
use super::effect::CardEffect;
use super::parser::{CardEffectParser, ParseError};

#[derive(Clone, Debug)]
struct LibraryEntry {
    definition: RawCardDefinition,
    effects: Vec<CardEffect>,
}

/// Registry of card definitions and their parsed effects.
///
/// ## Example
///
/// ```
/// use card_tactics::cards::CardLibrary;
///
/// let mut library = CardLibrary::new();
/// library
///     .load_json(r#"[{ "id": 1, "name": "Mend", "effects": { "heal": { "base_power": 50 } } }]"#)
///     .unwrap();
///
/// let effects = library.effects(card_tactics::cards::CardId::new(1)).unwrap();
/// assert_eq!(effects[0].name, "Mend");
/// ```
#[derive(Clone, Debug, Default)]
pub struct CardLibrary {
    cards: FxHashMap<CardId, LibraryEntry>,
}

impl CardLibrary {
    /// Create a new empty library.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and register a card definition.
    pub fn register(&mut self, definition: RawCardDefinition) -> Result<(), ParseError> {
        if self.cards.contains_key(&definition.id) {
            return Err(ParseError::DuplicateCard(definition.id));
        }
        let effects = CardEffectParser::parse_definition(&definition)?;
        self.cards.insert(definition.id, LibraryEntry { definition, effects });
        Ok(())
    }

    /// Register every card in a JSON array of definitions.
    ///
    /// Returns the number of cards added. Nothing is registered if any card
    /// fails to parse.
    pub fn load_json(&mut self, json: &str) -> Result<usize, ParseError> {
        let definitions: Vec<RawCardDefinition> =
            serde_json::from_str(json).map_err(|e| ParseError::InvalidJson(e.to_string()))?;

        let mut staged = self.clone();
        for definition in definitions.iter().cloned() {
            staged.register(definition)?;
        }
        *self = staged;
        Ok(definitions.len())
    }

    /// Get a raw card definition by ID.
    #[must_use]
    pub fn get(&self, id: CardId) -> Option<&RawCardDefinition> {
        self.cards.get(&id).map(|entry| &entry.definition)
    }

    /// Get the parsed effects of a card.
    #[must_use]
    pub fn effects(&self, id: CardId) -> Option<&[CardEffect]> {
        self.cards.get(&id).map(|entry| entry.effects.as_slice())
    }

    /// Check if a card ID is registered.
    #[must_use]
    pub fn contains(&self, id: CardId) -> bool {
        self.cards.contains_key(&id)
    }

    /// Get the number of registered cards.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    /// Check if the library is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Iterate over all raw definitions.
    pub fn iter(&self) -> impl Iterator<Item = &RawCardDefinition> {
        self.cards.values().map(|entry| &entry.definition)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_register_and_lookup() {
        let mut library = CardLibrary::new();
        let mend = RawCardDefinition::new(CardId::new(1), "Mend").with_effect("heal", json!({}));
        library.register(mend).unwrap();

        assert!(library.contains(CardId::new(1)));
        assert_eq!(library.get(CardId::new(1)).unwrap().name, "Mend");
        assert_eq!(library.effects(CardId::new(1)).unwrap().len(), 1);
        assert!(library.effects(CardId::new(2)).is_none());
    }

    #[test]
    fn test_duplicate_rejected() {
        let mut library = CardLibrary::new();
        library.register(RawCardDefinition::new(CardId::new(1), "A")).unwrap();
        let err = library.register(RawCardDefinition::new(CardId::new(1), "B")).unwrap_err();
        assert_eq!(err, ParseError::DuplicateCard(CardId::new(1)));
    }

    #[test]
    fn test_load_json_is_all_or_nothing() {
        let mut library = CardLibrary::new();
        let json = r#"[
            { "id": 1, "name": "Mend", "effects": { "heal": {} } },
            { "id": 2, "name": "Broken", "effects": { "stat_boost": { "amount": 1 } } }
        ]"#;

        assert!(library.load_json(json).is_err());
        assert!(library.is_empty());
    }

    #[test]
    fn test_load_json_bad_shape() {
        let mut library = CardLibrary::new();
        let err = library.load_json("{ not json").unwrap_err();
        assert_eq!(err.code(), "INVALID_CARD_DATA");
    }
}
