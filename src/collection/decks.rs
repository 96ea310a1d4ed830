use crate::error::FinderResult;
use serde::Deserialize;

/// Separator between levels of a deck name, e.g. `Spanish::Verbs`.
pub const DECK_LEVEL_SEPARATOR: &str = "::";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Deck {
    pub id: i64,
    pub name: String,
}

/// Resolves deck names and the parent/child relationship between decks.
pub trait DeckHierarchy: Send + Sync {
    fn all(&self) -> &[Deck];

    /// Id of the deck the user currently has selected.
    fn current(&self) -> i64;

    fn id_for_name(&self, name: &str) -> Option<i64> {
        let wanted = name.to_lowercase();
        self.all()
            .iter()
            .find(|d| d.name.to_lowercase() == wanted)
            .map(|d| d.id)
    }

    fn name(&self, id: i64) -> Option<&str> {
        self.all()
            .iter()
            .find(|d| d.id == id)
            .map(|d| d.name.as_str())
    }

    /// The deck itself followed by every descendant, or `None` for an unknown id.
    fn with_descendants(&self, id: i64) -> Option<Vec<i64>> {
        let name = self.name(id)?;
        let prefix = format!("{}{DECK_LEVEL_SEPARATOR}", name.to_lowercase());
        let mut children: Vec<&Deck> = self
            .all()
            .iter()
            .filter(|d| d.name.to_lowercase().starts_with(&prefix))
            .collect();
        children.sort_by(|a, b| a.name.cmp(&b.name));

        let mut ids = vec![id];
        ids.extend(children.into_iter().map(|d| d.id));
        Some(ids)
    }
}

/// In-memory deck list with a selected current deck.
#[derive(Debug, Clone, Default)]
pub struct DeckTree {
    decks: Vec<Deck>,
    current: i64,
}

impl DeckTree {
    pub fn new(decks: Vec<Deck>, current: i64) -> Self {
        Self { decks, current }
    }

    /// Loads decks from a JSON array; `current` selects the active deck.
    pub fn from_json(json: &str, current: i64) -> FinderResult<Self> {
        let decks: Vec<Deck> = serde_json::from_str(json)?;
        Ok(Self::new(decks, current))
    }

    pub fn set_current(&mut self, id: i64) {
        self.current = id;
    }
}

impl DeckHierarchy for DeckTree {
    fn all(&self) -> &[Deck] {
        &self.decks
    }

    fn current(&self) -> i64 {
        self.current
    }
}
