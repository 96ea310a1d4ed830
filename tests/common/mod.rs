//! Shared fixtures for the integration tests.
#![allow(dead_code)]

use flashfind_core::collection::config::CollectionConfig;
use flashfind_core::collection::decks::{Deck, DeckTree};
use flashfind_core::collection::models::{ModelSet, NoteType, NoteTypeKind, SchemaRegistry, Template};
use flashfind_core::collection::store::{
    NewCard, NewNote, QUEUE_LEARN, QUEUE_NEW, QUEUE_REVIEW, QUEUE_SUSPENDED, Store, TYPE_LEARN,
    TYPE_NEW, TYPE_REVIEW,
};
use flashfind_core::collection::{SchedulerSnapshot, SearchContext};
use flashfind_core::search::Finder;
use flashfind_core::{FinderError, FinderResult};
use tempfile::TempDir;

pub const BASIC: i64 = 1;
pub const CLOZE: i64 = 2;

pub const DEFAULT_DECK: i64 = 1;
pub const SPANISH: i64 = 2;
pub const SPANISH_VERBS: i64 = 3;
pub const MATH: i64 = 4;
pub const MATH_ALGEBRA: i64 = 5;
pub const FRENCH: i64 = 6;
pub const FILTERED: i64 = 7;

pub const TODAY: i64 = 100;
/// End of the current scheduling day, in epoch seconds.
pub const DAY_CUTOFF: i64 = 1_700_000_000;

/// Card ids are creation times in epoch milliseconds.
pub const OLD: i64 = 1_600_000_000_000;
pub const RECENT: i64 = (DAY_CUTOFF - 3_600) * 1000;

// Cards of the seeded collection.
pub const C_HABLAR: i64 = OLD + 1;
pub const C_COMER: i64 = OLD + 2;
pub const C_CASA: i64 = OLD + 3;
pub const C_VIVIR: i64 = RECENT + 4;
pub const C_MATH: i64 = OLD + 5;
pub const C_CLOZE_1: i64 = OLD + 6;
pub const C_CLOZE_2: i64 = OLD + 7;
pub const C_CAT: i64 = OLD + 8;
pub const C_CAT_REVERSE: i64 = OLD + 9;
pub const C_CHAT: i64 = OLD + 10;

pub fn basic_model() -> NoteType {
    NoteType {
        id: BASIC,
        name: "Basic".to_string(),
        kind: NoteTypeKind::Standard,
        fields: vec!["Front".to_string(), "Back".to_string()],
        templates: vec![
            Template {
                name: "Card 1".to_string(),
                ord: 0,
            },
            Template {
                name: "Reverse".to_string(),
                ord: 1,
            },
        ],
        sort_idx: 0,
    }
}

pub fn cloze_model() -> NoteType {
    NoteType {
        id: CLOZE,
        name: "Cloze".to_string(),
        kind: NoteTypeKind::Cloze,
        fields: vec!["Text".to_string(), "Extra".to_string()],
        templates: vec![Template {
            name: "Cloze".to_string(),
            ord: 0,
        }],
        sort_idx: 0,
    }
}

pub fn deck_tree() -> DeckTree {
    let decks = [
        (DEFAULT_DECK, "Default"),
        (SPANISH, "Spanish"),
        (SPANISH_VERBS, "Spanish::Verbs"),
        (MATH, "Math"),
        (MATH_ALGEBRA, "Math::Algebra"),
        (FRENCH, "French"),
        (FILTERED, "Cram"),
    ]
    .into_iter()
    .map(|(id, name)| Deck {
        id,
        name: name.to_string(),
    })
    .collect();
    DeckTree::new(decks, DEFAULT_DECK)
}

/// A throwaway collection in a temporary directory.
pub struct Fixture {
    _dir: TempDir,
    pub store: Store,
    pub models: ModelSet,
    pub decks: DeckTree,
    pub config: CollectionConfig,
}

impl Fixture {
    /// An empty collection with the basic and cloze note types.
    pub async fn empty() -> FinderResult<Self> {
        Self::with_models(ModelSet::new(vec![basic_model(), cloze_model()])).await
    }

    pub async fn with_models(models: ModelSet) -> FinderResult<Self> {
        let dir = TempDir::new()?;
        let store = Store::open(dir.path()).await?;
        Ok(Self {
            _dir: dir,
            store,
            models,
            decks: deck_tree(),
            config: CollectionConfig::default(),
        })
    }

    /// A small collection covering every search command.
    ///
    /// | card | note | deck | state |
    /// |---|---|---|---|
    /// | C_HABLAR | 1001 hablar / to speak `verb` | Spanish | review, due 95, ivl 10, ease 2.5 |
    /// | C_COMER | 1002 comer / to eat `verb` | Spanish::Verbs | suspended, ease 2.3 |
    /// | C_CASA | 1003 casa / house `noun` | Spanish | new |
    /// | C_VIVIR | 1004 vivir / to live `verb marked` | Spanish::Verbs | learning, added today |
    /// | C_MATH | 1005 2+2 / 4 | Math::Algebra | review, due 101, ivl 30 |
    /// | C_CLOZE_1, C_CLOZE_2 | 1006 cloze | French | new |
    /// | C_CAT, C_CAT_REVERSE | 1007 Cat / a cat | Default | new |
    /// | C_CHAT | 1008 chat / cat in French | Cram, home French | new |
    pub async fn seeded() -> FinderResult<Self> {
        let fx = Self::empty().await?;

        let review = NewCard {
            card_type: TYPE_REVIEW,
            queue: QUEUE_REVIEW,
            ..Default::default()
        };
        let new = NewCard {
            card_type: TYPE_NEW,
            queue: QUEUE_NEW,
            ..Default::default()
        };

        fx.note(1001, BASIC, &["hablar", "to speak"], &["verb"]).await?;
        fx.card(NewCard {
            id: C_HABLAR,
            nid: 1001,
            did: SPANISH,
            due: 95,
            ivl: 10,
            factor: 2500,
            reps: 5,
            ..review.clone()
        })
        .await?;

        fx.note(1002, BASIC, &["comer", "to eat"], &["verb"]).await?;
        fx.card(NewCard {
            id: C_COMER,
            nid: 1002,
            did: SPANISH_VERBS,
            queue: QUEUE_SUSPENDED,
            due: 110,
            ivl: 3,
            factor: 2300,
            reps: 8,
            lapses: 2,
            ..review.clone()
        })
        .await?;

        fx.note(1003, BASIC, &["casa", "house"], &["noun"]).await?;
        fx.card(NewCard {
            id: C_CASA,
            nid: 1003,
            did: SPANISH,
            due: 1,
            ..new.clone()
        })
        .await?;

        fx.note(1004, BASIC, &["vivir", "to live"], &["verb", "marked"])
            .await?;
        fx.card(NewCard {
            id: C_VIVIR,
            nid: 1004,
            did: SPANISH_VERBS,
            card_type: TYPE_LEARN,
            queue: QUEUE_LEARN,
            due: DAY_CUTOFF - 100,
            ..Default::default()
        })
        .await?;

        fx.note(1005, BASIC, &["2+2", "4"], &[]).await?;
        fx.card(NewCard {
            id: C_MATH,
            nid: 1005,
            did: MATH_ALGEBRA,
            due: 101,
            ivl: 30,
            factor: 2500,
            ..review.clone()
        })
        .await?;

        fx.note(
            1006,
            CLOZE,
            &["{{c1::Paris}} is in {{c2::France}}", ""],
            &["geo"],
        )
        .await?;
        for (id, ord) in [(C_CLOZE_1, 0), (C_CLOZE_2, 1)] {
            fx.card(NewCard {
                id,
                nid: 1006,
                did: FRENCH,
                ord,
                ..new.clone()
            })
            .await?;
        }

        fx.note(1007, BASIC, &["Cat", "a cat"], &[]).await?;
        for (id, ord) in [(C_CAT, 0), (C_CAT_REVERSE, 1)] {
            fx.card(NewCard {
                id,
                nid: 1007,
                did: DEFAULT_DECK,
                ord,
                ..new.clone()
            })
            .await?;
        }

        fx.note(1008, BASIC, &["chat", "cat in French"], &[]).await?;
        fx.card(NewCard {
            id: C_CHAT,
            nid: 1008,
            did: FILTERED,
            odid: FRENCH,
            ..new.clone()
        })
        .await?;

        fx.store.add_review((DAY_CUTOFF - 600) * 1000, C_HABLAR, 3).await?;
        fx.store.add_review(OLD + 100, C_COMER, 1).await?;

        Ok(fx)
    }

    pub fn finder(&self) -> Finder<'_> {
        Finder::new(
            &self.store,
            SearchContext {
                models: &self.models,
                decks: &self.decks,
                sched: SchedulerSnapshot {
                    today: TODAY,
                    day_cutoff: DAY_CUTOFF,
                },
                config: &self.config,
                usn: -1,
            },
        )
    }

    pub async fn note(&self, id: i64, mid: i64, fields: &[&str], tags: &[&str]) -> FinderResult<()> {
        let model = self
            .models
            .get(mid)
            .ok_or_else(|| FinderError::Other(format!("no note type {mid}")))?;
        let note = NewNote {
            id,
            mid,
            modified: 0,
            fields: fields.iter().map(|f| f.to_string()).collect(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
        };
        self.store.add_note(model, &note).await
    }

    pub async fn card(&self, card: NewCard) -> FinderResult<()> {
        self.store.add_card(&card).await
    }

    /// Adds a note with a single new card in the default deck; the card id is the note id.
    pub async fn note_with_card(
        &self,
        id: i64,
        mid: i64,
        fields: &[&str],
        tags: &[&str],
    ) -> FinderResult<()> {
        self.note(id, mid, fields, tags).await?;
        self.card(NewCard {
            id,
            nid: id,
            did: DEFAULT_DECK,
            ..Default::default()
        })
        .await
    }
}

/// Sorted copy, for comparing unordered id sets.
pub fn sorted(mut ids: Vec<i64>) -> Vec<i64> {
    ids.sort_unstable();
    ids
}
