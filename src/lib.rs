//! # flashfind_core
//!
//! A search-query compiler for flashcard collections stored in SQLite.
//!
//! ## Features
//!
//! - **Query Language**: Boolean search with grouping, negation, quoting and `key:value` filters
//! - **Field Search**: Every `field:value` term of a query resolved in one batched probe
//! - **Sorting**: Explicit `order by` clauses or the collection's configured browser sort
//! - **Browser Rows**: Cancellable row-by-row listing for display
//! - **Find and Replace**: Literal or regex substitution over one field or all of them
//! - **Duplicates**: Grouping of notes by the stripped value of a field
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use flashfind_core::collection::config::CollectionConfig;
//! use flashfind_core::collection::decks::DeckTree;
//! use flashfind_core::collection::models::ModelSet;
//! use flashfind_core::collection::store::Store;
//! use flashfind_core::collection::{SchedulerSnapshot, SearchContext};
//! use flashfind_core::replace::ReplaceOptions;
//! use flashfind_core::search::{Finder, order::OrderSpec};
//! use std::path::Path;
//!
//! # async fn run() -> flashfind_core::FinderResult<()> {
//! let store = Store::open(Path::new("/path/to/collection")).await?;
//! let models = ModelSet::from_json(r#"[{"id": 1, "name": "Basic",
//!     "fields": ["Front", "Back"], "templates": [{"name": "Card 1", "ord": 0}]}]"#)?;
//! let decks = DeckTree::from_json(r#"[{"id": 1, "name": "Default"}]"#, 1)?;
//! let config = CollectionConfig::from_json(r#"{"sortType": "noteFld"}"#)?;
//!
//! let finder = Finder::new(&store, SearchContext {
//!     models: &models,
//!     decks: &decks,
//!     sched: SchedulerSnapshot { today: 30, day_cutoff: 1_700_000_000 },
//!     config: &config,
//!     usn: -1,
//! });
//!
//! // Cards in the default deck, in browser order
//! let cards = finder.find_cards("deck:Default front:h*", &OrderSpec::Builtin(true)).await?;
//!
//! // Replace text in the notes matching a query
//! let nids = finder.find_notes("tag:typo").await?;
//! let changed = finder
//!     .find_replace(&nids, "teh", "the", &ReplaceOptions::default(), &())
//!     .await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - **[`collection`]**: Row store and the read-only snapshots a search consults
//! - **[`search`]**: Tokenizer, command interpreters, predicate builder and SQL assembly
//! - **[`replace`]**: Bulk find-and-replace
//! - **[`dupes`]**: Duplicate detection
//! - **[`fields`]**: Field blob, markup stripping and checksum helpers
//! - **[`error`]**: Unified error handling
//!
//! ## Error Handling
//!
//! Malformed queries are not errors: they match nothing. Operations return
//! [`FinderResult<T>`], which carries a [`FinderError`] only for store
//! failures outside a search statement and for inconsistent note-type data.

pub mod collection;
pub mod dupes;
pub mod error;
pub mod fields;
pub mod replace;
pub mod search;

/// Re-exports the most commonly used types for convenience.
pub use error::{FinderError, FinderResult};
pub use search::Finder;
