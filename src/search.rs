//! Search-query compilation and execution.
//!
//! A query such as `deck:Spanish tag:verb -is:suspended` is tokenized,
//! folded into a SQL predicate with positional arguments, and run against
//! the [`Store`]. Malformed queries never raise errors; they simply match
//! nothing.
//!
//! # Query language
//!
//! - `word` - free text, matched in the sort field or any field (`*` is a wildcard)
//! - `a b` / `a or b` / `-a` / `(a or b) c` - conjunction, disjunction, negation, grouping
//! - `"two words"`, `tag:"Hard Word"` - quoting
//! - `field:value` - whole-field match on a named note field
//! - `added:N`, `rated:N[:ease]`, `prop:ivl>=10`, `is:due`, `tag:...`, `deck:...`,
//!   `card:...`, `note:...`, `mid:...`, `nid:...`, `cid:...`, `dupe:mid,text`
//!
//! # Usage
//!
//! ```rust,no_run
//! use flashfind_core::collection::{SchedulerSnapshot, SearchContext};
//! use flashfind_core::collection::config::CollectionConfig;
//! use flashfind_core::collection::decks::DeckTree;
//! use flashfind_core::collection::models::ModelSet;
//! use flashfind_core::collection::store::Store;
//! use flashfind_core::search::Finder;
//! use flashfind_core::search::order::OrderSpec;
//! # use std::path::Path;
//!
//! # async fn run() -> Result<(), flashfind_core::FinderError> {
//! let store = Store::open(Path::new("/path/to/collection")).await?;
//! let models = ModelSet::default();
//! let decks = DeckTree::default();
//! let config = CollectionConfig::default();
//! let ctx = SearchContext {
//!     models: &models,
//!     decks: &decks,
//!     sched: SchedulerSnapshot { today: 120, day_cutoff: 1_700_000_000 },
//!     config: &config,
//!     usn: 0,
//! };
//!
//! let finder = Finder::new(&store, ctx);
//! let ids = finder.find_cards("deck:Spanish -is:suspended", &OrderSpec::Builtin(true)).await?;
//! # Ok(())
//! # }
//! ```

pub mod commands;
pub mod expr;
pub mod field_combination;
pub mod order;
pub mod sql;
pub mod tokenizer;

use crate::collection::SearchContext;
use crate::collection::decks::DeckHierarchy;
use crate::collection::models::SchemaRegistry;
use crate::collection::store::{QUEUE_SUSPENDED, Store, bind_args};
use crate::error::FinderResult;
use crate::search::expr::{Predicate, build_predicate};
use crate::search::order::{OrderSpec, resolve_order};
use crate::search::sql::{Projection, assemble};
use crate::search::tokenizer::tokenize;
use futures_util::TryStreamExt;
use sqlx::Row;
use tracing::{debug, info, warn};

/// Runs searches against one collection.
pub struct Finder<'a> {
    pub(crate) store: &'a Store,
    pub(crate) ctx: SearchContext<'a>,
}

/// One card as listed in the browser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowserRow {
    pub id: i64,
    /// The note's sort field, stripped of markup.
    pub sort_field: String,
    pub deck_id: i64,
    /// `None` when the deck id is unknown to the deck hierarchy.
    pub deck_name: Option<String>,
    pub queue: i32,
    pub tags: String,
}

impl BrowserRow {
    pub const FLAG_SUSPENDED: u8 = 1;
    pub const FLAG_MARKED: u8 = 2;

    /// Display flags: suspended, and tagged `marked`.
    pub fn flags(&self) -> u8 {
        let mut flags = 0;
        if self.queue == QUEUE_SUSPENDED {
            flags |= Self::FLAG_SUSPENDED;
        }
        if self.tags.contains("marked") || self.tags.contains("Marked") {
            flags |= Self::FLAG_MARKED;
        }
        flags
    }
}

/// Outcome of a cancellable browser search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowseOutcome {
    Rows(Vec<BrowserRow>),
    /// The cancellation check fired before all rows were read.
    Cancelled,
}

impl<'a> Finder<'a> {
    pub fn new(store: &'a Store, ctx: SearchContext<'a>) -> Self {
        Self { store, ctx }
    }

    /// Compiles `query` into a predicate without running it.
    ///
    /// Returns `None` when the query is malformed.
    pub async fn compile(&self, query: &str) -> FinderResult<Option<Predicate>> {
        let tokens = tokenize(query);
        debug!(query, tokens = tokens.len(), "compiling search");
        let predicate = build_predicate(&tokens, &self.ctx, self.store).await?;
        if predicate.is_none() {
            debug!(query, "search is invalid");
        }
        Ok(predicate)
    }

    /// Ids of the cards matching `query`.
    pub async fn find_cards(&self, query: &str, order: &OrderSpec) -> FinderResult<Vec<i64>> {
        let Some(predicate) = self.compile(query).await? else {
            return Ok(Vec::new());
        };
        let order = resolve_order(order, self.ctx.config);
        let sql = assemble(Projection::CardIds, &predicate.sql, &order.clause);

        let mut ids = match self.store.query_ids(&sql, &predicate.args).await {
            Ok(ids) => ids,
            Err(e) => {
                // e.g. an unbalanced group
                warn!(error = %e, sql = %sql, "search failed in store");
                return Ok(Vec::new());
            }
        };
        if order.reversed {
            ids.reverse();
        }
        Ok(ids)
    }

    /// Ids of the notes with at least one card matching `query`.
    pub async fn find_notes(&self, query: &str) -> FinderResult<Vec<i64>> {
        let Some(predicate) = self.compile(query).await? else {
            return Ok(Vec::new());
        };
        let sql = assemble(Projection::NoteIds, &predicate.sql, "");

        match self.store.query_ids(&sql, &predicate.args).await {
            Ok(ids) => Ok(ids),
            Err(e) => {
                warn!(error = %e, sql = %sql, "note search failed in store");
                Ok(Vec::new())
            }
        }
    }

    /// Browser rows for `query`, polling `is_cancelled` before each row.
    pub async fn find_cards_for_browser<F>(
        &self,
        query: &str,
        order: &OrderSpec,
        mut is_cancelled: F,
    ) -> FinderResult<BrowseOutcome>
    where
        F: FnMut() -> bool,
    {
        let Some(predicate) = self.compile(query).await? else {
            return Ok(BrowseOutcome::Rows(Vec::new()));
        };
        let order = resolve_order(order, self.ctx.config);
        let sql = assemble(Projection::BrowserRows, &predicate.sql, &order.clause);

        let mut rows = Vec::new();
        let mut stream = bind_args(sqlx::query(&sql), &predicate.args).fetch(&self.store.pool);
        loop {
            let row = match stream.try_next().await {
                Ok(Some(row)) => row,
                Ok(None) => break,
                Err(e) => {
                    warn!(error = %e, sql = %sql, "browser search failed in store");
                    return Ok(BrowseOutcome::Rows(Vec::new()));
                }
            };
            if is_cancelled() {
                info!(read = rows.len(), "browser search cancelled");
                return Ok(BrowseOutcome::Cancelled);
            }
            let deck_id: i64 = row.get(2);
            rows.push(BrowserRow {
                id: row.get(0),
                sort_field: row.get(1),
                deck_id,
                deck_name: self.ctx.decks.name(deck_id).map(str::to_owned),
                queue: row.get(3),
                tags: row.get(4),
            });
        }

        if order.reversed {
            rows.reverse();
        }
        Ok(BrowseOutcome::Rows(rows))
    }

    /// Distinct field names across all note types.
    ///
    /// Names are deduplicated case-insensitively. With `downcase` the
    /// lowercased names are returned, otherwise the first spelling seen.
    pub fn field_names(&self, downcase: bool) -> Vec<String> {
        let mut seen: Vec<String> = Vec::new();
        let mut names = Vec::new();
        for model in self.ctx.models.all() {
            for name in &model.fields {
                let lower = name.to_lowercase();
                if !seen.contains(&lower) {
                    seen.push(lower);
                    names.push(name.clone());
                }
            }
        }
        if downcase { seen } else { names }
    }
}
