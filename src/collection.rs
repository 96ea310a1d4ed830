//! Read-only snapshots of the collection that a search needs.
//!
//! The finder never reaches for global state: the note-type registry, the
//! deck tree, the scheduler's notion of "today" and the configured sort
//! order are handed in through a [`SearchContext`].

pub mod config;
pub mod decks;
pub mod models;
pub mod store;

use crate::collection::config::CollectionConfig;
use crate::collection::decks::DeckHierarchy;
use crate::collection::models::SchemaRegistry;

/// Scheduler values used by date and due-window commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerSnapshot {
    /// Days elapsed since the collection was created.
    pub today: i64,
    /// Epoch seconds at which the current scheduling day ends.
    pub day_cutoff: i64,
}

/// Capabilities injected into every search, replace and dupe call.
#[derive(Clone, Copy)]
pub struct SearchContext<'a> {
    pub models: &'a dyn SchemaRegistry,
    pub decks: &'a dyn DeckHierarchy,
    pub sched: SchedulerSnapshot,
    pub config: &'a CollectionConfig,
    /// Update sequence number stamped on rows this crate modifies.
    pub usn: i32,
}
