//! Wraps a compiled predicate and ordering into a complete statement.

/// The columns a search selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Projection {
    /// Card ids. Skips the notes table when nothing refers to it.
    CardIds,
    /// Distinct note ids of matching cards. Ordering is ignored.
    NoteIds,
    /// Card id, sort field, deck id, queue and tags for the browser.
    BrowserRows,
}

impl Projection {
    fn select(self) -> &'static str {
        match self {
            Projection::CardIds => "select c.id",
            Projection::NoteIds => "select distinct(n.id)",
            Projection::BrowserRows => "select c.id, n.sfld, c.did, c.queue, n.tags",
        }
    }
}

/// Assembles the final statement for `projection`.
///
/// An empty predicate matches every card; `order` is appended verbatim.
pub fn assemble(projection: Projection, predicate: &str, order: &str) -> String {
    let order = if projection == Projection::NoteIds { "" } else { order };
    let needs_notes = projection != Projection::CardIds
        || predicate.contains("n.")
        || order.contains("n.");

    let from = if needs_notes {
        " from cards c, notes n where c.nid=n.id and "
    } else {
        " from cards c where "
    };
    let filter = if predicate.is_empty() {
        "1".to_string()
    } else {
        format!("({predicate})")
    };

    format!("{}{from}{filter}{order}", projection.select())
}
