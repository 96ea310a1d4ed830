//! Turns a sort request into an `order by` clause.

use crate::collection::config::CollectionConfig;

/// How a card search should be ordered.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum OrderSpec {
    /// No ordering.
    #[default]
    None,
    /// `true` uses the collection's configured browser sort; `false` means no ordering.
    Builtin(bool),
    /// Caller-supplied SQL placed after `order by` as-is.
    Explicit(String),
}

/// An ordering clause (possibly empty) and whether results must be reversed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResolvedOrder {
    pub clause: String,
    pub reversed: bool,
}

/// Fallback when the configured sort type is unknown.
const DEFAULT_SORT: &str = "n.id, c.ord";

/// Maps a configured sort-type key to its column expression by prefix.
pub fn sort_column(sort_type: &str) -> &'static str {
    const COLUMNS: &[(&str, &str)] = &[
        ("noteCrt", "n.id, c.ord"),
        ("noteMod", "n.mod, c.ord"),
        ("noteFld", "n.sfld collate nocase, c.ord"),
        ("cardMod", "c.mod"),
        ("cardReps", "c.reps"),
        ("cardDue", "c.type, c.due"),
        ("cardEase", "c.factor"),
        ("cardLapses", "c.lapses"),
        ("cardIvl", "c.ivl"),
    ];
    COLUMNS
        .iter()
        .find(|(prefix, _)| sort_type.starts_with(prefix))
        .map(|(_, column)| *column)
        .unwrap_or(DEFAULT_SORT)
}

pub fn resolve_order(order: &OrderSpec, config: &CollectionConfig) -> ResolvedOrder {
    match order {
        OrderSpec::None | OrderSpec::Builtin(false) => ResolvedOrder::default(),
        OrderSpec::Explicit(clause) if clause.is_empty() => ResolvedOrder::default(),
        OrderSpec::Explicit(clause) => ResolvedOrder {
            clause: format!(" order by {clause}"),
            reversed: false,
        },
        OrderSpec::Builtin(true) => ResolvedOrder {
            clause: format!(" order by {}", sort_column(&config.sort_type)),
            reversed: config.sort_backwards,
        },
    }
}
