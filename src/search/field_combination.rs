//! Folds every `field:value` term of a query into a single probe.
//!
//! Searching each field separately would scan the notes table once per
//! term. Instead the requested patterns are grouped by field, expanded into
//! every combination (one pattern per field), and matched against the raw
//! field blob of each note type that defines at least one of the fields. The
//! matching note ids are then handed back as a plain `n.id in (...)` clause.

use crate::collection::models::SchemaRegistry;
use crate::collection::store::{SqlArg, Store};
use crate::error::{FinderError, FinderResult};
use crate::fields::{ids_to_sql_list, split_fields};
use crate::search::commands::Clause;
use itertools::Itertools;
use regex::{Regex, RegexBuilder};
use std::collections::BTreeMap;
use tracing::debug;

/// Joins per-slot LIKE patterns in the same way the blob joins field values.
const SQL_FIELD_JOIN: &str = "||char(31)||";

/// Terms or'd together in one probe statement. SQLite rejects expression
/// trees deeper than 1000.
const TERMS_PER_PROBE: usize = 250;

/// One requested value for a field, in both of the forms needed to match it.
struct FieldPattern {
    /// LIKE pattern for the SQL prefilter (`*` → `%`, `%` and `\` escaped).
    like: String,
    /// Whole-value, case-insensitive matcher used to confirm a candidate.
    matcher: Regex,
}

impl FieldPattern {
    fn new(value: &str) -> FinderResult<Self> {
        let like = value
            .replace('\\', "\\\\")
            .replace('%', "\\%")
            .replace('*', "%");

        let mut pattern = String::from("^");
        for c in value.chars() {
            match c {
                '*' => pattern.push_str(".*"),
                '_' => pattern.push('.'),
                _ => pattern.push_str(&regex::escape(c.encode_utf8(&mut [0; 4]))),
            }
        }
        pattern.push('$');
        let matcher = RegexBuilder::new(&pattern)
            .case_insensitive(true)
            .dot_matches_new_line(true)
            .build()?;

        Ok(Self { like, matcher })
    }
}

/// A note type that defines at least one requested field.
struct ModelSlots {
    mid: i64,
    /// For each field position of the note type, the index of the requested
    /// field stored there, if any.
    slots: Vec<Option<usize>>,
}

/// Groups field commands by lowercased field name, keeping first-seen order
/// and every repeated value.
fn group_by_field(commands: &[(String, String)]) -> FinderResult<Vec<(String, Vec<FieldPattern>)>> {
    let mut grouped: Vec<(String, Vec<FieldPattern>)> = Vec::new();
    for (field, value) in commands {
        let field = field.to_lowercase();
        let pattern = FieldPattern::new(value)?;
        match grouped.iter_mut().find(|(name, _)| *name == field) {
            Some((_, patterns)) => patterns.push(pattern),
            None => grouped.push((field, vec![pattern])),
        }
    }
    Ok(grouped)
}

/// Every way of picking one pattern index per field. The first field varies slowest.
pub fn combinations(sizes: &[usize]) -> Vec<Vec<usize>> {
    sizes
        .iter()
        .map(|&n| 0..n)
        .multi_cartesian_product()
        .collect()
}

/// Resolves all deferred `field:value` commands to one clause.
///
/// Returns [`Clause::Invalid`] when no note type has any of the fields, and
/// the unsatisfiable `0` when the probe finds no notes.
pub(crate) async fn find_fields(
    commands: &[(String, String)],
    models: &dyn SchemaRegistry,
    store: &Store,
) -> FinderResult<Clause> {
    debug!(terms = commands.len(), "resolving field terms");
    let fields = group_by_field(commands)?;

    let mut targets: Vec<ModelSlots> = Vec::new();
    for model in models.all() {
        let slots: Vec<Option<usize>> = model
            .fields
            .iter()
            .map(|name| {
                let name = name.to_lowercase();
                fields.iter().position(|(field, _)| *field == name)
            })
            .collect();
        if slots.iter().any(Option::is_some) {
            targets.push(ModelSlots {
                mid: model.id,
                slots,
            });
        }
    }
    if targets.is_empty() {
        return Ok(Clause::Invalid);
    }

    let sizes: Vec<usize> = fields.iter().map(|(_, patterns)| patterns.len()).collect();
    let combos = combinations(&sizes);

    let mut terms: Vec<(String, Vec<SqlArg>)> = Vec::new();
    for target in &targets {
        let placeholders = vec!["?"; target.slots.len()].join(SQL_FIELD_JOIN);
        for combo in &combos {
            let mut args = vec![SqlArg::Int(target.mid)];
            for slot in &target.slots {
                let like = match slot {
                    Some(fi) => fields[*fi].1[combo[*fi]].like.clone(),
                    None => "%".to_string(),
                };
                args.push(SqlArg::Text(like));
            }
            terms.push((format!("(mid = ? and flds like {placeholders} escape '\\')"), args));
        }
    }

    debug!(
        note_types = targets.len(),
        combinations = combos.len(),
        statements = terms.len().div_ceil(TERMS_PER_PROBE),
        "probing notes for field terms"
    );
    // a note can match terms in more than one statement
    let mut candidates: BTreeMap<i64, (i64, String)> = BTreeMap::new();
    for chunk in terms.chunks(TERMS_PER_PROBE) {
        let sql = format!(
            "select id, mid, flds from notes where {}",
            chunk.iter().map(|(term, _)| term.as_str()).join(" or ")
        );
        let args: Vec<SqlArg> = chunk.iter().flat_map(|(_, args)| args.iter().cloned()).collect();
        for (nid, mid, flds) in store.query_note_fields(&sql, &args).await? {
            candidates.insert(nid, (mid, flds));
        }
    }

    // LIKE cannot keep a match-any slot from spanning the separator, so
    // confirm each candidate slot by slot.
    let mut nids = Vec::new();
    for (nid, (mid, flds)) in candidates {
        let Some(target) = targets.iter().find(|t| t.mid == mid) else {
            continue;
        };
        let values = split_fields(&flds);
        if values.len() != target.slots.len() {
            return Err(FinderError::Schema(format!(
                "note {nid} has {} fields but note type {mid} defines {}",
                values.len(),
                target.slots.len()
            )));
        }
        let matched = combos.iter().any(|combo| {
            target.slots.iter().zip(&values).all(|(slot, value)| match slot {
                Some(fi) => fields[*fi].1[combo[*fi]].matcher.is_match(value),
                None => true,
            })
        });
        if matched {
            nids.push(nid);
        }
    }
    debug!(matched = nids.len(), "field terms resolved");

    if nids.is_empty() {
        return Ok(Clause::Sql("0".to_string()));
    }
    Ok(Clause::Sql(format!("n.id in {}", ids_to_sql_list(&nids))))
}
