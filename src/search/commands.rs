//! Interpreters for `key:value` search commands and free text.
//!
//! Each interpreter turns the text after the colon into a [`Clause`]. They
//! only read the snapshots in [`SearchContext`]; `dupe:` is the one command
//! that also consults the store.

use crate::collection::{SchedulerSnapshot, SearchContext};
use crate::collection::decks::DeckHierarchy;
use crate::collection::models::SchemaRegistry;
use crate::collection::store::{SqlArg, Store};
use crate::error::FinderResult;
use crate::fields::{field_checksum, ids_to_sql_list, split_fields, strip_html_media};
use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};

const SECONDS_PER_DAY: i64 = 86_400;
const MAX_RATED_DAYS: i64 = 31;

static PROP_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(.+?)(<=|>=|!=|=|<|>)(.+)$").expect("valid prop regex"));

/// What a single search term contributes to the predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Clause {
    /// A SQL boolean expression.
    Sql(String),
    /// Valid, but matches everything (e.g. `deck:*`).
    Skip,
    /// The term could not be interpreted.
    Invalid,
}

impl Clause {
    /// `Invalid` when `sql` is empty.
    fn non_empty(sql: String) -> Clause {
        if sql.is_empty() {
            Clause::Invalid
        } else {
            Clause::Sql(sql)
        }
    }
}

/// Recognised command keywords. Any other key names a note field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Added,
    Card,
    Cid,
    Deck,
    Dupe,
    Is,
    Mid,
    Nid,
    Note,
    Prop,
    Rated,
    Tag,
}

impl Command {
    /// Looks up a lowercased keyword.
    pub fn parse(key: &str) -> Option<Command> {
        Some(match key {
            "added" => Command::Added,
            "card" => Command::Card,
            "cid" => Command::Cid,
            "deck" => Command::Deck,
            "dupe" => Command::Dupe,
            "is" => Command::Is,
            "mid" => Command::Mid,
            "nid" => Command::Nid,
            "note" => Command::Note,
            "prop" => Command::Prop,
            "rated" => Command::Rated,
            "tag" => Command::Tag,
            _ => return None,
        })
    }
}

/// Interprets `command` applied to `value`, appending any bound arguments to `args`.
pub(crate) async fn interpret(
    command: Command,
    value: &str,
    ctx: &SearchContext<'_>,
    store: &Store,
    args: &mut Vec<SqlArg>,
) -> FinderResult<Clause> {
    let clause = match command {
        Command::Added => find_added(value, &ctx.sched),
        Command::Card => find_template(value, ctx.models),
        Command::Cid => find_id_list("c.id", value),
        Command::Deck => find_deck(value, ctx.decks),
        Command::Dupe => find_dupe(value, store).await?,
        Command::Is => find_card_state(value, &ctx.sched),
        Command::Mid => find_mid(value),
        Command::Nid => find_id_list("n.id", value),
        Command::Note => find_model(value, ctx.models),
        Command::Prop => find_prop(value, &ctx.sched),
        Command::Rated => find_rated(value, &ctx.sched),
        Command::Tag => find_tag(value, args),
    };
    Ok(clause)
}

/// Epoch milliseconds `days` days before the end of today, or `None` on overflow.
fn cutoff_millis(sched: &SchedulerSnapshot, days: i64) -> Option<i64> {
    let seconds = sched.day_cutoff.checked_sub(days.checked_mul(SECONDS_PER_DAY)?)?;
    seconds.checked_mul(1000)
}

/// `added:N`: cards created in the last N days. Card ids are creation times.
pub fn find_added(value: &str, sched: &SchedulerSnapshot) -> Clause {
    let Some(cutoff) = value
        .parse::<i64>()
        .ok()
        .and_then(|days| cutoff_millis(sched, days))
    else {
        return Clause::Invalid;
    };
    Clause::Sql(format!("c.id > {cutoff}"))
}

/// `rated:N` or `rated:N:EASE`: cards reviewed in the last N days (at most 31).
pub fn find_rated(value: &str, sched: &SchedulerSnapshot) -> Clause {
    let mut parts = value.split(':');
    let Some(Ok(days)) = parts.next().map(str::parse::<i64>) else {
        return Clause::Invalid;
    };
    let Some(cutoff) = cutoff_millis(sched, days.min(MAX_RATED_DAYS)) else {
        return Clause::Invalid;
    };

    let ease = match parts.next() {
        None => String::new(),
        Some(e @ ("1" | "2" | "3" | "4")) => format!(" and ease = {e}"),
        Some(_) => return Clause::Invalid,
    };
    Clause::Sql(format!(
        "c.id in (select cid from revlog where id > {cutoff}{ease})"
    ))
}

/// `prop:PROP<op>VALUE` over due, ivl, reps, lapses and ease.
pub fn find_prop(value: &str, sched: &SchedulerSnapshot) -> Clause {
    let Some(caps) = PROP_RE.captures(value) else {
        return Clause::Invalid;
    };
    let prop = caps[1].to_lowercase();
    let cmp = &caps[2];
    let raw = &caps[3];

    let parsed = if prop == "ease" {
        raw.parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .map(|v| (v * 1000.0).round() as i64)
    } else {
        raw.parse::<i64>().ok()
    };
    let Some(val) = parsed else {
        return Clause::Invalid;
    };

    match prop.as_str() {
        // due is stored relative to collection creation; only review and day-learn cards have one
        "due" => match val.checked_add(sched.today) {
            Some(due) => Clause::Sql(format!("(c.queue in (2,3)) and (c.due {cmp} {due})")),
            None => Clause::Invalid,
        },
        "ease" => Clause::Sql(format!("(c.factor {cmp} {val})")),
        "ivl" | "reps" | "lapses" => Clause::Sql(format!("(c.{prop} {cmp} {val})")),
        _ => Clause::Invalid,
    }
}

/// `tag:none` or `tag:PATTERN`, matched against the padded tag string.
pub fn find_tag(value: &str, args: &mut Vec<SqlArg>) -> Clause {
    if value == "none" {
        return Clause::Sql("n.tags = ''".to_string());
    }
    let mut pattern = value.replace('*', "%");
    if !pattern.starts_with('%') {
        pattern.insert_str(0, "% ");
    }
    if !pattern.ends_with('%') {
        pattern.push_str(" %");
    }
    args.push(SqlArg::Text(pattern));
    Clause::Sql("n.tags like ?".to_string())
}

/// `is:new|review|learn|suspended|buried|due`.
pub fn find_card_state(value: &str, sched: &SchedulerSnapshot) -> Clause {
    let sql = match value {
        "new" => "c.type = 0".to_string(),
        "review" => "c.type = 2".to_string(),
        "learn" => "c.queue in (1, 3)".to_string(),
        "suspended" => "c.queue = -1".to_string(),
        "buried" => "c.queue = -2".to_string(),
        "due" => format!(
            "(c.queue in (2,3) and c.due <= {}) or (c.queue = 1 and c.due <= {})",
            sched.today, sched.day_cutoff
        ),
        _ => return Clause::Invalid,
    };
    Clause::Sql(sql)
}

/// `deck:*`, `deck:filtered`, `deck:current`, `deck:NAME` or `deck:GLOB`.
///
/// Named and globbed decks include their descendants, and match cards whose
/// home deck is the target while they are borrowed by a filtered deck.
pub fn find_deck(value: &str, decks: &dyn DeckHierarchy) -> Clause {
    if value == "*" {
        return Clause::Skip;
    }
    if value == "filtered" {
        return Clause::Sql("c.odid".to_string());
    }

    let ids = if value.eq_ignore_ascii_case("current") {
        decks.with_descendants(decks.current())
    } else if !value.contains('*') {
        decks
            .id_for_name(value)
            .and_then(|id| decks.with_descendants(id))
    } else {
        let pattern = value
            .split('*')
            .map(regex::escape)
            .collect::<Vec<_>>()
            .join(".*");
        let Ok(re) = RegexBuilder::new(&format!("^{pattern}$"))
            .case_insensitive(true)
            .build()
        else {
            return Clause::Invalid;
        };

        let mut ids: Vec<i64> = Vec::new();
        for deck in decks.all().iter().filter(|d| re.is_match(&d.name)) {
            for id in decks.with_descendants(deck.id).unwrap_or_default() {
                if !ids.contains(&id) {
                    ids.push(id);
                }
            }
        }
        Some(ids)
    };

    match ids {
        Some(ids) if !ids.is_empty() => {
            let list = ids_to_sql_list(&ids);
            Clause::Sql(format!("c.did in {list} or c.odid in {list}"))
        }
        _ => Clause::Invalid,
    }
}

/// `card:N` (1-based template ordinal) or `card:TEMPLATE_NAME`.
pub fn find_template(value: &str, models: &dyn SchemaRegistry) -> Clause {
    if let Ok(num) = value.parse::<i64>() {
        return match num.checked_sub(1) {
            Some(ord) => Clause::Sql(format!("c.ord = {ord}")),
            None => Clause::Invalid,
        };
    }

    let mut limits = Vec::new();
    for model in models.all() {
        for template in &model.templates {
            if template.name.to_lowercase() != value.to_lowercase() {
                continue;
            }
            if model.is_cloze() {
                // every cloze number shares the one template, so match the note type alone
                limits.push(format!("(n.mid = {})", model.id));
            } else {
                limits.push(format!(
                    "(n.mid = {} and c.ord = {})",
                    model.id, template.ord
                ));
            }
        }
    }
    Clause::non_empty(limits.join(" or "))
}

/// `note:NAME`: cards whose note type is called NAME.
pub fn find_model(value: &str, models: &dyn SchemaRegistry) -> Clause {
    let ids: Vec<i64> = models
        .all()
        .iter()
        .filter(|m| m.name.to_lowercase() == value.to_lowercase())
        .map(|m| m.id)
        .collect();
    Clause::Sql(format!("n.mid in {}", ids_to_sql_list(&ids)))
}

/// `mid:N`: exact note-type id.
pub fn find_mid(value: &str) -> Clause {
    if value.is_empty() || !value.chars().all(|c| c.is_ascii_digit()) {
        return Clause::Invalid;
    }
    Clause::Sql(format!("n.mid = {value}"))
}

/// `nid:1,2,3` / `cid:1,2,3`: membership of `column` in a literal id list.
pub fn find_id_list(column: &str, value: &str) -> Clause {
    if value.is_empty() || !value.chars().all(|c| c.is_ascii_digit() || c == ',') {
        return Clause::Invalid;
    }
    let ids: Result<Vec<i64>, _> = value.split(',').map(str::parse::<i64>).collect();
    match ids {
        Ok(ids) => Clause::Sql(format!("{column} in {}", ids_to_sql_list(&ids))),
        Err(_) => Clause::Invalid,
    }
}

/// Free text, matched anywhere in the sort field or the raw field blob.
pub fn find_text(value: &str, args: &mut Vec<SqlArg>) -> Clause {
    let pattern = format!("%{}%", value.replace('*', "%"));
    args.push(SqlArg::Text(pattern.clone()));
    args.push(SqlArg::Text(pattern));
    Clause::Sql("(n.sfld like ? escape '\\' or n.flds like ? escape '\\')".to_string())
}

/// `dupe:MID,VALUE`: notes of type MID whose stripped first field equals VALUE.
///
/// VALUE must already be stripped of markup.
pub async fn find_dupe(value: &str, store: &Store) -> FinderResult<Clause> {
    let Some((mid, text)) = value.split_once(',') else {
        return Ok(Clause::Invalid);
    };
    let Ok(mid) = mid.parse::<i64>() else {
        return Ok(Clause::Invalid);
    };

    let candidates = store.notes_with_checksum(mid, field_checksum(text)).await?;
    let nids: Vec<i64> = candidates
        .into_iter()
        .filter(|(_, flds)| {
            split_fields(flds)
                .first()
                .is_some_and(|first| strip_html_media(first) == text)
        })
        .map(|(id, _)| id)
        .collect();

    Ok(Clause::Sql(format!("n.id in {}", ids_to_sql_list(&nids))))
}
