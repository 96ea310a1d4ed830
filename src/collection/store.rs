use crate::collection::models::NoteType;
use crate::error::{FinderError, FinderResult};
use crate::fields::{
    canonical_tags, field_checksum, ids_to_sql_list, join_fields, split_fields, strip_html_media,
};
use sqlx::query::Query;
use sqlx::sqlite::{Sqlite, SqliteArguments};
use sqlx::{Row, SqlitePool};
use std::path::Path;

pub const QUEUE_BURIED: i32 = -2;
pub const QUEUE_SUSPENDED: i32 = -1;
pub const QUEUE_NEW: i32 = 0;
pub const QUEUE_LEARN: i32 = 1;
pub const QUEUE_REVIEW: i32 = 2;
pub const QUEUE_DAY_LEARN: i32 = 3;

pub const TYPE_NEW: i32 = 0;
pub const TYPE_LEARN: i32 = 1;
pub const TYPE_REVIEW: i32 = 2;

/// A positional value bound to a `?` placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlArg {
    Text(String),
    Int(i64),
}

/// Binds `args` to `query` in order.
pub(crate) fn bind_args<'q>(
    mut query: Query<'q, Sqlite, SqliteArguments<'q>>,
    args: &[SqlArg],
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    for arg in args {
        query = match arg {
            SqlArg::Text(s) => query.bind(s.clone()),
            SqlArg::Int(i) => query.bind(*i),
        };
    }
    query
}

/// The SQLite row store holding notes, cards and the review log.
pub struct Store {
    pub(crate) pool: SqlitePool,
}

/// A note as stored, with its field blob already split.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteRow {
    pub id: i64,
    pub mid: i64,
    pub modified: i64,
    pub usn: i32,
    pub tags: String,
    pub fields: Vec<String>,
    pub sort_field: String,
    pub checksum: i64,
}

/// Input for [`Store::add_note`].
#[derive(Debug, Clone, Default)]
pub struct NewNote {
    pub id: i64,
    pub mid: i64,
    pub modified: i64,
    pub fields: Vec<String>,
    pub tags: Vec<String>,
}

/// Input for [`Store::add_card`].
#[derive(Debug, Clone, Default)]
pub struct NewCard {
    pub id: i64,
    pub nid: i64,
    pub did: i64,
    pub ord: i32,
    pub modified: i64,
    pub card_type: i32,
    pub queue: i32,
    pub due: i64,
    pub ivl: i64,
    pub factor: i64,
    pub reps: i64,
    pub lapses: i64,
    /// Home deck while the card sits in a filtered deck, otherwise 0.
    pub odid: i64,
}

/// A staged rewrite of one note's fields.
#[derive(Debug, Clone)]
pub(crate) struct NoteUpdate {
    pub id: i64,
    pub flds: String,
    pub sort_field: String,
    pub checksum: i64,
    pub modified: i64,
    pub usn: i32,
}

impl Store {
    /// Opens (creating if needed) `collection.db` inside `dir`.
    pub async fn open(dir: &Path) -> FinderResult<Self> {
        let db_path = dir.join("collection.db");
        let connection_path = format!("sqlite:{}?mode=rwc", db_path.display());

        let pool = SqlitePool::connect(&connection_path).await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS notes (
                id INTEGER PRIMARY KEY,
                mid INTEGER NOT NULL,
                mod INTEGER NOT NULL,
                usn INTEGER NOT NULL,
                tags TEXT NOT NULL DEFAULT '',
                flds TEXT NOT NULL,
                sfld TEXT NOT NULL,
                csum INTEGER NOT NULL
            )",
        )
        .execute(&pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS cards (
                id INTEGER PRIMARY KEY,
                nid INTEGER NOT NULL,
                did INTEGER NOT NULL,
                ord INTEGER NOT NULL,
                mod INTEGER NOT NULL,
                usn INTEGER NOT NULL,
                type INTEGER NOT NULL,
                queue INTEGER NOT NULL,
                due INTEGER NOT NULL,
                ivl INTEGER NOT NULL,
                factor INTEGER NOT NULL,
                reps INTEGER NOT NULL,
                lapses INTEGER NOT NULL,
                odid INTEGER NOT NULL DEFAULT 0
            )",
        )
        .execute(&pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS revlog (
                id INTEGER PRIMARY KEY,
                cid INTEGER NOT NULL,
                ease INTEGER NOT NULL
            )",
        )
        .execute(&pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS ix_cards_nid ON cards (nid)")
            .execute(&pool)
            .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS ix_notes_csum ON notes (csum)")
            .execute(&pool)
            .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS ix_revlog_cid ON revlog (cid)")
            .execute(&pool)
            .await?;

        Ok(Store { pool })
    }

    /// Inserts or replaces a note, deriving its sort field and checksum from `model`.
    pub async fn add_note(&self, model: &NoteType, note: &NewNote) -> FinderResult<()> {
        if note.mid != model.id {
            return Err(FinderError::Schema(format!(
                "note {} belongs to note type {}, not {}",
                note.id, note.mid, model.id
            )));
        }
        if note.fields.len() != model.fields.len() {
            return Err(FinderError::Schema(format!(
                "note {} has {} fields, note type {} defines {}",
                note.id,
                note.fields.len(),
                model.name,
                model.fields.len()
            )));
        }
        let (sort_field, checksum) = derived_columns(model, &note.fields)?;

        sqlx::query(
            "INSERT OR REPLACE INTO notes (id, mid, mod, usn, tags, flds, sfld, csum)
            VALUES (?, ?, ?, 0, ?, ?, ?, ?)",
        )
        .bind(note.id)
        .bind(note.mid)
        .bind(note.modified)
        .bind(canonical_tags(&note.tags))
        .bind(join_fields(&note.fields))
        .bind(sort_field)
        .bind(checksum)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn add_card(&self, card: &NewCard) -> FinderResult<()> {
        sqlx::query(
            "INSERT OR REPLACE INTO cards
                (id, nid, did, ord, mod, usn, type, queue, due, ivl, factor, reps, lapses, odid)
            VALUES (?, ?, ?, ?, ?, 0, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(card.id)
        .bind(card.nid)
        .bind(card.did)
        .bind(card.ord)
        .bind(card.modified)
        .bind(card.card_type)
        .bind(card.queue)
        .bind(card.due)
        .bind(card.ivl)
        .bind(card.factor)
        .bind(card.reps)
        .bind(card.lapses)
        .bind(card.odid)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Records a review; `id` is the review time in epoch milliseconds.
    pub async fn add_review(&self, id: i64, cid: i64, ease: i32) -> FinderResult<()> {
        sqlx::query("INSERT OR REPLACE INTO revlog (id, cid, ease) VALUES (?, ?, ?)")
            .bind(id)
            .bind(cid)
            .bind(ease)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    pub async fn get_note(&self, id: i64) -> FinderResult<Option<NoteRow>> {
        let row = sqlx::query(
            "SELECT id, mid, mod, usn, tags, flds, sfld, csum FROM notes WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| note_from_row(&row)))
    }

    /// Loads the given notes in id order. Unknown ids are ignored.
    pub async fn notes_by_ids(&self, ids: &[i64]) -> FinderResult<Vec<NoteRow>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT id, mid, mod, usn, tags, flds, sfld, csum FROM notes WHERE id IN {} ORDER BY id",
            ids_to_sql_list(ids)
        );
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;

        Ok(rows.iter().map(note_from_row).collect())
    }

    /// `(id, flds)` of notes of type `mid` with the given first-field checksum.
    pub(crate) async fn notes_with_checksum(
        &self,
        mid: i64,
        checksum: i64,
    ) -> FinderResult<Vec<(i64, String)>> {
        let rows = sqlx::query("SELECT id, flds FROM notes WHERE mid = ? AND csum = ? ORDER BY id")
            .bind(mid)
            .bind(checksum)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(|row| (row.get(0), row.get(1))).collect())
    }

    /// Runs a statement selecting `id, mid, flds` from notes.
    pub(crate) async fn query_note_fields(
        &self,
        sql: &str,
        args: &[SqlArg],
    ) -> FinderResult<Vec<(i64, i64, String)>> {
        let rows = bind_args(sqlx::query(sql), args)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .iter()
            .map(|row| (row.get(0), row.get(1), row.get(2)))
            .collect())
    }

    /// Runs a statement whose first column is an id and collects that column.
    pub(crate) async fn query_ids(&self, sql: &str, args: &[SqlArg]) -> Result<Vec<i64>, sqlx::Error> {
        let rows = bind_args(sqlx::query(sql), args)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(|row| row.get::<i64, _>(0)).collect())
    }

    /// Applies every staged update in one transaction.
    pub(crate) async fn update_notes(&self, updates: &[NoteUpdate]) -> FinderResult<()> {
        let mut tx = self.pool.begin().await?;
        for update in updates {
            sqlx::query("UPDATE notes SET flds = ?, sfld = ?, csum = ?, mod = ?, usn = ? WHERE id = ?")
                .bind(update.flds.as_str())
                .bind(update.sort_field.as_str())
                .bind(update.checksum)
                .bind(update.modified)
                .bind(update.usn)
                .bind(update.id)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;

        Ok(())
    }
}

/// Sort-field text and first-field checksum for a note of type `model`.
pub(crate) fn derived_columns(model: &NoteType, fields: &[String]) -> FinderResult<(String, i64)> {
    let sort_field = fields.get(model.sort_idx).ok_or_else(|| {
        FinderError::Schema(format!(
            "note type {} has sort field {} but the note has {} fields",
            model.name,
            model.sort_idx,
            fields.len()
        ))
    })?;
    let first = fields.first().map(String::as_str).unwrap_or_default();

    Ok((strip_html_media(sort_field), field_checksum(first)))
}

fn note_from_row(row: &sqlx::sqlite::SqliteRow) -> NoteRow {
    let flds: String = row.get(5);
    NoteRow {
        id: row.get(0),
        mid: row.get(1),
        modified: row.get(2),
        usn: row.get(3),
        tags: row.get(4),
        fields: split_fields(&flds),
        sort_field: row.get(6),
        checksum: row.get(7),
    }
}
