//! Bulk find-and-replace over note fields.

use crate::collection::models::SchemaRegistry;
use crate::collection::store::{NoteUpdate, derived_columns};
use crate::error::{FinderError, FinderResult};
use crate::fields::join_fields;
use crate::search::Finder;
use chrono::Utc;
use regex::{NoExpand, RegexBuilder};
use std::collections::HashMap;
use tracing::{debug, info};

/// Receives the ids of notes whose fields were rewritten, so that derived
/// rows (e.g. generated cards) can be refreshed.
pub trait ChangeSink {
    fn notes_changed(&self, nids: &[i64]);
}

/// Discards change notifications.
impl ChangeSink for () {
    fn notes_changed(&self, _nids: &[i64]) {}
}

/// Options controlling how `source` is matched.
#[derive(Debug, Clone)]
pub struct ReplaceOptions {
    /// Treat `source` as a regular expression; `replacement` may then use `$1`.
    ///
    /// Defaults to `false`.
    pub regex: bool,

    /// Only rewrite this field (exact name); notes whose type lacks it are skipped.
    ///
    /// Defaults to `None` (every field).
    pub field: Option<String>,

    /// Match case-insensitively.
    ///
    /// Defaults to `true`.
    pub fold: bool,
}

impl Default for ReplaceOptions {
    fn default() -> Self {
        Self {
            regex: false,
            field: None,
            fold: true,
        }
    }
}

impl Finder<'_> {
    /// Replaces `source` with `replacement` in the fields of `nids`.
    ///
    /// Returns the number of notes changed. Changed notes are written in one
    /// transaction and then reported to `sink`; when nothing changes the
    /// store is not touched.
    pub async fn find_replace(
        &self,
        nids: &[i64],
        source: &str,
        replacement: &str,
        options: &ReplaceOptions,
        sink: &dyn ChangeSink,
    ) -> FinderResult<usize> {
        let mut field_ords: HashMap<i64, usize> = HashMap::new();
        if let Some(field) = &options.field {
            for model in self.ctx.models.all() {
                if let Some(ord) = model.fields.iter().position(|f| f == field) {
                    field_ords.insert(model.id, ord);
                }
            }
            if field_ords.is_empty() {
                return Ok(0);
            }
        }

        let pattern = if options.regex {
            source.to_string()
        } else {
            regex::escape(source)
        };
        let re = RegexBuilder::new(&pattern)
            .case_insensitive(options.fold)
            .build()?;
        let rewrite = |value: &str| -> String {
            if options.regex {
                re.replace_all(value, replacement).into_owned()
            } else {
                re.replace_all(value, NoExpand(replacement)).into_owned()
            }
        };

        let now = Utc::now().timestamp();
        let mut updates = Vec::new();
        for note in self.store.notes_by_ids(nids).await? {
            let mut fields = note.fields.clone();
            if options.field.is_some() {
                let Some(&ord) = field_ords.get(&note.mid) else {
                    continue;
                };
                let Some(value) = fields.get_mut(ord) else {
                    return Err(FinderError::Schema(format!(
                        "note {} has no field at position {ord}",
                        note.id
                    )));
                };
                *value = rewrite(value.as_str());
            } else {
                for value in fields.iter_mut() {
                    *value = rewrite(value.as_str());
                }
            }

            if fields == note.fields {
                continue;
            }
            let model = self.ctx.models.get(note.mid).ok_or_else(|| {
                FinderError::Schema(format!("note {} has unknown note type {}", note.id, note.mid))
            })?;
            let (sort_field, checksum) = derived_columns(model, &fields)?;
            updates.push(NoteUpdate {
                id: note.id,
                flds: join_fields(&fields),
                sort_field,
                checksum,
                modified: now,
                usn: self.ctx.usn,
            });
        }

        if updates.is_empty() {
            debug!(candidates = nids.len(), "replace changed nothing");
            return Ok(0);
        }
        self.store.update_notes(&updates).await?;

        let changed: Vec<i64> = updates.iter().map(|u| u.id).collect();
        sink.notes_changed(&changed);
        info!(changed = changed.len(), "replaced field text");

        Ok(changed.len())
    }

    /// Runs `query` and replaces text in the notes it matches.
    pub async fn find_replace_matching(
        &self,
        query: &str,
        source: &str,
        replacement: &str,
        options: &ReplaceOptions,
        sink: &dyn ChangeSink,
    ) -> FinderResult<usize> {
        let nids = self.find_notes(query).await?;
        self.find_replace(&nids, source, replacement, options, sink)
            .await
    }
}
