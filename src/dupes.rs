//! Duplicate detection over one field.

use crate::collection::models::SchemaRegistry;
use crate::error::{FinderError, FinderResult};
use crate::fields::strip_html_media;
use crate::search::Finder;
use std::collections::HashMap;
use tracing::info;

/// Notes sharing one stripped field value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DupeGroup {
    pub value: String,
    pub nids: Vec<i64>,
}

impl Finder<'_> {
    /// Groups notes by the stripped value of `field_name`.
    ///
    /// Only values shared by two or more notes are reported, ordered by when
    /// the second note was seen. `search` narrows the notes considered. The
    /// field is looked up by name on each note type, so any name works, even
    /// one that reads as a search command. Notes whose type lacks the field,
    /// or whose value strips to blank text, are ignored.
    pub async fn find_dupes(
        &self,
        field_name: &str,
        search: Option<&str>,
    ) -> FinderResult<Vec<DupeGroup>> {
        let defined = self
            .ctx
            .models
            .all()
            .iter()
            .any(|model| model.field_ord(field_name).is_some());
        if !defined {
            return Ok(Vec::new());
        }
        let nids = self.find_notes(search.unwrap_or_default()).await?;

        let mut ords: HashMap<i64, Option<usize>> = HashMap::new();
        let mut groups: Vec<DupeGroup> = Vec::new();
        let mut seen: HashMap<String, Vec<i64>> = HashMap::new();

        for note in self.store.notes_by_ids(&nids).await? {
            let ord = match ords.get(&note.mid) {
                Some(ord) => *ord,
                None => {
                    let model = self.ctx.models.get(note.mid).ok_or_else(|| {
                        FinderError::Schema(format!(
                            "note {} has unknown note type {}",
                            note.id, note.mid
                        ))
                    })?;
                    let ord = model.field_ord(field_name);
                    ords.insert(note.mid, ord);
                    ord
                }
            };
            let Some(raw) = ord.and_then(|ord| note.fields.get(ord)) else {
                continue;
            };
            let value = strip_html_media(raw);
            if value.trim().is_empty() {
                continue;
            }

            let ids = seen.entry(value.clone()).or_default();
            ids.push(note.id);
            if ids.len() == 2 {
                groups.push(DupeGroup {
                    value,
                    nids: Vec::new(),
                });
            }
        }

        for group in &mut groups {
            if let Some(ids) = seen.remove(&group.value) {
                group.nids = ids;
            }
        }
        info!(field = field_name, groups = groups.len(), "found duplicates");

        Ok(groups)
    }
}
