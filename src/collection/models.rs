use crate::error::FinderResult;
use serde::Deserialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoteTypeKind {
    #[default]
    Standard,
    /// One template whose cards are generated per cloze number.
    Cloze,
}

/// A card template; `ord` is its 0-based position in the note type.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Template {
    pub name: String,
    pub ord: i32,
}

/// Schema of a note: its ordered field names and card templates.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NoteType {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub kind: NoteTypeKind,
    pub fields: Vec<String>,
    pub templates: Vec<Template>,
    /// Index of the field shown in the browser's sort column.
    #[serde(default)]
    pub sort_idx: usize,
}

impl NoteType {
    /// Position of the field called `name`, compared case-insensitively.
    pub fn field_ord(&self, name: &str) -> Option<usize> {
        self.fields
            .iter()
            .position(|f| f.to_lowercase() == name.to_lowercase())
    }

    pub fn is_cloze(&self) -> bool {
        self.kind == NoteTypeKind::Cloze
    }
}

/// Enumerates the note types of a collection.
pub trait SchemaRegistry: Send + Sync {
    fn all(&self) -> &[NoteType];

    fn get(&self, id: i64) -> Option<&NoteType> {
        self.all().iter().find(|m| m.id == id)
    }
}

/// In-memory registry backed by a list of note types.
#[derive(Debug, Clone, Default)]
pub struct ModelSet {
    models: Vec<NoteType>,
}

impl ModelSet {
    pub fn new(models: Vec<NoteType>) -> Self {
        Self { models }
    }

    /// Loads note types from a JSON array.
    pub fn from_json(json: &str) -> FinderResult<Self> {
        let models: Vec<NoteType> = serde_json::from_str(json)?;
        Ok(Self::new(models))
    }
}

impl SchemaRegistry for ModelSet {
    fn all(&self) -> &[NoteType] {
        &self.models
    }
}
