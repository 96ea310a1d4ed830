use crate::error::FinderResult;
use serde::Deserialize;

/// The subset of the collection configuration the finder reads.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionConfig {
    /// Built-in browser sort key, e.g. `noteFld` or `cardDue`.
    #[serde(default = "default_sort_type")]
    pub sort_type: String,

    /// Whether the built-in sort order runs backwards.
    #[serde(default)]
    pub sort_backwards: bool,
}

fn default_sort_type() -> String {
    "noteCrt".to_string()
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            sort_type: default_sort_type(),
            sort_backwards: false,
        }
    }
}

impl CollectionConfig {
    /// Parses the collection's JSON config object. Unknown keys are ignored.
    pub fn from_json(json: &str) -> FinderResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
