//! Helpers for the delimited field blob stored on every note, plus the
//! markup stripping and checksum used for duplicate detection.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use sha2::{Digest, Sha256};

/// Separator between field values inside a note's `flds` column.
pub const FIELD_SEPARATOR: char = '\x1f';

static MEDIA_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)<img[^>]+src=["']?([^"'>]+)["']?[^>]*>"#).expect("valid media regex")
});
static COMMENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<!--.*?-->").expect("valid comment regex"));
static STYLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?si)<style.*?>.*?</style>").expect("valid style regex"));
static SCRIPT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?si)<script.*?>.*?</script>").expect("valid script regex"));
static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<.*?>").expect("valid tag regex"));
static ENTITY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"&(#x[0-9a-fA-F]+|#[0-9]+|[a-zA-Z]+);").expect("valid entity regex"));

/// Splits a field blob into its per-slot values.
pub fn split_fields(flds: &str) -> Vec<String> {
    flds.split(FIELD_SEPARATOR).map(str::to_owned).collect()
}

/// Joins per-slot values back into a field blob.
pub fn join_fields<S: AsRef<str>>(fields: &[S]) -> String {
    let mut out = String::new();
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            out.push(FIELD_SEPARATOR);
        }
        out.push_str(field.as_ref());
    }
    out
}

/// Removes HTML markup from a field value, keeping image file names as text.
///
/// `<img src="x.jpg">` becomes ` x.jpg `; comments, style and script blocks
/// are dropped entirely; remaining tags are removed and entities decoded.
pub fn strip_html_media(value: &str) -> String {
    let value = MEDIA_RE.replace_all(value, " $1 ");
    strip_html(&value)
}

/// Removes HTML markup from a field value.
pub fn strip_html(value: &str) -> String {
    let value = COMMENT_RE.replace_all(value, "");
    let value = STYLE_RE.replace_all(&value, "");
    let value = SCRIPT_RE.replace_all(&value, "");
    let value = TAG_RE.replace_all(&value, "");
    decode_entities(&value)
}

fn decode_entities(value: &str) -> String {
    ENTITY_RE
        .replace_all(value, |caps: &Captures| {
            let name = &caps[1];
            let decoded = if let Some(hex) = name.strip_prefix("#x") {
                u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
            } else if let Some(dec) = name.strip_prefix('#') {
                dec.parse::<u32>().ok().and_then(char::from_u32)
            } else {
                match name {
                    "nbsp" => Some(' '),
                    "amp" => Some('&'),
                    "lt" => Some('<'),
                    "gt" => Some('>'),
                    "quot" => Some('"'),
                    "apos" => Some('\''),
                    _ => None,
                }
            };
            match decoded {
                Some(c) => c.to_string(),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

/// Checksum of a field's stripped text, stored in the `csum` column.
///
/// The first four bytes of the SHA-256 digest, read big-endian.
pub fn field_checksum(value: &str) -> i64 {
    let stripped = strip_html_media(value);
    let digest = Sha256::digest(stripped.as_bytes());
    i64::from(u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]]))
}

/// Renders ids as a parenthesised SQL list, e.g. `(1,2,3)`.
pub fn ids_to_sql_list(ids: &[i64]) -> String {
    let joined = ids
        .iter()
        .map(i64::to_string)
        .collect::<Vec<_>>()
        .join(",");
    format!("({joined})")
}

/// Puts a tag list in the padded form stored in the `tags` column.
///
/// Tags are stored as `" a b "` so a single `like '% tag %'` matches a whole
/// tag; an untagged note stores the empty string.
pub fn canonical_tags<S: AsRef<str>>(tags: &[S]) -> String {
    let tags: Vec<&str> = tags
        .iter()
        .map(|t| t.as_ref().trim())
        .filter(|t| !t.is_empty())
        .collect();
    if tags.is_empty() {
        String::new()
    } else {
        format!(" {} ", tags.join(" "))
    }
}
