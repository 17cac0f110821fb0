//! Slug helpers. A slug is the canonical URL path of a rendered document,
//! always of the form `/<segment>.html`.

use once_cell::sync::Lazy;
use regex::Regex;

pub const HTML_EXTENSION: &str = ".html";

static NON_SLUG_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s-]").unwrap());
static SEPARATORS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[-\s]+").unwrap());

/// Turns free text (usually a title) into a URL-friendly fragment: anything
/// that isn't a word character, whitespace or `-` is dropped, runs of
/// whitespace and dashes collapse into a single `-`, and the result is
/// lower-cased.
pub fn slugify(text: &str) -> String {
    let stripped = NON_SLUG_CHARS.replace_all(text, "");
    SEPARATORS.replace_all(&stripped, "-").to_lowercase()
}

/// Normalizes a user-provided slug so it has exactly one leading `/` and
/// exactly one trailing `.html`.
pub fn normalize(value: &str) -> String {
    let mut stem = value.trim().trim_start_matches('/');
    while let Some(rest) = stem.strip_suffix(HTML_EXTENSION) {
        stem = rest;
    }
    format!("/{}{}", stem, HTML_EXTENSION)
}

/// Builds the slug for a document that didn't declare one.
pub fn from_title(title: &str) -> String {
    format!("/{}{}", slugify(title), HTML_EXTENSION)
}
