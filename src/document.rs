//! Defines [`Document`], the in-memory form of one source file, along with its
//! [`Status`]. Documents are produced by [`crate::parser`] and aggregated by
//! [`crate::index`].

use chrono::NaiveDateTime;
use std::path::PathBuf;

/// The publication status of a document.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
    Published,
    Draft,
}

impl Default for Status {
    fn default() -> Self {
        Status::Published
    }
}

impl Status {
    /// Parses a `status` metadata value. Only `draft` (in any case) is
    /// recognized; anything else counts as published.
    pub fn from_metadata(value: &str) -> Status {
        if value.trim().eq_ignore_ascii_case("draft") {
            Status::Draft
        } else {
            Status::Published
        }
    }
}

/// A parsed source file: either an article (dated, tagged, categorized, and
/// listed in the indexes and feed) or a standalone page.
#[derive(Clone, Debug, PartialEq)]
pub struct Document {
    /// The path of the source file relative to the source root.
    pub source_path: PathBuf,

    pub title: String,

    /// The site-unique URL path of the document, e.g. `/my-post.html`.
    pub slug: String,

    pub author: Option<String>,

    /// The publication date. Articles are expected to have one; pages rarely
    /// do.
    pub date: Option<NaiveDateTime>,

    /// Tags in the order they were declared. Only meaningful for articles.
    pub tags: Vec<String>,

    /// The name of the directory containing the source file, or the empty
    /// string for files at the source root.
    pub category: String,

    pub status: Status,

    /// The summary as markdown: either declared in the metadata or the first
    /// paragraph of the body.
    pub summary: String,

    /// The unrendered markdown body.
    pub body: String,

    pub is_page: bool,
}

impl Document {
    pub fn is_draft(&self) -> bool {
        self.status == Status::Draft
    }

    /// Returns whether the document carries `tag`. This is an exact match
    /// against one of the declared tags, never a substring search.
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// The URL path at which the document is published. Pages live under
    /// `/pages`.
    pub fn url_path(&self) -> String {
        if self.is_page {
            format!("/pages{}", self.slug)
        } else {
            self.slug.clone()
        }
    }
}

/// Returns the first non-empty paragraph of a markdown body, where paragraphs
/// are separated by a blank line.
pub fn first_paragraph(body: &str) -> &str {
    body.split("\n\n")
        .find(|p| !p.trim().is_empty())
        .unwrap_or("")
}
