//! Parses a single source file into a [`Document`]. A source file is an
//! optional metadata block followed by a title line and a markdown body.
//!
//! Two metadata dialects are accepted:
//!
//! * Fenced (Jekyll style): `key: value` lines enclosed between two `---`
//!   lines.
//! * Unfenced (Pelican style): bare `key: value` lines at the top of the file.
//!   The block ends at the first line which isn't a recognized field.
//!
//! ```md
//! Title: My super title
//! Date: 2010-12-03 10:20
//! Tags: thats, awesome
//!
//! My super title
//! ==============
//!
//! The body.
//! ```
//!
//! If the file has no metadata at all, parsing restarts from the first byte
//! and the whole input is treated as title + body.

use crate::document::{first_paragraph, Document, Status};
use crate::slug;
use chrono::{NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;

const FENCE: &str = "---";

/// Directory name which marks its contents as standalone pages.
pub const PAGES_DIRECTORY: &str = "pages";

/// The accepted `date` layouts, tried in order. The boolean tells whether the
/// layout carries a time of day.
const DATE_LAYOUTS: [(&str, bool); 4] = [
    ("%Y-%m-%d %H:%M", true),
    ("%Y-%-m-%-d %H:%M", true),
    ("%Y-%m-%d", false),
    ("%Y-%-m-%-d", false),
];

static HEADING_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^#+\s*").unwrap());

/// Parses the contents of the source file at `source_path` (relative to the
/// source root). The path is only used to derive the category and to decide
/// whether the document is a page.
pub fn parse(source_path: &Path, input: &str) -> Result<Document> {
    let (mut metadata, rest) = match scan_metadata(input)? {
        Scan::Found { metadata, rest } => (metadata, rest),
        // Nothing was consumed that we want to keep; start over from the top.
        Scan::NoMetadata => (Metadata::default(), input),
    };

    let body = parse_body(rest, &mut metadata);
    let title = metadata.title.unwrap_or_default();
    let slug = match metadata.slug {
        Some(slug) => slug,
        None => slug::from_title(&title),
    };
    let summary = match metadata.summary {
        Some(summary) => summary,
        None => first_paragraph(&body).to_owned(),
    };

    Ok(Document {
        source_path: source_path.to_owned(),
        title,
        slug,
        author: metadata.author,
        date: metadata.date,
        tags: metadata.tags,
        category: category_from_path(source_path),
        status: metadata.status,
        summary,
        body,
        is_page: is_page(source_path),
    })
}

/// Parses a `date` metadata value against [`DATE_LAYOUTS`].
pub fn parse_date(value: &str) -> Result<NaiveDateTime> {
    for (layout, has_time) in DATE_LAYOUTS.iter() {
        let parsed = if *has_time {
            NaiveDateTime::parse_from_str(value, layout).ok()
        } else {
            NaiveDate::parse_from_str(value, layout)
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        };
        if let Some(date) = parsed {
            return Ok(date);
        }
    }
    Err(Error::DateFormatUnparseable {
        value: value.to_owned(),
    })
}

/// Returns whether the file at `source_path` is a standalone page, i.e. it
/// sits somewhere below a `pages` directory.
pub fn is_page(source_path: &Path) -> bool {
    match source_path.parent() {
        Some(dir) => dir.components().any(|c| c.as_os_str() == PAGES_DIRECTORY),
        None => false,
    }
}

/// The category of a file is the name of the directory containing it.
pub fn category_from_path(source_path: &Path) -> String {
    source_path
        .parent()
        .and_then(Path::file_name)
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// The metadata fields collected from a metadata block.
#[derive(Debug, Default, PartialEq)]
struct Metadata {
    title: Option<String>,
    slug: Option<String>,
    author: Option<String>,
    date: Option<NaiveDateTime>,
    tags: Vec<String>,
    status: Status,
    summary: Option<String>,
}

impl Metadata {
    /// Applies a single field. Returns `false` without touching anything if
    /// `key` isn't a recognized field.
    fn apply(&mut self, key: &str, value: &str) -> Result<bool> {
        match key {
            "tags" => self.tags.extend(
                value
                    .split(',')
                    .map(str::trim)
                    .filter(|tag| !tag.is_empty())
                    .map(str::to_owned),
            ),
            "date" => self.date = Some(parse_date(value)?),
            "slug" => self.slug = non_empty(value).map(slug::normalize),
            "status" => self.status = Status::from_metadata(value),
            "summary" => self.summary = non_empty(value).map(str::to_owned),
            "author" => self.author = non_empty(value).map(str::to_owned),
            "title" => self.title = non_empty(value).map(str::to_owned),
            _ => return Ok(false),
        }
        Ok(true)
    }
}

fn non_empty(value: &str) -> Option<&str> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

/// The outcome of scanning the top of a file for metadata.
#[derive(Debug, PartialEq)]
enum Scan<'a> {
    /// A metadata block was found; `rest` is the input following it.
    Found { metadata: Metadata, rest: &'a str },

    /// The file has no metadata. This is not an error: the caller parses the
    /// input from its first byte instead.
    NoMetadata,
}

fn scan_metadata(input: &str) -> Result<Scan<'_>> {
    let mut lines = Lines::new(input);
    let mut metadata = Metadata::default();

    if lines.peek() == Some(FENCE) {
        lines.advance();
        loop {
            match lines.next_line() {
                None => return Err(Error::MetadataUnterminated),
                Some(FENCE) => break,
                // Unknown keys are allowed inside a fence (e.g. Jekyll's
                // `layout`), they just aren't used.
                Some(line) => {
                    if let Some((key, value)) = split_field(line) {
                        metadata.apply(&key, value)?;
                    }
                }
            }
        }
        return Ok(Scan::Found {
            metadata,
            rest: lines.rest(),
        });
    }

    let mut recognized = 0;
    while let Some(line) = lines.peek() {
        let is_field = match split_field(line) {
            Some((key, value)) => metadata.apply(&key, value)?,
            None => false,
        };
        if !is_field {
            break;
        }
        recognized += 1;
        lines.advance();
    }

    if recognized == 0 {
        Ok(Scan::NoMetadata)
    } else {
        Ok(Scan::Found {
            metadata,
            rest: lines.rest(),
        })
    }
}

/// Splits a `key: value` line into its lower-cased key and trimmed value. A
/// leading `:` is ignored so `:date: 2010-12-03` is accepted too. Everything
/// after the first colon is the value, colons included.
fn split_field(line: &str) -> Option<(String, &str)> {
    let line = line.strip_prefix(':').unwrap_or(line);
    let (key, value) = line.split_once(':')?;
    Some((key.trim().to_lowercase(), value.trim()))
}

/// Consumes the title line and returns the body. The line after the title is
/// dropped since it's usually a setext underline.
fn parse_body(input: &str, metadata: &mut Metadata) -> String {
    let mut lines = Lines::new(input);
    while let Some(line) = lines.peek() {
        if !line.trim().is_empty() {
            break;
        }
        lines.advance();
    }

    if let Some(line) = lines.next_line() {
        if metadata.title.is_none() {
            let title = HEADING_MARKER.replace(line, "");
            metadata.title = non_empty(title.trim()).map(str::to_owned);
        }
        lines.advance();
    }

    std::iter::from_fn(|| lines.next_line())
        .collect::<Vec<_>>()
        .join("\n")
}

/// A line cursor over a string which can look at the next line without
/// consuming it. Line terminators (`\n` or `\r\n`) are not part of the
/// returned lines.
struct Lines<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Lines<'a> {
    fn new(input: &'a str) -> Self {
        Lines { input, pos: 0 }
    }

    fn peek(&self) -> Option<&'a str> {
        if self.pos >= self.input.len() {
            return None;
        }
        let rest = &self.input[self.pos..];
        let line = match rest.find('\n') {
            Some(end) => &rest[..end],
            None => rest,
        };
        Some(line.strip_suffix('\r').unwrap_or(line))
    }

    fn advance(&mut self) {
        let rest = &self.input[self.pos..];
        self.pos += match rest.find('\n') {
            Some(end) => end + 1,
            None => rest.len(),
        };
    }

    fn next_line(&mut self) -> Option<&'a str> {
        let line = self.peek()?;
        self.advance();
        Some(line)
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }
}

/// The result of a fallible parse operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error parsing a source file. Both variants are fatal: a
/// malformed file is never skipped.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Returned when a `date` value matches none of the accepted layouts.
    #[error(
        "unparseable date `{value}`; accepted formats are `YYYY-MM-DD HH:MM`, \
         `YYYY-M-D HH:MM`, `YYYY-MM-DD` and `YYYY-M-D`"
    )]
    DateFormatUnparseable { value: String },

    /// Returned when a metadata block opened with `---` is never closed.
    #[error("metadata block opened with `---` is never closed")]
    MetadataUnterminated,
}
