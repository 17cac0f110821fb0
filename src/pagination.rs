//! Pagination arithmetic for the article index. Page numbers are 1-based and
//! the first page has no numeric suffix: pages are written to `index.html`,
//! `index2.html`, `index3.html`, and so on.

use crate::config::Error as ConfigError;
use std::num::NonZeroUsize;

/// The link used in place of a previous/next URL which doesn't exist.
pub const NO_LINK: &str = "#";

/// Splits a list of `total` items into pages of `size` items.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pagination {
    size: NonZeroUsize,
    total: usize,
}

impl Pagination {
    /// Creates a [`Pagination`]. A `size` of zero is a configuration error.
    pub fn new(size: usize, total: usize) -> Result<Pagination, ConfigError> {
        match NonZeroUsize::new(size) {
            Some(size) => Ok(Pagination { size, total }),
            None => Err(ConfigError::NonPositivePaginationSize(0)),
        }
    }

    pub fn number_of_pages(&self) -> usize {
        let size = self.size.get();
        (self.total + size - 1) / size
    }

    /// Returns the items on page `n`, or an empty slice if `n` is out of
    /// range. `items` should hold the `total` items this pagination was
    /// created for.
    pub fn page_slice<'a, T>(&self, items: &'a [T], n: usize) -> &'a [T] {
        if n < 1 || n > self.number_of_pages() {
            return &[];
        }
        let size = self.size.get();
        let start = (n - 1) * size;
        let end = std::cmp::min(n * size, items.len());
        if start >= end {
            return &[];
        }
        &items[start..end]
    }

    /// The page numbers, in order. Handy for templates which can't count.
    pub fn page_numbers(&self) -> impl Iterator<Item = usize> {
        1..=self.number_of_pages()
    }

    /// The URL of the page before page `n`.
    pub fn previous_slug(n: usize) -> String {
        match n {
            0 | 1 => NO_LINK.to_owned(),
            2 => String::from("/index.html"),
            _ => format!("/index{}.html", n - 1),
        }
    }

    /// The URL of the page after page `n`.
    pub fn next_slug(&self, n: usize) -> String {
        if n >= self.number_of_pages() {
            NO_LINK.to_owned()
        } else {
            format!("/index{}.html", n + 1)
        }
    }

    /// The output file name of page `n`, relative to the output root.
    pub fn index_file_name(n: usize) -> String {
        match n {
            0 | 1 => String::from("index.html"),
            _ => format!("index{}.html", n),
        }
    }
}
