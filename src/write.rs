//! Decides where artifacts live in the output tree and persists them. Every
//! output path is relative to the output root and every URL is the same path
//! with a leading `/`, so links and files can't disagree.

use crate::document::Document;
use crate::pagination::Pagination;
use crate::slug::HTML_EXTENSION;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::io;
use std::path::{Component, Path, PathBuf};

pub const TAG_DIRECTORY: &str = "tag";
pub const CATEGORY_DIRECTORY: &str = "category";
pub const ARCHIVE_FILE: &str = "archives.html";
pub const FEED_FILE: &str = "feeds/all.atom.xml";

/// Keeps only the normal components of `path`, dropping roots, `.` and
/// `..`, so the result is always inside whatever it is joined onto.
pub fn confine(path: &Path) -> PathBuf {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part),
            _ => None,
        })
        .collect()
}

/// The output path of page `n` of the article index.
pub fn index_path(n: usize) -> PathBuf {
    PathBuf::from(Pagination::index_file_name(n))
}

/// The output path of an article or page: its URL path, confined to the
/// output root. Pages end up below `pages/`.
pub fn document_path(document: &Document) -> PathBuf {
    confine(Path::new(&document.url_path()))
}

pub fn tag_path(tag: &str) -> PathBuf {
    Path::new(TAG_DIRECTORY).join(file_name(tag))
}

pub fn category_path(category: &str) -> PathBuf {
    Path::new(CATEGORY_DIRECTORY).join(file_name(category))
}

// Tags and categories are free text; path separators would nest the file.
fn file_name(name: &str) -> String {
    let mut out: String = name
        .chars()
        .map(|c| if c == '/' || c == '\\' { '-' } else { c })
        .collect();
    out.push_str(HTML_EXTENSION);
    out
}

/// The site-absolute URL of an output path.
pub fn url_for(path: &Path) -> String {
    let mut url = String::new();
    for component in confine(path).components() {
        url.push('/');
        url.push_str(&component.as_os_str().to_string_lossy());
    }
    if url.is_empty() {
        url.push('/');
    }
    url
}

/// Writes artifacts below an output root. Safe to share between threads:
/// the only shared state is the set of directories already created, and the
/// check-then-create sequence on it happens under a lock.
#[derive(Debug)]
pub struct Writer {
    root: PathBuf,
    seen_dirs: Mutex<HashSet<PathBuf>>,
}

impl Writer {
    pub fn new(root: &Path) -> Writer {
        Writer {
            root: root.to_owned(),
            seen_dirs: Mutex::new(HashSet::new()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Writes `bytes` to `relative_path` below the output root, creating
    /// parent directories as needed, and returns the full path.
    pub fn write(&self, relative_path: &Path, bytes: &[u8]) -> io::Result<PathBuf> {
        let path = self.root.join(confine(relative_path));
        if let Some(dir) = path.parent() {
            self.create_dir(dir)?;
        }
        std::fs::write(&path, bytes)?;
        Ok(path)
    }

    /// Creates `dir` and its parents unless this writer already did. Failed
    /// attempts aren't remembered, so a later task may retry them.
    fn create_dir(&self, dir: &Path) -> io::Result<()> {
        let mut seen_dirs = self.seen_dirs.lock();
        if !seen_dirs.contains(dir) {
            std::fs::create_dir_all(dir)?;
            seen_dirs.insert(dir.to_owned());
        }
        Ok(())
    }
}
