//! Aggregates parsed [`Document`]s into the site model. Ingestion happens in
//! two steps:
//!
//! 1. Documents are registered one at a time with [`SiteIndex::register`],
//!    which enforces slug uniqueness and collects tags and categories.
//! 2. [`SiteIndex::finalize`] sorts the articles (most recent first),
//!    renders every document's markdown once, and freezes everything into a
//!    read-only [`Site`].
//!
//! [`SiteIndex::load`] does both for a whole source directory.

use crate::config::Config;
use crate::document::Document;
use crate::markdown;
use crate::parser;
use rayon::prelude::*;
use rayon::ThreadPool;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const MARKDOWN_EXTENSIONS: [&str; 2] = ["md", "markdown"];

/// A set of strings which remembers insertion order.
#[derive(Debug, Default)]
struct InsertionSet {
    items: Vec<String>,
    seen: HashSet<String>,
}

impl InsertionSet {
    fn insert(&mut self, item: &str) {
        if !self.seen.contains(item) {
            self.seen.insert(item.to_owned());
            self.items.push(item.to_owned());
        }
    }
}

/// The mutable, in-progress site model.
#[derive(Debug)]
pub struct SiteIndex {
    config: Config,
    articles: Vec<Document>,
    pages: Vec<Document>,
    tags: InsertionSet,
    categories: InsertionSet,

    /// Every registered slug, mapped to the file which claimed it.
    slugs: HashMap<String, PathBuf>,
}

impl SiteIndex {
    pub fn new(config: Config) -> SiteIndex {
        SiteIndex {
            config,
            articles: Vec::new(),
            pages: Vec::new(),
            tags: InsertionSet::default(),
            categories: InsertionSet::default(),
            slugs: HashMap::new(),
        }
    }

    /// Adds a document to the index. Fails if another document already
    /// claimed the same slug; the index must then be discarded since the
    /// build can't proceed.
    ///
    /// Drafts reserve their slug but are otherwise left out of the site.
    pub fn register(&mut self, document: Document) -> Result<()> {
        if let Some(existing) = self.slugs.get(&document.slug) {
            return Err(Error::DuplicateSlug {
                slug: document.slug,
                path: document.source_path,
                existing: existing.clone(),
            });
        }
        self.slugs
            .insert(document.slug.clone(), document.source_path.clone());

        if document.is_draft() {
            tracing::debug!(path = %document.source_path.display(), "skipping draft");
            return Ok(());
        }

        if document.is_page {
            self.pages.push(document);
            return Ok(());
        }

        if document.date.is_none() {
            tracing::warn!(
                path = %document.source_path.display(),
                "article has no date; treating it as the oldest article"
            );
        }
        for tag in document.tags.iter() {
            self.tags.insert(tag);
        }
        if !document.category.is_empty() {
            self.categories.insert(&document.category);
        }
        self.articles.push(document);
        Ok(())
    }

    /// Finishes ingestion: sorts the articles by date, most recent first,
    /// and renders the markdown of every article and page. The sort is
    /// stable, so articles with the same date keep their registration order.
    pub fn finalize(mut self) -> Site {
        self.articles.sort_by(|a, b| b.date.cmp(&a.date));
        let html = self
            .articles
            .iter()
            .chain(self.pages.iter())
            .map(|d| (d.slug.clone(), Html::render(d)))
            .collect();
        Site {
            config: self.config,
            articles: self.articles,
            pages: self.pages,
            tags: self.tags.items,
            categories: self.categories.items,
            html,
        }
    }

    /// Walks `source_root` for markdown files, parses them on `pool`, and
    /// registers them in path order. Parsing runs in parallel; registration
    /// doesn't, so the result doesn't depend on scheduling.
    ///
    /// Any unreadable or malformed file, or any slug collision, aborts the
    /// whole load.
    pub fn load(source_root: &Path, config: Config, pool: &ThreadPool) -> Result<Site> {
        let paths = discover(source_root)?;
        tracing::debug!(count = paths.len(), "discovered source files");

        let documents: Vec<Result<Document>> = pool.install(|| {
            paths
                .par_iter()
                .map(|relative_path| read_document(source_root, relative_path))
                .collect()
        });

        // Errors surface in path order, like registrations.
        let mut index = SiteIndex::new(config);
        for document in documents {
            index.register(document?)?;
        }
        let site = index.finalize();
        tracing::info!(
            articles = site.articles.len(),
            pages = site.pages.len(),
            tags = site.tags.len(),
            categories = site.categories.len(),
            "loaded site"
        );
        Ok(site)
    }
}

/// Lists the markdown files below `source_root`, relative to it and sorted.
fn discover(source_root: &Path) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for result in WalkDir::new(source_root) {
        let entry = result?;
        if !entry.file_type().is_file() || !is_markdown(entry.path()) {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(source_root)
            .unwrap_or_else(|_| entry.path());
        paths.push(relative.to_owned());
    }
    paths.sort();
    Ok(paths)
}

fn is_markdown(path: &Path) -> bool {
    match path.extension() {
        Some(ext) => MARKDOWN_EXTENSIONS.iter().any(|m| ext == *m),
        None => false,
    }
}

fn read_document(source_root: &Path, relative_path: &Path) -> Result<Document> {
    let full_path = source_root.join(relative_path);
    let contents = std::fs::read_to_string(&full_path).map_err(|err| Error::Read {
        path: full_path.clone(),
        err,
    })?;
    let document = parser::parse(relative_path, &contents).map_err(|err| Error::Parse {
        path: full_path,
        err,
    })?;
    tracing::debug!(path = %relative_path.display(), slug = %document.slug, "parsed");
    Ok(document)
}

/// The rendered HTML of a document's summary and body.
#[derive(Clone, Debug, PartialEq)]
pub struct Html {
    pub summary: String,
    pub content: String,
}

impl Html {
    pub fn render(document: &Document) -> Html {
        Html {
            summary: markdown::to_html(&document.summary),
            content: markdown::to_html(&document.body),
        }
    }
}

/// The finalized, read-only site model handed to rendering.
#[derive(Debug)]
pub struct Site {
    config: Config,
    articles: Vec<Document>,
    pages: Vec<Document>,
    tags: Vec<String>,
    categories: Vec<String>,

    /// Rendered markdown, by slug.
    html: HashMap<String, Html>,
}

impl Site {
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Articles, most recent first.
    pub fn articles(&self) -> &[Document] {
        &self.articles
    }

    pub fn pages(&self) -> &[Document] {
        &self.pages
    }

    /// Every tag used by an article, in order of first use.
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Every non-empty article category, in order of first use.
    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn articles_by_tag<'a>(&'a self, tag: &str) -> Vec<&'a Document> {
        self.articles.iter().filter(|a| a.has_tag(tag)).collect()
    }

    pub fn articles_by_category<'a>(&'a self, category: &str) -> Vec<&'a Document> {
        self.articles
            .iter()
            .filter(|a| a.category == category)
            .collect()
    }

    /// The HTML of an article or page of this site, rendered at
    /// finalization.
    pub fn html(&self, document: &Document) -> Option<&Html> {
        self.html.get(&document.slug)
    }

    /// The `n` most recent articles, or all of them if there are fewer.
    pub fn recent_articles(&self, n: usize) -> &[Document] {
        &self.articles[..std::cmp::min(n, self.articles.len())]
    }
}

/// The result of a fallible ingestion operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error loading the site. Every variant is fatal: nothing is
/// rendered after an ingestion error.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Returned when the source directory can't be walked.
    #[error("walking the source directory: {0}")]
    Walk(#[from] walkdir::Error),

    /// Returned when a source file can't be read.
    #[error("reading `{}`: {err}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        err: std::io::Error,
    },

    /// Returned when a source file is malformed.
    #[error("parsing `{}`: {err}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        err: parser::Error,
    },

    /// Returned when two documents resolve to the same slug.
    #[error(
        "the slug `{slug}` of `{}` is already used by `{}`",
        .path.display(),
        .existing.display()
    )]
    DuplicateSlug {
        slug: String,
        path: PathBuf,
        existing: PathBuf,
    },
}
