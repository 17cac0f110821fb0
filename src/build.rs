//! Exports [`build_site`], which stitches together the steps of a build:
//! loading the site ([`crate::index`]), scheduling one render task per output
//! artifact, running the tasks on a thread pool, and persisting the results
//! ([`crate::write`]).
//!
//! Render tasks are independent. A failed task doesn't stop the others; once
//! every task has finished, the first failure (in scheduling order) is
//! returned. Whatever was written stays written.

use crate::config::{Config, Error as ConfigError, Theme};
use crate::context::RenderContext;
use crate::feed::FEED_SIZE;
use crate::index::{Error as IndexError, Site, SiteIndex};
use crate::pagination::Pagination;
use crate::render::{ArtifactKind, Error as RenderError, Renderer, TemplateRenderer};
use crate::write::{self, Writer};
use chrono::{DateTime, Utc};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};

/// The settings of one build invocation.
#[derive(Clone, Debug, Default)]
pub struct Options {
    /// The directory holding the markdown sources.
    pub source: PathBuf,

    /// The directory the site is written to. Created if it doesn't exist;
    /// existing files are overwritten but never deleted.
    pub output: PathBuf,

    /// A theme directory. The built-in theme is used when unset.
    pub theme: Option<PathBuf>,

    /// The number of worker threads. Defaults to the number of CPUs.
    pub threads: Option<usize>,
}

/// Builds the site described by `options` and `config` with the templates
/// from the configured theme.
pub fn build_site(options: &Options, config: Config) -> Result<BuildReport> {
    let renderer = match &options.theme {
        Some(dir) => TemplateRenderer::from_theme(&Theme::from_directory(dir)?)?,
        None => TemplateRenderer::builtin()?,
    };
    build_site_with(options, config, &renderer)
}

/// Like [`build_site`], but with any [`Renderer`].
pub fn build_site_with(
    options: &Options,
    config: Config,
    renderer: &dyn Renderer,
) -> Result<BuildReport> {
    config.validate()?;
    let pool = thread_pool(options.threads)?;

    tracing::info!(source = %options.source.display(), "loading site");
    let site = SiteIndex::load(&options.source, config, &pool)?;

    let coordinator = Coordinator {
        renderer,
        writer: Writer::new(&options.output),
        pool: &pool,
    };
    coordinator.build(&site, Utc::now())
}

fn thread_pool(threads: Option<usize>) -> Result<ThreadPool> {
    let mut builder = ThreadPoolBuilder::new();
    if let Some(threads) = threads {
        builder = builder.num_threads(threads);
    }
    Ok(builder.build()?)
}

/// Renders and writes every artifact of a finalized [`Site`].
pub struct Coordinator<'a> {
    pub renderer: &'a dyn Renderer,
    pub writer: Writer,
    pub pool: &'a ThreadPool,
}

/// One artifact to render: what kind, where it goes, and what it sees.
/// `origin` names what the artifact was made from, for error messages.
struct Task<'a> {
    kind: ArtifactKind,
    path: PathBuf,
    origin: String,
    context: RenderContext<'a>,
}

impl<'a> Coordinator<'a> {
    /// Renders every artifact of `site`. `updated` is the build time exposed
    /// to templates.
    pub fn build(&self, site: &Site, updated: DateTime<Utc>) -> Result<BuildReport> {
        let tasks = schedule(site, updated)?;
        tracing::info!(
            tasks = tasks.len(),
            threads = self.pool.current_num_threads(),
            output = %self.writer.root().display(),
            "rendering site"
        );

        let results: Vec<Result<ArtifactKind>> =
            self.pool.install(|| tasks.par_iter().map(|t| self.run(t)).collect());

        let mut report = BuildReport::default();
        let mut first_error = None;
        for result in results {
            match result {
                Ok(kind) => report.add(kind),
                Err(err) => {
                    if first_error.is_none() {
                        first_error = Some(err);
                    }
                }
            }
        }

        match first_error {
            Some(err) => Err(err),
            None => {
                tracing::info!(artifacts = report.total(), "site built");
                Ok(report)
            }
        }
    }

    fn run(&self, task: &Task) -> Result<ArtifactKind> {
        let result = self.render_and_write(task);
        match &result {
            Ok(path) => {
                tracing::debug!(kind = %task.kind, path = %path.display(), "wrote artifact")
            }
            Err(err) => {
                tracing::error!(kind = %task.kind, path = %task.path.display(), "{}", err)
            }
        }
        result.map(|_| task.kind)
    }

    fn render_and_write(&self, task: &Task) -> Result<PathBuf> {
        let bytes = self
            .renderer
            .render(task.kind, &task.context)
            .map_err(|err| Error::Render {
                path: task.path.clone(),
                err,
            })?;
        self.writer
            .write(&task.path, &bytes)
            .map_err(|err| Error::Io {
                path: self.writer.root().join(&task.path),
                err,
            })
    }
}

/// Lists the artifacts of `site`: the index pages, then articles, pages,
/// tags, categories, the archive (when enabled), and the feed. Fails with
/// [`Error::OutputCollision`] when two artifacts would land on the same file.
fn schedule(site: &Site, updated: DateTime<Utc>) -> Result<Vec<Task>> {
    let base = RenderContext::new(site, updated);
    let mut tasks = Vec::new();

    let pagination = Pagination::new(site.config().page_size()?, site.articles().len())?;
    for n in pagination.page_numbers() {
        tasks.push(Task {
            kind: ArtifactKind::Index,
            path: write::index_path(n),
            origin: format!("index page {}", n),
            context: base.clone().with_index_page(pagination, n),
        });
    }

    for article in site.articles() {
        tasks.push(Task {
            kind: ArtifactKind::Article,
            path: write::document_path(article),
            origin: format!("`{}`", article.source_path.display()),
            context: base.clone().with_article(article),
        });
    }

    for page in site.pages() {
        tasks.push(Task {
            kind: ArtifactKind::Page,
            path: write::document_path(page),
            origin: format!("`{}`", page.source_path.display()),
            context: base.clone().with_page(page),
        });
    }

    for tag in site.tags() {
        tasks.push(Task {
            kind: ArtifactKind::Tag,
            path: write::tag_path(tag),
            origin: format!("tag `{}`", tag),
            context: base.clone().with_tag(tag),
        });
    }

    for category in site.categories() {
        tasks.push(Task {
            kind: ArtifactKind::Category,
            path: write::category_path(category),
            origin: format!("category `{}`", category),
            context: base.clone().with_category(category),
        });
    }

    if site.config().show_archive {
        tasks.push(Task {
            kind: ArtifactKind::Archive,
            path: PathBuf::from(write::ARCHIVE_FILE),
            origin: String::from("the archive"),
            context: base.clone(),
        });
    }

    tasks.push(Task {
        kind: ArtifactKind::Feed,
        path: PathBuf::from(write::FEED_FILE),
        origin: String::from("the feed"),
        context: base.with_recent_articles(FEED_SIZE),
    });

    check_collisions(&tasks)?;
    Ok(tasks)
}

// Tasks run in parallel, so two of them writing one file would leave
// whichever finished last. Refuse before anything is written.
fn check_collisions(tasks: &[Task]) -> Result<()> {
    let mut owners: HashMap<&Path, &str> = HashMap::with_capacity(tasks.len());
    for task in tasks {
        if let Some(first) = owners.insert(task.path.as_path(), task.origin.as_str()) {
            return Err(Error::OutputCollision {
                path: task.path.clone(),
                first: first.to_owned(),
                second: task.origin.clone(),
            });
        }
    }
    Ok(())
}

/// Counts the artifacts a build wrote, by kind.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BuildReport {
    written: BTreeMap<ArtifactKind, usize>,
}

impl BuildReport {
    fn add(&mut self, kind: ArtifactKind) {
        *self.written.entry(kind).or_insert(0) += 1;
    }

    pub fn count(&self, kind: ArtifactKind) -> usize {
        self.written.get(&kind).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.written.values().sum()
    }
}

impl fmt::Display for BuildReport {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} artifacts", self.total())?;
        let mut sep = " (";
        for (kind, count) in self.written.iter() {
            write!(f, "{}{} {}", sep, count, kind)?;
            sep = ", ";
        }
        if !self.written.is_empty() {
            f.write_str(")")?;
        }
        Ok(())
    }
}

/// The result of a fallible build operation.
pub type Result<T> = std::result::Result<T, Error>;

/// The error type for building a site.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Returned for invalid configuration or themes.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Returned when the sources can't be loaded. Nothing is written.
    #[error(transparent)]
    Index(#[from] IndexError),

    /// Returned when the theme's templates can't be loaded.
    #[error("loading templates: {0}")]
    Theme(#[from] RenderError),

    /// Returned when two artifacts map to the same output file. Nothing is
    /// written.
    #[error("`{}` would be written by both {first} and {second}", .path.display())]
    OutputCollision {
        path: PathBuf,
        first: String,
        second: String,
    },

    /// Returned when an artifact fails to render.
    #[error("rendering `{}`: {err}", .path.display())]
    Render {
        path: PathBuf,
        #[source]
        err: RenderError,
    },

    /// Returned when an artifact can't be written.
    #[error("writing `{}`: {err}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        err: std::io::Error,
    },

    /// Returned when the worker threads can't be started.
    #[error("starting worker threads: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}
