//! Site configuration and theme descriptions. Both are loaded with
//! [`serde_yaml`]; since YAML is a superset of JSON a `config.json` loads just
//! as well as a `config.yaml`.

use serde::Deserialize;
use std::fs::File;
use std::path::{Path, PathBuf};
use url::Url;

/// The number of articles per index page.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
pub struct PageSize(pub i64);

impl Default for PageSize {
    fn default() -> Self {
        PageSize(10)
    }
}

/// Site-wide settings. Keys are spelled the way they appear in the
/// configuration file, e.g.
///
/// ```json
/// {
///     "Author": "Jane Doe",
///     "Title": "Notes",
///     "URL": "https://example.org/",
///     "ShowTags": true,
///     "PaginationSize": 5
/// }
/// ```
///
/// Every key is optional.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase", default)]
pub struct Config {
    pub author: String,
    pub title: String,

    /// The public root URL of the site. Used to build absolute links in the
    /// feed. May be empty, in which case links stay relative.
    #[serde(rename = "URL")]
    pub url: String,
    pub favicon: String,

    pub show_archive: bool,
    pub show_categories: bool,
    pub show_tags: bool,

    pub pagination_size: PageSize,

    pub disqus_sitename: String,
    #[serde(rename = "GoogleAnalyticsID")]
    pub google_analytics_id: String,
    pub sharethis_publisher: String,
}

impl Config {
    /// Loads and validates the configuration file at `path`.
    pub fn from_file(path: &Path) -> Result<Config> {
        let config: Config = serde_yaml::from_reader(open(path)?).map_err(|err| Error::Parse {
            path: path.to_owned(),
            err,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the settings which can't be expressed in the types.
    pub fn validate(&self) -> Result<()> {
        self.page_size()?;
        self.base_url()?;
        Ok(())
    }

    /// The number of articles per index page.
    pub fn page_size(&self) -> Result<usize> {
        match self.pagination_size.0 {
            size if size < 1 => Err(Error::NonPositivePaginationSize(size)),
            size => Ok(size as usize),
        }
    }

    /// The parsed `URL` setting, if one is set.
    pub fn base_url(&self) -> Result<Option<Url>> {
        if self.url.is_empty() {
            return Ok(None);
        }
        Url::parse(&self.url)
            .map(Some)
            .map_err(|err| Error::InvalidUrl {
                url: self.url.clone(),
                err,
            })
    }
}

/// Lists the template files for each kind of output page. Paths are relative
/// to the theme directory. The `base` files are prepended to every kind, so
/// they're the place for shared `{{define}}` blocks.
///
/// ```yaml
/// base: [base.html]
/// index: [index.html]
/// article: [article.html, disqus.html]
/// page: [page.html]
/// tag: [tag.html]
/// category: [category.html]
/// archive: [archive.html]
/// ```
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Theme {
    #[serde(default)]
    pub base: Vec<PathBuf>,
    pub index: Vec<PathBuf>,
    pub article: Vec<PathBuf>,
    pub page: Vec<PathBuf>,
    pub tag: Vec<PathBuf>,
    pub category: Vec<PathBuf>,
    pub archive: Vec<PathBuf>,
}

/// The name of the theme description file inside a theme directory.
pub const THEME_FILE: &str = "theme.yaml";

impl Theme {
    /// Loads `theme.yaml` from `dir` and resolves the template paths against
    /// `dir`.
    pub fn from_directory(dir: &Path) -> Result<Theme> {
        let path = dir.join(THEME_FILE);
        let theme: Theme = serde_yaml::from_reader(open(&path)?).map_err(|err| Error::Parse {
            path: path.clone(),
            err,
        })?;

        let resolve = |paths: Vec<PathBuf>| -> Vec<PathBuf> {
            paths.into_iter().map(|p| dir.join(p)).collect()
        };
        Ok(Theme {
            base: resolve(theme.base),
            index: resolve(theme.index),
            article: resolve(theme.article),
            page: resolve(theme.page),
            tag: resolve(theme.tag),
            category: resolve(theme.category),
            archive: resolve(theme.archive),
        })
    }
}

fn open(path: &Path) -> Result<File> {
    File::open(path).map_err(|err| Error::Open {
        path: path.to_owned(),
        err,
    })
}

/// The result of a fallible configuration operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents invalid or unreadable configuration.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Returned when a configuration or theme file can't be opened.
    #[error("opening `{}`: {err}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        err: std::io::Error,
    },

    /// Returned when a configuration or theme file is malformed.
    #[error("parsing `{}`: {err}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        err: serde_yaml::Error,
    },

    /// Returned when `PaginationSize` is zero or negative.
    #[error("`PaginationSize` must be a positive integer, got {0}")]
    NonPositivePaginationSize(i64),

    /// Returned when `URL` is set but isn't an absolute URL.
    #[error("`URL` is not a valid absolute URL `{url}`: {err}")]
    InvalidUrl {
        url: String,
        #[source]
        err: url::ParseError,
    },
}
