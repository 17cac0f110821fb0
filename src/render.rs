//! Turns a [`RenderContext`] into the bytes of one output artifact. The build
//! only depends on the [`Renderer`] trait; [`TemplateRenderer`] is the
//! implementation backed by Go-style templates ([`gtmpl`]) and the Atom
//! writer in [`crate::feed`].

use crate::config::Theme;
use crate::context::RenderContext;
use crate::feed;
use gtmpl::Template;
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

/// The kinds of artifact a build produces.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ArtifactKind {
    Index,
    Article,
    Page,
    Tag,
    Category,
    Archive,
    Feed,
}

impl ArtifactKind {
    pub fn name(self) -> &'static str {
        match self {
            ArtifactKind::Index => "index",
            ArtifactKind::Article => "article",
            ArtifactKind::Page => "page",
            ArtifactKind::Tag => "tag",
            ArtifactKind::Category => "category",
            ArtifactKind::Archive => "archive",
            ArtifactKind::Feed => "feed",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Produces the bytes of an artifact. Implementations are called from many
/// threads at once and must not rely on call order.
pub trait Renderer: Sync {
    fn render(&self, kind: ArtifactKind, ctx: &RenderContext) -> Result<Vec<u8>>;
}

/// Renders HTML artifacts with templates and the feed with
/// [`atom_syndication`].
///
/// The template sources are loaded and checked once, up front. Each render
/// compiles its own [`Template`] from them, so no template state is shared
/// between render tasks.
#[derive(Clone, Debug)]
pub struct TemplateRenderer {
    index: String,
    article: String,
    page: String,
    tag: String,
    category: String,
    archive: String,
}

impl TemplateRenderer {
    /// Loads the templates listed in a [`Theme`]. Each kind's files are
    /// appended to the theme's `base` files and parsed as one template.
    pub fn from_theme(theme: &Theme) -> Result<TemplateRenderer> {
        let load = |kind: ArtifactKind, files: &[PathBuf]| -> Result<String> {
            if files.is_empty() {
                return Err(Error::MissingTemplate(kind));
            }
            let source = concat_files(theme.base.iter().chain(files.iter()))?;
            check(kind, &source)?;
            Ok(source)
        };

        Ok(TemplateRenderer {
            index: load(ArtifactKind::Index, &theme.index)?,
            article: load(ArtifactKind::Article, &theme.article)?,
            page: load(ArtifactKind::Page, &theme.page)?,
            tag: load(ArtifactKind::Tag, &theme.tag)?,
            category: load(ArtifactKind::Category, &theme.category)?,
            archive: load(ArtifactKind::Archive, &theme.archive)?,
        })
    }

    /// The theme compiled into the binary.
    pub fn builtin() -> Result<TemplateRenderer> {
        const BASE: &str = include_str!("../theme/base.html");
        let load = |kind: ArtifactKind, body: &str| -> Result<String> {
            let source = format!("{} {}", BASE, body);
            check(kind, &source)?;
            Ok(source)
        };

        Ok(TemplateRenderer {
            index: load(ArtifactKind::Index, include_str!("../theme/index.html"))?,
            article: load(ArtifactKind::Article, include_str!("../theme/article.html"))?,
            page: load(ArtifactKind::Page, include_str!("../theme/page.html"))?,
            tag: load(ArtifactKind::Tag, include_str!("../theme/tag.html"))?,
            category: load(
                ArtifactKind::Category,
                include_str!("../theme/category.html"),
            )?,
            archive: load(ArtifactKind::Archive, include_str!("../theme/archive.html"))?,
        })
    }

    fn source(&self, kind: ArtifactKind) -> Option<&str> {
        match kind {
            ArtifactKind::Index => Some(self.index.as_str()),
            ArtifactKind::Article => Some(self.article.as_str()),
            ArtifactKind::Page => Some(self.page.as_str()),
            ArtifactKind::Tag => Some(self.tag.as_str()),
            ArtifactKind::Category => Some(self.category.as_str()),
            ArtifactKind::Archive => Some(self.archive.as_str()),
            ArtifactKind::Feed => None,
        }
    }
}

impl Renderer for TemplateRenderer {
    fn render(&self, kind: ArtifactKind, ctx: &RenderContext) -> Result<Vec<u8>> {
        let source = match self.source(kind) {
            Some(source) => source,
            None => return Ok(feed::render(ctx)?),
        };

        let template = compile(kind, source)?;
        let context = gtmpl::Context::from(ctx.to_value()).map_err(|err| Error::Template {
            kind,
            message: err.to_string(),
        })?;
        let mut out: Vec<u8> = Vec::new();
        template
            .execute(&mut out, &context)
            .map_err(|err| Error::Template {
                kind,
                message: err.to_string(),
            })?;
        Ok(out)
    }
}

fn compile(kind: ArtifactKind, source: &str) -> Result<Template> {
    let mut template = Template::default();
    template.parse(source).map_err(|err| Error::Template {
        kind,
        message: err.to_string(),
    })?;
    Ok(template)
}

fn check(kind: ArtifactKind, source: &str) -> Result<()> {
    compile(kind, source).map(|_| ())
}

// Reads the template files into one string, in order. A space separates the
// files so a trailing `}}` never runs into the next file's `{{`.
fn concat_files<P: AsRef<Path>>(files: impl Iterator<Item = P>) -> Result<String> {
    let mut contents = String::new();
    for file in files {
        let file = file.as_ref();
        File::open(file)
            .and_then(|mut f| f.read_to_string(&mut contents))
            .map_err(|err| Error::OpenTemplateFile {
                path: file.to_owned(),
                err,
            })?;
        contents.push(' ');
    }
    Ok(contents)
}

/// The result of a fallible rendering operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents a failure to render one artifact, or to load the templates.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Returned when a theme lists no template for a kind of artifact.
    #[error("the theme has no {0} template")]
    MissingTemplate(ArtifactKind),

    /// Returned when a template file can't be read.
    #[error("opening template file `{}`: {err}", .path.display())]
    OpenTemplateFile {
        path: PathBuf,
        #[source]
        err: std::io::Error,
    },

    /// Returned when a template fails to parse or execute.
    #[error("{kind} template: {message}")]
    Template { kind: ArtifactKind, message: String },

    /// Returned when the feed can't be serialized.
    #[error("writing the feed: {0}")]
    Feed(#[from] atom_syndication::Error),
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::config::Config;
    use crate::document::{Document, Status};
    use crate::index::{Site, SiteIndex};
    use chrono::{NaiveDate, Utc};

    fn site() -> Site {
        let mut index = SiteIndex::new(Config {
            title: String::from("Field notes"),
            show_tags: true,
            ..Config::default()
        });
        index
            .register(Document {
                source_path: PathBuf::from("rust/hello.md"),
                title: String::from("Hello"),
                slug: String::from("/hello.html"),
                author: Some(String::from("Ann")),
                date: NaiveDate::from_ymd_opt(2020, 1, 2)
                    .unwrap()
                    .and_hms_opt(0, 0, 0),
                tags: vec![String::from("rust")],
                category: String::from("rust"),
                status: Status::Published,
                summary: String::from("Hi"),
                body: String::from("Some *text*"),
                is_page: false,
            })
            .unwrap();
        index.finalize()
    }

    fn render_string(renderer: &dyn Renderer, kind: ArtifactKind, ctx: &RenderContext) -> String {
        String::from_utf8(renderer.render(kind, ctx).unwrap()).unwrap()
    }

    #[test]
    fn test_builtin_renders_every_kind() -> Result<()> {
        let site = site();
        let renderer = TemplateRenderer::builtin()?;
        let base = RenderContext::new(&site, Utc::now());
        let article = &site.articles()[0];

        let index = render_string(&renderer, ArtifactKind::Index, &base);
        assert!(index.contains("Field notes"));
        assert!(index.contains("/hello.html"));

        let ctx = base.clone().with_article(article);
        let out = render_string(&renderer, ArtifactKind::Article, &ctx);
        assert!(out.contains("<em>text</em>"));
        assert!(out.contains("2020-01-02"));

        let ctx = base.clone().with_tag("rust");
        let out = render_string(&renderer, ArtifactKind::Tag, &ctx);
        assert!(out.contains("rust"));
        assert!(out.contains("/hello.html"));

        let kinds = [
            ArtifactKind::Index,
            ArtifactKind::Article,
            ArtifactKind::Page,
            ArtifactKind::Tag,
            ArtifactKind::Category,
            ArtifactKind::Archive,
            ArtifactKind::Feed,
        ];
        for kind in kinds.iter() {
            renderer.render(*kind, &base.clone().with_article(article))?;
        }
        Ok(())
    }

    fn write_theme(dir: &Path, index: &str) {
        std::fs::write(
            dir.join(crate::config::THEME_FILE),
            "base: [base.html]\nindex: [index.html]\narticle: [index.html]\n\
             page: [index.html]\ntag: [index.html]\ncategory: [index.html]\n\
             archive: [index.html]\n",
        )
        .unwrap();
        std::fs::write(
            dir.join("base.html"),
            r#"{{define "title"}}<h1>{{.site.title}}</h1>{{end}}"#,
        )
        .unwrap();
        std::fs::write(dir.join("index.html"), index).unwrap();
    }

    #[test]
    fn test_from_theme() -> Result<()> {
        let dir = tempfile::tempdir().unwrap();
        write_theme(
            dir.path(),
            r#"{{template "title" .}}{{range .articles}}[{{.title}}]{{end}}"#,
        );
        let theme = Theme::from_directory(dir.path()).unwrap();
        let renderer = TemplateRenderer::from_theme(&theme)?;

        let site = site();
        let ctx = RenderContext::new(&site, Utc::now());
        assert_eq!(
            "<h1>Field notes</h1>[Hello]",
            render_string(&renderer, ArtifactKind::Index, &ctx).trim()
        );
        Ok(())
    }

    #[test]
    fn test_broken_template_is_reported_up_front() {
        let dir = tempfile::tempdir().unwrap();
        write_theme(dir.path(), "{{range .articles}}");
        let theme = Theme::from_directory(dir.path()).unwrap();
        match TemplateRenderer::from_theme(&theme) {
            Err(Error::Template { kind, .. }) => assert_eq!(ArtifactKind::Index, kind),
            other => panic!("wanted a template error, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_template_file() {
        let theme = Theme {
            base: Vec::new(),
            index: vec![PathBuf::from("/no/such/index.html")],
            article: Vec::new(),
            page: Vec::new(),
            tag: Vec::new(),
            category: Vec::new(),
            archive: Vec::new(),
        };
        match TemplateRenderer::from_theme(&theme) {
            Err(Error::OpenTemplateFile { path, .. }) => {
                assert_eq!(PathBuf::from("/no/such/index.html"), path)
            }
            other => panic!("wanted OpenTemplateFile, got {:?}", other),
        }

        let theme = Theme {
            index: Vec::new(),
            ..theme
        };
        match TemplateRenderer::from_theme(&theme) {
            Err(Error::MissingTemplate(ArtifactKind::Index)) => {}
            other => panic!("wanted MissingTemplate, got {:?}", other),
        }
    }
}
