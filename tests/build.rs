use quire::build::{build_site, Error, Options};
use quire::config::{Config, PageSize};
use quire::index::Error as IndexError;
use quire::render::ArtifactKind;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

fn write(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, contents).unwrap();
}

fn read(root: &Path, relative: &str) -> String {
    std::fs::read_to_string(root.join(relative))
        .unwrap_or_else(|err| panic!("reading {}: {}", relative, err))
}

fn files(root: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .map(|e| e.unwrap())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.path().strip_prefix(root).unwrap().to_owned())
        .collect();
    files.sort();
    files
}

fn blog(source: &Path) {
    write(
        source,
        "linux/wifi.md",
        "Title: Fix low wifi speed on Linux (Ubuntu) with chip Atheros AR9285\n\
         Date: 2013-01-12 18:40\n\
         Tags: linux, wifi\n\
         \n\
         Fix low wifi speed\n\
         ==================\n\
         \n\
         The **fix** is simple.\n\
         \n\
         Second paragraph.\n",
    );
    write(
        source,
        "rust/hello.md",
        "---\n\
         title: Hello Rust\n\
         date: 2020-05-01\n\
         tags: rust, linux\n\
         layout: post\n\
         ---\n\
         \n\
         # Hello Rust\n\
         \n\
         Hi there.\n",
    );
    write(
        source,
        "notes.md",
        "Title: Loose note\n\
         Date: 2015-3-4\n\
         Slug: /custom.html\n\
         \n\
         Loose note\n\
         \n\
         Some text.\n",
    );
    write(
        source,
        "rust/draft.md",
        "Title: Not yet\nDate: 2021-01-01\nStatus: draft\n\nNot yet\n\nSecret.\n",
    );
    write(source, "pages/about.md", "Title: About\n\nAbout\n\nThis is me.\n");
}

fn config() -> Config {
    Config {
        title: String::from("Field notes"),
        author: String::from("Alexandre"),
        url: String::from("https://example.org/"),
        show_archive: true,
        show_tags: true,
        show_categories: true,
        pagination_size: PageSize(2),
        ..Config::default()
    }
}

fn options(source: &Path, output: &Path) -> Options {
    Options {
        source: source.to_owned(),
        output: output.to_owned(),
        theme: None,
        threads: Some(4),
    }
}

#[test]
fn test_full_build() {
    let source = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    blog(source.path());

    let report = build_site(&options(source.path(), output.path()), config()).unwrap();
    assert_eq!(2, report.count(ArtifactKind::Index));
    assert_eq!(3, report.count(ArtifactKind::Article));
    assert_eq!(1, report.count(ArtifactKind::Page));
    assert_eq!(3, report.count(ArtifactKind::Tag));
    assert_eq!(2, report.count(ArtifactKind::Category));
    assert_eq!(1, report.count(ArtifactKind::Archive));
    assert_eq!(1, report.count(ArtifactKind::Feed));

    let expected: Vec<PathBuf> = vec![
        "archives.html",
        "category/linux.html",
        "category/rust.html",
        "custom.html",
        "feeds/all.atom.xml",
        "fix-low-wifi-speed-on-linux-ubuntu-with-chip-atheros-ar9285.html",
        "hello-rust.html",
        "index.html",
        "index2.html",
        "pages/about.html",
        "tag/linux.html",
        "tag/rust.html",
        "tag/wifi.html",
    ]
    .into_iter()
    .map(PathBuf::from)
    .collect();
    assert_eq!(expected, files(output.path()));

    let index = read(output.path(), "index.html");
    assert!(index.contains("Field notes"));
    assert!(index.contains("/hello-rust.html"));
    assert!(index.contains("/custom.html"));
    assert!(!index.contains("/fix-low-wifi"));
    assert!(index.contains("href=\"/index2.html\""));

    let index2 = read(output.path(), "index2.html");
    assert!(index2.contains("/fix-low-wifi"));
    assert!(index2.contains("href=\"/index.html\""));

    let article = read(
        output.path(),
        "fix-low-wifi-speed-on-linux-ubuntu-with-chip-atheros-ar9285.html",
    );
    assert!(article.contains("<strong>fix</strong>"));
    assert!(article.contains("2013-01-12 18:40"));
    assert!(!article.contains("=========="));

    let tag = read(output.path(), "tag/linux.html");
    assert!(tag.contains("/hello-rust.html"));
    assert!(tag.contains("/fix-low-wifi"));
    assert!(!tag.contains("/custom.html"));

    let page = read(output.path(), "pages/about.html");
    assert!(page.contains("This is me."));

    let feed = read(output.path(), "feeds/all.atom.xml");
    assert!(feed.contains("https://example.org/hello-rust.html"));
    assert!(!feed.contains("Not yet"));
}

#[test]
fn test_duplicate_slug_writes_nothing() {
    let source = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    blog(source.path());
    write(
        source.path(),
        "zz/again.md",
        "Title: Hello Rust\nDate: 2020-05-02\n\nHello Rust\n\nAgain.\n",
    );

    match build_site(&options(source.path(), output.path()), config()) {
        Err(Error::Index(IndexError::DuplicateSlug { slug, .. })) => {
            assert_eq!("/hello-rust.html", slug)
        }
        other => panic!("wanted DuplicateSlug, got {:?}", other),
    }
    assert!(files(output.path()).is_empty());
}

#[test]
fn test_unparseable_date_writes_nothing() {
    let source = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    blog(source.path());
    write(source.path(), "bad.md", "Title: Bad\nDate: 12/01/2013\n\nBad\n\nx\n");

    match build_site(&options(source.path(), output.path()), config()) {
        Err(Error::Index(IndexError::Parse { path, .. })) => {
            assert_eq!(source.path().join("bad.md"), path)
        }
        other => panic!("wanted a parse error, got {:?}", other),
    }
    assert!(files(output.path()).is_empty());
}

#[test]
fn test_rebuild_is_identical() {
    let source = tempfile::tempdir().unwrap();
    blog(source.path());
    let first = tempfile::tempdir().unwrap();
    let second = tempfile::tempdir().unwrap();

    build_site(&options(source.path(), first.path()), config()).unwrap();
    let mut opts = options(source.path(), second.path());
    opts.threads = Some(1);
    build_site(&opts, config()).unwrap();

    let paths = files(first.path());
    assert_eq!(paths, files(second.path()));
    for path in paths {
        assert_eq!(
            std::fs::read(first.path().join(&path)).unwrap(),
            std::fs::read(second.path().join(&path)).unwrap(),
            "{} differs",
            path.display()
        );
    }
}

#[test]
fn test_archive_disabled_and_empty_site() {
    let source = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    let config = Config {
        show_archive: false,
        ..config()
    };

    let report = build_site(&options(source.path(), output.path()), config).unwrap();
    assert_eq!(0, report.count(ArtifactKind::Index));
    assert_eq!(0, report.count(ArtifactKind::Archive));
    assert_eq!(
        vec![PathBuf::from("feeds/all.atom.xml")],
        files(output.path())
    );
}

#[test]
fn test_custom_theme() {
    let source = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    let theme = tempfile::tempdir().unwrap();
    blog(source.path());

    write(
        theme.path(),
        "theme.yaml",
        "index: [list.html]\narticle: [one.html]\npage: [one.html]\n\
         tag: [list.html]\ncategory: [list.html]\narchive: [list.html]\n",
    );
    write(theme.path(), "list.html", "{{range .articles}}{{.slug}};{{end}}");
    write(
        theme.path(),
        "one.html",
        "{{with .article}}{{.title}}{{end}}{{with .page}}{{.title}}{{end}}",
    );

    let mut opts = options(source.path(), output.path());
    opts.theme = Some(theme.path().to_owned());
    build_site(&opts, config()).unwrap();

    assert_eq!(
        "/hello-rust.html;/custom.html;",
        read(output.path(), "index.html").trim()
    );
    assert_eq!("About", read(output.path(), "pages/about.html").trim());
    assert_eq!(
        "/hello-rust.html;/fix-low-wifi-speed-on-linux-ubuntu-with-chip-atheros-ar9285.html;",
        read(output.path(), "tag/linux.html").trim()
    );
}

#[test]
fn test_slug_over_index_page_writes_nothing() {
    let source = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    blog(source.path());
    write(
        source.path(),
        "home.md",
        "Title: Home\nDate: 2019-01-01\nSlug: index.html\n\nHome\n\nWelcome.\n",
    );

    match build_site(&options(source.path(), output.path()), config()) {
        Err(Error::OutputCollision { path, first, second }) => {
            assert_eq!(PathBuf::from("index.html"), path);
            assert_eq!("index page 1", first);
            assert!(second.ends_with("home.md`"), "{}", second);
        }
        other => panic!("wanted an output collision, got {:?}", other),
    }
    assert!(files(output.path()).is_empty());
}
