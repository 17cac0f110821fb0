//! Support for creating the Atom feed from the most recent articles.

use crate::context::RenderContext;
use crate::document::Document;
use crate::index::Html;
use crate::write::{self, FEED_FILE};
use atom_syndication::{Content, Entry, Error as AtomError, Feed, Link, Person, Text};
use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc};
use std::path::Path;
use url::Url;

/// The number of articles in the feed.
pub const FEED_SIZE: usize = 10;

/// Serializes the Atom feed for `ctx.articles`. Links are absolute when the
/// site has a `URL`, and site-relative otherwise.
pub fn render(ctx: &RenderContext) -> Result<Vec<u8>, AtomError> {
    let feed = feed(ctx);
    feed.write_to(Vec::new())
}

fn feed(ctx: &RenderContext) -> Feed {
    let config = ctx.site().config();
    // `Config::validate` has already rejected bad URLs.
    let base = config.base_url().ok().flatten();
    let link = |path: &str| absolute(base.as_ref(), path);

    // The newest article date keeps the feed stable across rebuilds.
    let updated = ctx
        .articles
        .iter()
        .filter_map(|a| a.date)
        .max()
        .map(to_fixed)
        .unwrap_or_else(|| ctx.updated.into());

    let home_page = link("/");
    Feed {
        title: config.title.clone().into(),
        id: home_page.clone(),
        updated,
        authors: people(&config.author),
        links: vec![
            alternate(home_page),
            Link {
                href: link(&write::url_for(Path::new(FEED_FILE))),
                rel: "self".to_owned(),
                ..Default::default()
            },
        ],
        entries: ctx
            .articles
            .iter()
            .map(|a| {
                let html = match ctx.site().html(a) {
                    Some(html) => html.clone(),
                    None => Html::render(a),
                };
                entry(a, html, &link(&a.url_path()), updated, &config.author)
            })
            .collect(),
        ..Default::default()
    }
}

fn entry(
    article: &Document,
    html: Html,
    url: &str,
    fallback_date: DateTime<FixedOffset>,
    site_author: &str,
) -> Entry {
    let date = article.date.map(to_fixed);
    let author = article.author.as_deref().unwrap_or(site_author);
    Entry {
        id: url.to_owned(),
        title: article.title.clone().into(),
        updated: date.unwrap_or(fallback_date),
        published: date,
        authors: people(author),
        links: vec![alternate(url.to_owned())],
        summary: Some(Text::html(html.summary)),
        content: Some(Content {
            value: Some(html.content),
            content_type: Some("html".to_owned()),
            ..Default::default()
        }),
        ..Default::default()
    }
}

fn alternate(href: String) -> Link {
    Link {
        href,
        rel: "alternate".to_owned(),
        ..Default::default()
    }
}

fn people(name: &str) -> Vec<Person> {
    if name.is_empty() {
        return Vec::new();
    }
    vec![Person {
        name: name.to_owned(),
        ..Default::default()
    }]
}

// Source dates carry no zone; they're taken to be UTC.
fn to_fixed(date: NaiveDateTime) -> DateTime<FixedOffset> {
    Utc.from_utc_datetime(&date).into()
}

fn absolute(base: Option<&Url>, path: &str) -> String {
    match base.and_then(|base| base.join(path.trim_start_matches('/')).ok()) {
        Some(url) => url.to_string(),
        None => path.to_owned(),
    }
}
