//! Builds the values handed to templates. Every render task creates its own
//! [`RenderContext`]: a borrowed view of the finalized [`Site`] plus whatever
//! the task is about (an article, a tag, a page of the index). Nothing in a
//! context is shared mutably between tasks.
//!
//! Plain-text fields (titles, names, URLs) are HTML-escaped here, so templates
//! can print them as they are. `summary` and `content` are already HTML.

use crate::document::Document;
use crate::index::{Html, Site};
use crate::markdown;
use crate::pagination::Pagination;
use crate::write;
use chrono::{DateTime, NaiveDateTime, Timelike, Utc};
use gtmpl_value::Value;
use std::borrow::Cow;
use std::collections::HashMap;

const HUMAN_DATE: &str = "%Y-%m-%d";
const HUMAN_DATE_TIME: &str = "%Y-%m-%d %H:%M";
const ISO_DATE_TIME: &str = "%Y-%m-%dT%H:%M:%S";

/// The data one render task sees.
#[derive(Clone, Debug)]
pub struct RenderContext<'a> {
    site: &'a Site,

    /// The articles listed by this artifact: a page of the index, the members
    /// of a tag or category, the feed entries, or every article.
    pub articles: Vec<&'a Document>,
    pub article: Option<&'a Document>,
    pub page: Option<&'a Document>,
    pub tag: Option<&'a str>,
    pub category: Option<&'a str>,

    /// Set for index pages only: the pagination and the 1-based page number.
    pub pagination: Option<(Pagination, usize)>,

    /// The build time.
    pub updated: DateTime<Utc>,
}

impl<'a> RenderContext<'a> {
    /// A context listing every article, and nothing else.
    pub fn new(site: &'a Site, updated: DateTime<Utc>) -> RenderContext<'a> {
        RenderContext {
            site,
            articles: site.articles().iter().collect(),
            article: None,
            page: None,
            tag: None,
            category: None,
            pagination: None,
            updated,
        }
    }

    pub fn site(&self) -> &'a Site {
        self.site
    }

    pub fn with_article(mut self, article: &'a Document) -> Self {
        self.article = Some(article);
        self
    }

    pub fn with_page(mut self, page: &'a Document) -> Self {
        self.page = Some(page);
        self
    }

    pub fn with_tag(mut self, tag: &'a str) -> Self {
        self.articles = self.site.articles_by_tag(tag);
        self.tag = Some(tag);
        self
    }

    pub fn with_category(mut self, category: &'a str) -> Self {
        self.articles = self.site.articles_by_category(category);
        self.category = Some(category);
        self
    }

    /// Restricts the articles to page `n` of `pagination`.
    pub fn with_index_page(mut self, pagination: Pagination, n: usize) -> Self {
        self.articles = pagination.page_slice(self.site.articles(), n).iter().collect();
        self.pagination = Some((pagination, n));
        self
    }

    pub fn with_recent_articles(mut self, n: usize) -> Self {
        self.articles = self.site.recent_articles(n).iter().collect();
        self
    }

    /// Converts the context into the object templates execute against. Every
    /// key is always present; absent things are `nil` (or empty lists).
    pub fn to_value(&self) -> Value {
        let mut m: HashMap<String, Value> = HashMap::new();
        m.insert("site".to_owned(), self.site_value());
        m.insert(
            "articles".to_owned(),
            Value::Array(self.articles.iter().map(|a| self.document_value(a)).collect()),
        );
        m.insert(
            "pages".to_owned(),
            Value::Array(
                self.site
                    .pages()
                    .iter()
                    .map(|p| self.document_value(p))
                    .collect(),
            ),
        );
        m.insert(
            "tags".to_owned(),
            Value::Array(self.site.tags().iter().map(|t| tag_value(t)).collect()),
        );
        m.insert(
            "categories".to_owned(),
            Value::Array(
                self.site
                    .categories()
                    .iter()
                    .map(|c| category_value(c))
                    .collect(),
            ),
        );
        m.insert(
            "article".to_owned(),
            option_value(self.article, |a| self.document_value(a)),
        );
        m.insert(
            "page".to_owned(),
            option_value(self.page, |p| self.document_value(p)),
        );
        m.insert("tag".to_owned(), option_value(self.tag, tag_value));
        m.insert("category".to_owned(), option_value(self.category, category_value));

        match self.pagination {
            Some((pagination, n)) => {
                m.insert("page_number".to_owned(), Value::from(n as i64));
                m.insert(
                    "number_of_pages".to_owned(),
                    Value::from(pagination.number_of_pages() as i64),
                );
                m.insert(
                    "page_numbers".to_owned(),
                    Value::Array(
                        pagination
                            .page_numbers()
                            .map(|i| {
                                let mut page: HashMap<String, Value> = HashMap::new();
                                page.insert("number".to_owned(), Value::from(i as i64));
                                page.insert(
                                    "url".to_owned(),
                                    Value::String(format!(
                                        "/{}",
                                        Pagination::index_file_name(i)
                                    )),
                                );
                                page.insert("current".to_owned(), Value::Bool(i == n));
                                Value::Object(page)
                            })
                            .collect(),
                    ),
                );
                m.insert(
                    "prev".to_owned(),
                    Value::String(Pagination::previous_slug(n)),
                );
                m.insert("next".to_owned(), Value::String(pagination.next_slug(n)));
            }
            None => {
                m.insert("page_number".to_owned(), Value::Nil);
                m.insert("number_of_pages".to_owned(), Value::Nil);
                m.insert("page_numbers".to_owned(), Value::Array(Vec::new()));
                m.insert("prev".to_owned(), Value::Nil);
                m.insert("next".to_owned(), Value::Nil);
            }
        }

        m.insert(
            "updated".to_owned(),
            Value::String(self.updated.format(ISO_DATE_TIME).to_string()),
        );
        Value::Object(m)
    }

    fn site_value(&self) -> Value {
        let config = self.site.config();
        let mut m: HashMap<String, Value> = HashMap::new();
        m.insert("author".to_owned(), text(&config.author));
        m.insert("title".to_owned(), text(&config.title));
        m.insert("url".to_owned(), text(&config.url));
        m.insert("favicon".to_owned(), text(&config.favicon));
        m.insert("show_archive".to_owned(), Value::Bool(config.show_archive));
        m.insert(
            "show_categories".to_owned(),
            Value::Bool(config.show_categories),
        );
        m.insert("show_tags".to_owned(), Value::Bool(config.show_tags));
        m.insert("show_header".to_owned(), Value::Bool(self.show_header()));
        m.insert(
            "pagination_size".to_owned(),
            Value::from(config.pagination_size.0),
        );
        m.insert("disqus_sitename".to_owned(), text(&config.disqus_sitename));
        m.insert(
            "google_analytics_id".to_owned(),
            text(&config.google_analytics_id),
        );
        m.insert(
            "sharethis_publisher".to_owned(),
            text(&config.sharethis_publisher),
        );
        m.insert(
            "archive_url".to_owned(),
            text(&write::url_for(std::path::Path::new(write::ARCHIVE_FILE))),
        );
        m.insert(
            "feed_url".to_owned(),
            text(&write::url_for(std::path::Path::new(write::FEED_FILE))),
        );
        Value::Object(m)
    }

    /// The template value of a document. The HTML rendered when the site
    /// was finalized is reused; only documents foreign to the site are
    /// rendered here.
    fn document_value(&self, document: &Document) -> Value {
        let html = match self.site.html(document) {
            Some(html) => Cow::Borrowed(html),
            None => Cow::Owned(Html::render(document)),
        };
        document_object(document, html)
    }

    /// Whether the header navigation has anything to show.
    pub fn show_header(&self) -> bool {
        let config = self.site.config();
        (config.show_tags && !self.site.tags().is_empty())
            || (config.show_categories && !self.site.categories().is_empty())
            || (config.show_archive && !self.site.articles().is_empty())
    }
}

fn option_value<T: Copy>(option: Option<T>, f: impl Fn(T) -> Value) -> Value {
    match option {
        Some(x) => f(x),
        None => Value::Nil,
    }
}

fn text(s: &str) -> Value {
    Value::String(markdown::escape(s))
}

fn document_object(document: &Document, html: Cow<Html>) -> Value {
    let mut m: HashMap<String, Value> = HashMap::new();
    m.insert("title".to_owned(), text(&document.title));
    m.insert("slug".to_owned(), text(&document.slug));
    m.insert("url".to_owned(), text(&document.url_path()));
    m.insert(
        "author".to_owned(),
        match &document.author {
            Some(author) => text(author),
            None => Value::Nil,
        },
    );
    match document.date {
        Some(date) => {
            m.insert("date".to_owned(), Value::String(humanize(&date)));
            m.insert(
                "date_iso".to_owned(),
                Value::String(date.format(ISO_DATE_TIME).to_string()),
            );
        }
        None => {
            m.insert("date".to_owned(), Value::Nil);
            m.insert("date_iso".to_owned(), Value::Nil);
        }
    }
    m.insert(
        "tags".to_owned(),
        Value::Array(document.tags.iter().map(|t| tag_value(t)).collect()),
    );
    m.insert(
        "category".to_owned(),
        if document.category.is_empty() {
            Value::Nil
        } else {
            category_value(&document.category)
        },
    );
    let html = html.into_owned();
    m.insert("summary".to_owned(), Value::String(html.summary));
    m.insert("content".to_owned(), Value::String(html.content));
    Value::Object(m)
}

fn named_link(name: &str, url: String) -> Value {
    let mut m: HashMap<String, Value> = HashMap::new();
    m.insert("name".to_owned(), text(name));
    m.insert("url".to_owned(), text(&url));
    Value::Object(m)
}

fn tag_value(tag: &str) -> Value {
    named_link(tag, write::url_for(&write::tag_path(tag)))
}

fn category_value(category: &str) -> Value {
    named_link(category, write::url_for(&write::category_path(category)))
}

/// Formats a date the way people write it: just the day when the time is
/// midnight, the day and the minute otherwise.
pub fn humanize(date: &NaiveDateTime) -> String {
    if date.hour() == 0 && date.minute() == 0 && date.second() == 0 {
        date.format(HUMAN_DATE).to_string()
    } else {
        date.format(HUMAN_DATE_TIME).to_string()
    }
}
