use pulldown_cmark::escape::escape_html;
use pulldown_cmark::{html, Options, Parser};

/// Converts markdown to HTML, appending the result to `w`. Tables, footnotes,
/// strikethrough, task lists and smart punctuation are enabled.
pub fn push_html(w: &mut String, markdown: &str) {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_SMART_PUNCTUATION);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_TASKLISTS);

    html::push_html(w, Parser::new_ext(markdown, options));
}

/// Converts markdown to a new HTML string.
pub fn to_html(markdown: &str) -> String {
    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    push_html(&mut out, markdown);
    out
}

/// Escapes `&`, `<`, `>` and `"` so plain text can go into HTML text or a
/// double-quoted attribute.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    // Writing into a `String` can't fail.
    let _ = escape_html(&mut out, text);
    out
}
