// src/utils/html.rs

//! HTML helpers: escaping for Telegram messages and unwrapping
//! browser-rendered JSON documents.

use scraper::{Html, Selector};

/// Escape text for Telegram's HTML parse mode.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Whether a response body looks like an HTML document rather than raw JSON.
pub fn looks_like_html(body: &str) -> bool {
    let head = body.trim_start();
    head.starts_with('<')
}

/// Extract the text of `body > pre`, which is how browsers render a JSON response.
///
/// Returns `None` when the document has no such element, e.g. a challenge page.
pub fn extract_pre_text(body: &str) -> Option<String> {
    let document = Html::parse_document(body);
    let selector = Selector::parse("body > pre").ok()?;
    let text: String = document.select(&selector).next()?.text().collect();
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

/// Page title, used to describe unexpected HTML responses in logs.
pub fn page_title(body: &str) -> Option<String> {
    let document = Html::parse_document(body);
    let selector = Selector::parse("title").ok()?;
    let title: String = document.select(&selector).next()?.text().collect();
    let title = title.split_whitespace().collect::<Vec<_>>().join(" ");
    (!title.is_empty()).then_some(title)
}
