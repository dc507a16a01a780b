//! Main-content selection.
//!
//! An ordered list of structural/semantic queries is tried first; specific
//! containers give better rewriting precision. The first match with enough
//! collapsed text wins. When nothing qualifies, correctness degrades to the
//! whole body rather than failing, and the caller decides whether the result
//! is usable at all.

use relevel_core::{DocumentHost, NodeQuery};

/// A candidate container must carry more than this many chars of collapsed
/// text, otherwise it is skipped (empty `<main>` shells are common).
pub const MIN_MAIN_CONTENT_CHARS: usize = 100;

/// Conventional "main content" containers, most specific semantics first.
pub const MAIN_CONTENT_QUERIES: &[NodeQuery] = &[
    NodeQuery::Tag("main"),
    NodeQuery::Tag("article"),
    NodeQuery::Role("main"),
    NodeQuery::Id("content"),
    NodeQuery::Id("main"),
    NodeQuery::Class("content"),
    NodeQuery::Class("main-content"),
    NodeQuery::Class("post-content"),
    NodeQuery::Class("entry-content"),
    NodeQuery::Class("article-content"),
];

fn norm_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Best-effort "main content" text of the document.
///
/// Returns raw flattened text; normalization is the caller's concern.
pub fn main_content_text<H: DocumentHost + ?Sized>(host: &H) -> String {
    for query in MAIN_CONTENT_QUERIES {
        let Some(handle) = host.query_first(query) else {
            continue;
        };
        let Some(text) = host.flattened_text(handle) else {
            continue;
        };
        if norm_ws(&text).chars().count() > MIN_MAIN_CONTENT_CHARS {
            return text;
        }
    }
    host.body_text()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::HtmlDocument;

    fn filler(n: usize) -> String {
        "lorem ipsum dolor sit amet ".repeat(n)
    }

    #[test]
    fn prefers_article_over_surrounding_chrome() {
        let html = format!(
            "<body><nav>Home About Contact</nav><article><p>{}</p></article><footer>fine print</footer></body>",
            filler(8)
        );
        let doc = HtmlDocument::parse(&html);
        let text = main_content_text(&doc);
        assert!(text.contains("lorem ipsum"));
        assert!(!text.contains("Home About"), "nav text leaked: {text:?}");
    }

    #[test]
    fn skips_a_main_container_that_is_too_short() {
        let html = format!(
            "<body><main>stub</main><div class=\"post-content\"><p>{}</p></div></body>",
            filler(8)
        );
        let doc = HtmlDocument::parse(&html);
        let text = main_content_text(&doc);
        assert!(text.contains("lorem ipsum"));
        assert!(!text.contains("stub"), "short main was chosen: {text:?}");
    }

    #[test]
    fn falls_back_to_whole_body_when_no_container_qualifies() {
        let doc =
            HtmlDocument::parse("<body><div><p>short page, no main container</p></div></body>");
        let text = main_content_text(&doc);
        assert!(text.contains("short page"));
    }
}
