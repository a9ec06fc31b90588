//! Document extractors: parsed HTML in, structured data out.
//!
//! Both extractors are pure: no network, no shared state. Missing structure is
//! reported as "nothing found", never as an error.

mod detail;
mod listing;

use scraper::{Html, Selector};
use url::Url;

use billtrack_shared::{BilltrackError, Result};

pub use detail::DetailExtractor;
pub use listing::{ListExtractor, Listing};

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// A "document → structured data" capability.
pub trait DocumentExtractor: Send + Sync {
    /// What a document is turned into.
    type Output;

    /// Extract from an already-parsed document.
    fn extract(&self, doc: &Html) -> Self::Output;

    /// Parse `text` as an HTML document and extract from it.
    fn extract_text(&self, text: &str) -> Self::Output {
        self.extract(&Html::parse_document(text))
    }

    /// Human-readable extractor name for tracing.
    fn name(&self) -> &str;
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Resolve an href against the source origin.
///
/// `http://` and `https://` hrefs are taken as absolute; anything else is
/// joined onto `origin`. Absolute hrefs come back in `Url` normal form
/// (lowercased host, percent-encoded spaces). Returns `None` when the result
/// is not a valid URL.
pub fn resolve_href(origin: &Url, href: &str) -> Option<Url> {
    if is_absolute_http(href) {
        Url::parse(href).ok()
    } else {
        origin.join(href).ok()
    }
}

fn is_absolute_http(href: &str) -> bool {
    ["http://", "https://"].iter().any(|scheme| {
        href.get(..scheme.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(scheme))
    })
}

/// Compile a CSS selector, mapping failures into a parse error.
pub(crate) fn compile_selector(css: &str) -> Result<Selector> {
    Selector::parse(css)
        .map_err(|e| BilltrackError::parse(format!("invalid selector '{css}': {e}")))
}

/// Collected, trimmed text content of an element.
pub(crate) fn trimmed_text(el: scraper::ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin() -> Url {
        Url::parse("https://example.org").unwrap()
    }

    #[test]
    fn relative_href_joins_origin() {
        let url = resolve_href(&origin(), "/bill/x.pdf").unwrap();
        assert_eq!(url.as_str(), "https://example.org/bill/x.pdf");
    }

    #[test]
    fn absolute_href_passes_through() {
        let href = "http://cdn.example.net/files/act.pdf";
        let url = resolve_href(&origin(), href).unwrap();
        assert_eq!(url.as_str(), href);

        let href = "https://prsindia.org/files/bills_acts/bills_parliament/2024/x.pdf";
        assert_eq!(resolve_href(&origin(), href).unwrap().as_str(), href);
    }

    #[test]
    fn relative_path_starting_with_http_is_joined() {
        let url = resolve_href(&origin(), "httpdocs/x.pdf").unwrap();
        assert_eq!(url.as_str(), "https://example.org/httpdocs/x.pdf");
    }

    #[test]
    fn absolute_href_is_normalized() {
        let url = resolve_href(&origin(), "HTTPS://EXAMPLE.org/files/Bill, 2023 Text.pdf").unwrap();
        assert_eq!(url.as_str(), "https://example.org/files/Bill,%202023%20Text.pdf");
    }

    #[test]
    fn bad_selector_is_parse_error() {
        let err = compile_selector("div[").unwrap_err();
        assert!(err.to_string().starts_with("parse error"));
    }
}
