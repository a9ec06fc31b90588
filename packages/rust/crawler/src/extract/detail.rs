//! Detail page extractor.

use scraper::{Html, Selector};
use url::Url;

use billtrack_shared::{Result, SelectorConfig};

use super::{DocumentExtractor, compile_selector, resolve_href};

/// Finds the document link on a detail page.
///
/// `None` means the page has no matching anchor, which is a valid outcome.
pub struct DetailExtractor {
    origin: Url,
    anchor: Selector,
    suffix: String,
}

impl DetailExtractor {
    /// Build an extractor matching hrefs that end with the configured suffix.
    pub fn new(origin: Url, selectors: &SelectorConfig) -> Result<Self> {
        Ok(Self {
            origin,
            anchor: compile_selector("a[href]")?,
            suffix: selectors.document_suffix.clone(),
        })
    }
}

impl DocumentExtractor for DetailExtractor {
    type Output = Option<Url>;

    fn extract(&self, doc: &Html) -> Option<Url> {
        doc.select(&self.anchor)
            .filter_map(|el| el.value().attr("href"))
            .map(str::trim)
            .filter(|href| href.ends_with(&self.suffix))
            .find_map(|href| resolve_href(&self.origin, href))
    }

    fn name(&self) -> &str {
        "detail"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> DetailExtractor {
        DetailExtractor::new(
            Url::parse("https://example.org").unwrap(),
            &SelectorConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn relative_document_link_is_resolved() {
        let html = r#"<main><a href="/about">About</a><a href="/docs/one.pdf">Bill text</a></main>"#;
        let url = extractor().extract_text(html).expect("document link");
        assert_eq!(url.as_str(), "https://example.org/docs/one.pdf");
    }

    #[test]
    fn first_match_wins() {
        let html = r#"<a href="https://cdn.example.net/a.pdf">A</a><a href="/b.pdf">B</a>"#;
        let url = extractor().extract_text(html).unwrap();
        assert_eq!(url.as_str(), "https://cdn.example.net/a.pdf");
    }

    #[test]
    fn suffix_match_is_case_sensitive() {
        let html = r#"<a href="/docs/one.PDF">Upper</a><a href="/docs/one.pdf?download=1">Query</a>"#;
        assert!(extractor().extract_text(html).is_none());
    }

    #[test]
    fn page_without_document_is_none() {
        let html = "<html><body><h1>Bill One</h1><p>No text available yet.</p></body></html>";
        assert!(extractor().extract_text(html).is_none());
    }
}
