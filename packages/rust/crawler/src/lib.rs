//! Document retrieval and extraction for the bill catalog.
//!
//! This crate provides:
//! - [`fetcher`]: the [`Fetcher`] trait and its `reqwest` implementation
//! - [`extract`]: the [`DocumentExtractor`] capability with listing and detail implementations

pub mod extract;
pub mod fetcher;

pub use extract::{DetailExtractor, DocumentExtractor, ListExtractor, Listing, resolve_href};
pub use fetcher::{FetchOptions, Fetcher, HttpFetcher};

#[cfg(test)]
mod tests {
    use super::*;
    use billtrack_shared::SelectorConfig;
    use url::Url;

    fn load_fixture(name: &str) -> String {
        let path = format!("../../../fixtures/html/{name}");
        std::fs::read_to_string(&path).unwrap_or_else(|_| panic!("missing fixture: {path}"))
    }

    fn origin() -> Url {
        Url::parse("https://prsindia.org").unwrap()
    }

    #[test]
    fn listing_fixture_extracts_rows() {
        let extractor = ListExtractor::new(origin(), &SelectorConfig::default()).unwrap();
        let listing = extractor.extract_text(&load_fixture("billtrack-listing.html"));

        // Four rows, one with an empty anchor.
        assert_eq!(listing.records.len(), 3);
        assert_eq!(listing.dropped, 1);

        let ids: Vec<u32> = listing.records.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);

        let first = &listing.records[0];
        assert_eq!(first.title, "The Digital Personal Data Protection Bill, 2023");
        assert_eq!(
            first.link.as_str(),
            "https://prsindia.org/billtrack/the-digital-personal-data-protection-bill-2023"
        );
        assert_eq!(first.status, "Passed");

        // Whitespace inside the anchor is trimmed.
        assert_eq!(listing.records[1].title, "The Telecommunications Bill, 2023");
        assert_eq!(listing.records[1].status, "Pending");

        // Absolute link kept as-is, missing status node gives an empty status.
        assert_eq!(
            listing.records[2].link.as_str(),
            "https://prsindia.org/billtrack/the-post-office-bill-2023"
        );
        assert_eq!(listing.records[2].status, "");
    }

    #[test]
    fn detail_fixture_picks_first_document() {
        let extractor = DetailExtractor::new(origin(), &SelectorConfig::default()).unwrap();
        let pdf = extractor
            .extract_text(&load_fixture("bill-detail.html"))
            .expect("document link");
        assert_eq!(
            pdf.as_str(),
            "https://prsindia.org/files/bills_acts/bills_parliament/2023/Digital_Personal_Data_Protection_Bill,_2023.pdf"
        );
    }

    #[test]
    fn detail_fixture_without_document() {
        let extractor = DetailExtractor::new(origin(), &SelectorConfig::default()).unwrap();
        assert!(
            extractor
                .extract_text(&load_fixture("bill-detail-no-document.html"))
                .is_none()
        );
    }

    #[test]
    fn extractor_names() {
        let list = ListExtractor::new(origin(), &SelectorConfig::default()).unwrap();
        let detail = DetailExtractor::new(origin(), &SelectorConfig::default()).unwrap();
        assert_eq!(list.name(), "listing");
        assert_eq!(detail.name(), "detail");
    }
}
