//! Listing page extractor.

use scraper::{Html, Selector};
use url::Url;

use billtrack_shared::{PartialRecord, Result, SelectorConfig};

use super::{DocumentExtractor, compile_selector, resolve_href, trimmed_text};

/// Rows pulled from a listing document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Listing {
    /// Surviving rows in document order, ids 1..=n.
    pub records: Vec<PartialRecord>,
    /// Rows matched by the row selector but missing a title or link.
    pub dropped: usize,
}

/// Turns the listing document into partial records.
///
/// Each row contributes its first anchor (text → title, href → link) and the
/// text of its status node. Rows without a usable title or link are skipped
/// and counted in [`Listing::dropped`]; they never consume an id.
pub struct ListExtractor {
    origin: Url,
    row: Selector,
    anchor: Selector,
    status: Selector,
}

impl ListExtractor {
    /// Compile the row and status selectors.
    pub fn new(origin: Url, selectors: &SelectorConfig) -> Result<Self> {
        Ok(Self {
            origin,
            row: compile_selector(&selectors.row)?,
            anchor: compile_selector("a")?,
            status: compile_selector(&selectors.status)?,
        })
    }

    fn row_to_record(&self, row: scraper::ElementRef<'_>, id: u32) -> Option<PartialRecord> {
        let anchor = row.select(&self.anchor).next()?;

        let title = trimmed_text(anchor);
        let href = anchor.value().attr("href").map(str::trim).unwrap_or("");
        if title.is_empty() || href.is_empty() {
            return None;
        }
        let link = resolve_href(&self.origin, href)?;

        let status = row
            .select(&self.status)
            .next()
            .map(trimmed_text)
            .unwrap_or_default();

        Some(PartialRecord {
            id,
            title,
            link,
            status,
        })
    }
}

impl DocumentExtractor for ListExtractor {
    type Output = Listing;

    fn extract(&self, doc: &Html) -> Listing {
        let mut listing = Listing::default();

        for row in doc.select(&self.row) {
            let next_id = listing.records.len() as u32 + 1;
            match self.row_to_record(row, next_id) {
                Some(record) => listing.records.push(record),
                None => listing.dropped += 1,
            }
        }

        listing
    }

    fn name(&self) -> &str {
        "listing"
    }
}
