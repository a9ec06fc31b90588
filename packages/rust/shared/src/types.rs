//! Core domain types for scraped bill records.

use serde::{Deserialize, Serialize};
use url::Url;

// ---------------------------------------------------------------------------
// ResolutionState
// ---------------------------------------------------------------------------

/// Where a record stands in the detail phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResolutionState {
    /// Created by the listing scan; detail page not yet visited.
    Pending,
    /// Detail page fetched and parsed (document found or confirmed absent).
    Resolved,
    /// Detail page fetch or parse failed.
    Failed,
}

impl std::fmt::Display for ResolutionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "Pending",
            Self::Resolved => "Resolved",
            Self::Failed => "Failed",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// PartialRecord
// ---------------------------------------------------------------------------

/// A listing row that survived extraction: listing-phase fields only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartialRecord {
    /// 1-based position among surviving rows of this run.
    pub id: u32,
    /// Trimmed anchor text; never empty.
    pub title: String,
    /// Absolute URL of the detail page.
    pub link: Url,
    /// Trimmed status label; may be empty.
    pub status: String,
}

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// One bill as returned to callers and written to the snapshot.
///
/// Serialized as `{id, title, link, pdf, status, resolutionState}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Ordinal within the current run only.
    pub id: u32,
    /// Display title.
    pub title: String,
    /// Absolute URL of the detail page.
    pub link: Url,
    /// Resolved document URL, if any.
    pdf: Option<Url>,
    /// Status label scraped from the listing row.
    #[serde(default)]
    pub status: String,
    /// Detail-phase outcome.
    #[serde(rename = "resolutionState")]
    resolution_state: ResolutionState,
}

impl Record {
    /// Build a `Pending` record from a listing row.
    pub fn pending(partial: PartialRecord) -> Self {
        Self {
            id: partial.id,
            title: partial.title,
            link: partial.link,
            pdf: None,
            status: partial.status,
            resolution_state: ResolutionState::Pending,
        }
    }

    /// The resolved document URL, if the detail phase found one.
    pub fn pdf(&self) -> Option<&Url> {
        self.pdf.as_ref()
    }

    /// Current detail-phase state.
    pub fn resolution_state(&self) -> ResolutionState {
        self.resolution_state
    }

    /// Record a successful detail resolution.
    ///
    /// Only applies to a `Pending` record; returns `false` (and changes
    /// nothing) otherwise, so the document URL is written at most once.
    pub fn resolve(&mut self, document: Option<Url>) -> bool {
        if self.resolution_state != ResolutionState::Pending {
            return false;
        }
        self.pdf = document;
        self.resolution_state = ResolutionState::Resolved;
        true
    }

    /// Mark the detail phase as failed for this record. Only applies to `Pending`.
    pub fn mark_failed(&mut self) -> bool {
        if self.resolution_state != ResolutionState::Pending {
            return false;
        }
        self.resolution_state = ResolutionState::Failed;
        true
    }
}
