/// Page outcome definitions for tracking harvest progress
///
/// Every URL the harvester processes ends in exactly one of these states.
use std::fmt;

/// The outcome of processing one URL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PageState {
    // ===== Success =====
    /// A record was extracted, validated and appended to the store
    Accepted,

    // ===== Skips =====
    /// The URL is already in the store (resumed run)
    AlreadyStored,

    /// The page is a listing page: followed for links, not extracted
    Listing,

    /// The page has no title and is not a content page
    NotContent,

    // ===== Rejections =====
    /// The record had fewer populated fields than required
    Rejected,

    // ===== Errors =====
    /// The fetch failed (transport failure or non-2xx status)
    FetchFailed,
}

impl PageState {
    /// Returns true if a record was stored for this page
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Accepted)
    }

    /// Returns true if the page was skipped without counting as a rejection
    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::AlreadyStored | Self::Listing | Self::NotContent)
    }

    /// Returns true if the page produced a record that was not stored
    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected)
    }

    /// Returns true if this represents an error state
    pub fn is_error(&self) -> bool {
        matches!(self, Self::FetchFailed)
    }

    /// Returns the short label used in logs and summaries
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Accepted => "accepted",
            Self::AlreadyStored => "already_stored",
            Self::Listing => "listing",
            Self::NotContent => "not_content",
            Self::Rejected => "rejected",
            Self::FetchFailed => "fetch_failed",
        }
    }

    /// Returns all possible page states
    pub fn all_states() -> Vec<Self> {
        vec![
            Self::Accepted,
            Self::AlreadyStored,
            Self::Listing,
            Self::NotContent,
            Self::Rejected,
            Self::FetchFailed,
        ]
    }
}

impl fmt::Display for PageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
