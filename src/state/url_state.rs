/// Per-URL crawl state definitions
///
/// This module defines the states a URL moves through during a crawl run
/// and the transitions allowed between them.
use std::fmt;

/// Represents the current state of a URL in the crawl process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UrlState {
    // ===== Active States =====
    /// URL is waiting to be extracted
    Pending,

    /// Extraction is in flight
    InProgress,

    // ===== Terminal States =====
    /// Article extracted and appended to the corpus
    Done,

    /// Already in the corpus; not re-extracted (resume mode)
    Skipped,

    /// Terminal extraction error, or retries exhausted
    Failed,
}

impl UrlState {
    /// Returns true if no further processing will happen for this URL
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Skipped | Self::Failed)
    }

    /// Checks whether moving from `self` to `next` is allowed
    ///
    /// ```text
    /// Pending -> InProgress -> Done
    ///                       -> Failed
    /// Pending -> Skipped
    /// ```
    pub fn can_transition_to(&self, next: UrlState) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::InProgress)
                | (Self::Pending, Self::Skipped)
                | (Self::InProgress, Self::Done)
                | (Self::InProgress, Self::Failed)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Done => "done",
            Self::Skipped => "skipped",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for UrlState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
