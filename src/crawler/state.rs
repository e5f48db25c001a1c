/// Fetch state definitions for tracking one URL through the crawl loop
///
/// A URL is dispatched once, probed with a header-only request, and then
/// either redirected, skipped, or fetched and committed. Every path ends in a
/// terminal state; nothing is retried.
use std::fmt;

/// Represents where a dispatched URL is in its fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchState {
    // ===== Active States =====
    /// Taken off the frontier and holding a concurrency permit
    Dispatched,

    /// Header-only probe in progress
    FetchingHead,

    /// Full body download, decode and indexing in progress
    FetchingBody,

    // ===== Terminal States =====
    /// Probe answered with a redirect; the target was handed to the frontier
    Redirected,

    /// Probe reported a content type other than HTML
    SkippedNonText,

    /// Page and postings were written
    Committed,

    /// The page deadline expired
    TimedOut,

    /// A network error or non-success status abandoned the URL
    Failed,
}

impl FetchState {
    /// Returns true if no further work happens for the URL
    pub fn is_terminal(&self) -> bool {
        !matches!(
            self,
            Self::Dispatched | Self::FetchingHead | Self::FetchingBody
        )
    }

    /// Returns true if `next` is a legal successor of this state
    ///
    /// Any active state may time out or fail.
    pub fn can_transition_to(&self, next: FetchState) -> bool {
        use FetchState::*;

        match (self, next) {
            (Dispatched, FetchingHead) => true,
            (FetchingHead, Redirected | SkippedNonText | FetchingBody) => true,
            (FetchingBody, Committed) => true,
            (state, TimedOut | Failed) => !state.is_terminal(),
            _ => false,
        }
    }

    /// Short lowercase label used in log lines
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dispatched => "dispatched",
            Self::FetchingHead => "fetching_head",
            Self::FetchingBody => "fetching_body",
            Self::Redirected => "redirected",
            Self::SkippedNonText => "skipped_non_text",
            Self::Committed => "committed",
            Self::TimedOut => "timed_out",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for FetchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Tracks the state of one URL and rejects illegal transitions
#[derive(Debug, Clone)]
pub struct FetchTracker {
    url: String,
    state: FetchState,
}

impl FetchTracker {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            state: FetchState::Dispatched,
        }
    }

    pub fn state(&self) -> FetchState {
        self.state
    }

    /// Moves to `next`, logging the transition
    ///
    /// Illegal transitions leave the state unchanged and return false.
    pub fn advance(&mut self, next: FetchState) -> bool {
        if !self.state.can_transition_to(next) {
            tracing::warn!(
                "Ignoring illegal transition {} -> {} for {}",
                self.state,
                next,
                self.url
            );
            return false;
        }

        tracing::trace!("{}: {} -> {}", self.url, self.state, next);
        self.state = next;
        true
    }
}
