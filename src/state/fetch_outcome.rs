/// Fetch outcome definitions
///
/// Every dequeued fetch task runs the fetch state machine to exactly one of these
/// terminal outcomes.
use std::fmt;

/// How a single fetch task ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    // ===== Content =====
    /// An HTML/XML page was scanned and its new links were enqueued
    Processed {
        /// Number of links enqueued (already-seen links excluded)
        links_enqueued: usize,
    },

    /// The response was not scannable (status other than 200, or another content type)
    NotExtractable {
        /// HTTP status code of the response
        status: u16,
    },

    // ===== Redirects =====
    /// A redirect target was enqueued with a reduced budget
    Redirected {
        /// The resolved target URL
        to: String,
    },

    /// The redirect target was already in the seen-set
    RedirectAlreadySeen,

    /// The redirect budget of this chain was spent
    RedirectLimit,

    /// The redirect target is outside the allowed hosts
    RedirectDisallowed,

    /// A redirect status came without a usable `Location` header
    MissingLocation,

    // ===== Failures =====
    /// Every attempt failed and the URL was abandoned
    Exhausted {
        /// Number of attempts made
        attempts: u32,
    },

    /// The response arrived but its body could not be read
    BodyError,

    /// The task URL could not be parsed
    InvalidUrl,
}

impl FetchOutcome {
    /// Returns true if a response body was scanned for links
    pub fn is_processed(&self) -> bool {
        matches!(self, Self::Processed { .. })
    }

    /// Returns true if the response was a redirect, whatever happened to its target
    pub fn is_redirect(&self) -> bool {
        matches!(
            self,
            Self::Redirected { .. }
                | Self::RedirectAlreadySeen
                | Self::RedirectLimit
                | Self::RedirectDisallowed
                | Self::MissingLocation
        )
    }

    /// Returns true if the URL was dropped without usable content
    pub fn is_abandoned(&self) -> bool {
        matches!(
            self,
            Self::Exhausted { .. } | Self::BodyError | Self::InvalidUrl
        )
    }

    /// Short machine-friendly name of the outcome
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Processed { .. } => "processed",
            Self::NotExtractable { .. } => "not_extractable",
            Self::Redirected { .. } => "redirected",
            Self::RedirectAlreadySeen => "redirect_already_seen",
            Self::RedirectLimit => "redirect_limit",
            Self::RedirectDisallowed => "redirect_disallowed",
            Self::MissingLocation => "missing_location",
            Self::Exhausted { .. } => "exhausted",
            Self::BodyError => "body_error",
            Self::InvalidUrl => "invalid_url",
        }
    }
}

impl fmt::Display for FetchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
