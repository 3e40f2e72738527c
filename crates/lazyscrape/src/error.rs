// ABOUTME: Error types for lazyscrape: the ScrapeError enum and its convenience constructors.
// ABOUTME: Fetch and cache failures carry their cause as an anyhow source.

use thiserror::Error;

use crate::xpath::XPathError;

/// Errors raised while fetching pages and extracting records from them.
///
/// Missing attributes and empty matches are never errors; they resolve to
/// empty strings and empty datasets respectively.
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// The URL could not be parsed or uses an unsupported scheme.
    #[error("invalid URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// The request could not be sent or its body could not be read.
    #[error("fetch {url} failed: {source}")]
    Fetch {
        url: String,
        #[source]
        source: anyhow::Error,
    },

    /// The server answered with a non-success status code.
    #[error("fetch {url} failed: HTTP status {status}")]
    Status { url: String, status: u16 },

    /// An XPath expression failed to compile or to evaluate.
    #[error(transparent)]
    XPath(#[from] XPathError),

    /// A pattern name that is not in the registry.
    #[error("unknown pattern '{0}'")]
    UnknownPattern(String),

    /// A class or id selector that cannot be embedded in a query.
    #[error("invalid selector value: {0}")]
    InvalidSelector(String),

    /// A page range that is not `start,end,step[,pagesize]` with a positive step.
    #[error("invalid page range '{range}': {reason}")]
    InvalidPageRange { range: String, reason: String },

    /// An output format name that is not text, csv or json.
    #[error("unknown output format '{0}'")]
    UnknownFormat(String),

    /// The dataset shape cannot be rendered in the requested format.
    #[error("{0} output cannot represent nested form data")]
    Unrepresentable(&'static str),

    /// Two pages of one run produced datasets of different shapes.
    #[error("cannot append {found} to {expected}")]
    ShapeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    /// The page cache could not be opened.
    #[error("cache error: {0}")]
    Cache(#[source] anyhow::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl ScrapeError {
    /// Create an InvalidUrl error.
    pub fn invalid_url(url: impl Into<String>, reason: impl Into<String>) -> Self {
        ScrapeError::InvalidUrl {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Create a Fetch error wrapping the underlying cause.
    pub fn fetch(url: impl Into<String>, source: impl Into<anyhow::Error>) -> Self {
        ScrapeError::Fetch {
            url: url.into(),
            source: source.into(),
        }
    }

    /// Create an InvalidPageRange error.
    pub fn page_range(range: impl Into<String>, reason: impl Into<String>) -> Self {
        ScrapeError::InvalidPageRange {
            range: range.into(),
            reason: reason.into(),
        }
    }

    /// Returns true for request and HTTP status failures.
    pub fn is_fetch(&self) -> bool {
        matches!(self, ScrapeError::Fetch { .. } | ScrapeError::Status { .. })
    }

    /// Returns true if this is an UnknownPattern error.
    pub fn is_unknown_pattern(&self) -> bool {
        matches!(self, ScrapeError::UnknownPattern(_))
    }

    /// Returns true if this is an InvalidPageRange error.
    pub fn is_page_range(&self) -> bool {
        matches!(self, ScrapeError::InvalidPageRange { .. })
    }
}

pub type Result<T, E = ScrapeError> = std::result::Result<T, E>;
