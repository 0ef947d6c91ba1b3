use thiserror::Error;

/// Why one upstream source contributed nothing to a refresh.
#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("request to {url} timed out")]
    Timeout { url: String },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid source URL \"{url}\": {reason}")]
    InvalidSourceUrl { url: String, reason: String },
}

impl ScraperError {
    /// Short machine-readable label used in logs and refresh reports.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            ScraperError::Http(_) | ScraperError::Timeout { .. } => "transport",
            ScraperError::UnexpectedStatus { .. } => "status",
            ScraperError::Deserialize { .. } => "decode",
            ScraperError::InvalidSourceUrl { .. } => "config",
        }
    }
}
