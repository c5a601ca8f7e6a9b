use thiserror::Error;

/// Error type for upstream indexer calls
#[derive(Debug, Error)]
pub enum TzktError {
    /// Transport failure, including the per-request timeout
    #[error("HTTP error calling {url}: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Upstream answered with a non-2xx status
    #[error("{url} returned status {status}: {body}")]
    Status { url: String, status: u16, body: String },

    /// Body was not a JSON array of delegation operations
    #[error("error decoding response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    /// Empty body; the sync engine reads this as clean end of data
    #[error("EOF")]
    EndOfData,

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("failed to create HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

impl TzktError {
    pub fn is_end_of_data(&self) -> bool {
        matches!(self, TzktError::EndOfData)
    }
}
