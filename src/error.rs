use thiserror::Error;

/// Failure of a single page request. Page fetchers resolve to this instead of
/// panicking, so the aggregator can tell a failed page apart from an empty one.
#[derive(Debug, Error)]
pub enum PageError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("provider returned status {status}")]
    Status { status: u16 },

    #[error("malformed page body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("item {index} has a non-finite coordinate")]
    InvalidCoordinate { index: usize },
}

/// Failure of a whole aggregation or store fetch.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The probing request (offset 0) failed; without it there is no total
    /// and the aggregation cannot proceed.
    #[error("probe request failed: {0}")]
    Probe(#[source] PageError),
}
