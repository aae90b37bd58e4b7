use thiserror::Error;

/// The standard result type used throughout the application.
pub type StdResult<T> = Result<T, anyhow::Error>;

/// The result type returned by the fetchers and requesters.
pub type FetcherResult<T> = Result<T, FetcherError>;

/// Fetcher error
#[derive(Error, Debug)]
pub enum FetcherError {
    /// The API answered with a non-2xx status
    #[error("Request failed with status {status}: {body}")]
    RequestFailed {
        /// The HTTP status code.
        status: u16,
        /// The raw response body.
        body: String,
    },

    /// The response body could not be interpreted
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// The rate limit headers are absent or unreadable
    #[error("Missing rate limit headers: {0}")]
    MissingRateLimitHeaders(String),

    /// The request never produced a response (connection, timeout, TLS)
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The request could not be built
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}
