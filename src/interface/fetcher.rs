use crate::{FetcherResult, Request, RestResponse};

/// A trait for fetching resources from the REST API.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait RestFetcher: Sync + Send {
    /// Performs exactly one GET request and returns the parsed response.
    async fn fetch(&self, request: &Request) -> FetcherResult<RestResponse>;
}
