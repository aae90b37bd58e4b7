use serde_json::Value;

use crate::{FetcherResult, GraphQlRequest};

/// A trait for sending query documents to the GraphQL API.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait GraphQlRequester: Sync + Send {
    /// Posts the query document and returns the JSON body unchanged, query level errors included.
    async fn request(&self, request: &GraphQlRequest) -> FetcherResult<Value>;
}
