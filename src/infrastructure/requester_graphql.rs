use log::{debug, warn};
use serde_json::Value;
use url::Url;

use crate::{FetcherError, FetcherResult, GraphQlRequest, GraphQlRequester, HttpClient};

/// Sends query documents to a GraphQL endpoint over HTTP.
pub struct HttpGraphQlRequester {
    client: HttpClient,
    endpoint: Url,
}

impl HttpGraphQlRequester {
    /// Creates a new `HttpGraphQlRequester` instance for the given endpoint.
    pub fn new(client: HttpClient, endpoint: Url) -> Self {
        Self { client, endpoint }
    }
}

#[async_trait::async_trait]
impl GraphQlRequester for HttpGraphQlRequester {
    async fn request(&self, request: &GraphQlRequest) -> FetcherResult<Value> {
        debug!("Posting GraphQL query to {}", self.endpoint);
        let response = self
            .client
            .post(self.endpoint.to_owned())
            .headers(request.headers().to_owned())
            .json(&request.body())
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;

        match serde_json::from_str::<Value>(&body) {
            Ok(value) => {
                if value.get("errors").is_some() {
                    warn!("GraphQL query answered with errors (status {status})");
                }
                Ok(value)
            }
            Err(_) if !status.is_success() => Err(FetcherError::RequestFailed {
                status: status.as_u16(),
                body,
            }),
            Err(e) => Err(FetcherError::MalformedResponse(format!(
                "invalid JSON body from {}: {e}",
                self.endpoint
            ))),
        }
    }
}
