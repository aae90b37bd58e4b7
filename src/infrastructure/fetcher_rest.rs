use log::{debug, warn};
use serde_json::Value;

use crate::{
    FetcherError, FetcherResult, HttpClient, PaginationLinks, RateLimitSnapshot, Request,
    RestFetcher, RestResponse,
};

/// Fetches resources from the REST API over HTTP.
pub struct HttpRestFetcher {
    client: HttpClient,
}

impl HttpRestFetcher {
    /// Creates a new `HttpRestFetcher` instance with the given HTTP client.
    pub fn new(client: HttpClient) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl RestFetcher for HttpRestFetcher {
    async fn fetch(&self, request: &Request) -> FetcherResult<RestResponse> {
        debug!("Fetching {request}");
        let mut builder = self
            .client
            .get(request.url().to_owned())
            .headers(request.headers().to_owned());
        if !request.params().is_empty() {
            builder = builder.query(request.params());
        }
        let response = builder.send().await?;

        let status = response.status();
        let headers = response.headers().to_owned();
        let url = response.url().to_owned();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(FetcherError::RequestFailed {
                status: status.as_u16(),
                body,
            });
        }

        let rate_limit = match RateLimitSnapshot::from_headers(&headers) {
            Ok(rate_limit) => {
                if rate_limit.is_exhausted() {
                    warn!("API rate limit exhausted, {rate_limit}");
                }
                Some(rate_limit)
            }
            Err(e) => {
                debug!("No rate limit information for {url}: {e}");
                None
            }
        };
        let body: Value = serde_json::from_str(&body).map_err(|e| {
            FetcherError::MalformedResponse(format!("invalid JSON body from {url}: {e}"))
        })?;

        Ok(RestResponse::new(
            body,
            PaginationLinks::from_headers(&headers, &url),
            rate_limit,
        ))
    }
}

#[cfg(test)]
mod tests {
    use httpmock::prelude::*;
    use serde_json::json;

    use crate::{ApiConfig, Credentials};

    use super::*;

    fn fetcher(server: &MockServer, credentials: Credentials) -> HttpRestFetcher {
        let config =
            ApiConfig::with_endpoints(&server.url("/"), &server.url("/graphql"), credentials)
                .unwrap();

        HttpRestFetcher::new(HttpClient::try_new(&config).unwrap())
    }

    #[tokio::test]
    async fn fetch_with_params_and_rate_limit() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/repos/microsoft/vscode/pulls")
                    .query_param("state", "open")
                    .query_param("per_page", "10")
                    .header("authorization", "Bearer credentials");
                then.status(200)
                    .header("content-type", "application/json")
                    .header("x-ratelimit-remaining", "0")
                    .header("x-ratelimit-reset", "1700000000")
                    .json_body(json!([{ "number": 1, "title": "Fix", "state": "open" }]));
            })
            .await;
        let fetcher = fetcher(&server, Credentials::Token("credentials".to_string()));
        let request = Request::try_new(&server.url("/repos/microsoft/vscode/pulls"))
            .unwrap()
            .with_param("state", "open")
            .with_param("per_page", 10);

        let response = fetcher.fetch(&request).await.unwrap();

        mock.assert_async().await;
        let rate_limit = response.rate_limit().unwrap();
        assert_eq!(0, rate_limit.remaining);
        assert_eq!("2023-11-14 22:13:20", rate_limit.reset_time());
        assert_eq!(&json!([{ "number": 1, "title": "Fix", "state": "open" }]), response.body());
        assert_eq!(None, response.links().next);
    }

    #[tokio::test]
    async fn fetch_with_basic_auth() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/users/fronchetti")
                    .header("authorization", "Basic dXNlcjp0b2tlbg==");
                then.status(200)
                    .json_body(json!({ "login": "fronchetti", "bio": "Researcher" }));
            })
            .await;
        let fetcher = fetcher(
            &server,
            Credentials::Basic {
                username: "user".to_string(),
                token: "token".to_string(),
            },
        );
        let request = Request::try_new(&server.url("/users/fronchetti")).unwrap();

        let response = fetcher.fetch(&request).await.unwrap();

        mock.assert_async().await;
        assert_eq!("Researcher", response.body()["bio"]);
    }

    #[tokio::test]
    async fn fetch_parses_next_link() {
        let server = MockServer::start_async().await;
        let next = server.url("/repositories/1/pulls?state=open&page=2");
        server
            .mock_async(|when, then| {
                when.method(GET).path("/repos/owner/repo/pulls");
                then.status(200)
                    .header("link", format!(r#"<{next}>; rel="next""#))
                    .json_body(json!([]));
            })
            .await;
        let fetcher = fetcher(&server, Credentials::Anonymous);
        let request = Request::try_new(&server.url("/repos/owner/repo/pulls")).unwrap();

        let response = fetcher.fetch(&request).await.unwrap();

        assert_eq!(
            Some(next.as_str()),
            response.links().next.as_ref().map(|url| url.as_str())
        );
    }

    #[tokio::test]
    async fn fetch_without_rate_limit_headers() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/repos/owner/repo");
                then.status(200).json_body(json!({ "full_name": "owner/repo" }));
            })
            .await;
        let fetcher = fetcher(&server, Credentials::Anonymous);
        let request = Request::try_new(&server.url("/repos/owner/repo")).unwrap();

        let response = fetcher.fetch(&request).await.unwrap();

        assert!(matches!(
            response.rate_limit(),
            Err(FetcherError::MissingRateLimitHeaders(_))
        ));
    }

    #[tokio::test]
    async fn fetch_fails_on_error_status() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/repos/owner/missing");
                then.status(404).body(r#"{"message":"Not Found"}"#);
            })
            .await;
        let fetcher = fetcher(&server, Credentials::Anonymous);
        let request = Request::try_new(&server.url("/repos/owner/missing")).unwrap();

        let result = fetcher.fetch(&request).await;

        match result {
            Err(FetcherError::RequestFailed { status, body }) => {
                assert_eq!(404, status);
                assert_eq!(r#"{"message":"Not Found"}"#, body);
            }
            other => panic!("Expected a request failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn fetch_fails_on_non_json_body() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/repos/owner/repo");
                then.status(200).body("<html>maintenance</html>");
            })
            .await;
        let fetcher = fetcher(&server, Credentials::Anonymous);
        let request = Request::try_new(&server.url("/repos/owner/repo")).unwrap();

        let result = fetcher.fetch(&request).await;

        assert!(matches!(result, Err(FetcherError::MalformedResponse(_))));
    }
}
