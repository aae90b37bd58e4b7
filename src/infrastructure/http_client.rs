use reqwest::{
    Client, RequestBuilder,
    header::{ACCEPT, HeaderMap, HeaderValue},
};
use url::Url;

use crate::{ApiConfig, Credentials, FetcherResult};

const GITHUB_JSON_MEDIA_TYPE: &str = "application/vnd.github+json";

/// An HTTP client attaching the credentials of the run to every request.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    credentials: Credentials,
}

impl HttpClient {
    /// Creates a new `HttpClient` from the API configuration.
    pub fn try_new(config: &ApiConfig) -> FetcherResult<Self> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(ACCEPT, HeaderValue::from_static(GITHUB_JSON_MEDIA_TYPE));
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .default_headers(default_headers)
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            client,
            credentials: config.credentials.clone(),
        })
    }

    /// Starts an authorized GET request.
    pub fn get(&self, url: Url) -> RequestBuilder {
        self.authorize(self.client.get(url))
    }

    /// Starts an authorized POST request.
    pub fn post(&self, url: Url) -> RequestBuilder {
        self.authorize(self.client.post(url))
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.credentials {
            Credentials::Anonymous => builder,
            Credentials::Token(token) => builder.bearer_auth(token),
            Credentials::Basic { username, token } => builder.basic_auth(username, Some(token)),
        }
    }
}
