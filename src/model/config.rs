use std::{fmt::Debug, time::Duration};

use url::Url;

use super::{FetcherError, FetcherResult};

/// The REST production endpoint for GitHub.
pub const GITHUB_REST_ENDPOINT: &str = "https://api.github.com/";

/// The GraphQL production endpoint for GitHub.
pub const GITHUB_GRAPHQL_ENDPOINT: &str = "https://api.github.com/graphql";

/// The default timeout of a single request.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const DEFAULT_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// The credentials attached to every request of a run.
#[derive(Clone, Default, PartialEq, Eq)]
pub enum Credentials {
    /// No authentication, subject to the lowest rate limit.
    #[default]
    Anonymous,

    /// A personal access token sent as a bearer token.
    Token(String),

    /// A user name and a personal access token sent with basic authentication.
    Basic {
        /// The GitHub user name.
        username: String,
        /// The personal access token.
        token: String,
    },
}

impl Credentials {
    /// Builds the credentials from an optional token and user name.
    pub fn from_parts(username: Option<String>, token: Option<String>) -> Self {
        match (username, token) {
            (Some(username), Some(token)) => Self::Basic { username, token },
            (None, Some(token)) => Self::Token(token),
            (_, None) => Self::Anonymous,
        }
    }
}

impl Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Anonymous => write!(f, "Anonymous"),
            Self::Token(_) => write!(f, "Token(***)"),
            Self::Basic { username, .. } => write!(f, "Basic({username}:***)"),
        }
    }
}

/// Configuration shared by the REST fetcher and the GraphQL requester.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// The base URL of the REST API.
    pub rest_base_url: Url,
    /// The URL of the GraphQL endpoint.
    pub graphql_url: Url,
    /// The credentials of the run.
    pub credentials: Credentials,
    /// The `User-Agent` header, required by GitHub.
    pub user_agent: String,
    /// The timeout of a single request.
    pub timeout: Duration,
}

impl ApiConfig {
    /// Creates a configuration targeting the GitHub production endpoints.
    pub fn try_new(credentials: Credentials) -> FetcherResult<Self> {
        Self::with_endpoints(GITHUB_REST_ENDPOINT, GITHUB_GRAPHQL_ENDPOINT, credentials)
    }

    /// Creates a configuration targeting custom endpoints (GitHub Enterprise, mock servers).
    pub fn with_endpoints(
        rest_base_url: &str,
        graphql_url: &str,
        credentials: Credentials,
    ) -> FetcherResult<Self> {
        Ok(Self {
            rest_base_url: parse_base_url(rest_base_url)?,
            graphql_url: Url::parse(graphql_url).map_err(|e| {
                FetcherError::InvalidRequest(format!("invalid GraphQL URL {graphql_url}: {e}"))
            })?,
            credentials,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: DEFAULT_TIMEOUT,
        })
    }

    /// Sets the timeout of a single request.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Resolves an API path such as `repos/owner/name` against the REST base URL.
    pub fn rest_url(&self, path: &str) -> FetcherResult<Url> {
        self.rest_base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| FetcherError::InvalidRequest(format!("invalid API path {path}: {e}")))
    }
}

// `Url::join` replaces the last segment of a base without a trailing slash.
fn parse_base_url(url: &str) -> FetcherResult<Url> {
    let url = if url.ends_with('/') {
        url.to_string()
    } else {
        format!("{url}/")
    };

    Url::parse(&url).map_err(|e| FetcherError::InvalidRequest(format!("invalid base URL {url}: {e}")))
}
