use std::fmt::Display;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::Serialize;
use serde_json::Value;
use url::Url;

use super::{FetcherError, FetcherResult};

/// A GET request being made to the REST API
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    /// The absolute URL of the resource.
    pub(crate) url: Url,

    /// The query parameters, in insertion order with unique keys.
    pub(crate) params: Vec<(String, String)>,

    /// The request headers.
    pub(crate) headers: HeaderMap,
}

impl Request {
    /// Creates a new `Request` for the given URL, without parameters or headers.
    pub fn new(url: Url) -> Self {
        Self {
            url,
            params: vec![],
            headers: HeaderMap::new(),
        }
    }

    /// Parses the URL and creates a new `Request`.
    pub fn try_new(url: &str) -> FetcherResult<Self> {
        let url = Url::parse(url)
            .map_err(|e| FetcherError::InvalidRequest(format!("invalid URL {url}: {e}")))?;

        Ok(Self::new(url))
    }

    /// Adds a query parameter, replacing any previous value for the same key.
    pub fn with_param<V: Display>(mut self, key: &str, value: V) -> Self {
        let value = value.to_string();
        match self.params.iter_mut().find(|(k, _)| k == key) {
            Some((_, existing)) => *existing = value,
            None => self.params.push((key.to_string(), value)),
        }

        self
    }

    /// Adds a header, replacing any previous value for the same name.
    pub fn with_header(mut self, name: &str, value: &str) -> FetcherResult<Self> {
        let (name, value) = parse_header(name, value)?;
        self.headers.insert(name, value);

        Ok(self)
    }

    /// Derives the request for the page at `url`.
    ///
    /// The URL is used verbatim: the parameters of the first request are already
    /// embedded in the links returned by the server, so they are not re-appended.
    pub fn follow(&self, url: Url) -> Self {
        Self {
            url,
            params: vec![],
            headers: self.headers.clone(),
        }
    }

    /// Retrieves the URL.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Retrieves the query parameters.
    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    /// Retrieves the headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Creates a dummy `Request` for testing purposes.
    #[cfg(test)]
    pub(crate) fn dummy() -> Self {
        Self::new(Url::parse("https://api.github.com/repos/owner/repo/pulls").unwrap())
            .with_param("state", "open")
    }
}

impl Display for Request {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Request: url={}, params={:?}", self.url, self.params)
    }
}

/// A query document sent to the GraphQL API
#[derive(Debug, Clone, PartialEq)]
pub struct GraphQlRequest {
    /// The GraphQL query document, sent verbatim.
    pub(crate) query: String,

    /// The variables referenced by the query document.
    pub(crate) variables: Option<Value>,

    /// The request headers.
    pub(crate) headers: HeaderMap,
}

impl GraphQlRequest {
    /// Creates a new `GraphQlRequest` with the given query document.
    pub fn new(query: &str) -> Self {
        Self {
            query: query.to_string(),
            variables: None,
            headers: HeaderMap::new(),
        }
    }

    /// Sets the variables of the query.
    pub fn with_variables(mut self, variables: Value) -> Self {
        self.variables = Some(variables);
        self
    }

    /// Adds a header, replacing any previous value for the same name.
    pub fn with_header(mut self, name: &str, value: &str) -> FetcherResult<Self> {
        let (name, value) = parse_header(name, value)?;
        self.headers.insert(name, value);

        Ok(self)
    }

    /// Retrieves the query document.
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Retrieves the headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// The JSON body posted to the endpoint.
    pub(crate) fn body(&self) -> GraphQlBody<'_> {
        GraphQlBody {
            query: &self.query,
            variables: self.variables.as_ref(),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct GraphQlBody<'a> {
    query: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    variables: Option<&'a Value>,
}

fn parse_header(name: &str, value: &str) -> FetcherResult<(HeaderName, HeaderValue)> {
    let header_name = HeaderName::from_bytes(name.as_bytes())
        .map_err(|e| FetcherError::InvalidRequest(format!("invalid header name {name}: {e}")))?;
    let header_value = HeaderValue::from_str(value)
        .map_err(|e| FetcherError::InvalidRequest(format!("invalid value for header {name}: {e}")))?;

    Ok((header_name, header_value))
}
