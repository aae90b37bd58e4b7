use serde::{Deserialize, de::DeserializeOwned};
use serde_json::Value;
use url::Url;

use super::{FetcherError, FetcherResult, PaginationLinks, RateLimitSnapshot};

/// A successful response of the REST API.
#[derive(Debug, Clone, PartialEq)]
pub struct RestResponse {
    /// The parsed JSON body
    pub(crate) body: Value,

    /// The pagination links of the `Link` header
    pub(crate) links: PaginationLinks,

    /// The API rate limit information, if the headers were present and readable
    pub(crate) rate_limit: Option<RateLimitSnapshot>,
}

impl RestResponse {
    /// Creates a new `RestResponse` instance.
    pub fn new(body: Value, links: PaginationLinks, rate_limit: Option<RateLimitSnapshot>) -> Self {
        Self {
            body,
            links,
            rate_limit,
        }
    }

    /// Retrieves the JSON body.
    pub fn body(&self) -> &Value {
        &self.body
    }

    /// Retrieves the pagination links.
    pub fn links(&self) -> &PaginationLinks {
        &self.links
    }

    /// Retrieves the API rate limit information.
    ///
    /// Fails with `MissingRateLimitHeaders` if the response did not carry it.
    pub fn rate_limit(&self) -> FetcherResult<&RateLimitSnapshot> {
        self.rate_limit.as_ref().ok_or_else(missing_rate_limit)
    }

    /// Decodes the body into a typed value.
    pub fn decode<T: DeserializeOwned>(&self) -> FetcherResult<T> {
        T::deserialize(&self.body).map_err(|e| FetcherError::MalformedResponse(e.to_string()))
    }
}

/// One page of a paginated resource collection.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    /// The records of the page, in server order
    pub(crate) records: Vec<Value>,

    /// The URL of the next page, if any
    pub(crate) next: Option<Url>,

    /// The API rate limit information
    pub(crate) rate_limit: Option<RateLimitSnapshot>,
}

impl Page {
    /// Creates a new `Page` instance.
    pub fn new(
        records: Vec<Value>,
        next: Option<Url>,
        rate_limit: Option<RateLimitSnapshot>,
    ) -> Self {
        Self {
            records,
            next,
            rate_limit,
        }
    }

    /// Retrieves the records.
    pub fn records(&self) -> &[Value] {
        &self.records
    }

    /// Decodes the records into typed values.
    pub fn records_as<T: DeserializeOwned>(&self) -> FetcherResult<Vec<T>> {
        self.records
            .iter()
            .map(|record| {
                T::deserialize(record).map_err(|e| FetcherError::MalformedResponse(e.to_string()))
            })
            .collect()
    }

    /// Retrieves the URL of the next page.
    pub fn next(&self) -> Option<&Url> {
        self.next.as_ref()
    }

    /// Retrieves the API rate limit information.
    ///
    /// Fails with `MissingRateLimitHeaders` if the response did not carry it.
    pub fn rate_limit(&self) -> FetcherResult<&RateLimitSnapshot> {
        self.rate_limit.as_ref().ok_or_else(missing_rate_limit)
    }

    /// Creates a dummy `Page` for testing purposes.
    #[cfg(test)]
    pub(crate) fn dummy(records: Vec<Value>, next: Option<&str>) -> Self {
        Self::new(
            records,
            next.map(|url| Url::parse(url).unwrap()),
            Some(RateLimitSnapshot::dummy()),
        )
    }
}

impl TryFrom<RestResponse> for Page {
    type Error = FetcherError;

    fn try_from(response: RestResponse) -> Result<Self, Self::Error> {
        match response.body {
            Value::Array(records) => Ok(Self::new(
                records,
                response.links.next,
                response.rate_limit,
            )),
            other => Err(FetcherError::MalformedResponse(format!(
                "expected a JSON array of records, got: {other}"
            ))),
        }
    }
}

/// A single REST resource decoded into a typed value.
#[derive(Debug, Clone, PartialEq)]
pub struct Resource<T> {
    /// The decoded resource
    pub(crate) value: T,

    /// The API rate limit information
    pub(crate) rate_limit: Option<RateLimitSnapshot>,
}

impl<T> Resource<T> {
    /// Creates a new `Resource` instance.
    pub fn new(value: T, rate_limit: Option<RateLimitSnapshot>) -> Self {
        Self { value, rate_limit }
    }

    /// Retrieves the decoded resource.
    pub fn value(&self) -> &T {
        &self.value
    }

    /// Consumes the resource and returns the decoded value.
    pub fn into_value(self) -> T {
        self.value
    }

    /// Retrieves the API rate limit information.
    pub fn rate_limit(&self) -> FetcherResult<&RateLimitSnapshot> {
        self.rate_limit.as_ref().ok_or_else(missing_rate_limit)
    }
}

/// The envelope of a GraphQL response.
///
/// The API answers `200 OK` even when the query itself failed, so both fields
/// may be set at once.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct GraphQlResponse<T> {
    /// The requested data, `None` if the query could not be executed.
    pub data: Option<T>,
    /// The query level errors.
    #[serde(default)]
    pub errors: Vec<GraphQlError>,
}

impl<T: DeserializeOwned> GraphQlResponse<T> {
    /// Decodes a raw GraphQL response body.
    ///
    /// A body carrying neither `data` nor `errors` is not a GraphQL response,
    /// e.g. `{"message": "Bad credentials"}`, and fails with the body attached.
    pub fn from_value(value: &Value) -> FetcherResult<Self> {
        if value.get("data").is_none() && value.get("errors").is_none() {
            return Err(FetcherError::MalformedResponse(format!(
                "not a GraphQL response: {value}"
            )));
        }

        Self::deserialize(value).map_err(|e| FetcherError::MalformedResponse(e.to_string()))
    }
}

impl<T> GraphQlResponse<T> {
    /// Whether the response reports query level errors.
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// A query level error reported by the GraphQL API.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct GraphQlError {
    pub message: String,
    /// The error type, e.g. `NOT_FOUND`.
    #[serde(rename = "type")]
    pub error_type: Option<String>,
    #[serde(default)]
    pub path: Vec<Value>,
}

fn missing_rate_limit() -> FetcherError {
    FetcherError::MissingRateLimitHeaders("the response did not carry rate limit headers".into())
}
