use std::{fmt::Display, time::Duration};

use chrono::{DateTime, Utc};
use reqwest::header::HeaderMap;
use serde::Deserialize;

use super::{FetcherError, FetcherResult};

/// Header carrying the number of requests left in the current window.
pub const RATE_LIMIT_REMAINING_HEADER: &str = "x-ratelimit-remaining";

/// Header carrying the Unix timestamp at which the window resets.
pub const RATE_LIMIT_RESET_HEADER: &str = "x-ratelimit-reset";

const RATE_LIMIT_LIMIT_HEADER: &str = "x-ratelimit-limit";
const RATE_LIMIT_USED_HEADER: &str = "x-ratelimit-used";
const RATE_LIMIT_RESOURCE_HEADER: &str = "x-ratelimit-resource";

/// Format used to display the reset time.
pub const RESET_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A snapshot of the API rate limit, read from the headers of a response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitSnapshot {
    /// The remaining number of requests that can be made in the current time period.
    pub remaining: u32,
    /// The time at which the rate limit will reset.
    pub reset_at: DateTime<Utc>,
    /// The maximum number of requests that can be made in the current time period.
    pub limit: Option<u32>,
    /// The number of requests already made in the current time period.
    pub used: Option<u32>,
    /// The rate limit bucket the request was counted against (`core`, `search`, ...).
    pub resource: Option<String>,
}

impl RateLimitSnapshot {
    /// Creates a new `RateLimitSnapshot` from the two mandatory values.
    pub fn new(remaining: u32, reset_at: DateTime<Utc>) -> Self {
        Self {
            remaining,
            reset_at,
            limit: None,
            used: None,
            resource: None,
        }
    }

    /// Reads the rate limit from the response headers.
    ///
    /// Fails if `X-RateLimit-Remaining` or `X-RateLimit-Reset` is absent or malformed.
    /// The other rate limit headers are optional.
    pub fn from_headers(headers: &HeaderMap) -> FetcherResult<Self> {
        let remaining = header_number::<u32>(headers, RATE_LIMIT_REMAINING_HEADER)?;
        let reset_timestamp = header_number::<i64>(headers, RATE_LIMIT_RESET_HEADER)?;
        let reset_at = DateTime::from_timestamp(reset_timestamp, 0).ok_or_else(|| {
            FetcherError::MissingRateLimitHeaders(format!(
                "{RATE_LIMIT_RESET_HEADER} out of range: {reset_timestamp}"
            ))
        })?;

        Ok(Self {
            remaining,
            reset_at,
            limit: header_number(headers, RATE_LIMIT_LIMIT_HEADER).ok(),
            used: header_number(headers, RATE_LIMIT_USED_HEADER).ok(),
            resource: headers
                .get(RATE_LIMIT_RESOURCE_HEADER)
                .and_then(|value| value.to_str().ok())
                .map(String::from),
        })
    }

    /// Whether the quota of the current time period is used up.
    pub fn is_exhausted(&self) -> bool {
        self.remaining == 0
    }

    /// Time left until the reset, zero if it is already past.
    pub fn duration_until_reset(&self, now: DateTime<Utc>) -> Duration {
        (self.reset_at - now).to_std().unwrap_or(Duration::ZERO)
    }

    /// The reset time formatted as `YYYY-MM-DD HH:MM:SS` (UTC).
    pub fn reset_time(&self) -> String {
        self.reset_at.format(RESET_TIME_FORMAT).to_string()
    }

    /// Creates a dummy `RateLimitSnapshot` for testing purposes.
    #[cfg(test)]
    pub fn dummy() -> Self {
        Self {
            remaining: 4999,
            reset_at: DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
            limit: Some(5000),
            used: Some(1),
            resource: Some("core".to_string()),
        }
    }
}

impl Display for RateLimitSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.limit {
            Some(limit) => write!(
                f,
                "RateLimit: remaining={}/{limit}, reset={}",
                self.remaining,
                self.reset_time()
            ),
            None => write!(
                f,
                "RateLimit: remaining={}, reset={}",
                self.remaining,
                self.reset_time()
            ),
        }
    }
}

fn header_number<T: std::str::FromStr>(headers: &HeaderMap, name: &str) -> FetcherResult<T> {
    let value = headers
        .get(name)
        .ok_or_else(|| FetcherError::MissingRateLimitHeaders(format!("{name} is absent")))?;

    value
        .to_str()
        .ok()
        .and_then(|value| value.trim().parse().ok())
        .ok_or_else(|| FetcherError::MissingRateLimitHeaders(format!("{name} is malformed: {value:?}")))
}

/// The license of a repository.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct License {
    /// The license key, e.g. `mit`.
    pub key: String,
    /// The license display name, e.g. `MIT License`.
    pub name: String,
}

/// Summary of a GitHub repository.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct RepositorySummary {
    /// The `owner/name` of the repository.
    pub full_name: String,
    /// The license detected by GitHub, if any.
    pub license: Option<License>,
}

impl Display for RepositorySummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.license {
            Some(license) => write!(f, "Repository: {}, License: {}", self.full_name, license.name),
            None => write!(f, "Repository: {}, License: none", self.full_name),
        }
    }
}

/// A GitHub user.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct User {
    /// The login of the user.
    pub login: String,
    /// The biography of the user.
    pub bio: Option<String>,
}

/// A pull request of a repository.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PullRequest {
    /// The number of the pull request in its repository.
    pub number: u64,
    /// The title of the pull request.
    pub title: String,
    /// `open` or `closed`.
    pub state: String,
}

impl Display for PullRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{} {}", self.number, self.title)
    }
}

/// The author of a discussion.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub login: String,
}

/// A repository discussion, as returned by the GraphQL API.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Discussion {
    pub title: String,
    /// `None` when the author account was deleted.
    pub author: Option<Actor>,
    pub answer_chosen_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use reqwest::header::{HeaderName, HeaderValue};
    use serde_json::json;

    use super::*;

    fn headers(values: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut headers = HeaderMap::new();
        for (name, value) in values {
            headers.insert(
                HeaderName::from_bytes(name.as_bytes()).unwrap(),
                HeaderValue::from_static(*value),
            );
        }

        headers
    }

    mod rate_limit_snapshot {
        use super::*;

        #[test]
        fn from_headers_exhausted() {
            let headers = headers(&[
                ("X-RateLimit-Remaining", "0"),
                ("X-RateLimit-Reset", "1700000000"),
            ]);

            let snapshot = RateLimitSnapshot::from_headers(&headers).unwrap();

            assert_eq!(0, snapshot.remaining);
            assert!(snapshot.is_exhausted());
            assert_eq!("2023-11-14 22:13:20", snapshot.reset_time());
            assert_eq!(
                DateTime::parse_from_rfc3339("2023-11-14T22:13:20Z").unwrap(),
                snapshot.reset_at
            );
        }

        #[test]
        fn from_headers_with_optional_values() {
            let headers = headers(&[
                ("x-ratelimit-limit", "5000"),
                ("x-ratelimit-remaining", "4999"),
                ("x-ratelimit-used", "1"),
                ("x-ratelimit-reset", "1700000000"),
                ("x-ratelimit-resource", "core"),
            ]);

            let snapshot = RateLimitSnapshot::from_headers(&headers).unwrap();

            assert_eq!(RateLimitSnapshot::dummy(), snapshot);
            assert!(!snapshot.is_exhausted());
        }

        #[test]
        fn from_headers_missing_remaining() {
            let headers = headers(&[("x-ratelimit-reset", "1700000000")]);

            let result = RateLimitSnapshot::from_headers(&headers);

            assert!(matches!(
                result,
                Err(FetcherError::MissingRateLimitHeaders(_))
            ));
        }

        #[test]
        fn from_headers_malformed_reset() {
            let headers = headers(&[
                ("x-ratelimit-remaining", "10"),
                ("x-ratelimit-reset", "tomorrow"),
            ]);

            let result = RateLimitSnapshot::from_headers(&headers);

            assert!(matches!(
                result,
                Err(FetcherError::MissingRateLimitHeaders(_))
            ));
        }

        #[test]
        fn from_headers_negative_remaining_is_malformed() {
            let headers = headers(&[
                ("x-ratelimit-remaining", "-1"),
                ("x-ratelimit-reset", "1700000000"),
            ]);

            assert!(RateLimitSnapshot::from_headers(&headers).is_err());
        }

        #[test]
        fn duration_until_reset() {
            let snapshot = RateLimitSnapshot::dummy();

            let before = snapshot.reset_at - chrono::Duration::seconds(90);
            let after = snapshot.reset_at + chrono::Duration::seconds(90);

            assert_eq!(Duration::from_secs(90), snapshot.duration_until_reset(before));
            assert_eq!(Duration::ZERO, snapshot.duration_until_reset(after));
        }

        #[test]
        fn display() {
            assert_eq!(
                "RateLimit: remaining=4999/5000, reset=2023-11-14 22:13:20",
                RateLimitSnapshot::dummy().to_string()
            );
        }
    }

    #[test]
    fn deserialize_repository_summary() {
        let repository: RepositorySummary = serde_json::from_value(json!({
            "id": 41881900,
            "full_name": "microsoft/vscode",
            "license": { "key": "mit", "name": "MIT License", "spdx_id": "MIT" }
        }))
        .unwrap();

        assert_eq!("MIT License", repository.license.unwrap().name);
    }

    #[test]
    fn deserialize_repository_without_license() {
        let repository: RepositorySummary = serde_json::from_value(json!({
            "full_name": "owner/repo",
            "license": null
        }))
        .unwrap();

        assert_eq!("Repository: owner/repo, License: none", repository.to_string());
    }

    #[test]
    fn display_pull_request() {
        let pull_request: PullRequest = serde_json::from_value(json!({
            "number": 1234,
            "title": "Fix the terminal",
            "state": "open",
            "draft": false
        }))
        .unwrap();

        assert_eq!("#1234 Fix the terminal", pull_request.to_string());
    }

    #[test]
    fn deserialize_discussion() {
        let discussion: Discussion = serde_json::from_value(json!({
            "title": "RFC",
            "author": { "login": "octocat" },
            "answerChosenAt": "2021-03-01T10:00:00Z"
        }))
        .unwrap();

        assert_eq!("octocat", discussion.author.unwrap().login);
        assert!(discussion.answer_chosen_at.is_some());
    }
}
