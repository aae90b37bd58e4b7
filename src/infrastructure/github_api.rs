use std::sync::Arc;

use futures::stream::BoxStream;
use serde::Deserialize;
use serde_json::{Value, json};
use url::Url;

use crate::{
    ApiConfig, Discussion, FetcherResult, GraphQlRequest, GraphQlRequester, GraphQlResponse,
    Page, Paginator, PullRequest, RepositorySummary, Request, Resource, RestFetcher, User,
};

/// Opt-in header for GraphQL features still in preview.
pub const GRAPHQL_FEATURES_HEADER: &str = "GraphQL-Features";

const DISCUSSIONS_QUERY: &str = r#"
query ($owner: String!, $name: String!, $first: Int!) {
    repository(owner: $owner, name: $name) {
        discussions(first: $first) {
            edges {
                node {
                    title
                    author {
                        login
                    }
                    answerChosenAt
                }
            }
        }
    }
}
"#;

#[derive(Deserialize, Debug)]
struct DiscussionsData {
    repository: Option<DiscussionsRepository>,
}

#[derive(Deserialize, Debug)]
struct DiscussionsRepository {
    discussions: DiscussionConnection,
}

#[derive(Deserialize, Debug)]
struct DiscussionConnection {
    edges: Vec<Option<DiscussionEdge>>,
}

#[derive(Deserialize, Debug)]
struct DiscussionEdge {
    node: Discussion,
}

/// Filters of the pull request list endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PullRequestFilter {
    /// `open`, `closed` or `all`.
    pub state: Option<String>,
    /// `created`, `updated`, `popularity` or `long-running`.
    pub sort: Option<String>,
    /// Page size, at most 100.
    pub per_page: Option<u8>,
}

impl PullRequestFilter {
    fn apply(&self, mut request: Request) -> Request {
        if let Some(state) = &self.state {
            request = request.with_param("state", state);
        }
        if let Some(sort) = &self.sort {
            request = request.with_param("sort", sort);
        }
        if let Some(per_page) = self.per_page {
            request = request.with_param("per_page", per_page.min(100));
        }

        request
    }
}

/// Typed access to the GitHub endpoints used by the command line.
pub struct GitHubApi {
    config: ApiConfig,
    fetcher: Arc<dyn RestFetcher>,
    paginator: Paginator,
    requester: Arc<dyn GraphQlRequester>,
}

impl GitHubApi {
    /// Creates a new `GitHubApi` instance.
    pub fn new(
        config: ApiConfig,
        fetcher: Arc<dyn RestFetcher>,
        requester: Arc<dyn GraphQlRequester>,
    ) -> Self {
        Self {
            config,
            paginator: Paginator::new(Arc::clone(&fetcher)),
            fetcher,
            requester,
        }
    }

    /// Fetches the summary of a repository.
    pub async fn repository(
        &self,
        owner: &str,
        name: &str,
    ) -> FetcherResult<Resource<RepositorySummary>> {
        self.fetch_resource(&format!("repos/{owner}/{name}")).await
    }

    /// Fetches a user profile.
    pub async fn user(&self, login: &str) -> FetcherResult<Resource<User>> {
        self.fetch_resource(&format!("users/{login}")).await
    }

    /// Fetches the first page of pull requests of a repository.
    pub async fn pull_requests(
        &self,
        owner: &str,
        name: &str,
        filter: &PullRequestFilter,
    ) -> FetcherResult<Page> {
        let request = self.pull_requests_request(owner, name, filter)?;

        Page::try_from(self.fetcher.fetch(&request).await?)
    }

    /// Returns the lazy sequence of pull request pages of a repository.
    pub fn pull_request_pages(
        &self,
        owner: &str,
        name: &str,
        filter: &PullRequestFilter,
    ) -> FetcherResult<BoxStream<'static, FetcherResult<Page>>> {
        let request = self.pull_requests_request(owner, name, filter)?;

        Ok(self.paginator.fetch_all(request))
    }

    /// Fetches every pull request of a repository, across all pages.
    pub async fn all_pull_requests(
        &self,
        owner: &str,
        name: &str,
        filter: &PullRequestFilter,
    ) -> FetcherResult<Vec<PullRequest>> {
        let request = self.pull_requests_request(owner, name, filter)?;

        self.paginator.collect_all(request).await
    }

    /// Queries the first discussions of a repository and returns the raw JSON body.
    pub async fn discussions_json(
        &self,
        owner: &str,
        name: &str,
        first: u8,
    ) -> FetcherResult<Value> {
        let request = GraphQlRequest::new(DISCUSSIONS_QUERY)
            .with_variables(json!({ "owner": owner, "name": name, "first": first }))
            .with_header(GRAPHQL_FEATURES_HEADER, "discussions_api")?;

        self.requester.request(&request).await
    }

    /// Queries the first discussions of a repository through the GraphQL API.
    ///
    /// Query level errors are returned in the response, not as an `Err`.
    pub async fn discussions(
        &self,
        owner: &str,
        name: &str,
        first: u8,
    ) -> FetcherResult<GraphQlResponse<Vec<Discussion>>> {
        let value = self.discussions_json(owner, name, first).await?;
        let response = GraphQlResponse::<DiscussionsData>::from_value(&value)?;

        Ok(GraphQlResponse {
            data: response.data.map(|data| {
                data.repository
                    .map(|repository| {
                        repository
                            .discussions
                            .edges
                            .into_iter()
                            .flatten()
                            .map(|edge| edge.node)
                            .collect()
                    })
                    .unwrap_or_default()
            }),
            errors: response.errors,
        })
    }

    async fn fetch_resource<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
    ) -> FetcherResult<Resource<T>> {
        let request = Request::new(self.config.rest_url(path)?);
        let response = self.fetcher.fetch(&request).await?;

        Ok(Resource::new(response.decode()?, response.rate_limit.clone()))
    }

    /// Returns the URL of the pull request list of a repository.
    pub fn pull_requests_url(&self, owner: &str, name: &str) -> FetcherResult<Url> {
        self.config.rest_url(&format!("repos/{owner}/{name}/pulls"))
    }

    fn pull_requests_request(
        &self,
        owner: &str,
        name: &str,
        filter: &PullRequestFilter,
    ) -> FetcherResult<Request> {
        let url = self.pull_requests_url(owner, name)?;

        Ok(filter.apply(Request::new(url)))
    }
}
