mod fetcher_rate_limiter;
mod fetcher_rest;
mod github_api;
mod http_client;
mod paginator;
mod requester_graphql;

pub use fetcher_rate_limiter::*;
pub use fetcher_rest::*;
pub use github_api::*;
pub use http_client::*;
pub use paginator::*;
pub use requester_graphql::*;
