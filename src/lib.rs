//! Walkthrough of the GitHub REST (v3) and GraphQL (v4) APIs.
//!
//! The REST side follows `Link` headers through a lazy [`Paginator`] stream and
//! reads the rate limit headers of every response into a [`RateLimitSnapshot`].
//! The GraphQL side posts a query document and hands back the JSON body as-is.

mod infrastructure;
mod interface;
mod model;

pub use infrastructure::*;
pub use interface::*;
pub use model::*;
