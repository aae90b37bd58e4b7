use std::sync::Arc;

use chrono::Utc;
use log::warn;
use tokio::time::sleep;

use crate::{FetcherResult, Request, RestFetcher, RestResponse};

/// Waits for the rate limit reset once a response reports an exhausted quota.
///
/// This is opt-in: the plain fetchers never wait on their own.
pub struct FetcherRateLimitWaiter {
    /// The fetcher to be rate limited.
    fetcher: Arc<dyn RestFetcher>,
}

impl FetcherRateLimitWaiter {
    /// Creates a new `FetcherRateLimitWaiter` instance with the given fetcher.
    pub fn new(fetcher: Arc<dyn RestFetcher>) -> Self {
        Self { fetcher }
    }
}

#[async_trait::async_trait]
impl RestFetcher for FetcherRateLimitWaiter {
    /// Fetches, then sleeps until the reset time if no request is left.
    async fn fetch(&self, request: &Request) -> FetcherResult<RestResponse> {
        let response = self.fetcher.fetch(request).await?;
        if let Ok(rate_limit) = response.rate_limit() {
            if rate_limit.is_exhausted() {
                let duration_until_reset = rate_limit.duration_until_reset(Utc::now());
                warn!(
                    "Fetcher rate limit exhausted after {}, waiting for {duration_until_reset:?}",
                    request.url()
                );
                sleep(duration_until_reset).await;
            }
        }

        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use chrono::DateTime;
    use serde_json::json;

    use crate::{MockRestFetcher, PaginationLinks, RateLimitSnapshot};

    use super::*;

    fn waiter_returning(rate_limit: Option<RateLimitSnapshot>) -> FetcherRateLimitWaiter {
        FetcherRateLimitWaiter::new(Arc::new({
            let mut mock_fetcher = MockRestFetcher::new();
            mock_fetcher
                .expect_fetch()
                .returning(move |_| {
                    Ok(RestResponse::new(
                        json!([]),
                        PaginationLinks::default(),
                        rate_limit.clone(),
                    ))
                })
                .times(1);

            mock_fetcher
        }))
    }

    #[tokio::test]
    async fn fetch_rate_limit_not_exhausted() {
        let reset_at = DateTime::from_timestamp(Utc::now().timestamp() + 60, 0).unwrap();
        let waiter = waiter_returning(Some(RateLimitSnapshot::new(100, reset_at)));

        waiter.fetch(&Request::dummy()).await.unwrap();

        assert!(reset_at > Utc::now());
    }

    #[tokio::test]
    async fn fetch_rate_limit_exhausted() {
        let reset_at = DateTime::from_timestamp(Utc::now().timestamp() + 1, 0).unwrap();
        let waiter = waiter_returning(Some(RateLimitSnapshot::new(0, reset_at)));

        waiter.fetch(&Request::dummy()).await.unwrap();

        assert!(reset_at <= Utc::now());
    }

    #[tokio::test]
    async fn fetch_without_rate_limit_does_not_wait() {
        let waiter = waiter_returning(None);

        let response = waiter.fetch(&Request::dummy()).await.unwrap();

        assert!(response.rate_limit().is_err());
    }

    #[tokio::test]
    async fn fetch_propagates_errors() {
        let waiter = FetcherRateLimitWaiter::new(Arc::new({
            let mut mock_fetcher = MockRestFetcher::new();
            mock_fetcher
                .expect_fetch()
                .returning(|_| {
                    Err(crate::FetcherError::RequestFailed {
                        status: 403,
                        body: "API rate limit exceeded".to_string(),
                    })
                })
                .times(1);

            mock_fetcher
        }));

        waiter
            .fetch(&Request::dummy())
            .await
            .expect_err("Expected the fetch error to be propagated");
    }
}
