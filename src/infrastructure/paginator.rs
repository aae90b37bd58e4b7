use std::sync::Arc;

use futures::{
    StreamExt, TryStreamExt,
    stream::{self, BoxStream},
};
use log::{debug, info};
use serde::de::DeserializeOwned;

use crate::{FetcherError, FetcherResult, Page, Request, RestFetcher};

/// Walks a paginated REST collection by following the `next` links.
///
/// No retries and no waiting happen here: callers read the rate limit of each
/// page and decide whether to keep polling.
pub struct Paginator {
    fetcher: Arc<dyn RestFetcher>,
}

impl Paginator {
    /// Creates a new `Paginator` instance with the given fetcher.
    pub fn new(fetcher: Arc<dyn RestFetcher>) -> Self {
        Self { fetcher }
    }

    /// Returns the lazy sequence of pages starting at `request`.
    ///
    /// Nothing is fetched until the stream is polled, and each poll performs one
    /// request. The stream ends after the first page without a `next` link, or
    /// right after yielding an error. A new call starts over from `request`.
    pub fn fetch_all(&self, request: Request) -> BoxStream<'static, FetcherResult<Page>> {
        let fetcher = Arc::clone(&self.fetcher);

        stream::try_unfold(Some(request), move |next_request| {
            fetch_step(Arc::clone(&fetcher), next_request)
        })
        .boxed()
    }

    /// Fetches every page and decodes all the records, in order.
    pub async fn collect_all<T: DeserializeOwned>(&self, request: Request) -> FetcherResult<Vec<T>> {
        let records = self
            .fetch_all(request)
            .try_fold(vec![], |mut records, page| async move {
                records.extend(page.records_as::<T>()?);
                Ok::<_, FetcherError>(records)
            })
            .await?;
        info!("Collected {} records", records.len());

        Ok(records)
    }
}

async fn fetch_step(
    fetcher: Arc<dyn RestFetcher>,
    request: Option<Request>,
) -> FetcherResult<Option<(Page, Option<Request>)>> {
    let Some(request) = request else {
        return Ok(None);
    };
    let page = Page::try_from(fetcher.fetch(&request).await?)?;
    let next_request = page.next().map(|url| request.follow(url.to_owned()));
    match &next_request {
        Some(next_request) => debug!("Next page at {}", next_request.url()),
        None => debug!("Last page reached at {}", request.url()),
    }

    Ok(Some((page, next_request)))
}
