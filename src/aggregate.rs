//! Assembles the complete result set for a filter from a paginated provider:
//! one probing request to learn the total, then the remaining pages
//! concurrently in flight, tolerating individual page failures.

use futures::future;

use crate::error::FetchError;
use crate::fetch::PageFetcher;
use crate::types::Resource;

/// The outcome of one aggregation run. Dropped pages are not an error; they
/// are visible here so callers needing completeness can detect and retry.
#[derive(Debug)]
pub struct Aggregation {
    /// Items of all successful pages, in ascending offset order.
    pub items: Vec<Resource>,
    /// The total the provider reported in the probing request.
    pub reported_total: u64,
    /// Number of non-probe pages whose contribution was dropped.
    pub failed_pages: usize,
}

impl Aggregation {
    pub fn is_complete(&self) -> bool {
        self.items.len() as u64 == self.reported_total
    }
}

pub struct PaginatedAggregator<P> {
    fetcher: P,
}

impl<P: PageFetcher> PaginatedAggregator<P> {
    pub fn new(fetcher: P) -> Self {
        PaginatedAggregator { fetcher }
    }

    /// Fetches every page of the collection matching `filters`.
    ///
    /// The probing request at offset 0 is fatal on failure (there is no total
    /// yet, so nothing else can be issued). Every further page failure only
    /// drops that page's items; siblings are never cancelled.
    ///
    /// `page_size` must be greater than zero.
    pub async fn fetch_all(
        &self,
        filters: &P::Filters,
        page_size: u32,
    ) -> Result<Aggregation, FetchError> {
        assert!(page_size > 0, "page_size must be greater than zero");

        let first = self
            .fetcher
            .fetch_page(filters, page_size, 0)
            .await
            .map_err(FetchError::Probe)?;

        let total = first.total;
        if total == 0 {
            return Ok(Aggregation {
                items: Vec::new(),
                reported_total: 0,
                failed_pages: 0,
            });
        }

        let mut items = first.items;
        let remaining = total.div_ceil(page_size as u64).saturating_sub(1);
        if remaining == 0 {
            return Ok(Aggregation {
                items,
                reported_total: total,
                failed_pages: 0,
            });
        }

        let pending = (1..=remaining)
            .map(|i| self.fetcher.fetch_page(filters, page_size, page_size as u64 * i));

        // join_all yields results in request order, so the concatenation is in
        // ascending offset order no matter which page completes first.
        let results = future::join_all(pending).await;

        let mut failed_pages = 0;
        for (i, result) in results.into_iter().enumerate() {
            match result {
                Ok(page) => items.extend(page.items),
                Err(error) => {
                    failed_pages += 1;
                    tracing::warn!(
                        offset = page_size as u64 * (i as u64 + 1),
                        %error,
                        "dropping failed page"
                    );
                }
            }
        }

        tracing::debug!(
            total,
            fetched = items.len(),
            failed_pages,
            "aggregation finished"
        );

        Ok(Aggregation {
            items,
            reported_total: total,
            failed_pages,
        })
    }
}
