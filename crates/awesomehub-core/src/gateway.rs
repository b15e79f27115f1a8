// Search gateway - one paginated query, failures folded into the result
use awesomehub_api::MAX_PER_PAGE;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::classify::classify;
use crate::error::UpstreamError;
use crate::models::{SearchResult, SortKey, SortOrder};
use crate::search::{SearchProvider, SearchRequest};

/// Upstream only addresses the first 1000 results of any query
pub const RESULT_CEILING: u64 = 1000;

/// A search result plus the classified failure, if there was one
///
/// On failure `result` is a well-formed empty page, never garbage.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome {
    pub result: SearchResult,
    pub error: Option<UpstreamError>,
    /// True when answered without calling upstream
    pub short_circuited: bool,
}

impl SearchOutcome {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Clone)]
pub struct SearchGateway {
    provider: Arc<dyn SearchProvider>,
}

impl SearchGateway {
    pub fn new(provider: Arc<dyn SearchProvider>) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &Arc<dyn SearchProvider> {
        &self.provider
    }

    pub fn is_authenticated(&self) -> bool {
        self.provider.has_credential()
    }

    /// Run one page of `query`
    ///
    /// `per_page` is clamped to what upstream accepts before any offset math.
    /// Pages whose starting offset reaches the ceiling return empty with
    /// `has_more == false` and never touch upstream.
    pub async fn search(
        &self,
        query: &str,
        sort: SortKey,
        order: SortOrder,
        page: u32,
        per_page: u32,
    ) -> SearchOutcome {
        let page = page.max(1);
        let per_page = per_page.clamp(1, MAX_PER_PAGE);
        let offset = u64::from(page - 1) * u64::from(per_page);

        if offset >= RESULT_CEILING {
            debug!(
                "Page {} (offset {}) is past the result ceiling, skipping upstream",
                page, offset
            );
            return SearchOutcome {
                result: SearchResult {
                    total_count: RESULT_CEILING,
                    ..SearchResult::empty(page)
                },
                error: None,
                short_circuited: true,
            };
        }

        let request = SearchRequest {
            query: query.to_string(),
            sort,
            order,
            page,
            per_page,
        };

        match self.provider.search(&request).await {
            Ok(upstream) => {
                let total_count = upstream.total_count.min(RESULT_CEILING);
                let mut items = upstream.items;
                items.truncate(per_page as usize);
                let has_more = offset + (items.len() as u64) < total_count
                    && items.len() == per_page as usize;

                debug!(
                    "Search {:?} page {} returned {} of {} results",
                    query,
                    page,
                    items.len(),
                    total_count
                );

                SearchOutcome {
                    result: SearchResult {
                        items,
                        total_count,
                        page,
                        has_more,
                        rate: upstream.rate,
                    },
                    error: None,
                    short_circuited: false,
                }
            }
            Err(failure) => {
                let error = classify(&failure, self.is_authenticated());
                warn!("Search {:?} page {} failed: {} ({})", query, page, error, failure);

                SearchOutcome {
                    result: SearchResult {
                        rate: failure.rate,
                        ..SearchResult::empty(page)
                    },
                    error: Some(error),
                    short_circuited: false,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::UpstreamFailure;
    use crate::search::{MockSearchProvider, UpstreamPage};
    use crate::test_support::repo;

    fn gateway(mock: MockSearchProvider) -> SearchGateway {
        SearchGateway::new(Arc::new(mock))
    }

    #[tokio::test]
    async fn test_page_past_ceiling_skips_upstream() {
        let mut mock = MockSearchProvider::new();
        mock.expect_search().times(0);
        mock.expect_has_credential().return_const(false);

        let outcome = gateway(mock)
            .search("awesome", SortKey::Stars, SortOrder::Desc, 21, 50)
            .await;

        assert!(outcome.short_circuited);
        assert!(outcome.is_ok());
        assert!(outcome.result.items.is_empty());
        assert!(!outcome.result.has_more);
        assert_eq!(outcome.result.total_count, RESULT_CEILING);
        assert_eq!(outcome.result.page, 21);
    }

    #[tokio::test]
    async fn test_last_addressable_page_still_calls_upstream() {
        let mut mock = MockSearchProvider::new();
        mock.expect_search()
            .withf(|req| req.page == 20 && req.per_page == 50)
            .times(1)
            .returning(|_| {
                Ok(UpstreamPage {
                    items: (0..50).map(|i| repo(i, i as u32)).collect(),
                    total_count: 250_000,
                    rate: Default::default(),
                })
            });
        mock.expect_has_credential().return_const(false);

        let outcome = gateway(mock)
            .search("awesome", SortKey::Stars, SortOrder::Desc, 20, 50)
            .await;

        assert!(!outcome.short_circuited);
        assert_eq!(outcome.result.items.len(), 50);
        assert_eq!(outcome.result.total_count, RESULT_CEILING);
        // Offset 950 + 50 items reaches the ceiling
        assert!(!outcome.result.has_more);
    }

    #[tokio::test]
    async fn test_success_reports_rate_and_has_more() {
        let mut mock = MockSearchProvider::new();
        mock.expect_search().times(1).returning(|req| {
            assert_eq!(req.query, "rust in:name OR rust in:description");
            assert_eq!(req.sort, SortKey::Forks);
            assert_eq!(req.order, SortOrder::Asc);
            Ok(UpstreamPage {
                items: vec![repo(1, 10), repo(2, 5)],
                total_count: 30,
                rate: awesomehub_api::RateTelemetry {
                    remaining: Some(9),
                    reset: None,
                },
            })
        });

        let outcome = gateway(mock)
            .search(
                "rust in:name OR rust in:description",
                SortKey::Forks,
                SortOrder::Asc,
                1,
                2,
            )
            .await;

        assert!(outcome.is_ok());
        assert_eq!(outcome.result.items.len(), 2);
        assert_eq!(outcome.result.total_count, 30);
        assert!(outcome.result.has_more);
        assert_eq!(outcome.result.rate.remaining, Some(9));
        // Upstream order is preserved
        assert_eq!(outcome.result.items[0].id, 1);
    }

    #[tokio::test]
    async fn test_failure_becomes_classified_empty_result() {
        let mut mock = MockSearchProvider::new();
        mock.expect_search().times(1).returning(|_| {
            Err(UpstreamFailure::new(Some(403), "API rate limit exceeded"))
        });
        mock.expect_has_credential().return_const(true);

        let outcome = gateway(mock)
            .search("awesome", SortKey::Stars, SortOrder::Desc, 1, 50)
            .await;

        assert!(outcome.result.items.is_empty());
        assert_eq!(outcome.result.total_count, 0);
        assert!(!outcome.result.has_more);
        assert_eq!(
            outcome.error,
            Some(UpstreamError::RateLimited {
                authenticated: true
            })
        );
    }

    #[tokio::test]
    async fn test_oversized_page_uses_upstream_page_size() {
        let mut mock = MockSearchProvider::new();
        mock.expect_search()
            .withf(|req| req.page == 2 && req.per_page == MAX_PER_PAGE)
            .times(1)
            .returning(|_| {
                Ok(UpstreamPage {
                    items: (100..200).map(|i| repo(i, 1)).collect(),
                    total_count: 5000,
                    rate: Default::default(),
                })
            });
        mock.expect_has_credential().return_const(false);

        let outcome = gateway(mock)
            .search("awesome", SortKey::Stars, SortOrder::Desc, 2, 200)
            .await;

        // Offset 100 + 100 items, well under the ceiling
        assert_eq!(outcome.result.items.len(), 100);
        assert!(outcome.result.has_more);
    }

    #[tokio::test]
    async fn test_ceiling_follows_clamped_page_size() {
        // Page 6 at 100 per page starts at offset 500, not 1000
        let mut mock = MockSearchProvider::new();
        mock.expect_search()
            .withf(|req| req.page == 6 && req.per_page == MAX_PER_PAGE)
            .times(1)
            .returning(|_| Ok(UpstreamPage::default()));

        let outcome = gateway(mock)
            .search("awesome", SortKey::Stars, SortOrder::Desc, 6, 200)
            .await;
        assert!(!outcome.short_circuited);

        // Page 11 at 100 per page is offset 1000
        let mut mock = MockSearchProvider::new();
        mock.expect_search().times(0);

        let outcome = gateway(mock)
            .search("awesome", SortKey::Stars, SortOrder::Desc, 11, 200)
            .await;
        assert!(outcome.short_circuited);
    }

    #[tokio::test]
    async fn test_page_zero_is_treated_as_first_page() {
        let mut mock = MockSearchProvider::new();
        mock.expect_search()
            .withf(|req| req.page == 1)
            .times(1)
            .returning(|_| Ok(UpstreamPage::default()));

        let outcome = gateway(mock)
            .search("awesome", SortKey::Stars, SortOrder::Desc, 0, 50)
            .await;
        assert_eq!(outcome.result.page, 1);
    }
}
