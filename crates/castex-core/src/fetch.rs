//! Cursor pagination over the feed API.
//!
//! [`FeedFetcher`] walks every page a [`FeedSource`] offers for one subject
//! and gathers the records in arrival order. A page that fails (after any
//! configured retries) ends the walk: the records gathered so far are kept
//! and the outcome is marked truncated instead of failing the export.

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info, instrument, warn};

use crate::Result;
use crate::record::FeedRecord;
use crate::types::{Cursor, Fid};

/// Largest page the feed API serves.
pub const MAX_PAGE_SIZE: u32 = 150;

/// Parameters for a single page request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub fid: Fid,
    /// Page size, `1..=MAX_PAGE_SIZE`.
    pub limit: u32,
    pub include_replies: bool,
    /// `None` for the first page.
    pub cursor: Option<Cursor>,
}

/// One page of records.
#[derive(Debug, Clone, Default)]
pub struct FeedPage {
    pub records: Vec<FeedRecord>,

    /// Cursor for the next page; `None` once the feed is exhausted.
    pub next_cursor: Option<Cursor>,
}

/// A paginated source of feed records.
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Fetch one page.
    async fn fetch_page(&self, request: &PageRequest) -> Result<FeedPage>;
}

/// Pagination tuning.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Requested page size; clamped to `1..=MAX_PAGE_SIZE`.
    pub page_size: u32,
    /// Extra attempts per page for retryable failures. 0 disables retries.
    pub page_retries: u32,
    /// Delay before the first retry, doubled for each further attempt.
    pub retry_backoff: Duration,
    /// Stop after this many pages even if upstream has more.
    pub max_pages: Option<usize>,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            page_size: MAX_PAGE_SIZE,
            page_retries: 0,
            retry_backoff: Duration::from_millis(500),
            max_pages: None,
        }
    }
}

impl FetchOptions {
    fn limit(&self) -> u32 {
        self.page_size.clamp(1, MAX_PAGE_SIZE)
    }
}

/// Why pagination ended before the feed was exhausted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Truncation {
    /// 1-based number of the page that was not fetched.
    pub page: usize,
    pub reason: String,
}

/// Everything one pagination walk produced.
#[derive(Debug, Clone, Default)]
pub struct FetchOutcome {
    /// Records in page order, then in-page order.
    pub records: Vec<FeedRecord>,
    /// Pages successfully fetched.
    pub pages: usize,
    pub truncation: Option<Truncation>,
}

impl FetchOutcome {
    /// True if the walk ended because upstream had no more pages.
    pub fn is_complete(&self) -> bool {
        self.truncation.is_none()
    }
}

/// Walks a [`FeedSource`] to exhaustion. Holds no state between calls.
#[derive(Debug, Clone)]
pub struct FeedFetcher<S> {
    source: S,
    options: FetchOptions,
}

impl<S: FeedSource> FeedFetcher<S> {
    pub fn new(source: S) -> Self {
        Self::with_options(source, FetchOptions::default())
    }

    pub fn with_options(source: S, options: FetchOptions) -> Self {
        Self { source, options }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn options(&self) -> &FetchOptions {
        &self.options
    }

    /// Fetch every record for `fid`.
    ///
    /// Never fails: a page error ends pagination and is reported through
    /// [`FetchOutcome::truncation`].
    #[instrument(skip(self), fields(%fid))]
    pub async fn fetch_all(&self, fid: Fid, include_replies: bool) -> FetchOutcome {
        info!("Fetching casts");

        let mut outcome = FetchOutcome::default();
        let mut seen = HashSet::new();
        let mut cursor: Option<Cursor> = None;

        loop {
            let page_no = outcome.pages + 1;

            if let Some(max) = self.options.max_pages
                && outcome.pages >= max.max(1)
            {
                warn!(max_pages = max, "Page limit reached with more pages upstream");
                outcome.truncation = Some(Truncation {
                    page: page_no,
                    reason: format!("page limit of {} reached", max),
                });
                break;
            }

            let request = PageRequest {
                fid,
                limit: self.options.limit(),
                include_replies,
                cursor: cursor.clone(),
            };

            let page = match self.fetch_page(&request, page_no).await {
                Ok(page) => page,
                Err(e) => {
                    warn!(page = page_no, error = %e, fetched = outcome.records.len(), "Page failed, export truncated");
                    outcome.truncation = Some(Truncation {
                        page: page_no,
                        reason: e.to_string(),
                    });
                    break;
                }
            };

            outcome.pages = page_no;
            let received = page.records.len();

            for record in page.records {
                if seen.insert(record.hash().to_string()) {
                    outcome.records.push(record);
                } else {
                    warn!(hash = record.hash(), page = page_no, "Dropping duplicate cast");
                }
            }

            debug!(
                page = page_no,
                received,
                total = outcome.records.len(),
                "Fetched page"
            );

            match page.next_cursor {
                None => break,
                Some(next) if cursor.as_ref() == Some(&next) => {
                    warn!(cursor = %next, "Upstream repeated its cursor, stopping");
                    outcome.truncation = Some(Truncation {
                        page: page_no + 1,
                        reason: "upstream repeated the previous cursor".to_string(),
                    });
                    break;
                }
                Some(next) => cursor = Some(next),
            }
        }

        info!(
            total = outcome.records.len(),
            pages = outcome.pages,
            complete = outcome.is_complete(),
            "Finished fetching casts"
        );

        outcome
    }

    async fn fetch_page(&self, request: &PageRequest, page_no: usize) -> Result<FeedPage> {
        let mut attempt = 0;
        loop {
            match self.source.fetch_page(request).await {
                Ok(page) => return Ok(page),
                Err(e) if e.is_retryable() && attempt < self.options.page_retries => {
                    let delay = self
                        .options
                        .retry_backoff
                        .saturating_mul(2u32.saturating_pow(attempt));
                    attempt += 1;
                    warn!(page = page_no, attempt, error = %e, ?delay, "Retrying page");
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
