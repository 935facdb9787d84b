use std::collections::HashMap;
use std::error::Error as StdError;
use std::future::Future;
use std::num::NonZeroU32;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::client::DeltaPage;
use crate::record::DeltaMapping;

/// Paginated source of change records keyed by an opaque cursor.
pub trait ChangeFeed {
    /// Fetches the page following `cursor`, or the first page when `None`.
    fn fetch_page(
        &self,
        cursor: Option<&str>,
    ) -> impl Future<Output = Result<DeltaPage, FeedError>> + Send;
}

/// Transport or provider failure raised by a [`ChangeFeed`].
#[derive(Debug, Error)]
#[error("{source}")]
pub struct FeedError {
    auth: bool,
    #[source]
    source: Box<dyn StdError + Send + Sync>,
}

impl FeedError {
    pub fn new(source: impl Into<Box<dyn StdError + Send + Sync>>) -> Self {
        Self {
            auth: false,
            source: source.into(),
        }
    }

    /// A failure caused by a missing, expired or rejected credential.
    pub fn auth(source: impl Into<Box<dyn StdError + Send + Sync>>) -> Self {
        Self {
            auth: true,
            source: source.into(),
        }
    }

    pub fn is_auth(&self) -> bool {
        self.auth
    }
}

#[derive(Debug, Error)]
pub enum AggregationError {
    #[error("change feed failed on page {page}: {source}")]
    Feed {
        page: u32,
        #[source]
        source: FeedError,
    },
}

impl AggregationError {
    pub fn is_auth(&self) -> bool {
        match self {
            AggregationError::Feed { source, .. } => source.is_auth(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregateOptions {
    /// Follow `has_more` until the feed is drained. When false only the first
    /// page is fetched regardless of what the feed reports.
    pub full_sync: bool,
    /// Upper bound on fetched pages; `None` means unbounded.
    pub max_pages: Option<NonZeroU32>,
}

impl Default for AggregateOptions {
    fn default() -> Self {
        Self {
            full_sync: true,
            max_pages: None,
        }
    }
}

#[derive(Debug, Default)]
struct DeltaState {
    cursor: Option<String>,
    has_more: bool,
    mapping: DeltaMapping,
}

#[derive(Debug)]
pub struct DeltaOutcome {
    pub mapping: DeltaMapping,
    /// Cursor returned with the last fetched page; resume point for the caller.
    pub cursor: Option<String>,
    pub pages: u32,
    /// True when the loop stopped while the feed still reported more pages.
    pub truncated: bool,
}

pub struct DeltaAggregator<F> {
    feed: F,
    options: AggregateOptions,
}

impl<F: ChangeFeed> DeltaAggregator<F> {
    pub fn new(feed: F, options: AggregateOptions) -> Self {
        Self { feed, options }
    }

    pub fn feed(&self) -> &F {
        &self.feed
    }

    /// Folds every page of the feed into one mapping, later pages winning.
    ///
    /// The first page is always requested, starting at `initial_cursor`. Any
    /// feed failure discards everything collected by this call.
    pub async fn aggregate(
        &self,
        initial_cursor: Option<String>,
    ) -> Result<DeltaOutcome, AggregationError> {
        let mut state = DeltaState {
            cursor: initial_cursor,
            has_more: false,
            mapping: HashMap::new(),
        };
        let mut pages = 0u32;

        loop {
            let page = self
                .feed
                .fetch_page(state.cursor.as_deref())
                .await
                .map_err(|source| AggregationError::Feed {
                    page: pages + 1,
                    source,
                })?;
            pages += 1;

            if page.reset {
                debug!(page = pages, dropped = state.mapping.len(), "feed requested reset");
                state.mapping.clear();
            }
            let entries = page.entries.len();
            for (path, record) in page.entries {
                state.mapping.insert(path, record);
            }
            state.cursor = Some(page.cursor);
            state.has_more = page.has_more;
            debug!(page = pages, entries, has_more = state.has_more, "delta page applied");

            if !state.has_more {
                break;
            }
            if !self.options.full_sync {
                debug!(pages, "first-page-only mode; leaving the feed undrained");
                break;
            }
            if let Some(max) = self.options.max_pages
                && pages >= max.get()
            {
                warn!(pages, "page limit reached before the feed was drained");
                break;
            }
        }

        Ok(finish(state, pages))
    }
}

// `has_more` still set here means the loop stopped early on purpose.
fn finish(state: DeltaState, pages: u32) -> DeltaOutcome {
    let truncated = state.has_more;
    let deleted = state.mapping.values().filter(|v| v.is_none()).count();
    info!(
        pages,
        paths = state.mapping.len(),
        deleted,
        truncated,
        "delta aggregation finished"
    );
    DeltaOutcome {
        mapping: state.mapping,
        cursor: state.cursor,
        pages,
        truncated,
    }
}
