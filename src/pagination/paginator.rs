//! Paginator and page sequence
//!
//! A [`Paginator`] is bound once to a delegate and a default cursor field.
//! Each call to [`Paginator::paginate`] yields an independent
//! [`PageSequence`] that fetches lazily, one page per advancement.

use super::types::{effective_order, Cursor, FindManyArgs, PaginateArgs, PaginationState};
use crate::delegate::Delegate;
use crate::error::{Error, Result};
use crate::types::{JsonObject, OrderBy, Page, Record};
use futures::future::BoxFuture;
use futures::{FutureExt, Stream, StreamExt};
use serde_json::Value;
use std::fmt;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

// ============================================================================
// Paginator
// ============================================================================

/// Pagination entry point bound to one delegate
#[derive(Clone)]
pub struct Paginator {
    delegate: Arc<dyn Delegate>,
    default_cursor_field: Option<String>,
}

impl Paginator {
    /// Bind a delegate and its default cursor field
    pub fn bind(delegate: Arc<dyn Delegate>, default_cursor_field: Option<String>) -> Self {
        Self {
            delegate,
            default_cursor_field,
        }
    }

    /// Model served by the bound delegate
    pub fn model(&self) -> &str {
        self.delegate.model()
    }

    /// Default cursor field, if the model has one
    pub fn default_cursor_field(&self) -> Option<&str> {
        self.default_cursor_field.as_deref()
    }

    /// Start a new page sequence
    ///
    /// Fails without touching the delegate when no cursor field can be
    /// resolved or the page size is zero.
    pub fn paginate(&self, args: PaginateArgs) -> Result<PageSequence> {
        let PaginateArgs {
            page_size,
            cursor_field,
            order_by,
            pass_through,
        } = args;

        let cursor_field = cursor_field
            .or_else(|| self.default_cursor_field.clone())
            .ok_or_else(|| Error::missing_cursor_field(self.model()))?;

        if page_size == 0 {
            return Err(Error::invalid_argument("pageSize", "must be greater than 0"));
        }

        let order_by = effective_order(&cursor_field, order_by.as_ref());

        tracing::debug!(
            model = self.model(),
            cursor_field = %cursor_field,
            page_size,
            "Starting page sequence"
        );

        Ok(PageSequence {
            delegate: Arc::clone(&self.delegate),
            cursor_field,
            page_size,
            order_by,
            pass_through,
            state: PaginationState::new(),
            in_flight: None,
        })
    }
}

impl fmt::Debug for Paginator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Paginator")
            .field("model", &self.model())
            .field("default_cursor_field", &self.default_cursor_field)
            .finish()
    }
}

// ============================================================================
// Page Sequence
// ============================================================================

type FetchFuture = BoxFuture<'static, Result<Vec<Record>>>;

/// Lazy, single-use sequence of pages
///
/// Ends when a fetch returns no records. A failed fetch leaves the cursor
/// untouched, so advancing again retries the same page.
pub struct PageSequence {
    delegate: Arc<dyn Delegate>,
    cursor_field: String,
    page_size: usize,
    order_by: OrderBy,
    pass_through: JsonObject,
    state: PaginationState,
    in_flight: Option<FetchFuture>,
}

impl PageSequence {
    /// Fetch the next page, or `None` once the sequence is exhausted
    pub async fn next_page(&mut self) -> Result<Option<Page>> {
        self.next().await.transpose()
    }

    /// Drain every remaining page into a single list of records
    pub async fn collect_all(mut self) -> Result<Vec<Record>> {
        let mut records = Vec::new();
        while let Some(page) = self.next_page().await? {
            records.extend(page);
        }
        Ok(records)
    }

    /// Arguments the next advancement will hand to the delegate
    pub fn next_fetch_args(&self) -> FindManyArgs {
        let (cursor, skip) = match &self.state.last_cursor {
            Some(value) => (
                Some(Cursor {
                    field: self.cursor_field.clone(),
                    value: value.clone(),
                }),
                1,
            ),
            None => (None, 0),
        };

        FindManyArgs {
            pass_through: self.pass_through.clone(),
            cursor,
            skip,
            take: self.page_size,
            order_by: self.order_by.clone(),
        }
    }

    /// Model being paginated
    pub fn model(&self) -> &str {
        self.delegate.model()
    }

    /// Resolved cursor field
    pub fn cursor_field(&self) -> &str {
        &self.cursor_field
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Effective ordering sent with every fetch
    pub fn order_by(&self) -> &OrderBy {
        &self.order_by
    }

    /// Cursor value of the last record yielded so far
    pub fn last_cursor(&self) -> Option<&Value> {
        self.state.last_cursor.as_ref()
    }

    pub fn state(&self) -> &PaginationState {
        &self.state
    }

    pub fn is_exhausted(&self) -> bool {
        self.state.done
    }

    fn start_fetch(&self) -> FetchFuture {
        let args = self.next_fetch_args();
        tracing::debug!(
            model = self.model(),
            page = self.state.pages_fetched + 1,
            cursor = ?self.state.last_cursor,
            take = args.take,
            "Fetching page"
        );

        let delegate = Arc::clone(&self.delegate);
        Box::pin(async move { delegate.find_many(args).await })
    }

    fn finish_fetch(&mut self, result: Result<Vec<Record>>) -> Option<Result<Page>> {
        let records = match result {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!(model = self.model(), error = %e, "Page fetch failed");
                return Some(Err(e));
            }
        };

        let Some(last) = records.last() else {
            tracing::debug!(
                model = self.model(),
                pages = self.state.pages_fetched,
                records = self.state.records_fetched,
                "Page sequence exhausted"
            );
            self.state.mark_done();
            return None;
        };

        let Some(cursor) = last.get(&self.cursor_field).cloned() else {
            return Some(Err(Error::invalid_argument(
                "cursorField",
                format!(
                    "records from '{}' have no field '{}'; keep it in `select`",
                    self.model(),
                    self.cursor_field
                ),
            )));
        };

        tracing::trace!(model = self.model(), cursor = %cursor, "Advancing cursor");
        self.state.advance(cursor, records.len());
        Some(Ok(records))
    }
}

impl Stream for PageSequence {
    type Item = Result<Page>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = &mut *self;
        if this.state.done {
            return Poll::Ready(None);
        }

        let mut fetch = match this.in_flight.take() {
            Some(fetch) => fetch,
            None => this.start_fetch(),
        };

        match fetch.poll_unpin(cx) {
            Poll::Pending => {
                this.in_flight = Some(fetch);
                Poll::Pending
            }
            Poll::Ready(result) => Poll::Ready(this.finish_fetch(result)),
        }
    }
}

impl fmt::Debug for PageSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageSequence")
            .field("model", &self.model())
            .field("cursor_field", &self.cursor_field)
            .field("page_size", &self.page_size)
            .field("order_by", &self.order_by)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}
