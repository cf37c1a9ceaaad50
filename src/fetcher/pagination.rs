//! Backward cursor pagination over a channel's messages.
//!
//! The pager starts just above the newest requested ID and walks towards older
//! messages with the `before` cursor:
//! - every request asks for a full page ([`MESSAGES_PER_REQUEST`])
//! - messages below the oldest bound are dropped before the page is yielded
//! - a short unfiltered page is the last one
//! - otherwise the cursor moves to the oldest message of the unfiltered page
//!
//! Includes a safety check that the cursor strictly decreases, so a server
//! that keeps returning the same full page cannot loop the crawl forever.

use async_trait::async_trait;
use futures_util::stream::{self, Stream};
use std::sync::Arc;
use tracing::debug;

use crate::crawler::CrawlRange;
use crate::fetcher::discord_config::MESSAGES_PER_REQUEST;
use crate::fetcher::{FetcherError, FetcherResult, MessageFetcher, PageSource};
use crate::{Message, MessageId, Page};

#[async_trait]
impl<T: MessageFetcher + ?Sized> MessageFetcher for Arc<T> {
    async fn fetch_messages(
        &self,
        channel_id: u64,
        before: MessageId,
        limit: usize,
    ) -> FetcherResult<Page> {
        (**self).fetch_messages(channel_id, before, limit).await
    }
}

/// Stateful cursor producing filtered pages on demand
pub struct MessagePager<F> {
    fetcher: F,
    channel_id: u64,
    range: CrawlRange,
    cursor: MessageId,
    page_limit: usize,
    pages_fetched: u64,
    finished: bool,
}

impl<F: MessageFetcher> MessagePager<F> {
    /// Create a pager for `range` in `channel_id`.
    ///
    /// The first request asks for messages before `range.newest() + 1`, so the
    /// newest bound itself is included.
    pub fn new(fetcher: F, channel_id: u64, range: &CrawlRange) -> Self {
        Self {
            fetcher,
            channel_id,
            range: *range,
            cursor: range.initial_cursor(),
            page_limit: MESSAGES_PER_REQUEST,
            pages_fetched: 0,
            finished: false,
        }
    }

    /// Override the page size (mainly for tests against small fixtures)
    pub fn with_page_limit(mut self, page_limit: usize) -> Self {
        self.page_limit = page_limit.max(1);
        self
    }

    /// Cursor the next request will use
    pub fn cursor(&self) -> MessageId {
        self.cursor
    }

    /// Requests issued so far
    pub fn pages_fetched(&self) -> u64 {
        self.pages_fetched
    }

    /// Whether the last page has been produced (or an error ended paging)
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Consume the pager as a `Stream` of pages
    pub fn into_stream(self) -> impl Stream<Item = FetcherResult<Page>> {
        stream::try_unfold(self, |mut pager| async move {
            let next = pager.next_page().await?;
            Ok::<_, FetcherError>(next.map(|page| (page, pager)))
        })
    }

    async fn fetch_next(&mut self) -> FetcherResult<Page> {
        let raw = self
            .fetcher
            .fetch_messages(self.channel_id, self.cursor, self.page_limit)
            .await?;
        self.pages_fetched += 1;

        debug!(
            "Received {} messages in page {} (before={})",
            raw.len(),
            self.pages_fetched,
            self.cursor
        );

        let page = filter_page(raw.iter(), &self.range)?;

        // Termination and cursor both follow the unfiltered page.
        if raw.len() < self.page_limit {
            debug!(
                "Short page ({} < {}): pagination complete after {} requests",
                raw.len(),
                self.page_limit,
                self.pages_fetched
            );
            self.finished = true;
        } else {
            let next = raw.last().and_then(Message::id).ok_or_else(|| {
                FetcherError::InvalidResponse("page ends with a message without an id".into())
            })?;
            if next >= self.cursor {
                return Err(FetcherError::InvalidResponse(format!(
                    "cursor did not move backwards: oldest id {next} is not below {}",
                    self.cursor
                )));
            }
            self.cursor = next;
        }

        Ok(page)
    }
}

#[async_trait]
impl<F: MessageFetcher> PageSource for MessagePager<F> {
    async fn next_page(&mut self) -> FetcherResult<Option<Page>> {
        if self.finished {
            return Ok(None);
        }

        match self.fetch_next().await {
            Ok(page) => Ok(Some(page)),
            Err(e) => {
                self.finished = true;
                Err(e)
            }
        }
    }
}

/// Keep the messages `range` accepts, preserving order.
fn filter_page<'a>(
    messages: impl Iterator<Item = &'a Message>,
    range: &CrawlRange,
) -> FetcherResult<Page> {
    let mut kept = Vec::new();
    for message in messages {
        let id = message.id().ok_or_else(|| {
            FetcherError::InvalidResponse(format!(
                "message without a numeric id: {:?}",
                message.raw_id()
            ))
        })?;
        if range.keeps(id) {
            kept.push(message.clone());
        }
    }
    Ok(kept)
}
