//! Lazy pagination over select results
//!
//! A [`PassObjectIter`] owns a copy of its selector and advances `offset` by
//! `limit` each time a page runs out. A page shorter than `limit` (an empty
//! page included) is the last one, so walking `n` records costs
//! `n / limit + 1` requests.

use crate::client::PassClient;
use crate::codec::UNKNOWN_TOTAL;
use crate::error::Result;
use crate::model::Entity;
use crate::selector::PassClientSelector;
use futures::stream::{self, Stream};
use tracing::debug;

/// Forward-only cursor over every record matching a selector
///
/// Not restartable. Drive it from one task at a time; it is `Send` but its
/// cursor state is not meant to be shared.
#[derive(Debug)]
pub struct PassObjectIter<E: Entity> {
    client: PassClient,
    selector: PassClientSelector<E>,
    page: std::vec::IntoIter<E>,
    pages_fetched: usize,
    estimated_total: i64,
    finished: bool,
}

impl<E: Entity> PassObjectIter<E> {
    pub(crate) fn new(client: PassClient, selector: PassClientSelector<E>) -> Self {
        Self {
            client,
            selector,
            page: Vec::new().into_iter(),
            pages_fetched: 0,
            estimated_total: UNKNOWN_TOTAL,
            finished: false,
        }
    }

    /// Next record, fetching another page when the current one is used up
    ///
    /// A failed page fetch is yielded once; the iterator ends after it.
    pub async fn next(&mut self) -> Option<Result<E>> {
        loop {
            if let Some(entity) = self.page.next() {
                return Some(Ok(entity));
            }
            if self.finished {
                return None;
            }

            if self.pages_fetched > 0 {
                let offset = self
                    .selector
                    .offset_value()
                    .saturating_add(self.selector.limit_value());
                self.selector.set_offset(offset);
            }

            match self.client.select_objects(&self.selector).await {
                Ok(result) => {
                    self.pages_fetched += 1;
                    self.estimated_total = result.total;

                    let count = result.objects.len() as u64;
                    if count < self.selector.limit_value() {
                        self.finished = true;
                    }
                    debug!(
                        entity_type = %E::TYPE,
                        offset = self.selector.offset_value(),
                        count,
                        finished = self.finished,
                        "Fetched page"
                    );

                    self.page = result.objects.into_iter();
                }
                Err(e) => {
                    self.finished = true;
                    return Some(Err(e));
                }
            }
        }
    }

    /// `total` reported by the last fetched page, `-1` before the first fetch
    ///
    /// Only an estimate: the count can change between pages.
    pub fn estimated_total(&self) -> i64 {
        self.estimated_total
    }

    pub fn pages_fetched(&self) -> usize {
        self.pages_fetched
    }

    /// Drain the remaining records, stopping at the first error
    pub async fn collect_all(mut self) -> Result<Vec<E>> {
        let mut objects = Vec::new();
        while let Some(entity) = self.next().await {
            objects.push(entity?);
        }
        Ok(objects)
    }

    /// Adapt into a [`Stream`]
    pub fn into_stream(self) -> impl Stream<Item = Result<E>> {
        stream::unfold(self, |mut iter| async move {
            let item = iter.next().await?;
            Some((item, iter))
        })
    }
}
