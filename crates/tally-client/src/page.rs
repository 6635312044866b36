use std::collections::VecDeque;
use std::marker::PhantomData;

use serde::de::DeserializeOwned;

use tally_protocol::envelope::PageEnvelope;
use tally_protocol::query::QueryParams;

use crate::error::{ClientError, ClientResult};
use crate::session::Session;

/// One page of translated items plus the cursor for the next fetch.
/// A value object: iterate it, then let it go.
#[derive(Clone, Debug)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Opaque token encoding the query for the page after this one.
    pub cursor: String,
    pub last_page: bool,
}

/// Lazily fetches successive pages of a list/sum query.
///
/// Each [`Pager::next_page`] issues exactly one fetch with the current
/// query, then replaces the query with the returned cursor, so the
/// sequence is restartable from any page's cursor. Iteration ends after
/// a page that declares itself last, or that comes back empty. The
/// empty-items check is a defensive double-check against a server
/// looping forever on `last_page: false`.
pub struct Pager<T> {
    session: Session,
    endpoint: &'static str,
    query: QueryParams,
    exhausted: bool,
    _marker: PhantomData<fn() -> T>,
}

impl<T: DeserializeOwned> Pager<T> {
    pub(crate) fn new(session: Session, endpoint: &'static str, query: QueryParams) -> Self {
        Self {
            session,
            endpoint,
            query,
            exhausted: false,
            _marker: PhantomData,
        }
    }

    /// Fetch a single page. A supplied cursor replaces every other query
    /// field, since it already encodes the query. A size of zero is
    /// treated as unset.
    pub async fn page(
        mut self,
        size: Option<u64>,
        cursor: Option<String>,
    ) -> ClientResult<Page<T>> {
        if let Some(cursor) = cursor {
            self.query = QueryParams::from_cursor(cursor);
        } else if let Some(size) = size.filter(|s| *s > 0) {
            self.query.page_size = Some(size);
        }
        self.fetch().await
    }

    /// Fetch the next page, or `None` once the sequence is exhausted.
    pub async fn next_page(&mut self) -> ClientResult<Option<Page<T>>> {
        if self.exhausted {
            return Ok(None);
        }
        let page = self.fetch().await?;
        self.query = QueryParams::from_cursor(page.cursor.clone());
        if page.last_page || page.items.is_empty() {
            self.exhausted = true;
        }
        Ok(Some(page))
    }

    /// Flatten the page sequence into individual items. Finite, consumed
    /// once; build a fresh pager to restart.
    pub fn into_items(self) -> Items<T> {
        Items {
            pager: self,
            buffer: VecDeque::new(),
        }
    }

    async fn fetch(&self) -> ClientResult<Page<T>> {
        let body = serde_json::to_value(&self.query).map_err(|source| ClientError::Translate {
            entity: "query",
            source,
        })?;
        let raw = self.session.request(self.endpoint, &body).await?;
        let envelope: PageEnvelope =
            serde_json::from_value(raw).map_err(|source| ClientError::Translate {
                entity: "page",
                source,
            })?;

        let mut items = Vec::with_capacity(envelope.items.len());
        for item in envelope.items {
            items.push(
                serde_json::from_value(item).map_err(|source| ClientError::Translate {
                    entity: self.endpoint,
                    source,
                })?,
            );
        }
        Ok(Page {
            items,
            cursor: envelope.cursor,
            last_page: envelope.last_page,
        })
    }
}

/// Item-by-item view over a [`Pager`], fetching pages as needed.
pub struct Items<T> {
    pager: Pager<T>,
    buffer: VecDeque<T>,
}

impl<T: DeserializeOwned> Items<T> {
    /// The next item, or `None` once the underlying data set is
    /// exhausted. Suspends for a page fetch when the buffer runs dry.
    pub async fn next(&mut self) -> ClientResult<Option<T>> {
        loop {
            if let Some(item) = self.buffer.pop_front() {
                return Ok(Some(item));
            }
            match self.pager.next_page().await? {
                Some(page) => self.buffer.extend(page.items),
                None => return Ok(None),
            }
        }
    }
}
