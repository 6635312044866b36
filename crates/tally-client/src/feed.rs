use std::collections::VecDeque;
use std::ops::ControlFlow;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use tally_protocol::endpoint::endpoints;
use tally_protocol::envelope::{AckFeedRequest, FeedItemsEnvelope};
use tally_protocol::query::QueryParams;

use crate::action::Action;
use crate::error::{ClientError, ClientResult};
use crate::page::Pager;
use crate::session::Session;
use crate::transaction::Transaction;

/// What a feed streams.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedType {
    Action,
    Transaction,
}

/// A feed's server-side record: listing and `get` return this shape.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FeedInfo {
    pub id: String,
    #[serde(rename = "type")]
    pub feed_type: FeedType,
    /// The query filter selecting matching items.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter_params: Option<Vec<Value>>,
    /// The last acknowledged position.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
}

/// Parameters for creating a feed.
#[derive(Clone, Debug, Serialize)]
pub struct NewFeed {
    /// Unique identifier. Auto-generated by the ledger if unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub feed_type: FeedType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter_params: Option<Vec<Value>>,
}

/// When the durable cursor is advanced.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AckPolicy {
    /// Acknowledge after each batch is exhausted, before fetching the
    /// next one.
    #[default]
    Automatic,
    /// The caller acknowledges explicitly via [`Feed::ack`]. Items
    /// consumed but never acknowledged are redelivered on the next
    /// consume (at-least-once).
    Manual,
}

/// An item delivered by a feed, translated per the feed's declared type.
#[derive(Clone, Debug)]
pub enum FeedItem {
    Action(Action),
    Transaction(Transaction),
}

/// A live handle on a named, durable, server-side cursor over a filtered
/// stream of actions or transactions.
///
/// The handle runs on its own transport connection (forked from the base
/// session) so its blocking long-polls never starve other request
/// traffic. It is a `&mut self` consumer: one handle, one execution
/// context. Independent handles for the same feed id may consume
/// concurrently and will observe overlapping batches until one of them
/// acknowledges.
///
/// A crash between delivery and acknowledgment redelivers from the last
/// acknowledged position. Under [`AckPolicy::Automatic`] that means the
/// whole unacknowledged batch, an implementation detail rather than a
/// contract.
pub struct Feed {
    info: FeedInfo,
    /// Last acknowledged position.
    cursor: Option<String>,
    /// Position of the most recently delivered item, not yet
    /// acknowledged.
    next_cursor: Option<String>,
    ack_policy: AckPolicy,
    session: Session,
    buffer: VecDeque<(Value, String)>,
}

impl Feed {
    pub(crate) fn attach(info: FeedInfo, base: &Session, ack_policy: AckPolicy) -> Self {
        Self {
            cursor: info.cursor.clone(),
            next_cursor: None,
            ack_policy,
            session: base.fork(),
            buffer: VecDeque::new(),
            info,
        }
    }

    pub fn id(&self) -> &str {
        &self.info.id
    }

    pub fn feed_type(&self) -> FeedType {
        self.info.feed_type
    }

    /// The last acknowledged position, as known by this handle.
    pub fn cursor(&self) -> Option<&str> {
        self.cursor.as_deref()
    }

    pub fn with_ack_policy(mut self, ack_policy: AckPolicy) -> Self {
        self.ack_policy = ack_policy;
        self
    }

    /// The next item in the stream.
    ///
    /// Suspends until the server has at least one matching item; a feed
    /// has no end, so this never returns a "done" marker. Each delivered
    /// item's position token becomes the pending acknowledgment cursor
    /// before the item is handed to the caller.
    pub async fn next(&mut self) -> ClientResult<FeedItem> {
        loop {
            if let Some((raw, position)) = self.buffer.pop_front() {
                self.next_cursor = Some(position);
                return match self.info.feed_type {
                    FeedType::Action => serde_json::from_value(raw)
                        .map(FeedItem::Action)
                        .map_err(ClientError::translate("action")),
                    FeedType::Transaction => serde_json::from_value(raw)
                        .map(FeedItem::Transaction)
                        .map_err(ClientError::translate("transaction")),
                };
            }

            // Batch exhausted. Under automatic acknowledgment, persist
            // the position before pulling the next batch.
            if self.ack_policy == AckPolicy::Automatic {
                self.ack().await?;
            }
            let raw = self
                .session
                .request(endpoints::STREAM_FEED_ITEMS, &json!({"id": self.info.id}))
                .await?;
            let envelope: FeedItemsEnvelope =
                serde_json::from_value(raw).map_err(ClientError::translate("feed items"))?;
            self.buffer
                .extend(envelope.items.into_iter().zip(envelope.cursors));
        }
    }

    /// Save the feed's position so a future consume resumes past every
    /// item delivered so far. Without it, consumed items are redelivered.
    /// No-op when nothing is pending.
    pub async fn ack(&mut self) -> ClientResult<()> {
        if let Some(next_cursor) = self.next_cursor.clone() {
            let body = AckFeedRequest {
                id: self.info.id.clone(),
                cursor: next_cursor.clone(),
                previous_cursor: self.cursor.clone(),
            };
            let body = serde_json::to_value(&body).map_err(ClientError::translate("ack"))?;
            self.session.request(endpoints::ACK_FEED, &body).await?;
            self.cursor = Some(next_cursor);
            self.next_cursor = None;
        }
        Ok(())
    }

    /// Push-style consumption: hand each item to `handler` until it
    /// breaks. Return `ControlFlow::Break(())` from the handler to stop
    /// consuming.
    pub async fn consume<F>(&mut self, mut handler: F) -> ClientResult<()>
    where
        F: FnMut(FeedItem) -> ControlFlow<()>,
    {
        loop {
            let item = self.next().await?;
            if handler(item).is_break() {
                return Ok(());
            }
        }
    }
}

/// Feed operations on a ledger.
pub struct Feeds<'a> {
    session: &'a Session,
}

impl<'a> Feeds<'a> {
    pub(crate) fn new(session: &'a Session) -> Self {
        Self { session }
    }

    /// Create a feed and return a live handle on it.
    pub async fn create(&self, new: NewFeed) -> ClientResult<Feed> {
        let body = serde_json::to_value(&new).map_err(ClientError::translate("feed"))?;
        let raw = self.session.request(endpoints::CREATE_FEED, &body).await?;
        let info: FeedInfo =
            serde_json::from_value(raw).map_err(ClientError::translate("feed"))?;
        Ok(Feed::attach(info, self.session, AckPolicy::default()))
    }

    /// A live handle on an existing feed.
    pub async fn get(&self, id: &str) -> ClientResult<Feed> {
        if id.is_empty() {
            return Err(ClientError::Config("id cannot be blank".into()));
        }
        let raw = self
            .session
            .request(endpoints::GET_FEED, &json!({"id": id}))
            .await?;
        let info: FeedInfo =
            serde_json::from_value(raw).map_err(ClientError::translate("feed"))?;
        Ok(Feed::attach(info, self.session, AckPolicy::default()))
    }

    /// Delete a feed server-side. Existing handles stop at their next
    /// fetch.
    pub async fn delete(&self, id: &str) -> ClientResult<()> {
        if id.is_empty() {
            return Err(ClientError::Config("id cannot be blank".into()));
        }
        self.session
            .request(endpoints::DELETE_FEED, &json!({"id": id}))
            .await?;
        Ok(())
    }

    /// All feeds defined on the ledger, as plain records; use
    /// [`Feeds::get`] for a consumable handle.
    pub fn list(&self) -> Pager<FeedInfo> {
        Pager::new(
            self.session.clone(),
            endpoints::LIST_FEEDS,
            QueryParams::default(),
        )
    }
}
