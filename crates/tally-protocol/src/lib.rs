//! Wire protocol for the Tally ledger API.
//!
//! Defines the endpoint paths, required request/response headers, and the
//! JSON envelopes exchanged between Tally clients and the hosted ledger
//! service. Everything here is a plain value type; the transport and
//! client crates do the actual networking.

pub mod endpoint;
pub mod envelope;
pub mod query;

pub use endpoint::{endpoints, headers};
pub use envelope::{
    AckFeedRequest, ErrorBody, FeedItemsEnvelope, HelloResponse, PageEnvelope,
};
pub use query::QueryParams;
