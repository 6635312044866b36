//! Client SDK for the Tally hosted ledger.
//!
//! [`Client`] is the entry point: it binds a credential and a ledger name
//! to a [`Session`] and exposes one module per ledger resource. One-shot
//! calls go straight through the session; listings return a cursor-driven
//! [`Pager`]; feeds expose an at-least-once consume/acknowledge protocol
//! on a dedicated connection.
//!
//! ```no_run
//! # async fn demo() -> tally_client::ClientResult<()> {
//! use tally_client::{Client, ClientConfig, NewAccount};
//!
//! let ledger = Client::new(ClientConfig::new("main", "secret"))?;
//! let account = ledger
//!     .accounts()
//!     .create(NewAccount {
//!         key_ids: vec!["signer".into()],
//!         ..NewAccount::default()
//!     })
//!     .await?;
//! println!("created {}", account.id);
//! # Ok(())
//! # }
//! ```

pub mod account;
pub mod action;
pub mod client;
pub mod config;
pub mod dev;
pub mod error;
pub mod feed;
pub mod flavor;
pub mod index;
pub mod key;
pub mod page;
pub mod session;
pub mod stats;
pub mod token;
pub mod transaction;

#[cfg(test)]
mod testutil;

pub use account::{Account, Accounts, NewAccount};
pub use action::{Action, ActionSnapshot, Actions};
pub use client::Client;
pub use config::ClientConfig;
pub use dev::DevUtils;
pub use error::{ClientError, ClientResult};
pub use feed::{AckPolicy, Feed, FeedInfo, FeedItem, FeedType, Feeds, NewFeed};
pub use flavor::{Flavor, Flavors, NewFlavor};
pub use index::{Index, IndexType, Indexes, NewIndex};
pub use key::{Key, Keys, NewKey};
pub use page::{Items, Page, Pager};
pub use session::Session;
pub use stats::{Stats, StatsModule};
pub use token::{TokenGroup, TokenSum, Tokens};
pub use transaction::{
    IssueAction, RetireAction, Transaction, TransactionBuilder, Transactions, TransferAction,
};

// Re-export the transport error surface: callers match on these.
pub use tally_transport::{ApiError, TransportError};

/// User-specified key-value data attached to ledger objects.
pub type Tags = serde_json::Map<String, serde_json::Value>;
