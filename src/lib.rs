//! Client library for a ledger peer's HTTP/JSON API.
//!
//! A [`Connection`] talks to a remote peer over six endpoints: read-only
//! queries, account lookup and creation, faucet funding, and state-changing
//! transactions through a two-phase prepare/sign/submit protocol. All
//! operations are `async` and resolve to either a generic JSON payload or a
//! typed error; logical failures the peer encodes into the payload (an
//! `errorCode` field) are passed through as data for the caller to inspect.
//!
//! # Overview
//!
//! - [`Connection`] — peer URL, bound identity, cached sequence number and
//!   every operation, including the [`transact`](Connection::transact)
//!   pipeline.
//! - [`Signer`] — the injected signing capability; an implementation for
//!   `ed25519_dalek::SigningKey` ships with the crate.
//! - [`http`] — the underlying transport: one shared `reqwest` client,
//!   JSON bodies in, `serde_json::Value` payloads out.
//! - [`ClientError`] / [`http::HttpError`] — the error taxonomy, keeping
//!   precondition, transport and protocol failures distinct.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use ledger_client::{Address, Connection};
//!
//! # async fn example() -> Result<(), ledger_client::ClientError> {
//! let key = Arc::new(ed25519_dalek::SigningKey::from_bytes(&[1u8; 32]));
//! let mut conn = Connection::connect_as(
//!     "http://localhost:3000",
//!     Address::new(12),
//!     key,
//! )?;
//!
//! let result = conn.query("(+ 1 2)").await?;
//! assert_eq!(result["value"], 3);
//!
//! let sequence = conn.get_sequence().await?;
//! println!("account sequence: {sequence}");
//! # Ok(())
//! # }
//! ```

pub mod connection;
pub mod error;
pub mod http;
pub mod keys;
pub mod types;

pub use crate::connection::{Connection, KeyPair};
pub use crate::error::ClientError;
pub use crate::keys::Signer;
pub use crate::types::{AccountKey, Address, Hash, Signature};
