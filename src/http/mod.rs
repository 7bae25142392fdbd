//! HTTP transport for the peer's JSON API.
//!
//! This module carries the request/response plumbing used by
//! [`Connection`](crate::Connection): a thin asynchronous client that joins
//! paths onto a base URL, attaches JSON request bodies, and decodes response
//! bodies into generic `serde_json::Value` payloads.
//!
//! # Behaviour
//!
//! - One outbound request per call; retries are opt-in via
//!   [`Connection::connect_with_config`](crate::Connection::connect_with_config)
//!   and never applied silently.
//! - Non-2xx responses carrying a JSON body resolve as ordinary payloads:
//!   the peer encodes handled failures as JSON fields (`errorCode`) rather
//!   than bare HTTP errors.
//! - All instances share one process-wide `reqwest::Client`; see
//!   [`shutdown_transport`] for the explicit teardown hook.

mod error;
mod http_client;
mod pool;

pub use error::HttpError;
pub(crate) use http_client::HttpClient;
pub use pool::shutdown as shutdown_transport;
