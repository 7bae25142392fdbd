//! Client-level error taxonomy.

use thiserror::Error;

use crate::http::HttpError;

/// Failure modes of connection operations.
///
/// The taxonomy keeps three kinds of failure apart so callers can react
/// appropriately:
///
/// - **Preconditions** ([`NoAddress`](ClientError::NoAddress),
///   [`NoKeyPair`](ClientError::NoKeyPair)): the connection is missing state
///   the operation needs. Raised before any network call is made.
/// - **Transport** ([`Transport`](ClientError::Transport)): the peer could
///   not be reached or did not produce a decodable JSON body.
/// - **Protocol** ([`Protocol`](ClientError::Protocol)): the peer answered,
///   but an expected field was missing or malformed — "server responded
///   unexpectedly" as opposed to "server unreachable".
///
/// Logical failures the peer reports inside an otherwise well-formed payload
/// (an `errorCode` field) are not errors at this level: they come back as
/// `Ok` payloads for the caller to inspect.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The operation needs an account address bound to the connection.
    #[error("no address bound to this connection")]
    NoAddress,

    /// The operation needs a key pair bound to the connection.
    #[error("no key pair bound to this connection")]
    NoKeyPair,

    /// The request could not be completed at the transport level.
    #[error(transparent)]
    Transport(#[from] HttpError),

    /// The peer's response lacked a required field or carried it in a form
    /// that could not be decoded.
    #[error("peer response field `{field}` missing or malformed: {detail}")]
    Protocol { field: &'static str, detail: String },
}

impl ClientError {
    pub(crate) fn protocol(field: &'static str, detail: impl Into<String>) -> Self {
        Self::Protocol {
            field,
            detail: detail.into(),
        }
    }
}
