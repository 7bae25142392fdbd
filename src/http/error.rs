//! Error types for the transport layer.

use thiserror::Error;

/// Errors raised while talking to the peer over HTTP.
///
/// Transport failures are deliberately kept apart from protocol-level
/// problems (see [`ClientError`](crate::ClientError)): every variant here
/// means the request never produced a usable JSON payload, so callers can
/// tell "peer unreachable" from "peer answered something unexpected".
///
/// Note that a non-2xx status with a decodable JSON body is *not* an error
/// at this layer: the peer reports handled failures as JSON fields (e.g.
/// `errorCode`) and those payloads are passed through to the caller.
#[derive(Debug, Error)]
pub enum HttpError {
    /// The request failed before a response arrived: connection refused,
    /// timeout, DNS failure, TLS handshake error.
    #[error("request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// Failure inside the middleware stack, typically after the configured
    /// retry budget (if any) has been exhausted.
    #[error("middleware error: {0}")]
    MiddlewareError(#[from] reqwest_middleware::Error),

    /// The peer returned a non-success status and the body was not JSON,
    /// so there is no payload to fold the failure into.
    #[error("server error {status}: {body}")]
    ServerError {
        status: reqwest::StatusCode,
        /// Raw response body, kept for debugging.
        body: String,
    },

    /// Joining the request path onto the base URL produced an invalid URL.
    #[error("URL parse error: {0}")]
    UrlError(#[from] url::ParseError),

    /// Only GET and POST are used by the peer API.
    #[error("unsupported HTTP method")]
    UnsupportedMethod,

    /// The response claimed success but its body could not be decoded as
    /// JSON.
    #[error("JSON decode error: {0}")]
    JsonError(#[from] serde_json::Error),
}
