//! Error types for the gateway layer.
//!
//! Only *transport* failures are errors here. A server that answers with
//! `success: false` has still answered; that is an [`ApiResult`](crate::ApiResult),
//! not a [`GatewayError`].

/// Errors that can occur while making a remote authentication call.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// The call could not complete (connection refused, timeout, ...).
    #[error("transport failed: {0}")]
    Transport(String),

    /// The server answered, but the body was not a valid envelope.
    #[error("response decode failed: {0}")]
    Decode(#[source] serde_json::Error),
}
