//! Error types for the session layer.

use gatekeep_gateway::GatewayError;
use gatekeep_storage::StorageError;

/// Errors that can occur during session management.
///
/// Only failures the caller has to handle show up here. A server that
/// rejects a login (`success: false`) is NOT an error: the envelope is
/// handed back as-is. Likewise a logout answered with an unaccepted code
/// is reported through
/// [`LogoutOutcome::Retained`](crate::LogoutOutcome::Retained).
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The remote call could not complete. Never retried here.
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// A storage operation failed where the caller asked for the result
    /// directly (inside login/logout these are logged instead).
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// A setter would leave an access token in place without an identity.
    #[error("an access token cannot be held without a user identity")]
    TokenWithoutIdentity,

    /// The session configuration is unusable.
    #[error("invalid session config: {0}")]
    InvalidConfig(String),
}
