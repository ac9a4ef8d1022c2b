//! Unified error type for Gatekeep.

use gatekeep_gateway::GatewayError;
use gatekeep_session::SessionError;
use gatekeep_storage::StorageError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant auto-generates `From` impls,
/// so the `?` operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum GatekeepError {
    /// A storage-level error (i/o, encode, decode).
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// A transport-level error from the gateway.
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// A session-level error (config, invariant, wrapped gateway failure).
    #[error(transparent)]
    Session(#[from] SessionError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_storage_error() {
        let err = StorageError::Unavailable("gone".into());
        let gatekeep_err: GatekeepError = err.into();
        assert!(matches!(gatekeep_err, GatekeepError::Storage(_)));
        assert!(gatekeep_err.to_string().contains("gone"));
    }

    #[test]
    fn test_from_gateway_error() {
        let err = GatewayError::Transport("refused".into());
        let gatekeep_err: GatekeepError = err.into();
        assert!(matches!(gatekeep_err, GatekeepError::Gateway(_)));
    }

    #[test]
    fn test_from_session_error() {
        let err = SessionError::TokenWithoutIdentity;
        let gatekeep_err: GatekeepError = err.into();
        assert!(matches!(gatekeep_err, GatekeepError::Session(_)));
    }
}
