//! Session configuration: persistence keys and logout policy.

use std::collections::HashSet;

use gatekeep_gateway::code;
use serde::{Deserialize, Serialize};

use crate::SessionError;

// ---------------------------------------------------------------------------
// StorageKeys
// ---------------------------------------------------------------------------

/// Literal keys under which session data is persisted.
///
/// These strings are part of the on-disk format: a session saved by one
/// version of the host must still be found by the next. Change them only
/// together with a migration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageKeys {
    /// Durable: the remember-me record.
    pub login_user: String,

    /// Ephemeral: the user identity.
    pub user_info: String,

    /// Ephemeral: the access token.
    pub access_token: String,

    /// Ephemeral: whether the current login is tenant-scoped.
    pub tenant_login: String,

    /// Ephemeral: the tenant key later requests are scoped by.
    pub tenant_key: String,
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self {
            login_user: "login_user".into(),
            user_info: "user-info".into(),
            access_token: "authorized-token".into(),
            tenant_login: "is-tenant-login".into(),
            tenant_key: "tenant-key".into(),
        }
    }
}

impl StorageKeys {
    fn all(&self) -> [&str; 5] {
        [
            self.login_user.as_str(),
            self.user_info.as_str(),
            self.access_token.as_str(),
            self.tenant_login.as_str(),
            self.tenant_key.as_str(),
        ]
    }
}

// ---------------------------------------------------------------------------
// SessionConfig
// ---------------------------------------------------------------------------

/// Configuration for a [`SessionStore`](crate::SessionStore).
///
/// Every field has a default, so a host can deserialize a partial JSON
/// document and only override what it needs:
///
/// ```rust
/// use gatekeep_session::SessionConfig;
///
/// let config = SessionConfig::from_json(r#"{ "login_path": "/sign-in" }"#).unwrap();
/// assert_eq!(config.login_path, "/sign-in");
/// assert_eq!(config.accepted_logout_codes, vec![200, 401]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Persistence keys.
    pub keys: StorageKeys,

    /// Logout status codes that let client-side teardown proceed.
    ///
    /// Default: `[200, 401]` ("ok" and "already unauthenticated").
    pub accepted_logout_codes: Vec<i32>,

    /// Where the teardown sends the user once the session is gone.
    ///
    /// Default: `/login`.
    pub login_path: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            keys: StorageKeys::default(),
            accepted_logout_codes: vec![code::OK, code::UNAUTHORIZED],
            login_path: "/login".into(),
        }
    }
}

impl SessionConfig {
    /// Parses a JSON document layered over the defaults, then validates it.
    ///
    /// # Errors
    /// Returns [`SessionError::InvalidConfig`] if the JSON is malformed or
    /// [`validate`](Self::validate) rejects the result.
    pub fn from_json(json: &str) -> Result<Self, SessionError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| SessionError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that the config can drive a session.
    ///
    /// # Errors
    /// Returns [`SessionError::InvalidConfig`] when:
    /// - no logout code is accepted (teardown could never run)
    /// - the login path is empty
    /// - a storage key is empty or two keys collide
    pub fn validate(&self) -> Result<(), SessionError> {
        if self.accepted_logout_codes.is_empty() {
            return Err(SessionError::InvalidConfig(
                "accepted_logout_codes must not be empty".into(),
            ));
        }
        if self.login_path.trim().is_empty() {
            return Err(SessionError::InvalidConfig(
                "login_path must not be empty".into(),
            ));
        }

        let mut seen = HashSet::new();
        for key in self.keys.all() {
            if key.is_empty() {
                return Err(SessionError::InvalidConfig(
                    "storage keys must not be empty".into(),
                ));
            }
            if !seen.insert(key) {
                return Err(SessionError::InvalidConfig(format!(
                    "storage key {key:?} is used twice"
                )));
            }
        }
        Ok(())
    }

    /// Returns `true` if a logout answered with `code` may tear down.
    pub fn accepts_logout_code(&self, code: i32) -> bool {
        self.accepted_logout_codes.contains(&code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = SessionConfig::default();

        assert!(config.validate().is_ok());
        assert_eq!(config.login_path, "/login");
        assert_eq!(config.keys.login_user, "login_user");
        assert_eq!(config.keys.access_token, "authorized-token");
    }

    #[test]
    fn test_accepts_logout_code_only_ok_and_unauthorized() {
        let config = SessionConfig::default();

        assert!(config.accepts_logout_code(200));
        assert!(config.accepts_logout_code(401));
        assert!(!config.accepts_logout_code(500));
        assert!(!config.accepts_logout_code(403));
    }

    #[test]
    fn test_from_json_partial_keys_keep_other_defaults() {
        let config =
            SessionConfig::from_json(r#"{ "keys": { "tenant_key": "tenant-id" } }"#).unwrap();

        assert_eq!(config.keys.tenant_key, "tenant-id");
        assert_eq!(config.keys.user_info, "user-info");
    }

    #[test]
    fn test_from_json_malformed_returns_invalid_config() {
        let result = SessionConfig::from_json("{ not json");

        assert!(matches!(result, Err(SessionError::InvalidConfig(_))));
    }

    #[test]
    fn test_validate_empty_accepted_codes_rejected() {
        let config = SessionConfig {
            accepted_logout_codes: Vec::new(),
            ..SessionConfig::default()
        };

        assert!(matches!(config.validate(), Err(SessionError::InvalidConfig(_))));
    }

    #[test]
    fn test_validate_duplicate_keys_rejected() {
        let mut config = SessionConfig::default();
        config.keys.tenant_key = config.keys.access_token.clone();

        let err = config.validate().unwrap_err();

        assert!(err.to_string().contains("authorized-token"));
    }

    #[test]
    fn test_validate_blank_login_path_rejected() {
        let config = SessionConfig {
            login_path: "  ".into(),
            ..SessionConfig::default()
        };

        assert!(config.validate().is_err());
    }
}
