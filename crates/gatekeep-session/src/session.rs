//! Session types: the data a logged-in (or logged-out) console holds.
//!
//! - WHAT the user typed at the login form ([`LoginCredentials`])
//! - WHAT we remember for the next login form ([`RememberMeRecord`])
//! - WHO is logged in and with which token ([`SessionSnapshot`])

use std::fmt;

use gatekeep_gateway::{LoginRequest, UserInfo};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// LoginCredentials
// ---------------------------------------------------------------------------

/// Input to [`SessionStore::login`](crate::SessionStore::login).
///
/// Transient: it is never persisted as-is. Only the remember-me policy
/// copies username and password into a [`RememberMeRecord`].
#[derive(Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    pub username: String,
    pub password: String,

    /// Keep username and password for pre-filling the next login form.
    pub remember_me: bool,

    /// Log in scoped to an already selected tenant. `None` and
    /// `Some(false)` behave the same.
    pub tenant_login: Option<bool>,
}

impl LoginCredentials {
    /// Credentials with remember-me off and no tenant scoping.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            remember_me: false,
            tenant_login: None,
        }
    }

    /// Sets the remember-me flag.
    pub fn remember_me(mut self, remember: bool) -> Self {
        self.remember_me = remember;
        self
    }

    /// Marks this as a tenant-scoped login.
    pub fn tenant_login(mut self, tenant_login: bool) -> Self {
        self.tenant_login = Some(tenant_login);
        self
    }

    /// Returns `true` only for an explicit tenant-scoped login.
    pub fn is_tenant_login(&self) -> bool {
        self.tenant_login.unwrap_or(false)
    }

    pub(crate) fn to_request(&self) -> LoginRequest {
        LoginRequest {
            username: self.username.clone(),
            password: self.password.clone(),
            tenant_login: self.tenant_login,
        }
    }
}

impl fmt::Debug for LoginCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("remember_me", &self.remember_me)
            .field("tenant_login", &self.tenant_login)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// RememberMeRecord
// ---------------------------------------------------------------------------

/// Credentials kept to pre-fill the login form.
///
/// Persisted in the durable scope only while `remember_me` is `true`.
/// The empty default (`"", "", false`) stands for "nothing remembered".
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RememberMeRecord {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub remember_me: bool,
}

impl RememberMeRecord {
    /// Returns `true` for the empty default.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl From<&LoginCredentials> for RememberMeRecord {
    fn from(credentials: &LoginCredentials) -> Self {
        Self {
            username: credentials.username.clone(),
            password: credentials.password.clone(),
            remember_me: credentials.remember_me,
        }
    }
}

impl fmt::Debug for RememberMeRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RememberMeRecord")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("remember_me", &self.remember_me)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// SessionState
// ---------------------------------------------------------------------------

/// Whether the console currently holds an authenticated session.
///
/// ```text
///   Anonymous ──(login ok)──→ Authenticated ──(logout accepted)──→ Anonymous
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Anonymous,
    Authenticated,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Anonymous => write!(f, "Anonymous"),
            Self::Authenticated => write!(f, "Authenticated"),
        }
    }
}

// ---------------------------------------------------------------------------
// SessionSnapshot
// ---------------------------------------------------------------------------

/// The in-memory view of the session every consumer reads from.
///
/// Invariant: `access_token` is only ever non-empty while `user_info` is
/// `Some`. The store writes both under one lock, so a clone of the
/// snapshot never shows one without the other.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionSnapshot {
    pub login_user: RememberMeRecord,
    pub tenant_login: bool,
    pub user_info: Option<UserInfo>,
    pub access_token: Option<String>,
}

impl SessionSnapshot {
    /// Derives the session state from the token.
    pub fn state(&self) -> SessionState {
        match self.access_token.as_deref() {
            Some(token) if !token.is_empty() => SessionState::Authenticated,
            _ => SessionState::Anonymous,
        }
    }

    /// The tenant code of the current identity.
    pub fn tenant_id(&self) -> Option<&str> {
        self.user_info.as_ref()?.sys_code.as_deref()
    }

    /// Returns `true` if the current identity holds `permission`.
    pub fn has_permission(&self, permission: &str) -> bool {
        self.user_info
            .as_ref()
            .is_some_and(|user| user.has_permission(permission))
    }

    /// Drops identity, token, and tenant flag. The remembered login stays.
    pub(crate) fn clear_auth(&mut self) {
        self.user_info = None;
        self.access_token = None;
        self.tenant_login = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(sys_code: &str) -> UserInfo {
        UserInfo {
            sys_code: Some(sys_code.into()),
            permissions: ["read".to_string()].into_iter().collect(),
            ..UserInfo::default()
        }
    }

    #[test]
    fn test_state_without_token_is_anonymous() {
        let snapshot = SessionSnapshot::default();

        assert_eq!(snapshot.state(), SessionState::Anonymous);
    }

    #[test]
    fn test_state_with_empty_token_is_anonymous() {
        let snapshot = SessionSnapshot {
            user_info: Some(identity("S1")),
            access_token: Some(String::new()),
            ..SessionSnapshot::default()
        };

        assert_eq!(snapshot.state(), SessionState::Anonymous);
    }

    #[test]
    fn test_state_with_token_is_authenticated() {
        let snapshot = SessionSnapshot {
            user_info: Some(identity("S1")),
            access_token: Some("T1".into()),
            ..SessionSnapshot::default()
        };

        assert_eq!(snapshot.state(), SessionState::Authenticated);
        assert_eq!(snapshot.tenant_id(), Some("S1"));
        assert!(snapshot.has_permission("read"));
        assert!(!snapshot.has_permission("write"));
    }

    #[test]
    fn test_clear_auth_keeps_remembered_login() {
        let mut snapshot = SessionSnapshot {
            login_user: RememberMeRecord {
                username: "a".into(),
                password: "p".into(),
                remember_me: true,
            },
            tenant_login: true,
            user_info: Some(identity("S1")),
            access_token: Some("T1".into()),
        };

        snapshot.clear_auth();

        assert!(snapshot.user_info.is_none());
        assert!(snapshot.access_token.is_none());
        assert!(!snapshot.tenant_login);
        assert_eq!(snapshot.login_user.username, "a");
    }

    #[test]
    fn test_remember_me_record_serializes_camel_case() {
        let record = RememberMeRecord {
            username: "a".into(),
            password: "p".into(),
            remember_me: true,
        };

        let value = serde_json::to_value(&record).unwrap();

        assert_eq!(
            value,
            serde_json::json!({ "username": "a", "password": "p", "rememberMe": true })
        );
    }

    #[test]
    fn test_credentials_debug_redacts_password() {
        let creds = LoginCredentials::new("a", "secret").remember_me(true);

        let printed = format!("{creds:?}");

        assert!(!printed.contains("secret"));
        assert!(!creds.is_tenant_login());
        assert!(creds.clone().tenant_login(true).is_tenant_login());
    }
}
