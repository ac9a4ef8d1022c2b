//! Wire types for the remote authentication contract.
//!
//! Every remote call answers with the same [`ApiResult`] envelope. The
//! payload inside is opaque to the server-facing layer; only the fields
//! the session core reads (token, tenant code, permissions, roles) are
//! given names here. Everything else rides along in [`UserInfo::extra`].

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Numeric status codes the session core cares about.
pub mod code {
    /// The call was accepted.
    pub const OK: i32 = 200;

    /// The caller is not (or no longer) authenticated.
    pub const UNAUTHORIZED: i32 = 401;
}

// ---------------------------------------------------------------------------
// ApiResult: the uniform envelope
// ---------------------------------------------------------------------------

/// The envelope every remote call returns: `{ success, code, data }`.
///
/// `success == false` is a *business* rejection (bad credentials, account
/// locked, ...), not a transport failure. Transport failures never produce
/// an envelope at all; they surface as
/// [`GatewayError`](crate::GatewayError).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResult<T> {
    /// Whether the server considers the call successful.
    pub success: bool,

    /// Application-level status code (conventionally HTTP-like).
    pub code: i32,

    /// The payload, present on success for calls that return one.
    pub data: Option<T>,

    /// Human-readable message from the server, if any.
    #[serde(default, alias = "msg", skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResult<T> {
    /// A successful envelope carrying `data` with code 200.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            code: code::OK,
            data: Some(data),
            message: None,
        }
    }

    /// A rejected envelope with the given code and message and no payload.
    pub fn fail(code: i32, message: impl Into<String>) -> Self {
        Self {
            success: false,
            code,
            data: None,
            message: Some(message.into()),
        }
    }

    /// An envelope with only a status code, as returned by logout.
    pub fn status(status: i32) -> Self {
        Self {
            success: status == code::OK,
            code: status,
            data: None,
            message: None,
        }
    }

    /// Returns `true` if the server flagged the call as successful.
    pub fn is_success(&self) -> bool {
        self.success
    }
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// The body of a login call.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub username: String,
    pub password: String,

    /// Log in scoped to a pre-selected tenant.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_login: Option<bool>,
}

// Manual impl so passwords never end up in logs via `{:?}`.
impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("tenant_login", &self.tenant_login)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Payloads
// ---------------------------------------------------------------------------

/// The identity the server returns for the logged-in user.
///
/// Permissions and roles are orderless, so they are held as sets.
/// Any display fields the server adds (nickname, avatar, dept, ...) are
/// kept verbatim in `extra` and serialized back out unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    #[serde(default)]
    pub permissions: BTreeSet<String>,

    #[serde(default)]
    pub roles: BTreeSet<String>,

    /// The tenant code this identity belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sys_code: Option<String>,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl UserInfo {
    /// Returns `true` if the identity carries `permission`.
    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.contains(permission)
    }

    /// Returns `true` if the identity carries `role`.
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }
}

/// What a successful login returns: the access token plus the identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginPayload {
    pub token: String,

    #[serde(flatten)]
    pub user: UserInfo,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_login_payload_decodes_camel_case_and_extra_fields() {
        let value = json!({
            "token": "T1",
            "sysCode": "S1",
            "permissions": ["read"],
            "roles": ["admin"],
            "nickname": "Ada"
        });

        let payload: LoginPayload = serde_json::from_value(value).unwrap();

        assert_eq!(payload.token, "T1");
        assert_eq!(payload.user.sys_code.as_deref(), Some("S1"));
        assert!(payload.user.has_permission("read"));
        assert!(payload.user.has_role("admin"));
        assert_eq!(payload.user.extra.get("nickname"), Some(&json!("Ada")));
        assert!(
            !payload.user.extra.contains_key("token"),
            "token must not leak into extra fields"
        );
    }

    #[test]
    fn test_user_info_missing_collections_default_to_empty() {
        let info: UserInfo = serde_json::from_value(json!({})).unwrap();

        assert!(info.permissions.is_empty());
        assert!(info.roles.is_empty());
        assert!(info.sys_code.is_none());
    }

    #[test]
    fn test_api_result_accepts_msg_alias_and_missing_data() {
        let value = json!({ "success": false, "code": 500, "msg": "bad password" });

        let result: ApiResult<LoginPayload> = serde_json::from_value(value).unwrap();

        assert!(!result.is_success());
        assert_eq!(result.code, 500);
        assert!(result.data.is_none());
        assert_eq!(result.message.as_deref(), Some("bad password"));
    }

    #[test]
    fn test_api_result_status_sets_success_only_for_ok() {
        assert!(ApiResult::<()>::status(code::OK).success);
        assert!(!ApiResult::<()>::status(code::UNAUTHORIZED).success);
    }

    #[test]
    fn test_login_request_debug_redacts_password() {
        let req = LoginRequest {
            username: "a".into(),
            password: "hunter2".into(),
            tenant_login: None,
        };

        let printed = format!("{req:?}");

        assert!(!printed.contains("hunter2"));
        assert!(printed.contains("<redacted>"));
    }

    #[test]
    fn test_login_request_omits_absent_tenant_flag() {
        let req = LoginRequest {
            username: "a".into(),
            password: "p".into(),
            tenant_login: None,
        };

        let value = serde_json::to_value(&req).unwrap();

        assert_eq!(value, json!({ "username": "a", "password": "p" }));
    }
}
