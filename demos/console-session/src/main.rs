use std::collections::HashMap;
use std::sync::Mutex;

use gatekeep::prelude::*;
use serde_json::json;

// ---------------------------------------------------------------------------
// In-process auth server
// ---------------------------------------------------------------------------

struct Account {
    password: String,
    info: UserInfo,
}

/// Stands in for the remote API: a fixed account table and one
/// server-side session.
struct DemoGateway {
    accounts: HashMap<String, Account>,
    current: Mutex<Option<String>>,
}

impl DemoGateway {
    fn new() -> Self {
        let mut accounts = HashMap::new();
        let mut extra = serde_json::Map::new();
        extra.insert("nickname".into(), json!("Administrator"));
        accounts.insert(
            "admin".to_string(),
            Account {
                password: "admin123".into(),
                info: UserInfo {
                    permissions: ["sys:user:list".to_string()].into_iter().collect(),
                    roles: ["admin".to_string()].into_iter().collect(),
                    sys_code: Some("T-0001".into()),
                    extra,
                },
            },
        );
        Self { accounts, current: Mutex::new(None) }
    }

    fn current(&self) -> Option<String> {
        self.current.lock().ok().and_then(|c| c.clone())
    }

    fn set_current(&self, user: Option<String>) -> Result<(), GatewayError> {
        let mut current = self
            .current
            .lock()
            .map_err(|_| GatewayError::Transport("server state poisoned".into()))?;
        *current = user;
        Ok(())
    }
}

impl AuthGateway for DemoGateway {
    async fn login(&self, request: &LoginRequest) -> Result<ApiResult<LoginPayload>, GatewayError> {
        match self.accounts.get(&request.username) {
            Some(account) if account.password == request.password => {
                self.set_current(Some(request.username.clone()))?;
                Ok(ApiResult::ok(LoginPayload {
                    token: format!("token-{}", request.username),
                    user: account.info.clone(),
                }))
            }
            _ => Ok(ApiResult::fail(500, "invalid username or password")),
        }
    }

    async fn fetch_user_info(&self) -> Result<ApiResult<UserInfo>, GatewayError> {
        let Some(name) = self.current() else {
            return Ok(ApiResult::fail(code::UNAUTHORIZED, "not logged in"));
        };
        match self.accounts.get(&name) {
            Some(account) => {
                let mut info = account.info.clone();
                info.permissions.insert("sys:user:edit".into());
                Ok(ApiResult::ok(info))
            }
            None => Ok(ApiResult::fail(code::UNAUTHORIZED, "unknown user")),
        }
    }

    async fn logout(&self) -> Result<ApiResult<()>, GatewayError> {
        if self.current().is_none() {
            return Ok(ApiResult::status(code::UNAUTHORIZED));
        }
        self.set_current(None)?;
        Ok(ApiResult::status(code::OK))
    }
}

// ---------------------------------------------------------------------------
// Console chrome: tabs, routes, navigation
// ---------------------------------------------------------------------------

const HOME_TAG: &str = "/welcome";
const PUBLIC_ROUTES: [&str; 2] = ["/login", "/error/404"];

struct ConsoleChrome {
    tags: Mutex<Vec<String>>,
    routes: Mutex<Vec<String>>,
    location: Mutex<String>,
}

impl ConsoleChrome {
    fn new() -> Self {
        Self {
            tags: Mutex::new(vec![HOME_TAG.into(), "/system/user".into()]),
            routes: Mutex::new(
                PUBLIC_ROUTES
                    .iter()
                    .map(|r| r.to_string())
                    .chain(["/system/user".to_string()])
                    .collect(),
            ),
            location: Mutex::new("/system/user".into()),
        }
    }
}

fn poisoned<T>(_: T) -> TeardownError {
    TeardownError::Hook("console state poisoned".into())
}

impl TeardownHooks for ConsoleChrome {
    fn reset_tags(&self) -> Result<(), TeardownError> {
        *self.tags.lock().map_err(poisoned)? = vec![HOME_TAG.into()];
        Ok(())
    }

    fn reset_routes(&self) -> Result<(), TeardownError> {
        *self.routes.lock().map_err(poisoned)? =
            PUBLIC_ROUTES.iter().map(|r| r.to_string()).collect();
        Ok(())
    }

    fn navigate(&self, path: &str) -> Result<(), TeardownError> {
        *self.location.lock().map_err(poisoned)? = path.to_string();
        tracing::info!(path, "navigated");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Walkthrough
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<(), GatekeepError> {
    gatekeep::init_tracing();

    let dir = std::env::temp_dir().join("gatekeep-console-session");
    let storage = FileStorage::open(&dir)?;
    let store = SessionStore::new(
        DemoGateway::new(),
        storage,
        ConsoleChrome::new(),
        SessionConfig::default(),
    )?;
    let prefill = store.remembered_login().await;
    tracing::info!(dir = %dir.display(), prefill = ?prefill, "session store ready");

    let rejected = store
        .login(LoginCredentials::new("admin", "wrong").remember_me(true))
        .await?;
    tracing::info!(success = rejected.success, code = rejected.code, "bad password attempt");

    let reply = store
        .login(LoginCredentials::new("admin", "admin123").remember_me(true))
        .await?;
    tracing::info!(
        success = reply.success,
        tenant_key = ?store.tenant_key(),
        "login attempt"
    );

    store.refresh_user_info().await?;
    tracing::info!(permissions = ?store.permissions().await, "identity refreshed");

    match store.logout().await? {
        LogoutOutcome::TornDown(report) => {
            tracing::info!(clean = report.is_clean(), "logged out")
        }
        LogoutOutcome::Retained { code } => tracing::warn!(code, "logout refused"),
    }
    tracing::info!(state = %store.state().await, "after logout");

    // The host session ends: the next start only has the remembered login.
    store.end_host_session().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> SessionStore<DemoGateway, MemoryStorage, ConsoleChrome> {
        SessionStore::new(
            DemoGateway::new(),
            MemoryStorage::new(),
            ConsoleChrome::new(),
            SessionConfig::default(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_demo_logout_resets_chrome() {
        let store = store();
        store
            .login(LoginCredentials::new("admin", "admin123"))
            .await
            .unwrap();

        let outcome = store.logout().await.unwrap();

        assert!(matches!(outcome, LogoutOutcome::TornDown(_)));
        let chrome = store.hooks();
        assert_eq!(*chrome.tags.lock().unwrap(), vec![HOME_TAG.to_string()]);
        assert_eq!(chrome.routes.lock().unwrap().len(), PUBLIC_ROUTES.len());
        assert_eq!(*chrome.location.lock().unwrap(), "/login");
    }

    #[tokio::test]
    async fn test_demo_second_logout_is_accepted_as_unauthorized() {
        let store = store();
        store
            .login(LoginCredentials::new("admin", "admin123"))
            .await
            .unwrap();
        store.logout().await.unwrap();

        let outcome = store.logout().await.unwrap();

        assert!(matches!(outcome, LogoutOutcome::TornDown(_)));
        assert_eq!(store.state().await, SessionState::Anonymous);
    }

    #[tokio::test]
    async fn test_demo_refresh_adds_edit_permission() {
        let store = store();
        store
            .login(LoginCredentials::new("admin", "admin123"))
            .await
            .unwrap();

        store.refresh_user_info().await.unwrap();

        assert!(store.has_permission("sys:user:edit").await);
        assert_eq!(store.access_token().await.as_deref(), Some("token-admin"));
    }
}
