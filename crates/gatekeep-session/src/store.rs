//! The session store: owns the authenticated session of one console.
//!
//! Responsibilities:
//! - Hydrating the session from storage when the console starts
//! - Applying the remember-me policy on every login attempt
//! - Calling the [`AuthGateway`] and applying its answers
//! - Mirroring identity/token/tenant data into the ephemeral scope
//! - Running the logout teardown when the server accepts a logout
//!
//! # Concurrency note
//!
//! `login`, `refresh_user_info`, and `logout` each hold an async mutex
//! from start to finish, so two overlapping calls (a double-clicked
//! submit button, a logout racing a refresh) run one after the other.
//! The snapshot itself sits behind a separate `RwLock`, so readers are
//! never blocked by a slow remote call and never see an identity without
//! its token.

use std::collections::BTreeSet;

use gatekeep_gateway::{ApiResult, AuthGateway, LoginPayload, UserInfo};
use gatekeep_storage::{Scope, Storage, StorageError, StorageExt};
use serde::{Serialize, de::DeserializeOwned};
use tokio::sync::{Mutex, RwLock};

use crate::{
    LoginCredentials, RememberMeRecord, SessionConfig, SessionError, SessionSnapshot,
    SessionState, TeardownCoordinator, TeardownError, TeardownHooks, TeardownReport,
};

/// What [`SessionStore::logout`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogoutOutcome {
    /// The server accepted the logout and the teardown ran.
    TornDown(TeardownReport),

    /// The server answered with a code outside the accepted set. The
    /// session was left exactly as it was.
    Retained { code: i32 },
}

/// Owns the in-memory session and keeps storage in sync with it.
///
/// ## Lifecycle
///
/// ```text
/// new() ──→ hydrate from storage ──→ [Anonymous | Authenticated]
///                                        │            ↑
///                                        │  login()   │
///                                        └────────────┘
///                                  logout() (accepted code)
///                                        ↓
///                                    teardown ──→ [Anonymous]
/// ```
pub struct SessionStore<G, S, H> {
    gateway: G,
    storage: S,
    teardown: TeardownCoordinator<H>,
    config: SessionConfig,
    snapshot: RwLock<SessionSnapshot>,
    in_flight: Mutex<()>,
}

impl<G, S, H> SessionStore<G, S, H>
where
    G: AuthGateway,
    S: Storage,
    H: TeardownHooks,
{
    /// Creates a store and hydrates it from `storage`.
    ///
    /// Unreadable entries are logged and replaced by defaults; a broken
    /// storage never prevents the console from starting anonymous.
    ///
    /// # Errors
    /// Returns [`SessionError::InvalidConfig`] if `config` fails validation.
    pub fn new(
        gateway: G,
        storage: S,
        hooks: H,
        config: SessionConfig,
    ) -> Result<Self, SessionError> {
        config.validate()?;

        let snapshot = hydrate(&storage, &config);
        tracing::info!(
            state = %snapshot.state(),
            remembered = !snapshot.login_user.is_empty(),
            tenant_login = snapshot.tenant_login,
            "session hydrated"
        );

        Ok(Self {
            gateway,
            storage,
            teardown: TeardownCoordinator::new(hooks, config.login_path.clone()),
            config,
            snapshot: RwLock::new(snapshot),
            in_flight: Mutex::new(()),
        })
    }

    // =====================================================================
    // Actions
    // =====================================================================

    /// Logs in with `credentials`.
    ///
    /// In order:
    /// 1. Applies the remember-me policy (always, before the remote call).
    /// 2. Calls the gateway.
    /// 3. On `success`, stores identity, token, and tenant flag, and
    ///    refreshes the tenant key unless this is a tenant-scoped login.
    ///
    /// The envelope is returned whether or not the server accepted the
    /// credentials.
    ///
    /// # Errors
    /// Returns [`SessionError::Gateway`] if the call could not complete.
    /// The remember-me policy has already been applied at that point.
    pub async fn login(
        &self,
        credentials: LoginCredentials,
    ) -> Result<ApiResult<LoginPayload>, SessionError> {
        let _flight = self.in_flight.lock().await;

        self.apply_remember_me(&credentials).await;

        let result = self.gateway.login(&credentials.to_request()).await?;
        if !result.success {
            tracing::info!(
                username = %credentials.username,
                code = result.code,
                "login rejected"
            );
            return Ok(result);
        }

        let payload = match result.data.clone() {
            Some(payload) if !payload.token.is_empty() => payload,
            _ => {
                tracing::warn!(
                    username = %credentials.username,
                    code = result.code,
                    "login reported success without a token, ignoring"
                );
                return Ok(result);
            }
        };

        let tenant_login = credentials.is_tenant_login();
        {
            let mut snapshot = self.snapshot.write().await;
            snapshot.user_info = Some(payload.user.clone());
            snapshot.access_token = Some(payload.token.clone());
            snapshot.tenant_login = tenant_login;
        }

        let keys = &self.config.keys;
        write_or_warn(&self.storage, Scope::Ephemeral, &keys.user_info, &payload.user);
        write_or_warn(&self.storage, Scope::Ephemeral, &keys.access_token, &payload.token);
        write_or_warn(&self.storage, Scope::Ephemeral, &keys.tenant_login, &tenant_login);

        // Tenant logins reuse whatever key an earlier tenant selection cached.
        if !tenant_login {
            match payload.user.sys_code.as_deref() {
                Some(sys_code) => {
                    write_or_warn(&self.storage, Scope::Ephemeral, &keys.tenant_key, &sys_code)
                }
                None => remove_or_warn(&self.storage, Scope::Ephemeral, &keys.tenant_key),
            }
        }

        tracing::info!(
            username = %credentials.username,
            tenant_login,
            tenant = payload.user.sys_code.as_deref().unwrap_or("-"),
            "logged in"
        );
        Ok(result)
    }

    /// Re-reads the user's identity without logging in again.
    ///
    /// On success only the identity changes; token, tenant flag, and the
    /// remembered login are untouched.
    ///
    /// # Errors
    /// Returns [`SessionError::Gateway`] if the call could not complete.
    pub async fn refresh_user_info(&self) -> Result<ApiResult<UserInfo>, SessionError> {
        let _flight = self.in_flight.lock().await;

        let result = self.gateway.fetch_user_info().await?;
        if !result.success {
            tracing::info!(code = result.code, "user info refresh rejected");
            return Ok(result);
        }
        let Some(user) = result.data.clone() else {
            tracing::warn!(code = result.code, "user info refresh returned no identity");
            return Ok(result);
        };

        write_or_warn(&self.storage, Scope::Ephemeral, &self.config.keys.user_info, &user);
        let (permissions, roles) = (user.permissions.len(), user.roles.len());
        self.snapshot.write().await.user_info = Some(user);

        tracing::info!(permissions, roles, "user info refreshed");
        Ok(result)
    }

    /// Logs out.
    ///
    /// If the server answers with an accepted code (by default 200 or 401),
    /// the teardown runs regardless of the `success` flag. Any other code
    /// leaves the session untouched (see [`LogoutOutcome::Retained`]).
    ///
    /// # Errors
    /// Returns [`SessionError::Gateway`] if the call could not complete;
    /// the session is left untouched in that case too.
    pub async fn logout(&self) -> Result<LogoutOutcome, SessionError> {
        let _flight = self.in_flight.lock().await;

        let result = self.gateway.logout().await?;
        if !self.config.accepts_logout_code(result.code) {
            return Ok(self.best_effort_logout(result.code));
        }

        let report = self.teardown.run(self.clear_session()).await;
        Ok(LogoutOutcome::TornDown(report))
    }

    /// Ends the host session: empties the ephemeral scope and forgets the
    /// identity in memory, like a browser closing its last tab.
    ///
    /// The remembered login survives. No remote call, no teardown hooks.
    ///
    /// # Errors
    /// Returns [`SessionError::Storage`] if the ephemeral scope could not
    /// be cleared. Memory is cleared either way.
    pub async fn end_host_session(&self) -> Result<(), SessionError> {
        let _flight = self.in_flight.lock().await;

        self.snapshot.write().await.clear_auth();
        self.storage.clear(Scope::Ephemeral)?;
        tracing::info!("host session ended, ephemeral scope cleared");
        Ok(())
    }

    // =====================================================================
    // Direct setters (memory only)
    // =====================================================================

    /// Replaces the identity in memory. Nothing is persisted.
    ///
    /// # Errors
    /// Returns [`SessionError::TokenWithoutIdentity`] when clearing the
    /// identity while an access token is still held.
    pub async fn set_user_info(&self, user: Option<UserInfo>) -> Result<(), SessionError> {
        let mut snapshot = self.snapshot.write().await;
        if user.is_none() && snapshot.state() == SessionState::Authenticated {
            return Err(SessionError::TokenWithoutIdentity);
        }
        snapshot.user_info = user;
        Ok(())
    }

    /// Replaces the access token in memory. Nothing is persisted.
    ///
    /// # Errors
    /// Returns [`SessionError::TokenWithoutIdentity`] when setting a
    /// non-empty token while no identity is held.
    pub async fn set_access_token(&self, token: Option<String>) -> Result<(), SessionError> {
        let mut snapshot = self.snapshot.write().await;
        let non_empty = token.as_deref().is_some_and(|t| !t.is_empty());
        if non_empty && snapshot.user_info.is_none() {
            return Err(SessionError::TokenWithoutIdentity);
        }
        snapshot.access_token = token;
        Ok(())
    }

    /// Replaces the tenant-login flag in memory. Nothing is persisted.
    pub async fn set_tenant_login(&self, tenant_login: bool) {
        self.snapshot.write().await.tenant_login = tenant_login;
    }

    // =====================================================================
    // Readers
    // =====================================================================

    /// A consistent copy of the whole session.
    pub async fn snapshot(&self) -> SessionSnapshot {
        self.snapshot.read().await.clone()
    }

    /// Whether a token is currently held.
    pub async fn state(&self) -> SessionState {
        self.snapshot.read().await.state()
    }

    pub async fn user_info(&self) -> Option<UserInfo> {
        self.snapshot.read().await.user_info.clone()
    }

    pub async fn access_token(&self) -> Option<String> {
        self.snapshot.read().await.access_token.clone()
    }

    /// The tenant code of the current identity.
    pub async fn tenant_id(&self) -> Option<String> {
        self.snapshot.read().await.tenant_id().map(str::to_string)
    }

    /// The current identity's permissions, or `None` when anonymous.
    pub async fn permissions(&self) -> Option<BTreeSet<String>> {
        let snapshot = self.snapshot.read().await;
        snapshot.user_info.as_ref().map(|u| u.permissions.clone())
    }

    /// The current identity's roles, or `None` when anonymous.
    pub async fn roles(&self) -> Option<BTreeSet<String>> {
        let snapshot = self.snapshot.read().await;
        snapshot.user_info.as_ref().map(|u| u.roles.clone())
    }

    pub async fn has_permission(&self, permission: &str) -> bool {
        self.snapshot.read().await.has_permission(permission)
    }

    pub async fn is_tenant_login(&self) -> bool {
        self.snapshot.read().await.tenant_login
    }

    /// The record used to pre-fill the login form.
    pub async fn remembered_login(&self) -> RememberMeRecord {
        self.snapshot.read().await.login_user.clone()
    }

    /// The cached tenant key later requests are scoped by.
    pub fn tenant_key(&self) -> Option<String> {
        read_or_warn(&self.storage, Scope::Ephemeral, &self.config.keys.tenant_key)
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn hooks(&self) -> &H {
        self.teardown.hooks()
    }

    // =====================================================================
    // Policies
    // =====================================================================

    /// Remember-me: keep the credentials when asked, actively erase them
    /// when not.
    async fn apply_remember_me(&self, credentials: &LoginCredentials) {
        let key = &self.config.keys.login_user;
        let record = if credentials.remember_me {
            let record = RememberMeRecord::from(credentials);
            write_or_warn(&self.storage, Scope::Durable, key, &record);
            record
        } else {
            remove_or_warn(&self.storage, Scope::Durable, key);
            RememberMeRecord::default()
        };
        self.snapshot.write().await.login_user = record;
    }

    /// The logout was answered with a code we don't accept: keep the
    /// session and let the next authenticated call surface the problem.
    fn best_effort_logout(&self, code: i32) -> LogoutOutcome {
        tracing::warn!(
            code,
            accepted = ?self.config.accepted_logout_codes,
            "logout not accepted, session retained"
        );
        LogoutOutcome::Retained { code }
    }

    /// Teardown step 1: forget identity, token, tenant flag, tenant key.
    ///
    /// Memory is cleared first and unconditionally. Every storage key is
    /// attempted; the first failure is reported.
    async fn clear_session(&self) -> Result<(), TeardownError> {
        self.snapshot.write().await.clear_auth();

        let keys = &self.config.keys;
        let mut first_error: Option<StorageError> = None;
        for key in [
            &keys.user_info,
            &keys.access_token,
            &keys.tenant_login,
            &keys.tenant_key,
        ] {
            if let Err(e) = self.storage.remove(Scope::Ephemeral, key) {
                tracing::warn!(key = %key, error = %e, "failed to remove session entry");
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(TeardownError::Storage(e)),
            None => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// Hydration and storage helpers
// ---------------------------------------------------------------------------

/// Rebuilds the snapshot from storage, falling back to defaults.
fn hydrate<S: Storage>(storage: &S, config: &SessionConfig) -> SessionSnapshot {
    let keys = &config.keys;

    let login_user = match read_or_warn::<S, RememberMeRecord>(storage, Scope::Durable, &keys.login_user) {
        Some(record) if record.remember_me => record,
        Some(_) => {
            tracing::warn!(key = %keys.login_user, "discarding remembered login without remember-me flag");
            RememberMeRecord::default()
        }
        None => RememberMeRecord::default(),
    };

    let tenant_login = read_or_warn(storage, Scope::Ephemeral, &keys.tenant_login).unwrap_or(false);
    let user_info: Option<UserInfo> = read_or_warn(storage, Scope::Ephemeral, &keys.user_info);
    let mut access_token: Option<String> =
        read_or_warn::<S, String>(storage, Scope::Ephemeral, &keys.access_token)
            .filter(|token| !token.is_empty());

    if access_token.is_some() && user_info.is_none() {
        tracing::warn!("stored access token has no identity, dropping it");
        access_token = None;
    }

    SessionSnapshot {
        login_user,
        tenant_login,
        user_info,
        access_token,
    }
}

fn read_or_warn<S: Storage, T: DeserializeOwned>(storage: &S, scope: Scope, key: &str) -> Option<T> {
    match storage.get_json(scope, key) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(%scope, key, error = %e, "failed to read session entry");
            None
        }
    }
}

fn write_or_warn<S: Storage, T: Serialize + ?Sized>(storage: &S, scope: Scope, key: &str, value: &T) {
    if let Err(e) = storage.set_json(scope, key, value) {
        tracing::warn!(%scope, key, error = %e, "failed to persist session entry");
    }
}

fn remove_or_warn<S: Storage>(storage: &S, scope: Scope, key: &str) {
    if let Err(e) = storage.remove(scope, key) {
        tracing::warn!(%scope, key, error = %e, "failed to remove session entry");
    }
}
