//! # Gatekeep
//!
//! Session manager for admin consoles.
//!
//! Gatekeep owns who is logged in: it remembers credentials for the login
//! form, caches the identity and access token across reloads, tracks
//! tenant-scoped logins, and tears everything down in a fixed order on
//! logout. The host plugs in three things:
//!
//! - an [`AuthGateway`](prelude::AuthGateway) for the remote calls,
//! - a [`Storage`](prelude::Storage) for the durable and ephemeral scopes,
//! - [`TeardownHooks`](prelude::TeardownHooks) for tabs, routes, navigation.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use gatekeep::prelude::*;
//!
//! # async fn run<G: AuthGateway>(gateway: G) -> Result<(), GatekeepError> {
//! gatekeep::init_tracing();
//!
//! let storage = FileStorage::open("./session")?;
//! let store = SessionStore::new(gateway, storage, NoopHooks, SessionConfig::default())?;
//!
//! let reply = store
//!     .login(LoginCredentials::new("admin", "secret").remember_me(true))
//!     .await?;
//! if reply.success {
//!     println!("permissions: {:?}", store.permissions().await);
//! }
//! store.logout().await?;
//! # Ok(())
//! # }
//! ```

mod error;
mod telemetry;

pub use error::GatekeepError;
pub use telemetry::init_tracing;

/// Everything a host needs to wire up a session.
pub mod prelude {
    pub use crate::GatekeepError;
    pub use gatekeep_gateway::{
        ApiResult, AuthGateway, GatewayError, LoginPayload, LoginRequest, UserInfo, code,
    };
    pub use gatekeep_session::{
        LoginCredentials, LogoutOutcome, NoopHooks, RememberMeRecord, SessionConfig,
        SessionError, SessionSnapshot, SessionState, SessionStore, StorageKeys, TeardownError,
        TeardownHooks, TeardownReport, TeardownStep,
    };
    pub use gatekeep_storage::{
        FileStorage, MemoryStorage, Scope, Storage, StorageError, StorageExt,
    };
}
