//! Authenticated session management for Gatekeep.
//!
//! This crate owns the one piece of an admin console with real state
//! rules: who is logged in.
//!
//! 1. **Login**: remember-me policy, remote call, identity/token caching
//!    ([`SessionStore::login`])
//! 2. **Refresh**: re-pulling permissions and roles without a re-login
//!    ([`SessionStore::refresh_user_info`])
//! 3. **Logout**: accepted-status check, then the ordered teardown
//!    ([`SessionStore::logout`], [`TeardownHooks`])
//!
//! # How it fits in the stack
//!
//! ```text
//! Host UI (views, router, tabs)  ← reads snapshots, provides TeardownHooks
//!     ↕
//! Session Layer (this crate)     ← SessionStore
//!     ↕                    ↕
//! gatekeep-gateway     gatekeep-storage
//! (remote calls)       (durable / ephemeral scopes)
//! ```

mod config;
mod error;
mod session;
mod store;
mod teardown;

pub use config::{SessionConfig, StorageKeys};
pub use error::SessionError;
pub use session::{LoginCredentials, RememberMeRecord, SessionSnapshot, SessionState};
pub use store::{LogoutOutcome, SessionStore};
pub use teardown::{
    NoopHooks, TeardownCoordinator, TeardownError, TeardownHooks, TeardownReport, TeardownStep,
};
