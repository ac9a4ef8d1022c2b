//! Remote authentication contract for Gatekeep.
//!
//! This crate defines what the session core expects from the server:
//!
//! - **Types** ([`ApiResult`], [`LoginRequest`], [`LoginPayload`],
//!   [`UserInfo`]): the envelope and payloads of the three calls.
//! - **Gateway** ([`AuthGateway`] trait): login, fetch user info, logout.
//! - **Errors** ([`GatewayError`]): transport failures only.
//!
//! ```text
//! Session core → AuthGateway (this crate) → host's HTTP client → server
//! ```

#![allow(async_fn_in_trait)]

mod error;
mod gateway;
mod types;

pub use error::GatewayError;
pub use gateway::AuthGateway;
pub use types::{ApiResult, LoginPayload, LoginRequest, UserInfo, code};
