//! The remote authentication surface the session core talks to.
//!
//! Gatekeep doesn't ship an HTTP client. The host implements
//! [`AuthGateway`] on top of whatever request layer it already has
//! (interceptors, base URL, timeouts, retries all live there), and the
//! session core only ever sees the three calls below.

use std::future::Future;
use std::sync::Arc;

use crate::{ApiResult, GatewayError, LoginPayload, LoginRequest, UserInfo};

/// The three remote calls a session depends on.
///
/// # Trait bounds
///
/// - `Send + Sync` → one gateway is shared by every session operation.
/// - `'static` → it lives as long as the session store that owns it.
///
/// # Example
///
/// ```rust
/// use gatekeep_gateway::{
///     ApiResult, AuthGateway, GatewayError, LoginPayload, LoginRequest, UserInfo, code,
/// };
///
/// /// Accepts a single hard-coded account.
/// struct FixedGateway;
///
/// impl AuthGateway for FixedGateway {
///     async fn login(
///         &self,
///         request: &LoginRequest,
///     ) -> Result<ApiResult<LoginPayload>, GatewayError> {
///         if request.username == "admin" && request.password == "admin" {
///             Ok(ApiResult::ok(LoginPayload {
///                 token: "T1".into(),
///                 user: UserInfo::default(),
///             }))
///         } else {
///             Ok(ApiResult::fail(500, "bad credentials"))
///         }
///     }
///
///     async fn fetch_user_info(&self) -> Result<ApiResult<UserInfo>, GatewayError> {
///         Ok(ApiResult::ok(UserInfo::default()))
///     }
///
///     async fn logout(&self) -> Result<ApiResult<()>, GatewayError> {
///         Ok(ApiResult::status(code::OK))
///     }
/// }
/// ```
pub trait AuthGateway: Send + Sync + 'static {
    /// Exchanges credentials for an access token and identity.
    ///
    /// # Returns
    /// - `Ok(envelope)`: the server answered; check `envelope.success`
    /// - `Err(GatewayError)`: the call did not complete
    fn login(
        &self,
        request: &LoginRequest,
    ) -> impl Future<Output = Result<ApiResult<LoginPayload>, GatewayError>> + Send;

    /// Re-reads the current user's identity (permissions, roles, ...).
    fn fetch_user_info(
        &self,
    ) -> impl Future<Output = Result<ApiResult<UserInfo>, GatewayError>> + Send;

    /// Ends the session server-side. Only `code` is meaningful in the answer.
    fn logout(&self) -> impl Future<Output = Result<ApiResult<()>, GatewayError>> + Send;
}

impl<G: AuthGateway> AuthGateway for Arc<G> {
    fn login(
        &self,
        request: &LoginRequest,
    ) -> impl Future<Output = Result<ApiResult<LoginPayload>, GatewayError>> + Send {
        (**self).login(request)
    }

    fn fetch_user_info(
        &self,
    ) -> impl Future<Output = Result<ApiResult<UserInfo>, GatewayError>> + Send {
        (**self).fetch_user_info()
    }

    fn logout(&self) -> impl Future<Output = Result<ApiResult<()>, GatewayError>> + Send {
        (**self).logout()
    }
}
