//! The logout teardown sequence.
//!
//! Once the server accepts a logout, the console has to forget the user
//! in a fixed order:
//!
//! ```text
//! 1. ClearSession  ← identity, token, tenant flag, tenant key (memory + storage)
//! 2. ResetTags     ← open-tab registry back to its default set
//! 3. ResetRoutes   ← routing table back to its unauthenticated form
//! 4. Navigate      ← go to the login entry point
//! ```
//!
//! Steps 2-4 belong to the host UI, which plugs them in through
//! [`TeardownHooks`]. A failing step is logged and recorded, and the
//! sequence carries on: after a confirmed logout, stale routes or tabs
//! are worse than a partial cleanup.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use gatekeep_storage::StorageError;

// ---------------------------------------------------------------------------
// TeardownStep
// ---------------------------------------------------------------------------

/// One step of the teardown sequence, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum TeardownStep {
    ClearSession,
    ResetTags,
    ResetRoutes,
    Navigate,
}

impl fmt::Display for TeardownStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ClearSession => write!(f, "ClearSession"),
            Self::ResetTags => write!(f, "ResetTags"),
            Self::ResetRoutes => write!(f, "ResetRoutes"),
            Self::Navigate => write!(f, "Navigate"),
        }
    }
}

/// Why a teardown step failed.
#[derive(Debug, thiserror::Error)]
pub enum TeardownError {
    /// Session entries could not be removed from storage.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// A host hook reported a failure.
    #[error("hook failed: {0}")]
    Hook(String),
}

// ---------------------------------------------------------------------------
// TeardownHooks
// ---------------------------------------------------------------------------

/// The host UI's part of the teardown.
///
/// Implemented by whatever owns the tab registry, the router, and
/// navigation. Each hook is called exactly once per accepted logout, in
/// the order declared here.
pub trait TeardownHooks: Send + Sync + 'static {
    /// Resets the open-tab registry to its default set.
    fn reset_tags(&self) -> Result<(), TeardownError>;

    /// Resets the routing table, dropping permission-driven routes.
    fn reset_routes(&self) -> Result<(), TeardownError>;

    /// Navigates to `path` (the login entry point).
    fn navigate(&self, path: &str) -> Result<(), TeardownError>;
}

impl<H: TeardownHooks> TeardownHooks for Arc<H> {
    fn reset_tags(&self) -> Result<(), TeardownError> {
        (**self).reset_tags()
    }

    fn reset_routes(&self) -> Result<(), TeardownError> {
        (**self).reset_routes()
    }

    fn navigate(&self, path: &str) -> Result<(), TeardownError> {
        (**self).navigate(path)
    }
}

/// Hooks for headless hosts that have no tabs, routes, or navigation.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHooks;

impl TeardownHooks for NoopHooks {
    fn reset_tags(&self) -> Result<(), TeardownError> {
        Ok(())
    }

    fn reset_routes(&self) -> Result<(), TeardownError> {
        Ok(())
    }

    fn navigate(&self, _path: &str) -> Result<(), TeardownError> {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// TeardownReport
// ---------------------------------------------------------------------------

/// What happened during one teardown run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeardownReport {
    /// Steps that failed, with the error text, in execution order.
    pub failed: Vec<(TeardownStep, String)>,
}

impl TeardownReport {
    /// Returns `true` if every step succeeded.
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }

    fn record(&mut self, step: TeardownStep, result: Result<(), TeardownError>) {
        if let Err(e) = result {
            tracing::warn!(%step, error = %e, "teardown step failed, continuing");
            self.failed.push((step, e.to_string()));
        }
    }
}

// ---------------------------------------------------------------------------
// TeardownCoordinator
// ---------------------------------------------------------------------------

/// Runs the four teardown steps in order.
#[derive(Debug)]
pub struct TeardownCoordinator<H> {
    hooks: H,
    login_path: String,
}

impl<H: TeardownHooks> TeardownCoordinator<H> {
    /// Creates a coordinator that ends at `login_path`.
    pub fn new(hooks: H, login_path: impl Into<String>) -> Self {
        Self {
            hooks,
            login_path: login_path.into(),
        }
    }

    /// Returns the host hooks.
    pub fn hooks(&self) -> &H {
        &self.hooks
    }

    /// Runs the sequence. `clear_session` is the store's own step 1.
    ///
    /// Never aborts early: every step runs, and the report lists the ones
    /// that failed.
    pub async fn run<F>(&self, clear_session: F) -> TeardownReport
    where
        F: Future<Output = Result<(), TeardownError>>,
    {
        let mut report = TeardownReport::default();

        report.record(TeardownStep::ClearSession, clear_session.await);
        report.record(TeardownStep::ResetTags, self.hooks.reset_tags());
        report.record(TeardownStep::ResetRoutes, self.hooks.reset_routes());
        report.record(TeardownStep::Navigate, self.hooks.navigate(&self.login_path));

        tracing::info!(
            failed_steps = report.failed.len(),
            login_path = %self.login_path,
            "session torn down"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    /// Records each hook call; optionally fails one step.
    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<String>>,
        fail_routes: bool,
    }

    impl Recorder {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl TeardownHooks for Recorder {
        fn reset_tags(&self) -> Result<(), TeardownError> {
            self.calls.lock().unwrap().push("tags".into());
            Ok(())
        }

        fn reset_routes(&self) -> Result<(), TeardownError> {
            self.calls.lock().unwrap().push("routes".into());
            if self.fail_routes {
                return Err(TeardownError::Hook("router locked".into()));
            }
            Ok(())
        }

        fn navigate(&self, path: &str) -> Result<(), TeardownError> {
            self.calls.lock().unwrap().push(format!("navigate {path}"));
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_run_executes_steps_in_order() {
        let coordinator = TeardownCoordinator::new(Arc::new(Recorder::default()), "/login");

        let report = coordinator.run(async { Ok(()) }).await;

        assert!(report.is_clean());
        assert_eq!(
            coordinator.hooks().calls(),
            vec!["tags", "routes", "navigate /login"]
        );
    }

    #[tokio::test]
    async fn test_run_failed_clear_still_runs_hooks() {
        let coordinator = TeardownCoordinator::new(Arc::new(Recorder::default()), "/login");

        let report = coordinator
            .run(async {
                Err(TeardownError::Storage(StorageError::Unavailable(
                    "disk gone".into(),
                )))
            })
            .await;

        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, TeardownStep::ClearSession);
        assert!(report.failed[0].1.contains("disk gone"));
        assert_eq!(coordinator.hooks().calls().len(), 3);
    }

    #[tokio::test]
    async fn test_run_failed_hook_continues_to_navigate() {
        let recorder = Recorder {
            fail_routes: true,
            ..Recorder::default()
        };
        let coordinator = TeardownCoordinator::new(recorder, "/login");

        let report = coordinator.run(async { Ok(()) }).await;

        assert_eq!(report.failed, vec![(TeardownStep::ResetRoutes, "hook failed: router locked".to_string())]);
        assert_eq!(coordinator.hooks().calls().last().map(String::as_str), Some("navigate /login"));
    }

    #[test]
    fn test_steps_are_ordered() {
        assert!(TeardownStep::ClearSession < TeardownStep::ResetTags);
        assert!(TeardownStep::ResetTags < TeardownStep::ResetRoutes);
        assert!(TeardownStep::ResetRoutes < TeardownStep::Navigate);
        assert_eq!(TeardownStep::Navigate.to_string(), "Navigate");
    }
}
