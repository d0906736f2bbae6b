//! Lifecycle phases and the actions registered under them.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{error, info, warn};

use crate::error::{BootstrapError, BootstrapResult};

/// Point in the process lifetime at which an action runs.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Before the listener accepts its first connection.
    Startup,
    /// After the listener stops accepting and in-flight work has drained.
    Shutdown,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Startup => "startup",
            Phase::Shutdown => "shutdown",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named, zero-argument action run at a lifecycle phase.
///
/// Names identify actions within a phase; registering a second action with
/// the same name in the same phase is a no-op.
#[async_trait]
pub trait LifecycleHook: Send + Sync {
    fn name(&self) -> &str;

    async fn run(&self) -> anyhow::Result<()>;
}

/// [`LifecycleHook`] backed by a closure returning a future.
pub struct FnHook<F> {
    name: String,
    f: F,
}

#[async_trait]
impl<F, Fut> LifecycleHook for FnHook<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<()>> + Send,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self) -> anyhow::Result<()> {
        (self.f)().await
    }
}

/// Wrap a closure as a shareable lifecycle hook.
pub fn hook_fn<F, Fut>(name: impl Into<String>, f: F) -> Arc<dyn LifecycleHook>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    Arc::new(FnHook {
        name: name.into(),
        f,
    })
}

/// How a shutdown action ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookOutcome {
    Completed { name: String },
    Failed { name: String, error: String },
    TimedOut { name: String },
}

impl HookOutcome {
    pub fn name(&self) -> &str {
        match self {
            HookOutcome::Completed { name }
            | HookOutcome::Failed { name, .. }
            | HookOutcome::TimedOut { name } => name,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, HookOutcome::Completed { .. })
    }
}

/// Actions per phase, in registration order.
#[derive(Clone, Default)]
pub struct LifecycleRegistry {
    startup: Vec<Arc<dyn LifecycleHook>>,
    shutdown: Vec<Arc<dyn LifecycleHook>>,
}

impl LifecycleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `hook` under `phase`. Returns `false` if the name is taken.
    pub fn register(&mut self, phase: Phase, hook: Arc<dyn LifecycleHook>) -> bool {
        let hooks = self.phase_mut(phase);
        if hooks.iter().any(|h| h.name() == hook.name()) {
            return false;
        }
        hooks.push(hook);
        true
    }

    pub fn hooks(&self, phase: Phase) -> &[Arc<dyn LifecycleHook>] {
        match phase {
            Phase::Startup => &self.startup,
            Phase::Shutdown => &self.shutdown,
        }
    }

    pub fn names(&self, phase: Phase) -> Vec<&str> {
        self.hooks(phase).iter().map(|h| h.name()).collect()
    }

    fn phase_mut(&mut self, phase: Phase) -> &mut Vec<Arc<dyn LifecycleHook>> {
        match phase {
            Phase::Startup => &mut self.startup,
            Phase::Shutdown => &mut self.shutdown,
        }
    }

    /// Run startup actions in order; the first failure stops the sequence.
    pub async fn run_startup(&self) -> BootstrapResult<usize> {
        for hook in &self.startup {
            info!(action = hook.name(), "running startup action");
            if let Err(e) = hook.run().await {
                error!(action = hook.name(), error = %format!("{e:#}"), "startup action failed");
                return Err(BootstrapError::startup_failure(hook.name(), e));
            }
        }
        Ok(self.startup.len())
    }

    /// Run shutdown actions in order, each bounded by `timeout`.
    ///
    /// Failures and timeouts are logged and the next action still runs.
    pub async fn run_shutdown(&self, timeout: Duration) -> Vec<HookOutcome> {
        let mut outcomes = Vec::with_capacity(self.shutdown.len());
        for hook in &self.shutdown {
            let name = hook.name().to_string();
            let outcome = match tokio::time::timeout(timeout, hook.run()).await {
                Ok(Ok(())) => {
                    info!(action = %name, "shutdown action completed");
                    HookOutcome::Completed { name }
                }
                Ok(Err(e)) => {
                    warn!(action = %name, error = %format!("{e:#}"), "shutdown action failed");
                    HookOutcome::Failed {
                        name,
                        error: format!("{e:#}"),
                    }
                }
                Err(_) => {
                    warn!(action = %name, timeout = ?timeout, "shutdown action abandoned after timeout");
                    HookOutcome::TimedOut { name }
                }
            };
            outcomes.push(outcome);
        }
        outcomes
    }
}

impl fmt::Debug for LifecycleRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LifecycleRegistry")
            .field("startup", &self.names(Phase::Startup))
            .field("shutdown", &self.names(Phase::Shutdown))
            .finish()
    }
}
