//! The bootstrap state machine.
//!
//! ```text
//! Unbootstrapped --bootstrap()--> Bootstrapping --ok--> Ready --shutdown()--> Stopped
//!                                       |
//!                                       +--error--> Failed
//! ```
//!
//! `bootstrap()` applies every provider (routing, then lifecycle, then error
//! mapping) and then runs the startup actions. It may be invoked once; any
//! later call fails with [`BootstrapError::AlreadyBootstrapped`] and leaves
//! the handle untouched.

use std::time::Duration;

use tracing::{error, info, warn};

use crate::error::{BootstrapError, BootstrapResult};
use crate::handle::ApplicationHandle;
use crate::lifecycle::HookOutcome;
use crate::provider::{Provider, ProviderKind};

/// Where the bootstrapper is in its lifetime.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BootstrapState {
    Unbootstrapped,
    Bootstrapping,
    Ready,
    Failed,
    Stopped,
}

/// Summary of one applied provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedProvider {
    pub name: String,
    pub kind: ProviderKind,
    pub contributions: usize,
}

/// What a successful `bootstrap()` did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapReport {
    pub providers: Vec<AppliedProvider>,
    pub startup_actions: usize,
}

/// Applies a fixed provider list to one application handle, exactly once.
pub struct Bootstrapper<'a, H: ApplicationHandle> {
    handle: &'a mut H,
    providers: Vec<Box<dyn Provider<H>>>,
    state: BootstrapState,
    shutdown_timeout: Duration,
}

impl<'a, H: ApplicationHandle> Bootstrapper<'a, H> {
    pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

    /// Providers are reordered by kind; declaration order is kept within a kind.
    pub fn new(handle: &'a mut H, mut providers: Vec<Box<dyn Provider<H>>>) -> Self {
        providers.sort_by_key(|p| p.kind());
        Self {
            handle,
            providers,
            state: BootstrapState::Unbootstrapped,
            shutdown_timeout: Self::DEFAULT_SHUTDOWN_TIMEOUT,
        }
    }

    /// Per-action bound used by [`Bootstrapper::shutdown`].
    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    pub fn state(&self) -> BootstrapState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == BootstrapState::Ready
    }

    pub fn handle(&self) -> &H {
        &*self.handle
    }

    /// Provider names in application order.
    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    pub async fn bootstrap(&mut self) -> BootstrapResult<BootstrapReport> {
        if self.state != BootstrapState::Unbootstrapped {
            warn!(state = ?self.state, "bootstrap invoked more than once");
            return Err(BootstrapError::AlreadyBootstrapped);
        }
        self.state = BootstrapState::Bootstrapping;

        match self.run().await {
            Ok(report) => {
                self.state = BootstrapState::Ready;
                info!(
                    providers = report.providers.len(),
                    startup_actions = report.startup_actions,
                    "application ready"
                );
                Ok(report)
            }
            Err(e) => {
                self.state = BootstrapState::Failed;
                error!(error = %e, "bootstrap failed");
                Err(e)
            }
        }
    }

    async fn run(&mut self) -> BootstrapResult<BootstrapReport> {
        let mut applied = Vec::with_capacity(self.providers.len());
        for provider in &self.providers {
            let contributions = provider.apply(self.handle)?;
            info!(
                provider = provider.name(),
                kind = %provider.kind(),
                contributions,
                "provider applied"
            );
            applied.push(AppliedProvider {
                name: provider.name().to_string(),
                kind: provider.kind(),
                contributions,
            });
        }

        let startup_actions = self.handle.lifecycle().run_startup().await?;

        Ok(BootstrapReport {
            providers: applied,
            startup_actions,
        })
    }

    /// Run shutdown actions. Only meaningful once, and only from `Ready`.
    pub async fn shutdown(&mut self) -> Vec<HookOutcome> {
        if self.state != BootstrapState::Ready {
            warn!(state = ?self.state, "shutdown skipped: application not ready");
            return Vec::new();
        }
        let outcomes = self
            .handle
            .lifecycle()
            .run_shutdown(self.shutdown_timeout)
            .await;
        self.state = BootstrapState::Stopped;
        info!(
            actions = outcomes.len(),
            completed = outcomes.iter().filter(|o| o.is_completed()).count(),
            "shutdown actions finished"
        );
        outcomes
    }
}
