//! Bootstrap error model.

use thiserror::Error;

/// Result type used across the bootstrap layer.
pub type BootstrapResult<T> = Result<T, BootstrapError>;

/// Startup-time failure.
///
/// Every variant is fatal: the process must not begin serving traffic.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// Two route groups were mounted under the same prefix.
    #[error("route prefix `{prefix}` is already mounted")]
    RoutingConflict { prefix: String },

    /// `bootstrap()` was invoked more than once.
    #[error("application is already bootstrapped")]
    AlreadyBootstrapped,

    /// A startup lifecycle action returned an error.
    #[error("startup action `{action}` failed: {source:#}")]
    StartupActionFailure {
        action: String,
        #[source]
        source: anyhow::Error,
    },
}

impl BootstrapError {
    pub fn routing_conflict(prefix: impl Into<String>) -> Self {
        Self::RoutingConflict {
            prefix: prefix.into(),
        }
    }

    pub fn startup_failure(action: impl Into<String>, source: anyhow::Error) -> Self {
        Self::StartupActionFailure {
            action: action.into(),
            source,
        }
    }
}
