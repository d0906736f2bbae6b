//! Startup/shutdown actions for the service's external connections.
//!
//! Connection clients are not wired in yet; the startup actions validate the
//! configured targets so a malformed URL aborts boot instead of failing on
//! the first request.

use std::sync::Arc;

use anyhow::anyhow;
use async_trait::async_trait;
use tracing::info;

use billing_config::DbConfig;
use billing_core::{hook_fn, LifecycleHook, LifecycleProvider};

/// Lifecycle provider for the database and cache connections.
pub fn provider(db: &DbConfig) -> LifecycleProvider {
    LifecycleProvider::new("connections")
        .on_startup(Arc::new(ConnectHook::new("connect-database", "database", db.database_url.clone())))
        .on_startup(Arc::new(ConnectHook::new("connect-cache", "cache", db.cache_url.clone())))
        .on_shutdown(disconnect("disconnect-cache", "cache"))
        .on_shutdown(disconnect("disconnect-database", "database"))
}

/// Startup action for one connection target.
#[derive(Debug, Clone)]
pub struct ConnectHook {
    name: &'static str,
    resource: &'static str,
    url: Option<String>,
}

impl ConnectHook {
    pub fn new(name: &'static str, resource: &'static str, url: Option<String>) -> Self {
        Self { name, resource, url }
    }
}

#[async_trait]
impl LifecycleHook for ConnectHook {
    fn name(&self) -> &str {
        self.name
    }

    async fn run(&self) -> anyhow::Result<()> {
        let Some(url) = self.url.as_deref() else {
            info!(resource = self.resource, "no connection configured; skipping");
            return Ok(());
        };
        let scheme = url_scheme(url)
            .ok_or_else(|| anyhow!("{} url must look like `scheme://...`", self.resource))?;
        // Credentials may be embedded in the URL; only the scheme is logged.
        info!(resource = self.resource, scheme, "connection target accepted");
        Ok(())
    }
}

fn disconnect(name: &'static str, resource: &'static str) -> Arc<dyn LifecycleHook> {
    hook_fn(name, move || async move {
        info!(resource, "connection released");
        Ok(())
    })
}

fn url_scheme(url: &str) -> Option<&str> {
    let (scheme, rest) = url.split_once("://")?;
    let valid = !scheme.is_empty()
        && !rest.is_empty()
        && scheme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    valid.then_some(scheme)
}
