//! HTTP API application wiring (Axum router + bootstrap providers).
//!
//! - `routes/`: route groups + handlers (one file per area)
//! - `lifecycle.rs`: startup/shutdown actions for external connections
//! - `errors.rs`: request errors and the error-mapping middleware

use std::future::Future;
use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use tower::ServiceBuilder;
use tower_http::catch_panic::CatchPanicLayer;
use tracing::info;

use billing_config::ServerConfig;
use billing_core::{
    ApplicationHandle, BootstrapResult, Bootstrapper, ErrorKind, ErrorMappingProvider,
    ErrorTable, LifecycleHook, LifecycleRegistry, Phase, Provider, Responder, RouteGroup,
    RouteTable, RoutingProvider,
};

use crate::runner::Runner;

pub mod errors;
pub mod lifecycle;
pub mod routes;

/// [`ApplicationHandle`] backed by an Axum [`Router`].
#[derive(Debug)]
pub struct AxumApplication {
    title: String,
    router: Router,
    routes: RouteTable,
    lifecycle: LifecycleRegistry,
    errors: ErrorTable,
}

impl AxumApplication {
    pub fn new(config: &ServerConfig) -> Self {
        Self {
            title: config.title.clone(),
            router: Router::new(),
            routes: RouteTable::new(),
            lifecycle: LifecycleRegistry::new(),
            errors: ErrorTable::new(),
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// The servable router: every mounted group behind the error-mapping layer.
    ///
    /// Handler panics are caught inside that layer and mapped as unclassified
    /// failures. The error table is snapshotted here and shared read-only by
    /// all workers.
    pub fn router(&self) -> Router {
        let table = Arc::new(self.errors.clone());
        self.router.clone().layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn_with_state(table, errors::map_errors))
                .layer(CatchPanicLayer::custom(errors::panic_response)),
        )
    }
}

impl ApplicationHandle for AxumApplication {
    type Routes = Router;

    fn mount(&mut self, group: RouteGroup<Router>) -> BootstrapResult<()> {
        let (manifest, routes) = group.into_parts();
        let prefix = manifest.prefix.clone();
        self.routes.mount(manifest)?;

        let router = std::mem::take(&mut self.router);
        self.router = if prefix == "/" {
            router.merge(routes)
        } else {
            router.nest(&prefix, routes)
        };
        info!(prefix = %prefix, "route group mounted");
        Ok(())
    }

    fn add_lifecycle_hook(&mut self, phase: Phase, hook: Arc<dyn LifecycleHook>) -> bool {
        self.lifecycle.register(phase, hook)
    }

    fn add_error_mapping(&mut self, kind: ErrorKind, responder: Responder) -> bool {
        self.errors.register(kind, responder)
    }

    fn route_table(&self) -> &RouteTable {
        &self.routes
    }

    fn lifecycle(&self) -> &LifecycleRegistry {
        &self.lifecycle
    }

    fn error_table(&self) -> &ErrorTable {
        &self.errors
    }
}

/// The service's fixed provider list.
pub fn providers(config: &ServerConfig) -> Vec<Box<dyn Provider<AxumApplication>>> {
    vec![
        Box::new(lifecycle::provider(&config.db)),
        Box::new(ErrorMappingProvider::standard()),
        Box::new(RoutingProvider::new("routing", routes::groups)),
    ]
}

/// Bootstrap the application and return its router (used by tests).
///
/// Shutdown actions are not run for routers built this way.
pub async fn build_app(config: &ServerConfig) -> BootstrapResult<Router> {
    let mut app = AxumApplication::new(config);
    let mut boot = Bootstrapper::new(&mut app, providers(config));
    boot.bootstrap().await?;
    Ok(boot.handle().router())
}

/// Bootstrap, serve until `shutdown` resolves, then run shutdown actions.
pub async fn run<F>(config: ServerConfig, runner: Runner, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    run_with(&config, providers(&config), runner, shutdown).await
}

/// [`run`] with an explicit provider list.
pub async fn run_with<F>(
    config: &ServerConfig,
    providers: Vec<Box<dyn Provider<AxumApplication>>>,
    runner: Runner,
    shutdown: F,
) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let mut app = AxumApplication::new(config);
    let mut boot =
        Bootstrapper::new(&mut app, providers).with_shutdown_timeout(config.shutdown_timeout);

    boot.bootstrap().await.context("bootstrap failed")?;
    info!(title = boot.handle().title(), "bootstrap complete");

    let router = boot.handle().router();
    let served = async {
        let listener = runner.bind().await?;
        runner.serve(listener, router, shutdown).await
    }
    .await;

    boot.shutdown().await;
    served.context("server error")
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use billing_core::{hook_fn, BootstrapError, LifecycleProvider, Method};

    use super::*;
    use crate::runner::ServePlan;

    #[tokio::test]
    async fn bootstrap_mounts_each_endpoint_once() {
        let config = ServerConfig::default();
        let mut app = AxumApplication::new(&config);
        let mut boot = Bootstrapper::new(&mut app, providers(&config));
        boot.bootstrap().await.unwrap();

        let endpoints = app.route_table().endpoints();
        let rendered: Vec<String> = endpoints.iter().map(|e| e.to_string()).collect();
        assert_eq!(
            rendered,
            vec!["GET /api/v1/billing/operations-history", "GET /system/health"]
        );
        assert!(endpoints.iter().all(|e| e.method == Method::Get));
        assert_eq!(app.error_table().len(), 3);
        assert_eq!(
            app.lifecycle().names(Phase::Startup),
            vec!["connect-database", "connect-cache"]
        );
    }

    #[tokio::test]
    async fn provider_order_is_fixed() {
        let config = ServerConfig::default();
        let mut app = AxumApplication::new(&config);
        let boot = Bootstrapper::new(&mut app, providers(&config));

        assert_eq!(boot.provider_names(), vec!["routing", "connections", "error_mapping"]);
    }

    #[test]
    fn mounting_a_prefix_twice_conflicts() {
        let mut app = AxumApplication::new(&ServerConfig::default());
        app.mount(routes::v1()).unwrap();

        let err = app.mount(routes::v1()).unwrap_err();
        assert!(matches!(err, BootstrapError::RoutingConflict { ref prefix } if prefix == "/api/v1"));
        assert_eq!(app.route_table().len(), 1);
    }

    #[tokio::test]
    async fn failed_startup_never_binds() {
        let config = ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 1,
            ..ServerConfig::default()
        };
        let mut providers = providers(&config);
        providers.push(Box::new(
            LifecycleProvider::new("broken")
                .on_startup(hook_fn("connect-ledger", || async { Err(anyhow::anyhow!("ledger offline")) })),
        ));

        let polled = Arc::new(AtomicBool::new(false));
        let flag = polled.clone();
        let shutdown = async move {
            flag.store(true, Ordering::SeqCst);
        };

        let err = run_with(&config, providers, Runner::new(ServePlan::from_config(&config)), shutdown)
            .await
            .unwrap_err();

        let cause = err.downcast_ref::<BootstrapError>().unwrap();
        assert!(matches!(cause, BootstrapError::StartupActionFailure { action, .. } if action == "connect-ledger"));
        assert!(!polled.load(Ordering::SeqCst));
    }
}
