//! Turns the final configuration into a running listener.

use std::future::{Future, IntoFuture};
use std::num::NonZeroUsize;
use std::time::Duration;

use axum::Router;
use tokio::net::TcpListener;
use tokio::signal;
use tokio::sync::oneshot;
use tracing::{error, info, warn};

use billing_config::ServerConfig;

/// Where and how the server listens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServePlan {
    pub host: String,
    pub port: u16,
    pub workers: NonZeroUsize,
    /// How long in-flight requests may run once accepting has stopped.
    pub drain_timeout: Duration,
}

impl ServePlan {
    pub fn from_config(config: &ServerConfig) -> Self {
        Self {
            host: config.host.clone(),
            port: config.port,
            workers: config.workers,
            drain_timeout: config.shutdown_timeout,
        }
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone)]
pub struct Runner {
    plan: ServePlan,
}

impl Runner {
    pub fn new(plan: ServePlan) -> Self {
        Self { plan }
    }

    pub fn plan(&self) -> &ServePlan {
        &self.plan
    }

    /// Multi-threaded runtime with one worker thread per configured worker.
    pub fn runtime(&self) -> std::io::Result<tokio::runtime::Runtime> {
        tokio::runtime::Builder::new_multi_thread()
            .worker_threads(self.plan.workers.get())
            .thread_name("billing-worker")
            .enable_all()
            .build()
    }

    pub async fn bind(&self) -> std::io::Result<TcpListener> {
        let listener = TcpListener::bind((self.plan.host.as_str(), self.plan.port)).await?;
        info!(
            address = %listener.local_addr()?,
            workers = self.plan.workers.get(),
            "listening"
        );
        Ok(listener)
    }

    /// Serve until `shutdown` resolves, then drain.
    ///
    /// Once `shutdown` fires no new connections are accepted; requests still
    /// running after `drain_timeout` are abandoned.
    pub async fn serve<F>(
        &self,
        listener: TcpListener,
        router: Router,
        shutdown: F,
    ) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let (drain_tx, drain_rx) = oneshot::channel::<()>();
        let server = axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                shutdown.await;
                info!("stopped accepting connections; draining");
                let _ = drain_tx.send(());
            })
            .into_future();

        let drain_timeout = self.plan.drain_timeout;
        let deadline = async move {
            if drain_rx.await.is_ok() {
                tokio::time::sleep(drain_timeout).await;
            } else {
                std::future::pending::<()>().await;
            }
        };

        tokio::select! {
            res = server => {
                info!("server stopped");
                res
            }
            () = deadline => {
                warn!(
                    drain_timeout = ?drain_timeout,
                    "drain deadline elapsed; abandoning in-flight requests"
                );
                Ok(())
            }
        }
    }
}

/// Resolves on Ctrl-C or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "failed to install Ctrl-C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("received Ctrl-C, shutting down"),
        () = terminate => info!("received SIGTERM, shutting down"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(vars: &[(&str, &str)]) -> ServerConfig {
        ServerConfig::from_lookup(|key| {
            vars.iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string())
        })
        .unwrap()
    }

    #[test]
    fn plan_follows_port_and_workers() {
        let plan = ServePlan::from_config(&config(&[("APP_PORT", "9090"), ("WORKERS", "4")]));

        assert_eq!(plan.address(), "0.0.0.0:9090");
        assert_eq!(plan.workers.get(), 4);
        assert_eq!(plan.drain_timeout, Duration::from_secs(5));
    }

    #[test]
    fn runtime_has_one_thread_per_worker() {
        let runner = Runner::new(ServePlan::from_config(&config(&[("WORKERS", "4")])));
        let runtime = runner.runtime().unwrap();
        assert_eq!(runtime.metrics().num_workers(), 4);
    }

    #[tokio::test]
    async fn serve_returns_after_shutdown_with_no_inflight_requests() {
        let runner = Runner::new(ServePlan {
            host: "127.0.0.1".to_string(),
            port: 0,
            workers: NonZeroUsize::MIN,
            drain_timeout: Duration::from_secs(5),
        });
        let listener = runner.bind().await.unwrap();

        let started = std::time::Instant::now();
        runner
            .serve(listener, Router::new(), async {})
            .await
            .unwrap();
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}
