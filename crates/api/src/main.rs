use std::process::ExitCode;

use billing_config::ServerConfig;
use billing_observability::LogFormat;

use billing_api::{shutdown_signal, Runner, ServePlan};

fn main() -> ExitCode {
    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            billing_observability::init(LogFormat::Json);
            tracing::error!(error = %e, "invalid configuration");
            return ExitCode::FAILURE;
        }
    };
    billing_observability::init(LogFormat::for_debug(config.debug));
    tracing::info!(
        title = %config.title,
        address = %config.bind_address(),
        workers = config.workers.get(),
        debug = config.debug,
        db = %serde_json::to_string(&config.db).unwrap_or_default(),
        auth = %serde_json::to_string(&config.auth).unwrap_or_default(),
        "starting"
    );

    let runner = Runner::new(ServePlan::from_config(&config));
    let runtime = match runner.runtime() {
        Ok(runtime) => runtime,
        Err(e) => {
            tracing::error!(error = %e, "failed to build async runtime");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(billing_api::run(config, runner, shutdown_signal())) {
        Ok(()) => {
            tracing::info!("shut down cleanly");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "billing service failed");
            ExitCode::FAILURE
        }
    }
}
