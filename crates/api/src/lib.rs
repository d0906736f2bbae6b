//! HTTP API: application handle, providers, routes and the runner.

pub mod app;
pub mod runner;

pub use app::{build_app, providers, run, AxumApplication};
pub use runner::{shutdown_signal, Runner, ServePlan};
