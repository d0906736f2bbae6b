//! `billing-config`: environment-derived process configuration.
//!
//! Values are read once at startup, coerced into their semantic types, and
//! never mutated afterwards. A value that is present but cannot be parsed is a
//! hard error; missing values fall back to defaults.

pub mod error;
pub mod parse;
pub mod server;
pub mod sub;

pub use error::{ConfigError, ConfigResult};
pub use server::ServerConfig;
pub use sub::{AuthConfig, DbConfig};
