//! `billing-core`: the application bootstrap registry.
//!
//! This crate is framework-agnostic: it knows how providers contribute routes,
//! lifecycle actions and error mappings to an [`ApplicationHandle`], and in
//! which order, but nothing about HTTP transport.

pub mod bootstrapper;
pub mod error;
pub mod error_kind;
pub mod handle;
pub mod lifecycle;
pub mod provider;
pub mod route;

pub use bootstrapper::{AppliedProvider, BootstrapReport, BootstrapState, Bootstrapper};
pub use error::{BootstrapError, BootstrapResult};
pub use error_kind::{
    fixed_responder, standard_responders, ErrorBody, ErrorCode, ErrorKind, ErrorResponse,
    ErrorTable, RaisedError, Responder,
};
pub use handle::{ApplicationHandle, InMemoryHandle};
pub use lifecycle::{hook_fn, FnHook, HookOutcome, LifecycleHook, LifecycleRegistry, Phase};
pub use provider::{
    Contribution, ErrorMappingProvider, LifecycleProvider, Provider, ProviderKind,
    RoutingProvider,
};
pub use route::{Endpoint, Method, RouteGroup, RouteManifest, RouteTable};
