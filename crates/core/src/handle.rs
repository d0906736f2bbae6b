//! The registration sink providers apply themselves to.

use std::sync::Arc;

use crate::error::BootstrapResult;
use crate::error_kind::{ErrorKind, ErrorTable, Responder};
use crate::lifecycle::{LifecycleHook, LifecycleRegistry, Phase};
use crate::route::{RouteGroup, RouteTable};

/// Narrow capability contract of the application being configured.
///
/// Implementations must make every registration idempotent: a lifecycle
/// action with a known name or an error mapping for a known kind replaces or
/// ignores rather than duplicates, and a repeated route prefix is rejected.
pub trait ApplicationHandle {
    /// Framework-specific representation of a group's routes.
    type Routes;

    fn mount(&mut self, group: RouteGroup<Self::Routes>) -> BootstrapResult<()>;

    /// Returns `false` if an action with the same name was already registered.
    fn add_lifecycle_hook(&mut self, phase: Phase, hook: Arc<dyn LifecycleHook>) -> bool;

    /// Returns `false` if `kind` already had a responder (which is replaced).
    fn add_error_mapping(&mut self, kind: ErrorKind, responder: Responder) -> bool;

    fn route_table(&self) -> &RouteTable;

    fn lifecycle(&self) -> &LifecycleRegistry;

    fn error_table(&self) -> &ErrorTable;
}

/// Handle that only records registrations.
///
/// Intended for tests and for inspecting what a provider set would register.
#[derive(Debug, Default)]
pub struct InMemoryHandle {
    routes: RouteTable,
    lifecycle: LifecycleRegistry,
    errors: ErrorTable,
}

impl InMemoryHandle {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ApplicationHandle for InMemoryHandle {
    type Routes = ();

    fn mount(&mut self, group: RouteGroup<()>) -> BootstrapResult<()> {
        let (manifest, ()) = group.into_parts();
        self.routes.mount(manifest)
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
