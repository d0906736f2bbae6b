//! Providers: units of bootstrap behavior.
//!
//! Each provider owns one concern and describes it as a list of
//! [`Contribution`]s. The default [`Provider::apply`] feeds those
//! contributions to the handle; providers rarely need to override it.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::error::BootstrapResult;
use crate::error_kind::{standard_responders, ErrorKind, Responder};
use crate::handle::ApplicationHandle;
use crate::lifecycle::{LifecycleHook, Phase};
use crate::route::RouteGroup;

/// Concern a provider owns. Declaration order is application order.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ProviderKind {
    Routing,
    Lifecycle,
    ErrorMapping,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Routing => "routing",
            ProviderKind::Lifecycle => "lifecycle",
            ProviderKind::ErrorMapping => "error_mapping",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One registration a provider wants applied to the handle.
pub enum Contribution<R> {
    Route(RouteGroup<R>),
    Lifecycle(Phase, Arc<dyn LifecycleHook>),
    ErrorMapping(ErrorKind, Responder),
}

impl<R> Contribution<R> {
    pub fn label(&self) -> String {
        match self {
            Contribution::Route(group) => format!("route {}", group.prefix()),
            Contribution::Lifecycle(phase, hook) => format!("{phase} {}", hook.name()),
            Contribution::ErrorMapping(kind, _) => format!("error {kind}"),
        }
    }
}

/// A unit of bootstrap behavior applied to an [`ApplicationHandle`].
pub trait Provider<H: ApplicationHandle>: Send + Sync {
    fn kind(&self) -> ProviderKind;

    fn name(&self) -> &str {
        self.kind().as_str()
    }

    /// Registrations this provider makes, in the order they are applied.
    fn contributions(&self) -> Vec<Contribution<H::Routes>>;

    /// Apply every contribution; returns how many took effect.
    ///
    /// Contributions the handle already holds (same action name, same error
    /// kind) are not counted.
    fn apply(&self, handle: &mut H) -> BootstrapResult<usize> {
        let mut applied = 0;
        for contribution in self.contributions() {
            let label = contribution.label();
            let fresh = match contribution {
                Contribution::Route(group) => {
                    handle.mount(group)?;
                    true
                }
                Contribution::Lifecycle(phase, hook) => handle.add_lifecycle_hook(phase, hook),
                Contribution::ErrorMapping(kind, responder) => {
                    handle.add_error_mapping(kind, responder)
                }
            };
            debug!(provider = self.name(), contribution = %label, fresh, "contribution applied");
            if fresh {
                applied += 1;
            }
        }
        Ok(applied)
    }
}

type GroupFactory<R> = Arc<dyn Fn() -> Vec<RouteGroup<R>> + Send + Sync>;

/// Mounts the service's route groups.
pub struct RoutingProvider<R> {
    name: String,
    groups: GroupFactory<R>,
}

impl<R> RoutingProvider<R> {
    pub fn new<F>(name: impl Into<String>, groups: F) -> Self
    where
        F: Fn() -> Vec<RouteGroup<R>> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            groups: Arc::new(groups),
        }
    }
}

impl<H, R> Provider<H> for RoutingProvider<R>
where
    H: ApplicationHandle<Routes = R>,
{
    fn kind(&self) -> ProviderKind {
        ProviderKind::Routing
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn contributions(&self) -> Vec<Contribution<R>> {
        (self.groups)().into_iter().map(Contribution::Route).collect()
    }
}

/// Registers actions for the startup and shutdown phases.
#[derive(Default)]
pub struct LifecycleProvider {
    name: String,
    hooks: Vec<(Phase, Arc<dyn LifecycleHook>)>,
}

impl LifecycleProvider {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            hooks: Vec::new(),
        }
    }

    pub fn on_startup(mut self, hook: Arc<dyn LifecycleHook>) -> Self {
        self.hooks.push((Phase::Startup, hook));
        self
    }

    pub fn on_shutdown(mut self, hook: Arc<dyn LifecycleHook>) -> Self {
        self.hooks.push((Phase::Shutdown, hook));
        self
    }
}

impl<H: ApplicationHandle> Provider<H> for LifecycleProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Lifecycle
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn contributions(&self) -> Vec<Contribution<H::Routes>> {
        self.hooks
            .iter()
            .map(|(phase, hook)| Contribution::Lifecycle(*phase, hook.clone()))
            .collect()
    }
}

/// Registers error-kind responders, most specific kind first.
pub struct ErrorMappingProvider {
    responders: Vec<(ErrorKind, Responder)>,
}

impl ErrorMappingProvider {
    pub fn new(mut responders: Vec<(ErrorKind, Responder)>) -> Self {
        responders.sort_by_key(|(kind, _)| std::cmp::Reverse(kind.depth()));
        Self { responders }
    }

    /// Validation → 400, bad request → 400, everything else → 500.
    pub fn standard() -> Self {
        Self::new(standard_responders())
    }
}

impl<H: ApplicationHandle> Provider<H> for ErrorMappingProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::ErrorMapping
    }

    fn contributions(&self) -> Vec<Contribution<H::Routes>> {
        self.responders
            .iter()
            .map(|(kind, responder)| Contribution::ErrorMapping(*kind, responder.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BootstrapError;
    use crate::error_kind::{fixed_responder, ErrorCode};
    use crate::handle::InMemoryHandle;
    use crate::lifecycle::hook_fn;
    use crate::route::{Endpoint, Method};

    fn noop(name: &'static str) -> Arc<dyn LifecycleHook> {
        hook_fn(name, || async { Ok(()) })
    }

    #[test]
    fn routing_provider_mounts_every_group() {
        let provider = RoutingProvider::new("api", || {
            vec![
                RouteGroup::new("/api/v1", ())
                    .with_endpoint(Endpoint::new(Method::Get, "/billing/operations-history")),
                RouteGroup::new("/system", ()).with_endpoint(Endpoint::new(Method::Get, "/health")),
            ]
        });
        let mut handle = InMemoryHandle::new();

        let applied = Provider::<InMemoryHandle>::apply(&provider, &mut handle).unwrap();

        assert_eq!(applied, 2);
        let paths: Vec<String> = handle.route_table().endpoints().iter().map(|e| e.path.clone()).collect();
        assert_eq!(paths, vec!["/api/v1/billing/operations-history", "/system/health"]);
    }

    #[test]
    fn routing_provider_rejects_duplicate_prefix() {
        let provider = RoutingProvider::new("api", || {
            vec![RouteGroup::new("/api/v1", ()), RouteGroup::new("/api/v1", ())]
        });
        let mut handle = InMemoryHandle::new();

        let err = Provider::<InMemoryHandle>::apply(&provider, &mut handle).unwrap_err();
        assert!(matches!(err, BootstrapError::RoutingConflict { .. }));
    }

    #[test]
    fn lifecycle_provider_reapplication_is_a_no_op() {
        let provider = LifecycleProvider::new("connections")
            .on_startup(noop("connect-database"))
            .on_startup(noop("connect-cache"))
            .on_shutdown(noop("disconnect-database"));
        let mut handle = InMemoryHandle::new();

        assert_eq!(Provider::<InMemoryHandle>::apply(&provider, &mut handle).unwrap(), 3);
        assert_eq!(Provider::<InMemoryHandle>::apply(&provider, &mut handle).unwrap(), 0);

        assert_eq!(
            handle.lifecycle().names(Phase::Startup),
            vec!["connect-database", "connect-cache"]
        );
        assert_eq!(handle.lifecycle().names(Phase::Shutdown), vec!["disconnect-database"]);
    }

    #[test]
    fn error_mapping_contributions_are_most_specific_first() {
        let provider = ErrorMappingProvider::new(vec![
            (ErrorKind::Unclassified, fixed_responder(500, ErrorCode::InternalServerError)),
            (ErrorKind::Validation, fixed_responder(400, ErrorCode::UnprocessableEntity)),
        ]);

        let labels: Vec<String> = Provider::<InMemoryHandle>::contributions(&provider)
            .iter()
            .map(|c| c.label())
            .collect();
        assert_eq!(labels, vec!["error validation", "error unclassified"]);
    }

    #[test]
    fn standard_error_mapping_covers_every_kind() {
        let mut handle = InMemoryHandle::new();
        Provider::<InMemoryHandle>::apply(&ErrorMappingProvider::standard(), &mut handle).unwrap();

        for kind in ErrorKind::ALL {
            assert!(handle.error_table().contains(kind), "{kind}");
        }
    }
}
