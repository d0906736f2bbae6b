use axum::Router;

use billing_core::RouteGroup;

pub mod billing;
pub mod system;

/// Every route group the service exposes.
pub fn groups() -> Vec<RouteGroup<Router>> {
    vec![v1(), system::group()]
}

/// `/api/v1`: versioned business endpoints.
pub fn v1() -> RouteGroup<Router> {
    let (billing, billing_routes) = billing::group().into_parts();

    let router = Router::new().nest(&billing.prefix, billing_routes);
    let mut group = RouteGroup::new("/api/v1", router)
        .with_endpoints_under(&billing.prefix, &billing.endpoints);
    for tag in billing.tags {
        group = group.with_tag(tag);
    }
    group
}
