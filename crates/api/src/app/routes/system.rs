use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;

use billing_core::{Endpoint, Method, RouteGroup};

pub fn group() -> RouteGroup<Router> {
    RouteGroup::new("/system", Router::new().route("/health", get(health)))
        .with_tag("system")
        .with_endpoint(Endpoint::new(Method::Get, "/health"))
}

pub async fn health() -> StatusCode {
    StatusCode::OK
}
