use axum::extract::rejection::QueryRejection;
use axum::extract::Query;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;

use billing_core::{Endpoint, Method, RouteGroup};

use crate::app::errors::ApiError;

pub fn group() -> RouteGroup<Router> {
    let router = Router::new().route("/operations-history", get(operations_history));

    RouteGroup::new("/billing", router)
        .with_tag("billing")
        .with_endpoint(Endpoint::new(Method::Get, "/operations-history"))
}

#[derive(Debug, Deserialize)]
pub struct OperationsHistoryQuery {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

/// Billing operations history. Retrieval is not implemented yet.
pub async fn operations_history(
    query: Result<Query<OperationsHistoryQuery>, QueryRejection>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let Query(query) = query?;
    if query.limit == Some(0) {
        return Err(ApiError::bad_request("limit must be at least 1"));
    }

    tracing::debug!(limit = ?query.limit, offset = ?query.offset, "operations history requested");
    Err(ApiError::unclassified("operations history retrieval is not implemented"))
}
