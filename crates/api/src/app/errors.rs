use std::any::Any;
use std::sync::Arc;

use axum::extract::rejection::QueryRejection;
use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::{debug, error};
use uuid::Uuid;

use billing_core::{ErrorKind, ErrorResponse, ErrorTable, RaisedError};

/// Failure raised while handling a request.
///
/// Handlers return this; the error-mapping layer turns it into the response
/// registered for its [`ErrorKind`].
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Unclassified(#[from] anyhow::Error),
}

impl ApiError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn unclassified(msg: impl std::fmt::Display + std::fmt::Debug + Send + Sync + 'static) -> Self {
        Self::Unclassified(anyhow::Error::msg(msg))
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::Validation(_) => ErrorKind::Validation,
            ApiError::BadRequest(_) => ErrorKind::BadRequest,
            ApiError::Unclassified(_) => ErrorKind::Unclassified,
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    /// Renders the catch-all response and attaches the raised error for the
    /// mapping layer to replace.
    fn into_response(self) -> Response {
        let raised = RaisedError::new(self.kind(), format!("{self:#}"));
        let mut response = render(&ErrorResponse::internal());
        response.extensions_mut().insert(raised);
        response
    }
}

/// Panic handler for `CatchPanicLayer`.
///
/// The panic becomes an unclassified failure, so `map_errors` renders and
/// logs it like any other.
pub fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(msg) = panic.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "non-string panic payload".to_string()
    };
    ApiError::unclassified(format!("handler panicked: {detail}")).into_response()
}

pub fn render(mapped: &ErrorResponse) -> Response {
    let status = StatusCode::from_u16(mapped.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, axum::Json(mapped.body.clone())).into_response()
}

/// Error-mapping middleware: replaces any response carrying a [`RaisedError`]
/// with the response its kind resolves to in `table`.
pub async fn map_errors(
    State(table): State<Arc<ErrorTable>>,
    req: Request,
    next: Next,
) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let mut response = next.run(req).await;

    let Some(raised) = response.extensions_mut().remove::<RaisedError>() else {
        return response;
    };

    let mapped = table.respond(&raised);
    if raised.kind.is_catch_all() || mapped.status >= 500 {
        let incident_id = Uuid::now_v7();
        error!(
            %incident_id,
            %method,
            path = %path,
            kind = %raised.kind,
            status = mapped.status,
            detail = %raised.detail,
            "unhandled request failure"
        );
    } else {
        debug!(
            %method,
            path = %path,
            kind = %raised.kind,
            status = mapped.status,
            detail = %raised.detail,
            "request failure mapped"
        );
    }

    render(&mapped)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_follow_variants() {
        assert_eq!(ApiError::validation("x").kind(), ErrorKind::Validation);
        assert_eq!(ApiError::bad_request("x").kind(), ErrorKind::BadRequest);
        assert_eq!(ApiError::unclassified("x").kind(), ErrorKind::Unclassified);
    }

    #[test]
    fn unmapped_response_is_a_generic_500_with_the_raised_error_attached() {
        let response = ApiError::unclassified("database exploded").into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let raised = response.extensions().get::<RaisedError>().unwrap();
        assert_eq!(raised.kind, ErrorKind::Unclassified);
        assert_eq!(raised.detail, "database exploded");
    }

    #[test]
    fn panic_payload_becomes_unclassified_failure() {
        let response = panic_response(Box::new("index out of bounds"));

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let raised = response.extensions().get::<RaisedError>().unwrap();
        assert_eq!(raised.kind, ErrorKind::Unclassified);
        assert_eq!(raised.detail, "handler panicked: index out of bounds");

        let response = panic_response(Box::new(format!("ledger {} missing", 7)));
        let raised = response.extensions().get::<RaisedError>().unwrap();
        assert_eq!(raised.detail, "handler panicked: ledger 7 missing");
    }

    #[test]
    fn render_uses_mapped_status() {
        let table = ErrorTable::standard();
        let mapped = table.respond(&RaisedError::new(ErrorKind::Validation, "limit"));
        assert_eq!(render(&mapped).status(), StatusCode::BAD_REQUEST);
    }
}
