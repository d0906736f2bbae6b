//! Error kinds and the kind-to-responder table.
//!
//! Per-request failures are classified into a closed set of [`ErrorKind`]s.
//! Kinds form a single-parent hierarchy rooted at [`ErrorKind::Unclassified`],
//! the catch-all. Resolution walks from the raised kind toward the root and
//! uses the first kind that has a registered responder, so a specific
//! failure never falls through to a broader responder while its own is
//! registered.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;

/// Classified category of a per-request failure.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ErrorKind {
    /// Request input failed validation (malformed query, body, path).
    Validation,
    /// The request is unacceptable for a reason other than validation.
    BadRequest,
    /// Anything else. Root of the hierarchy.
    Unclassified,
}

impl ErrorKind {
    pub const ALL: [ErrorKind; 3] = [
        ErrorKind::Validation,
        ErrorKind::BadRequest,
        ErrorKind::Unclassified,
    ];

    /// Nearest broader kind, `None` for the catch-all.
    pub fn parent(self) -> Option<ErrorKind> {
        match self {
            ErrorKind::Validation => Some(ErrorKind::BadRequest),
            ErrorKind::BadRequest => Some(ErrorKind::Unclassified),
            ErrorKind::Unclassified => None,
        }
    }

    /// This kind followed by each ancestor up to the catch-all.
    pub fn lineage(self) -> impl Iterator<Item = ErrorKind> {
        std::iter::successors(Some(self), |k| k.parent())
    }

    /// Distance from the catch-all (catch-all is 0).
    pub fn depth(self) -> usize {
        self.lineage().count() - 1
    }

    pub fn is_catch_all(self) -> bool {
        self.parent().is_none()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::BadRequest => "bad_request",
            ErrorKind::Unclassified => "unclassified",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Machine-readable code returned to clients.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    BadRequest,
    InternalServerError,
    UnprocessableEntity,
}

/// JSON body of a mapped error. Carries the code only, never the detail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    pub code: ErrorCode,
}

/// Status code plus body produced by a responder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorResponse {
    pub status: u16,
    pub body: ErrorBody,
}

impl ErrorResponse {
    pub fn new(status: u16, code: ErrorCode) -> Self {
        Self {
            status,
            body: ErrorBody { code },
        }
    }

    /// Response used when nothing in the table matches.
    pub fn internal() -> Self {
        Self::new(500, ErrorCode::InternalServerError)
    }
}

/// A failure raised while handling a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RaisedError {
    pub kind: ErrorKind,
    /// Internal detail, for logs only.
    pub detail: String,
}

impl RaisedError {
    pub fn new(kind: ErrorKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }
}

/// Turns a raised error into a response.
pub type Responder = Arc<dyn Fn(&RaisedError) -> ErrorResponse + Send + Sync>;

/// Responder that always answers with the same status and code.
pub fn fixed_responder(status: u16, code: ErrorCode) -> Responder {
    Arc::new(move |_err: &RaisedError| ErrorResponse::new(status, code))
}

/// Registered responders, keyed by kind.
#[derive(Clone, Default)]
pub struct ErrorTable {
    responders: BTreeMap<ErrorKind, Responder>,
}

impl ErrorTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// The service's standard mapping.
    pub fn standard() -> Self {
        let mut table = Self::new();
        for (kind, responder) in standard_responders() {
            table.register(kind, responder);
        }
        table
    }

    /// Register (or replace) the responder for `kind`.
    ///
    /// Returns `true` when the kind had no responder before.
    pub fn register(&mut self, kind: ErrorKind, responder: Responder) -> bool {
        self.responders.insert(kind, responder).is_none()
    }

    pub fn contains(&self, kind: ErrorKind) -> bool {
        self.responders.contains_key(&kind)
    }

    pub fn len(&self) -> usize {
        self.responders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.responders.is_empty()
    }

    /// Most specific registered kind covering `kind`.
    pub fn resolve(&self, kind: ErrorKind) -> Option<(ErrorKind, &Responder)> {
        kind.lineage()
            .find_map(|k| self.responders.get(&k).map(|r| (k, r)))
    }

    /// Map a raised error to a response, falling back to a plain 500.
    pub fn respond(&self, err: &RaisedError) -> ErrorResponse {
        match self.resolve(err.kind) {
            Some((_, responder)) => responder(err),
            None => ErrorResponse::internal(),
        }
    }
}

impl fmt::Debug for ErrorTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorTable")
            .field("kinds", &self.responders.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Standard responders, most specific kind first.
pub fn standard_responders() -> Vec<(ErrorKind, Responder)> {
    let mut entries = vec![
        (ErrorKind::Unclassified, fixed_responder(500, ErrorCode::InternalServerError)),
        (ErrorKind::Validation, fixed_responder(400, ErrorCode::UnprocessableEntity)),
        (ErrorKind::BadRequest, fixed_responder(400, ErrorCode::BadRequest)),
    ];
    entries.sort_by_key(|(kind, _)| std::cmp::Reverse(kind.depth()));
    entries
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn lineage_ends_at_catch_all() {
        let lineage: Vec<_> = ErrorKind::Validation.lineage().collect();
        assert_eq!(
            lineage,
            vec![ErrorKind::Validation, ErrorKind::BadRequest, ErrorKind::Unclassified]
        );
        assert!(ErrorKind::Unclassified.is_catch_all());
        assert_eq!(ErrorKind::Unclassified.depth(), 0);
        assert_eq!(ErrorKind::Validation.depth(), 2);
    }

    #[test]
    fn validation_maps_to_400_unprocessable_entity() {
        let table = ErrorTable::standard();
        let res = table.respond(&RaisedError::new(ErrorKind::Validation, "limit: invalid digit"));
        assert_eq!(res.status, 400);
        assert_eq!(serde_json::to_value(&res.body).unwrap(), json!({"code": "UNPROCESSABLE_ENTITY"}));
    }

    #[test]
    fn unclassified_maps_to_500_internal_server_error() {
        let table = ErrorTable::standard();
        let res = table.respond(&RaisedError::new(ErrorKind::Unclassified, "boom"));
        assert_eq!(res.status, 500);
        assert_eq!(serde_json::to_value(&res.body).unwrap(), json!({"code": "INTERNAL_SERVER_ERROR"}));
    }

    #[test]
    fn unregistered_kind_falls_back_to_nearest_ancestor() {
        let mut table = ErrorTable::new();
        table.register(ErrorKind::BadRequest, fixed_responder(400, ErrorCode::BadRequest));
        table.register(ErrorKind::Unclassified, fixed_responder(500, ErrorCode::InternalServerError));

        let (resolved, _) = table.resolve(ErrorKind::Validation).unwrap();
        assert_eq!(resolved, ErrorKind::BadRequest);
        let res = table.respond(&RaisedError::new(ErrorKind::Validation, "bad"));
        assert_eq!(res, ErrorResponse::new(400, ErrorCode::BadRequest));
    }

    #[test]
    fn specific_kind_wins_regardless_of_registration_order() {
        let mut table = ErrorTable::new();
        table.register(ErrorKind::Unclassified, fixed_responder(500, ErrorCode::InternalServerError));
        table.register(ErrorKind::Validation, fixed_responder(400, ErrorCode::UnprocessableEntity));

        let res = table.respond(&RaisedError::new(ErrorKind::Validation, "bad"));
        assert_eq!(res.body.code, ErrorCode::UnprocessableEntity);
    }

    #[test]
    fn empty_table_still_answers_500() {
        let res = ErrorTable::new().respond(&RaisedError::new(ErrorKind::Validation, "x"));
        assert_eq!(res, ErrorResponse::internal());
    }

    #[test]
    fn reregistering_replaces_instead_of_duplicating() {
        let mut table = ErrorTable::standard();
        assert!(!table.register(ErrorKind::Validation, fixed_responder(422, ErrorCode::UnprocessableEntity)));
        assert_eq!(table.len(), 3);
        let res = table.respond(&RaisedError::new(ErrorKind::Validation, "x"));
        assert_eq!(res.status, 422);
    }

    #[test]
    fn standard_responders_are_most_specific_first() {
        let kinds: Vec<_> = standard_responders().into_iter().map(|(k, _)| k).collect();
        assert_eq!(
            kinds,
            vec![ErrorKind::Validation, ErrorKind::BadRequest, ErrorKind::Unclassified]
        );
    }
}
