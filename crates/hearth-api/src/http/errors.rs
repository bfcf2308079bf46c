//! RFC9457-style API error wrapper.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use hearth_entity::PermissionDenied;

use crate::http::constants::{
    PROBLEM_BAD_REQUEST, PROBLEM_FORBIDDEN, PROBLEM_INTERNAL, PROBLEM_NOT_FOUND,
    PROBLEM_UNAUTHORIZED,
};
use crate::models::{DenialDetails, ProblemDetails};

/// Structured API error with optional RFC9457 fields.
#[derive(Debug)]
pub(crate) struct ApiError {
    pub(crate) status: StatusCode,
    kind: &'static str,
    title: &'static str,
    detail: Option<String>,
    denial: Option<DenialDetails>,
}

impl ApiError {
    const fn new(status: StatusCode, kind: &'static str, title: &'static str) -> Self {
        Self {
            status,
            kind,
            title,
            detail: None,
            denial: None,
        }
    }

    pub(crate) fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub(crate) fn internal(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            PROBLEM_INTERNAL,
            "internal server error",
        )
        .with_detail(message)
    }

    pub(crate) fn unauthorized(detail: impl Into<String>) -> Self {
        Self::new(
            StatusCode::UNAUTHORIZED,
            PROBLEM_UNAUTHORIZED,
            "authentication required",
        )
        .with_detail(detail)
    }

    pub(crate) fn bad_request(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, PROBLEM_BAD_REQUEST, "bad request").with_detail(detail)
    }

    pub(crate) fn not_found(detail: impl Into<String>) -> Self {
        Self::new(
            StatusCode::NOT_FOUND,
            PROBLEM_NOT_FOUND,
            "resource not found",
        )
        .with_detail(detail)
    }
}

impl From<PermissionDenied> for ApiError {
    /// A denial keeps its four fields machine-readable in the problem body.
    fn from(denied: PermissionDenied) -> Self {
        let mut error = Self::new(StatusCode::FORBIDDEN, PROBLEM_FORBIDDEN, "forbidden")
            .with_detail(denied.to_string());
        error.denial = Some(DenialDetails {
            user: denied.user,
            requested: denied.requested.to_string(),
            entity: denied.entity,
            granted: denied.granted.to_string(),
        });
        error
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ProblemDetails {
            kind: self.kind.to_string(),
            title: self.title.to_string(),
            status: self.status.as_u16(),
            detail: self.detail,
            denial: self.denial,
        };
        (self.status, Json(body)).into_response()
    }
}
