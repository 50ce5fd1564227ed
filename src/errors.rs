use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::{debug, error};

use crate::auth::AuthFailure;
use crate::store::StoreError;
use crate::validation::{normalize, ValidationErrors};

/// Status used when a course id has no match. Kept at 400 for compatibility
/// with existing clients.
pub const NOT_FOUND_STATUS: StatusCode = StatusCode::BAD_REQUEST;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Any authentication failure; the cause only reaches the logs.
    #[error("access denied")]
    Unauthorized,

    /// Authenticated, but not the owner of the resource.
    #[error("forbidden")]
    Forbidden,

    #[error("validation failed: {0:?}")]
    Validation(ValidationErrors),

    #[error("resource not found")]
    NotFound,

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<AuthFailure> for ApiError {
    fn from(err: AuthFailure) -> Self {
        match err {
            AuthFailure::NoCredentials | AuthFailure::UnknownUser | AuthFailure::BadPassword => {
                ApiError::Unauthorized
            }
            AuthFailure::Store(e) => e.into(),
            AuthFailure::Verify(e) => ApiError::Internal(e.into()),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match normalize(err) {
            Ok(errors) => ApiError::Validation(errors),
            Err(fatal) => ApiError::Internal(fatal),
        }
    }
}

/// Body failures are client-fixable: one message in the usual error list.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        let message = match &rejection {
            JsonRejection::JsonDataError(e) => {
                // "<fixed prefix>: <field path>: <serde message>"
                let text = e.body_text();
                let detail = text.split_once(": ").map_or(text.as_str(), |(_, d)| d);
                format!("Invalid request body: {detail}")
            }
            JsonRejection::JsonSyntaxError(_) => "Request body must be valid JSON.".to_string(),
            JsonRejection::MissingJsonContentType(_) => {
                "Request body must be sent as application/json.".to_string()
            }
            _ => "Request body could not be read.".to_string(),
        };
        debug!(status = %rejection.status(), error = %rejection.body_text(), "json body rejected");
        ApiError::Validation(ValidationErrors {
            errors: vec![message],
        })
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        debug!(error = %rejection.body_text(), "path rejected");
        ApiError::NotFound
    }
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound => NOT_FOUND_STATUS,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub(crate) fn internal_error_body() -> Json<serde_json::Value> {
    Json(json!({ "message": "Internal Server Error" }))
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        match self {
            ApiError::Unauthorized => {
                (status, Json(json!({ "message": "Access Denied" }))).into_response()
            }
            ApiError::Forbidden | ApiError::NotFound => status.into_response(),
            ApiError::Validation(errors) => {
                debug!(errors = ?errors.errors, "validation failed");
                (status, Json(errors)).into_response()
            }
            ApiError::Internal(e) => {
                error!("internal error: {:#}", e);
                (status, internal_error_body()).into_response()
            }
        }
    }
}
