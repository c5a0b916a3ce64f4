//! Error types for the filestore API layer.

use axum::Json;
use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use filestore_service::ServiceError;
use filestore_service::context::UnauthenticatedError;
use filestore_service::policy::PolicyError;
use filestore_types::InvalidPermissionError;
use serde::Serialize;
use thiserror::Error;

use crate::auth::AuthError;

/// Error type for API operations, encompassing service, auth, and request errors.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Errors from the service layer, including authorization decisions.
    #[error(transparent)]
    Service(#[from] ServiceError),

    /// Authentication errors.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// A permission string in the request is malformed.
    #[error(transparent)]
    Permission(#[from] InvalidPermissionError),

    /// The request body exceeds the upload limit of the server.
    #[error("{0}")]
    PayloadTooLarge(String),

    /// The request is malformed in some other way.
    #[error("{0}")]
    BadRequest(String),
}

/// Result type for API operations.
pub type ApiResult<T> = Result<T, ApiError>;

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(rejection: MultipartRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<MultipartError> for ApiError {
    fn from(error: MultipartError) -> Self {
        // The body limit surfaces while streaming fields, not in the rejection.
        if error.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::PayloadTooLarge(error.body_text())
        } else {
            ApiError::BadRequest(error.body_text())
        }
    }
}

/// The JSON body of an error response.
#[derive(Debug, Serialize)]
struct ErrorBody {
    message: String,
    code: u16,
    #[serde(rename = "type")]
    kind: &'static str,
}

impl ApiError {
    fn status_and_kind(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Service(err) => match err {
                ServiceError::ForbiddenRole(_) => (StatusCode::BAD_REQUEST, "forbidden_role"),
                ServiceError::ActionNotAllowed(_) => {
                    (StatusCode::BAD_REQUEST, "permission_action_invalid")
                }
                ServiceError::AccessDenied(_) => (StatusCode::UNAUTHORIZED, "user_unauthorized"),
                ServiceError::PrivilegedRequired => {
                    (StatusCode::UNAUTHORIZED, "privileged_required")
                }
                ServiceError::Policy(PolicyError::BucketDisabled(_)) => {
                    (StatusCode::BAD_REQUEST, "bucket_disabled")
                }
                ServiceError::Policy(PolicyError::FileTooLarge { .. }) => {
                    (StatusCode::BAD_REQUEST, "file_too_large")
                }
                ServiceError::Policy(PolicyError::ExtensionNotAllowed(_)) => {
                    (StatusCode::BAD_REQUEST, "extension_not_allowed")
                }
                ServiceError::Policy(PolicyError::BucketLimitTooLarge { .. }) => {
                    (StatusCode::BAD_REQUEST, "invalid_input")
                }
                ServiceError::InvalidId(_) => (StatusCode::BAD_REQUEST, "invalid_id"),
                ServiceError::InvalidInput(_) => (StatusCode::BAD_REQUEST, "invalid_input"),
                ServiceError::BucketNotFound(_) => (StatusCode::NOT_FOUND, "bucket_not_found"),
                ServiceError::FileNotFound(_) => (StatusCode::NOT_FOUND, "file_not_found"),
                ServiceError::BucketExists(_) => (StatusCode::CONFLICT, "bucket_already_exists"),
                ServiceError::FileExists(_) => (StatusCode::CONFLICT, "file_already_exists"),
                ServiceError::Backend(_) => (StatusCode::INTERNAL_SERVER_ERROR, "backend_error"),
            },
            ApiError::Auth(err) => match err {
                AuthError::BadRequest(_) => (StatusCode::BAD_REQUEST, "invalid_credentials"),
                AuthError::Unauthenticated(UnauthenticatedError::NoIdentity) => {
                    (StatusCode::UNAUTHORIZED, "unauthenticated")
                }
                AuthError::Unauthenticated(UnauthenticatedError::InvalidIdentity(_)) => {
                    (StatusCode::UNAUTHORIZED, "invalid_identity")
                }
                AuthError::InvalidApiKey => (StatusCode::UNAUTHORIZED, "invalid_api_key"),
                AuthError::ValidationFailure(_)
                | AuthError::UnknownKey(_)
                | AuthError::VerificationFailure => (StatusCode::UNAUTHORIZED, "invalid_session"),
            },
            ApiError::Permission(_) => (StatusCode::BAD_REQUEST, "invalid_permission"),
            ApiError::PayloadTooLarge(_) => (StatusCode::BAD_REQUEST, "file_too_large"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind) = self.status_and_kind();

        if status.is_server_error() {
            // Log server errors as they're unexpected
            tracing::error!(
                error = &self as &dyn std::error::Error,
                "error handling request"
            );
        } else {
            tracing::debug!(kind, "request failed: {self}");
        }

        let body = ErrorBody {
            message: self.to_string(),
            code: status.as_u16(),
            kind,
        };

        (status, Json(body)).into_response()
    }
}
