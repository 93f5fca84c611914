//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use replate_core::SessionError;
use replate_core::notice::Notice;

use crate::backend::BackendError;
use crate::dashboard::WorkflowError;
use crate::services::auth::AuthError;

/// Application-level error type for the portal.
#[derive(Debug, Error)]
pub enum AppError {
    /// Auth prompt submission failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Dashboard workflow failed.
    #[error("Workflow error: {0}")]
    Workflow(#[from] WorkflowError),

    /// Session model refused the transition.
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    notice: Option<Notice>,
}

const fn backend_status(err: &BackendError) -> StatusCode {
    match err {
        BackendError::Validation(_) => StatusCode::BAD_REQUEST,
        BackendError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        BackendError::Conflict(_) => StatusCode::CONFLICT,
        BackendError::NotFound(_) => StatusCode::NOT_FOUND,
        BackendError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        BackendError::Malformed(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Auth(err) => match err {
                AuthError::CredentialsRejected => StatusCode::UNAUTHORIZED,
                AuthError::PasswordMismatch
                | AuthError::InvalidEmail(_)
                | AuthError::MissingField(_)
                | AuthError::NoPrompt => StatusCode::BAD_REQUEST,
                AuthError::SubmissionInFlight | AuthError::Cancelled | AuthError::Session(_) => {
                    StatusCode::CONFLICT
                }
                AuthError::Backend(e) => backend_status(e),
            },
            Self::Workflow(err) => match err {
                WorkflowError::Validation(_) => StatusCode::BAD_REQUEST,
                WorkflowError::NotAuthenticated => StatusCode::UNAUTHORIZED,
                WorkflowError::InFlight
                | WorkflowError::ItemInFlight(_)
                | WorkflowError::Cancelled
                | WorkflowError::WrongDashboard { .. } => StatusCode::CONFLICT,
                WorkflowError::Backend(e) => backend_status(e),
            },
            Self::Session(_) => StatusCode::CONFLICT,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn notice(&self) -> Option<Notice> {
        match self {
            Self::Auth(err) => Some(err.notice()),
            Self::Workflow(err) => Some(err.notice()),
            _ => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        // Don't expose internal error details to clients
        let error = match &self {
            _ if status == StatusCode::INTERNAL_SERVER_ERROR => "Internal server error".to_string(),
            _ if status == StatusCode::SERVICE_UNAVAILABLE => {
                "Service temporarily unavailable".to_string()
            }
            Self::Auth(err) => err.to_string(),
            Self::Workflow(err) => err.to_string(),
            _ => self.to_string(),
        };

        let body = ErrorBody {
            error,
            notice: self.notice(),
        };
        (status, Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use http_body_util::BodyExt;
    use replate_core::{DonationId, Role};

    use super::*;

    fn get_status(err: impl Into<AppError>) -> StatusCode {
        err.into().into_response().status()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("donation 7".to_string());
        assert_eq!(err.to_string(), "Not found: donation 7");

        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(get_status(AuthError::CredentialsRejected), StatusCode::UNAUTHORIZED);
        assert_eq!(get_status(AuthError::PasswordMismatch), StatusCode::BAD_REQUEST);
        assert_eq!(
            get_status(WorkflowError::ItemInFlight(DonationId::new(1))),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(WorkflowError::Backend(BackendError::Conflict("taken".into()))),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(WorkflowError::Backend(BackendError::Unavailable("down".into()))),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            get_status(SessionError::AlreadyAuthenticated(Role::Staff)),
            StatusCode::CONFLICT
        );
        assert_eq!(get_status(WorkflowError::NotAuthenticated), StatusCode::UNAUTHORIZED);
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_body_carries_notice_but_not_internals() {
        let response =
            AppError::from(WorkflowError::Backend(BackendError::Malformed("row 3".into())))
                .into_response();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(body["error"], "Internal server error");
        assert_eq!(body["notice"]["title"], "Something went wrong");
    }

    #[tokio::test]
    async fn test_login_failure_body() {
        let response = AppError::from(AuthError::CredentialsRejected).into_response();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(body["error"], "invalid credentials");
        assert_eq!(body["notice"]["title"], "Login failed");
        assert_eq!(body["notice"]["tone"], "destructive");
    }
}
