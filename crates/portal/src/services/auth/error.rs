//! Authentication error types.

use thiserror::Error;

use replate_core::notice::Notice;
use replate_core::{EmailError, SessionError};

use crate::backend::BackendError;
use crate::services::task::TaskError;

/// Errors that can occur while submitting the auth prompt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// Credentials were missing or rejected.
    #[error("invalid credentials")]
    CredentialsRejected,

    /// Signup password and confirmation differ.
    #[error("passwords do not match")]
    PasswordMismatch,

    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// A required signup field is empty.
    #[error("{0} is required")]
    MissingField(&'static str),

    /// The same form is already being submitted.
    #[error("a submission is already in progress")]
    SubmissionInFlight,

    /// The prompt was closed or replaced before the submission finished.
    #[error("submission cancelled")]
    Cancelled,

    /// No auth prompt is open.
    #[error("no role selected")]
    NoPrompt,

    /// The session refused the identity.
    #[error("session error: {0}")]
    Session(#[from] SessionError),

    /// Identity backend error.
    #[error("backend error: {0}")]
    Backend(BackendError),
}

impl From<BackendError> for AuthError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::Unauthorized(_) => Self::CredentialsRejected,
            other => Self::Backend(other),
        }
    }
}

impl From<TaskError<BackendError>> for AuthError {
    fn from(err: TaskError<BackendError>) -> Self {
        match err {
            TaskError::Cancelled => Self::Cancelled,
            TaskError::Failed(e) => e.into(),
        }
    }
}

impl AuthError {
    /// The toast shown for this failure.
    #[must_use]
    pub fn notice(&self) -> Notice {
        match self {
            Self::CredentialsRejected => Notice::login_failed(),
            Self::PasswordMismatch => Notice::password_mismatch(),
            Self::InvalidEmail(_) => {
                Notice::error("Invalid email", "Please enter a valid email address.")
            }
            Self::MissingField(field) => {
                Notice::error("Missing information", format!("Please enter your {field}."))
            }
            Self::Backend(BackendError::Conflict(_)) => {
                Notice::signup_failed("An account with this email already exists.")
            }
            Self::SubmissionInFlight => {
                Notice::error("Please wait", "Your previous submission is still in progress.")
            }
            Self::Cancelled
            | Self::NoPrompt
            | Self::Session(_)
            | Self::Backend(_) => Notice::error(
                "Something went wrong",
                "Please try again.",
            ),
        }
    }
}
