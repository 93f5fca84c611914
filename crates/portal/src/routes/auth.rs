//! Authentication route handlers.

use axum::{Json, http::StatusCode};
use serde::Serialize;
use tracing::instrument;

use replate_core::Identity;

use crate::error::Result;
use crate::middleware::ClientPortal;
use crate::models::AuthOutcome;
use crate::services::auth::{AuthPromptView, LoginForm, SignupForm};

#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    /// Who was signed out; absent when nobody was.
    pub signed_out: Option<Identity>,
}

/// Display the open auth prompt.
pub async fn prompt(ClientPortal(portal): ClientPortal) -> Result<Json<AuthPromptView>> {
    Ok(Json(portal.prompt()?))
}

/// Dismiss the auth prompt.
pub async fn close_prompt(ClientPortal(portal): ClientPortal) -> StatusCode {
    portal.close_prompt();
    StatusCode::NO_CONTENT
}

/// Handle login form submission.
#[instrument(skip_all)]
pub async fn login(
    ClientPortal(portal): ClientPortal,
    Json(form): Json<LoginForm>,
) -> Result<Json<AuthOutcome>> {
    Ok(Json(portal.login(form).await?))
}

/// Handle signup form submission.
#[instrument(skip_all)]
pub async fn signup(
    ClientPortal(portal): ClientPortal,
    Json(form): Json<SignupForm>,
) -> Result<Json<AuthOutcome>> {
    Ok(Json(portal.signup(form).await?))
}

/// Handle logout.
#[instrument(skip_all)]
pub async fn logout(ClientPortal(portal): ClientPortal) -> Json<LogoutResponse> {
    Json(LogoutResponse {
        signed_out: portal.logout(),
    })
}
