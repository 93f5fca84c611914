//! Landing surface route handlers.

use axum::{Json, extract::Path};
use tracing::instrument;

use replate_core::Role;

use crate::error::Result;
use crate::middleware::ClientPortal;
use crate::models::LandingView;
use crate::services::auth::AuthPromptView;

/// Display the landing surface, or where to go when already signed in.
pub async fn landing(ClientPortal(portal): ClientPortal) -> Json<LandingView> {
    Json(portal.landing())
}

/// Select a role card and open its auth prompt.
#[instrument(skip_all, fields(role = %role))]
pub async fn select_role(
    ClientPortal(portal): ClientPortal,
    Path(role): Path<Role>,
) -> Result<Json<AuthPromptView>> {
    Ok(Json(portal.select_role(role)?))
}
