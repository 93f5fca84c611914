//! Admin dashboard route handlers.

use axum::{Json, extract::Path};
use chrono::Utc;

use replate_core::dashboard::AdminTab;

use crate::dashboard::admin::AdminTabView;
use crate::error::{AppError, Result};
use crate::middleware::ClientPortal;

/// Select an admin tab and return its contents.
pub async fn view_tab(
    ClientPortal(portal): ClientPortal,
    Path(tab): Path<String>,
) -> Result<Json<AdminTabView>> {
    let tab: AdminTab = tab.parse().map_err(AppError::NotFound)?;
    let dashboard = portal.dashboard()?;
    Ok(Json(dashboard.admin()?.view_tab(tab, Utc::now()).await?))
}
