//! Signed-in shell: navigation, dashboard snapshot and notifications.

use axum::{Json, extract::Path, http::StatusCode};
use chrono::Utc;

use replate_core::{Notification, NotificationId};

use crate::dashboard::DashboardSnapshot;
use crate::error::Result;
use crate::middleware::ClientPortal;
use crate::models::NavView;

/// Navigation shell for the signed-in user.
pub async fn nav(ClientPortal(portal): ClientPortal) -> Result<Json<NavView>> {
    Ok(Json(portal.nav().await?))
}

/// The routed dashboard's current contents.
pub async fn snapshot(ClientPortal(portal): ClientPortal) -> Result<Json<DashboardSnapshot>> {
    let dashboard = portal.dashboard()?;
    Ok(Json(dashboard.snapshot(Utc::now()).await?))
}

pub async fn notifications(ClientPortal(portal): ClientPortal) -> Result<Json<Vec<Notification>>> {
    Ok(Json(portal.notifications().await?))
}

pub async fn mark_read(
    ClientPortal(portal): ClientPortal,
    Path(id): Path<NotificationId>,
) -> Result<StatusCode> {
    portal.mark_notification_read(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
