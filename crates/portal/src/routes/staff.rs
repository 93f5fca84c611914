//! Staff food-logging route handlers.

use axum::Json;
use serde::Serialize;
use tracing::instrument;

use replate_core::notice::Notice;
use replate_core::{Donation, FoodLogDraft};

use crate::error::Result;
use crate::middleware::ClientPortal;

#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub donation: Donation,
    pub notice: Notice,
}

/// The food-log form as last saved.
pub async fn draft(ClientPortal(portal): ClientPortal) -> Result<Json<FoodLogDraft>> {
    let dashboard = portal.dashboard()?;
    Ok(Json(dashboard.staff()?.draft()))
}

/// Save the food-log form.
pub async fn update_draft(
    ClientPortal(portal): ClientPortal,
    Json(draft): Json<FoodLogDraft>,
) -> Result<Json<FoodLogDraft>> {
    let dashboard = portal.dashboard()?;
    let staff = dashboard.staff()?;
    staff.update_draft(draft);
    Ok(Json(staff.draft()))
}

/// Submit the saved draft as a donation.
#[instrument(skip_all)]
pub async fn submit(ClientPortal(portal): ClientPortal) -> Result<Json<SubmitResponse>> {
    let dashboard = portal.dashboard()?;
    let (donation, notice) = dashboard.staff()?.submit().await?;
    Ok(Json(SubmitResponse { donation, notice }))
}
