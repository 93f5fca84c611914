//! Volunteer pickup and delivery route handlers.

use axum::{
    Json,
    extract::{Path, Query},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use replate_core::notice::Notice;
use replate_core::{DeliveryStatus, Donation, DonationId};

use crate::backend::{DeliveryUpdate, DonationFilter, GeoPoint};
use crate::dashboard::volunteer::PickupPosting;
use crate::error::{AppError, Result};
use crate::middleware::ClientPortal;

#[derive(Debug, Serialize)]
pub struct ActionResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub donation: Option<Donation>,
    pub notice: Notice,
}

/// Delivery progress form.
#[derive(Debug, Deserialize)]
pub struct DeliveryForm {
    pub status: DeliveryStatus,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub notes: Option<String>,
}

impl TryFrom<DeliveryForm> for DeliveryUpdate {
    type Error = AppError;

    fn try_from(form: DeliveryForm) -> Result<Self> {
        let location = match (form.latitude, form.longitude) {
            (Some(latitude), Some(longitude)) => Some(GeoPoint {
                latitude,
                longitude,
            }),
            (None, None) => None,
            _ => {
                return Err(AppError::BadRequest(
                    "latitude and longitude must be given together".to_string(),
                ));
            }
        };
        Ok(Self {
            status: form.status,
            location,
            notes: form.notes.filter(|n| !n.trim().is_empty()),
        })
    }
}

/// Food currently available for pickup.
pub async fn pickups(
    ClientPortal(portal): ClientPortal,
    Query(filter): Query<DonationFilter>,
) -> Result<Json<Vec<PickupPosting>>> {
    let dashboard = portal.dashboard()?;
    Ok(Json(dashboard.volunteer()?.available(filter, Utc::now()).await?))
}

#[instrument(skip_all, fields(donation_id = %id))]
pub async fn accept(
    ClientPortal(portal): ClientPortal,
    Path(id): Path<DonationId>,
) -> Result<Json<ActionResponse>> {
    let dashboard = portal.dashboard()?;
    let (donation, notice) = dashboard.volunteer()?.accept_pickup(id).await?;
    Ok(Json(ActionResponse {
        donation: Some(donation),
        notice,
    }))
}

#[instrument(skip_all, fields(donation_id = %id))]
pub async fn decline(
    ClientPortal(portal): ClientPortal,
    Path(id): Path<DonationId>,
) -> Result<Json<ActionResponse>> {
    let dashboard = portal.dashboard()?;
    let notice = dashboard.volunteer()?.decline_pickup(id).await?;
    Ok(Json(ActionResponse {
        donation: None,
        notice,
    }))
}

#[instrument(skip_all, fields(donation_id = %id))]
pub async fn update_delivery(
    ClientPortal(portal): ClientPortal,
    Path(id): Path<DonationId>,
    Json(form): Json<DeliveryForm>,
) -> Result<Json<ActionResponse>> {
    let update = DeliveryUpdate::try_from(form)?;
    let dashboard = portal.dashboard()?;
    let (donation, notice) = dashboard.volunteer()?.update_delivery(id, update).await?;
    Ok(Json(ActionResponse {
        donation: Some(donation),
        notice,
    }))
}
