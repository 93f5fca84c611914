//! Data-access contract for the dashboards.
//!
//! Dashboards never own data: they call a [`DonationBackend`] injected at
//! construction, so every dashboard sees the same donations and a claim made
//! on one is visible everywhere. Authentication goes through the separate
//! [`IdentityBackend`] seam.
//!
//! [`InMemoryBackend`] implements both traits; [`seed`] holds the demo
//! dataset it can start with.

pub mod memory;
pub mod seed;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use replate_core::{
    DeliveryStatus, Donation, DonationId, Email, Identity, NewDonation, Notification,
    NotificationId, PickupLocation, Role, Urgency, UserId,
};

use crate::services::task::Retryable;

pub use memory::InMemoryBackend;

/// Errors reported by a backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    /// The request was well-formed but breaks a rule.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The caller may not perform this operation.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Someone else got there first.
    #[error("conflict: {0}")]
    Conflict(String),

    #[error("not found: {0}")]
    NotFound(String),

    /// The backend could not be reached. Safe to retry.
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    /// The backend answered with something unusable. Not retried.
    #[error("malformed backend response: {0}")]
    Malformed(String),
}

impl Retryable for BackendError {
    fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

/// Narrowing for the volunteer's list of available food.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DonationFilter {
    pub urgency: Option<Urgency>,
    pub location: Option<PickupLocation>,
}

impl DonationFilter {
    #[must_use]
    pub fn matches(&self, donation: &Donation) -> bool {
        self.urgency.is_none_or(|u| donation.urgency == u)
            && self.location.is_none_or(|l| donation.location == l)
    }
}

/// A volunteer's reported position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

/// Delivery progress reported by the claiming volunteer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryUpdate {
    pub status: DeliveryStatus,
    #[serde(default)]
    pub location: Option<GeoPoint>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl DeliveryUpdate {
    #[must_use]
    pub const fn status(status: DeliveryStatus) -> Self {
        Self {
            status,
            location: None,
            notes: None,
        }
    }
}

/// One recorded delivery update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryTracking {
    pub donation_id: DonationId,
    pub volunteer_id: UserId,
    pub status: DeliveryStatus,
    pub location: Option<GeoPoint>,
    pub notes: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// A known user, as listed for the admin and for name lookups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub user_id: UserId,
    /// Organization for NGO volunteers, full name otherwise.
    pub display_name: String,
    pub email: Email,
    pub role: Role,
}

/// Login credentials.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: Email,
    pub password: SecretString,
}

/// Signup details.
#[derive(Debug, Clone)]
pub struct Registration {
    pub name: String,
    pub email: Email,
    pub password: SecretString,
    pub organization: Option<String>,
    pub phone: Option<String>,
}

/// Donation storage and the claim workflow.
#[async_trait]
pub trait DonationBackend: Send + Sync {
    /// Record a new pending donation logged by `staff_id`.
    async fn submit_donation(
        &self,
        staff_id: UserId,
        donation: NewDonation,
    ) -> Result<Donation, BackendError>;

    /// Pending donations matching `filter`, newest first.
    async fn list_available_donations(
        &self,
        filter: DonationFilter,
    ) -> Result<Vec<Donation>, BackendError>;

    /// Claim a pending donation. The first claim wins; later ones get
    /// [`BackendError::Conflict`].
    async fn claim_donation(
        &self,
        donation_id: DonationId,
        volunteer_id: UserId,
    ) -> Result<Donation, BackendError>;

    /// Give a held claim back, returning the donation to pending.
    async fn release_claim(
        &self,
        donation_id: DonationId,
        volunteer_id: UserId,
    ) -> Result<Donation, BackendError>;

    /// Move a claimed donation along its delivery lifecycle.
    async fn update_delivery_status(
        &self,
        donation_id: DonationId,
        volunteer_id: UserId,
        update: DeliveryUpdate,
    ) -> Result<Donation, BackendError>;

    /// Every donation, newest first.
    async fn list_donations(&self) -> Result<Vec<Donation>, BackendError>;

    async fn list_donations_by_staff(&self, staff_id: UserId)
    -> Result<Vec<Donation>, BackendError>;

    async fn list_donations_claimed_by(
        &self,
        volunteer_id: UserId,
    ) -> Result<Vec<Donation>, BackendError>;

    async fn list_tracking(
        &self,
        donation_id: DonationId,
    ) -> Result<Vec<DeliveryTracking>, BackendError>;

    /// A user's notifications, newest first.
    async fn list_notifications(&self, user_id: UserId)
    -> Result<Vec<Notification>, BackendError>;

    async fn mark_notification_read(
        &self,
        user_id: UserId,
        notification_id: NotificationId,
    ) -> Result<(), BackendError>;

    async fn user_directory(&self) -> Result<Vec<UserSummary>, BackendError>;
}

/// Credential checks and account creation.
#[async_trait]
pub trait IdentityBackend: Send + Sync {
    /// Check credentials for `role` and return the identity.
    async fn authenticate(
        &self,
        credentials: &Credentials,
        role: Role,
    ) -> Result<Identity, BackendError>;

    /// Record a profile and role assignment and return the identity.
    async fn register(
        &self,
        registration: &Registration,
        role: Role,
    ) -> Result<Identity, BackendError>;
}

pub type SharedDonationBackend = Arc<dyn DonationBackend>;
pub type SharedIdentityBackend = Arc<dyn IdentityBackend>;
