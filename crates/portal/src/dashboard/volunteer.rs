//! Volunteer dashboard: claim posted food and report delivery progress.

use chrono::{DateTime, Datelike, Utc};
use serde::Serialize;

use replate_core::notice::Notice;
use replate_core::time::time_ago;
use replate_core::{
    DeliveryStatus, DietaryFlags, Donation, DonationId, FoodType, PickupLocation, Tone, Urgency,
};

use super::{Scope, WorkflowError, percent};
use crate::backend::{DeliveryUpdate, DonationFilter};
use crate::services::task::{InFlightSet, KeyGuard, retry};

const RECENT_ACTIVITY: usize = 5;

pub struct VolunteerDashboard {
    pub(super) scope: Scope,
    /// Donations with an accept, decline or delivery update still running.
    pending: InFlightSet<DonationId>,
}

/// A posting as shown in the available-food list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PickupPosting {
    pub id: DonationId,
    pub food_type: FoodType,
    pub food_label: &'static str,
    pub quantity: String,
    pub location: PickupLocation,
    pub location_label: &'static str,
    pub pickup_time: String,
    pub urgency: Urgency,
    pub urgency_label: &'static str,
    pub urgency_tone: Tone,
    pub posted: String,
    pub description: Option<String>,
    pub image: Option<String>,
    pub dietary: DietaryFlags,
    pub allergens: Vec<String>,
    /// An action on this posting is running; its buttons are disabled.
    pub in_flight: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VolunteerStats {
    pub pickups_this_month: usize,
    pub meals_delivered: u32,
    /// Delivered share of everything claimed, `None` before the first claim.
    pub success_rate: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivityItem {
    pub id: DonationId,
    pub action: String,
    pub quantity: String,
    pub location: &'static str,
    pub status: DeliveryStatus,
    pub time: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct VolunteerSnapshot {
    pub available: Vec<PickupPosting>,
    pub stats: VolunteerStats,
    pub recent_activity: Vec<ActivityItem>,
}

fn activity_action(donation: &Donation) -> String {
    let food = donation.food_type.label();
    match donation.status {
        DeliveryStatus::Delivered => format!("Delivered {food}"),
        DeliveryStatus::InTransit => format!("Picked up {food}"),
        DeliveryStatus::Accepted => format!("Accepted {food} pickup"),
        DeliveryStatus::Cancelled => format!("Cancelled {food} pickup"),
        DeliveryStatus::Pending => format!("Released {food} pickup"),
    }
}

impl VolunteerDashboard {
    pub(super) fn new(scope: Scope) -> Self {
        Self {
            scope,
            pending: InFlightSet::default(),
        }
    }

    fn begin(&self, id: DonationId) -> Result<KeyGuard<DonationId>, WorkflowError> {
        self.pending
            .try_begin(id)
            .ok_or(WorkflowError::ItemInFlight(id))
    }

    /// Whether an action on `id` is still running.
    #[must_use]
    pub fn is_in_flight(&self, id: DonationId) -> bool {
        self.pending.contains(&id)
    }

    /// Pending postings matching `filter`, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::Backend`] if the backend cannot be read.
    pub async fn available(
        &self,
        filter: DonationFilter,
        now: DateTime<Utc>,
    ) -> Result<Vec<PickupPosting>, WorkflowError> {
        let donations = self
            .scope
            .backend()
            .list_available_donations(filter)
            .await?;

        Ok(donations
            .into_iter()
            .map(|d| PickupPosting {
                id: d.id,
                food_type: d.food_type,
                food_label: d.food_type.label(),
                location: d.location,
                location_label: d.location.label(),
                pickup_time: d.pickup_time.display(),
                urgency: d.urgency,
                urgency_label: d.urgency.label(),
                urgency_tone: d.urgency.tone(),
                posted: time_ago(d.created_at, now),
                in_flight: self.is_in_flight(d.id),
                quantity: d.quantity,
                description: d.description,
                image: d.image,
                dietary: d.dietary,
                allergens: d.allergens,
            })
            .collect())
    }

    /// Claim a posting.
    ///
    /// Only `id` is locked while the claim runs; other postings stay
    /// actionable. The success notice is returned exactly once.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::ItemInFlight`] while another action on `id`
    /// runs, [`WorkflowError::Cancelled`] if the dashboard closes first, or
    /// a backend error. A posting someone else claimed first surfaces as
    /// [`BackendError::Conflict`](crate::backend::BackendError::Conflict).
    #[tracing::instrument(skip(self), fields(volunteer_id = %self.scope.user_id()))]
    pub async fn accept_pickup(&self, id: DonationId) -> Result<(Donation, Notice), WorkflowError> {
        let _busy = self.begin(id)?;

        let backend = self.scope.backend();
        let volunteer_id = self.scope.user_id();
        let donation = self
            .scope
            .settings
            .perform(&self.scope.cancel, move || {
                backend.claim_donation(id, volunteer_id)
            })
            .await?;

        Ok((donation, Notice::pickup_accepted()))
    }

    /// Decline a posting.
    ///
    /// Declining an unclaimed posting only dismisses it locally; it stays
    /// available to everyone. Declining a posting this volunteer accepted
    /// hands it back.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::ItemInFlight`] while another action on `id`
    /// runs, or a backend error from the retraction.
    #[tracing::instrument(skip(self), fields(volunteer_id = %self.scope.user_id()))]
    pub async fn decline_pickup(&self, id: DonationId) -> Result<Notice, WorkflowError> {
        let _busy = self.begin(id)?;

        let backend = self.scope.backend();
        let volunteer_id = self.scope.user_id();
        let holds_claim = backend
            .list_donations_claimed_by(volunteer_id)
            .await?
            .iter()
            .any(|d| d.id == id && d.status == DeliveryStatus::Accepted);

        if holds_claim {
            retry(&self.scope.settings.retry, &self.scope.cancel, move || {
                backend.release_claim(id, volunteer_id)
            })
            .await?;
            tracing::info!(donation_id = %id, "Claim released");
        }

        Ok(Notice::pickup_declined())
    }

    /// Report progress on a claimed donation.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::ItemInFlight`] while another action on `id`
    /// runs, [`WorkflowError::Cancelled`] if the dashboard closes first, or
    /// a backend error for an illegal move or a donation held by someone
    /// else.
    #[tracing::instrument(skip(self, update), fields(volunteer_id = %self.scope.user_id(), status = %update.status))]
    pub async fn update_delivery(
        &self,
        id: DonationId,
        update: DeliveryUpdate,
    ) -> Result<(Donation, Notice), WorkflowError> {
        let _busy = self.begin(id)?;

        let backend = self.scope.backend();
        let volunteer_id = self.scope.user_id();
        let update = &update;
        let donation = self
            .scope
            .settings
            .perform(&self.scope.cancel, move || {
                backend.update_delivery_status(id, volunteer_id, update.clone())
            })
            .await?;

        let notice = Notice::delivery_updated(donation.status.staff_label());
        Ok((donation, notice))
    }

    /// # Errors
    ///
    /// Returns [`WorkflowError::Backend`] if the backend cannot be read.
    pub async fn snapshot(&self, now: DateTime<Utc>) -> Result<VolunteerSnapshot, WorkflowError> {
        let available = self.available(DonationFilter::default(), now).await?;
        let claimed = self
            .scope
            .backend()
            .list_donations_claimed_by(self.scope.user_id())
            .await?;

        let delivered: Vec<&Donation> = claimed
            .iter()
            .filter(|d| d.status == DeliveryStatus::Delivered)
            .collect();
        let stats = VolunteerStats {
            pickups_this_month: claimed
                .iter()
                .filter(|d| {
                    d.updated_at.year() == now.year() && d.updated_at.month() == now.month()
                })
                .count(),
            meals_delivered: delivered
                .iter()
                .filter_map(|d| d.quantity_numeric)
                .sum(),
            success_rate: percent(delivered.len(), claimed.len()),
        };

        let recent_activity = claimed
            .iter()
            .take(RECENT_ACTIVITY)
            .map(|d| ActivityItem {
                id: d.id,
                action: activity_action(d),
                quantity: d.quantity.clone(),
                location: d.location.label(),
                status: d.status,
                time: time_ago(d.updated_at, now),
            })
            .collect();

        Ok(VolunteerSnapshot {
            available,
            stats,
            recent_activity,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use replate_core::{FoodLogDraft, PickupTime, Role};
    use tokio::time::Instant;

    use super::*;
    use crate::backend::{BackendError, DonationBackend, InMemoryBackend};
    use crate::dashboard::Dashboard;
    use crate::dashboard::tests::{LATENCY, open_for};

    async fn post(staff: &Dashboard, quantity: &str) -> DonationId {
        let staff = staff.staff().unwrap();
        staff.update_draft(FoodLogDraft {
            food_type: Some(FoodType::Bread),
            quantity: quantity.to_string(),
            pickup_time: PickupTime::from_hm(16, 0),
            location: Some(PickupLocation::HostelMess),
            urgency: Some(Urgency::Low),
            ..FoodLogDraft::default()
        });
        staff.submit().await.unwrap().0.id
    }

    #[tokio::test(start_paused = true)]
    async fn test_accept_locks_only_that_posting() {
        let backend = Arc::new(InMemoryBackend::new());
        let staff = open_for(&backend, "s@x.com", Role::Staff, "s");
        let dashboard = open_for(&backend, "v@x.com", Role::Volunteer, "v");
        let volunteer = dashboard.volunteer().unwrap();
        let first = post(&staff, "12 pieces").await;
        let second = post(&staff, "4 pieces").await;

        let start = Instant::now();
        let (accepted, repeated, other) = tokio::join!(
            volunteer.accept_pickup(first),
            async {
                tokio::task::yield_now().await;
                assert!(volunteer.is_in_flight(first));
                assert!(!volunteer.is_in_flight(second));
                volunteer.accept_pickup(first).await
            },
            async {
                tokio::task::yield_now().await;
                volunteer.decline_pickup(second).await
            },
        );

        let (donation, notice) = accepted.unwrap();
        assert!(start.elapsed() >= LATENCY);
        assert_eq!(donation.status, DeliveryStatus::Accepted);
        assert_eq!(notice.title, "Pickup accepted!");
        assert_eq!(repeated.unwrap_err(), WorkflowError::ItemInFlight(first));
        assert_eq!(other.unwrap().title, "Pickup declined");
        assert!(!volunteer.is_in_flight(first));
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_claim_wins_between_volunteers() {
        let backend = Arc::new(InMemoryBackend::new());
        let staff = open_for(&backend, "s@x.com", Role::Staff, "s");
        let a = open_for(&backend, "a@x.com", Role::Volunteer, "a");
        let b = open_for(&backend, "b@x.com", Role::Volunteer, "b");
        let id = post(&staff, "8 portions").await;

        let (first, second) = tokio::join!(
            a.volunteer().unwrap().accept_pickup(id),
            b.volunteer().unwrap().accept_pickup(id),
        );

        assert!(first.is_ok());
        assert!(matches!(
            second.unwrap_err(),
            WorkflowError::Backend(BackendError::Conflict(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_decline_keeps_posting_available() {
        let backend = Arc::new(InMemoryBackend::new());
        let staff = open_for(&backend, "s@x.com", Role::Staff, "s");
        let dashboard = open_for(&backend, "v@x.com", Role::Volunteer, "v");
        let volunteer = dashboard.volunteer().unwrap();
        let id = post(&staff, "12 pieces").await;

        let start = Instant::now();
        let notice = volunteer.decline_pickup(id).await.unwrap();
        assert_eq!(start.elapsed(), Duration::ZERO);
        assert_eq!(notice.tone, Tone::Muted);

        let available = volunteer
            .available(DonationFilter::default(), Utc::now())
            .await
            .unwrap();
        assert_eq!(available.len(), 1);
        assert_eq!(available[0].posted, "Just now");
    }

    #[tokio::test(start_paused = true)]
    async fn test_decline_after_accept_releases_claim() {
        let backend = Arc::new(InMemoryBackend::new());
        let staff = open_for(&backend, "s@x.com", Role::Staff, "s");
        let dashboard = open_for(&backend, "v@x.com", Role::Volunteer, "v");
        let volunteer = dashboard.volunteer().unwrap();
        let id = post(&staff, "12 pieces").await;

        volunteer.accept_pickup(id).await.unwrap();
        volunteer.decline_pickup(id).await.unwrap();

        let available = backend
            .list_available_donations(DonationFilter::default())
            .await
            .unwrap();
        assert_eq!(available.len(), 1);
        assert_eq!(available[0].accepted_by, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_delivery_updates_feed_stats() {
        let backend = Arc::new(InMemoryBackend::new());
        let staff = open_for(&backend, "s@x.com", Role::Staff, "s");
        let dashboard = open_for(&backend, "v@x.com", Role::Volunteer, "v");
        let volunteer = dashboard.volunteer().unwrap();
        let delivered = post(&staff, "12 pieces").await;
        let held = post(&staff, "3 trays").await;

        volunteer.accept_pickup(delivered).await.unwrap();
        volunteer.accept_pickup(held).await.unwrap();
        volunteer
            .update_delivery(delivered, DeliveryUpdate::status(DeliveryStatus::InTransit))
            .await
            .unwrap();
        let (_, notice) = volunteer
            .update_delivery(delivered, DeliveryUpdate::status(DeliveryStatus::Delivered))
            .await
            .unwrap();
        assert_eq!(notice.title, "Delivery updated");

        let snapshot = volunteer.snapshot(Utc::now()).await.unwrap();
        assert!(snapshot.available.is_empty());
        assert_eq!(snapshot.stats.pickups_this_month, 2);
        assert_eq!(snapshot.stats.meals_delivered, 12);
        assert_eq!(snapshot.stats.success_rate, Some(50));

        let actions: Vec<&str> = snapshot
            .recent_activity
            .iter()
            .map(|a| a.action.as_str())
            .collect();
        assert!(actions.contains(&"Delivered Bread & Sandwiches"));
        assert!(actions.contains(&"Accepted Bread & Sandwiches pickup"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_illegal_delivery_move_is_rejected() {
        let backend = Arc::new(InMemoryBackend::new());
        let staff = open_for(&backend, "s@x.com", Role::Staff, "s");
        let dashboard = open_for(&backend, "v@x.com", Role::Volunteer, "v");
        let volunteer = dashboard.volunteer().unwrap();
        let id = post(&staff, "12 pieces").await;
        volunteer.accept_pickup(id).await.unwrap();

        let err = volunteer
            .update_delivery(id, DeliveryUpdate::status(DeliveryStatus::Delivered))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            WorkflowError::Backend(BackendError::Validation(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_cancels_pending_accept() {
        let backend = Arc::new(InMemoryBackend::new());
        let staff = open_for(&backend, "s@x.com", Role::Staff, "s");
        let dashboard = open_for(&backend, "v@x.com", Role::Volunteer, "v");
        let volunteer = dashboard.volunteer().unwrap();
        let id = post(&staff, "12 pieces").await;

        let (result, ()) = tokio::join!(volunteer.accept_pickup(id), async {
            tokio::time::sleep(Duration::from_millis(100)).await;
            dashboard.close();
        });

        assert_eq!(result.unwrap_err(), WorkflowError::Cancelled);
        assert!(!volunteer.is_in_flight(id));
        let available = backend
            .list_available_donations(DonationFilter::default())
            .await
            .unwrap();
        assert_eq!(available.len(), 1);
    }
}
