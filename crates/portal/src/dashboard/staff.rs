//! Staff dashboard: log surplus food and follow what happened to it.

use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use replate_core::notice::Notice;
use replate_core::time::time_ago;
use replate_core::{DeliveryStatus, Donation, DonationId, FoodLogDraft, FoodType, Tone};

use super::{Scope, WorkflowError};
use crate::services::task::InFlight;

const RECENT_LOGS: usize = 10;

pub struct StaffDashboard {
    pub(super) scope: Scope,
    draft: Mutex<FoodLogDraft>,
    submitting: InFlight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StaffStats {
    pub todays_logs: usize,
    pub pending_pickups: usize,
    pub this_week: usize,
}

/// One of the staff member's recent logs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StaffLog {
    pub id: DonationId,
    pub food_type: FoodType,
    pub food_label: &'static str,
    pub quantity: String,
    pub pickup_time: String,
    pub status: DeliveryStatus,
    pub status_label: &'static str,
    pub status_tone: Tone,
    /// Volunteer holding the donation, if any.
    pub volunteer: Option<String>,
    pub logged: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct StaffSnapshot {
    pub draft: FoodLogDraft,
    pub submitting: bool,
    pub stats: StaffStats,
    pub recent_logs: Vec<StaffLog>,
}

impl StaffDashboard {
    pub(super) fn new(scope: Scope) -> Self {
        Self {
            scope,
            draft: Mutex::default(),
            submitting: InFlight::default(),
        }
    }

    fn lock_draft(&self) -> MutexGuard<'_, FoodLogDraft> {
        self.draft.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[must_use]
    pub fn draft(&self) -> FoodLogDraft {
        self.lock_draft().clone()
    }

    /// Replace the draft with what is currently in the form.
    pub fn update_draft(&self, draft: FoodLogDraft) {
        *self.lock_draft() = draft;
    }

    #[must_use]
    pub fn is_submitting(&self) -> bool {
        self.submitting.is_active()
    }

    /// Submit the draft as a new donation.
    ///
    /// Required fields are checked before the round trip; on failure the
    /// draft is kept for correction. On success the draft is reset.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::InFlight`] while a submission is running,
    /// [`WorkflowError::Validation`] for an incomplete draft,
    /// [`WorkflowError::Cancelled`] if the dashboard closes first, or a
    /// backend error.
    #[tracing::instrument(skip_all, fields(staff_id = %self.scope.user_id()))]
    pub async fn submit(&self) -> Result<(Donation, Notice), WorkflowError> {
        let _busy = self.submitting.try_begin().ok_or(WorkflowError::InFlight)?;
        let new = self.lock_draft().validate()?;

        let backend = self.scope.backend();
        let staff_id = self.scope.user_id();
        let new = &new;
        let donation = self
            .scope
            .settings
            .perform(&self.scope.cancel, move || {
                backend.submit_donation(staff_id, new.clone())
            })
            .await?;

        self.update_draft(FoodLogDraft::default());
        Ok((donation, Notice::food_logged()))
    }

    /// # Errors
    ///
    /// Returns [`WorkflowError::Backend`] if the backend cannot be read.
    pub async fn snapshot(&self, now: DateTime<Utc>) -> Result<StaffSnapshot, WorkflowError> {
        let logs = self
            .scope
            .backend()
            .list_donations_by_staff(self.scope.user_id())
            .await?;
        let names = self.scope.names().await?;

        let week_ago = now - Duration::days(7);
        let stats = StaffStats {
            todays_logs: logs
                .iter()
                .filter(|d| d.created_at.date_naive() == now.date_naive())
                .count(),
            pending_pickups: logs
                .iter()
                .filter(|d| d.status == DeliveryStatus::Pending)
                .count(),
            this_week: logs.iter().filter(|d| d.created_at > week_ago).count(),
        };

        let recent_logs = logs
            .iter()
            .take(RECENT_LOGS)
            .map(|d| StaffLog {
                id: d.id,
                food_type: d.food_type,
                food_label: d.food_type.label(),
                quantity: d.quantity.clone(),
                pickup_time: d.pickup_time.display(),
                status: d.status,
                status_label: d.status.staff_label(),
                status_tone: d.status.tone(),
                volunteer: d.accepted_by.and_then(|v| names.get(&v).cloned()),
                logged: time_ago(d.created_at, now),
            })
            .collect();

        Ok(StaffSnapshot {
            draft: self.draft(),
            submitting: self.is_submitting(),
            stats,
            recent_logs,
        })
    }
}
