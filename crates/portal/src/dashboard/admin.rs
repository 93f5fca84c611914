//! Admin dashboard: aggregate views over every donation and volunteer.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde::Serialize;

use replate_core::dashboard::{AdminTab, REPORTS, ReportKind};
use replate_core::time::time_ago;
use replate_core::{DeliveryStatus, Donation, DonationId, Role, Tone, Urgency, UserId};

use super::{Scope, WorkflowError, percent};

const RECENT_LOGS: usize = 5;
const NOT_ASSIGNED: &str = "Not assigned";

pub struct AdminDashboard {
    pub(super) scope: Scope,
    tab: Mutex<AdminTab>,
}

/// A donation row on the logs tab.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdminLog {
    pub id: DonationId,
    pub staff: String,
    pub food_label: &'static str,
    pub quantity: String,
    pub location: &'static str,
    pub status: DeliveryStatus,
    pub status_label: &'static str,
    pub status_tone: Tone,
    pub volunteer: String,
    pub time: String,
}

/// A food-safety issue found on an open donation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HygieneAlert {
    pub donation_id: DonationId,
    pub location: &'static str,
    pub issue: &'static str,
    pub severity: Urgency,
    pub severity_tone: Tone,
    pub time: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VolunteerPerformance {
    pub user_id: UserId,
    pub name: String,
    pub pickups: usize,
    pub deliveries: usize,
    pub success_rate: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdminOverview {
    pub total_meals_saved: u32,
    pub active_volunteers: usize,
    /// Share of logged food that was claimed instead of thrown away.
    pub waste_reduced_percent: Option<u8>,
    pub pending_pickups: usize,
    pub recent_logs: Vec<AdminLog>,
    pub hygiene_alerts: Vec<HygieneAlert>,
    /// Share of donations without any hygiene alert.
    pub compliance_rate: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "tab", rename_all = "snake_case")]
pub enum AdminTabView {
    Overview(AdminOverview),
    Logs { logs: Vec<AdminLog> },
    Volunteers { volunteers: Vec<VolunteerPerformance> },
    Reports { reports: Vec<ReportKind> },
}

#[derive(Debug, Clone, Serialize)]
pub struct AdminSnapshot {
    pub tab: AdminTab,
    pub view: AdminTabView,
}

/// Hygiene issues on open donations, most severe first.
///
/// A donation without a photo is flagged for missing verification. A
/// pending donation logged today whose pickup time has already passed is
/// flagged as past pickup.
#[must_use]
pub fn hygiene_alerts(donations: &[Donation], now: DateTime<Utc>) -> Vec<HygieneAlert> {
    let today = now.date_naive();
    let mut alerts: Vec<HygieneAlert> = donations
        .iter()
        .filter(|d| !d.status.is_terminal())
        .flat_map(|d| {
            let past_pickup = d.status == DeliveryStatus::Pending
                && d.created_at.date_naive() == today
                && d.pickup_time.time() < now.time();
            let issues = [
                past_pickup.then_some(("Food past pickup time", Urgency::High)),
                d.image
                    .is_none()
                    .then_some(("Photo verification missing", Urgency::Medium)),
            ];
            issues.into_iter().flatten().map(|(issue, severity)| HygieneAlert {
                donation_id: d.id,
                location: d.location.label(),
                issue,
                severity,
                severity_tone: severity.tone(),
                time: time_ago(d.created_at, now),
            })
        })
        .collect();
    alerts.sort_by(|a, b| b.severity.cmp(&a.severity));
    alerts
}

fn admin_logs(
    donations: &[Donation],
    names: &HashMap<UserId, String>,
    now: DateTime<Utc>,
) -> Vec<AdminLog> {
    let name = |id: UserId| {
        names
            .get(&id)
            .cloned()
            .unwrap_or_else(|| format!("User {id}"))
    };
    donations
        .iter()
        .map(|d| AdminLog {
            id: d.id,
            staff: name(d.staff_id),
            food_label: d.food_type.label(),
            quantity: d.quantity.clone(),
            location: d.location.label(),
            status: d.status,
            status_label: d.status.staff_label(),
            status_tone: d.status.tone(),
            volunteer: d
                .accepted_by
                .map_or_else(|| NOT_ASSIGNED.to_string(), &name),
            time: time_ago(d.created_at, now),
        })
        .collect()
}

fn overview(
    donations: &[Donation],
    names: &HashMap<UserId, String>,
    now: DateTime<Utc>,
) -> AdminOverview {
    let hygiene_alerts = hygiene_alerts(donations, now);
    let flagged: HashSet<DonationId> = hygiene_alerts.iter().map(|a| a.donation_id).collect();
    let claimed = donations
        .iter()
        .filter(|d| d.status.is_claimed() || d.status == DeliveryStatus::Delivered)
        .count();
    let active_volunteers: HashSet<UserId> =
        donations.iter().filter_map(|d| d.accepted_by).collect();

    let mut recent_logs = admin_logs(donations, names, now);
    recent_logs.truncate(RECENT_LOGS);

    AdminOverview {
        total_meals_saved: donations
            .iter()
            .filter(|d| d.status == DeliveryStatus::Delivered)
            .filter_map(|d| d.quantity_numeric)
            .sum(),
        active_volunteers: active_volunteers.len(),
        waste_reduced_percent: percent(claimed, donations.len()),
        pending_pickups: donations
            .iter()
            .filter(|d| d.status == DeliveryStatus::Pending)
            .count(),
        recent_logs,
        compliance_rate: percent(donations.len() - flagged.len(), donations.len()),
        hygiene_alerts,
    }
}

fn volunteer_performance(
    donations: &[Donation],
    volunteers: impl IntoIterator<Item = (UserId, String)>,
) -> Vec<VolunteerPerformance> {
    let mut rows: Vec<VolunteerPerformance> = volunteers
        .into_iter()
        .map(|(user_id, name)| {
            let held: Vec<&Donation> = donations
                .iter()
                .filter(|d| d.accepted_by == Some(user_id))
                .collect();
            let deliveries = held
                .iter()
                .filter(|d| d.status == DeliveryStatus::Delivered)
                .count();
            VolunteerPerformance {
                user_id,
                name,
                pickups: held.len(),
                deliveries,
                success_rate: percent(deliveries, held.len()),
            }
        })
        .collect();
    rows.sort_by(|a, b| b.pickups.cmp(&a.pickups).then(a.user_id.cmp(&b.user_id)));
    rows
}

impl AdminDashboard {
    pub(super) fn new(scope: Scope) -> Self {
        Self {
            scope,
            tab: Mutex::default(),
        }
    }

    #[must_use]
    pub fn tab(&self) -> AdminTab {
        *self.tab.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn select_tab(&self, tab: AdminTab) {
        *self.tab.lock().unwrap_or_else(PoisonError::into_inner) = tab;
    }

    /// Select `tab` and load its contents.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::Backend`] if the backend cannot be read.
    pub async fn view_tab(
        &self,
        tab: AdminTab,
        now: DateTime<Utc>,
    ) -> Result<AdminTabView, WorkflowError> {
        self.select_tab(tab);
        tracing::debug!(tab = %tab, "Admin tab selected");

        let backend = self.scope.backend();
        let donations = backend.list_donations().await?;
        let directory = backend.user_directory().await?;
        let names: HashMap<UserId, String> = directory
            .iter()
            .map(|u| (u.user_id, u.display_name.clone()))
            .collect();

        Ok(match tab {
            AdminTab::Overview => AdminTabView::Overview(overview(&donations, &names, now)),
            AdminTab::Logs => AdminTabView::Logs {
                logs: admin_logs(&donations, &names, now),
            },
            AdminTab::Volunteers => AdminTabView::Volunteers {
                volunteers: volunteer_performance(
                    &donations,
                    directory
                        .into_iter()
                        .filter(|u| u.role == Role::Volunteer)
                        .map(|u| (u.user_id, u.display_name)),
                ),
            },
            AdminTab::Reports => AdminTabView::Reports {
                reports: REPORTS.to_vec(),
            },
        })
    }

    /// # Errors
    ///
    /// Returns [`WorkflowError::Backend`] if the backend cannot be read.
    pub async fn snapshot(&self, now: DateTime<Utc>) -> Result<AdminSnapshot, WorkflowError> {
        let tab = self.tab();
        let view = self.view_tab(tab, now).await?;
        Ok(AdminSnapshot { tab, view })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use chrono::{Duration, NaiveDate};
    use replate_core::{DietaryFlags, FoodType, PickupLocation, PickupTime};

    use super::*;
    use crate::backend::InMemoryBackend;
    use crate::dashboard::tests::open_for;

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        NaiveDate::from_ymd_opt(2026, 3, 14)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
            .and_utc()
    }

    fn donation(id: i32, status: DeliveryStatus, pickup: (u32, u32), image: bool) -> Donation {
        Donation {
            id: DonationId::new(id),
            staff_id: UserId::new(1),
            food_type: FoodType::Rice,
            quantity: "15 portions".to_string(),
            quantity_numeric: Some(15),
            location: PickupLocation::MainMess,
            pickup_time: PickupTime::from_hm(pickup.0, pickup.1).unwrap(),
            status,
            urgency: Urgency::High,
            description: None,
            image: image.then(|| "photo.jpg".to_string()),
            dietary: DietaryFlags::default(),
            allergens: Vec::new(),
            accepted_by: status.is_claimed().then(|| UserId::new(2)),
            created_at: at(9, 0),
            updated_at: at(9, 0),
        }
    }

    #[test]
    fn test_hygiene_alerts_sorted_by_severity() {
        let donations = [
            donation(1, DeliveryStatus::Accepted, (10, 0), false),
            donation(2, DeliveryStatus::Pending, (11, 30), true),
            donation(3, DeliveryStatus::Pending, (18, 0), true),
            donation(4, DeliveryStatus::Delivered, (8, 0), false),
        ];

        let alerts = hygiene_alerts(&donations, at(12, 0));

        let found: Vec<(i32, &str)> = alerts
            .iter()
            .map(|a| (a.donation_id.as_i32(), a.issue))
            .collect();
        assert_eq!(
            found,
            [(2, "Food past pickup time"), (1, "Photo verification missing")]
        );
        assert_eq!(alerts[0].severity_tone, Tone::Destructive);
        assert_eq!(alerts[0].time, "3 hours ago");
    }

    #[test]
    fn test_past_pickup_only_counts_today() {
        let mut yesterday = donation(1, DeliveryStatus::Pending, (10, 0), true);
        yesterday.created_at = at(9, 0) - Duration::days(1);
        assert!(hygiene_alerts(&[yesterday], at(12, 0)).is_empty());
    }

    #[test]
    fn test_overview_metrics() {
        let donations = [
            donation(1, DeliveryStatus::Delivered, (10, 0), true),
            donation(2, DeliveryStatus::InTransit, (10, 0), true),
            donation(3, DeliveryStatus::Pending, (11, 0), false),
            donation(4, DeliveryStatus::Pending, (18, 0), true),
        ];
        let names = HashMap::from([(UserId::new(1), "Rajesh Kumar".to_string())]);

        let overview = overview(&donations, &names, at(12, 0));

        assert_eq!(overview.total_meals_saved, 15);
        assert_eq!(overview.active_volunteers, 1);
        assert_eq!(overview.pending_pickups, 2);
        assert_eq!(overview.waste_reduced_percent, Some(50));
        assert_eq!(overview.compliance_rate, Some(75));
        assert_eq!(overview.hygiene_alerts.len(), 2);
        assert_eq!(overview.recent_logs[0].staff, "Rajesh Kumar");
    }

    #[test]
    fn test_unassigned_logs_say_so() {
        let logs = admin_logs(
            &[donation(1, DeliveryStatus::Pending, (18, 0), true)],
            &HashMap::new(),
            at(12, 0),
        );
        assert_eq!(logs[0].volunteer, "Not assigned");
        assert_eq!(logs[0].staff, "User 1");
    }

    #[test]
    fn test_volunteer_performance_sorted_by_pickups() {
        let mut delivered = donation(1, DeliveryStatus::Delivered, (10, 0), true);
        delivered.accepted_by = Some(UserId::new(3));
        let donations = [
            delivered,
            donation(2, DeliveryStatus::InTransit, (10, 0), true),
            donation(3, DeliveryStatus::Accepted, (10, 0), true),
        ];

        let rows = volunteer_performance(
            &donations,
            [
                (UserId::new(3), "Food Angels".to_string()),
                (UserId::new(2), "Green Earth NGO".to_string()),
                (UserId::new(4), "Hope Foundation".to_string()),
            ],
        );

        let summary: Vec<(&str, usize, usize, Option<u8>)> = rows
            .iter()
            .map(|r| (r.name.as_str(), r.pickups, r.deliveries, r.success_rate))
            .collect();
        assert_eq!(
            summary,
            [
                ("Green Earth NGO", 2, 0, Some(0)),
                ("Food Angels", 1, 1, Some(100)),
                ("Hope Foundation", 0, 0, None),
            ]
        );
    }

    #[tokio::test]
    async fn test_tab_selection_sticks() {
        let backend = Arc::new(InMemoryBackend::seeded(Utc::now()));
        let dashboard = open_for(&backend, "root@x.com", Role::Admin, "root");
        let admin = dashboard.admin().unwrap();
        assert_eq!(admin.tab(), AdminTab::Overview);

        let view = admin.view_tab(AdminTab::Reports, Utc::now()).await.unwrap();
        let AdminTabView::Reports { reports } = view else {
            panic!("expected reports tab");
        };
        assert_eq!(reports.len(), 4);
        assert_eq!(admin.tab(), AdminTab::Reports);

        admin.select_tab(AdminTab::Volunteers);
        let snapshot = admin.snapshot(Utc::now()).await.unwrap();
        assert_eq!(snapshot.tab, AdminTab::Volunteers);
        let AdminTabView::Volunteers { volunteers } = snapshot.view else {
            panic!("expected volunteers tab");
        };
        assert_eq!(volunteers.len(), 4);
        assert_eq!(volunteers[0].pickups, 1);
    }

    #[tokio::test]
    async fn test_seeded_logs_name_staff_and_volunteers() {
        let backend = Arc::new(InMemoryBackend::seeded(Utc::now()));
        let dashboard = open_for(&backend, "root@x.com", Role::Admin, "root");
        let view = dashboard
            .admin()
            .unwrap()
            .view_tab(AdminTab::Logs, Utc::now())
            .await
            .unwrap();

        let AdminTabView::Logs { logs } = view else {
            panic!("expected logs tab");
        };
        assert_eq!(logs.len(), 6);
        assert_eq!(logs[0].staff, "Rajesh Kumar");
        assert_eq!(logs[0].volunteer, "Not assigned");
        assert!(logs.iter().any(|l| l.volunteer == "Green Earth NGO"));
    }
}
