//! Staff postings claimed and delivered by volunteers, across portals.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use chrono::Utc;
use tokio::time::Instant;

use replate_core::dashboard::AdminTab;
use replate_core::{DeliveryStatus, DonationId, Role};
use replate_integration_tests::{LATENCY, bread_draft, portal, sign_in};
use replate_portal::backend::{BackendError, DeliveryUpdate, DonationFilter, InMemoryBackend};
use replate_portal::dashboard::WorkflowError;
use replate_portal::dashboard::admin::AdminTabView;
use replate_portal::models::Portal;

async fn post(staff: &Portal, quantity: &str) -> DonationId {
    let dashboard = staff.dashboard().unwrap();
    let staff = dashboard.staff().unwrap();
    staff.update_draft(bread_draft(quantity));
    let (donation, notice) = staff.submit().await.unwrap();
    assert_eq!(notice.title, "Food logged successfully!");
    assert!(staff.draft().is_empty());
    donation.id
}

#[tokio::test(start_paused = true)]
async fn test_accept_disables_only_that_posting_until_done() {
    let backend = Arc::new(InMemoryBackend::new());
    let staff = portal(&backend);
    sign_in(&staff, Role::Staff, "s@campus.edu").await;
    let first = post(&staff, "12 pieces").await;
    let second = post(&staff, "6 pieces").await;

    let volunteer = portal(&backend);
    sign_in(&volunteer, Role::Volunteer, "v@campus.edu").await;
    let dashboard = volunteer.dashboard().unwrap();
    let pickups = dashboard.volunteer().unwrap();

    let start = Instant::now();
    let (accepted, ()) = tokio::join!(pickups.accept_pickup(first), async {
        tokio::time::sleep(LATENCY / 3).await;
        let listed = pickups
            .available(DonationFilter::default(), Utc::now())
            .await
            .unwrap();
        let flags: Vec<_> = listed.iter().map(|p| (p.id, p.in_flight)).collect();
        assert!(flags.contains(&(first, true)));
        assert!(flags.contains(&(second, false)));
        assert_eq!(
            pickups.accept_pickup(first).await.unwrap_err(),
            WorkflowError::ItemInFlight(first)
        );
    });

    let (donation, notice) = accepted.unwrap();
    assert!(start.elapsed() >= LATENCY);
    assert_eq!(donation.status, DeliveryStatus::Accepted);
    assert_eq!(notice.title, "Pickup accepted!");
    assert!(!pickups.is_in_flight(first));

    let remaining = pickups
        .available(DonationFilter::default(), Utc::now())
        .await
        .unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining.first().unwrap().id, second);
    assert!(!remaining.first().unwrap().in_flight);
}

#[tokio::test(start_paused = true)]
async fn test_first_volunteer_to_claim_wins() {
    let backend = Arc::new(InMemoryBackend::new());
    let staff = portal(&backend);
    sign_in(&staff, Role::Staff, "s@campus.edu").await;
    let id = post(&staff, "20 portions").await;

    let one = portal(&backend);
    sign_in(&one, Role::Volunteer, "one@campus.edu").await;
    let two = portal(&backend);
    sign_in(&two, Role::Volunteer, "two@campus.edu").await;
    let one_dashboard = one.dashboard().unwrap();
    let two_dashboard = two.dashboard().unwrap();

    let (a, b) = tokio::join!(
        one_dashboard.volunteer().unwrap().accept_pickup(id),
        two_dashboard.volunteer().unwrap().accept_pickup(id),
    );

    let results = [a, b];
    let wins = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(wins, 1);
    assert!(results.iter().any(|r| matches!(
        r,
        Err(WorkflowError::Backend(BackendError::Conflict(_)))
    )));
    let loser = results.iter().find_map(|r| r.as_ref().err()).unwrap();
    assert_eq!(loser.notice().title, "Pickup unavailable");
}

#[tokio::test(start_paused = true)]
async fn test_delivery_shows_up_for_staff_and_admin() {
    let backend = Arc::new(InMemoryBackend::new());
    let staff = portal(&backend);
    sign_in(&staff, Role::Staff, "s@campus.edu").await;
    let id = post(&staff, "15 portions").await;

    let volunteer = portal(&backend);
    sign_in(&volunteer, Role::Volunteer, "v@campus.edu").await;
    let dashboard = volunteer.dashboard().unwrap();
    let pickups = dashboard.volunteer().unwrap();
    pickups.accept_pickup(id).await.unwrap();
    for status in [DeliveryStatus::InTransit, DeliveryStatus::Delivered] {
        let (donation, notice) = pickups
            .update_delivery(
                id,
                DeliveryUpdate {
                    status,
                    location: None,
                    notes: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(donation.status, status);
        assert_eq!(notice.title, "Delivery updated");
    }

    let stats = pickups.snapshot(Utc::now()).await.unwrap().stats;
    assert_eq!(stats.meals_delivered, 15);
    assert_eq!(stats.success_rate, Some(100));

    let staff_dashboard = staff.dashboard().unwrap();
    let staff_view = staff_dashboard.staff().unwrap().snapshot(Utc::now()).await.unwrap();
    let log = staff_view.recent_logs.first().unwrap();
    assert_eq!(log.status, DeliveryStatus::Delivered);
    assert_eq!(log.volunteer.as_deref(), Some("v"));

    let admin = portal(&backend);
    sign_in(&admin, Role::Admin, "admin@campus.edu").await;
    let admin_dashboard = admin.dashboard().unwrap();
    let AdminTabView::Logs { logs } = admin_dashboard
        .admin()
        .unwrap()
        .view_tab(AdminTab::Logs, Utc::now())
        .await
        .unwrap()
    else {
        panic!("expected the logs tab");
    };
    assert_eq!(logs.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_logout_cancels_pending_accept() {
    let backend = Arc::new(InMemoryBackend::new());
    let staff = portal(&backend);
    sign_in(&staff, Role::Staff, "s@campus.edu").await;
    let id = post(&staff, "8 pieces").await;

    let volunteer = portal(&backend);
    sign_in(&volunteer, Role::Volunteer, "v@campus.edu").await;
    let dashboard = volunteer.dashboard().unwrap();

    let (result, ()) = tokio::join!(dashboard.volunteer().unwrap().accept_pickup(id), async {
        tokio::time::sleep(LATENCY / 2).await;
        volunteer.logout();
    });

    assert_eq!(result.unwrap_err(), WorkflowError::Cancelled);
    assert!(dashboard.is_closed());

    // Nothing reached the backend; the posting is still up for grabs.
    let other = portal(&backend);
    sign_in(&other, Role::Volunteer, "w@campus.edu").await;
    let other_dashboard = other.dashboard().unwrap();
    let listed = other_dashboard
        .volunteer()
        .unwrap()
        .available(DonationFilter::default(), Utc::now())
        .await
        .unwrap();
    assert_eq!(listed.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_staff_cannot_use_volunteer_actions() {
    let backend = Arc::new(InMemoryBackend::new());
    let staff = portal(&backend);
    sign_in(&staff, Role::Staff, "s@campus.edu").await;

    let dashboard = staff.dashboard().unwrap();
    assert!(matches!(
        dashboard.volunteer(),
        Err(WorkflowError::WrongDashboard { .. })
    ));
}
