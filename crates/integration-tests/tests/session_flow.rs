//! Role selection, the auth prompt and the session lifecycle.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use tokio::time::Instant;

use replate_core::dashboard::{DashboardKind, route};
use replate_core::{Role, SessionError};
use replate_integration_tests::{LATENCY, login_form, portal, sign_in, signup_form};
use replate_portal::backend::InMemoryBackend;
use replate_portal::models::LandingView;
use replate_portal::services::auth::AuthError;

#[tokio::test(start_paused = true)]
async fn test_signup_keeps_selected_role_for_every_role() {
    let backend = Arc::new(InMemoryBackend::new());
    for role in Role::ALL {
        let portal = portal(&backend);
        portal.select_role(role).unwrap();

        let email = format!("new-{role}@campus.edu");
        let outcome = portal
            .signup(signup_form("New Person", &email, "secret", "secret"))
            .await
            .unwrap();

        assert_eq!(outcome.identity.role, role);
        assert_eq!(outcome.identity.name, "New Person");
        assert_eq!(outcome.dashboard, route(role));
        assert_eq!(outcome.notice.title, "Account created!");
        assert_eq!(portal.dashboard().unwrap().kind(), route(role));
    }
}

#[tokio::test(start_paused = true)]
async fn test_login_with_empty_password_fails_after_round_trip() {
    let backend = Arc::new(InMemoryBackend::new());
    let portal = portal(&backend);
    portal.select_role(Role::Volunteer).unwrap();

    let start = Instant::now();
    let err = portal
        .login(login_form("fresh@campus.edu", ""))
        .await
        .unwrap_err();

    assert_eq!(err, AuthError::CredentialsRejected);
    assert!(start.elapsed() >= LATENCY);
    assert!(portal.identity().is_none());
    // The prompt stays open with the email kept.
    assert_eq!(portal.prompt().unwrap().login.email, "fresh@campus.edu");
}

#[tokio::test(start_paused = true)]
async fn test_any_password_logs_in_a_fresh_email() {
    let backend = Arc::new(InMemoryBackend::new());
    for role in Role::ALL {
        let portal = portal(&backend);
        let outcome = sign_in(&portal, role, &format!("first-{role}@campus.edu")).await;
        assert_eq!(outcome.identity.role, role);
        assert_eq!(outcome.notice.title, "Welcome back!");
    }
}

#[tokio::test(start_paused = true)]
async fn test_staff_login_names_user_after_email() {
    let backend = Arc::new(InMemoryBackend::new());
    let portal = portal(&backend);
    portal.select_role(Role::Staff).unwrap();

    let outcome = portal.login(login_form("s@x.com", "pw")).await.unwrap();

    assert_eq!(outcome.identity.name, "s");
    assert_eq!(outcome.identity.email.as_str(), "s@x.com");
    assert_eq!(outcome.identity.role, Role::Staff);
    assert_eq!(outcome.dashboard, DashboardKind::Staff);
    assert!(matches!(
        portal.landing(),
        LandingView::Redirect {
            dashboard: DashboardKind::Staff,
            ..
        }
    ));
}

#[tokio::test(start_paused = true)]
async fn test_volunteer_password_mismatch_is_immediate() {
    let backend = Arc::new(InMemoryBackend::new());
    let portal = portal(&backend);
    portal.select_role(Role::Volunteer).unwrap();

    let start = Instant::now();
    let err = portal
        .signup(signup_form("A Volunteer", "a@x.com", "p1", "p2"))
        .await
        .unwrap_err();

    assert_eq!(err, AuthError::PasswordMismatch);
    assert_eq!(start.elapsed(), std::time::Duration::ZERO);
    assert!(portal.identity().is_none());

    let prompt = portal.prompt().unwrap();
    assert_eq!(prompt.role, Role::Volunteer);
    assert_eq!(prompt.signup.name, "A Volunteer");
    assert_eq!(prompt.signup.email, "a@x.com");
}

#[tokio::test(start_paused = true)]
async fn test_returning_user_cannot_switch_roles() {
    let backend = Arc::new(InMemoryBackend::new());
    let first = portal(&backend);
    sign_in(&first, Role::Volunteer, "v@campus.edu").await;

    let second = portal(&backend);
    second.select_role(Role::Admin).unwrap();
    let err = second
        .login(login_form("v@campus.edu", "pw"))
        .await
        .unwrap_err();

    assert_eq!(err, AuthError::CredentialsRejected);
    assert!(second.identity().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_role_selection_refused_while_signed_in() {
    let backend = Arc::new(InMemoryBackend::new());
    let portal = portal(&backend);
    sign_in(&portal, Role::Admin, "admin@campus.edu").await;

    let err = portal.select_role(Role::Staff).unwrap_err();
    assert!(matches!(
        err,
        AuthError::Session(SessionError::AlreadyAuthenticated(Role::Admin))
    ));
    assert_eq!(portal.dashboard().unwrap().kind(), DashboardKind::Admin);
}

#[tokio::test(start_paused = true)]
async fn test_logout_twice_lands_on_role_cards() {
    let backend = Arc::new(InMemoryBackend::new());
    let portal = portal(&backend);
    sign_in(&portal, Role::Staff, "s@campus.edu").await;

    assert!(portal.logout().is_some());
    assert!(portal.logout().is_none());
    assert!(portal.identity().is_none());
    assert!(portal.dashboard().is_err());
    let LandingView::Landing { cards, prompt } = portal.landing() else {
        panic!("expected the landing surface");
    };
    assert_eq!(cards.len(), Role::ALL.len());
    assert!(prompt.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_logout_during_login_discards_result() {
    let backend = Arc::new(InMemoryBackend::new());
    let portal = portal(&backend);
    portal.select_role(Role::Staff).unwrap();

    let (result, ()) = tokio::join!(portal.login(login_form("s@campus.edu", "pw")), async {
        tokio::time::sleep(LATENCY / 2).await;
        portal.logout();
    });

    assert_eq!(result.unwrap_err(), AuthError::Cancelled);
    assert!(portal.identity().is_none());
}

#[test]
fn test_every_role_routes_to_its_own_dashboard() {
    let kinds: Vec<_> = Role::ALL.into_iter().map(route).collect();
    assert_eq!(
        kinds,
        [
            DashboardKind::Staff,
            DashboardKind::Volunteer,
            DashboardKind::Admin
        ]
    );
}
