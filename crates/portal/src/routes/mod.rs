//! HTTP route handlers for the portal.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                       - Health check
//! GET  /                             - Landing (role cards + prompt) or redirect hint
//! POST /roles/{role}                 - Select role, open auth prompt
//!
//! # Auth
//! GET  /auth/prompt                  - Auth prompt view
//! POST /auth/prompt/close            - Close auth prompt
//! POST /auth/login                   - Login action
//! POST /auth/signup                  - Signup action
//! POST /auth/logout                  - Logout action
//!
//! # Signed in
//! GET  /nav                          - Navigation shell
//! GET  /dashboard                    - Routed dashboard snapshot
//! GET  /notifications                - Notifications, newest first
//! POST /notifications/{id}/read      - Mark a notification read
//!
//! # Staff
//! GET  /staff/draft                  - Current food-log draft
//! PUT  /staff/draft                  - Replace the draft
//! POST /staff/draft/submit           - Submit the draft
//!
//! # Volunteer
//! GET  /volunteer/pickups            - Available food (?urgency=&location=)
//! POST /volunteer/pickups/{id}/accept
//! POST /volunteer/pickups/{id}/decline
//! POST /volunteer/deliveries/{id}    - Report delivery progress
//!
//! # Admin
//! GET  /admin/tabs/{tab}             - Select and view a tab
//! ```

pub mod admin;
pub mod auth;
pub mod dashboard;
pub mod home;
pub mod staff;
pub mod volunteer;

use axum::{
    Router,
    routing::{get, post},
};
use tower::ServiceBuilder;
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;

use crate::middleware::create_session_layer;
use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/prompt", get(auth::prompt))
        .route("/prompt/close", post(auth::close_prompt))
        .route("/login", post(auth::login))
        .route("/signup", post(auth::signup))
        .route("/logout", post(auth::logout))
}

/// Create the staff routes router.
pub fn staff_routes() -> Router<AppState> {
    Router::new()
        .route("/draft", get(staff::draft).put(staff::update_draft))
        .route("/draft/submit", post(staff::submit))
}

/// Create the volunteer routes router.
pub fn volunteer_routes() -> Router<AppState> {
    Router::new()
        .route("/pickups", get(volunteer::pickups))
        .route("/pickups/{id}/accept", post(volunteer::accept))
        .route("/pickups/{id}/decline", post(volunteer::decline))
        .route("/deliveries/{id}", post(volunteer::update_delivery))
}

/// Create the admin routes router.
pub fn admin_routes() -> Router<AppState> {
    Router::new().route("/tabs/{tab}", get(admin::view_tab))
}

/// Create all routes for the portal.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::landing))
        .route("/roles/{role}", post(home::select_role))
        .nest("/auth", auth_routes())
        .route("/nav", get(dashboard::nav))
        .route("/dashboard", get(dashboard::snapshot))
        .route("/notifications", get(dashboard::notifications))
        .route("/notifications/{id}/read", post(dashboard::mark_read))
        .nest("/staff", staff_routes())
        .nest("/volunteer", volunteer_routes())
        .nest("/admin", admin_routes())
}

/// Build the application: routes, sessions and request tracing.
///
/// Sentry layers are added by the binary.
pub fn app(state: AppState) -> Router {
    let session_layer = create_session_layer(state.config());

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|request: &axum::http::Request<_>| {
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
                status = tracing::field::Empty,
                latency_ms = tracing::field::Empty,
            )
        })
        .on_response(
            |response: &axum::http::Response<_>,
             latency: std::time::Duration,
             span: &Span| {
                span.record("status", response.status().as_u16());
                span.record(
                    "latency_ms",
                    u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                );
                DefaultOnResponse::default().on_response(response, latency, span);
            },
        );

    Router::new()
        .route("/health", get(health))
        .merge(routes())
        .layer(ServiceBuilder::new().layer(trace_layer).layer(session_layer))
        .with_state(state)
}

/// Liveness health check endpoint.
async fn health() -> &'static str {
    "ok"
}
