//! Integration tests for RePlate.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p replate-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `session_flow` - Role selection, auth prompt and session lifecycle
//! - `pickup_claims` - Staff postings claimed and delivered by volunteers
//! - `http_api` - The JSON API driven through the router with cookies
//!
//! Everything runs against the in-memory backend; no server or database is
//! needed. Timed tests use tokio's paused clock.

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use http_body_util::BodyExt;
use secrecy::SecretString;
use serde_json::Value;
use tower::ServiceExt;

use replate_core::{FoodLogDraft, FoodType, PickupLocation, PickupTime, Role, Urgency};
use replate_portal::backend::{InMemoryBackend, SharedDonationBackend};
use replate_portal::config::PortalConfig;
use replate_portal::models::{AuthOutcome, Portal, PortalContext};
use replate_portal::services::auth::{LoginForm, SignupForm};
use replate_portal::services::task::{RetryPolicy, TaskSettings};
use replate_portal::state::AppState;

/// Simulated round trip used by every test portal.
pub const LATENCY: Duration = Duration::from_millis(1500);

#[must_use]
pub fn settings() -> TaskSettings {
    TaskSettings {
        latency: LATENCY,
        retry: RetryPolicy::new(3, Duration::from_millis(100), Duration::from_secs(1)),
    }
}

/// A fresh portal over `backend`.
#[must_use]
pub fn portal(backend: &Arc<InMemoryBackend>) -> Portal {
    Portal::new(PortalContext {
        donations: Arc::clone(backend) as SharedDonationBackend,
        identities: Arc::clone(backend) as _,
        settings: settings(),
    })
}

#[must_use]
pub fn login_form(email: &str, password: &str) -> LoginForm {
    LoginForm {
        email: email.to_string(),
        password: SecretString::from(password),
    }
}

#[must_use]
pub fn signup_form(name: &str, email: &str, password: &str, confirm: &str) -> SignupForm {
    SignupForm {
        name: name.to_string(),
        email: email.to_string(),
        password: SecretString::from(password),
        confirm_password: SecretString::from(confirm),
        organization: None,
        phone: None,
    }
}

/// A complete food-log draft for `quantity` of bread.
#[must_use]
pub fn bread_draft(quantity: &str) -> FoodLogDraft {
    FoodLogDraft {
        food_type: Some(FoodType::Bread),
        quantity: quantity.to_string(),
        pickup_time: PickupTime::from_hm(16, 30),
        location: Some(PickupLocation::HostelMess),
        urgency: Some(Urgency::High),
        ..FoodLogDraft::default()
    }
}

/// Select `role` on `portal` and log in as `email`.
pub async fn sign_in(portal: &Portal, role: Role, email: &str) -> AuthOutcome {
    portal.select_role(role).unwrap();
    portal.login(login_form(email, "pw")).await.unwrap()
}

/// Drives the portal router like a browser: one cookie jar, JSON bodies.
pub struct TestClient {
    router: Router,
    cookie: Option<String>,
}

impl TestClient {
    /// A client for a portal with the given config and an unseeded backend.
    #[must_use]
    pub fn new(config: PortalConfig) -> Self {
        Self::with_state(AppState::from_config(config))
    }

    #[must_use]
    pub fn with_state(state: AppState) -> Self {
        Self {
            router: replate_portal::app(state),
            cookie: None,
        }
    }

    /// A second browser against the same application.
    #[must_use]
    pub fn fresh_browser(&self) -> Self {
        Self {
            router: self.router.clone(),
            cookie: None,
        }
    }

    pub async fn get(&mut self, uri: &str) -> (StatusCode, Value) {
        self.send(Method::GET, uri, None).await
    }

    pub async fn post(&mut self, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        self.send(Method::POST, uri, body).await
    }

    pub async fn put(&mut self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::PUT, uri, Some(body)).await
    }

    /// Send a request, keeping whatever session cookie the server sets.
    pub async fn send(
        &mut self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(cookie) = &self.cookie {
            request = request.header(header::COOKIE, cookie);
        }
        let request = match body {
            Some(json) => request
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => request.body(Body::empty()),
        }
        .unwrap();

        let response = self.router.clone().oneshot(request).await.unwrap();
        if let Some(set_cookie) = response.headers().get(header::SET_COOKIE) {
            let pair = set_cookie.to_str().unwrap().split(';').next().unwrap();
            self.cookie = Some(pair.to_string());
        }

        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        (status, value)
    }
}
