//! The portal as one browser sees it.
//!
//! A [`Portal`] composes the session model, the open auth prompt and the
//! routed dashboard for a single client. Every client gets its own portal,
//! looked up by the id kept in its cookie session.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use moka::sync::Cache;
use serde::Serialize;
use uuid::Uuid;

use replate_core::dashboard::DashboardKind;
use replate_core::notice::Notice;
use replate_core::{
    Identity, Notification, NotificationId, Role, RoleCard, Session, badge_text,
};

use crate::backend::{SharedDonationBackend, SharedIdentityBackend};
use crate::dashboard::{Dashboard, WorkflowError};
use crate::error::{clear_sentry_user, set_sentry_user};
use crate::services::auth::{AuthError, AuthFlow, AuthPromptView, LoginForm, SignupForm};
use crate::services::task::TaskSettings;

/// Session keys for portal data.
pub mod session_keys {
    /// Key for the id of the client's portal.
    pub const CLIENT_ID: &str = "client_id";
}

/// Collaborators shared by every portal.
#[derive(Clone)]
pub struct PortalContext {
    pub donations: SharedDonationBackend,
    pub identities: SharedIdentityBackend,
    pub settings: TaskSettings,
}

/// What `/` shows.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "surface", rename_all = "snake_case")]
pub enum LandingView {
    /// Role cards, plus the auth prompt when one is open.
    Landing {
        cards: Vec<RoleCard>,
        prompt: Option<AuthPromptView>,
    },
    /// Someone is signed in; the dashboard lives elsewhere.
    Redirect {
        dashboard: DashboardKind,
        location: &'static str,
    },
}

/// Result of a successful login or signup.
#[derive(Debug, Clone, Serialize)]
pub struct AuthOutcome {
    pub identity: Identity,
    pub dashboard: DashboardKind,
    pub notice: Notice,
}

/// The navigation shell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavView {
    pub name: String,
    pub email: String,
    pub role: Role,
    pub role_label: &'static str,
    pub unread: usize,
    /// Badge text; absent when nothing is unread.
    pub badge: Option<String>,
}

#[derive(Default)]
struct PortalState {
    session: Session,
    auth: Option<Arc<AuthFlow>>,
    dashboard: Option<Arc<Dashboard>>,
}

impl PortalState {
    /// Drop the open auth prompt, cancelling anything it has in flight.
    fn discard_prompt(&mut self) {
        if let Some(flow) = self.auth.take() {
            flow.cancel();
        }
    }
}

/// One client's portal.
pub struct Portal {
    ctx: PortalContext,
    state: Mutex<PortalState>,
}

impl Portal {
    #[must_use]
    pub fn new(ctx: PortalContext) -> Self {
        Self {
            ctx,
            state: Mutex::default(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, PortalState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[must_use]
    pub fn landing(&self) -> LandingView {
        let state = self.lock();
        if let Some(dashboard) = state.session.dashboard() {
            return LandingView::Redirect {
                dashboard,
                location: "/dashboard",
            };
        }

        let prompt = state
            .session
            .prompt_role()
            .zip(state.auth.as_ref())
            .map(|(_, flow)| flow.view());
        LandingView::Landing {
            cards: Role::ALL.into_iter().map(Role::card).collect(),
            prompt,
        }
    }

    /// Pick a role on the landing surface and open its auth prompt.
    ///
    /// Any prompt already open is replaced and its submissions cancelled.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Session`] if someone is already signed in.
    pub fn select_role(&self, role: Role) -> Result<AuthPromptView, AuthError> {
        let mut state = self.lock();
        state.session.select_role(role)?;
        state.discard_prompt();

        let flow = Arc::new(AuthFlow::new(role));
        let view = flow.view();
        state.auth = Some(flow);
        tracing::debug!(role = %role, "Auth prompt opened");
        Ok(view)
    }

    /// # Errors
    ///
    /// Returns [`AuthError::NoPrompt`] if no auth prompt is open.
    pub fn prompt(&self) -> Result<AuthPromptView, AuthError> {
        self.current_flow().map(|flow| flow.view())
    }

    /// Dismiss the auth prompt. Pending submissions are cancelled.
    pub fn close_prompt(&self) {
        let mut state = self.lock();
        state.session.close_auth_prompt();
        state.discard_prompt();
    }

    fn current_flow(&self) -> Result<Arc<AuthFlow>, AuthError> {
        let state = self.lock();
        state
            .session
            .prompt_role()
            .and(state.auth.clone())
            .ok_or(AuthError::NoPrompt)
    }

    /// Submit the login form of the open prompt.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::NoPrompt`] if no prompt is open,
    /// [`AuthError::Cancelled`] if the prompt was closed or replaced while
    /// the submission ran, or whatever the auth flow or session refused.
    pub async fn login(&self, form: LoginForm) -> Result<AuthOutcome, AuthError> {
        let flow = self.current_flow()?;
        let identity = flow
            .login(form, self.ctx.identities.as_ref(), &self.ctx.settings)
            .await?;
        self.complete(&flow, identity, Notice::welcome_back)
    }

    /// Submit the signup form of the open prompt.
    ///
    /// # Errors
    ///
    /// Same as [`Portal::login`].
    pub async fn signup(&self, form: SignupForm) -> Result<AuthOutcome, AuthError> {
        let flow = self.current_flow()?;
        let identity = flow
            .signup(form, self.ctx.identities.as_ref(), &self.ctx.settings)
            .await?;
        self.complete(&flow, identity, Notice::account_created)
    }

    /// Install `identity` if `flow` is still the open prompt.
    fn complete(
        &self,
        flow: &Arc<AuthFlow>,
        identity: Identity,
        notice: fn(Role) -> Notice,
    ) -> Result<AuthOutcome, AuthError> {
        let mut state = self.lock();
        let current = state.auth.as_ref().is_some_and(|f| Arc::ptr_eq(f, flow));
        if !current || flow.is_cancelled() {
            tracing::debug!(user_id = %identity.user_id, "Discarding stale auth result");
            return Err(AuthError::Cancelled);
        }

        state.session.complete_auth(identity.clone())?;
        state.auth = None;

        let dashboard = Dashboard::open(
            identity.clone(),
            Arc::clone(&self.ctx.donations),
            self.ctx.settings,
        );
        let kind = dashboard.kind();
        state.dashboard = Some(Arc::new(dashboard));
        drop(state);

        set_sentry_user(&identity.user_id, Some(identity.email.as_str()));
        tracing::info!(user_id = %identity.user_id, role = %identity.role, "Signed in");
        Ok(AuthOutcome {
            notice: notice(identity.role),
            dashboard: kind,
            identity,
        })
    }

    /// Sign out, cancelling everything still in flight. Safe to repeat.
    pub fn logout(&self) -> Option<Identity> {
        let mut state = self.lock();
        state.discard_prompt();
        if let Some(dashboard) = state.dashboard.take() {
            dashboard.close();
        }
        let identity = state.session.logout();
        drop(state);

        if let Some(identity) = &identity {
            clear_sentry_user();
            tracing::info!(user_id = %identity.user_id, "Signed out");
        }
        identity
    }

    #[must_use]
    pub fn identity(&self) -> Option<Identity> {
        self.lock().session.identity().cloned()
    }

    /// The routed dashboard.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::NotAuthenticated`] on the landing surface.
    pub fn dashboard(&self) -> Result<Arc<Dashboard>, WorkflowError> {
        self.lock()
            .dashboard
            .clone()
            .ok_or(WorkflowError::NotAuthenticated)
    }

    /// # Errors
    ///
    /// Returns [`WorkflowError::NotAuthenticated`] on the landing surface,
    /// or a backend error.
    pub async fn notifications(&self) -> Result<Vec<Notification>, WorkflowError> {
        let dashboard = self.dashboard()?;
        Ok(self
            .ctx
            .donations
            .list_notifications(dashboard.identity().user_id)
            .await?)
    }

    /// # Errors
    ///
    /// Returns [`WorkflowError::NotAuthenticated`] on the landing surface,
    /// or a backend error if the notification is not the user's.
    pub async fn mark_notification_read(&self, id: NotificationId) -> Result<(), WorkflowError> {
        let dashboard = self.dashboard()?;
        self.ctx
            .donations
            .mark_notification_read(dashboard.identity().user_id, id)
            .await?;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`WorkflowError::NotAuthenticated`] on the landing surface,
    /// or a backend error.
    pub async fn nav(&self) -> Result<NavView, WorkflowError> {
        let unread = self.notifications().await?.iter().filter(|n| !n.read).count();
        let dashboard = self.dashboard()?;
        let identity = dashboard.identity();
        Ok(NavView {
            name: identity.name.clone(),
            email: identity.email.as_str().to_owned(),
            role: identity.role,
            role_label: identity.role.display_name(),
            unread,
            badge: badge_text(unread),
        })
    }
}

/// Every client's portal, keyed by the id in its cookie session.
///
/// Portals idle for longer than the session expiry, or pushed out once
/// `max_portals` is reached, are dropped and their in-flight work cancelled.
pub struct PortalRegistry {
    ctx: PortalContext,
    portals: Cache<Uuid, Arc<Portal>>,
}

impl PortalRegistry {
    #[must_use]
    pub fn new(ctx: PortalContext, max_portals: u64, idle_timeout: Duration) -> Self {
        let portals = Cache::builder()
            .max_capacity(max_portals)
            .time_to_idle(idle_timeout)
            .eviction_listener(|client_id: Arc<Uuid>, portal: Arc<Portal>, cause| {
                tracing::debug!(client_id = %client_id, cause = ?cause, "Portal evicted");
                portal.logout();
            })
            .build();
        Self { ctx, portals }
    }

    /// The portal for `client_id`, created on first use.
    #[must_use]
    pub fn get_or_create(&self, client_id: Uuid) -> Arc<Portal> {
        self.portals
            .get_with(client_id, || Arc::new(Portal::new(self.ctx.clone())))
    }

    /// Portals currently held, after pending evictions have run.
    #[must_use]
    pub fn len(&self) -> usize {
        self.portals.run_pending_tasks();
        usize::try_from(self.portals.entry_count()).unwrap_or(usize::MAX)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use replate_core::{FoodLogDraft, FoodType, PickupLocation, PickupTime};
    use secrecy::SecretString;
    use tokio::time::Instant;

    use super::*;
    use crate::backend::InMemoryBackend;
    use crate::services::task::RetryPolicy;

    const LATENCY: Duration = Duration::from_millis(1500);

    fn portal() -> Portal {
        let backend = Arc::new(InMemoryBackend::new());
        Portal::new(PortalContext {
            donations: Arc::clone(&backend) as SharedDonationBackend,
            identities: backend,
            settings: TaskSettings {
                latency: LATENCY,
                retry: RetryPolicy::new(3, Duration::from_millis(100), Duration::from_secs(1)),
            },
        })
    }

    fn login(email: &str, password: &str) -> LoginForm {
        LoginForm {
            email: email.to_string(),
            password: SecretString::from(password),
        }
    }

    fn signup(name: &str, password: &str, confirm: &str) -> SignupForm {
        SignupForm {
            name: name.to_string(),
            email: "new@x.com".to_string(),
            password: SecretString::from(password),
            confirm_password: SecretString::from(confirm),
            organization: Some("Food Angels".to_string()),
            phone: None,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_staff_login_routes_to_staff_dashboard() {
        let portal = portal();
        portal.select_role(Role::Staff).unwrap();

        let outcome = portal.login(login("s@x.com", "pw")).await.unwrap();

        assert_eq!(outcome.identity.name, "s");
        assert_eq!(outcome.identity.role, Role::Staff);
        assert_eq!(outcome.dashboard, DashboardKind::Staff);
        assert_eq!(outcome.notice.title, "Welcome back!");
        assert_eq!(portal.dashboard().unwrap().kind(), DashboardKind::Staff);
        assert!(matches!(portal.landing(), LandingView::Redirect { .. }));
        assert!(portal.prompt().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_signup_password_mismatch_keeps_prompt_open() {
        let portal = portal();
        portal.select_role(Role::Volunteer).unwrap();

        let start = Instant::now();
        let err = portal.signup(signup("Asha", "p1", "p2")).await.unwrap_err();

        assert_eq!(err, AuthError::PasswordMismatch);
        assert_eq!(start.elapsed(), Duration::ZERO);
        assert!(portal.identity().is_none());
        let prompt = portal.prompt().unwrap();
        assert_eq!(prompt.role, Role::Volunteer);
        assert_eq!(prompt.signup.name, "Asha");
        assert_eq!(prompt.signup.organization, "Food Angels");
    }

    #[tokio::test(start_paused = true)]
    async fn test_signup_preserves_selected_role() {
        for role in Role::ALL {
            let portal = portal();
            portal.select_role(role).unwrap();
            let outcome = portal.signup(signup("Asha", "p1", "p1")).await.unwrap();
            assert_eq!(outcome.identity.role, role);
            assert_eq!(outcome.identity.name, "Asha");
            assert_eq!(outcome.notice.title, "Account created!");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_closing_prompt_cancels_login() {
        let portal = portal();
        portal.select_role(Role::Admin).unwrap();

        let (result, ()) = tokio::join!(portal.login(login("a@x.com", "pw")), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            portal.close_prompt();
        });

        assert_eq!(result.unwrap_err(), AuthError::Cancelled);
        assert!(portal.identity().is_none());
        assert!(portal.dashboard().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_reselecting_role_discards_stale_login() {
        let portal = portal();
        portal.select_role(Role::Staff).unwrap();

        let (result, ()) = tokio::join!(portal.login(login("s@x.com", "pw")), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            portal.select_role(Role::Volunteer).unwrap();
        });

        assert_eq!(result.unwrap_err(), AuthError::Cancelled);
        assert!(portal.identity().is_none());
        assert_eq!(portal.prompt().unwrap().role, Role::Volunteer);
    }

    #[tokio::test(start_paused = true)]
    async fn test_logout_is_idempotent_and_closes_dashboard() {
        let portal = portal();
        portal.select_role(Role::Staff).unwrap();
        portal.login(login("s@x.com", "pw")).await.unwrap();
        let dashboard = portal.dashboard().unwrap();

        assert!(portal.logout().is_some());
        assert!(dashboard.is_closed());
        assert!(portal.logout().is_none());
        assert!(portal.identity().is_none());
        let LandingView::Landing { cards, prompt } = portal.landing() else {
            panic!("expected landing surface");
        };
        assert_eq!(cards.len(), 3);
        assert!(prompt.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_logout_cancels_dashboard_work() {
        let portal = portal();
        portal.select_role(Role::Staff).unwrap();
        portal.login(login("s@x.com", "pw")).await.unwrap();
        let dashboard = portal.dashboard().unwrap();
        let staff = dashboard.staff().unwrap();
        staff.update_draft(FoodLogDraft {
            food_type: Some(FoodType::Snacks),
            quantity: "20 packets".to_string(),
            pickup_time: PickupTime::from_hm(17, 0),
            location: Some(PickupLocation::StaffCanteen),
            ..FoodLogDraft::default()
        });

        let (result, _) = tokio::join!(staff.submit(), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            portal.logout()
        });

        assert_eq!(result.unwrap_err(), WorkflowError::Cancelled);
    }

    #[tokio::test(start_paused = true)]
    async fn test_nav_counts_unread_notifications() {
        let portal = portal();
        assert_eq!(portal.nav().await.unwrap_err(), WorkflowError::NotAuthenticated);

        portal.select_role(Role::Volunteer).unwrap();
        portal.login(login("v@x.com", "pw")).await.unwrap();
        let nav = portal.nav().await.unwrap();
        assert_eq!(nav.name, "v");
        assert_eq!(nav.role_label, "Volunteer");
        assert_eq!(nav.unread, 0);
        assert_eq!(nav.badge, None);
    }

    fn registry(max_portals: u64, idle_timeout: Duration) -> PortalRegistry {
        let backend = Arc::new(InMemoryBackend::new());
        PortalRegistry::new(
            PortalContext {
                donations: Arc::clone(&backend) as SharedDonationBackend,
                identities: backend,
                settings: TaskSettings::immediate(),
            },
            max_portals,
            idle_timeout,
        )
    }

    #[test]
    fn test_registry_reuses_portals() {
        let registry = registry(100, Duration::from_secs(60));
        let id = Uuid::new_v4();

        let first = registry.get_or_create(id);
        let again = registry.get_or_create(id);
        let other = registry.get_or_create(Uuid::new_v4());

        assert!(Arc::ptr_eq(&first, &again));
        assert!(!Arc::ptr_eq(&first, &other));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_registry_is_bounded() {
        let registry = registry(20, Duration::from_secs(60));
        for _ in 0..500 {
            let _ = registry.get_or_create(Uuid::new_v4());
        }
        assert!(registry.len() <= 20, "registry holds {}", registry.len());
    }

    #[tokio::test]
    async fn test_idle_portal_is_evicted_and_signed_out() {
        let registry = registry(100, Duration::from_millis(50));
        let portal = registry.get_or_create(Uuid::new_v4());
        portal.select_role(Role::Staff).unwrap();
        portal.login(login("s@x.com", "pw")).await.unwrap();
        let dashboard = portal.dashboard().unwrap();

        tokio::time::sleep(Duration::from_millis(200)).await;

        assert!(registry.is_empty());
        assert!(portal.identity().is_none());
        assert!(dashboard.is_closed());
    }
}
