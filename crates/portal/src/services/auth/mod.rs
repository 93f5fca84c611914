//! Auth prompt service.
//!
//! One [`AuthFlow`] exists per open auth prompt. It owns the prompt's
//! cancellation token, the busy flags of its two forms and the values typed
//! into them, so a failed submission can be corrected instead of retyped.
//! Passwords are only ever held as [`SecretString`] and never retained.

mod error;

pub use error::AuthError;

use std::sync::{Mutex, MutexGuard, PoisonError};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use replate_core::{Email, Identity, Role};

use crate::backend::{Credentials, IdentityBackend, Registration};
use crate::services::task::{InFlight, TaskSettings, retry, round_trip};

/// Which tab of the prompt is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMode {
    #[default]
    Login,
    Signup,
}

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    pub password: SecretString,
}

/// Signup form data.
#[derive(Debug, Deserialize)]
pub struct SignupForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    pub password: SecretString,
    pub confirm_password: SecretString,
    /// Only kept for volunteers.
    #[serde(default)]
    pub organization: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

/// Login values kept between submissions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoginDraft {
    pub email: String,
}

/// Signup values kept between submissions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SignupDraft {
    pub name: String,
    pub email: String,
    pub organization: String,
    pub phone: String,
}

#[derive(Debug, Default)]
struct Drafts {
    mode: AuthMode,
    login: LoginDraft,
    signup: SignupDraft,
}

/// What the auth prompt shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthPromptView {
    pub role: Role,
    pub title: &'static str,
    pub description: &'static str,
    pub shows_organization_field: bool,
    pub mode: AuthMode,
    pub login: LoginDraft,
    pub signup: SignupDraft,
    pub login_in_flight: bool,
    pub signup_in_flight: bool,
}

/// State behind one open auth prompt.
#[derive(Debug)]
pub struct AuthFlow {
    role: Role,
    cancel: CancellationToken,
    drafts: Mutex<Drafts>,
    login_busy: InFlight,
    signup_busy: InFlight,
}

impl AuthFlow {
    #[must_use]
    pub fn new(role: Role) -> Self {
        Self {
            role,
            cancel: CancellationToken::new(),
            drafts: Mutex::default(),
            login_busy: InFlight::default(),
            signup_busy: InFlight::default(),
        }
    }

    #[must_use]
    pub const fn role(&self) -> Role {
        self.role
    }

    /// Abandon the prompt. Pending submissions finish with
    /// [`AuthError::Cancelled`].
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn set_mode(&self, mode: AuthMode) {
        self.drafts().mode = mode;
    }

    #[must_use]
    pub fn view(&self) -> AuthPromptView {
        let drafts = self.drafts();
        AuthPromptView {
            role: self.role,
            title: self.role.prompt_title(),
            description: self.role.prompt_description(),
            shows_organization_field: self.role.shows_organization_field(),
            mode: drafts.mode,
            login: drafts.login.clone(),
            signup: drafts.signup.clone(),
            login_in_flight: self.login_busy.is_active(),
            signup_in_flight: self.signup_busy.is_active(),
        }
    }

    fn drafts(&self) -> MutexGuard<'_, Drafts> {
        self.drafts.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Submit the login form.
    ///
    /// An email with the wrong shape is rejected at once. Everything else is
    /// decided after the simulated round trip: empty fields are rejected,
    /// anything else goes to the identity backend.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::SubmissionInFlight`] while a login is running,
    /// [`AuthError::InvalidEmail`], [`AuthError::CredentialsRejected`],
    /// [`AuthError::Cancelled`] or a backend error.
    #[tracing::instrument(skip_all, fields(role = %self.role))]
    pub async fn login(
        &self,
        form: LoginForm,
        identities: &dyn IdentityBackend,
        settings: &TaskSettings,
    ) -> Result<Identity, AuthError> {
        let _busy = self
            .login_busy
            .try_begin()
            .ok_or(AuthError::SubmissionInFlight)?;
        {
            let mut drafts = self.drafts();
            drafts.mode = AuthMode::Login;
            drafts.login.email.clone_from(&form.email);
        }

        let email = form.email.trim();
        let email = if email.is_empty() {
            None
        } else {
            Some(Email::parse(email)?)
        };

        round_trip(&self.cancel, settings.latency)
            .await
            .map_err(|_| AuthError::Cancelled)?;

        let (Some(email), false) = (email, form.password.expose_secret().is_empty()) else {
            tracing::info!("Login rejected: missing credentials");
            return Err(AuthError::CredentialsRejected);
        };

        let credentials = &Credentials {
            email,
            password: form.password,
        };
        let role = self.role;
        let identity = retry(&settings.retry, &self.cancel, move || {
            identities.authenticate(credentials, role)
        })
        .await?;

        tracing::info!(user_id = %identity.user_id, "Login succeeded");
        Ok(identity)
    }

    /// Submit the signup form.
    ///
    /// Differing passwords and empty required fields are rejected at once,
    /// without a round trip.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::SubmissionInFlight`] while a signup is running,
    /// [`AuthError::PasswordMismatch`], [`AuthError::MissingField`],
    /// [`AuthError::InvalidEmail`], [`AuthError::Cancelled`] or a backend
    /// error.
    #[tracing::instrument(skip_all, fields(role = %self.role))]
    pub async fn signup(
        &self,
        form: SignupForm,
        identities: &dyn IdentityBackend,
        settings: &TaskSettings,
    ) -> Result<Identity, AuthError> {
        let _busy = self
            .signup_busy
            .try_begin()
            .ok_or(AuthError::SubmissionInFlight)?;
        {
            let mut drafts = self.drafts();
            drafts.mode = AuthMode::Signup;
            drafts.signup = SignupDraft {
                name: form.name.clone(),
                email: form.email.clone(),
                organization: form.organization.clone().unwrap_or_default(),
                phone: form.phone.clone().unwrap_or_default(),
            };
        }

        if form.password.expose_secret() != form.confirm_password.expose_secret() {
            tracing::info!("Signup rejected: password mismatch");
            return Err(AuthError::PasswordMismatch);
        }

        let name = form.name.trim();
        if name.is_empty() {
            return Err(AuthError::MissingField("name"));
        }
        let email = form.email.trim();
        if email.is_empty() {
            return Err(AuthError::MissingField("email"));
        }
        let email = Email::parse(email)?;
        if form.password.expose_secret().is_empty() {
            return Err(AuthError::MissingField("password"));
        }

        round_trip(&self.cancel, settings.latency)
            .await
            .map_err(|_| AuthError::Cancelled)?;

        let registration = &Registration {
            name: name.to_owned(),
            email,
            password: form.password,
            organization: form
                .organization
                .filter(|_| self.role.shows_organization_field()),
            phone: form.phone,
        };
        let role = self.role;
        let identity = retry(&settings.retry, &self.cancel, move || {
            identities.register(registration, role)
        })
        .await?;

        tracing::info!(user_id = %identity.user_id, "Signup succeeded");
        Ok(identity)
    }
}
