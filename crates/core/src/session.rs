//! The session model: who is signed in, and whether an auth prompt is open.
//!
//! Pure state transitions, no I/O. A session starts unauthenticated on the
//! landing surface; selecting a role opens the auth prompt for it; a
//! successful login or signup completes the session; logout returns to the
//! landing surface.

use serde::Serialize;
use thiserror::Error;

use crate::dashboard::{DashboardKind, route};
use crate::types::{Identity, Role};

/// Errors raised by illegal session transitions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// A role was selected while someone is signed in.
    #[error("already signed in as {0}")]
    AlreadyAuthenticated(Role),

    /// Authentication completed without a role having been selected.
    #[error("no role was selected before authenticating")]
    NoPendingRole,

    /// The authenticated identity carries a different role than the one
    /// selected on the landing surface.
    #[error("identity role {actual} does not match selected role {expected}")]
    RoleMismatch {
        /// Role selected on the landing surface.
        expected: Role,
        /// Role carried by the identity.
        actual: Role,
    },
}

/// Session state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    identity: Option<Identity>,
    pending_role: Option<Role>,
    auth_prompt_visible: bool,
}

/// What the page shows for a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "surface", rename_all = "snake_case")]
pub enum SessionView<'a> {
    /// Role selection, with the auth prompt open for `prompt` if any.
    Landing { prompt: Option<Role> },
    /// Navigation shell plus the routed dashboard.
    Authenticated {
        identity: &'a Identity,
        dashboard: DashboardKind,
    },
}

impl Session {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    #[must_use]
    pub const fn pending_role(&self) -> Option<Role> {
        self.pending_role
    }

    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }

    #[must_use]
    pub const fn auth_prompt_visible(&self) -> bool {
        self.auth_prompt_visible
    }

    /// Role the auth prompt is shown for. Falls back to staff when the
    /// prompt is visible without a selection.
    #[must_use]
    pub fn prompt_role(&self) -> Option<Role> {
        self.auth_prompt_visible
            .then(|| self.pending_role.unwrap_or(Role::Staff))
    }

    /// Select a role on the landing surface and open its auth prompt.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::AlreadyAuthenticated`] if someone is signed
    /// in; the landing surface is not reachable then.
    pub fn select_role(&mut self, role: Role) -> Result<(), SessionError> {
        if let Some(identity) = &self.identity {
            return Err(SessionError::AlreadyAuthenticated(identity.role));
        }
        self.pending_role = Some(role);
        self.auth_prompt_visible = true;
        Ok(())
    }

    /// Dismiss the auth prompt, keeping the selected role.
    pub fn close_auth_prompt(&mut self) {
        self.auth_prompt_visible = false;
    }

    /// Install the identity produced by a successful auth flow.
    ///
    /// On error the session is left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::AlreadyAuthenticated`] if someone is already
    /// signed in, [`SessionError::NoPendingRole`] if no role was selected and
    /// [`SessionError::RoleMismatch`] if the identity's role differs from
    /// the selected one.
    pub fn complete_auth(&mut self, identity: Identity) -> Result<(), SessionError> {
        if let Some(current) = &self.identity {
            return Err(SessionError::AlreadyAuthenticated(current.role));
        }
        let expected = self.pending_role.ok_or(SessionError::NoPendingRole)?;
        if identity.role != expected {
            return Err(SessionError::RoleMismatch {
                expected,
                actual: identity.role,
            });
        }

        self.identity = Some(identity);
        self.pending_role = None;
        self.auth_prompt_visible = false;
        Ok(())
    }

    /// Sign out. Safe to call when nobody is signed in.
    ///
    /// Returns the identity that was signed out, if any.
    pub fn logout(&mut self) -> Option<Identity> {
        self.pending_role = None;
        self.auth_prompt_visible = false;
        self.identity.take()
    }

    /// The routed dashboard, `None` on the landing surface.
    #[must_use]
    pub fn dashboard(&self) -> Option<DashboardKind> {
        self.identity.as_ref().map(|identity| route(identity.role))
    }

    #[must_use]
    pub fn view(&self) -> SessionView<'_> {
        match &self.identity {
            Some(identity) => SessionView::Authenticated {
                identity,
                dashboard: route(identity.role),
            },
            None => SessionView::Landing {
                prompt: self.prompt_role(),
            },
        }
    }
}
