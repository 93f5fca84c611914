//! Role dashboards.
//!
//! A [`Dashboard`] is opened for an identity right after authentication and
//! is routed by role: each variant carries only the workflow state its role
//! needs. Closing a dashboard cancels every round trip it still has in
//! flight.

pub mod admin;
pub mod staff;
pub mod volunteer;

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use replate_core::dashboard::{DashboardKind, route};
use replate_core::notice::Notice;
use replate_core::{DonationId, DraftError, Identity, UserId};

use crate::backend::{BackendError, DonationBackend, SharedDonationBackend};
use crate::services::task::{TaskError, TaskSettings};

pub use admin::{AdminDashboard, AdminSnapshot};
pub use staff::{StaffDashboard, StaffSnapshot};
pub use volunteer::{VolunteerDashboard, VolunteerSnapshot};

/// Errors raised by dashboard workflows.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowError {
    /// The food-log draft is incomplete.
    #[error(transparent)]
    Validation(#[from] DraftError),

    /// The form is already being submitted.
    #[error("a submission is already in progress")]
    InFlight,

    /// Another action on this donation is still running.
    #[error("an action on donation {0} is already in progress")]
    ItemInFlight(DonationId),

    /// The dashboard was closed before the action finished.
    #[error("dashboard closed before the action finished")]
    Cancelled,

    /// Nobody is signed in.
    #[error("not signed in")]
    NotAuthenticated,

    /// The action belongs to another role's dashboard.
    #[error("this action needs the {expected:?} dashboard, but the {actual:?} dashboard is open")]
    WrongDashboard {
        expected: DashboardKind,
        actual: DashboardKind,
    },

    #[error("backend error: {0}")]
    Backend(#[from] BackendError),
}

impl From<TaskError<BackendError>> for WorkflowError {
    fn from(err: TaskError<BackendError>) -> Self {
        match err {
            TaskError::Cancelled => Self::Cancelled,
            TaskError::Failed(e) => Self::Backend(e),
        }
    }
}

impl WorkflowError {
    /// The toast shown for this failure.
    #[must_use]
    pub fn notice(&self) -> Notice {
        match self {
            Self::Validation(err) => Notice::error("Missing information", capitalize(&err.to_string())),
            Self::InFlight | Self::ItemInFlight(_) => {
                Notice::error("Please wait", "Your previous action is still in progress.")
            }
            Self::Backend(BackendError::Conflict(_)) => Notice::error(
                "Pickup unavailable",
                "Another volunteer has already accepted this pickup.",
            ),
            Self::Backend(BackendError::NotFound(_)) => {
                Notice::error("Not found", "This item no longer exists.")
            }
            Self::NotAuthenticated | Self::WrongDashboard { .. } => {
                Notice::error("Access denied", "Please sign in with the right role.")
            }
            Self::Cancelled | Self::Backend(_) => {
                Notice::error("Something went wrong", "Please try again.")
            }
        }
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

/// What every dashboard variant is opened with.
pub struct Scope {
    identity: Identity,
    backend: SharedDonationBackend,
    settings: TaskSettings,
    cancel: CancellationToken,
}

impl Scope {
    fn new(identity: Identity, backend: SharedDonationBackend, settings: TaskSettings) -> Self {
        Self {
            identity,
            backend,
            settings,
            cancel: CancellationToken::new(),
        }
    }

    const fn user_id(&self) -> UserId {
        self.identity.user_id
    }

    fn backend(&self) -> &dyn DonationBackend {
        self.backend.as_ref()
    }

    /// Display names of every known user.
    async fn names(&self) -> Result<HashMap<UserId, String>, WorkflowError> {
        Ok(self
            .backend
            .user_directory()
            .await?
            .into_iter()
            .map(|u| (u.user_id, u.display_name))
            .collect())
    }
}

/// The dashboard routed for the signed-in identity.
pub enum Dashboard {
    Staff(StaffDashboard),
    Volunteer(VolunteerDashboard),
    Admin(AdminDashboard),
}

/// A dashboard's current contents.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "dashboard", rename_all = "snake_case")]
pub enum DashboardSnapshot {
    Staff(StaffSnapshot),
    Volunteer(VolunteerSnapshot),
    Admin(AdminSnapshot),
}

impl Dashboard {
    /// Open the dashboard `identity`'s role routes to.
    #[must_use]
    pub fn open(identity: Identity, backend: SharedDonationBackend, settings: TaskSettings) -> Self {
        let kind = route(identity.role);
        let scope = Scope::new(identity, backend, settings);
        tracing::debug!(user_id = %scope.user_id(), dashboard = ?kind, "Opening dashboard");
        match kind {
            DashboardKind::Staff => Self::Staff(StaffDashboard::new(scope)),
            DashboardKind::Volunteer => Self::Volunteer(VolunteerDashboard::new(scope)),
            DashboardKind::Admin => Self::Admin(AdminDashboard::new(scope)),
        }
    }

    #[must_use]
    pub const fn kind(&self) -> DashboardKind {
        match self {
            Self::Staff(_) => DashboardKind::Staff,
            Self::Volunteer(_) => DashboardKind::Volunteer,
            Self::Admin(_) => DashboardKind::Admin,
        }
    }

    const fn scope(&self) -> &Scope {
        match self {
            Self::Staff(d) => &d.scope,
            Self::Volunteer(d) => &d.scope,
            Self::Admin(d) => &d.scope,
        }
    }

    #[must_use]
    pub const fn identity(&self) -> &Identity {
        &self.scope().identity
    }

    /// Cancel everything still in flight on this dashboard.
    pub fn close(&self) {
        self.scope().cancel.cancel();
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.scope().cancel.is_cancelled()
    }

    fn wrong(&self, expected: DashboardKind) -> WorkflowError {
        WorkflowError::WrongDashboard {
            expected,
            actual: self.kind(),
        }
    }

    /// # Errors
    ///
    /// Returns [`WorkflowError::WrongDashboard`] unless this is the staff dashboard.
    pub fn staff(&self) -> Result<&StaffDashboard, WorkflowError> {
        match self {
            Self::Staff(d) => Ok(d),
            _ => Err(self.wrong(DashboardKind::Staff)),
        }
    }

    /// # Errors
    ///
    /// Returns [`WorkflowError::WrongDashboard`] unless this is the volunteer dashboard.
    pub fn volunteer(&self) -> Result<&VolunteerDashboard, WorkflowError> {
        match self {
            Self::Volunteer(d) => Ok(d),
            _ => Err(self.wrong(DashboardKind::Volunteer)),
        }
    }

    /// # Errors
    ///
    /// Returns [`WorkflowError::WrongDashboard`] unless this is the admin dashboard.
    pub fn admin(&self) -> Result<&AdminDashboard, WorkflowError> {
        match self {
            Self::Admin(d) => Ok(d),
            _ => Err(self.wrong(DashboardKind::Admin)),
        }
    }

    /// Load the dashboard's current contents.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::Backend`] if the backend cannot be read.
    pub async fn snapshot(&self, now: DateTime<Utc>) -> Result<DashboardSnapshot, WorkflowError> {
        Ok(match self {
            Self::Staff(d) => DashboardSnapshot::Staff(d.snapshot(now).await?),
            Self::Volunteer(d) => DashboardSnapshot::Volunteer(d.snapshot(now).await?),
            Self::Admin(d) => DashboardSnapshot::Admin(d.snapshot(now).await?),
        })
    }
}

/// `part` as a whole percentage of `whole`, `None` when `whole` is zero.
#[must_use]
pub fn percent(part: usize, whole: usize) -> Option<u8> {
    if whole == 0 {
        return None;
    }
    let pct = (part.min(whole) * 100 + whole / 2) / whole;
    u8::try_from(pct).ok()
}
