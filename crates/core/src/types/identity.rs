//! Authenticated identities and user profiles.

use serde::{Deserialize, Serialize};

use super::email::Email;
use super::id::UserId;
use super::role::Role;

/// The authenticated user of a session.
///
/// Produced only by a successful login or signup. The role is fixed for the
/// lifetime of the identity; switching roles means authenticating again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: UserId,
    pub name: String,
    pub email: Email,
    pub role: Role,
}

/// Profile details captured at signup.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Profile {
    pub full_name: String,
    /// Organization/NGO, only collected for volunteers.
    pub organization: Option<String>,
    pub phone: Option<String>,
}

impl Profile {
    /// Name to show for this user: the organization for NGO volunteers,
    /// the full name otherwise.
    #[must_use]
    pub fn public_name(&self) -> &str {
        self.organization.as_deref().unwrap_or(&self.full_name)
    }
}
