//! Portal roles and the copy attached to each of them.

use serde::{Deserialize, Serialize};

/// A portal role.
///
/// The set is closed: every role-dependent branch in the workspace matches
/// exhaustively, so adding a role is a compile-time-checked change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Mess/canteen staff who log surplus food.
    Staff,
    /// Volunteers and NGOs who claim and deliver food.
    Volunteer,
    /// Administrators who monitor the system.
    Admin,
}

impl Role {
    /// Every role, in landing-page order.
    pub const ALL: [Self; 3] = [Self::Staff, Self::Volunteer, Self::Admin];

    /// Short label shown in the navigation shell.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Staff => "Mess Staff",
            Self::Volunteer => "Volunteer",
            Self::Admin => "Administrator",
        }
    }

    /// Heading of the auth prompt for this role.
    #[must_use]
    pub const fn prompt_title(self) -> &'static str {
        match self {
            Self::Staff => "Mess/Canteen Staff",
            Self::Volunteer => "Volunteer/NGO",
            Self::Admin => "Administrator",
        }
    }

    /// Sub-heading of the auth prompt for this role.
    #[must_use]
    pub const fn prompt_description(self) -> &'static str {
        match self {
            Self::Staff => "Access food logging and management features",
            Self::Volunteer => "Receive notifications and manage food pickups",
            Self::Admin => "Full system access with analytics and reports",
        }
    }

    /// Whether signup asks for an organization/NGO name.
    #[must_use]
    pub const fn shows_organization_field(self) -> bool {
        matches!(self, Self::Volunteer)
    }

    /// The landing-page card for this role.
    #[must_use]
    pub const fn card(self) -> RoleCard {
        match self {
            Self::Staff => RoleCard {
                role: self,
                title: "Mess/Canteen Staff",
                description: "Log leftover food and track distributions",
                features: &[
                    "Log leftover food items",
                    "Upload hygiene photos",
                    "Set pickup times",
                    "View distribution history",
                ],
            },
            Self::Volunteer => RoleCard {
                role: self,
                title: "Volunteers & NGOs",
                description: "Receive notifications and manage pickups",
                features: &[
                    "Real-time food notifications",
                    "Accept/decline pickups",
                    "Log delivery status",
                    "Track your impact",
                ],
            },
            Self::Admin => RoleCard {
                role: self,
                title: "Administrator",
                description: "Monitor system and generate reports",
                features: &[
                    "View comprehensive dashboard",
                    "Generate reports",
                    "Manage users",
                    "Analytics & insights",
                ],
            },
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Staff => write!(f, "staff"),
            Self::Volunteer => write!(f, "volunteer"),
            Self::Admin => write!(f, "admin"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "staff" => Ok(Self::Staff),
            "volunteer" => Ok(Self::Volunteer),
            "admin" => Ok(Self::Admin),
            _ => Err(format!("invalid role: {s}")),
        }
    }
}

/// A role card on the landing surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RoleCard {
    pub role: Role,
    pub title: &'static str,
    pub description: &'static str,
    pub features: &'static [&'static str],
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_role_string_roundtrip() {
        for role in Role::ALL {
            let parsed: Role = role.to_string().parse().unwrap();
            assert_eq!(parsed, role);
        }
        assert!("ngo".parse::<Role>().is_err());
    }

    #[test]
    fn test_only_volunteer_signup_asks_for_organization() {
        assert!(!Role::Staff.shows_organization_field());
        assert!(Role::Volunteer.shows_organization_field());
        assert!(!Role::Admin.shows_organization_field());
    }

    #[test]
    fn test_every_card_lists_four_features() {
        for role in Role::ALL {
            let card = role.card();
            assert_eq!(card.role, role);
            assert_eq!(card.features.len(), 4);
        }
    }

    #[test]
    fn test_serde_uses_snake_case() {
        assert_eq!(
            serde_json::to_string(&Role::Volunteer).unwrap(),
            "\"volunteer\""
        );
    }
}
