//! Toast notices shown after user actions.

use serde::Serialize;

use crate::types::{Role, Tone};

/// A transient notice: title, body and tone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub title: String,
    pub description: String,
    pub tone: Tone,
}

impl Notice {
    fn new(title: impl Into<String>, description: impl Into<String>, tone: Tone) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            tone,
        }
    }

    #[must_use]
    pub fn welcome_back(role: Role) -> Self {
        Self::new(
            "Welcome back!",
            format!("Successfully logged in as {}", role.prompt_title()),
            Tone::Success,
        )
    }

    #[must_use]
    pub fn account_created(role: Role) -> Self {
        Self::new(
            "Account created!",
            format!("Welcome to RePlate as {}", role.prompt_title()),
            Tone::Success,
        )
    }

    #[must_use]
    pub fn login_failed() -> Self {
        Self::new(
            "Login failed",
            "Please check your credentials and try again.",
            Tone::Destructive,
        )
    }

    #[must_use]
    pub fn signup_failed(reason: impl Into<String>) -> Self {
        Self::new("Signup failed", reason, Tone::Destructive)
    }

    #[must_use]
    pub fn password_mismatch() -> Self {
        Self::new(
            "Password mismatch",
            "Please ensure passwords match.",
            Tone::Destructive,
        )
    }

    #[must_use]
    pub fn food_logged() -> Self {
        Self::new(
            "Food logged successfully!",
            "Volunteers will be notified about the available food.",
            Tone::Success,
        )
    }

    #[must_use]
    pub fn pickup_accepted() -> Self {
        Self::new(
            "Pickup accepted!",
            "You'll receive pickup details shortly.",
            Tone::Success,
        )
    }

    #[must_use]
    pub fn pickup_declined() -> Self {
        Self::new(
            "Pickup declined",
            "The food will remain available for other volunteers.",
            Tone::Muted,
        )
    }

    #[must_use]
    pub fn delivery_updated(status_label: &str) -> Self {
        Self::new(
            "Delivery updated",
            format!("Status changed to {status_label}."),
            Tone::Primary,
        )
    }

    #[must_use]
    pub fn error(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(title, description, Tone::Destructive)
    }
}
