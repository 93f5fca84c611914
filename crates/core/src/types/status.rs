//! Status enums for donations.
//!
//! Both enums mirror the backend's `urgency_level` and `delivery_status`
//! enumerations.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Display emphasis for a badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    Success,
    Warning,
    Destructive,
    Primary,
    Muted,
}

/// Qualitative pickup priority attached to a donation.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    Low,
    #[default]
    Medium,
    High,
}

impl Urgency {
    /// Label shown on a posting.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::High => "Urgent",
            Self::Medium => "Moderate",
            Self::Low => "Low Priority",
        }
    }

    #[must_use]
    pub const fn tone(self) -> Tone {
        match self {
            Self::High => Tone::Destructive,
            Self::Medium => Tone::Warning,
            Self::Low => Tone::Success,
        }
    }
}

impl std::fmt::Display for Urgency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
        }
    }
}

/// Delivery status of a donation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    /// Logged by staff, available for pickup.
    #[default]
    Pending,
    /// Claimed by a volunteer.
    Accepted,
    /// Picked up, on its way.
    InTransit,
    /// Handed over at the destination.
    Delivered,
    /// Withdrawn before delivery.
    Cancelled,
}

/// Error returned for an illegal status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("cannot move a donation from {from} to {to}")]
pub struct TransitionError {
    pub from: DeliveryStatus,
    pub to: DeliveryStatus,
}

impl DeliveryStatus {
    /// Whether `self -> next` is a legal move.
    ///
    /// `Accepted -> Pending` is a volunteer retracting a claim.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Accepted | Self::Cancelled)
                | (
                    Self::Accepted,
                    Self::InTransit | Self::Pending | Self::Cancelled
                )
                | (Self::InTransit, Self::Delivered)
        )
    }

    /// Checked transition.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError`] if the move is not legal.
    pub const fn transition_to(self, next: Self) -> Result<Self, TransitionError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(TransitionError {
                from: self,
                to: next,
            })
        }
    }

    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }

    /// Whether a volunteer holds the donation (claimed and not yet finished).
    #[must_use]
    pub const fn is_claimed(self) -> bool {
        matches!(self, Self::Accepted | Self::InTransit)
    }

    /// Label shown on the staff log list.
    #[must_use]
    pub const fn staff_label(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Accepted | Self::InTransit => "Picked up",
            Self::Delivered => "Delivered",
            Self::Cancelled => "Cancelled",
        }
    }

    #[must_use]
    pub const fn tone(self) -> Tone {
        match self {
            Self::Pending => Tone::Warning,
            Self::Accepted | Self::InTransit => Tone::Primary,
            Self::Delivered => Tone::Success,
            Self::Cancelled => Tone::Muted,
        }
    }
}

impl std::fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Accepted => write!(f, "accepted"),
            Self::InTransit => write!(f, "in_transit"),
            Self::Delivered => write!(f, "delivered"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path_transitions() {
        assert!(DeliveryStatus::Pending.can_transition_to(DeliveryStatus::Accepted));
        assert!(DeliveryStatus::Accepted.can_transition_to(DeliveryStatus::InTransit));
        assert!(DeliveryStatus::InTransit.can_transition_to(DeliveryStatus::Delivered));
    }

    #[test]
    fn test_retraction_is_legal() {
        assert_eq!(
            DeliveryStatus::Accepted.transition_to(DeliveryStatus::Pending),
            Ok(DeliveryStatus::Pending)
        );
    }

    #[test]
    fn test_terminal_states_are_final() {
        for next in [
            DeliveryStatus::Pending,
            DeliveryStatus::Accepted,
            DeliveryStatus::InTransit,
            DeliveryStatus::Delivered,
            DeliveryStatus::Cancelled,
        ] {
            assert!(!DeliveryStatus::Delivered.can_transition_to(next));
            assert!(!DeliveryStatus::Cancelled.can_transition_to(next));
        }
    }

    #[test]
    fn test_cannot_skip_pickup() {
        let err = DeliveryStatus::Pending
            .transition_to(DeliveryStatus::Delivered)
            .unwrap_err();
        assert_eq!(err.from, DeliveryStatus::Pending);
        assert_eq!(
            err.to_string(),
            "cannot move a donation from pending to delivered"
        );
    }

    #[test]
    fn test_urgency_labels() {
        assert_eq!(Urgency::High.label(), "Urgent");
        assert_eq!(Urgency::Medium.label(), "Moderate");
        assert_eq!(Urgency::Low.label(), "Low Priority");
        assert!(Urgency::High > Urgency::Low);
    }

    #[test]
    fn test_staff_label_groups_claimed_states() {
        assert_eq!(DeliveryStatus::Accepted.staff_label(), "Picked up");
        assert_eq!(DeliveryStatus::InTransit.staff_label(), "Picked up");
    }
}
