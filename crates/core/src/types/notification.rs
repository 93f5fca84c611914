//! In-app notifications.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::{DonationId, NotificationId, UserId};

/// What triggered a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// New food was logged.
    FoodAvailable,
    /// A volunteer claimed a donation.
    PickupAccepted,
    /// A volunteer gave a claimed donation back.
    PickupReleased,
    /// A claimed donation changed delivery status.
    DeliveryUpdate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub user_id: UserId,
    pub donation_id: Option<DonationId>,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

/// Badge text for an unread count; `None` hides the badge.
#[must_use]
pub fn badge_text(unread: usize) -> Option<String> {
    match unread {
        0 => None,
        1..=9 => Some(unread.to_string()),
        _ => Some("9+".to_string()),
    }
}
