//! Core types for RePlate.
//!
//! This module provides type-safe wrappers for the domain concepts shared by
//! every dashboard.

pub mod donation;
pub mod email;
pub mod id;
pub mod identity;
pub mod notification;
pub mod role;
pub mod status;

pub use donation::{
    DietaryFlags, Donation, DraftError, FoodLogDraft, FoodType, NewDonation, PickupLocation,
    PickupTime, leading_quantity,
};
pub use email::{Email, EmailError};
pub use id::*;
pub use identity::{Identity, Profile};
pub use notification::{Notification, NotificationKind, badge_text};
pub use role::{Role, RoleCard};
pub use status::*;
