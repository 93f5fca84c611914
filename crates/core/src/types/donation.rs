//! Donation types: what staff log and volunteers claim.

use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use super::id::{DonationId, UserId};
use super::status::{DeliveryStatus, Urgency};

/// Kind of food being donated (the staff form's select options).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FoodType {
    Rice,
    Bread,
    Fruits,
    Vegetables,
    Snacks,
    Other,
}

impl FoodType {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Rice => "Rice & Curry",
            Self::Bread => "Bread & Sandwiches",
            Self::Fruits => "Fresh Fruits",
            Self::Vegetables => "Vegetables",
            Self::Snacks => "Snacks",
            Self::Other => "Other",
        }
    }
}

/// Campus pickup point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PickupLocation {
    MainMess,
    FoodCourt,
    HostelMess,
    StaffCanteen,
}

impl PickupLocation {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::MainMess => "Main Mess Hall",
            Self::FoodCourt => "Food Court",
            Self::HostelMess => "Hostel Mess",
            Self::StaffCanteen => "Staff Canteen",
        }
    }
}

/// Wall-clock pickup time.
///
/// Serialized as `HH:MM` (what a `type="time"` input submits); seconds are
/// accepted on input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PickupTime(NaiveTime);

impl PickupTime {
    #[must_use]
    pub const fn new(time: NaiveTime) -> Self {
        Self(time)
    }

    /// Build from hour and minute, `None` if out of range.
    #[must_use]
    pub fn from_hm(hour: u32, minute: u32) -> Option<Self> {
        NaiveTime::from_hms_opt(hour, minute, 0).map(Self)
    }

    #[must_use]
    pub const fn time(self) -> NaiveTime {
        self.0
    }

    /// Twelve-hour display, e.g. `2:30 PM`.
    #[must_use]
    pub fn display(self) -> String {
        self.0.format("%-I:%M %p").to_string()
    }
}

impl std::str::FromStr for PickupTime {
    type Err = chrono::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveTime::parse_from_str(s, "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
            .map(Self)
    }
}

impl std::fmt::Display for PickupTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.format("%H:%M"))
    }
}

impl Serialize for PickupTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PickupTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Dietary flags recorded with a donation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DietaryFlags {
    pub vegetarian: bool,
    pub vegan: bool,
    pub halal: bool,
    pub gluten_free: bool,
    pub dairy_free: bool,
}

/// A logged donation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Donation {
    pub id: DonationId,
    /// Staff member who logged it.
    pub staff_id: UserId,
    pub food_type: FoodType,
    /// Free-form quantity as entered, e.g. `15 portions`.
    pub quantity: String,
    /// Leading number of `quantity`, when there is one.
    pub quantity_numeric: Option<u32>,
    pub location: PickupLocation,
    pub pickup_time: PickupTime,
    pub status: DeliveryStatus,
    pub urgency: Urgency,
    pub description: Option<String>,
    /// Photo reference; nothing is uploaded.
    pub image: Option<String>,
    pub dietary: DietaryFlags,
    pub allergens: Vec<String>,
    /// Volunteer holding or having delivered the donation.
    pub accepted_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A validated donation ready to be submitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewDonation {
    pub food_type: FoodType,
    pub quantity: String,
    pub location: PickupLocation,
    pub pickup_time: PickupTime,
    pub urgency: Urgency,
    pub description: Option<String>,
    pub image: Option<String>,
    pub dietary: DietaryFlags,
    pub allergens: Vec<String>,
}

/// Errors raised when a food-log draft cannot be submitted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DraftError {
    /// One or more required fields are empty.
    #[error("missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),
}

/// The staff food-log form.
///
/// Every field starts empty; a draft becomes a [`NewDonation`] only through
/// [`FoodLogDraft::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FoodLogDraft {
    pub food_type: Option<FoodType>,
    pub quantity: String,
    pub pickup_time: Option<PickupTime>,
    pub location: Option<PickupLocation>,
    pub description: String,
    pub image: Option<String>,
    pub urgency: Option<Urgency>,
    pub dietary: DietaryFlags,
    pub allergens: Vec<String>,
}

impl FoodLogDraft {
    /// Whether every field is still at its reset value.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Check required fields and build the submission.
    ///
    /// # Errors
    ///
    /// Returns [`DraftError::MissingFields`] naming every empty required
    /// field (food type, quantity, location, pickup time).
    pub fn validate(&self) -> Result<NewDonation, DraftError> {
        let quantity = self.quantity.trim();

        let mut missing = Vec::new();
        if self.food_type.is_none() {
            missing.push("food type");
        }
        if quantity.is_empty() {
            missing.push("quantity");
        }
        if self.location.is_none() {
            missing.push("location");
        }
        if self.pickup_time.is_none() {
            missing.push("pickup time");
        }

        match (self.food_type, self.location, self.pickup_time) {
            (Some(food_type), Some(location), Some(pickup_time)) if missing.is_empty() => {
                let description = self.description.trim();
                Ok(NewDonation {
                    food_type,
                    quantity: quantity.to_owned(),
                    location,
                    pickup_time,
                    urgency: self.urgency.unwrap_or_default(),
                    description: (!description.is_empty()).then(|| description.to_owned()),
                    image: self.image.clone().filter(|i| !i.trim().is_empty()),
                    dietary: self.dietary,
                    allergens: self
                        .allergens
                        .iter()
                        .map(|a| a.trim().to_lowercase())
                        .filter(|a| !a.is_empty())
                        .collect(),
                })
            }
            _ => Err(DraftError::MissingFields(missing)),
        }
    }
}

/// Leading whole number of a quantity string (`"15 portions"` → 15).
#[must_use]
pub fn leading_quantity(quantity: &str) -> Option<u32> {
    let digits: String = quantity
        .trim_start()
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    digits.parse().ok()
}
