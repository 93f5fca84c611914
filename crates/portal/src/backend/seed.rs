//! Demo dataset: a few staff members, four partner NGOs and a morning's
//! worth of postings.

use chrono::{DateTime, Duration, Utc};

use replate_core::{
    DeliveryStatus, DietaryFlags, Email, FoodType, NewDonation, PickupLocation, PickupTime,
    Profile, Role, Urgency, UserId,
};

use super::memory::Store;

const STAFF: [(&str, &str); 3] = [
    ("rajesh.kumar@replate.campus", "Rajesh Kumar"),
    ("priya.sharma@replate.campus", "Priya Sharma"),
    ("mohammed.ali@replate.campus", "Mohammed Ali"),
];

const VOLUNTEERS: [(&str, &str, &str); 4] = [
    ("contact@greenearth.org", "Anita Rao", "Green Earth NGO"),
    ("hello@foodangels.org", "Vikram Singh", "Food Angels"),
    ("team@communitykitchen.org", "Meera Iyer", "Community Kitchen"),
    ("info@hopefoundation.org", "Daniel Thomas", "Hope Foundation"),
];

const ADMIN: (&str, &str) = ("admin@replate.campus", "Campus Administrator");

struct Posting {
    staff: usize,
    food_type: FoodType,
    quantity: &'static str,
    location: PickupLocation,
    pickup: (u32, u32),
    urgency: Urgency,
    minutes_ago: i64,
    image: Option<&'static str>,
    claim: Option<(usize, DeliveryStatus)>,
}

const POSTINGS: [Posting; 6] = [
    Posting {
        staff: 0,
        food_type: FoodType::Rice,
        quantity: "15 portions",
        location: PickupLocation::MainMess,
        pickup: (14, 30),
        urgency: Urgency::High,
        minutes_ago: 10,
        image: None,
        claim: None,
    },
    Posting {
        staff: 1,
        food_type: FoodType::Fruits,
        quantity: "8 kg",
        location: PickupLocation::FoodCourt,
        pickup: (15, 0),
        urgency: Urgency::Medium,
        minutes_ago: 25,
        image: Some("photos/food-court-fruits.jpg"),
        claim: None,
    },
    Posting {
        staff: 2,
        food_type: FoodType::Bread,
        quantity: "12 pieces",
        location: PickupLocation::HostelMess,
        pickup: (16, 0),
        urgency: Urgency::Low,
        minutes_ago: 60,
        image: Some("photos/hostel-sandwiches.jpg"),
        claim: None,
    },
    Posting {
        staff: 0,
        food_type: FoodType::Rice,
        quantity: "15 portions",
        location: PickupLocation::MainMess,
        pickup: (12, 30),
        urgency: Urgency::High,
        minutes_ago: 120,
        image: Some("photos/main-mess-rice.jpg"),
        claim: Some((0, DeliveryStatus::Delivered)),
    },
    Posting {
        staff: 1,
        food_type: FoodType::Fruits,
        quantity: "12 kg",
        location: PickupLocation::FoodCourt,
        pickup: (11, 30),
        urgency: Urgency::Medium,
        minutes_ago: 180,
        image: Some("photos/food-court-melons.jpg"),
        claim: Some((1, DeliveryStatus::InTransit)),
    },
    Posting {
        staff: 2,
        food_type: FoodType::Bread,
        quantity: "8 portions",
        location: PickupLocation::HostelMess,
        pickup: (13, 0),
        urgency: Urgency::Medium,
        minutes_ago: 300,
        image: Some("photos/hostel-bread.jpg"),
        claim: Some((2, DeliveryStatus::Delivered)),
    },
];

fn add(store: &mut Store, address: &str, role: Role, profile: Profile) -> Option<UserId> {
    match Email::parse(address) {
        Ok(email) => Some(store.add_user(email, role, profile)),
        Err(e) => {
            tracing::warn!(email = address, error = %e, "Skipping invalid seed user");
            None
        }
    }
}

/// Fill an empty store with the demo dataset.
pub(super) fn populate(store: &mut Store, now: DateTime<Utc>) {
    let staff: Vec<Option<UserId>> = STAFF
        .iter()
        .map(|(email, name)| {
            add(
                store,
                email,
                Role::Staff,
                Profile {
                    full_name: (*name).to_string(),
                    ..Profile::default()
                },
            )
        })
        .collect();

    let volunteers: Vec<Option<UserId>> = VOLUNTEERS
        .iter()
        .map(|(email, name, organization)| {
            add(
                store,
                email,
                Role::Volunteer,
                Profile {
                    full_name: (*name).to_string(),
                    organization: Some((*organization).to_string()),
                    phone: None,
                },
            )
        })
        .collect();

    add(
        store,
        ADMIN.0,
        Role::Admin,
        Profile {
            full_name: ADMIN.1.to_string(),
            ..Profile::default()
        },
    );

    for posting in &POSTINGS {
        let (Some(Some(staff_id)), Some(pickup_time)) = (
            staff.get(posting.staff),
            PickupTime::from_hm(posting.pickup.0, posting.pickup.1),
        ) else {
            continue;
        };

        let new = NewDonation {
            food_type: posting.food_type,
            quantity: posting.quantity.to_string(),
            location: posting.location,
            pickup_time,
            urgency: posting.urgency,
            description: None,
            image: posting.image.map(str::to_string),
            dietary: DietaryFlags {
                vegetarian: !matches!(posting.food_type, FoodType::Rice),
                ..DietaryFlags::default()
            },
            allergens: if matches!(posting.food_type, FoodType::Bread) {
                vec!["gluten".to_string()]
            } else {
                Vec::new()
            },
        };
        let id = store.add_donation(*staff_id, new, now - Duration::minutes(posting.minutes_ago));

        if let Some((volunteer, status)) = posting.claim {
            let volunteer = volunteers.get(volunteer).copied().flatten();
            store.set_claim(id, volunteer, status);
        }
    }

    tracing::info!(
        staff = STAFF.len(),
        volunteers = VOLUNTEERS.len(),
        donations = POSTINGS.len(),
        "Seeded demo data"
    );
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use crate::backend::{DonationBackend, DonationFilter, InMemoryBackend};

    use super::*;

    #[tokio::test]
    async fn test_seed_matches_demo_dataset() {
        let backend = InMemoryBackend::seeded(Utc::now());

        let available = backend
            .list_available_donations(DonationFilter::default())
            .await
            .unwrap();
        let quantities: Vec<&str> = available.iter().map(|d| d.quantity.as_str()).collect();
        assert_eq!(quantities, ["15 portions", "8 kg", "12 pieces"]);

        let directory = backend.user_directory().await.unwrap();
        let ngos: Vec<&str> = directory
            .iter()
            .filter(|u| u.role == Role::Volunteer)
            .map(|u| u.display_name.as_str())
            .collect();
        assert_eq!(
            ngos,
            ["Green Earth NGO", "Food Angels", "Community Kitchen", "Hope Foundation"]
        );

        let all = backend.list_donations().await.unwrap();
        assert_eq!(all.len(), POSTINGS.len());
    }
}
