//! In-memory backend.
//!
//! Holds users, donations, tracking and notifications behind one mutex.
//! Nothing survives a restart. The lock is never held across an await.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::ExposeSecret;

use replate_core::{
    DeliveryStatus, Donation, DonationId, Email, Identity, NewDonation, Notification,
    NotificationId, NotificationKind, Profile, Role, UserId, leading_quantity,
};

use super::{
    BackendError, Credentials, DeliveryTracking, DeliveryUpdate, DonationBackend,
    DonationFilter, IdentityBackend, Registration, UserSummary, seed,
};

/// Backend keeping everything in process memory.
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    store: Mutex<Store>,
}

impl InMemoryBackend {
    /// An empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A backend holding the demo dataset, timed relative to `now`.
    #[must_use]
    pub fn seeded(now: DateTime<Utc>) -> Self {
        let backend = Self::new();
        seed::populate(&mut backend.lock(), now);
        backend
    }

    /// Make the next calls fail with `errors`, one per call, in order.
    pub fn inject_failures(&self, errors: impl IntoIterator<Item = BackendError>) {
        self.lock().failures.extend(errors);
    }

    /// Register a user directly, bypassing the identity flow.
    pub fn add_user(&self, email: Email, role: Role, profile: Profile) -> UserId {
        self.lock().add_user(email, role, profile)
    }

    fn lock(&self) -> MutexGuard<'_, Store> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Lock the store, failing instead if a failure was injected.
    fn begin(&self) -> Result<MutexGuard<'_, Store>, BackendError> {
        let mut store = self.lock();
        match store.failures.pop_front() {
            Some(error) => Err(error),
            None => Ok(store),
        }
    }
}

#[derive(Debug, Clone)]
pub(super) struct UserRecord {
    pub(super) user_id: UserId,
    pub(super) email: Email,
    pub(super) role: Role,
    pub(super) profile: Profile,
}

impl UserRecord {
    fn identity(&self) -> Identity {
        Identity {
            user_id: self.user_id,
            name: self.profile.full_name.clone(),
            email: self.email.clone(),
            role: self.role,
        }
    }

    fn summary(&self) -> UserSummary {
        UserSummary {
            user_id: self.user_id,
            display_name: self.profile.public_name().to_owned(),
            email: self.email.clone(),
            role: self.role,
        }
    }
}

#[derive(Debug, Default)]
pub(super) struct Store {
    last_user_id: i32,
    last_donation_id: i32,
    last_notification_id: i32,
    users: HashMap<Email, UserRecord>,
    donations: BTreeMap<DonationId, Donation>,
    tracking: Vec<DeliveryTracking>,
    notifications: Vec<Notification>,
    failures: VecDeque<BackendError>,
}

impl Store {
    pub(super) fn add_user(&mut self, email: Email, role: Role, profile: Profile) -> UserId {
        self.last_user_id += 1;
        let user_id = UserId::new(self.last_user_id);
        self.users.insert(
            email.clone(),
            UserRecord {
                user_id,
                email,
                role,
                profile,
            },
        );
        user_id
    }

    fn user(&self, user_id: UserId) -> Option<&UserRecord> {
        self.users.values().find(|u| u.user_id == user_id)
    }

    fn require_role(&self, user_id: UserId, role: Role) -> Result<&UserRecord, BackendError> {
        match self.user(user_id) {
            Some(user) if user.role == role => Ok(user),
            Some(user) => Err(BackendError::Unauthorized(format!(
                "user {user_id} is {}, not {role}",
                user.role
            ))),
            None => Err(BackendError::Unauthorized(format!("unknown user {user_id}"))),
        }
    }

    fn display_name(&self, user_id: UserId) -> String {
        self.user(user_id).map_or_else(
            || format!("User {user_id}"),
            |u| u.profile.public_name().to_owned(),
        )
    }

    pub(super) fn add_donation(
        &mut self,
        staff_id: UserId,
        new: NewDonation,
        created_at: DateTime<Utc>,
    ) -> DonationId {
        self.last_donation_id += 1;
        let id = DonationId::new(self.last_donation_id);
        let donation = Donation {
            id,
            staff_id,
            food_type: new.food_type,
            quantity_numeric: leading_quantity(&new.quantity),
            quantity: new.quantity,
            location: new.location,
            pickup_time: new.pickup_time,
            status: DeliveryStatus::Pending,
            urgency: new.urgency,
            description: new.description,
            image: new.image,
            dietary: new.dietary,
            allergens: new.allergens,
            accepted_by: None,
            created_at,
            updated_at: created_at,
        };
        self.donations.insert(id, donation);
        id
    }

    /// Force a donation into `status`, as held by `volunteer`. Seeding only.
    pub(super) fn set_claim(
        &mut self,
        id: DonationId,
        volunteer: Option<UserId>,
        status: DeliveryStatus,
    ) {
        if let Some(donation) = self.donations.get_mut(&id) {
            donation.accepted_by = volunteer;
            donation.status = status;
        }
    }

    fn donation_mut(&mut self, id: DonationId) -> Result<&mut Donation, BackendError> {
        self.donations
            .get_mut(&id)
            .ok_or_else(|| BackendError::NotFound(format!("donation {id}")))
    }

    fn held_by(&mut self, id: DonationId, volunteer_id: UserId) -> Result<&mut Donation, BackendError> {
        let donation = self.donation_mut(id)?;
        if donation.accepted_by != Some(volunteer_id) {
            return Err(BackendError::Unauthorized(format!(
                "donation {id} is not held by user {volunteer_id}"
            )));
        }
        Ok(donation)
    }

    fn notify(
        &mut self,
        user_id: UserId,
        donation_id: DonationId,
        kind: NotificationKind,
        title: &str,
        message: String,
        now: DateTime<Utc>,
    ) {
        self.last_notification_id += 1;
        self.notifications.push(Notification {
            id: NotificationId::new(self.last_notification_id),
            user_id,
            donation_id: Some(donation_id),
            kind,
            title: title.to_owned(),
            message,
            read: false,
            created_at: now,
        });
    }

    fn track(&mut self, donation: &Donation, volunteer_id: UserId, update: DeliveryUpdate, now: DateTime<Utc>) {
        self.tracking.push(DeliveryTracking {
            donation_id: donation.id,
            volunteer_id,
            status: donation.status,
            location: update.location,
            notes: update.notes,
            updated_at: now,
        });
    }

    fn sorted_newest_first(mut donations: Vec<Donation>) -> Vec<Donation> {
        donations.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        donations
    }

    fn collect(&self, keep: impl Fn(&Donation) -> bool) -> Vec<Donation> {
        Self::sorted_newest_first(self.donations.values().filter(|d| keep(d)).cloned().collect())
    }
}

#[async_trait]
impl DonationBackend for InMemoryBackend {
    async fn submit_donation(
        &self,
        staff_id: UserId,
        donation: NewDonation,
    ) -> Result<Donation, BackendError> {
        let mut store = self.begin()?;
        store.require_role(staff_id, Role::Staff)?;
        if donation.quantity.trim().is_empty() {
            return Err(BackendError::Validation("quantity is required".to_string()));
        }

        let now = Utc::now();
        let id = store.add_donation(staff_id, donation, now);
        let created = store.donation_mut(id)?.clone();

        let message = format!(
            "{} of {} at {}, pickup by {}",
            created.quantity,
            created.food_type.label(),
            created.location.label(),
            created.pickup_time.display()
        );
        let volunteers: Vec<UserId> = store
            .users
            .values()
            .filter(|u| u.role == Role::Volunteer)
            .map(|u| u.user_id)
            .collect();
        for volunteer in volunteers {
            store.notify(
                volunteer,
                id,
                NotificationKind::FoodAvailable,
                "New food available",
                message.clone(),
                now,
            );
        }

        tracing::info!(donation_id = %id, staff_id = %staff_id, "Donation logged");
        Ok(created)
    }

    async fn list_available_donations(
        &self,
        filter: DonationFilter,
    ) -> Result<Vec<Donation>, BackendError> {
        let store = self.begin()?;
        Ok(store.collect(|d| d.status == DeliveryStatus::Pending && filter.matches(d)))
    }

    async fn claim_donation(
        &self,
        donation_id: DonationId,
        volunteer_id: UserId,
    ) -> Result<Donation, BackendError> {
        let mut store = self.begin()?;
        store.require_role(volunteer_id, Role::Volunteer)?;
        let volunteer_name = store.display_name(volunteer_id);

        let now = Utc::now();
        let donation = store.donation_mut(donation_id)?;
        if donation.status != DeliveryStatus::Pending {
            return Err(BackendError::Conflict(format!(
                "donation {donation_id} is no longer available"
            )));
        }
        donation.status = DeliveryStatus::Accepted;
        donation.accepted_by = Some(volunteer_id);
        donation.updated_at = now;
        let claimed = donation.clone();

        store.track(&claimed, volunteer_id, DeliveryUpdate::status(claimed.status), now);
        store.notify(
            claimed.staff_id,
            donation_id,
            NotificationKind::PickupAccepted,
            "Pickup accepted",
            format!(
                "{volunteer_name} will collect {} of {}",
                claimed.quantity,
                claimed.food_type.label()
            ),
            now,
        );

        tracing::info!(donation_id = %donation_id, volunteer_id = %volunteer_id, "Donation claimed");
        Ok(claimed)
    }

    async fn release_claim(
        &self,
        donation_id: DonationId,
        volunteer_id: UserId,
    ) -> Result<Donation, BackendError> {
        self.update_delivery_status(
            donation_id,
            volunteer_id,
            DeliveryUpdate::status(DeliveryStatus::Pending),
        )
        .await
    }

    async fn update_delivery_status(
        &self,
        donation_id: DonationId,
        volunteer_id: UserId,
        update: DeliveryUpdate,
    ) -> Result<Donation, BackendError> {
        let mut store = self.begin()?;
        let volunteer_name = store.display_name(volunteer_id);

        let now = Utc::now();
        let donation = store.held_by(donation_id, volunteer_id)?;
        donation.status = donation
            .status
            .transition_to(update.status)
            .map_err(|e| BackendError::Validation(e.to_string()))?;
        if donation.status == DeliveryStatus::Pending {
            donation.accepted_by = None;
        }
        donation.updated_at = now;
        let updated = donation.clone();

        store.track(&updated, volunteer_id, update, now);
        let (kind, title, message) = if updated.status == DeliveryStatus::Pending {
            (
                NotificationKind::PickupReleased,
                "Pickup released",
                format!(
                    "{volunteer_name} can no longer collect {}; it is available again",
                    updated.food_type.label()
                ),
            )
        } else {
            (
                NotificationKind::DeliveryUpdate,
                "Delivery update",
                format!(
                    "{} is now {}",
                    updated.food_type.label(),
                    updated.status.staff_label()
                ),
            )
        };
        store.notify(updated.staff_id, donation_id, kind, title, message, now);

        tracing::info!(
            donation_id = %donation_id,
            volunteer_id = %volunteer_id,
            status = %updated.status,
            "Delivery status updated"
        );
        Ok(updated)
    }

    async fn list_donations(&self) -> Result<Vec<Donation>, BackendError> {
        let store = self.begin()?;
        Ok(store.collect(|_| true))
    }

    async fn list_donations_by_staff(
        &self,
        staff_id: UserId,
    ) -> Result<Vec<Donation>, BackendError> {
        let store = self.begin()?;
        Ok(store.collect(|d| d.staff_id == staff_id))
    }

    async fn list_donations_claimed_by(
        &self,
        volunteer_id: UserId,
    ) -> Result<Vec<Donation>, BackendError> {
        let store = self.begin()?;
        Ok(store.collect(|d| d.accepted_by == Some(volunteer_id)))
    }

    async fn list_tracking(
        &self,
        donation_id: DonationId,
    ) -> Result<Vec<DeliveryTracking>, BackendError> {
        let store = self.begin()?;
        Ok(store
            .tracking
            .iter()
            .filter(|t| t.donation_id == donation_id)
            .cloned()
            .collect())
    }

    async fn list_notifications(
        &self,
        user_id: UserId,
    ) -> Result<Vec<Notification>, BackendError> {
        let store = self.begin()?;
        let mut notifications: Vec<Notification> = store
            .notifications
            .iter()
            .filter(|n| n.user_id == user_id)
            .cloned()
            .collect();
        notifications.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(notifications)
    }

    async fn mark_notification_read(
        &self,
        user_id: UserId,
        notification_id: NotificationId,
    ) -> Result<(), BackendError> {
        let mut store = self.begin()?;
        let notification = store
            .notifications
            .iter_mut()
            .find(|n| n.id == notification_id && n.user_id == user_id)
            .ok_or_else(|| BackendError::NotFound(format!("notification {notification_id}")))?;
        notification.read = true;
        Ok(())
    }

    async fn user_directory(&self) -> Result<Vec<UserSummary>, BackendError> {
        let store = self.begin()?;
        let mut users: Vec<UserSummary> = store.users.values().map(UserRecord::summary).collect();
        users.sort_by_key(|u| u.user_id);
        Ok(users)
    }
}

#[async_trait]
impl IdentityBackend for InMemoryBackend {
    /// Stub policy: any non-empty password is accepted. An email seen for
    /// the first time is assigned `role`; afterwards it may only sign in
    /// with that role.
    async fn authenticate(
        &self,
        credentials: &Credentials,
        role: Role,
    ) -> Result<Identity, BackendError> {
        let mut store = self.begin()?;
        if credentials.password.expose_secret().is_empty() {
            return Err(BackendError::Unauthorized("password is required".to_string()));
        }

        if let Some(user) = store.users.get(&credentials.email) {
            if user.role != role {
                return Err(BackendError::Unauthorized(format!(
                    "{} is registered as {}",
                    credentials.email, user.role
                )));
            }
            return Ok(user.identity());
        }

        let profile = Profile {
            full_name: credentials.email.local_part().to_owned(),
            ..Profile::default()
        };
        let user_id = store.add_user(credentials.email.clone(), role, profile);
        tracing::info!(user_id = %user_id, role = %role, "First login recorded role assignment");
        store
            .user(user_id)
            .map(UserRecord::identity)
            .ok_or_else(|| BackendError::Malformed(format!("user {user_id} vanished")))
    }

    async fn register(
        &self,
        registration: &Registration,
        role: Role,
    ) -> Result<Identity, BackendError> {
        let mut store = self.begin()?;
        let name = registration.name.trim();
        if name.is_empty() {
            return Err(BackendError::Validation("name is required".to_string()));
        }
        if registration.password.expose_secret().is_empty() {
            return Err(BackendError::Validation("password is required".to_string()));
        }

        let profile = Profile {
            full_name: name.to_owned(),
            organization: registration
                .organization
                .as_deref()
                .map(str::trim)
                .filter(|o| role.shows_organization_field() && !o.is_empty())
                .map(str::to_owned),
            phone: registration
                .phone
                .as_deref()
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_owned),
        };

        if let Some(user) = store.users.get(&registration.email) {
            return Err(BackendError::Conflict(format!(
                "{} is already registered as {}",
                registration.email, user.role
            )));
        }

        let user_id = store.add_user(registration.email.clone(), role, profile);
        tracing::info!(user_id = %user_id, role = %role, "Account registered");
        store
            .user(user_id)
            .map(UserRecord::identity)
            .ok_or_else(|| BackendError::Malformed(format!("user {user_id} vanished")))
    }
}
