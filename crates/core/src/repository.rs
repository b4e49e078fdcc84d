//! Repository traits for the persistence collaborator.
//!
//! Services receive these as `Arc<dyn ...>` so the store can be PostgreSQL,
//! the in-memory store, or a mock. Every method is one round trip.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use eyre::Result;
use uuid::Uuid;

#[cfg(test)]
use mockall::automock;

use crate::models::{
    AvailabilityRule, Contact, DayOfWeek, NewAvailabilityRule, NewReservation, NewSlot,
    Reservation, ReserveOutcome, Slot, SlotInsert,
};

#[cfg_attr(test, automock)]
#[async_trait]
pub trait RuleRepository: Send + Sync {
    /// All rules, ordered by day of week then start time.
    async fn list_rules(&self) -> Result<Vec<AvailabilityRule>>;

    /// Active rules for one weekday.
    async fn list_active_rules(&self, day: DayOfWeek) -> Result<Vec<AvailabilityRule>>;

    async fn get_rule(&self, id: Uuid) -> Result<Option<AvailabilityRule>>;

    async fn insert_rule(&self, input: &NewAvailabilityRule) -> Result<AvailabilityRule>;

    /// Overwrites the stored rule; `None` when no rule has that id.
    async fn save_rule(&self, rule: &AvailabilityRule) -> Result<Option<AvailabilityRule>>;

    async fn delete_rule(&self, id: Uuid) -> Result<()>;

    /// Distinct weekdays with at least one active rule, ascending.
    async fn list_active_weekdays(&self) -> Result<Vec<DayOfWeek>>;
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait SlotRepository: Send + Sync {
    /// Inserts unless a slot with the same `(source_rule_id, date_time)` exists.
    async fn insert_slot(&self, input: &NewSlot) -> Result<SlotInsert>;

    async fn get_slot(&self, id: Uuid) -> Result<Option<Slot>>;

    /// Slots with `from <= date_time <= to`, ordered by `date_time`.
    async fn list_slots_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Slot>>;

    /// Creates the reservation and flips the slot in one atomic step, only
    /// if the slot is still available.
    async fn reserve_slot(&self, slot_id: Uuid, input: &NewReservation) -> Result<ReserveOutcome>;
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait ReservationRepository: Send + Sync {
    async fn get_reservation(&self, id: Uuid) -> Result<Option<Reservation>>;

    async fn list_reservations_for_user(&self, user_id: &str) -> Result<Vec<Reservation>>;
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_contact(&self, user_id: &str) -> Result<Option<Contact>>;
}
