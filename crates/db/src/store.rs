use async_trait::async_trait;
use chrono::{DateTime, Utc};
use eyre::Result;
use slotbook_core::models::{
    AvailabilityRule, Contact, DayOfWeek, NewAvailabilityRule, NewReservation, NewSlot,
    Reservation, ReserveOutcome, Slot, SlotInsert,
};
use slotbook_core::repository::{
    ReservationRepository, RuleRepository, SlotRepository, UserDirectory,
};
use uuid::Uuid;

use crate::DbPool;
use crate::models::{day_from_db, day_to_db};
use crate::repositories::slot::{InsertedSlot, ReservedSlot};
use crate::repositories::{reservation, rule, slot, user};

/// Repository traits backed by a PostgreSQL pool.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

#[async_trait]
impl RuleRepository for PgStore {
    async fn list_rules(&self) -> Result<Vec<AvailabilityRule>> {
        rule::list_rules(&self.pool)
            .await?
            .into_iter()
            .map(AvailabilityRule::try_from)
            .collect()
    }

    async fn list_active_rules(&self, day: DayOfWeek) -> Result<Vec<AvailabilityRule>> {
        rule::list_active_rules(&self.pool, day_to_db(day))
            .await?
            .into_iter()
            .map(AvailabilityRule::try_from)
            .collect()
    }

    async fn get_rule(&self, id: Uuid) -> Result<Option<AvailabilityRule>> {
        rule::get_rule_by_id(&self.pool, id)
            .await?
            .map(AvailabilityRule::try_from)
            .transpose()
    }

    async fn insert_rule(&self, input: &NewAvailabilityRule) -> Result<AvailabilityRule> {
        rule::create_rule(&self.pool, input).await?.try_into()
    }

    async fn save_rule(&self, changed: &AvailabilityRule) -> Result<Option<AvailabilityRule>> {
        rule::update_rule(&self.pool, changed)
            .await?
            .map(AvailabilityRule::try_from)
            .transpose()
    }

    async fn delete_rule(&self, id: Uuid) -> Result<()> {
        rule::delete_rule(&self.pool, id).await
    }

    async fn list_active_weekdays(&self) -> Result<Vec<DayOfWeek>> {
        rule::list_active_weekdays(&self.pool)
            .await?
            .into_iter()
            .map(day_from_db)
            .collect()
    }
}

#[async_trait]
impl SlotRepository for PgStore {
    async fn insert_slot(&self, input: &NewSlot) -> Result<SlotInsert> {
        Ok(match slot::insert_slot(&self.pool, input).await? {
            InsertedSlot::Created(row) => SlotInsert::Created(row.into()),
            InsertedSlot::Existing(row) => SlotInsert::Existing(row.into()),
        })
    }

    async fn get_slot(&self, id: Uuid) -> Result<Option<Slot>> {
        Ok(slot::get_slot_by_id(&self.pool, id).await?.map(Slot::from))
    }

    async fn list_slots_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Slot>> {
        Ok(slot::list_slots_between(&self.pool, from, to)
            .await?
            .into_iter()
            .map(Slot::from)
            .collect())
    }

    async fn reserve_slot(&self, slot_id: Uuid, input: &NewReservation) -> Result<ReserveOutcome> {
        Ok(match slot::reserve_slot(&self.pool, slot_id, input).await? {
            ReservedSlot::Reserved(row) => ReserveOutcome::Reserved(row.try_into()?),
            ReservedSlot::NotFound => ReserveOutcome::SlotNotFound,
            ReservedSlot::Unavailable => ReserveOutcome::SlotUnavailable,
        })
    }
}

#[async_trait]
impl ReservationRepository for PgStore {
    async fn get_reservation(&self, id: Uuid) -> Result<Option<Reservation>> {
        reservation::get_reservation_by_id(&self.pool, id)
            .await?
            .map(Reservation::try_from)
            .transpose()
    }

    async fn list_reservations_for_user(&self, user_id: &str) -> Result<Vec<Reservation>> {
        reservation::get_reservations_by_user(&self.pool, user_id)
            .await?
            .into_iter()
            .map(Reservation::try_from)
            .collect()
    }
}

#[async_trait]
impl UserDirectory for PgStore {
    async fn find_contact(&self, user_id: &str) -> Result<Option<Contact>> {
        Ok(user::get_user_by_id(&self.pool, user_id)
            .await?
            .map(Contact::from))
    }
}
