//! In-process implementation of every repository trait.
//!
//! State lives behind one mutex, so each call is atomic with respect to the
//! others. Used for tests and single-process deployments.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use eyre::{Result, eyre};
use uuid::Uuid;

use crate::models::{
    AvailabilityRule, Contact, DayOfWeek, NewAvailabilityRule, NewReservation, NewSlot,
    Reservation, ReserveOutcome, Slot, SlotInsert,
};
use crate::repository::{RuleRepository, ReservationRepository, SlotRepository, UserDirectory};

#[derive(Debug, Default)]
struct MemoryState {
    rules: HashMap<Uuid, AvailabilityRule>,
    slots: HashMap<Uuid, Slot>,
    slot_keys: HashMap<(Uuid, DateTime<Utc>), Uuid>,
    reservations: HashMap<Uuid, Reservation>,
    contacts: HashMap<String, Contact>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a contact returned by [`UserDirectory::find_contact`].
    pub fn with_contact(self, user_id: &str, contact: Contact) -> Self {
        if let Ok(mut state) = self.state.lock() {
            state.contacts.insert(user_id.to_string(), contact);
        }
        self
    }

    pub fn slot_count(&self) -> Result<usize> {
        Ok(self.lock()?.slots.len())
    }

    pub fn reservation_count(&self) -> Result<usize> {
        Ok(self.lock()?.reservations.len())
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>> {
        self.state
            .lock()
            .map_err(|_| eyre!("memory store lock poisoned"))
    }
}

fn sorted_rules<'a>(rules: impl Iterator<Item = &'a AvailabilityRule>) -> Vec<AvailabilityRule> {
    let mut rules: Vec<_> = rules.cloned().collect();
    rules.sort_by_key(|rule| (rule.day_of_week, rule.start_time, rule.created_at));
    rules
}

#[async_trait]
impl RuleRepository for MemoryStore {
    async fn list_rules(&self) -> Result<Vec<AvailabilityRule>> {
        let state = self.lock()?;
        Ok(sorted_rules(state.rules.values()))
    }

    async fn list_active_rules(&self, day: DayOfWeek) -> Result<Vec<AvailabilityRule>> {
        let state = self.lock()?;
        let mut rules = sorted_rules(
            state
                .rules
                .values()
                .filter(|rule| rule.active && rule.day_of_week == day),
        );
        rules.sort_by_key(|rule| (rule.period, rule.start_time));
        Ok(rules)
    }

    async fn get_rule(&self, id: Uuid) -> Result<Option<AvailabilityRule>> {
        Ok(self.lock()?.rules.get(&id).cloned())
    }

    async fn insert_rule(&self, input: &NewAvailabilityRule) -> Result<AvailabilityRule> {
        let rule = AvailabilityRule {
            id: Uuid::new_v4(),
            day_of_week: input.day_of_week,
            period: input.period,
            start_time: input.start_time,
            end_time: input.end_time,
            step_minutes: input.step_minutes,
            active: input.active,
            created_at: Utc::now(),
        };
        self.lock()?.rules.insert(rule.id, rule.clone());
        Ok(rule)
    }

    async fn save_rule(&self, rule: &AvailabilityRule) -> Result<Option<AvailabilityRule>> {
        let mut state = self.lock()?;
        match state.rules.get_mut(&rule.id) {
            Some(stored) => {
                *stored = rule.clone();
                Ok(Some(rule.clone()))
            }
            None => Ok(None),
        }
    }

    async fn delete_rule(&self, id: Uuid) -> Result<()> {
        self.lock()?.rules.remove(&id);
        Ok(())
    }

    async fn list_active_weekdays(&self) -> Result<Vec<DayOfWeek>> {
        let state = self.lock()?;
        let mut days: Vec<_> = state
            .rules
            .values()
            .filter(|rule| rule.active)
            .map(|rule| rule.day_of_week)
            .collect();
        days.sort();
        days.dedup();
        Ok(days)
    }
}

#[async_trait]
impl SlotRepository for MemoryStore {
    async fn insert_slot(&self, input: &NewSlot) -> Result<SlotInsert> {
        let mut state = self.lock()?;
        let key = (input.source_rule_id, input.date_time);

        if let Some(existing) = state.slot_keys.get(&key).and_then(|id| state.slots.get(id)) {
            return Ok(SlotInsert::Existing(existing.clone()));
        }

        let slot = Slot {
            id: Uuid::new_v4(),
            date_time: input.date_time,
            available: true,
            source_rule_id: Some(input.source_rule_id),
            reservation_id: None,
            created_at: Utc::now(),
        };
        state.slot_keys.insert(key, slot.id);
        state.slots.insert(slot.id, slot.clone());
        Ok(SlotInsert::Created(slot))
    }

    async fn get_slot(&self, id: Uuid) -> Result<Option<Slot>> {
        Ok(self.lock()?.slots.get(&id).cloned())
    }

    async fn list_slots_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Slot>> {
        let state = self.lock()?;
        let mut slots: Vec<_> = state
            .slots
            .values()
            .filter(|slot| slot.date_time >= from && slot.date_time <= to)
            .cloned()
            .collect();
        slots.sort_by_key(|slot| (slot.date_time, slot.created_at));
        Ok(slots)
    }

    async fn reserve_slot(&self, slot_id: Uuid, input: &NewReservation) -> Result<ReserveOutcome> {
        let mut state = self.lock()?;
        let reservation_id = Uuid::new_v4();

        match state.slots.get_mut(&slot_id) {
            None => return Ok(ReserveOutcome::SlotNotFound),
            Some(slot) if !slot.available => return Ok(ReserveOutcome::SlotUnavailable),
            Some(slot) => {
                slot.available = false;
                slot.reservation_id = Some(reservation_id);
            }
        }

        let reservation = Reservation {
            id: reservation_id,
            slot_date_time: input.slot_date_time,
            user_id: input.user_id.clone(),
            user_name: input.user_name.clone(),
            status: input.status,
            created_at: Utc::now(),
        };
        state.reservations.insert(reservation.id, reservation.clone());
        Ok(ReserveOutcome::Reserved(reservation))
    }
}

#[async_trait]
impl ReservationRepository for MemoryStore {
    async fn get_reservation(&self, id: Uuid) -> Result<Option<Reservation>> {
        Ok(self.lock()?.reservations.get(&id).cloned())
    }

    async fn list_reservations_for_user(&self, user_id: &str) -> Result<Vec<Reservation>> {
        let state = self.lock()?;
        let mut reservations: Vec<_> = state
            .reservations
            .values()
            .filter(|reservation| reservation.user_id == user_id)
            .cloned()
            .collect();
        reservations.sort_by_key(|reservation| reservation.slot_date_time);
        Ok(reservations)
    }
}

#[async_trait]
impl UserDirectory for MemoryStore {
    async fn find_contact(&self, user_id: &str) -> Result<Option<Contact>> {
        Ok(self.lock()?.contacts.get(user_id).cloned())
    }
}
