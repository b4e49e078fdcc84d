//! Read side for the booking client.

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::debug;

use crate::calendar::{LocalClock, next_occurrence_of_weekday};
use crate::errors::BookingResult;
use crate::models::{DayOfWeek, DaySchedule, LocalSlot, Period, Slot, SlotFilter};
use crate::repository::{RuleRepository, SlotRepository};

#[derive(Clone)]
pub struct SlotQueryService {
    slots: Arc<dyn SlotRepository>,
    rules: Arc<dyn RuleRepository>,
    clock: LocalClock,
}

impl SlotQueryService {
    pub fn new(
        slots: Arc<dyn SlotRepository>,
        rules: Arc<dyn RuleRepository>,
        clock: LocalClock,
    ) -> Self {
        Self {
            slots,
            rules,
            clock,
        }
    }

    /// Every slot on the local date, ordered by time.
    pub async fn list_by_date(&self, date: NaiveDate) -> BookingResult<Vec<Slot>> {
        let (from, to) = self.clock.day_bounds(date)?;
        let mut slots = self.slots.list_slots_between(from, to).await?;
        slots.sort_by_key(|slot| slot.date_time);
        debug!(%date, count = slots.len(), "Listed slots for date");
        Ok(slots)
    }

    pub async fn list_local(
        &self,
        date: NaiveDate,
        filter: SlotFilter,
    ) -> BookingResult<Vec<LocalSlot>> {
        Ok(self
            .list_by_date(date)
            .await?
            .into_iter()
            .map(|slot| self.localize(slot))
            .filter(|slot| filter.matches(slot))
            .collect())
    }

    pub async fn list_available_weekdays(&self) -> BookingResult<Vec<DayOfWeek>> {
        let mut days = self.rules.list_active_weekdays().await?;
        days.sort();
        days.dedup();
        Ok(days)
    }

    /// Slots of the next date (today included) that falls on `weekday`.
    pub async fn next_day_for_weekday(&self, weekday: DayOfWeek) -> BookingResult<DaySchedule> {
        let date = next_occurrence_of_weekday(self.clock.today(), weekday);
        let slots = self.list_local(date, SlotFilter::default()).await?;
        Ok(DaySchedule { date, slots })
    }

    pub fn localize(&self, slot: Slot) -> LocalSlot {
        let local = self.clock.to_local(slot.date_time);
        LocalSlot {
            local_date: local.date(),
            local_time: local.time(),
            period: Period::of(local.time()),
            slot,
        }
    }
}
