use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::calendar::time_of_day;
use crate::models::availability_rule::Period;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    pub id: Uuid,
    pub date_time: DateTime<Utc>,
    pub available: bool,
    pub source_rule_id: Option<Uuid>,
    pub reservation_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSlot {
    pub date_time: DateTime<Utc>,
    pub source_rule_id: Uuid,
}

/// Outcome of an insert keyed by `(source_rule_id, date_time)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotInsert {
    Created(Slot),
    Existing(Slot),
}

impl SlotInsert {
    pub fn slot(&self) -> &Slot {
        match self {
            Self::Created(slot) | Self::Existing(slot) => slot,
        }
    }

    pub fn into_slot(self) -> Slot {
        match self {
            Self::Created(slot) | Self::Existing(slot) => slot,
        }
    }
}

/// A slot as seen from the configured local clock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalSlot {
    #[serde(flatten)]
    pub slot: Slot,
    pub local_date: NaiveDate,
    #[serde(with = "time_of_day")]
    pub local_time: NaiveTime,
    pub period: Period,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotFilter {
    pub period: Option<Period>,
    #[serde(default)]
    pub available_only: bool,
}

impl SlotFilter {
    pub fn matches(&self, slot: &LocalSlot) -> bool {
        if self.available_only && !slot.slot.available {
            return false;
        }
        self.period.is_none_or(|period| period == slot.period)
    }
}

/// Slots of the next calendar date falling on a requested weekday.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaySchedule {
    pub date: NaiveDate,
    pub slots: Vec<LocalSlot>,
}
