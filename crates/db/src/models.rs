use chrono::{DateTime, NaiveTime, Utc};
use eyre::{Result, WrapErr, eyre};
use serde::{Deserialize, Serialize};
use slotbook_core::models::{
    AvailabilityRule, Contact, DayOfWeek, Period, Reservation, ReservationStatus, Slot,
};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbAvailabilityRule {
    pub id: Uuid,
    pub day_of_week: i16,
    pub period: String,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub step_minutes: i32,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbSlot {
    pub id: Uuid,
    pub date_time: DateTime<Utc>,
    pub available: bool,
    pub source_rule_id: Option<Uuid>,
    pub reservation_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbReservation {
    pub id: Uuid,
    pub slot_date_time: DateTime<Utc>,
    pub user_id: String,
    pub user_name: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbUser {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
}

pub(crate) fn day_from_db(raw: i16) -> Result<DayOfWeek> {
    u8::try_from(raw)
        .ok()
        .and_then(|day| DayOfWeek::new(day).ok())
        .ok_or_else(|| eyre!("Stored day_of_week out of range: {raw}"))
}

pub(crate) fn day_to_db(day: DayOfWeek) -> i16 {
    i16::from(day.number())
}

impl TryFrom<DbAvailabilityRule> for AvailabilityRule {
    type Error = eyre::Report;

    fn try_from(row: DbAvailabilityRule) -> Result<Self> {
        let period: Period = row
            .period
            .parse()
            .map_err(|e| eyre!("{e}"))
            .wrap_err_with(|| format!("Invalid period on rule {}", row.id))?;

        Ok(Self {
            id: row.id,
            day_of_week: day_from_db(row.day_of_week)?,
            period,
            start_time: row.start_time,
            end_time: row.end_time,
            step_minutes: row.step_minutes,
            active: row.active,
            created_at: row.created_at,
        })
    }
}

impl From<DbSlot> for Slot {
    fn from(row: DbSlot) -> Self {
        Self {
            id: row.id,
            date_time: row.date_time,
            available: row.available,
            source_rule_id: row.source_rule_id,
            reservation_id: row.reservation_id,
            created_at: row.created_at,
        }
    }
}

impl TryFrom<DbReservation> for Reservation {
    type Error = eyre::Report;

    fn try_from(row: DbReservation) -> Result<Self> {
        let status: ReservationStatus = row
            .status
            .parse()
            .map_err(|e| eyre!("{e}"))
            .wrap_err_with(|| format!("Invalid status on reservation {}", row.id))?;

        Ok(Self {
            id: row.id,
            slot_date_time: row.slot_date_time,
            user_id: row.user_id,
            user_name: row.user_name,
            status,
            created_at: row.created_at,
        })
    }
}

impl From<DbUser> for Contact {
    fn from(row: DbUser) -> Self {
        Self {
            name: row.name,
            email: row.email.filter(|email| !email.trim().is_empty()),
        }
    }
}
