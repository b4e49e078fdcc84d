//! # Legacy import
//!
//! Reads a JSON export of the previous deployment's three tables and loads
//! it into the current schema.
//!
//! The export is an object with one array per table:
//!
//! ```json
//! {
//!   "horarios_disponiveis": [{ "id": "...", "dia_semana": 1, "periodo": "manha", ... }],
//!   "slots_horarios": [{ "id": "...", "data_hora": "2024-05-06T08:00:00", ... }],
//!   "reservarData": [{ "id": "...", "datareserva": "...", "userId": "...", ... }]
//! }
//! ```
//!
//! Slot timestamps were written in two encodings over the life of that
//! deployment; both go through [`LocalClock::decode`]. Rows that cannot be
//! represented under the current invariants are skipped and reported.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use chrono::{DateTime, Utc};
use eyre::{Result, WrapErr};
use serde::Deserialize;
use slotbook_core::calendar::{LocalClock, parse_time_of_day};
use slotbook_core::models::{
    AvailabilityRule, DayOfWeek, Period, Reservation, ReservationStatus, Slot,
};
use sqlx::{Pool, Postgres};
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::day_to_db;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LegacyExport {
    #[serde(default, rename = "horarios_disponiveis")]
    pub rules: Vec<LegacyRule>,
    #[serde(default, rename = "slots_horarios")]
    pub slots: Vec<LegacySlot>,
    #[serde(default, rename = "reservarData")]
    pub reservations: Vec<LegacyReservation>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LegacyRule {
    pub id: Uuid,
    pub created_at: Option<String>,
    pub dia_semana: i64,
    pub periodo: String,
    pub hora_inicio: String,
    pub hora_fim: String,
    pub intervalo_minutos: i32,
    #[serde(default = "default_true")]
    pub ativo: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LegacySlot {
    pub id: Uuid,
    pub created_at: Option<String>,
    pub data_hora: String,
    #[serde(default = "default_true")]
    pub disponivel: bool,
    pub config_id: Option<Uuid>,
    pub reserva_id: Option<Uuid>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LegacyReservation {
    pub id: Uuid,
    pub created_at: Option<String>,
    pub datareserva: Option<String>,
    #[serde(rename = "userId")]
    pub user_id: Option<String>,
    pub status: Option<String>,
    #[serde(rename = "nomeUser")]
    pub user_name: Option<String>,
}

fn default_true() -> bool {
    true
}

/// Rows converted to current models, ready to be written.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportPlan {
    pub rules: Vec<AvailabilityRule>,
    pub slots: Vec<Slot>,
    pub reservations: Vec<Reservation>,
    /// One line per dropped row, naming the row and the reason.
    pub skipped: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub rules: u64,
    pub slots: u64,
    pub reservations: u64,
    pub skipped: usize,
}

impl LegacyExport {
    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).wrap_err("Failed to parse legacy export")
    }

    pub async fn load(path: &Path) -> Result<Self> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .wrap_err_with(|| format!("Failed to read legacy export {}", path.display()))?;
        Self::from_json(&raw)
    }

    pub fn into_plan(self, clock: &LocalClock) -> ImportPlan {
        let mut plan = ImportPlan::default();

        for row in self.rules {
            match convert_rule(&row, clock) {
                Ok(rule) => plan.rules.push(rule),
                Err(reason) => plan.skipped.push(format!("rule {}: {reason}", row.id)),
            }
        }

        for row in self.reservations {
            match convert_reservation(&row, clock) {
                Ok(reservation) => plan.reservations.push(reservation),
                Err(reason) => plan.skipped.push(format!("reservation {}: {reason}", row.id)),
            }
        }

        let rule_ids: HashSet<Uuid> = plan.rules.iter().map(|rule| rule.id).collect();
        let reservation_ids: HashSet<Uuid> =
            plan.reservations.iter().map(|reservation| reservation.id).collect();

        let mut by_key: HashMap<(Option<Uuid>, DateTime<Utc>), usize> = HashMap::new();
        for row in self.slots {
            let slot = match convert_slot(&row, clock, &rule_ids, &reservation_ids) {
                Ok(slot) => slot,
                Err(reason) => {
                    plan.skipped.push(format!("slot {}: {reason}", row.id));
                    continue;
                }
            };

            if slot.source_rule_id.is_none() {
                plan.slots.push(slot);
                continue;
            }

            // The old generator could emit the same rule and time twice.
            // Keep one row per key, preferring the reserved copy.
            let key = (slot.source_rule_id, slot.date_time);
            match by_key.get(&key).copied() {
                Some(index) if plan.slots[index].available && !slot.available => {
                    plan.skipped
                        .push(format!("slot {}: duplicate of {}", plan.slots[index].id, slot.id));
                    plan.slots[index] = slot;
                }
                Some(index) => {
                    plan.skipped
                        .push(format!("slot {}: duplicate of {}", slot.id, plan.slots[index].id));
                }
                None => {
                    by_key.insert(key, plan.slots.len());
                    plan.slots.push(slot);
                }
            }
        }

        plan
    }
}

fn convert_rule(row: &LegacyRule, clock: &LocalClock) -> std::result::Result<AvailabilityRule, String> {
    let day = u8::try_from(row.dia_semana)
        .map_err(|_| format!("day of week {} out of range", row.dia_semana))
        .and_then(|day| DayOfWeek::new(day).map_err(|e| e.to_string()))?;
    let period: Period = row.periodo.parse().map_err(|e: slotbook_core::BookingError| e.to_string())?;
    let start_time = parse_time_of_day(&row.hora_inicio).map_err(|e| e.to_string())?;
    let end_time = parse_time_of_day(&row.hora_fim).map_err(|e| e.to_string())?;

    let rule = AvailabilityRule {
        id: row.id,
        day_of_week: day,
        period,
        start_time,
        end_time,
        step_minutes: row.intervalo_minutos,
        active: row.ativo,
        created_at: created_at(row.created_at.as_deref(), clock),
    };
    rule.validate().map_err(|e| e.to_string())?;
    Ok(rule)
}

fn convert_reservation(
    row: &LegacyReservation,
    clock: &LocalClock,
) -> std::result::Result<Reservation, String> {
    let raw_time = row
        .datareserva
        .as_deref()
        .ok_or_else(|| "missing reservation time".to_string())?;
    let slot_date_time = clock.decode(raw_time).map_err(|e| e.to_string())?;
    let status = match row.status.as_deref() {
        Some(raw) => raw
            .parse::<ReservationStatus>()
            .map_err(|e| e.to_string())?,
        None => ReservationStatus::Confirmed,
    };

    Ok(Reservation {
        id: row.id,
        slot_date_time,
        user_id: row.user_id.clone().unwrap_or_default(),
        user_name: row.user_name.clone().unwrap_or_default(),
        status,
        created_at: created_at(row.created_at.as_deref(), clock),
    })
}

fn convert_slot(
    row: &LegacySlot,
    clock: &LocalClock,
    rule_ids: &HashSet<Uuid>,
    reservation_ids: &HashSet<Uuid>,
) -> std::result::Result<Slot, String> {
    let date_time = clock.decode(&row.data_hora).map_err(|e| e.to_string())?;

    let reservation_id = match row.reserva_id {
        Some(id) if reservation_ids.contains(&id) => Some(id),
        Some(id) => return Err(format!("reservation {id} is not part of the export")),
        None if !row.disponivel => {
            return Err("marked unavailable without a reservation".to_string());
        }
        None => None,
    };

    Ok(Slot {
        id: row.id,
        date_time,
        available: reservation_id.is_none(),
        source_rule_id: row.config_id.filter(|id| rule_ids.contains(id)),
        reservation_id,
        created_at: created_at(row.created_at.as_deref(), clock),
    })
}

fn created_at(raw: Option<&str>, clock: &LocalClock) -> DateTime<Utc> {
    raw.and_then(|raw| clock.decode(raw).ok())
        .unwrap_or_else(Utc::now)
}

/// Writes the plan in one transaction. Rows whose id already exists are left
/// untouched, so an import can be re-run.
pub async fn apply_plan(pool: &Pool<Postgres>, plan: &ImportPlan) -> Result<ImportReport> {
    let mut tx = pool.begin().await?;
    let mut report = ImportReport {
        skipped: plan.skipped.len(),
        ..ImportReport::default()
    };

    for rule in &plan.rules {
        report.rules += sqlx::query(
            r#"
            INSERT INTO availability_rules
                (id, day_of_week, period, start_time, end_time, step_minutes, active, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(rule.id)
        .bind(day_to_db(rule.day_of_week))
        .bind(rule.period.as_str())
        .bind(rule.start_time)
        .bind(rule.end_time)
        .bind(rule.step_minutes)
        .bind(rule.active)
        .bind(rule.created_at)
        .execute(&mut *tx)
        .await?
        .rows_affected();
    }

    for reservation in &plan.reservations {
        report.reservations += sqlx::query(
            r#"
            INSERT INTO reservations (id, slot_date_time, user_id, user_name, status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(reservation.id)
        .bind(reservation.slot_date_time)
        .bind(&reservation.user_id)
        .bind(&reservation.user_name)
        .bind(reservation.status.as_str())
        .bind(reservation.created_at)
        .execute(&mut *tx)
        .await?
        .rows_affected();
    }

    for slot in &plan.slots {
        report.slots += sqlx::query(
            r#"
            INSERT INTO slots (id, date_time, available, source_rule_id, reservation_id, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(slot.id)
        .bind(slot.date_time)
        .bind(slot.available)
        .bind(slot.source_rule_id)
        .bind(slot.reservation_id)
        .bind(slot.created_at)
        .execute(&mut *tx)
        .await?
        .rows_affected();
    }

    tx.commit().await?;

    for reason in &plan.skipped {
        warn!("Skipped legacy row: {}", reason);
    }
    info!(
        rules = report.rules,
        slots = report.slots,
        reservations = report.reservations,
        skipped = report.skipped,
        "Legacy import finished"
    );
    Ok(report)
}
