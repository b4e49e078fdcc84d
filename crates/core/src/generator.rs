//! # Slot generation
//!
//! Expands the active availability rules of a weekday into concrete slots
//! for a calendar date.
//!
//! ## Algorithm
//!
//! 1. Resolve the weekday of the target date and load its active rules.
//! 2. Tile each rule's half-open window `[start, end)` at `step_minutes`.
//!    Only full strides are emitted; a short remainder before `end` is dropped.
//! 3. Insert one slot per start time. The store deduplicates on
//!    `(source_rule_id, date_time)`, which makes regeneration idempotent.
//! 4. A failed insert is logged and skipped; the rest of the day proceeds.
//!
//! Generation for one date is serialized through a per-date lock. Different
//! dates run independently.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{Days, NaiveDate, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use tokio::sync::OwnedMutexGuard;
use tracing::{debug, error, info, warn};

use crate::calendar::{LocalClock, day_of_week};
use crate::errors::BookingResult;
use crate::models::{AvailabilityRule, NewSlot, Slot, SlotInsert};
use crate::repository::{RuleRepository, SlotRepository};

/// Start times produced by tiling `[start, end)` with `step_minutes`.
pub fn tile_window(start: NaiveTime, end: NaiveTime, step_minutes: i32) -> Vec<NaiveTime> {
    if step_minutes <= 0 || start >= end {
        return Vec::new();
    }

    let step = i64::from(step_minutes) * 60;
    let end_secs = i64::from(end.num_seconds_from_midnight());
    let mut cursor = i64::from(start.num_seconds_from_midnight());
    let mut starts = Vec::new();

    while cursor + step <= end_secs {
        if let Some(time) = u32::try_from(cursor)
            .ok()
            .and_then(|secs| NaiveTime::from_num_seconds_from_midnight_opt(secs, 0))
        {
            starts.push(time);
        }
        cursor += step;
    }

    starts
}

/// Result of generating one date.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedDay {
    pub date: NaiveDate,
    /// Slots inserted by this run.
    pub created: Vec<Slot>,
    /// Slots that were already present from an earlier run.
    pub existing: Vec<Slot>,
    /// Start times whose insert failed and was skipped.
    pub failed: usize,
}

impl GeneratedDay {
    fn new(date: NaiveDate) -> Self {
        Self {
            date,
            ..Self::default()
        }
    }

    /// Every slot the date now has from its rules, ordered by time.
    pub fn slots(&self) -> Vec<Slot> {
        let mut slots: Vec<_> = self.created.iter().chain(&self.existing).cloned().collect();
        slots.sort_by_key(|slot| slot.date_time);
        slots
    }
}

/// Aggregate counts for a multi-day run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationSummary {
    pub days_requested: u32,
    /// Days that have at least one rule slot after the run, new or not.
    pub days_with_slots: u32,
    /// Slots created by this run.
    pub total_slots: usize,
    pub existing_slots: usize,
    pub failed_slots: usize,
    pub failed_days: Vec<NaiveDate>,
}

#[derive(Default)]
struct DateLocks {
    locks: Mutex<HashMap<NaiveDate, Arc<tokio::sync::Mutex<()>>>>,
}

impl DateLocks {
    async fn acquire(&self, date: NaiveDate) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            locks.entry(date).or_default().clone()
        };
        lock.lock_owned().await
    }
}

#[derive(Clone)]
pub struct SlotGenerator {
    rules: Arc<dyn RuleRepository>,
    slots: Arc<dyn SlotRepository>,
    clock: LocalClock,
    locks: Arc<DateLocks>,
}

impl SlotGenerator {
    pub fn new(
        rules: Arc<dyn RuleRepository>,
        slots: Arc<dyn SlotRepository>,
        clock: LocalClock,
    ) -> Self {
        Self {
            rules,
            slots,
            clock,
            locks: Arc::new(DateLocks::default()),
        }
    }

    pub fn clock(&self) -> LocalClock {
        self.clock
    }

    /// Generates the slots of one date. Fails only when the rules cannot be
    /// loaded; individual insert failures are counted in `failed`.
    pub async fn generate_for_date(&self, date: NaiveDate) -> BookingResult<GeneratedDay> {
        // Rejects dates whose local day cannot be represented as instants.
        self.clock.day_bounds(date)?;
        let _guard = self.locks.acquire(date).await;

        let weekday = day_of_week(date);
        let rules = self.rules.list_active_rules(weekday).await?;
        let mut day = GeneratedDay::new(date);

        if rules.is_empty() {
            debug!(%date, %weekday, "No active rules for weekday");
            return Ok(day);
        }

        for rule in &rules {
            self.generate_rule(date, rule, &mut day).await;
        }

        info!(
            %date,
            created = day.created.len(),
            existing = day.existing.len(),
            failed = day.failed,
            "Generated slots for date"
        );
        Ok(day)
    }

    async fn generate_rule(&self, date: NaiveDate, rule: &AvailabilityRule, day: &mut GeneratedDay) {
        for start in tile_window(rule.start_time, rule.end_time, rule.step_minutes) {
            let date_time = match self.clock.at(date, start) {
                Ok(date_time) => date_time,
                Err(e) => {
                    warn!(rule_id = %rule.id, %date, "Skipping slot: {e}");
                    day.failed += 1;
                    continue;
                }
            };
            let input = NewSlot {
                date_time,
                source_rule_id: rule.id,
            };

            match self.slots.insert_slot(&input).await {
                Ok(SlotInsert::Created(slot)) => {
                    debug!(slot_id = %slot.id, %date, time = %start.format("%H:%M"), "Inserted slot");
                    day.created.push(slot);
                }
                Ok(SlotInsert::Existing(slot)) => {
                    debug!(slot_id = %slot.id, %date, time = %start.format("%H:%M"), "Slot already exists");
                    day.existing.push(slot);
                }
                Err(e) => {
                    warn!(
                        rule_id = %rule.id,
                        %date,
                        time = %start.format("%H:%M"),
                        "Failed to insert slot, skipping: {e:#}"
                    );
                    day.failed += 1;
                }
            }
        }
    }

    /// Generates `days` consecutive dates starting today (local).
    pub async fn generate_days(&self, days: u32) -> GenerationSummary {
        self.generate_range(self.clock.today(), days).await
    }

    pub async fn generate_range(&self, start: NaiveDate, days: u32) -> GenerationSummary {
        info!(%start, days, "Generating slots");
        let mut summary = GenerationSummary {
            days_requested: days,
            ..GenerationSummary::default()
        };

        for offset in 0..days {
            let Some(date) = start.checked_add_days(Days::new(u64::from(offset))) else {
                error!(%start, offset, "Generation range runs past the last supported date");
                break;
            };
            match self.generate_for_date(date).await {
                Ok(day) => {
                    if !day.created.is_empty() || !day.existing.is_empty() {
                        summary.days_with_slots += 1;
                    }
                    summary.total_slots += day.created.len();
                    summary.existing_slots += day.existing.len();
                    summary.failed_slots += day.failed;
                }
                Err(e) => {
                    error!(%date, "Failed to generate slots for date: {e}");
                    summary.failed_days.push(date);
                }
            }
        }

        info!(
            days_with_slots = summary.days_with_slots,
            total_slots = summary.total_slots,
            failed_days = summary.failed_days.len(),
            "Slot generation finished"
        );
        summary
    }
}
