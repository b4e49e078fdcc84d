use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveTime, Timelike, Utc, Weekday};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::calendar::time_of_day;
use crate::errors::{BookingError, BookingResult};

/// Day of the week as stored on rules, 0 = Sunday through 6 = Saturday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct DayOfWeek(u8);

impl DayOfWeek {
    pub const SUNDAY: Self = Self(0);
    pub const MONDAY: Self = Self(1);
    pub const TUESDAY: Self = Self(2);
    pub const WEDNESDAY: Self = Self(3);
    pub const THURSDAY: Self = Self(4);
    pub const FRIDAY: Self = Self(5);
    pub const SATURDAY: Self = Self(6);

    pub fn new(day: u8) -> BookingResult<Self> {
        if day > 6 {
            return Err(BookingError::Validation(format!(
                "Day of week must be between 0 (Sunday) and 6 (Saturday), got {day}"
            )));
        }
        Ok(Self(day))
    }

    pub fn number(self) -> u8 {
        self.0
    }

    pub fn weekday(self) -> Weekday {
        match self.0 {
            0 => Weekday::Sun,
            1 => Weekday::Mon,
            2 => Weekday::Tue,
            3 => Weekday::Wed,
            4 => Weekday::Thu,
            5 => Weekday::Fri,
            _ => Weekday::Sat,
        }
    }
}

impl From<Weekday> for DayOfWeek {
    fn from(weekday: Weekday) -> Self {
        // num_days_from_sunday is always within 0..=6
        Self(weekday.num_days_from_sunday() as u8)
    }
}

impl TryFrom<u8> for DayOfWeek {
    type Error = BookingError;

    fn try_from(day: u8) -> Result<Self, Self::Error> {
        Self::new(day)
    }
}

impl From<DayOfWeek> for u8 {
    fn from(day: DayOfWeek) -> Self {
        day.0
    }
}

impl fmt::Display for DayOfWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Coarse label for a window. On rules it is display-only; on slots it is
/// derived from the local hour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    #[serde(alias = "manha")]
    Morning,
    #[serde(alias = "tarde")]
    Afternoon,
}

impl Period {
    /// Morning before noon, afternoon from 12:00 on.
    pub fn of(time: NaiveTime) -> Self {
        if time.hour() < 12 {
            Self::Morning
        } else {
            Self::Afternoon
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Morning => "morning",
            Self::Afternoon => "afternoon",
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Period {
    type Err = BookingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "morning" | "manha" => Ok(Self::Morning),
            "afternoon" | "tarde" => Ok(Self::Afternoon),
            other => Err(BookingError::Validation(format!("Unknown period: {other}"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityRule {
    pub id: Uuid,
    pub day_of_week: DayOfWeek,
    pub period: Period,
    #[serde(with = "time_of_day")]
    pub start_time: NaiveTime,
    #[serde(with = "time_of_day")]
    pub end_time: NaiveTime,
    pub step_minutes: i32,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl AvailabilityRule {
    /// Revalidates a rule assembled from stored or merged fields.
    pub fn validate(&self) -> BookingResult<()> {
        validate_window(self.start_time, self.end_time, self.step_minutes)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAvailabilityRule {
    pub day_of_week: DayOfWeek,
    pub period: Period,
    #[serde(with = "time_of_day")]
    pub start_time: NaiveTime,
    #[serde(with = "time_of_day")]
    pub end_time: NaiveTime,
    pub step_minutes: i32,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl NewAvailabilityRule {
    pub fn validate(&self) -> BookingResult<()> {
        validate_window(self.start_time, self.end_time, self.step_minutes)
    }
}

/// Partial update; absent fields keep their stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateAvailabilityRule {
    pub day_of_week: Option<DayOfWeek>,
    pub period: Option<Period>,
    #[serde(default, with = "time_of_day::option")]
    pub start_time: Option<NaiveTime>,
    #[serde(default, with = "time_of_day::option")]
    pub end_time: Option<NaiveTime>,
    pub step_minutes: Option<i32>,
    pub active: Option<bool>,
}

impl UpdateAvailabilityRule {
    pub fn apply_to(&self, rule: &AvailabilityRule) -> AvailabilityRule {
        AvailabilityRule {
            id: rule.id,
            day_of_week: self.day_of_week.unwrap_or(rule.day_of_week),
            period: self.period.unwrap_or(rule.period),
            start_time: self.start_time.unwrap_or(rule.start_time),
            end_time: self.end_time.unwrap_or(rule.end_time),
            step_minutes: self.step_minutes.unwrap_or(rule.step_minutes),
            active: self.active.unwrap_or(rule.active),
            created_at: rule.created_at,
        }
    }
}

fn validate_window(start: NaiveTime, end: NaiveTime, step_minutes: i32) -> BookingResult<()> {
    if start >= end {
        return Err(BookingError::Validation(format!(
            "Start time {} must be before end time {}",
            start.format("%H:%M"),
            end.format("%H:%M")
        )));
    }
    if step_minutes <= 0 {
        return Err(BookingError::Validation(format!(
            "Interval must be a positive number of minutes, got {step_minutes}"
        )));
    }
    Ok(())
}
