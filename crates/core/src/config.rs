//! # Booking configuration
//!
//! Settings shared by the server and the command-line tools.
//!
//! ## Environment Variables
//!
//! - `BOOKING_UTC_OFFSET_MINUTES`: offset of the clinic's wall clock east of UTC (default: -180)
//! - `BOOKING_LOCALE`: locale for notification dates (default: "pt_BR")
//! - `BOOKING_DATE_FORMAT`: strftime pattern for notification dates (default: "%-d de %B de %Y")
//! - `BOOKING_TIME_SUFFIX`: appended to notification times (default: "hrs")
//! - `BOOKING_GENERATION_DAYS`: days covered by each batch generation run (default: 14)
//! - `BOOKING_GENERATION_INTERVAL_HOURS`: period of the background generation job (unset: disabled)

use std::env;
use std::str::FromStr;

use chrono::Locale;
use eyre::{Result, WrapErr, eyre};

use crate::calendar::LocalClock;
use crate::notification::{
    DEFAULT_DATE_FORMAT, DEFAULT_TIME_SUFFIX, NotificationFormatter, validate_date_format,
};

pub const DEFAULT_UTC_OFFSET_MINUTES: i32 = -180;
pub const DEFAULT_GENERATION_DAYS: u32 = 14;

#[derive(Debug, Clone)]
pub struct BookingConfig {
    pub utc_offset_minutes: i32,
    pub locale: Locale,
    pub date_format: String,
    pub time_suffix: String,
    pub generation_days: u32,
    /// `None` disables the background generation job.
    pub generation_interval_hours: Option<u64>,
}

impl BookingConfig {
    pub fn from_env() -> Result<Self> {
        let utc_offset_minutes = parse_var("BOOKING_UTC_OFFSET_MINUTES")?
            .unwrap_or(DEFAULT_UTC_OFFSET_MINUTES);
        // Reject an out-of-range offset here rather than at first use.
        LocalClock::from_offset_minutes(utc_offset_minutes)
            .map_err(|e| eyre!("Invalid BOOKING_UTC_OFFSET_MINUTES value: {e}"))?;

        let locale = match env::var("BOOKING_LOCALE") {
            Ok(raw) => parse_locale(&raw)?,
            Err(_) => Locale::pt_BR,
        };

        let date_format =
            env::var("BOOKING_DATE_FORMAT").unwrap_or_else(|_| DEFAULT_DATE_FORMAT.to_string());
        validate_date_format(&date_format)
            .map_err(|e| eyre!("Invalid BOOKING_DATE_FORMAT value: {e}"))?;
        let time_suffix =
            env::var("BOOKING_TIME_SUFFIX").unwrap_or_else(|_| DEFAULT_TIME_SUFFIX.to_string());

        let generation_days =
            parse_var("BOOKING_GENERATION_DAYS")?.unwrap_or(DEFAULT_GENERATION_DAYS);
        let generation_interval_hours = parse_var::<u64>("BOOKING_GENERATION_INTERVAL_HOURS")?
            .filter(|hours| *hours > 0);

        Ok(Self {
            utc_offset_minutes,
            locale,
            date_format,
            time_suffix,
            generation_days,
            generation_interval_hours,
        })
    }

    pub fn clock(&self) -> LocalClock {
        LocalClock::from_offset_minutes(self.utc_offset_minutes).unwrap_or_default()
    }

    pub fn formatter(&self) -> NotificationFormatter {
        NotificationFormatter::new(self.clock(), self.locale, &self.date_format, &self.time_suffix)
    }
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            utc_offset_minutes: DEFAULT_UTC_OFFSET_MINUTES,
            locale: Locale::pt_BR,
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            time_suffix: DEFAULT_TIME_SUFFIX.to_string(),
            generation_days: DEFAULT_GENERATION_DAYS,
            generation_interval_hours: None,
        }
    }
}

pub fn parse_locale(raw: &str) -> Result<Locale> {
    Locale::try_from(raw.trim()).map_err(|_| eyre!("Unknown locale: {raw}"))
}

fn parse_var<T>(name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map(Some)
            .wrap_err_with(|| format!("Invalid {name} value")),
        _ => Ok(None),
    }
}
