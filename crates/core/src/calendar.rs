//! # Calendar utilities
//!
//! Conversions between local wall-clock time and the stored instant for a
//! single fixed UTC offset. Everything is written as a UTC instant; the
//! offset is applied only at the read/write boundary.

use chrono::{
    DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Offset,
    SecondsFormat, TimeZone, Timelike, Utc,
};

use crate::errors::{BookingError, BookingResult};
use crate::models::DayOfWeek;

/// Formats that carry an explicit offset and therefore name a true instant.
const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f%#z",
    "%Y-%m-%dT%H:%M:%S%.f%#z",
    "%Y-%m-%d %H:%M%#z",
    "%Y-%m-%dT%H:%M%#z",
];

/// Offset-free formats, read as local wall-clock values.
const LOCAL_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalClock {
    offset: FixedOffset,
}

impl LocalClock {
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    pub fn utc() -> Self {
        Self::new(Utc.fix())
    }

    /// Builds a clock from an offset east of UTC in minutes (UTC-3 is `-180`).
    pub fn from_offset_minutes(minutes: i32) -> BookingResult<Self> {
        minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .map(Self::new)
            .ok_or_else(|| {
                BookingError::Validation(format!("UTC offset out of range: {minutes} minutes"))
            })
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// Local wall-clock moment to the stored instant. Fails for moments the
    /// offset would push outside chrono's representable range.
    pub fn to_storage(&self, local: NaiveDateTime) -> BookingResult<DateTime<Utc>> {
        local
            .checked_sub_signed(Duration::seconds(i64::from(self.offset.local_minus_utc())))
            .map(|utc| Utc.from_utc_datetime(&utc))
            .ok_or_else(|| out_of_range(local.date()))
    }

    /// Stored instant back to the local wall-clock moment.
    pub fn to_local(&self, instant: DateTime<Utc>) -> NaiveDateTime {
        instant.with_timezone(&self.offset).naive_local()
    }

    pub fn at(&self, date: NaiveDate, time: NaiveTime) -> BookingResult<DateTime<Utc>> {
        self.to_storage(date.and_time(time))
    }

    pub fn today(&self) -> NaiveDate {
        self.to_local(Utc::now()).date()
    }

    /// First and last millisecond of a local day, both inclusive.
    pub fn day_bounds(&self, date: NaiveDate) -> BookingResult<(DateTime<Utc>, DateTime<Utc>)> {
        let start = self.at(date, NaiveTime::MIN)?;
        let end = start
            .checked_add_signed(Duration::days(1) - Duration::milliseconds(1))
            .ok_or_else(|| out_of_range(date))?;
        Ok((start, end))
    }

    /// The one representation used whenever an instant is written as text.
    pub fn encode(&self, instant: DateTime<Utc>) -> String {
        instant.to_rfc3339_opts(SecondsFormat::Secs, true)
    }

    /// Reads either historical encoding. Offset-annotated text is a real
    /// instant; bare text is a local wall-clock reading under this clock.
    pub fn decode(&self, raw: &str) -> BookingResult<DateTime<Utc>> {
        let raw = raw.trim();

        if let Ok(instant) = DateTime::parse_from_rfc3339(raw) {
            return Ok(instant.with_timezone(&Utc));
        }
        for format in OFFSET_FORMATS {
            if let Ok(instant) = DateTime::parse_from_str(raw, format) {
                return Ok(instant.with_timezone(&Utc));
            }
        }
        for format in LOCAL_FORMATS {
            if let Ok(local) = NaiveDateTime::parse_from_str(raw, format) {
                return self.to_storage(local);
            }
        }

        Err(BookingError::Validation(format!(
            "Unrecognised timestamp: {raw}"
        )))
    }
}

fn out_of_range(date: NaiveDate) -> BookingError {
    BookingError::Validation(format!("Date {date} is outside the supported range"))
}

impl Default for LocalClock {
    fn default() -> Self {
        Self::utc()
    }
}

pub fn day_of_week(date: NaiveDate) -> DayOfWeek {
    DayOfWeek::from(date.weekday())
}

/// Next date on `target`, counting `today` itself.
pub fn next_occurrence_of_weekday(today: NaiveDate, target: DayOfWeek) -> NaiveDate {
    let current = i64::from(day_of_week(today).number());
    let wanted = i64::from(target.number());
    today + Duration::days((wanted - current).rem_euclid(7))
}

/// Accepts `HH:MM` or `HH:MM:SS`; seconds are dropped.
pub fn parse_time_of_day(raw: &str) -> BookingResult<NaiveTime> {
    let raw = raw.trim();
    let parsed = NaiveTime::parse_from_str(raw, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .map_err(|_| BookingError::Validation(format!("Invalid time of day: {raw}")))?;

    NaiveTime::from_hms_opt(parsed.hour(), parsed.minute(), 0)
        .ok_or_else(|| BookingError::Validation(format!("Invalid time of day: {raw}")))
}

/// Serde adapter writing times of day as `HH:MM`.
pub mod time_of_day {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&time.format("%H:%M"))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_time_of_day(&raw).map_err(serde::de::Error::custom)
    }

    pub mod option {
        use chrono::NaiveTime;
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(
            time: &Option<NaiveTime>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match time {
                Some(time) => super::serialize(time, serializer),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<NaiveTime>, D::Error> {
            Option::<String>::deserialize(deserializer)?
                .map(|raw| super::super::parse_time_of_day(&raw).map_err(serde::de::Error::custom))
                .transpose()
        }
    }
}
