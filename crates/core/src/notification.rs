//! Booking notifications.
//!
//! Delivery is fire-and-forget: the coordinator never fails a reservation
//! because a notification could not be sent.

use std::fmt::Write;

use async_trait::async_trait;
use chrono::Locale;
use chrono::format::{Item, StrftimeItems};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::calendar::LocalClock;
use crate::errors::{BookingError, BookingResult};
use crate::models::{Contact, Reservation};

pub const DEFAULT_DATE_FORMAT: &str = "%-d de %B de %Y";
pub const DEFAULT_TIME_SUFFIX: &str = "hrs";

/// Payload handed to the notification channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingNotification {
    pub name: String,
    pub date: String,
    pub time: String,
    /// Empty when the patient has no known address.
    pub email: String,
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notification: &BookingNotification) -> BookingResult<()>;
}

/// Writes notifications to the log instead of delivering them.
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, notification: &BookingNotification) -> BookingResult<()> {
        info!(
            name = %notification.name,
            date = %notification.date,
            time = %notification.time,
            "Booking confirmed (no notification channel configured)"
        );
        Ok(())
    }
}

/// Renders reservation times in the clinic's locale.
#[derive(Debug, Clone)]
pub struct NotificationFormatter {
    clock: LocalClock,
    locale: Locale,
    date_format: String,
    time_suffix: String,
}

impl NotificationFormatter {
    pub fn new(clock: LocalClock, locale: Locale, date_format: &str, time_suffix: &str) -> Self {
        Self {
            clock,
            locale,
            date_format: date_format.to_string(),
            time_suffix: time_suffix.to_string(),
        }
    }

    pub fn format(
        &self,
        reservation: &Reservation,
        contact: Option<&Contact>,
    ) -> BookingResult<BookingNotification> {
        let local = reservation.slot_date_time.with_timezone(&self.clock.offset());

        let name = contact
            .map(|contact| contact.name.trim())
            .filter(|name| !name.is_empty())
            .unwrap_or(reservation.user_name.as_str())
            .to_string();
        let email = contact
            .and_then(|contact| contact.email.clone())
            .unwrap_or_default();

        let mut date = String::new();
        write!(date, "{}", local.format_localized(&self.date_format, self.locale)).map_err(|_| {
            BookingError::Notification(format!("Invalid date format: {:?}", self.date_format))
        })?;

        Ok(BookingNotification {
            name,
            date,
            time: format!("{}{}", local.format("%H:%M"), self.time_suffix),
            email,
        })
    }
}

/// Fails when `pattern` contains a specifier chrono cannot render.
pub fn validate_date_format(pattern: &str) -> BookingResult<()> {
    if StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error)) {
        return Err(BookingError::Validation(format!(
            "Unsupported date format: {pattern:?}"
        )));
    }
    Ok(())
}

impl Default for NotificationFormatter {
    fn default() -> Self {
        Self::new(
            LocalClock::default(),
            Locale::pt_BR,
            DEFAULT_DATE_FORMAT,
            DEFAULT_TIME_SUFFIX,
        )
    }
}
