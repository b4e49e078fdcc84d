use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::BookingError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReservationStatus {
    Pending,
    Confirmed,
    Cancelled,
}

impl ReservationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReservationStatus {
    type Err = BookingError;

    // Accepts the labels written by the previous deployment as well.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" | "pendente" => Ok(Self::Pending),
            "confirmed" | "confirmado" | "reservado" => Ok(Self::Confirmed),
            "cancelled" | "canceled" | "cancelado" => Ok(Self::Cancelled),
            other => Err(BookingError::Validation(format!(
                "Unknown reservation status: {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    pub id: Uuid,
    pub slot_date_time: DateTime<Utc>,
    pub user_id: String,
    pub user_name: String,
    pub status: ReservationStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewReservation {
    pub slot_date_time: DateTime<Utc>,
    pub user_id: String,
    pub user_name: String,
    pub status: ReservationStatus,
}

impl NewReservation {
    pub fn confirmed(slot_date_time: DateTime<Utc>, user_id: &str, user_name: &str) -> Self {
        Self {
            slot_date_time,
            user_id: user_id.to_string(),
            user_name: user_name.to_string(),
            status: ReservationStatus::Confirmed,
        }
    }
}

/// Result of the conditional reservation write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReserveOutcome {
    Reserved(Reservation),
    SlotNotFound,
    SlotUnavailable,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReserveRequest {
    pub user_id: String,
    pub user_name: String,
}

/// Contact details used to address booking notifications.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub name: String,
    pub email: Option<String>,
}
