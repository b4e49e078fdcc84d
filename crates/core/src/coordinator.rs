//! # Reservation coordinator
//!
//! Turns an available slot into a confirmed reservation exactly once.
//!
//! The slot is read first so that the common failures (unknown slot, slot
//! already taken) are reported without a write. The actual claim is a single
//! atomic store operation that inserts the reservation and flips the slot
//! only while it is still available; when two callers race, the store lets
//! exactly one of them through.
//!
//! After a successful claim a notification task is spawned. It never affects
//! the result returned to the caller.

use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::errors::{BookingError, BookingResult};
use crate::models::{NewReservation, Reservation, ReserveOutcome};
use crate::notification::{NotificationFormatter, Notifier};
use crate::repository::{ReservationRepository, SlotRepository, UserDirectory};

#[derive(Clone)]
pub struct ReservationCoordinator {
    slots: Arc<dyn SlotRepository>,
    reservations: Arc<dyn ReservationRepository>,
    directory: Option<Arc<dyn UserDirectory>>,
    notifier: Arc<dyn Notifier>,
    formatter: NotificationFormatter,
}

impl ReservationCoordinator {
    pub fn new(
        slots: Arc<dyn SlotRepository>,
        reservations: Arc<dyn ReservationRepository>,
        notifier: Arc<dyn Notifier>,
        formatter: NotificationFormatter,
    ) -> Self {
        Self {
            slots,
            reservations,
            directory: None,
            notifier,
            formatter,
        }
    }

    /// Enriches notifications with the patient's registered name and email.
    pub fn with_directory(mut self, directory: Arc<dyn UserDirectory>) -> Self {
        self.directory = Some(directory);
        self
    }

    pub async fn reserve(
        &self,
        slot_id: Uuid,
        user_id: &str,
        user_name: &str,
    ) -> BookingResult<Reservation> {
        let user_id = user_id.trim();
        let user_name = user_name.trim();
        if user_id.is_empty() {
            return Err(BookingError::Validation("user_id must not be empty".to_string()));
        }
        if user_name.is_empty() {
            return Err(BookingError::Validation("user_name must not be empty".to_string()));
        }

        let slot = self
            .slots
            .get_slot(slot_id)
            .await?
            .ok_or_else(|| slot_not_found(slot_id))?;
        if !slot.available {
            debug!(%slot_id, "Slot already reserved");
            return Err(BookingError::SlotUnavailable(slot_id));
        }

        let input = NewReservation::confirmed(slot.date_time, user_id, user_name);
        let reservation = match self.slots.reserve_slot(slot_id, &input).await? {
            ReserveOutcome::Reserved(reservation) => reservation,
            ReserveOutcome::SlotNotFound => return Err(slot_not_found(slot_id)),
            ReserveOutcome::SlotUnavailable => {
                info!(%slot_id, user_id, "Lost reservation race");
                return Err(BookingError::SlotUnavailable(slot_id));
            }
        };

        info!(
            %slot_id,
            reservation_id = %reservation.id,
            user_id,
            "Slot reserved"
        );
        self.spawn_notification(reservation.clone());
        Ok(reservation)
    }

    pub async fn get_reservation(&self, id: Uuid) -> BookingResult<Reservation> {
        self.reservations
            .get_reservation(id)
            .await?
            .ok_or_else(|| BookingError::NotFound(format!("Reservation with ID {id} not found")))
    }

    pub async fn reservations_for_user(&self, user_id: &str) -> BookingResult<Vec<Reservation>> {
        let user_id = user_id.trim();
        if user_id.is_empty() {
            return Err(BookingError::Validation("user_id must not be empty".to_string()));
        }
        Ok(self.reservations.list_reservations_for_user(user_id).await?)
    }

    fn spawn_notification(&self, reservation: Reservation) {
        let directory = self.directory.clone();
        let notifier = Arc::clone(&self.notifier);
        let formatter = self.formatter.clone();

        tokio::spawn(async move {
            let contact = match &directory {
                Some(directory) => match directory.find_contact(&reservation.user_id).await {
                    Ok(contact) => contact,
                    Err(e) => {
                        warn!(user_id = %reservation.user_id, "Contact lookup failed: {e:#}");
                        None
                    }
                },
                None => None,
            };

            let notification = match formatter.format(&reservation, contact.as_ref()) {
                Ok(notification) => notification,
                Err(e) => {
                    warn!(reservation_id = %reservation.id, "Failed to format booking notification: {e}");
                    return;
                }
            };
            if let Err(e) = notifier.notify(&notification).await {
                warn!(reservation_id = %reservation.id, "Failed to send booking notification: {e}");
            }
        });
    }
}

fn slot_not_found(id: Uuid) -> BookingError {
    BookingError::NotFound(format!("Slot with ID {id} not found"))
}
