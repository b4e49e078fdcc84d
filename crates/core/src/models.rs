pub mod availability_rule;
pub mod reservation;
pub mod slot;

pub use availability_rule::{
    AvailabilityRule, DayOfWeek, NewAvailabilityRule, Period, UpdateAvailabilityRule,
};
pub use reservation::{
    Contact, NewReservation, Reservation, ReservationStatus, ReserveOutcome, ReserveRequest,
};
pub use slot::{DaySchedule, LocalSlot, NewSlot, Slot, SlotFilter, SlotInsert};
