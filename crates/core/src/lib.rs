//! # SlotBook Core
//!
//! Domain layer of the booking service: recurring availability rules are
//! expanded into dated slots, and a slot is reserved at most once.
//!
//! Storage and notification delivery are collaborators behind the traits in
//! [`repository`] and [`notification`]. [`memory::MemoryStore`] implements
//! every repository trait for tests and single-process use.

pub mod calendar;
pub mod config;
pub mod coordinator;
pub mod errors;
pub mod generator;
pub mod memory;
pub mod models;
pub mod notification;
pub mod query;
pub mod repository;
pub mod rules;

pub use calendar::LocalClock;
pub use coordinator::ReservationCoordinator;
pub use errors::{BookingError, BookingResult};
pub use generator::{GeneratedDay, GenerationSummary, SlotGenerator};
pub use query::SlotQueryService;
pub use rules::RuleService;
