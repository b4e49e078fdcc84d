pub mod reservation;
pub mod rule;
pub mod slot;
pub mod user;
