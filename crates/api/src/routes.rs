pub mod generation;
pub mod health;
pub mod reservations;
pub mod rules;
pub mod slots;
