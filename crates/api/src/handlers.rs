pub mod generation;
pub mod reservations;
pub mod rules;
pub mod slots;
