pub mod booking;
pub mod public;
