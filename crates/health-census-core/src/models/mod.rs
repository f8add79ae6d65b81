//! Domain models for the patient census.

mod input;
mod patient;

pub use input::*;
pub use patient::*;
