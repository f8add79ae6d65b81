//! Export of registry data.

mod csv;

pub use csv::*;
