//! NEM12 interval metering files: record decoding and hourly reconstruction.

pub mod decode;
pub mod error;
pub mod reconstructor;
pub mod records;
pub mod units;

pub use error::{DecodeError, EventRangeError};
pub use reconstructor::{hourly_readings, IntervalReconstructor, Progress};
pub use units::{EnergyUnit, UnitConversionError};
