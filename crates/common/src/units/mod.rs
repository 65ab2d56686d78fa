mod length;
mod weight;

pub use length::{Length, LengthUnit};
pub use weight::{Weight, WeightUnit};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ParseUnitError {
    #[error("not a valid length: {0}")]
    Length(String),
    #[error("not a valid weight: {0}")]
    Weight(String),
    #[error("value out of range: {0}")]
    OutOfRange(String),
}
