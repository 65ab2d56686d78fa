/**
 * Fixed-point numeric type used throughout the sheet model.
 *  Four decimal places, truncating arithmetic.
 */
pub mod fxp;
/**
 * Portrait image normalization.
 *  Decodes uploaded image bytes and re-encodes them into
 *  the bounded representation the sheet stores.
 */
pub mod portrait;
/**
 * The character sheet document.
 *  Profile, attributes, point pools, hit locations, and the
 *  load / save / checksum surface the server consumes.
 */
pub mod sheet;
/**
 * Physical units for lengths and weights.
 *  Values are stored unit-less (inches / pounds) and parsed or
 *  formatted against a sheet's configured display unit.
 */
pub mod units;

pub mod prelude {
    pub use crate::fxp::Fixed;
    pub use crate::sheet::{Sheet, SheetError, SHEET_EXT};
    pub use crate::units::{Length, LengthUnit, Weight, WeightUnit};
}
