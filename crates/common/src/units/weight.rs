use std::fmt;

use serde::{Deserialize, Serialize};

use crate::fxp::Fixed;

use super::ParseUnitError;

/// Display unit for weights. The stored value is always pounds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightUnit {
    #[default]
    #[serde(rename = "lb")]
    Pound,
    #[serde(rename = "oz")]
    Ounce,
    #[serde(rename = "tn")]
    Ton,
    #[serde(rename = "kg")]
    Kilogram,
    #[serde(rename = "g")]
    Gram,
}

impl WeightUnit {
    /// Ratio of one of this unit to pounds, as `(numerator, denominator)`.
    ///
    /// Metric units use the traditional simplified ratio 1 kg = 2.205 lb.
    fn to_pounds_ratio(self) -> (i64, i64) {
        match self {
            WeightUnit::Pound => (1, 1),
            WeightUnit::Ounce => (1, 16),
            WeightUnit::Ton => (2_000, 1),
            WeightUnit::Kilogram => (2_205, 1_000),
            WeightUnit::Gram => (2_205, 1_000_000),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            WeightUnit::Pound => "lb",
            WeightUnit::Ounce => "oz",
            WeightUnit::Ton => "tn",
            WeightUnit::Kilogram => "kg",
            WeightUnit::Gram => "g",
        }
    }
}

/// A physical weight, stored as fixed-point pounds.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Weight(Fixed);

impl Weight {
    pub const ZERO: Weight = Weight(Fixed::ZERO);

    pub fn from_pounds(pounds: Fixed) -> Self {
        Weight(pounds)
    }

    pub fn pounds(self) -> Fixed {
        self.0
    }

    /// Parse a user-entered weight against the given display unit.
    ///
    /// A trailing unit label (`150 lb`, `68 kg`) overrides the default.
    pub fn parse(input: &str, unit: WeightUnit) -> Result<Self, ParseUnitError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(ParseUnitError::Weight(input.to_string()));
        }
        let (number, unit) = match split_unit_suffix(trimmed) {
            Some((number, suffix)) => (number, suffix),
            None => (trimmed, unit),
        };
        let value: Fixed = number
            .trim()
            .parse()
            .map_err(|_| ParseUnitError::Weight(input.to_string()))?;
        let (num, den) = unit.to_pounds_ratio();
        value
            .mul_ratio(num, den)
            .map(Weight)
            .ok_or_else(|| ParseUnitError::OutOfRange(input.to_string()))
    }

    /// Format for display in the given unit.
    pub fn format(self, unit: WeightUnit) -> String {
        let (num, den) = unit.to_pounds_ratio();
        // Invert the stored-value ratio to express pounds in `unit`.
        let value = self.0.mul_ratio(den, num).unwrap_or(Fixed::ZERO);
        format!("{} {}", value, unit.label())
    }
}

impl fmt::Display for Weight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format(WeightUnit::Pound))
    }
}

fn split_unit_suffix(input: &str) -> Option<(&str, WeightUnit)> {
    for unit in [
        WeightUnit::Pound,
        WeightUnit::Ounce,
        WeightUnit::Ton,
        WeightUnit::Kilogram,
        WeightUnit::Gram,
    ] {
        if let Some(number) = input.strip_suffix(unit.label()) {
            // Require a digit somewhere before the label so a bare unit
            // name does not parse as zero.
            if number.trim().chars().any(|c| c.is_ascii_digit()) {
                return Some((number, unit));
            }
        }
    }
    None
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse_bare_number_uses_unit() {
        assert_eq!(
            Weight::parse("150", WeightUnit::Pound).unwrap().pounds(),
            Fixed::from_i64(150).unwrap()
        );
        assert_eq!(
            Weight::parse("32", WeightUnit::Ounce).unwrap().pounds(),
            Fixed::from_i64(2).unwrap()
        );
    }

    #[test]
    fn test_parse_unit_suffix_overrides() {
        let kg = Weight::parse("100 kg", WeightUnit::Pound).unwrap();
        assert_eq!(kg.pounds(), Fixed::from_raw(2_205_000));
        let oz = Weight::parse("16oz", WeightUnit::Kilogram).unwrap();
        assert_eq!(oz.pounds(), Fixed::from_i64(1).unwrap());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(Weight::parse("", WeightUnit::Pound).is_err());
        assert!(Weight::parse("heavy", WeightUnit::Pound).is_err());
        assert!(Weight::parse("kg", WeightUnit::Pound).is_err());
    }

    #[test]
    fn test_format() {
        let w = Weight::from_pounds(Fixed::from_i64(150).unwrap());
        assert_eq!(w.format(WeightUnit::Pound), "150 lb");
        assert_eq!(w.format(WeightUnit::Ounce), "2400 oz");
    }
}
