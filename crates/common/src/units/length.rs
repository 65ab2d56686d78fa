use std::fmt;

use serde::{Deserialize, Serialize};

use crate::fxp::Fixed;

use super::ParseUnitError;

/// Display unit for lengths. The stored value is always inches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LengthUnit {
    /// Feet-and-inches notation, e.g. `6'2"`.
    #[default]
    FtIn,
    #[serde(rename = "in")]
    Inch,
    #[serde(rename = "ft")]
    Feet,
    #[serde(rename = "yd")]
    Yard,
    #[serde(rename = "mi")]
    Mile,
    #[serde(rename = "cm")]
    Centimeter,
    #[serde(rename = "m")]
    Meter,
    #[serde(rename = "km")]
    Kilometer,
}

impl LengthUnit {
    /// Ratio of one of this unit to inches, as `(numerator, denominator)`.
    ///
    /// Metric units use the exact definition 1 in = 2.54 cm.
    fn to_inches_ratio(self) -> (i64, i64) {
        match self {
            LengthUnit::FtIn | LengthUnit::Inch => (1, 1),
            LengthUnit::Feet => (12, 1),
            LengthUnit::Yard => (36, 1),
            LengthUnit::Mile => (63_360, 1),
            LengthUnit::Centimeter => (100, 254),
            LengthUnit::Meter => (10_000, 254),
            LengthUnit::Kilometer => (10_000_000, 254),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            LengthUnit::FtIn => "ft/in",
            LengthUnit::Inch => "in",
            LengthUnit::Feet => "ft",
            LengthUnit::Yard => "yd",
            LengthUnit::Mile => "mi",
            LengthUnit::Centimeter => "cm",
            LengthUnit::Meter => "m",
            LengthUnit::Kilometer => "km",
        }
    }
}

/// A physical length, stored as fixed-point inches.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Length(Fixed);

impl Length {
    pub const ZERO: Length = Length(Fixed::ZERO);

    pub fn from_inches(inches: Fixed) -> Self {
        Length(inches)
    }

    pub fn inches(self) -> Fixed {
        self.0
    }

    /// Parse a user-entered length against the given display unit.
    ///
    /// Feet-and-inches notation (`6'2"`, `6'`, `2"`) is always accepted;
    /// a bare number is interpreted in `unit` (inches when the unit is
    /// feet-and-inches).
    pub fn parse(input: &str, unit: LengthUnit) -> Result<Self, ParseUnitError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(ParseUnitError::Length(input.to_string()));
        }
        if trimmed.contains('\'') || trimmed.contains('"') {
            return parse_feet_and_inches(trimmed);
        }
        let value: Fixed = trimmed
            .parse()
            .map_err(|_| ParseUnitError::Length(input.to_string()))?;
        let unit = if unit == LengthUnit::FtIn {
            LengthUnit::Inch
        } else {
            unit
        };
        let (num, den) = unit.to_inches_ratio();
        value
            .mul_ratio(num, den)
            .map(Length)
            .ok_or_else(|| ParseUnitError::OutOfRange(input.to_string()))
    }

    /// Format for display in the given unit.
    pub fn format(self, unit: LengthUnit) -> String {
        match unit {
            LengthUnit::FtIn => {
                let total = self.0.to_i64();
                let feet = total / 12;
                let inches = total % 12;
                if feet == 0 {
                    format!("{inches}\"")
                } else if inches == 0 {
                    format!("{feet}'")
                } else {
                    format!("{feet}'{inches}\"")
                }
            }
            _ => {
                let (num, den) = unit.to_inches_ratio();
                // Invert the stored-value ratio to express inches in `unit`.
                let value = self.0.mul_ratio(den, num).unwrap_or(Fixed::ZERO);
                format!("{} {}", value, unit.label())
            }
        }
    }
}

impl fmt::Display for Length {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format(LengthUnit::FtIn))
    }
}

fn parse_feet_and_inches(input: &str) -> Result<Length, ParseUnitError> {
    let bad = || ParseUnitError::Length(input.to_string());
    let (feet_part, rest) = match input.split_once('\'') {
        Some((feet, rest)) => (Some(feet.trim()), rest.trim()),
        None => (None, input.trim()),
    };
    let inch_part = match rest.strip_suffix('"') {
        Some(stripped) => stripped.trim(),
        None if rest.is_empty() => "",
        None => return Err(bad()),
    };
    let mut total = Fixed::ZERO;
    if let Some(feet) = feet_part {
        if feet.is_empty() {
            return Err(bad());
        }
        let feet: Fixed = feet.parse().map_err(|_| bad())?;
        total = feet
            .mul_ratio(12, 1)
            .ok_or_else(|| ParseUnitError::OutOfRange(input.to_string()))?;
    }
    if !inch_part.is_empty() {
        let inches: Fixed = inch_part.parse().map_err(|_| bad())?;
        total = total
            .checked_add(inches)
            .ok_or_else(|| ParseUnitError::OutOfRange(input.to_string()))?;
    }
    Ok(Length(total))
}
