use std::fmt;
use std::ops::{Add, Neg, Sub};
use std::str::FromStr;

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

const MULTIPLIER: i64 = 10_000;
const DECIMAL_PLACES: u32 = 4;

/// A fixed-point value with four decimal places.
///
/// Values are truncated, not rounded, so arithmetic matches what the
/// sheet format stores on disk. Serialized as a decimal string.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Fixed(i64);

impl Fixed {
    pub const ZERO: Fixed = Fixed(0);
    pub const ONE: Fixed = Fixed(MULTIPLIER);

    /// Largest representable value.
    pub const MAX: Fixed = Fixed(i64::MAX);
    /// Smallest representable value.
    pub const MIN: Fixed = Fixed(i64::MIN);

    pub const fn from_raw(raw: i64) -> Self {
        Fixed(raw)
    }

    pub const fn raw(self) -> i64 {
        self.0
    }

    pub fn from_i64(value: i64) -> Option<Self> {
        value.checked_mul(MULTIPLIER).map(Fixed)
    }

    /// Everything to the right of the decimal place dropped.
    pub fn trunc(self) -> Self {
        Fixed(self.0 / MULTIPLIER * MULTIPLIER)
    }

    /// The integer portion of the value.
    pub fn to_i64(self) -> i64 {
        self.0 / MULTIPLIER
    }

    pub fn abs(self) -> Self {
        Fixed(self.0.abs())
    }

    pub fn is_negative(self) -> bool {
        self.0 < 0
    }

    pub fn checked_add(self, other: Fixed) -> Option<Fixed> {
        self.0.checked_add(other.0).map(Fixed)
    }

    pub fn checked_sub(self, other: Fixed) -> Option<Fixed> {
        self.0.checked_sub(other.0).map(Fixed)
    }

    /// Multiply by the exact ratio `num / den`, truncating.
    ///
    /// Intermediate math is widened so unit conversion ratios with large
    /// numerators cannot overflow the raw representation.
    pub fn mul_ratio(self, num: i64, den: i64) -> Option<Fixed> {
        let wide = (self.0 as i128).checked_mul(num as i128)? / den as i128;
        i64::try_from(wide).ok().map(Fixed)
    }
}

impl From<i32> for Fixed {
    fn from(value: i32) -> Self {
        Fixed(value as i64 * MULTIPLIER)
    }
}

impl Add for Fixed {
    type Output = Fixed;

    fn add(self, other: Fixed) -> Fixed {
        Fixed(self.0 + other.0)
    }
}

impl Sub for Fixed {
    type Output = Fixed;

    fn sub(self, other: Fixed) -> Fixed {
        Fixed(self.0 - other.0)
    }
}

impl Neg for Fixed {
    type Output = Fixed;

    fn neg(self) -> Fixed {
        Fixed(-self.0)
    }
}

impl fmt::Display for Fixed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let whole = abs / MULTIPLIER as u64;
        let frac = abs % MULTIPLIER as u64;
        if frac == 0 {
            return write!(f, "{sign}{whole}");
        }
        let mut frac = format!("{frac:04}");
        while frac.ends_with('0') {
            frac.pop();
        }
        write!(f, "{sign}{whole}.{frac}")
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ParseFixedError {
    #[error("empty value")]
    Empty,
    #[error("not a decimal number: {0}")]
    Invalid(String),
    #[error("value out of range: {0}")]
    OutOfRange(String),
}

impl FromStr for Fixed {
    type Err = ParseFixedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(ParseFixedError::Empty);
        }
        let (negative, body) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
        };
        let (whole, frac) = match body.split_once('.') {
            Some((w, f)) => (w, f),
            None => (body, ""),
        };
        if whole.is_empty() && frac.is_empty() {
            return Err(ParseFixedError::Invalid(s.trim().to_string()));
        }
        if !whole.chars().all(|c| c.is_ascii_digit()) || !frac.chars().all(|c| c.is_ascii_digit()) {
            return Err(ParseFixedError::Invalid(s.trim().to_string()));
        }
        let whole: i64 = if whole.is_empty() {
            0
        } else {
            whole
                .parse()
                .map_err(|_| ParseFixedError::OutOfRange(s.trim().to_string()))?
        };
        // Digits past the supported precision are truncated, not rounded.
        let mut frac_value: i64 = 0;
        for (i, c) in frac.chars().take(DECIMAL_PLACES as usize).enumerate() {
            let digit = c.to_digit(10).unwrap() as i64;
            frac_value += digit * 10_i64.pow(DECIMAL_PLACES - 1 - i as u32);
        }
        let raw = whole
            .checked_mul(MULTIPLIER)
            .and_then(|v| v.checked_add(frac_value))
            .ok_or_else(|| ParseFixedError::OutOfRange(s.trim().to_string()))?;
        Ok(Fixed(if negative { -raw } else { raw }))
    }
}

impl Serialize for Fixed {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Fixed {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(DeError::custom)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse_whole_and_fraction() {
        assert_eq!("10".parse::<Fixed>().unwrap(), Fixed::from_i64(10).unwrap());
        assert_eq!("-3".parse::<Fixed>().unwrap(), Fixed::from_i64(-3).unwrap());
        assert_eq!("0.5".parse::<Fixed>().unwrap(), Fixed::from_raw(5_000));
        assert_eq!("-0.25".parse::<Fixed>().unwrap(), Fixed::from_raw(-2_500));
        assert_eq!(".5".parse::<Fixed>().unwrap(), Fixed::from_raw(5_000));
        assert_eq!("+1.0".parse::<Fixed>().unwrap(), Fixed::ONE);
    }

    #[test]
    fn test_parse_truncates_extra_precision() {
        assert_eq!("1.23456789".parse::<Fixed>().unwrap(), Fixed::from_raw(12_345));
        assert_eq!("0.99999".parse::<Fixed>().unwrap(), Fixed::from_raw(9_999));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("".parse::<Fixed>().is_err());
        assert!("  ".parse::<Fixed>().is_err());
        assert!("abc".parse::<Fixed>().is_err());
        assert!("1.2.3".parse::<Fixed>().is_err());
        assert!("1e5".parse::<Fixed>().is_err());
        assert!(".".parse::<Fixed>().is_err());
    }

    #[test]
    fn test_parse_rejects_overflow() {
        assert!(matches!(
            "99999999999999999999".parse::<Fixed>(),
            Err(ParseFixedError::OutOfRange(_))
        ));
    }

    #[test]
    fn test_display_trims_trailing_zeros() {
        assert_eq!(Fixed::from_raw(5_000).to_string(), "0.5");
        assert_eq!(Fixed::from_raw(-2_500).to_string(), "-0.25");
        assert_eq!(Fixed::from_i64(42).unwrap().to_string(), "42");
        assert_eq!(Fixed::from_raw(12_345).to_string(), "1.2345");
    }

    #[test]
    fn test_display_parse_round_trip() {
        for raw in [0, 1, -1, 9_999, -9_999, 123_456_789, -123_456_789] {
            let value = Fixed::from_raw(raw);
            assert_eq!(value.to_string().parse::<Fixed>().unwrap(), value);
        }
    }

    #[test]
    fn test_mul_ratio() {
        // 100 cm -> inches
        let cm = Fixed::from_i64(100).unwrap();
        let inches = cm.mul_ratio(100, 254).unwrap();
        assert_eq!(inches, Fixed::from_raw(393_700));
        assert_eq!(inches.to_string(), "39.37");
    }

    #[test]
    fn test_trunc() {
        assert_eq!(Fixed::from_raw(19_999).trunc(), Fixed::from_i64(1).unwrap());
        assert_eq!(Fixed::from_raw(-19_999).trunc(), Fixed::from_i64(-1).unwrap());
    }
}
