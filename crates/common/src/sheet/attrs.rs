use serde::{Deserialize, Serialize};

use crate::fxp::Fixed;

/// Which section of the sheet an attribute belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttrKind {
    Primary,
    Secondary,
    /// A depletable pool with a live value and a maximum.
    Pool,
}

/// One attribute row. For pools, `value` is the maximum and `current`
/// is the live value (defaulting to the maximum when absent).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    pub id: String,
    pub kind: AttrKind,
    pub name: String,
    pub value: Fixed,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current: Option<Fixed>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub points: Option<Fixed>,
}

impl Attribute {
    pub fn new(id: impl Into<String>, kind: AttrKind, name: impl Into<String>, value: Fixed) -> Self {
        Attribute {
            id: id.into(),
            kind,
            name: name.into(),
            value,
            current: None,
            points: None,
        }
    }

    pub fn maximum(&self) -> Fixed {
        self.value
    }

    /// The live value of a pool; non-pool attributes report their maximum.
    pub fn current(&self) -> Fixed {
        self.current.unwrap_or(self.value)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_pool_current_defaults_to_maximum() {
        let mut hp = Attribute::new("hp", AttrKind::Pool, "Hit Points", Fixed::from(12));
        assert_eq!(hp.current(), Fixed::from(12));
        hp.current = Some(Fixed::from(5));
        assert_eq!(hp.current(), Fixed::from(5));
        assert_eq!(hp.maximum(), Fixed::from(12));
    }
}
