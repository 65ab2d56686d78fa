use std::collections::HashMap;
use std::sync::OnceLock;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};

use common::fxp::Fixed;
use common::portrait;
use common::prelude::{Length, Sheet, Weight};
use common::sheet::{MAX_SIZE_MODIFIER, MIN_SIZE_MODIFIER};

/// A single field edit as received from the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldUpdate {
    pub kind: UpdateKind,
    /// Dotted key path, e.g. `Identity.Name` or `PointPools.hp.Current`.
    pub key: String,
    /// Raw text, or base64 for binary updates.
    pub data: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateKind {
    Text,
    Binary,
}

/// Apply one update to a sheet. Returns whether the document changed;
/// setting a field to its current normalized value is a no-op and must
/// not disturb the checksum or modification time, so the caller only
/// stamps and republishes when this reports true.
pub fn apply(sheet: &mut Sheet, update: &FieldUpdate) -> Result<bool, ValidationError> {
    match update.kind {
        UpdateKind::Text => apply_text(sheet, &update.key, &update.data),
        UpdateKind::Binary => apply_binary(sheet, &update.key, &update.data),
    }
}

fn apply_text(sheet: &mut Sheet, key: &str, data: &str) -> Result<bool, ValidationError> {
    let value = normalize_text(data);
    if let Some(scalar) = scalar_table().get(key) {
        return scalar.apply(sheet, key, &value);
    }
    if let Some(id) = key.strip_prefix("PrimaryAttributes.") {
        return set_attribute_maximum(sheet, key, id, &value);
    }
    if let Some(id) = key.strip_prefix("SecondaryAttributes.") {
        return set_attribute_maximum(sheet, key, id, &value);
    }
    if let Some(rest) = key.strip_prefix("PointPools.") {
        let (id, current) = match rest.strip_suffix(".Current") {
            Some(id) => (id, true),
            None => (rest, false),
        };
        return set_pool(sheet, key, id, current, &value);
    }
    if let Some(index) = key.strip_prefix("HitLocations.") {
        return set_location_notes(sheet, key, index, &value);
    }
    Err(ValidationError::UnknownField(key.to_string()))
}

fn apply_binary(sheet: &mut Sheet, key: &str, data: &str) -> Result<bool, ValidationError> {
    if key != "Portrait" {
        return Err(ValidationError::UnknownField(key.to_string()));
    }
    if data.trim().is_empty() {
        return Err(ValidationError::EmptyBinary);
    }
    let bytes = BASE64
        .decode(data.trim().as_bytes())
        .map_err(|_| ValidationError::BadBase64)?;
    let normalized =
        portrait::normalize(&bytes).map_err(|e| ValidationError::BadImage(e.to_string()))?;
    if sheet.profile.portrait.as_deref() == Some(normalized.as_slice()) {
        return Ok(false);
    }
    sheet.profile.portrait = Some(normalized);
    Ok(true)
}

/// Trim and collapse internal whitespace runs to single spaces.
fn normalize_text(data: &str) -> String {
    data.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// One editable scalar field and its typed setter. The table below is
/// the closed set of exact-match keys; everything else goes through the
/// parametric families.
enum Scalar {
    Text {
        get: fn(&Sheet) -> &str,
        set: fn(&mut Sheet, String),
    },
    Length {
        get: fn(&Sheet) -> Length,
        set: fn(&mut Sheet, Length),
    },
    Weight {
        get: fn(&Sheet) -> Weight,
        set: fn(&mut Sheet, Weight),
    },
    BoundedInt {
        min: i32,
        max: i32,
        get: fn(&Sheet) -> i32,
        set: fn(&mut Sheet, i32),
    },
    Fixed {
        get: fn(&Sheet) -> Fixed,
        set: fn(&mut Sheet, Fixed),
    },
}

impl Scalar {
    fn apply(&self, sheet: &mut Sheet, key: &str, value: &str) -> Result<bool, ValidationError> {
        match self {
            Scalar::Text { get, set } => {
                if get(sheet) == value {
                    return Ok(false);
                }
                set(sheet, value.to_string());
                Ok(true)
            }
            Scalar::Length { get, set } => {
                let parsed = Length::parse(value, sheet.settings.length_unit)
                    .map_err(|_| ValidationError::bad_value(key, value))?;
                if get(sheet) == parsed {
                    return Ok(false);
                }
                set(sheet, parsed);
                Ok(true)
            }
            Scalar::Weight { get, set } => {
                let parsed = Weight::parse(value, sheet.settings.weight_unit)
                    .map_err(|_| ValidationError::bad_value(key, value))?;
                if get(sheet) == parsed {
                    return Ok(false);
                }
                set(sheet, parsed);
                Ok(true)
            }
            Scalar::BoundedInt { min, max, get, set } => {
                let parsed: i32 = value
                    .parse()
                    .map_err(|_| ValidationError::bad_value(key, value))?;
                if parsed < *min || parsed > *max {
                    return Err(ValidationError::OutOfRange {
                        field: key.to_string(),
                        value: value.to_string(),
                    });
                }
                if get(sheet) == parsed {
                    return Ok(false);
                }
                set(sheet, parsed);
                Ok(true)
            }
            Scalar::Fixed { get, set } => {
                let parsed = parse_fixed(key, value)?;
                if get(sheet) == parsed {
                    return Ok(false);
                }
                set(sheet, parsed);
                Ok(true)
            }
        }
    }
}

/// Parse a fixed-point payload; range errors surface separately from
/// malformed input so the client can tell them apart.
fn parse_fixed(key: &str, value: &str) -> Result<Fixed, ValidationError> {
    use common::fxp::ParseFixedError;
    value.parse::<Fixed>().map_err(|e| match e {
        ParseFixedError::OutOfRange(v) => ValidationError::OutOfRange {
            field: key.to_string(),
            value: v,
        },
        _ => ValidationError::bad_value(key, value),
    })
}

fn scalar_table() -> &'static HashMap<&'static str, Scalar> {
    static TABLE: OnceLock<HashMap<&'static str, Scalar>> = OnceLock::new();
    TABLE.get_or_init(|| {
        let mut table: HashMap<&'static str, Scalar> = HashMap::new();
        let mut text = |key: &'static str, get: fn(&Sheet) -> &str, set: fn(&mut Sheet, String)| {
            table.insert(key, Scalar::Text { get, set });
        };
        text("Identity.Name", |s| &s.profile.name, |s, v| s.profile.name = v);
        text("Identity.Title", |s| &s.profile.title, |s, v| s.profile.title = v);
        text(
            "Identity.Organization",
            |s| &s.profile.organization,
            |s, v| s.profile.organization = v,
        );
        text("Misc.Player", |s| &s.profile.player, |s, v| s.profile.player = v);
        text("Description.Gender", |s| &s.profile.gender, |s, v| s.profile.gender = v);
        text("Description.Age", |s| &s.profile.age, |s, v| s.profile.age = v);
        text(
            "Description.Birthday",
            |s| &s.profile.birthday,
            |s, v| s.profile.birthday = v,
        );
        text(
            "Description.Religion",
            |s| &s.profile.religion,
            |s, v| s.profile.religion = v,
        );
        text(
            "Description.TechLevel",
            |s| &s.profile.tech_level,
            |s, v| s.profile.tech_level = v,
        );
        text("Description.Hair", |s| &s.profile.hair, |s, v| s.profile.hair = v);
        text("Description.Eyes", |s| &s.profile.eyes, |s, v| s.profile.eyes = v);
        text("Description.Skin", |s| &s.profile.skin, |s, v| s.profile.skin = v);
        text(
            "Description.Hand",
            |s| &s.profile.handedness,
            |s, v| s.profile.handedness = v,
        );
        table.insert(
            "Description.Height",
            Scalar::Length {
                get: |s| s.profile.height,
                set: |s, v| s.profile.height = v,
            },
        );
        table.insert(
            "Description.Weight",
            Scalar::Weight {
                get: |s| s.profile.weight,
                set: |s, v| s.profile.weight = v,
            },
        );
        table.insert(
            "Description.SizeModifier",
            Scalar::BoundedInt {
                min: MIN_SIZE_MODIFIER,
                max: MAX_SIZE_MODIFIER,
                get: |s| s.profile.size_modifier,
                set: |s, v| s.profile.size_modifier = v,
            },
        );
        table.insert(
            "Points.Total",
            Scalar::Fixed {
                get: |s| s.total_points,
                set: |s, v| s.total_points = v,
            },
        );
        table
    })
}

fn set_attribute_maximum(
    sheet: &mut Sheet,
    key: &str,
    id: &str,
    value: &str,
) -> Result<bool, ValidationError> {
    let parsed = parse_fixed(key, value)?;
    let attr = sheet
        .attribute_mut(id)
        .ok_or_else(|| ValidationError::UnknownField(key.to_string()))?;
    if attr.value == parsed {
        return Ok(false);
    }
    attr.value = parsed;
    Ok(true)
}

fn set_pool(
    sheet: &mut Sheet,
    key: &str,
    id: &str,
    current: bool,
    value: &str,
) -> Result<bool, ValidationError> {
    let parsed = parse_fixed(key, value)?;
    let attr = sheet
        .attribute_mut(id)
        .ok_or_else(|| ValidationError::UnknownField(key.to_string()))?;
    if current {
        // The live value may not exceed the pool's present maximum.
        if parsed > attr.maximum() {
            return Err(ValidationError::OutOfRange {
                field: key.to_string(),
                value: value.to_string(),
            });
        }
        if attr.current() == parsed {
            return Ok(false);
        }
        attr.current = Some(parsed);
    } else {
        if attr.value == parsed {
            return Ok(false);
        }
        attr.value = parsed;
    }
    Ok(true)
}

fn set_location_notes(
    sheet: &mut Sheet,
    key: &str,
    index: &str,
    value: &str,
) -> Result<bool, ValidationError> {
    let index: usize = index
        .parse()
        .map_err(|_| ValidationError::UnknownField(key.to_string()))?;
    let location = sheet
        .body
        .location_mut(index)
        .ok_or_else(|| ValidationError::UnknownField(key.to_string()))?;
    if location.notes == value {
        return Ok(false);
    }
    location.notes = value.to_string();
    Ok(true)
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("unknown field {0:?}")]
    UnknownField(String),
    #[error("invalid value {value:?} for {field}")]
    BadValue { field: String, value: String },
    #[error("value {value:?} out of range for {field}")]
    OutOfRange { field: String, value: String },
    #[error("binary payload is not valid base64")]
    BadBase64,
    #[error("binary payload is empty")]
    EmptyBinary,
    #[error("unusable image: {0}")]
    BadImage(String),
}

impl ValidationError {
    fn bad_value(field: &str, value: &str) -> Self {
        ValidationError::BadValue {
            field: field.to_string(),
            value: value.to_string(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use common::sheet::{AttrKind, Attribute, Body, HitLocation};

    fn text_update(key: &str, data: &str) -> FieldUpdate {
        FieldUpdate {
            kind: UpdateKind::Text,
            key: key.to_string(),
            data: data.to_string(),
        }
    }

    fn sample_sheet() -> Sheet {
        let mut sheet = Sheet::new();
        sheet.attributes.push(Attribute::new(
            "st",
            AttrKind::Primary,
            "Strength",
            Fixed::from(10),
        ));
        sheet.attributes.push(Attribute::new(
            "hp",
            AttrKind::Pool,
            "Hit Points",
            Fixed::from(12),
        ));
        sheet.body = Body {
            name: "Humanoid".to_string(),
            locations: vec![
                HitLocation {
                    name: "head".to_string(),
                    ..Default::default()
                },
                HitLocation {
                    name: "torso".to_string(),
                    ..Default::default()
                },
            ],
        };
        sheet
    }

    #[test]
    fn test_text_field_normalizes_whitespace() {
        let mut sheet = sample_sheet();
        let changed = apply(&mut sheet, &text_update("Identity.Name", "  Conan   the\tBarbarian ")).unwrap();
        assert!(changed);
        assert_eq!(sheet.profile.name, "Conan the Barbarian");
    }

    #[test]
    fn test_noop_reports_unchanged() {
        let mut sheet = sample_sheet();
        sheet.profile.name = "Conan".to_string();
        let before = sheet.checksum();
        let changed = apply(&mut sheet, &text_update("Identity.Name", " Conan ")).unwrap();
        assert!(!changed);
        assert_eq!(sheet.checksum(), before);
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        let mut sheet = sample_sheet();
        assert_eq!(
            apply(&mut sheet, &text_update("Identity.Nickname", "x")),
            Err(ValidationError::UnknownField("Identity.Nickname".to_string()))
        );
    }

    #[test]
    fn test_size_modifier_range() {
        let mut sheet = sample_sheet();
        let before = sheet.checksum();
        let err = apply(&mut sheet, &text_update("Description.SizeModifier", "150")).unwrap_err();
        assert!(matches!(err, ValidationError::OutOfRange { .. }));
        assert_eq!(sheet.checksum(), before);

        assert!(apply(&mut sheet, &text_update("Description.SizeModifier", "-2")).unwrap());
        assert_eq!(sheet.profile.size_modifier, -2);
    }

    #[test]
    fn test_height_parses_against_sheet_unit() {
        let mut sheet = sample_sheet();
        assert!(apply(&mut sheet, &text_update("Description.Height", "6'2\"")).unwrap());
        assert_eq!(sheet.profile.height.inches(), Fixed::from(74));

        let err = apply(&mut sheet, &text_update("Description.Height", "tall")).unwrap_err();
        assert!(matches!(err, ValidationError::BadValue { .. }));
    }

    #[test]
    fn test_attribute_family_dispatch() {
        let mut sheet = sample_sheet();
        assert!(apply(&mut sheet, &text_update("PrimaryAttributes.st", "14")).unwrap());
        assert_eq!(sheet.attribute("st").unwrap().value, Fixed::from(14));

        let err = apply(&mut sheet, &text_update("PrimaryAttributes.zz", "14")).unwrap_err();
        assert!(matches!(err, ValidationError::UnknownField(_)));
    }

    #[test]
    fn test_pool_current_bounded_by_maximum() {
        let mut sheet = sample_sheet();
        assert!(apply(&mut sheet, &text_update("PointPools.hp.Current", "5")).unwrap());
        assert_eq!(sheet.attribute("hp").unwrap().current(), Fixed::from(5));

        let err = apply(&mut sheet, &text_update("PointPools.hp.Current", "13")).unwrap_err();
        assert!(matches!(err, ValidationError::OutOfRange { .. }));

        // Raising the maximum makes the same value acceptable.
        assert!(apply(&mut sheet, &text_update("PointPools.hp", "20")).unwrap());
        assert!(apply(&mut sheet, &text_update("PointPools.hp.Current", "13")).unwrap());
    }

    #[test]
    fn test_location_notes_by_preorder_index() {
        let mut sheet = sample_sheet();
        assert!(apply(&mut sheet, &text_update("HitLocations.2", "scarred")).unwrap());
        assert_eq!(sheet.body.locations[1].notes, "scarred");

        let err = apply(&mut sheet, &text_update("HitLocations.9", "x")).unwrap_err();
        assert!(matches!(err, ValidationError::UnknownField(_)));
    }

    #[test]
    fn test_binary_update_requires_base64() {
        let mut sheet = sample_sheet();
        let update = FieldUpdate {
            kind: UpdateKind::Binary,
            key: "Portrait".to_string(),
            data: "!!not base64!!".to_string(),
        };
        assert_eq!(apply(&mut sheet, &update), Err(ValidationError::BadBase64));

        let empty = FieldUpdate {
            kind: UpdateKind::Binary,
            key: "Portrait".to_string(),
            data: "   ".to_string(),
        };
        assert_eq!(apply(&mut sheet, &empty), Err(ValidationError::EmptyBinary));
    }
}
