use serde::{Deserialize, Serialize};

use crate::units::{Length, Weight};

/// Smallest accepted size modifier.
pub const MIN_SIZE_MODIFIER: i32 = -99;
/// Largest accepted size modifier.
pub const MAX_SIZE_MODIFIER: i32 = 99;

/// The character's descriptive block: identity, player, physical
/// description, and the portrait image.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub title: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub organization: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub player: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub gender: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub age: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub birthday: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub religion: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub tech_level: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub hair: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub eyes: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub skin: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub handedness: String,
    #[serde(default)]
    pub height: Length,
    #[serde(default)]
    pub weight: Weight,
    #[serde(default)]
    pub size_modifier: i32,
    /// Normalized portrait image bytes, base64 in the document file.
    #[serde(default, skip_serializing_if = "Option::is_none", with = "portrait_bytes")]
    pub portrait: Option<Vec<u8>>,
}

mod portrait_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::de::Error as DeError;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        bytes: &Option<Vec<u8>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match bytes {
            Some(bytes) => serializer.serialize_str(&STANDARD.encode(bytes)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Vec<u8>>, D::Error> {
        let encoded: Option<String> = Option::deserialize(deserializer)?;
        match encoded {
            Some(encoded) => STANDARD
                .decode(encoded.as_bytes())
                .map(Some)
                .map_err(DeError::custom),
            None => Ok(None),
        }
    }
}
