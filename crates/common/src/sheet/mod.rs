mod attrs;
mod body;
mod profile;

use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::fxp::Fixed;
use crate::units::{LengthUnit, WeightUnit};

pub use attrs::{AttrKind, Attribute};
pub use body::{Body, HitLocation};
pub use profile::{Profile, MAX_SIZE_MODIFIER, MIN_SIZE_MODIFIER};

/// File extension for sheet documents.
pub const SHEET_EXT: &str = "sheet";

/// Current document format version.
pub const CURRENT_VERSION: u32 = 1;

/// Per-document display settings the server needs when parsing user input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetSettings {
    #[serde(default)]
    pub length_unit: LengthUnit,
    #[serde(default)]
    pub weight_unit: WeightUnit,
}

/// A character sheet document.
///
/// This is the unit the server caches, edits, and persists. The file
/// representation is versioned JSON; loads of newer versions are refused.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sheet {
    pub version: u32,
    pub id: Uuid,
    #[serde(default)]
    pub profile: Profile,
    #[serde(default)]
    pub settings: SheetSettings,
    #[serde(default)]
    pub total_points: Fixed,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<Attribute>,
    #[serde(default)]
    pub body: Body,
    #[serde(with = "time::serde::rfc3339")]
    pub created_on: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub modified_on: OffsetDateTime,
}

impl Sheet {
    pub fn new() -> Self {
        let now = OffsetDateTime::now_utc();
        Sheet {
            version: CURRENT_VERSION,
            id: Uuid::new_v4(),
            profile: Profile::default(),
            settings: SheetSettings::default(),
            total_points: Fixed::ZERO,
            attributes: Vec::new(),
            body: Body::default(),
            created_on: now,
            modified_on: now,
        }
    }

    /// Load a document from disk.
    pub fn load(path: &Path) -> Result<Self, SheetError> {
        let file = std::fs::File::open(path)?;
        let sheet: Sheet = serde_json::from_reader(std::io::BufReader::new(file))?;
        if sheet.version > CURRENT_VERSION {
            return Err(SheetError::UnsupportedVersion(sheet.version));
        }
        Ok(sheet)
    }

    /// Write the document to disk.
    ///
    /// The write goes through a temporary file in the target directory
    /// and is renamed into place, so a failed save never truncates the
    /// existing document.
    pub fn save(&self, path: &Path) -> Result<(), SheetError> {
        let dir = path.parent().ok_or_else(|| {
            SheetError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "save path has no parent directory",
            ))
        })?;
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        serde_json::to_writer_pretty(&mut tmp, self)?;
        tmp.write_all(b"\n")?;
        tmp.flush()?;
        tmp.persist(path).map_err(|e| SheetError::Io(e.error))?;
        Ok(())
    }

    /// Content digest over the serialized document state.
    pub fn checksum(&self) -> blake3::Hash {
        // Serialization of an in-memory sheet cannot fail; the document
        // contains no non-string map keys or non-finite numbers.
        let bytes = serde_json::to_vec(self).expect("sheet serialization");
        blake3::hash(&bytes)
    }

    /// Stamp the modification time. Callers do this once per applied edit.
    pub fn mark_modified(&mut self) {
        self.modified_on = OffsetDateTime::now_utc();
    }

    pub fn attribute(&self, id: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.id == id)
    }

    pub fn attribute_mut(&mut self, id: &str) -> Option<&mut Attribute> {
        self.attributes.iter_mut().find(|a| a.id == id)
    }
}

impl Default for Sheet {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SheetError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed document: {0}")]
    Format(#[from] serde_json::Error),
    #[error("document version {0} is newer than this server understands")]
    UnsupportedVersion(u32),
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_checksum_tracks_content() {
        let mut sheet = Sheet::new();
        let before = sheet.checksum();
        assert_eq!(before, sheet.checksum());

        sheet.profile.name = "Conan".to_string();
        let after = sheet.checksum();
        assert_ne!(before, after);

        sheet.profile.name = String::new();
        assert_eq!(before, sheet.checksum());
    }

    #[test]
    fn test_load_rejects_newer_version() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("future.sheet");
        let mut sheet = Sheet::new();
        sheet.version = CURRENT_VERSION + 1;
        sheet.save(&path).unwrap();
        assert!(matches!(
            Sheet::load(&path),
            Err(SheetError::UnsupportedVersion(_))
        ));
    }

    #[test]
    fn test_save_then_load_preserves_checksum() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("conan.sheet");
        let mut sheet = Sheet::new();
        sheet.profile.name = "Conan".to_string();
        sheet.profile.size_modifier = 1;
        sheet.attributes.push(Attribute::new(
            "st",
            AttrKind::Primary,
            "Strength",
            Fixed::from(14),
        ));
        sheet.save(&path).unwrap();

        let loaded = Sheet::load(&path).unwrap();
        assert_eq!(loaded, sheet);
        assert_eq!(loaded.checksum(), sheet.checksum());
    }
}
