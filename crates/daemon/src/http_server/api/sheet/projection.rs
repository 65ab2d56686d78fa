use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use common::fxp::Fixed;
use common::sheet::{AttrKind, Body, Sheet};

use crate::cache::CachedSheet;
use crate::store::AccessGrant;

/// The client-facing rendering of a cached document, plus the flags the
/// editor needs: whether the in-memory copy has diverged from disk and
/// whether the grant it was reached through forbids writes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetView {
    pub identity: IdentityView,
    pub misc: MiscView,
    pub description: DescriptionView,
    pub points: PointsView,
    pub primary_attributes: Vec<AttrView>,
    pub secondary_attributes: Vec<AttrView>,
    pub point_pools: Vec<PoolView>,
    pub body: BodyView,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub portrait: Option<String>,
    pub dirty: bool,
    pub read_only: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityView {
    pub name: String,
    pub title: String,
    pub organization: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MiscView {
    #[serde(with = "time::serde::rfc3339")]
    pub created: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub modified: OffsetDateTime,
    pub player: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DescriptionView {
    pub gender: String,
    pub age: String,
    pub birthday: String,
    pub religion: String,
    /// Formatted in the sheet's configured length unit.
    pub height: String,
    /// Formatted in the sheet's configured weight unit.
    pub weight: String,
    pub size_modifier: i32,
    pub tech_level: String,
    pub hair: String,
    pub eyes: String,
    pub skin: String,
    pub hand: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointsView {
    pub total: Fixed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttrView {
    pub key: String,
    pub name: String,
    pub value: Fixed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolView {
    pub key: String,
    pub name: String,
    pub value: Fixed,
    pub max: Fixed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BodyView {
    pub name: String,
    pub locations: Vec<LocationView>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationView {
    pub roll: String,
    pub location: String,
    pub hit_penalty: i32,
    pub dr_bonus: i32,
    pub notes: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sub_locations: Vec<LocationView>,
}

impl SheetView {
    pub fn project(entry: &CachedSheet, grant: &AccessGrant) -> Self {
        let sheet = &entry.sheet;
        SheetView {
            identity: IdentityView {
                name: sheet.profile.name.clone(),
                title: sheet.profile.title.clone(),
                organization: sheet.profile.organization.clone(),
            },
            misc: MiscView {
                created: sheet.created_on,
                modified: sheet.modified_on,
                player: sheet.profile.player.clone(),
            },
            description: DescriptionView {
                gender: sheet.profile.gender.clone(),
                age: sheet.profile.age.clone(),
                birthday: sheet.profile.birthday.clone(),
                religion: sheet.profile.religion.clone(),
                height: sheet.profile.height.format(sheet.settings.length_unit),
                weight: sheet.profile.weight.format(sheet.settings.weight_unit),
                size_modifier: sheet.profile.size_modifier,
                tech_level: sheet.profile.tech_level.clone(),
                hair: sheet.profile.hair.clone(),
                eyes: sheet.profile.eyes.clone(),
                skin: sheet.profile.skin.clone(),
                hand: sheet.profile.handedness.clone(),
            },
            points: PointsView {
                total: sheet.total_points,
            },
            primary_attributes: attr_views(sheet, AttrKind::Primary),
            secondary_attributes: attr_views(sheet, AttrKind::Secondary),
            point_pools: pool_views(sheet),
            body: body_view(&sheet.body),
            portrait: sheet
                .profile
                .portrait
                .as_ref()
                .map(|bytes| BASE64.encode(bytes)),
            dirty: entry.dirty(),
            read_only: grant.read_only,
        }
    }
}

fn attr_views(sheet: &Sheet, kind: AttrKind) -> Vec<AttrView> {
    sheet
        .attributes
        .iter()
        .filter(|a| a.kind == kind)
        .map(|a| AttrView {
            key: a.id.clone(),
            name: a.name.clone(),
            value: a.maximum(),
        })
        .collect()
}

fn pool_views(sheet: &Sheet) -> Vec<PoolView> {
    sheet
        .attributes
        .iter()
        .filter(|a| a.kind == AttrKind::Pool)
        .map(|a| PoolView {
            key: a.id.clone(),
            name: a.name.clone(),
            value: a.current(),
            max: a.maximum(),
        })
        .collect()
}

fn body_view(body: &Body) -> BodyView {
    BodyView {
        name: body.name.clone(),
        locations: body
            .locations
            .iter()
            .map(|loc| LocationView {
                roll: loc.roll_range.clone(),
                location: loc.name.clone(),
                hit_penalty: loc.hit_penalty,
                dr_bonus: loc.dr_bonus,
                notes: loc.notes.clone(),
                sub_locations: loc
                    .sub_table
                    .as_ref()
                    .map(|sub| body_view(sub).locations)
                    .unwrap_or_default(),
            })
            .collect(),
    }
}
