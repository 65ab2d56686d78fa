use serde::{Deserialize, Serialize};

/// The hit location table for a sheet. Locations may carry sub-tables
/// (e.g. an arm with a hand beneath it), forming a tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Body {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub locations: Vec<HitLocation>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HitLocation {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub roll_range: String,
    #[serde(default)]
    pub hit_penalty: i32,
    #[serde(default)]
    pub dr_bonus: i32,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub notes: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_table: Option<Body>,
}

impl Body {
    /// Visit a location by its depth-first pre-order position, parents
    /// before children, in document order. Positions start at 1.
    pub fn location(&self, index: usize) -> Option<&HitLocation> {
        let mut next = 1usize;
        find_location(&self.locations, index, &mut next)
    }

    pub fn location_mut(&mut self, index: usize) -> Option<&mut HitLocation> {
        let mut next = 1usize;
        find_location_mut(&mut self.locations, index, &mut next)
    }

    /// Total number of locations in the tree.
    pub fn location_count(&self) -> usize {
        count_locations(&self.locations)
    }
}

fn find_location<'a>(
    locations: &'a [HitLocation],
    index: usize,
    next: &mut usize,
) -> Option<&'a HitLocation> {
    for loc in locations {
        if *next == index {
            return Some(loc);
        }
        *next += 1;
        if let Some(sub) = &loc.sub_table {
            if let Some(found) = find_location(&sub.locations, index, next) {
                return Some(found);
            }
        }
    }
    None
}

fn find_location_mut<'a>(
    locations: &'a mut [HitLocation],
    index: usize,
    next: &mut usize,
) -> Option<&'a mut HitLocation> {
    for loc in locations {
        if *next == index {
            return Some(loc);
        }
        *next += 1;
        if let Some(sub) = &mut loc.sub_table {
            if let Some(found) = find_location_mut(&mut sub.locations, index, next) {
                return Some(found);
            }
        }
    }
    None
}

fn count_locations(locations: &[HitLocation]) -> usize {
    locations
        .iter()
        .map(|loc| {
            1 + loc
                .sub_table
                .as_ref()
                .map(|sub| count_locations(&sub.locations))
                .unwrap_or(0)
        })
        .sum()
}

#[cfg(test)]
mod test {
    use super::*;

    fn loc(name: &str, sub: Option<Body>) -> HitLocation {
        HitLocation {
            name: name.to_string(),
            sub_table: sub,
            ..Default::default()
        }
    }

    fn sample_body() -> Body {
        // Pre-order positions:
        //   1 head, 2 torso, 3 arm, 4 hand, 5 leg
        Body {
            name: "Humanoid".to_string(),
            locations: vec![
                loc("head", None),
                loc("torso", None),
                loc(
                    "arm",
                    Some(Body {
                        name: String::new(),
                        locations: vec![loc("hand", None)],
                    }),
                ),
                loc("leg", None),
            ],
        }
    }

    #[test]
    fn test_preorder_indexing() {
        let body = sample_body();
        assert_eq!(body.location(1).unwrap().name, "head");
        assert_eq!(body.location(2).unwrap().name, "torso");
        assert_eq!(body.location(3).unwrap().name, "arm");
        assert_eq!(body.location(4).unwrap().name, "hand");
        assert_eq!(body.location(5).unwrap().name, "leg");
    }

    #[test]
    fn test_indexing_out_of_bounds() {
        let body = sample_body();
        assert!(body.location(0).is_none());
        assert!(body.location(6).is_none());
        assert_eq!(body.location_count(), 5);
    }

    #[test]
    fn test_location_mut_targets_same_node() {
        let mut body = sample_body();
        body.location_mut(4).unwrap().notes = "crippled".to_string();
        assert_eq!(
            body.locations[2].sub_table.as_ref().unwrap().locations[0].notes,
            "crippled"
        );
    }
}
