//! # Model Catalog
//!
//! Static table mapping a category name to its model ids and optional size
//! constraints. The built-in table is embedded from `data/catalog.json`.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::AssetError;

const BUILTIN_CATALOG: &str = include_str!("../data/catalog.json");

/// Inclusive `[min, max]` size bounds in meters per named dimension.
///
/// `length` is the longer and `width` the shorter of the two horizontal axes;
/// `height` and the raw `x`/`y`/`z` ranges refer to fixed axes.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SizeConstraints {
    #[serde(rename = "length-range", default, skip_serializing_if = "Option::is_none")]
    pub length: Option<[f64; 2]>,
    #[serde(rename = "width-range", default, skip_serializing_if = "Option::is_none")]
    pub width: Option<[f64; 2]>,
    #[serde(rename = "height-range", default, skip_serializing_if = "Option::is_none")]
    pub height: Option<[f64; 2]>,
    #[serde(rename = "x-range", default, skip_serializing_if = "Option::is_none")]
    pub x: Option<[f64; 2]>,
    #[serde(rename = "y-range", default, skip_serializing_if = "Option::is_none")]
    pub y: Option<[f64; 2]>,
    #[serde(rename = "z-range", default, skip_serializing_if = "Option::is_none")]
    pub z: Option<[f64; 2]>,
}

impl SizeConstraints {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.length.is_none()
            && self.width.is_none()
            && self.height.is_none()
            && self.x.is_none()
            && self.y.is_none()
            && self.z.is_none()
    }

    /// Resolve every present constraint to a bounding-box axis.
    ///
    /// Axis 0 is the length and axis 1 the width, unless axis 0 is the
    /// shorter one, in which case the two swap. Axis 2 is always the height.
    #[must_use]
    pub fn axis_ranges(&self, extent: [f64; 3]) -> Vec<(usize, [f64; 2])> {
        let (length_axis, width_axis) = if extent[0] < extent[1] { (1, 0) } else { (0, 1) };
        [
            (length_axis, self.length),
            (width_axis, self.width),
            (2, self.height),
            (0, self.x),
            (1, self.y),
            (2, self.z),
        ]
        .into_iter()
        .filter_map(|(axis, range)| range.map(|r| (axis, r)))
        .collect()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CategoryEntry {
    pub models: Vec<String>,
    #[serde(flatten)]
    pub constraints: SizeConstraints,
}

/// Families of categories that share a grasping strategy.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CategoryGroup {
    Box,
    Tall,
    NonConvex,
    SideGrasp,
    FoldedContainer,
    OpenedSpace,
    Bandu,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub groups: BTreeMap<CategoryGroup, Vec<String>>,
    pub categories: BTreeMap<String, CategoryEntry>,
}

impl Catalog {
    /// The catalog shipped with the crate.
    ///
    /// # Errors
    ///
    /// Only fails if the embedded JSON is malformed.
    pub fn builtin() -> Result<Self, AssetError> {
        Self::from_json(BUILTIN_CATALOG)
    }

    /// # Errors
    ///
    /// Returns [`AssetError::Json`] for malformed input.
    pub fn from_json(json: &str) -> Result<Self, AssetError> {
        Ok(serde_json::from_str(json)?)
    }

    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, AssetError> {
        let json = std::fs::read_to_string(path).map_err(|e| AssetError::io(path, e))?;
        Self::from_json(&json)
    }

    #[must_use]
    pub fn category(&self, name: &str) -> Option<&CategoryEntry> {
        self.categories.get(name)
    }

    /// Size constraints of a category, if it has any.
    #[must_use]
    pub fn constraints(&self, name: &str) -> Option<&SizeConstraints> {
        self.category(name)
            .map(|c| &c.constraints)
            .filter(|c| !c.is_empty())
    }

    #[must_use]
    pub fn group_of(&self, name: &str) -> Option<CategoryGroup> {
        self.groups
            .iter()
            .find(|(_, members)| members.iter().any(|m| m == name))
            .map(|(group, _)| *group)
    }

    #[must_use]
    pub fn in_group(&self, name: &str, group: CategoryGroup) -> bool {
        self.groups
            .get(&group)
            .is_some_and(|members| members.iter().any(|m| m == name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalog_parses() {
        let catalog = Catalog::builtin().unwrap();
        let bowl = catalog.category("Bowl").unwrap();
        assert_eq!(bowl.models[0], "7000");
        assert_eq!(bowl.constraints.length, Some([0.15, 0.17]));
        assert!(catalog.in_group("Stapler", CategoryGroup::SideGrasp));
        assert_eq!(catalog.group_of("Suitcase"), Some(CategoryGroup::FoldedContainer));
        assert_eq!(catalog.group_of("Nothing"), None);
    }

    #[test]
    fn every_category_has_constraints() {
        let catalog = Catalog::builtin().unwrap();
        for name in catalog.categories.keys() {
            assert!(catalog.constraints(name).is_some(), "{name} has no size constraint");
        }
    }

    #[test]
    fn length_and_width_follow_the_longer_axis() {
        let c = SizeConstraints {
            length: Some([0.2, 0.3]),
            width: Some([0.0, 0.1]),
            ..SizeConstraints::default()
        };
        assert_eq!(c.axis_ranges([2.0, 1.0, 0.5]), vec![(0, [0.2, 0.3]), (1, [0.0, 0.1])]);
        assert_eq!(c.axis_ranges([1.0, 2.0, 0.5]), vec![(1, [0.2, 0.3]), (0, [0.0, 0.1])]);
    }

    #[test]
    fn raw_axis_ranges_are_fixed() {
        let c = SizeConstraints {
            y: Some([0.3, 0.4]),
            height: Some([0.8, 0.9]),
            ..SizeConstraints::default()
        };
        assert_eq!(c.axis_ranges([1.0, 2.0, 0.5]), vec![(2, [0.8, 0.9]), (1, [0.3, 0.4])]);
    }

    #[test]
    fn categories_without_constraints() {
        let catalog = Catalog::from_json(r#"{"categories": {"Thing": {"models": ["1"]}}}"#).unwrap();
        assert!(catalog.category("Thing").is_some());
        assert!(catalog.constraints("Thing").is_none());
        assert!(catalog.groups.is_empty());
    }
}
