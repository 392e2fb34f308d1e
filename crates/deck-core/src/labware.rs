//! Labware definitions: well layouts, overall dimensions, and tip data.
//!
//! A `LabwareDefinition` describes the geometry of one labware model
//! (a plate, reservoir, tip rack, trash bin). Definitions travel inside
//! `load_labware` command results and in `deck.toml` fixed-labware entries;
//! the state store treats them as opaque, immutable data.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::geometry::Point;

/// Name of a well within a labware (e.g. "A1").
pub type WellName = String;

/// Overall bounding dimensions of a labware, in millimeters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
    pub x: f64,
    pub y: f64,
    /// Overall height above the labware origin.
    pub z: f64,
}

/// One well of a labware.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WellDefinition {
    /// Well center x, relative to the labware origin.
    pub x: f64,
    /// Well center y, relative to the labware origin.
    pub y: f64,
    /// Height of the well bottom above the labware origin.
    pub z: f64,
    /// Distance from well bottom to well top.
    pub depth: f64,
    /// Circular well diameter; `None` for rectangular wells.
    #[serde(default)]
    pub diameter: Option<f64>,
    /// Maximum working volume in microliters.
    pub max_volume: f64,
}

impl WellDefinition {
    /// Height of the well top above the labware origin.
    pub fn top_z(&self) -> f64 {
        self.z + self.depth
    }
}

/// A labware geometry definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabwareDefinition {
    /// Model name, e.g. "tiprack-300ul" or "96-flat".
    pub name: String,
    pub dimensions: Dimensions,
    /// Offset from the slot origin to the labware origin.
    #[serde(default)]
    pub origin_offset: Point,
    /// Wells keyed by name; `BTreeMap` keeps iteration deterministic.
    pub wells: BTreeMap<WellName, WellDefinition>,
    /// Length of tips this labware holds; `Some` only for tip racks.
    #[serde(default)]
    pub tip_length: Option<f64>,
}

impl LabwareDefinition {
    pub fn well(&self, name: &str) -> Option<&WellDefinition> {
        self.wells.get(name)
    }

    pub fn is_tip_rack(&self) -> bool {
        self.tip_length.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_well() -> WellDefinition {
        WellDefinition {
            x: 10.0,
            y: 20.0,
            z: 2.0,
            depth: 40.0,
            diameter: Some(5.5),
            max_volume: 300.0,
        }
    }

    fn test_definition(tip_length: Option<f64>) -> LabwareDefinition {
        LabwareDefinition {
            name: "test-labware".to_string(),
            dimensions: Dimensions {
                x: 127.0,
                y: 85.0,
                z: 60.0,
            },
            origin_offset: Point::ZERO,
            wells: BTreeMap::from([("A1".to_string(), test_well())]),
            tip_length,
        }
    }

    #[test]
    fn well_lookup() {
        let def = test_definition(None);
        assert!(def.well("A1").is_some());
        assert!(def.well("Z9").is_none());
    }

    #[test]
    fn well_top_z() {
        assert_eq!(test_well().top_z(), 42.0);
    }

    #[test]
    fn tip_rack_detection() {
        assert!(!test_definition(None).is_tip_rack());
        assert!(test_definition(Some(51.0)).is_tip_rack());
    }

    #[test]
    fn definition_toml_roundtrip() {
        let def = test_definition(Some(51.0));
        let text = toml::to_string(&def).unwrap();
        let back: LabwareDefinition = toml::from_str(&text).unwrap();
        assert_eq!(back, def);
    }
}
