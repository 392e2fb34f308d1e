//! Derived geometry: deck positions computed from labware placement.
//!
//! A `GeometryView` owns no state. It is rebuilt per query on top of the
//! labware view of one pinned snapshot, so every answer is consistent with
//! that snapshot and deterministic.

use deck_core::Point;

use crate::command::{WellLocation, WellOrigin};
use crate::error::{StateError, StateResult};
use crate::labware::LabwareView;

/// Geometry queries over one snapshot.
#[derive(Debug, Clone, Copy)]
pub struct GeometryView<'a> {
    labware: LabwareView<'a>,
}

impl<'a> GeometryView<'a> {
    pub(crate) fn new(labware: LabwareView<'a>) -> Self {
        Self { labware }
    }

    /// Deck position of a labware's origin: the slot position plus the
    /// definition's origin offset plus the calibrated offset.
    pub fn labware_origin(&self, labware_id: &str) -> StateResult<Point> {
        let labware = self.labware.get(labware_id)?;
        let slot = self.labware.slot_position(&labware.slot)?;
        Ok(slot + labware.definition.origin_offset + labware.offset)
    }

    /// Height of a labware's highest point above deck level.
    pub fn labware_highest_z(&self, labware_id: &str) -> StateResult<f64> {
        let labware = self.labware.get(labware_id)?;
        let origin = self.labware_origin(labware_id)?;
        Ok(origin.z + labware.definition.dimensions.z)
    }

    /// Height of the tallest thing on the deck; deck level for an empty deck.
    pub fn all_labware_highest_z(&self) -> f64 {
        self.labware
            .all()
            .iter()
            .filter_map(|labware| self.labware_highest_z(&labware.id).ok())
            .fold(0.0, f64::max)
    }

    /// Deck position of a location within a well.
    pub fn well_position(
        &self,
        labware_id: &str,
        well_name: &str,
        location: &WellLocation,
    ) -> StateResult<Point> {
        let labware = self.labware.get(labware_id)?;
        let well = labware
            .definition
            .well(well_name)
            .ok_or_else(|| StateError::WellNotFound {
                labware_id: labware_id.to_string(),
                well: well_name.to_string(),
            })?;
        let origin = self.labware_origin(labware_id)?;
        let z_in_labware = match location.origin {
            WellOrigin::Top => well.top_z(),
            WellOrigin::Bottom => well.z,
        };
        let at_origin = Point::new(origin.x + well.x, origin.y + well.y, origin.z + z_in_labware);
        Ok(at_origin + location.offset)
    }
}
