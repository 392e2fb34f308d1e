//! Derived motion planning: collision-safe approach paths computed from one
//! snapshot.
//!
//! Plans are pure data. Waypoints are nozzle positions in deck coordinates;
//! when a tip is attached, its length is already folded into every z so the
//! tip end lands on the requested well location.

use deck_core::Point;

use crate::command::WellLocation;
use crate::error::StateResult;
use crate::geometry::GeometryView;
use crate::pipettes::{CurrentWell, PipetteView};

/// Clearance added above the tallest obstacle when arcing, in mm.
pub const ARC_CLEARANCE_MM: f64 = 10.0;

/// Destination well for a planned move.
#[derive(Debug, Clone, PartialEq)]
pub struct WellTarget {
    pub labware_id: String,
    pub well_name: String,
    pub location: WellLocation,
}

/// How a planned move travels between origin and destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveStrategy {
    /// Origin and destination are the same well; move within it.
    Direct,
    /// Origin and destination share a labware; arc over that labware only.
    InLabwareArc,
    /// Different labware, or the origin is unknown; arc over everything on
    /// the deck.
    GeneralArc,
}

/// An ordered path to a well location, in nozzle-frame deck coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct MotionPlan {
    pub strategy: MoveStrategy,
    pub waypoints: Vec<Point>,
}

/// Motion queries over one snapshot.
#[derive(Debug, Clone, Copy)]
pub struct MotionView<'a> {
    pipettes: PipetteView<'a>,
    geometry: GeometryView<'a>,
}

impl<'a> MotionView<'a> {
    pub(crate) fn new(pipettes: PipetteView<'a>, geometry: GeometryView<'a>) -> Self {
        Self { pipettes, geometry }
    }

    /// Last-known nozzle position of a pipette.
    ///
    /// `None` when the gantry has not addressed a well with this pipette
    /// yet, or when the well it last addressed is no longer on the deck.
    pub fn pipette_position(&self, pipette_id: &str) -> StateResult<Option<Point>> {
        let pipette = self.pipettes.get(pipette_id)?;
        let tip_length = pipette.tip.map(|tip| tip.length).unwrap_or(0.0);
        Ok(self
            .known_origin()
            .filter(|(well, _)| well.pipette_id == pipette_id)
            .map(|(_, position)| position.with_z(position.z + tip_length)))
    }

    /// Plan a move of a pipette to a well location.
    ///
    /// `min_travel_z` is a hardware floor for general-arc travel height, in
    /// the tip-end frame. The returned waypoints never travel below either
    /// endpoint.
    pub fn plan_move(
        &self,
        pipette_id: &str,
        target: &WellTarget,
        min_travel_z: f64,
    ) -> StateResult<MotionPlan> {
        let pipette = self.pipettes.get(pipette_id)?;
        let tip_length = pipette.tip.map(|tip| tip.length).unwrap_or(0.0);
        let destination =
            self.geometry
                .well_position(&target.labware_id, &target.well_name, &target.location)?;

        let origin = self
            .known_origin()
            .filter(|(well, _)| well.pipette_id == pipette_id);

        let (strategy, mut waypoints) = match origin {
            Some((well, _))
                if well.labware_id == target.labware_id && well.well_name == target.well_name =>
            {
                (MoveStrategy::Direct, vec![destination])
            }
            Some((well, from)) if well.labware_id == target.labware_id => {
                let travel_z = (self.geometry.labware_highest_z(&target.labware_id)?
                    + ARC_CLEARANCE_MM)
                    .max(from.z)
                    .max(destination.z);
                (
                    MoveStrategy::InLabwareArc,
                    arc_waypoints(Some(from), destination, travel_z),
                )
            }
            Some((_, from)) => {
                let travel_z = self
                    .general_travel_z(min_travel_z)
                    .max(from.z)
                    .max(destination.z);
                (
                    MoveStrategy::GeneralArc,
                    arc_waypoints(Some(from), destination, travel_z),
                )
            }
            None => {
                let travel_z = self.general_travel_z(min_travel_z).max(destination.z);
                (
                    MoveStrategy::GeneralArc,
                    arc_waypoints(None, destination, travel_z),
                )
            }
        };

        // Shift into the nozzle frame: the attached tip hangs below the
        // nozzle, so the nozzle travels higher by the tip length.
        for waypoint in &mut waypoints {
            waypoint.z += tip_length;
        }

        Ok(MotionPlan {
            strategy,
            waypoints,
        })
    }

    /// Travel height for arcs across the whole deck, tip-end frame.
    fn general_travel_z(&self, min_travel_z: f64) -> f64 {
        (self.geometry.all_labware_highest_z() + ARC_CLEARANCE_MM).max(min_travel_z)
    }

    /// The well the gantry last addressed, with its top position, when that
    /// well is still on the deck.
    fn known_origin(&self) -> Option<(&'a CurrentWell, Point)> {
        let current = self.pipettes.current_well()?;
        let position = self
            .geometry
            .well_position(&current.labware_id, &current.well_name, &WellLocation::top())
            .ok()?;
        Some((current, position))
    }
}

/// Rise at the origin, traverse at travel height, then descend onto the
/// destination.
fn arc_waypoints(origin: Option<Point>, destination: Point, travel_z: f64) -> Vec<Point> {
    let mut waypoints = Vec::with_capacity(3);
    if let Some(from) = origin {
        waypoints.push(from.with_z(travel_z));
    }
    waypoints.push(destination.with_z(travel_z));
    waypoints.push(destination);
    waypoints
}
