//! The pipette slice: attachments, tips, held volumes, and the gantry's
//! last-addressed well.

use std::collections::HashMap;

use deck_core::Mount;

use crate::command::{
    Command, CommandParams, CommandResult, CommandStatus, LabwareId, PipetteId, WellName,
};
use crate::error::{StateError, StateResult};
use crate::substore::SubStore;

/// A tip currently attached to a pipette.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttachedTip {
    /// Tip length in mm, measured at pick-up.
    pub length: f64,
}

/// One pipette attached to the gantry.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedPipette {
    pub id: PipetteId,
    pub mount: Mount,
    pub name: String,
    pub tip: Option<AttachedTip>,
    /// Liquid currently held, in µL.
    pub aspirated_volume: f64,
}

/// The well the gantry most recently addressed, and with which pipette.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentWell {
    pub pipette_id: PipetteId,
    pub labware_id: LabwareId,
    pub well_name: WellName,
}

/// Pipette slice of the engine state.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PipetteState {
    pipettes_by_id: HashMap<PipetteId, LoadedPipette>,
    pipette_id_by_mount: HashMap<Mount, PipetteId>,
    current_well: Option<CurrentWell>,
}

impl PipetteState {
    pub(crate) fn get(&self, id: &str) -> Option<&LoadedPipette> {
        self.pipettes_by_id.get(id)
    }

    pub(crate) fn get_by_mount(&self, mount: Mount) -> Option<&LoadedPipette> {
        self.pipette_id_by_mount
            .get(&mount)
            .and_then(|id| self.pipettes_by_id.get(id))
    }

    pub(crate) fn current_well(&self) -> Option<&CurrentWell> {
        self.current_well.as_ref()
    }

    pub(crate) fn all_sorted(&self) -> Vec<&LoadedPipette> {
        let mut all: Vec<&LoadedPipette> = self.pipettes_by_id.values().collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        all
    }

    fn pipette_mut(&mut self, id: &str) -> StateResult<&mut LoadedPipette> {
        self.pipettes_by_id
            .get_mut(id)
            .ok_or_else(|| StateError::PipetteNotFound(id.to_string()))
    }

    fn set_current_well(&mut self, pipette_id: &str, labware_id: &str, well_name: &str) {
        self.current_well = Some(CurrentWell {
            pipette_id: pipette_id.to_string(),
            labware_id: labware_id.to_string(),
            well_name: well_name.to_string(),
        });
    }
}

/// Sub-store owning the pipette slice.
#[derive(Debug, Clone, Default)]
pub(crate) struct PipetteStore {
    state: PipetteState,
}

impl PipetteStore {
    pub(crate) fn state(&self) -> &PipetteState {
        &self.state
    }
}

impl SubStore for PipetteStore {
    fn fold(&mut self, command: &Command) -> StateResult<()> {
        if command.status != CommandStatus::Succeeded {
            return Ok(());
        }
        match (&command.params, &command.result) {
            (
                CommandParams::LoadPipette {
                    mount,
                    pipette_name,
                },
                Some(CommandResult::LoadPipette { pipette_id }),
            ) => {
                // A new pipette on a mount replaces whatever was there; a
                // re-loaded id vacates the mount it came from.
                if let Some(previous) = self.state.pipettes_by_id.get(pipette_id) {
                    if previous.mount != *mount {
                        self.state.pipette_id_by_mount.remove(&previous.mount);
                    }
                }
                if let Some(replaced) = self
                    .state
                    .pipette_id_by_mount
                    .insert(*mount, pipette_id.clone())
                {
                    if replaced != *pipette_id {
                        self.state.pipettes_by_id.remove(&replaced);
                    }
                }
                self.state.pipettes_by_id.insert(
                    pipette_id.clone(),
                    LoadedPipette {
                        id: pipette_id.clone(),
                        mount: *mount,
                        name: pipette_name.clone(),
                        tip: None,
                        aspirated_volume: 0.0,
                    },
                );
            }
            (
                CommandParams::PickUpTip {
                    pipette_id,
                    labware_id,
                    well_name,
                },
                Some(CommandResult::PickUpTip { tip_length }),
            ) => {
                let pipette = self.state.pipette_mut(pipette_id)?;
                pipette.tip = Some(AttachedTip {
                    length: *tip_length,
                });
                self.state.set_current_well(pipette_id, labware_id, well_name);
            }
            (
                CommandParams::DropTip {
                    pipette_id,
                    labware_id,
                    well_name,
                },
                Some(CommandResult::DropTip),
            ) => {
                let pipette = self.state.pipette_mut(pipette_id)?;
                pipette.tip = None;
                pipette.aspirated_volume = 0.0;
                self.state.set_current_well(pipette_id, labware_id, well_name);
            }
            (
                CommandParams::Aspirate {
                    pipette_id,
                    labware_id,
                    well_name,
                    ..
                },
                Some(CommandResult::Aspirate { volume }),
            ) => {
                let pipette = self.state.pipette_mut(pipette_id)?;
                pipette.aspirated_volume += volume;
                self.state.set_current_well(pipette_id, labware_id, well_name);
            }
            (
                CommandParams::Dispense {
                    pipette_id,
                    labware_id,
                    well_name,
                    ..
                },
                Some(CommandResult::Dispense { volume }),
            ) => {
                let pipette = self.state.pipette_mut(pipette_id)?;
                pipette.aspirated_volume = (pipette.aspirated_volume - volume).max(0.0);
                self.state.set_current_well(pipette_id, labware_id, well_name);
            }
            (
                CommandParams::MoveToWell {
                    pipette_id,
                    labware_id,
                    well_name,
                    ..
                },
                Some(CommandResult::MoveToWell),
            ) => {
                self.state.pipette_mut(pipette_id)?;
                self.state.set_current_well(pipette_id, labware_id, well_name);
            }
            _ => {}
        }
        Ok(())
    }
}

/// Read-only queries over the pipette slice.
#[derive(Debug, Clone, Copy)]
pub struct PipetteView<'a> {
    state: &'a PipetteState,
}

impl<'a> PipetteView<'a> {
    pub(crate) fn new(state: &'a PipetteState) -> Self {
        Self { state }
    }

    /// Get a loaded pipette by id.
    pub fn get(&self, id: &str) -> StateResult<&'a LoadedPipette> {
        self.state
            .get(id)
            .ok_or_else(|| StateError::PipetteNotFound(id.to_string()))
    }

    /// The pipette on a mount, if any.
    pub fn get_by_mount(&self, mount: Mount) -> Option<&'a LoadedPipette> {
        self.state.get_by_mount(mount)
    }

    /// The tip attached to a pipette, if any.
    pub fn get_attached_tip(&self, id: &str) -> StateResult<Option<AttachedTip>> {
        Ok(self.get(id)?.tip)
    }

    /// Liquid a pipette currently holds, in µL.
    pub fn get_aspirated_volume(&self, id: &str) -> StateResult<f64> {
        Ok(self.get(id)?.aspirated_volume)
    }

    /// The well the gantry most recently addressed.
    pub fn current_well(&self) -> Option<&'a CurrentWell> {
        self.state.current_well()
    }

    /// All loaded pipettes, ordered by id.
    pub fn all(&self) -> Vec<&'a LoadedPipette> {
        self.state.all_sorted()
    }
}
