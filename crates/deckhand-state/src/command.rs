//! The command record: the only input the state store folds.
//!
//! A command is an immutable record of one protocol action. The executor
//! submits the same command id more than once as the action progresses
//! (queued, running, then succeeded or failed); identity and parameters are
//! fixed at first submission, while status, result, and error move.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use deck_core::{LabwareDefinition, Mount, Point, SlotId};

pub use deck_core::WellName;

/// Unique identifier of a command.
pub type CommandId = String;
/// Unique identifier of a loaded labware.
pub type LabwareId = String;
/// Unique identifier of a loaded pipette.
pub type PipetteId = String;

/// Lifecycle status of a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandStatus {
    Queued,
    Running,
    Succeeded,
    Failed,
}

impl CommandStatus {
    /// Whether the command has finished, successfully or otherwise.
    pub fn is_terminal(&self) -> bool {
        matches!(self, CommandStatus::Succeeded | CommandStatus::Failed)
    }
}

/// Reference plane for a position within a well.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WellOrigin {
    /// The top rim of the well.
    Top,
    /// The inside bottom of the well.
    Bottom,
}

/// A position within a well: an origin plane plus an offset from it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WellLocation {
    pub origin: WellOrigin,
    #[serde(default)]
    pub offset: Point,
}

impl WellLocation {
    /// The well's top rim, no offset.
    pub fn top() -> Self {
        Self {
            origin: WellOrigin::Top,
            offset: Point::ZERO,
        }
    }

    /// The well's inside bottom, no offset.
    pub fn bottom() -> Self {
        Self {
            origin: WellOrigin::Bottom,
            offset: Point::ZERO,
        }
    }

    /// Same location shifted by an extra offset.
    pub fn offset_by(mut self, offset: Point) -> Self {
        self.offset = self.offset + offset;
        self
    }
}

impl Default for WellLocation {
    fn default() -> Self {
        Self::top()
    }
}

/// Kind-specific command parameters. The variant is the command's kind; the
/// serialized form carries it in a `type` tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CommandParams {
    /// Place a labware in a deck slot.
    LoadLabware { slot: SlotId, load_name: String },
    /// Replace the calibrated offset of an already-loaded labware.
    SetLabwareOffset { labware_id: LabwareId, offset: Point },
    /// Attach a pipette to a gantry mount.
    LoadPipette { mount: Mount, pipette_name: String },
    /// Press the pipette into a tip-rack well to pick up a tip.
    PickUpTip {
        pipette_id: PipetteId,
        labware_id: LabwareId,
        well_name: WellName,
    },
    /// Eject the attached tip into a well.
    DropTip {
        pipette_id: PipetteId,
        labware_id: LabwareId,
        well_name: WellName,
    },
    /// Draw liquid from a well.
    Aspirate {
        pipette_id: PipetteId,
        labware_id: LabwareId,
        well_name: WellName,
        volume: f64,
        #[serde(default)]
        well_location: WellLocation,
    },
    /// Expel liquid into a well.
    Dispense {
        pipette_id: PipetteId,
        labware_id: LabwareId,
        well_name: WellName,
        volume: f64,
        #[serde(default)]
        well_location: WellLocation,
    },
    /// Move the pipette to a well without handling liquid.
    MoveToWell {
        pipette_id: PipetteId,
        labware_id: LabwareId,
        well_name: WellName,
        #[serde(default)]
        well_location: WellLocation,
    },
    /// Engage a deck module. Recorded in the history; no slice reacts to it.
    EngageModule { module_id: String, height: f64 },
}

impl CommandParams {
    /// The command's kind tag, matching the serialized `type` field.
    pub fn kind(&self) -> &'static str {
        match self {
            CommandParams::LoadLabware { .. } => "load_labware",
            CommandParams::SetLabwareOffset { .. } => "set_labware_offset",
            CommandParams::LoadPipette { .. } => "load_pipette",
            CommandParams::PickUpTip { .. } => "pick_up_tip",
            CommandParams::DropTip { .. } => "drop_tip",
            CommandParams::Aspirate { .. } => "aspirate",
            CommandParams::Dispense { .. } => "dispense",
            CommandParams::MoveToWell { .. } => "move_to_well",
            CommandParams::EngageModule { .. } => "engage_module",
        }
    }
}

/// Kind-specific result payload of a succeeded command.
///
/// Results carry what was only known at execution time: assigned ids, the
/// resolved labware definition, the measured tip length, actual volumes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CommandResult {
    LoadLabware {
        labware_id: LabwareId,
        definition: LabwareDefinition,
        #[serde(default)]
        offset: Point,
    },
    SetLabwareOffset,
    LoadPipette { pipette_id: PipetteId },
    PickUpTip { tip_length: f64 },
    DropTip,
    Aspirate { volume: f64 },
    Dispense { volume: f64 },
    MoveToWell,
    EngageModule,
}

/// An immutable record of one protocol action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Command {
    pub id: CommandId,
    pub status: CommandStatus,
    pub params: CommandParams,
    /// Present once the command has succeeded.
    #[serde(default)]
    pub result: Option<CommandResult>,
    /// Failure detail, present once the command has failed.
    #[serde(default)]
    pub error: Option<String>,
    /// Unix timestamp in milliseconds when the command was created.
    pub created_at: u64,
    /// Unix timestamp in milliseconds when the command reached a terminal
    /// status.
    #[serde(default)]
    pub completed_at: Option<u64>,
}

impl Command {
    /// A freshly queued command.
    pub fn queued(id: impl Into<CommandId>, params: CommandParams) -> Self {
        Self {
            id: id.into(),
            status: CommandStatus::Queued,
            params,
            result: None,
            error: None,
            created_at: epoch_millis(),
            completed_at: None,
        }
    }

    /// The same command marked running.
    pub fn running(mut self) -> Self {
        self.status = CommandStatus::Running;
        self
    }

    /// The same command marked succeeded with its result payload.
    pub fn succeeded(mut self, result: CommandResult) -> Self {
        self.status = CommandStatus::Succeeded;
        self.result = Some(result);
        self.completed_at = Some(epoch_millis());
        self
    }

    /// The same command marked failed.
    pub fn failed(mut self, error: impl Into<String>) -> Self {
        self.status = CommandStatus::Failed;
        self.error = Some(error.into());
        self.completed_at = Some(epoch_millis());
        self
    }

    /// The command's kind tag.
    pub fn kind(&self) -> &'static str {
        self.params.kind()
    }
}

/// Current Unix epoch in milliseconds.
pub(crate) fn epoch_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
