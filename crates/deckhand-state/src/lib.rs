//! deckhand-state — the protocol-execution state store.
//!
//! The store turns a linear stream of executed commands into a consistent,
//! queryable model of the robot: what is on the deck, what each pipette
//! holds, and where everything is. Each command is folded by three
//! sub-stores in a fixed order (commands, then pipettes, then labware),
//! after which a fresh immutable snapshot is published and every pending
//! wait condition is re-checked against it.
//!
//! Reads go through [`StateStore::state`], which pins one snapshot; the
//! base views ([`CommandView`], [`LabwareView`], [`PipetteView`]) answer
//! from slices of that snapshot, and the derived views ([`GeometryView`],
//! [`MotionView`]) compute positions and paths from the base views without
//! holding state of their own. [`StateStore::wait_for`] suspends a task
//! until a predicate holds of some published snapshot.

pub mod command;
pub mod commands;
pub mod error;
pub mod geometry;
pub mod labware;
pub mod motion;
pub mod pipettes;
pub mod store;

mod substore;

pub use command::{
    Command, CommandId, CommandParams, CommandResult, CommandStatus, LabwareId, PipetteId,
    WellLocation, WellName, WellOrigin,
};
pub use commands::{CommandState, CommandView};
pub use error::{StateError, StateResult};
pub use geometry::GeometryView;
pub use labware::{LabwareState, LabwareView, LoadedLabware};
pub use motion::{ARC_CLEARANCE_MM, MotionPlan, MotionView, MoveStrategy, WellTarget};
pub use pipettes::{AttachedTip, CurrentWell, LoadedPipette, PipetteState, PipetteView};
pub use store::{EngineState, StateStore, StateView, WaitPredicate};
