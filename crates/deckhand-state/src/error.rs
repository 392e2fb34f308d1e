//! Error types for state queries and command folds.

use thiserror::Error;

/// Errors surfaced by state folds, views, and wait conditions.
#[derive(Debug, Error)]
pub enum StateError {
    /// No command with the given id in the command history.
    #[error("command not found: {0}")]
    CommandNotFound(String),

    /// No labware with the given id on the deck.
    #[error("labware not found: {0}")]
    LabwareNotFound(String),

    /// The deck layout has no slot with the given id.
    #[error("slot not found: {0}")]
    SlotNotFound(String),

    /// The labware has no well with the given name.
    #[error("well {well} not found in labware {labware_id}")]
    WellNotFound {
        labware_id: String,
        well: String,
    },

    /// No pipette with the given id attached to the gantry.
    #[error("pipette not found: {0}")]
    PipetteNotFound(String),

    /// A tip operation was asked of labware that is not a tip rack.
    #[error("labware {0} is not a tip rack")]
    NotATipRack(String),

    /// The wait's completion channel closed before a verdict arrived.
    /// A drain either resolves a waiter or re-registers it, so this can
    /// only happen when a drain unwinds out of a panicking predicate.
    #[error("wait condition abandoned without a verdict")]
    WaitAbandoned,
}

/// Convenience alias for state operations.
pub type StateResult<T> = Result<T, StateError>;
