//! The fold contract shared by every sub-store.

use crate::command::Command;
use crate::error::StateResult;

/// Sole owner of one slice of engine state.
///
/// The store hands every command to every sub-store in a fixed order. A
/// sub-store folds the kinds it recognizes into its slice and ignores the
/// rest. A fold may read only the command and its own prior slice, never a
/// sibling's; anything a fold needs from another slice must arrive in the
/// command itself.
pub(crate) trait SubStore {
    fn fold(&mut self, command: &Command) -> StateResult<()>;
}
