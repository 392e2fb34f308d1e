//! The command history slice: every command ever handled, in submission
//! order.
//!
//! This sub-store records everything and rejects nothing. Re-submissions of
//! a known id update the command's lifecycle fields in place; identity,
//! parameters, and creation time stay as first recorded.

use std::collections::HashMap;

use crate::command::{Command, CommandId, CommandStatus};
use crate::error::{StateError, StateResult};
use crate::substore::SubStore;

/// Commands slice of the engine state.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CommandState {
    /// Command ids in first-submission order.
    order: Vec<CommandId>,
    commands_by_id: HashMap<CommandId, Command>,
}

impl CommandState {
    pub(crate) fn get(&self, id: &str) -> Option<&Command> {
        self.commands_by_id.get(id)
    }

    pub(crate) fn ordered(&self) -> Vec<&Command> {
        self.order
            .iter()
            .filter_map(|id| self.commands_by_id.get(id))
            .collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.order.len()
    }
}

/// Sub-store owning the commands slice.
#[derive(Debug, Clone, Default)]
pub(crate) struct CommandStore {
    state: CommandState,
}

impl CommandStore {
    pub(crate) fn state(&self) -> &CommandState {
        &self.state
    }
}

impl SubStore for CommandStore {
    fn fold(&mut self, command: &Command) -> StateResult<()> {
        match self.state.commands_by_id.get(&command.id) {
            None => {
                self.state.order.push(command.id.clone());
                self.state
                    .commands_by_id
                    .insert(command.id.clone(), command.clone());
            }
            Some(existing) => {
                // Identity, params, and creation time are fixed at first
                // submission; only the lifecycle fields move.
                let updated = Command {
                    id: existing.id.clone(),
                    params: existing.params.clone(),
                    created_at: existing.created_at,
                    status: command.status,
                    result: command.result.clone(),
                    error: command.error.clone(),
                    completed_at: command.completed_at,
                };
                self.state.commands_by_id.insert(command.id.clone(), updated);
            }
        }
        Ok(())
    }
}

/// Read-only queries over the commands slice.
#[derive(Debug, Clone, Copy)]
pub struct CommandView<'a> {
    state: &'a CommandState,
}

impl<'a> CommandView<'a> {
    pub(crate) fn new(state: &'a CommandState) -> Self {
        Self { state }
    }

    /// Get a command by id.
    pub fn get(&self, id: &str) -> StateResult<&'a Command> {
        self.state
            .get(id)
            .ok_or_else(|| StateError::CommandNotFound(id.to_string()))
    }

    /// A command's current lifecycle status.
    pub fn get_status(&self, id: &str) -> StateResult<CommandStatus> {
        Ok(self.get(id)?.status)
    }

    /// Whether a command has reached a terminal status.
    pub fn is_terminal(&self, id: &str) -> StateResult<bool> {
        Ok(self.get(id)?.status.is_terminal())
    }

    /// All commands in first-submission order.
    pub fn all(&self) -> Vec<&'a Command> {
        self.state.ordered()
    }

    /// Command ids in first-submission order.
    pub fn ids(&self) -> &'a [CommandId] {
        &self.state.order
    }

    /// Number of distinct commands handled so far.
    pub fn len(&self) -> usize {
        self.state.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.len() == 0
    }
}
