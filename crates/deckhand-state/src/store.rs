//! The state store: command fan-out, snapshot publication, and wait
//! conditions.
//!
//! One writer at a time folds commands through the sub-stores and publishes
//! a fresh immutable snapshot; any number of readers pin snapshots without
//! blocking the writer or each other. After every publish, pending wait
//! conditions are re-checked against the new snapshot.

use std::sync::Arc;

use arc_swap::ArcSwap;
use parking_lot::Mutex;
use tokio::sync::oneshot;
use tracing::{debug, info};

use deck_core::{DeckDefinition, FixedLabware};

use crate::command::Command;
use crate::commands::{CommandState, CommandStore, CommandView};
use crate::error::{StateError, StateResult};
use crate::geometry::GeometryView;
use crate::labware::{LabwareState, LabwareStore, LabwareView};
use crate::motion::MotionView;
use crate::pipettes::{PipetteState, PipetteStore, PipetteView};
use crate::substore::SubStore;

/// The aggregate engine state at one point in the command sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineState {
    pub commands: CommandState,
    pub labware: LabwareState,
    pub pipettes: PipetteState,
}

/// A read-only view pinned to one snapshot.
///
/// Every query answered through one `StateView` sees the same state, no
/// matter how many commands land in the meantime. Call
/// [`StateStore::state`] again to observe newer state.
#[derive(Debug, Clone)]
pub struct StateView {
    state: Arc<EngineState>,
}

impl StateView {
    /// Queries over the command history.
    pub fn commands(&self) -> CommandView<'_> {
        CommandView::new(&self.state.commands)
    }

    /// Queries over loaded labware.
    pub fn labware(&self) -> LabwareView<'_> {
        LabwareView::new(&self.state.labware)
    }

    /// Queries over loaded pipettes.
    pub fn pipettes(&self) -> PipetteView<'_> {
        PipetteView::new(&self.state.pipettes)
    }

    /// Derived geometry queries.
    pub fn geometry(&self) -> GeometryView<'_> {
        GeometryView::new(self.labware())
    }

    /// Derived motion-planning queries.
    pub fn motion(&self) -> MotionView<'_> {
        MotionView::new(self.pipettes(), self.geometry())
    }

    /// The raw snapshot.
    pub fn snapshot(&self) -> &EngineState {
        &self.state
    }
}

/// A state predicate someone is waiting on.
///
/// Must answer from the given view alone: no side effects, no calls back
/// into the store.
pub type WaitPredicate = Box<dyn Fn(&StateView) -> StateResult<bool> + Send>;

struct Waiter {
    predicate: WaitPredicate,
    done: oneshot::Sender<StateResult<()>>,
}

#[derive(Clone)]
struct SubStores {
    commands: CommandStore,
    pipettes: PipetteStore,
    labware: LabwareStore,
}

/// The protocol-execution state store.
///
/// Clones share one store. `handle_command` is synchronous and serialized
/// internally; reads and waits never block it for longer than a snapshot
/// swap.
#[derive(Clone)]
pub struct StateStore {
    stores: Arc<Mutex<SubStores>>,
    snapshot: Arc<ArcSwap<EngineState>>,
    waiters: Arc<Mutex<Vec<Waiter>>>,
}

impl StateStore {
    /// Create a store seeded with a deck layout and its fixed labware.
    pub fn new(deck: DeckDefinition, fixed_labware: Vec<FixedLabware>) -> Self {
        let deck_name = deck.name.clone();
        let fixed_count = fixed_labware.len();
        let stores = SubStores {
            commands: CommandStore::default(),
            pipettes: PipetteStore::default(),
            labware: LabwareStore::new(deck, fixed_labware),
        };
        let initial = EngineState {
            commands: stores.commands.state().clone(),
            labware: stores.labware.state().clone(),
            pipettes: stores.pipettes.state().clone(),
        };
        info!(deck = %deck_name, fixed_labware = fixed_count, "state store initialized");
        Self {
            stores: Arc::new(Mutex::new(stores)),
            snapshot: Arc::new(ArcSwap::from_pointee(initial)),
            waiters: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Fold one command into every sub-store and publish the new snapshot.
    ///
    /// Folding is all-or-nothing: on a fold error no slice changes, nothing
    /// is published, and wait conditions are not re-checked.
    pub fn handle_command(&self, command: Command) -> StateResult<()> {
        {
            let mut guard = self.stores.lock();
            let mut next = (*guard).clone();
            {
                let order: [&mut dyn SubStore; 3] =
                    [&mut next.commands, &mut next.pipettes, &mut next.labware];
                for store in order {
                    store.fold(&command)?;
                }
            }
            self.snapshot.store(Arc::new(EngineState {
                commands: next.commands.state().clone(),
                labware: next.labware.state().clone(),
                pipettes: next.pipettes.state().clone(),
            }));
            *guard = next;
        }
        debug!(command_id = %command.id, kind = command.kind(), status = ?command.status, "command folded");
        self.notify_waiters();
        Ok(())
    }

    /// Pin the latest snapshot for reading.
    pub fn state(&self) -> StateView {
        StateView {
            state: self.snapshot.load_full(),
        }
    }

    /// Wait until `predicate` answers true of some published snapshot.
    ///
    /// The predicate is checked immediately; if it already holds, this
    /// returns without suspending. Otherwise it is re-checked against every
    /// snapshot published from then on, in registration order, and resolves
    /// on the first snapshot for which it answers true. A predicate error
    /// resolves the wait with that error. Dropping the returned future
    /// cancels the wait. Should the re-check drain be torn down before this
    /// wait resolves (a sibling predicate panicked), the wait fails with
    /// [`StateError::WaitAbandoned`].
    pub async fn wait_for<F>(&self, predicate: F) -> StateResult<()>
    where
        F: Fn(&StateView) -> StateResult<bool> + Send + 'static,
    {
        let rx = {
            // Checking under the registration lock closes the race with a
            // concurrent publish: any snapshot stored after this check is
            // drained with this waiter registered.
            let mut waiters = self.waiters.lock();
            let view = self.state();
            match predicate(&view) {
                Ok(true) => return Ok(()),
                Err(error) => return Err(error),
                Ok(false) => {}
            }
            let (tx, rx) = oneshot::channel();
            waiters.push(Waiter {
                predicate: Box::new(predicate),
                done: tx,
            });
            debug!(pending = waiters.len(), "wait condition registered");
            rx
        };
        match rx.await {
            Ok(result) => result,
            Err(_) => Err(StateError::WaitAbandoned),
        }
    }

    /// Number of wait conditions currently registered.
    ///
    /// Cancelled waits are pruned on the next re-check, so they may be
    /// counted until another command lands.
    pub fn pending_waiters(&self) -> usize {
        self.waiters.lock().len()
    }

    /// Re-check every pending wait condition against the latest snapshot.
    fn notify_waiters(&self) {
        let view = self.state();
        let mut waiters = self.waiters.lock();
        if waiters.is_empty() {
            return;
        }
        let checked = waiters.len();
        let pending = std::mem::take(&mut *waiters);
        for waiter in pending {
            if waiter.done.is_closed() {
                // The waiting caller gave up.
                continue;
            }
            match (waiter.predicate)(&view) {
                Ok(false) => waiters.push(waiter),
                Ok(true) => {
                    let _ = waiter.done.send(Ok(()));
                }
                Err(error) => {
                    let _ = waiter.done.send(Err(error));
                }
            }
        }
        debug!(checked, pending = waiters.len(), "wait conditions re-checked");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{CommandParams, CommandResult, CommandStatus};
    use deck_core::{Dimensions, LabwareDefinition, Mount, Point, WellDefinition};
    use std::collections::BTreeMap;

    fn plate() -> LabwareDefinition {
        LabwareDefinition {
            name: "test_plate".into(),
            dimensions: Dimensions {
                x: 127.0,
                y: 85.0,
                z: 14.0,
            },
            origin_offset: Point::ZERO,
            wells: BTreeMap::from([(
                "A1".to_string(),
                WellDefinition {
                    x: 10.0,
                    y: 10.0,
                    z: 1.0,
                    depth: 9.0,
                    diameter: Some(6.0),
                    max_volume: 360.0,
                },
            )]),
            tip_length: None,
        }
    }

    fn store() -> StateStore {
        StateStore::new(DeckDefinition::standard(), Vec::new())
    }

    fn load_labware(command_id: &str, labware_id: &str, slot: &str) -> Command {
        Command::queued(
            command_id,
            CommandParams::LoadLabware {
                slot: slot.into(),
                load_name: "test_plate".into(),
            },
        )
        .succeeded(CommandResult::LoadLabware {
            labware_id: labware_id.into(),
            definition: plate(),
            offset: Point::ZERO,
        })
    }

    fn load_pipette(command_id: &str, pipette_id: &str) -> Command {
        Command::queued(
            command_id,
            CommandParams::LoadPipette {
                mount: Mount::Left,
                pipette_name: "p300_single".into(),
            },
        )
        .succeeded(CommandResult::LoadPipette {
            pipette_id: pipette_id.into(),
        })
    }

    #[test]
    fn one_command_updates_every_slice_at_once() {
        let store = store();
        store.handle_command(load_labware("command-1", "plate-1", "C1")).unwrap();

        let view = store.state();
        assert_eq!(view.commands().len(), 1);
        assert_eq!(
            view.commands().get_status("command-1").unwrap(),
            CommandStatus::Succeeded
        );
        assert_eq!(view.labware().get("plate-1").unwrap().slot, "C1");
    }

    #[test]
    fn a_pinned_view_never_moves() {
        let store = store();
        store.handle_command(load_labware("command-1", "plate-1", "C1")).unwrap();

        let pinned = store.state();
        store.handle_command(load_labware("command-2", "plate-2", "C2")).unwrap();
        store.handle_command(load_pipette("command-3", "pipette-1")).unwrap();

        assert_eq!(pinned.commands().len(), 1);
        assert!(pinned.labware().get("plate-2").is_err());
        assert!(pinned.pipettes().get("pipette-1").is_err());

        let fresh = store.state();
        assert_eq!(fresh.commands().len(), 3);
        assert!(fresh.labware().get("plate-2").is_ok());
    }

    #[test]
    fn a_failed_fold_publishes_nothing() {
        let store = store();
        store.handle_command(load_labware("command-1", "plate-1", "C1")).unwrap();
        let before = store.state();

        // Offsets for labware that does not exist are a caller bug and must
        // not half-apply.
        let bad = Command::queued(
            "command-2",
            CommandParams::SetLabwareOffset {
                labware_id: "ghost".into(),
                offset: Point::new(1.0, 1.0, 1.0),
            },
        )
        .succeeded(CommandResult::SetLabwareOffset);
        let result = store.handle_command(bad);
        assert!(matches!(result, Err(StateError::LabwareNotFound(_))));

        let after = store.state();
        assert_eq!(after.snapshot(), before.snapshot());
        // The rejected command is not part of the published history, and
        // does not resurface once folding resumes.
        assert!(after.commands().get("command-2").is_err());
        store.handle_command(load_labware("command-3", "plate-2", "C2")).unwrap();
        let resumed = store.state();
        assert_eq!(resumed.commands().len(), 2);
        assert!(resumed.commands().get("command-2").is_err());
    }

    #[test]
    fn clones_share_one_store() {
        let store = store();
        let clone = store.clone();
        clone.handle_command(load_labware("command-1", "plate-1", "C1")).unwrap();

        assert_eq!(store.state().commands().len(), 1);
        assert_eq!(store.state().labware().len(), 1);
    }

    #[test]
    fn derived_views_answer_from_the_same_snapshot() {
        let store = store();
        store.handle_command(load_labware("command-1", "plate-1", "C1")).unwrap();
        store.handle_command(load_pipette("command-2", "pipette-1")).unwrap();

        let view = store.state();
        let top = view
            .geometry()
            .well_position("plate-1", "A1", &crate::command::WellLocation::top())
            .unwrap();
        assert_eq!(top.z, 10.0);

        let plan = view
            .motion()
            .plan_move(
                "pipette-1",
                &crate::motion::WellTarget {
                    labware_id: "plate-1".into(),
                    well_name: "A1".into(),
                    location: crate::command::WellLocation::top(),
                },
                0.0,
            )
            .unwrap();
        assert_eq!(plan.strategy, crate::motion::MoveStrategy::GeneralArc);
        assert_eq!(plan.waypoints.last(), Some(&top));
    }
}
