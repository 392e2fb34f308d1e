//! The labware slice: what is loaded where, with calibrated offsets.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::warn;

use deck_core::{DeckDefinition, FixedLabware, LabwareDefinition, Point, SlotId};

use crate::command::{Command, CommandParams, CommandResult, CommandStatus, LabwareId};
use crate::error::{StateError, StateResult};
use crate::substore::SubStore;

/// One labware currently on the deck.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedLabware {
    pub id: LabwareId,
    pub slot: SlotId,
    pub definition: Arc<LabwareDefinition>,
    /// Calibrated offset applied on top of the definition's origin offset.
    pub offset: Point,
}

/// Labware slice of the engine state.
#[derive(Debug, Clone, PartialEq)]
pub struct LabwareState {
    labware_by_id: HashMap<LabwareId, LoadedLabware>,
    labware_id_by_slot: HashMap<SlotId, LabwareId>,
    deck: Arc<DeckDefinition>,
}

impl LabwareState {
    fn new(deck: DeckDefinition) -> Self {
        Self {
            labware_by_id: HashMap::new(),
            labware_id_by_slot: HashMap::new(),
            deck: Arc::new(deck),
        }
    }

    /// Place a labware, displacing any current occupant of the slot.
    /// Re-placing an already-loaded id vacates the slot it came from.
    fn place(&mut self, labware: LoadedLabware) {
        if let Some(previous) = self.labware_by_id.get(&labware.id) {
            if previous.slot != labware.slot {
                self.labware_id_by_slot.remove(&previous.slot);
            }
        }
        if let Some(displaced) = self
            .labware_id_by_slot
            .insert(labware.slot.clone(), labware.id.clone())
        {
            if displaced != labware.id {
                self.labware_by_id.remove(&displaced);
                warn!(slot = %labware.slot, displaced = %displaced, loaded = %labware.id, "slot occupant displaced");
            }
        }
        self.labware_by_id.insert(labware.id.clone(), labware);
    }

    pub(crate) fn get(&self, id: &str) -> Option<&LoadedLabware> {
        self.labware_by_id.get(id)
    }

    pub(crate) fn get_by_slot(&self, slot: &str) -> Option<&LoadedLabware> {
        self.labware_id_by_slot
            .get(slot)
            .and_then(|id| self.labware_by_id.get(id))
    }

    pub(crate) fn all_sorted(&self) -> Vec<&LoadedLabware> {
        let mut all: Vec<&LoadedLabware> = self.labware_by_id.values().collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        all
    }

    pub(crate) fn deck(&self) -> &DeckDefinition {
        &self.deck
    }

    pub(crate) fn slot_position(&self, slot: &str) -> StateResult<Point> {
        self.deck
            .slot_position(slot)
            .map_err(|_| StateError::SlotNotFound(slot.to_string()))
    }

    pub(crate) fn len(&self) -> usize {
        self.labware_by_id.len()
    }
}

/// Sub-store owning the labware slice.
#[derive(Debug, Clone)]
pub(crate) struct LabwareStore {
    state: LabwareState,
}

impl LabwareStore {
    /// Seed the slice with the deck layout and its fixed labware.
    ///
    /// Fixed labware slots are validated by the deck layout loader before
    /// they reach this constructor.
    pub(crate) fn new(deck: DeckDefinition, fixed_labware: Vec<FixedLabware>) -> Self {
        let mut state = LabwareState::new(deck);
        for fixed in fixed_labware {
            state.place(LoadedLabware {
                id: fixed.labware_id,
                slot: fixed.slot,
                definition: Arc::new(fixed.definition),
                offset: Point::ZERO,
            });
        }
        Self { state }
    }

    pub(crate) fn state(&self) -> &LabwareState {
        &self.state
    }
}

impl SubStore for LabwareStore {
    fn fold(&mut self, command: &Command) -> StateResult<()> {
        if command.status != CommandStatus::Succeeded {
            return Ok(());
        }
        match (&command.params, &command.result) {
            (
                CommandParams::LoadLabware { slot, .. },
                Some(CommandResult::LoadLabware {
                    labware_id,
                    definition,
                    offset,
                }),
            ) => {
                self.state.slot_position(slot)?;
                self.state.place(LoadedLabware {
                    id: labware_id.clone(),
                    slot: slot.clone(),
                    definition: Arc::new(definition.clone()),
                    offset: *offset,
                });
            }
            (CommandParams::SetLabwareOffset { labware_id, offset }, _) => {
                let labware = self
                    .state
                    .labware_by_id
                    .get_mut(labware_id)
                    .ok_or_else(|| StateError::LabwareNotFound(labware_id.clone()))?;
                // Replacement, not accumulation.
                labware.offset = *offset;
            }
            _ => {}
        }
        Ok(())
    }
}

/// Read-only queries over the labware slice.
#[derive(Debug, Clone, Copy)]
pub struct LabwareView<'a> {
    state: &'a LabwareState,
}

impl<'a> LabwareView<'a> {
    pub(crate) fn new(state: &'a LabwareState) -> Self {
        Self { state }
    }

    /// Get a loaded labware by id.
    pub fn get(&self, id: &str) -> StateResult<&'a LoadedLabware> {
        self.state
            .get(id)
            .ok_or_else(|| StateError::LabwareNotFound(id.to_string()))
    }

    /// The labware occupying a slot, if any.
    pub fn get_by_slot(&self, slot: &str) -> Option<&'a LoadedLabware> {
        self.state.get_by_slot(slot)
    }

    /// A labware's resolved definition.
    pub fn get_definition(&self, id: &str) -> StateResult<&'a LabwareDefinition> {
        Ok(self.get(id)?.definition.as_ref())
    }

    /// A labware's calibrated offset.
    pub fn get_offset(&self, id: &str) -> StateResult<Point> {
        Ok(self.get(id)?.offset)
    }

    /// Nominal tip length of a tip rack's tips.
    pub fn get_tip_length(&self, id: &str) -> StateResult<f64> {
        self.get(id)?
            .definition
            .tip_length
            .ok_or_else(|| StateError::NotATipRack(id.to_string()))
    }

    /// All loaded labware, ordered by id.
    pub fn all(&self) -> Vec<&'a LoadedLabware> {
        self.state.all_sorted()
    }

    /// The deck layout the slice was seeded with.
    pub fn deck(&self) -> &'a DeckDefinition {
        self.state.deck()
    }

    /// Deck position of a slot.
    pub fn slot_position(&self, slot: &str) -> StateResult<Point> {
        self.state.slot_position(slot)
    }

    /// Number of labware on the deck, fixed labware included.
    pub fn len(&self) -> usize {
        self.state.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::WellLocation;
    use deck_core::Dimensions;
    use std::collections::BTreeMap;

    fn plate_definition() -> LabwareDefinition {
        LabwareDefinition {
            name: "test_plate_96".into(),
            dimensions: Dimensions {
                x: 127.8,
                y: 85.5,
                z: 14.2,
            },
            origin_offset: Point::ZERO,
            wells: BTreeMap::new(),
            tip_length: None,
        }
    }

    fn load_succeeded(command_id: &str, labware_id: &str, slot: &str) -> Command {
        Command::queued(
            command_id,
            CommandParams::LoadLabware {
                slot: slot.into(),
                load_name: "test_plate_96".into(),
            },
        )
        .succeeded(CommandResult::LoadLabware {
            labware_id: labware_id.into(),
            definition: plate_definition(),
            offset: Point::ZERO,
        })
    }

    fn store() -> LabwareStore {
        LabwareStore::new(DeckDefinition::standard(), Vec::new())
    }

    #[test]
    fn load_places_labware_in_its_slot() {
        let mut store = store();
        store.fold(&load_succeeded("command-1", "plate-1", "C1")).unwrap();

        let view = LabwareView::new(store.state());
        let labware = view.get("plate-1").unwrap();
        assert_eq!(labware.slot, "C1");
        assert_eq!(view.get_by_slot("C1").unwrap().id, "plate-1");
        assert_eq!(view.len(), 1);
    }

    #[test]
    fn loading_into_an_occupied_slot_displaces_the_occupant() {
        let mut store = store();
        store.fold(&load_succeeded("command-1", "plate-1", "C1")).unwrap();
        store.fold(&load_succeeded("command-2", "plate-2", "C1")).unwrap();

        let view = LabwareView::new(store.state());
        assert_eq!(view.get_by_slot("C1").unwrap().id, "plate-2");
        assert!(matches!(
            view.get("plate-1"),
            Err(StateError::LabwareNotFound(_))
        ));
        assert_eq!(view.len(), 1);
    }

    #[test]
    fn reloading_a_labware_into_a_new_slot_vacates_the_old_one() {
        let mut store = store();
        store.fold(&load_succeeded("command-1", "plate-1", "C1")).unwrap();
        store.fold(&load_succeeded("command-2", "plate-1", "C2")).unwrap();

        let view = LabwareView::new(store.state());
        assert_eq!(view.get("plate-1").unwrap().slot, "C2");
        assert_eq!(view.get_by_slot("C2").unwrap().id, "plate-1");
        assert!(view.get_by_slot("C1").is_none());
        assert_eq!(view.len(), 1);

        // A move onto an occupied slot still displaces its occupant.
        store.fold(&load_succeeded("command-3", "plate-2", "C1")).unwrap();
        store.fold(&load_succeeded("command-4", "plate-2", "C2")).unwrap();

        let view = LabwareView::new(store.state());
        assert_eq!(view.get_by_slot("C2").unwrap().id, "plate-2");
        assert!(matches!(
            view.get("plate-1"),
            Err(StateError::LabwareNotFound(_))
        ));
        assert!(view.get_by_slot("C1").is_none());
        assert_eq!(view.len(), 1);
    }

    #[test]
    fn fixed_labware_is_present_before_any_command() {
        let store = LabwareStore::new(
            DeckDefinition::standard(),
            vec![FixedLabware {
                labware_id: "fixed-trash".into(),
                slot: "A3".into(),
                definition: plate_definition(),
            }],
        );
        let view = LabwareView::new(store.state());
        let trash = view.get("fixed-trash").unwrap();
        assert_eq!(trash.slot, "A3");
        assert_eq!(trash.offset, Point::ZERO);
    }

    #[test]
    fn set_labware_offset_replaces_the_previous_offset() {
        let mut store = store();
        store.fold(&load_succeeded("command-1", "plate-1", "C1")).unwrap();

        let set_offset = |command_id: &str, offset: Point| {
            Command::queued(
                command_id,
                CommandParams::SetLabwareOffset {
                    labware_id: "plate-1".into(),
                    offset,
                },
            )
            .succeeded(CommandResult::SetLabwareOffset)
        };
        store
            .fold(&set_offset("command-2", Point::new(1.0, -0.5, 0.2)))
            .unwrap();
        store
            .fold(&set_offset("command-3", Point::new(0.1, 0.1, 0.0)))
            .unwrap();

        let view = LabwareView::new(store.state());
        assert_eq!(view.get_offset("plate-1").unwrap(), Point::new(0.1, 0.1, 0.0));
    }

    #[test]
    fn set_labware_offset_on_unknown_labware_fails() {
        let mut store = store();
        let command = Command::queued(
            "command-1",
            CommandParams::SetLabwareOffset {
                labware_id: "missing".into(),
                offset: Point::ZERO,
            },
        )
        .succeeded(CommandResult::SetLabwareOffset);
        assert!(matches!(
            store.fold(&command),
            Err(StateError::LabwareNotFound(_))
        ));
    }

    #[test]
    fn load_into_unknown_slot_fails() {
        let mut store = store();
        let result = store.fold(&load_succeeded("command-1", "plate-1", "Z9"));
        assert!(matches!(result, Err(StateError::SlotNotFound(_))));
    }

    #[test]
    fn non_terminal_and_irrelevant_commands_leave_the_slice_untouched() {
        let mut store = store();
        store.fold(&load_succeeded("command-1", "plate-1", "C1")).unwrap();
        let before = store.state().clone();

        // A load that has not succeeded yet.
        let queued = Command::queued(
            "command-2",
            CommandParams::LoadLabware {
                slot: "C2".into(),
                load_name: "test_plate_96".into(),
            },
        );
        store.fold(&queued).unwrap();
        assert_eq!(*store.state(), before);

        // A succeeded command of a kind this slice does not react to.
        let move_to_well = Command::queued(
            "command-3",
            CommandParams::MoveToWell {
                pipette_id: "pipette-1".into(),
                labware_id: "plate-1".into(),
                well_name: "A1".into(),
                well_location: WellLocation::top(),
            },
        )
        .succeeded(CommandResult::MoveToWell);
        store.fold(&move_to_well).unwrap();
        assert_eq!(*store.state(), before);
    }

    #[test]
    fn mismatched_result_shapes_leave_the_slice_untouched() {
        let mut store = store();
        store.fold(&load_succeeded("command-1", "plate-1", "C1")).unwrap();
        let before = store.state().clone();

        // A succeeded load carrying no result payload at all.
        let mut missing = Command::queued(
            "command-2",
            CommandParams::LoadLabware {
                slot: "C2".into(),
                load_name: "test_plate_96".into(),
            },
        );
        missing.status = CommandStatus::Succeeded;
        store.fold(&missing).unwrap();
        assert_eq!(*store.state(), before);

        // A succeeded load whose result payload is the wrong variant.
        let wrong = Command::queued(
            "command-3",
            CommandParams::LoadLabware {
                slot: "C2".into(),
                load_name: "test_plate_96".into(),
            },
        )
        .succeeded(CommandResult::MoveToWell);
        store.fold(&wrong).unwrap();
        assert_eq!(*store.state(), before);
    }

    #[test]
    fn tip_length_requires_a_tip_rack() {
        let mut store = store();
        store.fold(&load_succeeded("command-1", "plate-1", "C1")).unwrap();
        let view = LabwareView::new(store.state());
        assert!(matches!(
            view.get_tip_length("plate-1"),
            Err(StateError::NotATipRack(_))
        ));
    }
}
