//! Deck layout: slot positions and fixed labware.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geometry::Point;
use crate::labware::LabwareDefinition;

/// Identifier of a deck slot (e.g. "A1", "C3").
pub type SlotId = String;

/// Errors in a deck layout.
#[derive(Debug, Error)]
pub enum DeckError {
    #[error("deck has no slot named {0}")]
    UnknownSlot(String),

    #[error("duplicate slot id in deck layout: {0}")]
    DuplicateSlot(String),
}

/// One slot position on the deck.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeckSlot {
    pub id: SlotId,
    /// Front-left corner of the slot, deck coordinates (mm).
    pub position: Point,
}

/// The physical slot layout of a robot deck.
///
/// Immutable for the lifetime of a state store; supplied at construction
/// either from `deck.toml` or via [`DeckDefinition::standard`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeckDefinition {
    pub name: String,
    pub slots: Vec<DeckSlot>,
}

/// Column pitch of the standard deck, mm.
const SLOT_PITCH_X: f64 = 164.0;

/// Row pitch of the standard deck, mm.
const SLOT_PITCH_Y: f64 = 107.0;

impl DeckDefinition {
    /// Build a deck from explicit slots, rejecting duplicate slot ids.
    pub fn new(name: impl Into<String>, slots: Vec<DeckSlot>) -> Result<Self, DeckError> {
        let mut seen = std::collections::HashSet::new();
        for slot in &slots {
            if !seen.insert(slot.id.clone()) {
                return Err(DeckError::DuplicateSlot(slot.id.clone()));
            }
        }
        Ok(Self {
            name: name.into(),
            slots,
        })
    }

    /// The built-in 12-slot deck: rows A (front) through D (back),
    /// columns 1 through 3.
    pub fn standard() -> Self {
        let mut slots = Vec::with_capacity(12);
        for (row_index, row) in ["A", "B", "C", "D"].iter().enumerate() {
            for col in 1..=3u32 {
                slots.push(DeckSlot {
                    id: format!("{row}{col}"),
                    position: Point::new(
                        f64::from(col - 1) * SLOT_PITCH_X,
                        row_index as f64 * SLOT_PITCH_Y,
                        0.0,
                    ),
                });
            }
        }
        Self {
            name: "standard-12-slot".to_string(),
            slots,
        }
    }

    pub fn slot(&self, id: &str) -> Option<&DeckSlot> {
        self.slots.iter().find(|slot| slot.id == id)
    }

    pub fn slot_position(&self, id: &str) -> Result<Point, DeckError> {
        self.slot(id)
            .map(|slot| slot.position)
            .ok_or_else(|| DeckError::UnknownSlot(id.to_string()))
    }
}

/// Labware permanently present on the deck (e.g. the fixed trash).
///
/// Seeded into the state store at construction; never loaded by a command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixedLabware {
    pub labware_id: String,
    pub slot: SlotId,
    pub definition: LabwareDefinition,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_deck_has_twelve_slots() {
        let deck = DeckDefinition::standard();
        assert_eq!(deck.slots.len(), 12);
        assert!(deck.slot("A1").is_some());
        assert!(deck.slot("D3").is_some());
        assert!(deck.slot("E1").is_none());
    }

    #[test]
    fn standard_deck_positions_follow_pitch() {
        let deck = DeckDefinition::standard();
        assert_eq!(deck.slot_position("A1").unwrap(), Point::ZERO);
        assert_eq!(
            deck.slot_position("A2").unwrap(),
            Point::new(SLOT_PITCH_X, 0.0, 0.0)
        );
        assert_eq!(
            deck.slot_position("B1").unwrap(),
            Point::new(0.0, SLOT_PITCH_Y, 0.0)
        );
    }

    #[test]
    fn unknown_slot_is_an_error() {
        let deck = DeckDefinition::standard();
        assert!(matches!(
            deck.slot_position("Z9"),
            Err(DeckError::UnknownSlot(_))
        ));
    }

    #[test]
    fn duplicate_slot_rejected() {
        let slot = DeckSlot {
            id: "A1".to_string(),
            position: Point::ZERO,
        };
        let result = DeckDefinition::new("dup", vec![slot.clone(), slot]);
        assert!(matches!(result, Err(DeckError::DuplicateSlot(_))));
    }
}
