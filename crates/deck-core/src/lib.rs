//! deck-core — shared domain model for the deckhand state store.
//!
//! Deck slot layouts, labware well geometry, pipette mounts, and the
//! `deck.toml` layout format consumed at store construction.

pub mod config;
pub mod deck;
pub mod geometry;
pub mod labware;
pub mod pipette;

pub use config::{DeckLayoutFile, load_deck_layout};
pub use deck::{DeckDefinition, DeckError, DeckSlot, FixedLabware, SlotId};
pub use geometry::Point;
pub use labware::{Dimensions, LabwareDefinition, WellDefinition, WellName};
pub use pipette::Mount;
