//! deck.toml layout parser.
//!
//! A deck layout file names the deck, lists its slots, and optionally
//! declares fixed labware with inline definitions:
//!
//! ```toml
//! name = "standard-12-slot"
//!
//! [[slot]]
//! id = "A1"
//! position = { x = 0.0, y = 0.0, z = 0.0 }
//!
//! [[fixed_labware]]
//! id = "fixed-trash"
//! slot = "A3"
//!
//! [fixed_labware.definition]
//! name = "trash-bin"
//! dimensions = { x = 246.0, y = 92.0, z = 40.0 }
//!
//! [fixed_labware.definition.wells.A1]
//! x = 123.0
//! y = 46.0
//! z = 0.0
//! depth = 40.0
//! max_volume = 1.0e6
//! ```

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::deck::{DeckDefinition, DeckSlot, FixedLabware};
use crate::labware::LabwareDefinition;

/// On-disk deck layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeckLayoutFile {
    pub name: String,
    #[serde(default, rename = "slot")]
    pub slots: Vec<DeckSlot>,
    #[serde(default, rename = "fixed_labware")]
    pub fixed_labware: Vec<FixedLabwareEntry>,
}

/// A fixed-labware entry in a deck layout file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixedLabwareEntry {
    pub id: String,
    pub slot: String,
    pub definition: LabwareDefinition,
}

impl DeckLayoutFile {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading deck layout {}", path.display()))?;
        Self::parse(&content)
    }

    pub fn parse(text: &str) -> anyhow::Result<Self> {
        let layout: DeckLayoutFile = toml::from_str(text).context("parsing deck layout")?;
        Ok(layout)
    }

    /// Split into the deck definition and its fixed labware, validating
    /// slot references.
    pub fn into_parts(self) -> anyhow::Result<(DeckDefinition, Vec<FixedLabware>)> {
        let deck = DeckDefinition::new(self.name, self.slots)?;

        let mut fixed = Vec::with_capacity(self.fixed_labware.len());
        for entry in self.fixed_labware {
            deck.slot_position(&entry.slot)
                .with_context(|| format!("fixed labware {}", entry.id))?;
            fixed.push(FixedLabware {
                labware_id: entry.id,
                slot: entry.slot,
                definition: entry.definition,
            });
        }

        Ok((deck, fixed))
    }
}

/// Load and validate a deck layout file.
pub fn load_deck_layout(path: &Path) -> anyhow::Result<(DeckDefinition, Vec<FixedLabware>)> {
    DeckLayoutFile::from_file(path)?.into_parts()
}
