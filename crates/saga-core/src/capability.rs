//! Schema capability declared by the store.
//!
//! Two NPC schema shapes exist in deployed stores. Rather than letting tool
//! handlers guess, the gateway declares which one it talks to and the tool
//! catalogue is built from that declaration.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Table holding one row per NPC.
pub const NPC_TABLE: &str = "npcs";

/// Table holding persona details for primary NPCs (persona-split schema only).
pub const PERSONA_TABLE: &str = "npc_personas";

/// Tables every deployment carries besides the NPC tables.
const WORLD_TABLES: &[&str] = &["player", "romance", "events", "game_lore"];

const FLAT_NPC_COLUMNS: &[&str] = &[
    "npc_id",
    "name",
    "description",
    "location",
    "disposition",
    "is_hostile",
];

const SPLIT_NPC_COLUMNS: &[&str] = &[
    "npc_id",
    "name",
    "description",
    "location",
    "disposition",
    "is_hostile",
    "primary_npc",
    "status",
];

/// The NPC schema shape a store exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SchemaCapability {
    /// A single `npcs` table; no persona support.
    Flat,
    /// `npcs` plus `npc_personas`, with a `primary_npc` flag on `npcs`.
    #[default]
    PersonaSplit,
}

impl SchemaCapability {
    /// Whether persona tools are available.
    pub fn has_personas(&self) -> bool {
        matches!(self, SchemaCapability::PersonaSplit)
    }

    /// Columns returned when reading NPC rows.
    pub fn npc_columns(&self) -> &'static [&'static str] {
        match self {
            SchemaCapability::Flat => FLAT_NPC_COLUMNS,
            SchemaCapability::PersonaSplit => SPLIT_NPC_COLUMNS,
        }
    }

    /// Tables known to exist for this schema shape.
    pub fn known_tables(&self) -> Vec<&'static str> {
        let mut tables = vec![NPC_TABLE];
        if self.has_personas() {
            tables.push(PERSONA_TABLE);
        }
        tables.extend_from_slice(WORLD_TABLES);
        tables
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaCapability::Flat => "flat",
            SchemaCapability::PersonaSplit => "persona_split",
        }
    }
}

impl fmt::Display for SchemaCapability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_has_no_persona_table() {
        let tables = SchemaCapability::Flat.known_tables();
        assert!(tables.contains(&NPC_TABLE));
        assert!(!tables.contains(&PERSONA_TABLE));
        assert!(!SchemaCapability::Flat.npc_columns().contains(&"primary_npc"));
    }

    #[test]
    fn test_split_tables_and_columns() {
        let capability = SchemaCapability::PersonaSplit;
        assert!(capability.has_personas());
        assert!(capability.known_tables().contains(&PERSONA_TABLE));
        assert!(capability.npc_columns().contains(&"primary_npc"));
    }

    #[test]
    fn test_capability_yaml_names() {
        let parsed: SchemaCapability = serde_yaml::from_str("flat").unwrap();
        assert_eq!(parsed, SchemaCapability::Flat);
        let parsed: SchemaCapability = serde_yaml::from_str("persona_split").unwrap();
        assert_eq!(parsed, SchemaCapability::PersonaSplit);
    }
}
