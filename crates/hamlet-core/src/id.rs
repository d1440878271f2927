use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

new_key_type! {
    /// Identifies a building in the flow graph. Arena-stable across
    /// insertions and removals; a freed slot's key never aliases a
    /// later occupant.
    pub struct BuildingId;
}

/// Identifies a resource kind. Cheap to copy and compare; equality by tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ResourceKindId(pub u32);

/// Identifies a building preset in the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PresetId(pub u32);
