//! Building preset registry.
//!
//! Presets are registered through a builder and frozen before the engine
//! runs. The frozen registry is immutable; every building copies its recipe
//! and cadences from its preset at spawn time.

use crate::id::{PresetId, ResourceKindId};
use crate::ledger::ResourceAmount;
use crate::sim::Ticks;
use std::collections::HashMap;

/// A production recipe: consume `required` from the input ledger, add
/// `produced` to the output ledger.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Recipe {
    pub required: Vec<ResourceAmount>,
    pub produced: Vec<ResourceAmount>,
}

impl Recipe {
    /// Whether any required kind appears in `produced_kinds`.
    pub fn wants_any_of(&self, produced: &[ResourceAmount]) -> bool {
        self.required
            .iter()
            .any(|need| produced.iter().any(|have| have.kind == need.kind))
    }

    /// The kinds this recipe consumes.
    pub fn required_kinds(&self) -> impl Iterator<Item = ResourceKindId> + '_ {
        self.required.iter().map(|a| a.kind)
    }
}

/// A building template. Registered once, frozen, and referenced by
/// [`PresetId`] thereafter.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct BuildingPreset {
    pub name: String,
    /// What the building consumes and produces each fabrication.
    pub recipe: Recipe,
    /// Ticks between fabrication attempts.
    pub production_cadence: Ticks,
    /// Ticks between transport attempts.
    pub transport_cadence: Ticks,
    /// Maximum provider/recipient search distance, in tiles.
    pub interaction_radius: u32,
    /// What a construction site targeting this preset must accumulate.
    pub build_cost: Vec<ResourceAmount>,
    /// Resources seeded into the input ledger at spawn.
    pub initial_input: Vec<ResourceAmount>,
}

/// Errors detected when freezing a registry.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("preset {0:?} has a zero cadence")]
    ZeroCadence(String),
    #[error("preset {0:?} has a zero-quantity recipe or build-cost entry")]
    ZeroQuantityEntry(String),
    #[error("duplicate preset name {0:?}")]
    DuplicateName(String),
}

/// Builder for constructing an immutable [`PresetRegistry`].
#[derive(Debug, Default)]
pub struct PresetRegistryBuilder {
    presets: Vec<BuildingPreset>,
}

impl PresetRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a preset. Returns its ID.
    pub fn register(&mut self, preset: BuildingPreset) -> PresetId {
        let id = PresetId(self.presets.len() as u32);
        self.presets.push(preset);
        id
    }

    /// Validate and freeze the registry.
    pub fn freeze(self) -> Result<PresetRegistry, RegistryError> {
        let mut name_to_id = HashMap::new();
        for (index, preset) in self.presets.iter().enumerate() {
            if preset.production_cadence == 0 || preset.transport_cadence == 0 {
                return Err(RegistryError::ZeroCadence(preset.name.clone()));
            }
            let entries = preset
                .recipe
                .required
                .iter()
                .chain(preset.recipe.produced.iter())
                .chain(preset.build_cost.iter());
            for entry in entries {
                if entry.quantity == 0 {
                    return Err(RegistryError::ZeroQuantityEntry(preset.name.clone()));
                }
            }
            let id = PresetId(index as u32);
            if name_to_id.insert(preset.name.clone(), id).is_some() {
                return Err(RegistryError::DuplicateName(preset.name.clone()));
            }
        }
        Ok(PresetRegistry {
            presets: self.presets,
            name_to_id,
        })
    }
}

/// Immutable preset registry. Frozen after [`PresetRegistryBuilder::freeze`].
#[derive(Debug)]
pub struct PresetRegistry {
    presets: Vec<BuildingPreset>,
    name_to_id: HashMap<String, PresetId>,
}

impl PresetRegistry {
    pub fn builder() -> PresetRegistryBuilder {
        PresetRegistryBuilder::new()
    }

    /// Look up a preset by ID.
    pub fn get(&self, id: PresetId) -> Option<&BuildingPreset> {
        self.presets.get(id.0 as usize)
    }

    /// Look up a preset ID by name.
    pub fn id_of(&self, name: &str) -> Option<PresetId> {
        self.name_to_id.get(name).copied()
    }

    /// Number of registered presets.
    pub fn len(&self) -> usize {
        self.presets.len()
    }

    /// Whether the registry holds no presets.
    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }
}
