//! Shared test helpers for unit tests, integration tests, and benchmarks.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]` so these are
//! available to downstream crates' tests via the `test-utils` feature.

use crate::building::Building;
use crate::engine::Engine;
use crate::id::{PresetId, ResourceKindId};
use crate::ledger::ResourceAmount;
use crate::registry::{BuildingPreset, PresetRegistry, Recipe};
use crate::transport::{AgentHandle, AgentPool, Delivery};

// ===========================================================================
// Resource kinds
// ===========================================================================

pub fn wood() -> ResourceKindId {
    ResourceKindId(0)
}
pub fn stone() -> ResourceKindId {
    ResourceKindId(1)
}
pub fn plank() -> ResourceKindId {
    ResourceKindId(2)
}
pub fn furniture() -> ResourceKindId {
    ResourceKindId(3)
}

// ===========================================================================
// Presets
// ===========================================================================

/// A preset with the given recipe, cadence 1, radius 5, no build cost.
pub fn preset_with_recipe(
    name: &str,
    required: Vec<ResourceAmount>,
    produced: Vec<ResourceAmount>,
) -> BuildingPreset {
    BuildingPreset {
        name: name.to_string(),
        recipe: Recipe { required, produced },
        production_cadence: 1,
        transport_cadence: 1,
        interaction_radius: 5,
        build_cost: Vec::new(),
        initial_input: Vec::new(),
    }
}

/// Consumes {wood:2} -> produces {plank:1}.
pub fn sawmill_preset() -> BuildingPreset {
    preset_with_recipe(
        "sawmill",
        vec![ResourceAmount::new(wood(), 2)],
        vec![ResourceAmount::new(plank(), 1)],
    )
}

/// Consumes {plank:1} -> produces {furniture:1}.
pub fn carpenter_preset() -> BuildingPreset {
    preset_with_recipe(
        "carpenter",
        vec![ResourceAmount::new(plank(), 1)],
        vec![ResourceAmount::new(furniture(), 1)],
    )
}

/// Consumes {wood:1} -> produces {stone:1} every 2 ticks, seeded with
/// {wood:10}.
pub fn mine_preset() -> BuildingPreset {
    let mut preset = preset_with_recipe(
        "mine",
        vec![ResourceAmount::new(wood(), 1)],
        vec![ResourceAmount::new(stone(), 1)],
    );
    preset.production_cadence = 2;
    preset.initial_input = vec![ResourceAmount::new(wood(), 10)];
    preset
}

/// Produces {stone:1} from nothing.
pub fn quarry_preset() -> BuildingPreset {
    preset_with_recipe("quarry", Vec::new(), vec![ResourceAmount::new(stone(), 1)])
}

/// No recipe; build cost {stone:5}.
pub fn tower_preset() -> BuildingPreset {
    let mut preset = preset_with_recipe("tower", Vec::new(), Vec::new());
    preset.build_cost = vec![ResourceAmount::new(stone(), 5)];
    preset
}

/// The bare scaffold a construction site spawns from.
pub fn construction_site_preset() -> BuildingPreset {
    preset_with_recipe("construction-site", Vec::new(), Vec::new())
}

/// A construction site targeting the tower preset (build cost {stone:5}).
pub fn construction_site_fixture() -> Building {
    Building::construction_site(
        PresetId(5),
        &construction_site_preset(),
        PresetId(4),
        &tower_preset(),
    )
}

// ===========================================================================
// Engine fixture
// ===========================================================================

/// Standard registry: mine, sawmill, carpenter, quarry, tower,
/// construction-site (in that order).
pub fn test_registry() -> PresetRegistry {
    let mut builder = PresetRegistry::builder();
    builder.register(mine_preset());
    builder.register(sawmill_preset());
    builder.register(carpenter_preset());
    builder.register(quarry_preset());
    builder.register(tower_preset());
    builder.register(construction_site_preset());
    builder
        .freeze()
        .expect("test registry presets are all valid")
}

/// An engine over [`test_registry`].
pub fn test_engine() -> Engine {
    Engine::new(test_registry())
}

// ===========================================================================
// Agent pools
// ===========================================================================

/// Grants unlimited agents and records every assigned delivery.
#[derive(Debug, Default)]
pub struct RecordingPool {
    next: u32,
    pub assigned: Vec<Delivery>,
}

impl RecordingPool {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AgentPool for RecordingPool {
    fn try_acquire(&mut self) -> Option<AgentHandle> {
        let handle = AgentHandle(self.next);
        self.next += 1;
        Some(handle)
    }

    fn assign(&mut self, _agent: AgentHandle, delivery: Delivery) {
        self.assigned.push(delivery);
    }
}
