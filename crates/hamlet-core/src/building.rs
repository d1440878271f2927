//! Buildings: the production units of the simulation.
//!
//! A building owns two ledgers (input, output), a recipe, and its cadences.
//! Construction sites are the same type with a different [`Role`]; the role
//! is matched explicitly wherever behaviour diverges (fabricate, the
//! busy-recipient check in transport) rather than downcast.

use crate::id::{PresetId, ResourceKindId};
use crate::ledger::{ResourceAmount, ResourceLedger};
use crate::registry::{BuildingPreset, Recipe};
use crate::sim::Ticks;
use serde::{Deserialize, Serialize};

/// What a building is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    /// An ordinary producer running its preset's recipe.
    Producer,
    /// A construction site accumulating the build cost of `target`.
    Construction {
        /// Preset to spawn once the build cost is met.
        target: PresetId,
        /// Set while a delivery is in flight to this site, to prevent
        /// double-dispatch. Cleared when the delivery resolves.
        receiving: bool,
    },
}

/// The outcome of a single fabrication attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FabricateOutcome {
    /// Consumed the required inputs and produced the outputs.
    Produced,
    /// Inputs were insufficient. The normal waiting state, not an error;
    /// nothing was consumed.
    Starved,
    /// A construction site met its build cost and should be replaced with
    /// its target preset.
    Completed,
}

/// A production unit in the flow graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Building {
    /// The preset this building was spawned from.
    pub preset: PresetId,
    pub role: Role,
    /// Copied from the preset at spawn. For a construction site this is
    /// `{ required: target.build_cost, produced: [] }`.
    pub recipe: Recipe,
    pub input: ResourceLedger,
    pub output: ResourceLedger,
    pub production_cadence: Ticks,
    pub transport_cadence: Ticks,
    pub interaction_radius: u32,
}

impl Building {
    /// Spawn a producer from a preset.
    pub fn producer(id: PresetId, preset: &BuildingPreset) -> Self {
        Self {
            preset: id,
            role: Role::Producer,
            recipe: preset.recipe.clone(),
            input: ResourceLedger::with_initial(&preset.initial_input),
            output: ResourceLedger::new(),
            production_cadence: preset.production_cadence,
            transport_cadence: preset.transport_cadence,
            interaction_radius: preset.interaction_radius,
        }
    }

    /// Spawn a construction site for a target preset. The site inherits the
    /// site preset's cadences and radius but requests the target's build
    /// cost instead of a recipe.
    pub fn construction_site(
        site_id: PresetId,
        site: &BuildingPreset,
        target_id: PresetId,
        target: &BuildingPreset,
    ) -> Self {
        Self {
            preset: site_id,
            role: Role::Construction {
                target: target_id,
                receiving: false,
            },
            recipe: Recipe {
                required: target.build_cost.clone(),
                produced: Vec::new(),
            },
            input: ResourceLedger::with_initial(&site.initial_input),
            output: ResourceLedger::new(),
            production_cadence: site.production_cadence,
            transport_cadence: site.transport_cadence,
            interaction_radius: site.interaction_radius,
        }
    }

    /// The amounts this building wants delivered: its recipe's inputs, or
    /// the remaining build cost for a construction site.
    pub fn requested(&self) -> &[ResourceAmount] {
        &self.recipe.required
    }

    /// The kinds this building produces.
    pub fn produced(&self) -> &[ResourceAmount] {
        &self.recipe.produced
    }

    /// Whether this building produces anything at all.
    pub fn is_provider(&self) -> bool {
        !self.recipe.produced.is_empty()
    }

    /// Whether this is a construction site with a delivery in flight.
    pub fn is_receiving(&self) -> bool {
        matches!(
            self.role,
            Role::Construction {
                receiving: true,
                ..
            }
        )
    }

    /// Set or clear the in-flight delivery flag. No-op for producers.
    pub fn set_receiving(&mut self, value: bool) {
        if let Role::Construction { receiving, .. } = &mut self.role {
            *receiving = value;
        }
    }

    /// Attempt one fabrication.
    ///
    /// Producers consume their required inputs and produce their outputs
    /// atomically; partial consumption is never observable. Construction
    /// sites check their build cost and report [`FabricateOutcome::Completed`]
    /// without consuming -- the banked resources are discarded with the site.
    pub fn fabricate(&mut self) -> FabricateOutcome {
        match self.role {
            Role::Producer => {
                if !self.input.has_all(&self.recipe.required) {
                    return FabricateOutcome::Starved;
                }
                self.input.remove_all(&self.recipe.required);
                self.output.add_all(&self.recipe.produced);
                FabricateOutcome::Produced
            }
            Role::Construction { .. } => {
                if self.input.has_all(&self.recipe.required) {
                    FabricateOutcome::Completed
                } else {
                    FabricateOutcome::Starved
                }
            }
        }
    }

    /// Whether any of this building's produced kinds match `kinds`.
    pub fn produces_any_of(&self, kinds: impl Iterator<Item = ResourceKindId>) -> bool {
        let mut kinds = kinds;
        kinds.any(|kind| self.recipe.produced.iter().any(|have| have.kind == kind))
    }
}
