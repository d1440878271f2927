//! Simulation clock types.
//!
//! The tick counter is owned by the engine and handed into per-tick logic
//! explicitly; nothing in the simulation reads a shared global clock.

use crate::id::{BuildingId, PresetId};

/// Discrete simulation time, in ticks.
pub type Ticks = u64;

/// Mutable simulation state tracked by the engine.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SimState {
    /// Current tick counter. Incremented by 1 for each simulation step.
    pub tick: Ticks,
}

impl SimState {
    /// Create a new simulation state starting at tick 0.
    pub fn new() -> Self {
        Self { tick: 0 }
    }
}

impl Default for SimState {
    fn default() -> Self {
        Self::new()
    }
}

/// A construction site that satisfied its build cost this step. The driver
/// replaces it with a building spawned from `target`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompletedConstruction {
    /// The site that finished. Already severed from the graph.
    pub site: BuildingId,
    /// The preset to spawn in its place.
    pub target: PresetId,
}

/// Result of an `Engine::step` call.
#[derive(Debug, Default)]
pub struct StepResult {
    /// The tick that was just executed.
    pub tick: Ticks,
    /// Construction sites completed during the fabricate phase.
    pub completed: Vec<CompletedConstruction>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sim_state_starts_at_zero() {
        let state = SimState::new();
        assert_eq!(state.tick, 0);
    }
}
