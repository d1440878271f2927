//! The simulation engine: owns the flow graph and orchestrates the
//! per-tick fabricate/transport pipeline.
//!
//! # Pipeline
//!
//! Each `step()` runs:
//! 1. **Fabricate** -- every building whose production cadence divides the
//!    tick attempts one fabrication. Construction sites that meet their
//!    build cost are severed from the graph and reported to the driver for
//!    replacement.
//! 2. **Transport** -- every surviving building whose transport cadence
//!    divides the tick runs one delivery-scheduling attempt against the
//!    agent pool.
//! 3. **Bookkeeping** -- the tick counter advances.
//!
//! Both phases run to completion within the tick; structural mutations
//! (placement, removal, link refresh) come from the driver between steps,
//! never concurrently with one.

use crate::building::{Building, FabricateOutcome, Role};
use crate::event::{Event, EventLog};
use crate::flow::{FlowError, FlowGraph};
use crate::id::{BuildingId, PresetId};
use crate::registry::PresetRegistry;
use crate::sim::{CompletedConstruction, SimState, StepResult};
use crate::transport::{self, AgentPool, Delivery};

/// Errors from structural engine operations.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("preset not found: {0:?}")]
    PresetNotFound(PresetId),
    #[error(transparent)]
    Flow(#[from] FlowError),
}

/// The core simulation engine.
#[derive(Debug)]
pub struct Engine {
    /// Immutable preset registry, frozen before the engine is built.
    pub registry: PresetRegistry,
    /// The flow graph of buildings and provider/recipient edges.
    pub graph: FlowGraph,
    /// Simulation clock.
    pub sim_state: SimState,
    /// Notification log for the presentation layer.
    pub events: EventLog,
}

impl Engine {
    pub fn new(registry: PresetRegistry) -> Self {
        Self {
            registry,
            graph: FlowGraph::new(),
            sim_state: SimState::new(),
            events: EventLog::new(),
        }
    }

    // -----------------------------------------------------------------------
    // Structural operations (driver-facing)
    // -----------------------------------------------------------------------

    /// Spawn a producer from a preset.
    pub fn spawn(&mut self, preset: PresetId) -> Result<BuildingId, EngineError> {
        let def = self
            .registry
            .get(preset)
            .ok_or(EngineError::PresetNotFound(preset))?;
        let building = Building::producer(preset, def);
        let id = self.graph.insert(building);
        self.events.push(Event::BuildingAdded {
            building: id,
            preset,
            tick: self.sim_state.tick,
        });
        Ok(id)
    }

    /// Spawn a construction site that will become `target` once the
    /// target's build cost has been delivered.
    pub fn spawn_construction(
        &mut self,
        site: PresetId,
        target: PresetId,
    ) -> Result<BuildingId, EngineError> {
        let site_def = self
            .registry
            .get(site)
            .ok_or(EngineError::PresetNotFound(site))?;
        let target_def = self
            .registry
            .get(target)
            .ok_or(EngineError::PresetNotFound(target))?;
        let building = Building::construction_site(site, site_def, target, target_def);
        let id = self.graph.insert(building);
        self.events.push(Event::BuildingAdded {
            building: id,
            preset: site,
            tick: self.sim_state.tick,
        });
        Ok(id)
    }

    /// Remove a building, severing all of its graph edges.
    pub fn remove(&mut self, building: BuildingId) -> Result<(), EngineError> {
        self.graph
            .remove(building)
            .ok_or(FlowError::BuildingNotFound(building))?;
        self.events.push(Event::BuildingRemoved {
            building,
            tick: self.sim_state.tick,
        });
        Ok(())
    }

    /// Recompute the recipient queue for `unit` from grid-supplied inputs.
    /// See [`FlowGraph::refresh_recipients`].
    pub fn refresh_recipients(
        &mut self,
        unit: BuildingId,
        road_access: bool,
        candidates: &[BuildingId],
    ) -> Result<(), EngineError> {
        self.graph.refresh_recipients(
            unit,
            road_access,
            candidates,
            self.sim_state.tick,
            &mut self.events,
        )?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Tick pipeline
    // -----------------------------------------------------------------------

    /// Advance the simulation by one tick.
    pub fn step(&mut self, pool: &mut dyn AgentPool) -> StepResult {
        let tick = self.sim_state.tick;
        let mut result = StepResult {
            tick,
            completed: Vec::new(),
        };

        self.phase_fabricate(tick, &mut result);
        self.phase_transport(tick, pool);
        self.sim_state.tick += 1;

        result
    }

    fn phase_fabricate(&mut self, tick: crate::sim::Ticks, result: &mut StepResult) {
        for id in self.graph.ids() {
            let Some(building) = self.graph.get_mut(id) else {
                continue;
            };
            if tick % building.production_cadence != 0 {
                continue;
            }
            let role = building.role;
            let outcome = building.fabricate();
            match (role, outcome) {
                (Role::Construction { .. }, FabricateOutcome::Starved) => {
                    self.events.push(Event::ConstructionProgress {
                        site: id,
                        success: false,
                        tick,
                    });
                }
                (Role::Construction { target, .. }, FabricateOutcome::Completed) => {
                    self.events.push(Event::ConstructionProgress {
                        site: id,
                        success: true,
                        tick,
                    });
                    self.events.push(Event::ConstructionCompleted {
                        site: id,
                        target,
                        tick,
                    });
                    // The site consumes itself; its edges are severed here
                    // and the driver spawns the target in its place.
                    self.graph.remove(id);
                    result.completed.push(CompletedConstruction { site: id, target });
                }
                _ => {}
            }
        }
    }

    fn phase_transport(&mut self, tick: crate::sim::Ticks, pool: &mut dyn AgentPool) {
        for id in self.graph.ids() {
            let Some(building) = self.graph.get(id) else {
                continue;
            };
            if tick % building.transport_cadence != 0 {
                continue;
            }
            transport::run_transport(&mut self.graph, id, tick, pool, &mut self.events);
        }
    }

    // -----------------------------------------------------------------------
    // Delivery resolution (signals from the external agent)
    // -----------------------------------------------------------------------

    /// A delivery arrived: credit the target's input ledger and clear its
    /// in-flight flag. A vanished target swallows the delivery.
    pub fn complete_delivery(&mut self, delivery: &Delivery) {
        if let Some(target) = self.graph.get_mut(delivery.target) {
            target.input.add_all(&delivery.payload);
            target.set_receiving(false);
        }
    }

    /// A delivery failed: return the payload to the source's output (if
    /// the source still exists) and clear the target's in-flight flag.
    pub fn abort_delivery(&mut self, delivery: &Delivery) {
        if let Some(target) = self.graph.get_mut(delivery.target) {
            target.set_receiving(false);
        }
        if let Some(source) = self.graph.get_mut(delivery.source) {
            source.output.add_all(&delivery.payload);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::ResourceAmount;
    use crate::test_utils::*;

    #[test]
    fn spawn_seeds_from_preset() {
        let mut engine = test_engine();
        let mine = engine.registry.id_of("mine").unwrap();
        let id = engine.spawn(mine).unwrap();

        let building = engine.graph.get(id).unwrap();
        assert_eq!(building.preset, mine);
        // The mine preset seeds its own input with wood to chew through.
        assert_eq!(building.input.get(wood()), 10);
    }

    #[test]
    fn spawn_unknown_preset_errors() {
        let mut engine = test_engine();
        assert!(matches!(
            engine.spawn(PresetId(999)),
            Err(EngineError::PresetNotFound(_))
        ));
    }

    #[test]
    fn fabricate_respects_cadence() {
        let mut engine = test_engine();
        // The mine consumes 1 wood -> 1 stone every 2 ticks.
        let mine = engine.registry.id_of("mine").unwrap();
        let id = engine.spawn(mine).unwrap();
        let mut pool = RecordingPool::new();

        engine.step(&mut pool); // tick 0: 0 % 2 == 0, fabricates
        assert_eq!(engine.graph.get(id).unwrap().output.get(stone()), 1);
        engine.step(&mut pool); // tick 1: gated
        assert_eq!(engine.graph.get(id).unwrap().output.get(stone()), 1);
        engine.step(&mut pool); // tick 2: fabricates
        assert_eq!(engine.graph.get(id).unwrap().output.get(stone()), 2);
    }

    #[test]
    fn starved_producer_is_silent() {
        let mut engine = test_engine();
        let carpenter = engine.registry.id_of("carpenter").unwrap();
        let id = engine.spawn(carpenter).unwrap();
        let mut pool = RecordingPool::new();
        engine.events.drain();

        engine.step(&mut pool);
        // No inputs, no output, no noise.
        assert!(engine.graph.get(id).unwrap().output.is_empty());
        assert!(engine.events.is_empty());
    }

    #[test]
    fn remove_emits_event_and_clears_edges() {
        let mut engine = test_engine();
        let mill = engine.spawn(engine.registry.id_of("sawmill").unwrap()).unwrap();
        let carpenter = engine.spawn(engine.registry.id_of("carpenter").unwrap()).unwrap();
        engine.refresh_recipients(mill, true, &[carpenter]).unwrap();
        assert_eq!(engine.graph.providers(carpenter), &[mill]);

        engine.remove(mill).unwrap();
        assert!(engine.graph.providers(carpenter).is_empty());
        assert!(engine
            .events
            .iter()
            .any(|e| matches!(e, Event::BuildingRemoved { building, .. } if *building == mill)));
        assert!(matches!(
            engine.remove(mill),
            Err(EngineError::Flow(FlowError::BuildingNotFound(_)))
        ));
    }

    #[test]
    fn construction_site_progress_events() {
        let mut engine = test_engine();
        let site_preset = engine.registry.id_of("construction-site").unwrap();
        let tower = engine.registry.id_of("tower").unwrap();
        let site = engine.spawn_construction(site_preset, tower).unwrap();
        let mut pool = RecordingPool::new();
        engine.events.drain();

        engine.step(&mut pool);
        let drained = engine.events.drain();
        assert!(drained.contains(&Event::ConstructionProgress {
            site,
            success: false,
            tick: 0
        }));
    }

    #[test]
    fn construction_completes_and_is_severed() {
        let mut engine = test_engine();
        let site_preset = engine.registry.id_of("construction-site").unwrap();
        let tower = engine.registry.id_of("tower").unwrap();
        let site = engine.spawn_construction(site_preset, tower).unwrap();

        // Tower build cost is {stone:5}; bank it directly.
        engine
            .graph
            .get_mut(site)
            .unwrap()
            .input
            .add(ResourceAmount::new(stone(), 5));

        let mut pool = RecordingPool::new();
        let result = engine.step(&mut pool);
        assert_eq!(
            result.completed,
            vec![CompletedConstruction { site, target: tower }]
        );
        assert!(!engine.graph.contains(site));
    }

    #[test]
    fn delivery_completion_credits_target() {
        let mut engine = test_engine();
        let site_preset = engine.registry.id_of("construction-site").unwrap();
        let tower = engine.registry.id_of("tower").unwrap();
        let quarry = engine.spawn(engine.registry.id_of("quarry").unwrap()).unwrap();
        let site = engine.spawn_construction(site_preset, tower).unwrap();

        let delivery = Delivery {
            source: quarry,
            target: site,
            payload: vec![ResourceAmount::new(stone(), 2)],
        };
        engine.graph.get_mut(site).unwrap().set_receiving(true);
        engine.complete_delivery(&delivery);

        let building = engine.graph.get(site).unwrap();
        assert_eq!(building.input.get(stone()), 2);
        assert!(!building.is_receiving());
    }

    #[test]
    fn delivery_abort_refunds_source() {
        let mut engine = test_engine();
        let quarry = engine.spawn(engine.registry.id_of("quarry").unwrap()).unwrap();
        let site_preset = engine.registry.id_of("construction-site").unwrap();
        let tower = engine.registry.id_of("tower").unwrap();
        let site = engine.spawn_construction(site_preset, tower).unwrap();
        engine.graph.get_mut(site).unwrap().set_receiving(true);

        let delivery = Delivery {
            source: quarry,
            target: site,
            payload: vec![ResourceAmount::new(stone(), 2)],
        };
        engine.abort_delivery(&delivery);

        assert_eq!(engine.graph.get(quarry).unwrap().output.get(stone()), 2);
        assert!(!engine.graph.get(site).unwrap().is_receiving());
    }

    #[test]
    fn delivery_to_vanished_target_is_swallowed() {
        let mut engine = test_engine();
        let quarry = engine.spawn(engine.registry.id_of("quarry").unwrap()).unwrap();
        let keep = engine.spawn(engine.registry.id_of("carpenter").unwrap()).unwrap();
        let delivery = Delivery {
            source: quarry,
            target: keep,
            payload: vec![ResourceAmount::new(stone(), 1)],
        };
        engine.remove(keep).unwrap();
        engine.complete_delivery(&delivery); // must not panic
    }

    #[test]
    fn tick_advances_once_per_step() {
        let mut engine = test_engine();
        let mut pool = RecordingPool::new();
        assert_eq!(engine.step(&mut pool).tick, 0);
        assert_eq!(engine.step(&mut pool).tick, 1);
        assert_eq!(engine.sim_state.tick, 2);
    }
}
