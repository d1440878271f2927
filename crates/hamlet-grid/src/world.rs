//! The world: a tile grid and a core engine kept in lockstep.
//!
//! The core engine is position-agnostic; this module owns the mapping
//! between grid positions and building ids and feeds the engine the two
//! spatial facts it needs: whether a building touches road, and which
//! other buildings sit within its interaction radius (nearest first).
//! Any structural edit re-derives every building's links from scratch,
//! so the flow graph never drifts from the grid.

use std::collections::BTreeMap;

use hamlet_core::engine::{Engine, EngineError};
use hamlet_core::id::{BuildingId, PresetId};
use hamlet_core::registry::PresetRegistry;
use hamlet_core::sim::StepResult;
use hamlet_core::transport::{AgentPool, Delivery};
use slotmap::SecondaryMap;
use thiserror::Error;

use crate::road::RoadPiece;
use crate::tile::{GridError, RetileEvent, TileContent, TileGrid};
use crate::GridPosition;

/// Errors from world-level placement and removal.
#[derive(Debug, Error)]
pub enum WorldError {
    #[error(transparent)]
    Grid(#[from] GridError),
    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// A simulation world on a bounded grid.
#[derive(Debug)]
pub struct World {
    /// The core engine. Exposed so drivers can read the graph, drain
    /// events, and resolve deliveries.
    pub engine: Engine,
    grid: TileGrid,
    /// Position -> building, iterated in position order wherever
    /// determinism matters.
    by_position: BTreeMap<GridPosition, BuildingId>,
    positions: SecondaryMap<BuildingId, GridPosition>,
    retiles: Vec<RetileEvent>,
}

impl World {
    pub fn new(width: u32, height: u32, registry: PresetRegistry) -> Self {
        Self {
            engine: Engine::new(registry),
            grid: TileGrid::new(width, height),
            by_position: BTreeMap::new(),
            positions: SecondaryMap::new(),
            retiles: Vec::new(),
        }
    }

    // -----------------------------------------------------------------------
    // Placement and removal
    // -----------------------------------------------------------------------

    /// Place a producer at a position and rebuild all links.
    pub fn place_building(
        &mut self,
        pos: GridPosition,
        preset: PresetId,
    ) -> Result<BuildingId, WorldError> {
        let id = self.engine.spawn(preset)?;
        self.index_placed(pos, id)?;
        Ok(id)
    }

    /// Place a construction site that becomes `target` once its build
    /// cost has been delivered.
    pub fn place_construction(
        &mut self,
        pos: GridPosition,
        site: PresetId,
        target: PresetId,
    ) -> Result<BuildingId, WorldError> {
        let id = self.engine.spawn_construction(site, target)?;
        self.index_placed(pos, id)?;
        Ok(id)
    }

    fn index_placed(&mut self, pos: GridPosition, id: BuildingId) -> Result<(), WorldError> {
        if let Err(err) = self.grid.place_building(pos, id) {
            // Roll back the spawn so the graph matches the grid.
            let _ = self.engine.remove(id);
            return Err(err.into());
        }
        self.by_position.insert(pos, id);
        self.positions.insert(id, pos);
        self.refresh_all_links();
        Ok(())
    }

    /// Place a road tile and rebuild all links (road access may have
    /// changed for adjacent buildings).
    pub fn place_road(&mut self, pos: GridPosition) -> Result<(), WorldError> {
        let events = self.grid.place_road(pos)?;
        self.retiles.extend(events);
        self.refresh_all_links();
        Ok(())
    }

    /// Clear whatever occupies a position. Buildings are removed from the
    /// engine with their edges; roads retile their surviving neighbours.
    pub fn remove_at(&mut self, pos: GridPosition) -> Result<(), WorldError> {
        let (content, events) = self.grid.remove_content(pos)?;
        self.retiles.extend(events);
        if let TileContent::Building(id) = content {
            self.by_position.remove(&pos);
            self.positions.remove(id);
            self.engine.remove(id)?;
        }
        self.refresh_all_links();
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Link discovery
    // -----------------------------------------------------------------------

    /// Re-derive every building's road access and recipient queue from
    /// the current grid. Buildings are visited in position order and
    /// candidates are handed over nearest first, so the result is a pure
    /// function of the grid contents.
    fn refresh_all_links(&mut self) {
        let units: Vec<(GridPosition, BuildingId)> =
            self.by_position.iter().map(|(&p, &id)| (p, id)).collect();

        for &(pos, id) in &units {
            let Some(building) = self.engine.graph.get(id) else {
                continue;
            };
            let radius = building.interaction_radius as u64;
            let reach = radius * radius;

            let mut in_range: Vec<(u64, BuildingId)> = units
                .iter()
                .filter(|&&(_, other)| other != id)
                .map(|&(other_pos, other)| (pos.distance_sq(&other_pos), other))
                .filter(|&(dist, _)| dist <= reach)
                .collect();
            // Stable sort: equidistant candidates keep position order.
            in_range.sort_by_key(|&(dist, _)| dist);
            let candidates: Vec<BuildingId> = in_range.into_iter().map(|(_, id)| id).collect();

            let road_access = self.grid.has_road_neighbour(pos);
            // `id` came from the live graph scan above.
            let _ = self.engine.refresh_recipients(id, road_access, &candidates);
        }
    }

    // -----------------------------------------------------------------------
    // Tick pipeline
    // -----------------------------------------------------------------------

    /// Advance the simulation one tick. Construction sites that finished
    /// are replaced in place by their target building, and links are
    /// rebuilt around the newcomer.
    pub fn step(&mut self, pool: &mut dyn AgentPool) -> StepResult {
        let result = self.engine.step(pool);

        let mut replaced = false;
        for completed in &result.completed {
            let Some(pos) = self.positions.remove(completed.site) else {
                continue;
            };
            self.by_position.remove(&pos);
            let Ok((_, events)) = self.grid.remove_content(pos) else {
                continue;
            };
            self.retiles.extend(events);

            // The target preset was validated when the site was placed.
            let Ok(new_id) = self.engine.spawn(completed.target) else {
                continue;
            };
            if self.grid.place_building(pos, new_id).is_ok() {
                self.by_position.insert(pos, new_id);
                self.positions.insert(new_id, pos);
                replaced = true;
            }
        }
        if replaced {
            self.refresh_all_links();
        }

        result
    }

    /// Forward a completed delivery to the engine.
    pub fn complete_delivery(&mut self, delivery: &Delivery) {
        self.engine.complete_delivery(delivery);
    }

    /// Forward a failed delivery to the engine.
    pub fn abort_delivery(&mut self, delivery: &Delivery) {
        self.engine.abort_delivery(delivery);
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn building_at(&self, pos: GridPosition) -> Option<BuildingId> {
        self.by_position.get(&pos).copied()
    }

    pub fn position_of(&self, building: BuildingId) -> Option<GridPosition> {
        self.positions.get(building).copied()
    }

    pub fn road_at(&self, pos: GridPosition) -> Option<RoadPiece> {
        match self.grid.get(pos)?.content {
            Some(TileContent::Road(piece)) => Some(piece),
            _ => None,
        }
    }

    /// Drain the accumulated road-appearance changes.
    pub fn drain_retiles(&mut self) -> Vec<RetileEvent> {
        std::mem::take(&mut self.retiles)
    }
}
