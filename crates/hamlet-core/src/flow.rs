//! The flow graph: buildings and their provider/recipient relationships.
//!
//! Buildings live in an arena (`SlotMap`); provider sets and recipient
//! queues are back-references stored per building in a `SecondaryMap`,
//! keyed by the same arena keys so they can never outlive their building.
//!
//! # Symmetry invariant
//!
//! For every pair (A, B): A is in B's provider set exactly when B is in A's
//! recipient queue. Every mutation here maintains that invariant pairwise;
//! removal severs all edges symmetrically before the arena slot is freed,
//! so no stale reference survives a destruction.

use crate::building::Building;
use crate::event::{Event, EventLog};
use crate::id::BuildingId;
use crate::sim::Ticks;
use slotmap::{SecondaryMap, SlotMap};
use std::collections::VecDeque;

/// Errors from flow-graph operations.
#[derive(Debug, thiserror::Error)]
pub enum FlowError {
    #[error("building not found: {0:?}")]
    BuildingNotFound(BuildingId),
}

/// Per-building adjacency: who delivers to us, whom we deliver to.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub(crate) struct Links {
    /// Buildings that may deliver to this one. No duplicates.
    pub(crate) providers: Vec<BuildingId>,
    /// Buildings this one delivers to, in FIFO-with-front-reinsertion
    /// order. Holds each recipient at most once.
    pub(crate) recipients: VecDeque<BuildingId>,
}

/// The directed resource-flow graph between buildings.
#[derive(Debug, Default)]
pub struct FlowGraph {
    pub(crate) buildings: SlotMap<BuildingId, Building>,
    pub(crate) links: SecondaryMap<BuildingId, Links>,
}

impl FlowGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a building. Returns its arena key.
    pub fn insert(&mut self, building: Building) -> BuildingId {
        let id = self.buildings.insert(building);
        self.links.insert(id, Links::default());
        id
    }

    /// Remove a building, severing every edge symmetrically first.
    /// Returns the removed building, or `None` if the id was stale.
    pub fn remove(&mut self, id: BuildingId) -> Option<Building> {
        let links = self.links.remove(id)?;
        for provider in &links.providers {
            if let Some(other) = self.links.get_mut(*provider) {
                other.recipients.retain(|&r| r != id);
            }
        }
        for recipient in &links.recipients {
            if let Some(other) = self.links.get_mut(*recipient) {
                other.providers.retain(|&p| p != id);
            }
        }
        self.buildings.remove(id)
    }

    pub fn contains(&self, id: BuildingId) -> bool {
        self.buildings.contains_key(id)
    }

    pub fn get(&self, id: BuildingId) -> Option<&Building> {
        self.buildings.get(id)
    }

    pub fn get_mut(&mut self, id: BuildingId) -> Option<&mut Building> {
        self.buildings.get_mut(id)
    }

    /// Number of buildings in the graph.
    pub fn len(&self) -> usize {
        self.buildings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buildings.is_empty()
    }

    /// All building ids in arena order. Deterministic for a given history
    /// of insertions and removals.
    pub fn ids(&self) -> Vec<BuildingId> {
        self.buildings.keys().collect()
    }

    /// The buildings that deliver to `id`.
    pub fn providers(&self, id: BuildingId) -> &[BuildingId] {
        self.links
            .get(id)
            .map(|l| l.providers.as_slice())
            .unwrap_or(&[])
    }

    /// The recipient queue of `id`, front first.
    pub fn recipients(&self, id: BuildingId) -> impl Iterator<Item = BuildingId> + '_ {
        self.links
            .get(id)
            .into_iter()
            .flat_map(|l| l.recipients.iter().copied())
    }

    /// Recompute the recipient queue for `unit`.
    ///
    /// `road_access` is whether any tile adjacent to the unit carries road
    /// content; without it the unit has no recipients and any stale ones
    /// are cleared. `candidates` must arrive sorted ascending by distance
    /// with a deterministic tie-break -- the spatial search itself belongs
    /// to the grid layer.
    ///
    /// Eligible candidates are pushed onto the *front* of the queue in
    /// candidate order, so the most recently recomputed neighbours get the
    /// next transport attempt first. The unit is added to each eligible
    /// candidate's provider set (idempotently).
    pub fn refresh_recipients(
        &mut self,
        unit: BuildingId,
        road_access: bool,
        candidates: &[BuildingId],
        tick: Ticks,
        events: &mut EventLog,
    ) -> Result<(), FlowError> {
        let produced = self
            .buildings
            .get(unit)
            .ok_or(FlowError::BuildingNotFound(unit))?
            .produced()
            .to_vec();

        // Sever the old edges first; eligible candidates are re-linked
        // below. Tracks whose provider set actually changed for events.
        let old: Vec<BuildingId> = self
            .links
            .get_mut(unit)
            .map(|l| l.recipients.drain(..).collect())
            .unwrap_or_default();
        let mut provider_changes: Vec<BuildingId> = Vec::new();
        for recipient in old {
            if let Some(other) = self.links.get_mut(recipient) {
                let before = other.providers.len();
                other.providers.retain(|&p| p != unit);
                if other.providers.len() != before {
                    provider_changes.push(recipient);
                }
            }
        }

        if road_access {
            for &candidate in candidates {
                if candidate == unit {
                    continue;
                }
                let Some(building) = self.buildings.get(candidate) else {
                    continue;
                };
                if !building.recipe.wants_any_of(&produced) {
                    continue;
                }
                let Some(links) = self.links.get_mut(candidate) else {
                    continue;
                };
                if !links.providers.contains(&unit) {
                    links.providers.push(unit);
                    if !provider_changes.contains(&candidate) {
                        provider_changes.push(candidate);
                    }
                }
                if let Some(own) = self.links.get_mut(unit)
                    && !own.recipients.contains(&candidate)
                {
                    own.recipients.push_front(candidate);
                }
            }
        }

        for building in provider_changes {
            events.push(Event::ProvidersChanged { building, tick });
        }
        events.push(Event::RecipientsChanged {
            building: unit,
            tick,
        });
        Ok(())
    }

    // -- Queue primitives used by the delivery scheduler --

    pub(crate) fn dequeue_recipient(&mut self, unit: BuildingId) -> Option<BuildingId> {
        self.links.get_mut(unit)?.recipients.pop_front()
    }

    /// Re-insert at the head: retried at the next opportunity.
    pub(crate) fn requeue_recipient(&mut self, unit: BuildingId, recipient: BuildingId) {
        if let Some(links) = self.links.get_mut(unit) {
            links.recipients.push_front(recipient);
        }
    }

    /// Enqueue at the tail: round-robin rotation.
    pub(crate) fn enqueue_recipient(&mut self, unit: BuildingId, recipient: BuildingId) {
        if let Some(links) = self.links.get_mut(unit) {
            links.recipients.push_back(recipient);
        }
    }

    pub(crate) fn recipient_count(&self, unit: BuildingId) -> usize {
        self.links.get(unit).map(|l| l.recipients.len()).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::building::Building;
    use crate::id::PresetId;
    use crate::test_utils::*;

    fn graph_with(buildings: Vec<Building>) -> (FlowGraph, Vec<BuildingId>) {
        let mut graph = FlowGraph::new();
        let ids = buildings.into_iter().map(|b| graph.insert(b)).collect();
        (graph, ids)
    }

    fn producer(preset: &crate::registry::BuildingPreset) -> Building {
        Building::producer(PresetId(0), preset)
    }

    #[test]
    fn insert_and_lookup() {
        let (graph, ids) = graph_with(vec![producer(&sawmill_preset())]);
        assert!(graph.contains(ids[0]));
        assert_eq!(graph.len(), 1);
        assert!(graph.providers(ids[0]).is_empty());
        assert_eq!(graph.recipients(ids[0]).count(), 0);
    }

    #[test]
    fn refresh_links_eligible_candidates() {
        // A sawmill produces planks; the carpenter wants planks, the mine
        // wants nothing the sawmill makes.
        let (mut graph, ids) = graph_with(vec![
            producer(&sawmill_preset()),
            producer(&carpenter_preset()),
            producer(&mine_preset()),
        ]);
        let (mill, carpenter, mine) = (ids[0], ids[1], ids[2]);

        let mut events = EventLog::new();
        graph
            .refresh_recipients(mill, true, &[carpenter, mine], 0, &mut events)
            .unwrap();

        let recipients: Vec<_> = graph.recipients(mill).collect();
        assert_eq!(recipients, vec![carpenter]);
        assert_eq!(graph.providers(carpenter), &[mill]);
        assert!(graph.providers(mine).is_empty());
    }

    #[test]
    fn refresh_without_road_clears_stale_edges() {
        let (mut graph, ids) = graph_with(vec![
            producer(&sawmill_preset()),
            producer(&carpenter_preset()),
        ]);
        let (mill, carpenter) = (ids[0], ids[1]);
        let mut events = EventLog::new();

        graph
            .refresh_recipients(mill, true, &[carpenter], 0, &mut events)
            .unwrap();
        assert_eq!(graph.recipients(mill).count(), 1);

        // Road torn down: recipients cleared and the back-reference too.
        graph
            .refresh_recipients(mill, false, &[carpenter], 1, &mut events)
            .unwrap();
        assert_eq!(graph.recipients(mill).count(), 0);
        assert!(graph.providers(carpenter).is_empty());
    }

    #[test]
    fn refresh_front_inserts_in_candidate_order() {
        // Candidates arrive closest-first; each is pushed to the front, so
        // the head of the queue ends up being the farthest eligible one.
        let (mut graph, ids) = graph_with(vec![
            producer(&sawmill_preset()),
            producer(&carpenter_preset()),
            producer(&carpenter_preset()),
        ]);
        let (mill, near, far) = (ids[0], ids[1], ids[2]);
        let mut events = EventLog::new();

        graph
            .refresh_recipients(mill, true, &[near, far], 0, &mut events)
            .unwrap();

        let recipients: Vec<_> = graph.recipients(mill).collect();
        assert_eq!(recipients, vec![far, near]);
    }

    #[test]
    fn refresh_is_idempotent() {
        let (mut graph, ids) = graph_with(vec![
            producer(&sawmill_preset()),
            producer(&carpenter_preset()),
        ]);
        let (mill, carpenter) = (ids[0], ids[1]);
        let mut events = EventLog::new();

        for tick in 0..3 {
            graph
                .refresh_recipients(mill, true, &[carpenter], tick, &mut events)
                .unwrap();
        }
        assert_eq!(graph.recipients(mill).count(), 1);
        assert_eq!(graph.providers(carpenter), &[mill]);
    }

    #[test]
    fn refresh_skips_self() {
        let (mut graph, ids) = graph_with(vec![producer(&sawmill_preset())]);
        let mill = ids[0];
        let mut events = EventLog::new();
        graph
            .refresh_recipients(mill, true, &[mill], 0, &mut events)
            .unwrap();
        assert_eq!(graph.recipients(mill).count(), 0);
    }

    #[test]
    fn refresh_unknown_unit_errors() {
        let (mut graph, ids) = graph_with(vec![producer(&sawmill_preset())]);
        let stale = ids[0];
        graph.remove(stale);
        let mut events = EventLog::new();
        assert!(matches!(
            graph.refresh_recipients(stale, true, &[], 0, &mut events),
            Err(FlowError::BuildingNotFound(_))
        ));
    }

    #[test]
    fn edge_symmetry_holds() {
        let (mut graph, ids) = graph_with(vec![
            producer(&sawmill_preset()),
            producer(&sawmill_preset()),
            producer(&carpenter_preset()),
        ]);
        let mut events = EventLog::new();
        graph
            .refresh_recipients(ids[0], true, &[ids[2]], 0, &mut events)
            .unwrap();
        graph
            .refresh_recipients(ids[1], true, &[ids[2]], 0, &mut events)
            .unwrap();

        // A in B.providers <=> B in A.recipients, for all pairs.
        for &a in &ids {
            for &b in &ids {
                let forward = graph.recipients(a).any(|r| r == b);
                let backward = graph.providers(b).contains(&a);
                assert_eq!(forward, backward, "asymmetric edge {a:?} -> {b:?}");
            }
        }
    }

    #[test]
    fn remove_severs_all_edges() {
        let (mut graph, ids) = graph_with(vec![
            producer(&sawmill_preset()),
            producer(&sawmill_preset()),
            producer(&carpenter_preset()),
        ]);
        let (mill_a, mill_b, carpenter) = (ids[0], ids[1], ids[2]);
        let mut events = EventLog::new();
        graph
            .refresh_recipients(mill_a, true, &[carpenter], 0, &mut events)
            .unwrap();
        graph
            .refresh_recipients(mill_b, true, &[carpenter], 0, &mut events)
            .unwrap();
        assert_eq!(graph.providers(carpenter).len(), 2);

        // Destroying the carpenter strips it from both mills' queues.
        assert!(graph.remove(carpenter).is_some());
        assert_eq!(graph.recipients(mill_a).count(), 0);
        assert_eq!(graph.recipients(mill_b).count(), 0);

        // Destroying a provider strips it from recipient provider sets.
        graph
            .refresh_recipients(mill_a, true, &[mill_b], 0, &mut events)
            .unwrap();
        // mill_b wants nothing mill_a makes, so no edge formed; rebuild a
        // real edge via a fresh carpenter instead.
        let carpenter = graph.insert(producer(&carpenter_preset()));
        graph
            .refresh_recipients(mill_a, true, &[carpenter], 0, &mut events)
            .unwrap();
        assert_eq!(graph.providers(carpenter), &[mill_a]);
        graph.remove(mill_a);
        assert!(graph.providers(carpenter).is_empty());
    }

    #[test]
    fn remove_stale_id_is_none() {
        let (mut graph, ids) = graph_with(vec![producer(&sawmill_preset())]);
        assert!(graph.remove(ids[0]).is_some());
        assert!(graph.remove(ids[0]).is_none());
    }

    #[test]
    fn refresh_emits_change_events() {
        let (mut graph, ids) = graph_with(vec![
            producer(&sawmill_preset()),
            producer(&carpenter_preset()),
        ]);
        let (mill, carpenter) = (ids[0], ids[1]);
        let mut events = EventLog::new();
        graph
            .refresh_recipients(mill, true, &[carpenter], 7, &mut events)
            .unwrap();

        let drained = events.drain();
        assert!(drained.contains(&Event::ProvidersChanged {
            building: carpenter,
            tick: 7
        }));
        assert!(drained.contains(&Event::RecipientsChanged {
            building: mill,
            tick: 7
        }));
    }
}
