//! The delivery scheduler.
//!
//! Each transport attempt picks one recipient from the source's queue and
//! tries to dispatch a delivery agent toward it. The agent pool is an
//! external collaborator: acquisition is a synchronous capacity check that
//! either grants a handle or declines immediately.
//!
//! Queue discipline, per attempt:
//! - busy construction sites (delivery already in flight) rotate to the
//!   tail and the next recipient is tried, capped at the initial queue
//!   length so an all-busy queue is a no-op rather than a livelock;
//! - a recipient we cannot supply goes back to the *head*, to be retried
//!   at the next opportunity instead of starving at the tail;
//! - a declined agent acquisition also re-heads the recipient, with the
//!   attempt fully rolled back;
//! - a dispatched recipient goes to the *tail*: round-robin rotation.

use crate::event::{Event, EventLog};
use crate::flow::FlowGraph;
use crate::id::BuildingId;
use crate::ledger::ResourceAmount;
use crate::sim::Ticks;

/// An opaque handle to a delivery agent granted by the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AgentHandle(pub u32);

/// A delivery in flight: what is being carried, from where, to whom.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub source: BuildingId,
    pub target: BuildingId,
    pub payload: Vec<ResourceAmount>,
}

/// The external delivery agent pool.
///
/// `try_acquire` is a synchronous capacity check; `assign` hands a granted
/// agent its cargo and destination. The pool never mutates simulation
/// state -- travel, arrival, and failure are reported back to the engine
/// by the driver via `complete_delivery`/`abort_delivery`.
pub trait AgentPool {
    fn try_acquire(&mut self) -> Option<AgentHandle>;
    fn assign(&mut self, agent: AgentHandle, delivery: Delivery);
}

/// A capacity-limited agent pool. Handles are recycled on release.
#[derive(Debug)]
pub struct FixedAgentPool {
    capacity: u32,
    free: u32,
    next_handle: u32,
    dispatched: Vec<(AgentHandle, Delivery)>,
}

impl FixedAgentPool {
    pub fn new(capacity: u32) -> Self {
        Self {
            capacity,
            free: capacity,
            next_handle: 0,
            dispatched: Vec::new(),
        }
    }

    /// Return an agent to the pool once its delivery has resolved.
    pub fn release(&mut self, _agent: AgentHandle) {
        self.free = (self.free + 1).min(self.capacity);
    }

    /// Agents currently available.
    pub fn available(&self) -> u32 {
        self.free
    }

    /// Drain the deliveries assigned since the last drain.
    pub fn take_dispatched(&mut self) -> Vec<(AgentHandle, Delivery)> {
        std::mem::take(&mut self.dispatched)
    }
}

impl AgentPool for FixedAgentPool {
    fn try_acquire(&mut self) -> Option<AgentHandle> {
        if self.free == 0 {
            return None;
        }
        self.free -= 1;
        let handle = AgentHandle(self.next_handle);
        self.next_handle = self.next_handle.wrapping_add(1);
        Some(handle)
    }

    fn assign(&mut self, agent: AgentHandle, delivery: Delivery) {
        self.dispatched.push((agent, delivery));
    }
}

/// Run one transport attempt for `source`. See the module docs for the
/// queue discipline.
pub(crate) fn run_transport(
    graph: &mut FlowGraph,
    source: BuildingId,
    tick: Ticks,
    pool: &mut dyn AgentPool,
    events: &mut EventLog,
) {
    let mut attempts = graph.recipient_count(source);
    while attempts > 0 {
        attempts -= 1;
        let Some(recipient) = graph.dequeue_recipient(source) else {
            return;
        };
        // Symmetric cleanup on removal means stale ids should not appear;
        // dropping one here keeps the queue sane regardless.
        let Some(target) = graph.get(recipient) else {
            continue;
        };
        if target.is_receiving() {
            graph.enqueue_recipient(source, recipient);
            continue;
        }

        let shipment = compute_shipment(graph, source, recipient);
        if shipment.is_empty() {
            graph.requeue_recipient(source, recipient);
            return;
        }

        let Some(agent) = pool.try_acquire() else {
            // No capacity. Nothing was removed; retry next tick.
            graph.requeue_recipient(source, recipient);
            return;
        };

        if let Some(building) = graph.get_mut(source) {
            building.output.remove_all(&shipment);
        }
        if let Some(building) = graph.get_mut(recipient) {
            building.set_receiving(true);
        }
        pool.assign(
            agent,
            Delivery {
                source,
                target: recipient,
                payload: shipment,
            },
        );
        events.push(Event::DeliveryDispatched {
            source,
            target: recipient,
            tick,
        });
        graph.enqueue_recipient(source, recipient);
        return;
    }
}

/// The cross-section of what `recipient` requests and what `source` holds.
///
/// A kind qualifies if the source output holds at least one unit of it;
/// the shipped quantity is the requested amount capped by availability.
fn compute_shipment(
    graph: &FlowGraph,
    source: BuildingId,
    recipient: BuildingId,
) -> Vec<ResourceAmount> {
    let (Some(from), Some(to)) = (graph.get(source), graph.get(recipient)) else {
        return Vec::new();
    };
    let mut shipment = Vec::new();
    for want in to.requested() {
        let available = from.output.get(want.kind);
        if available > 0 {
            shipment.push(ResourceAmount::new(want.kind, want.quantity.min(available)));
        }
    }
    shipment
}
