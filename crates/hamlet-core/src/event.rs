//! Presentation-facing notifications.
//!
//! The simulation records what happened; the presentation layer drains the
//! log and redraws connection lines, progress bars, and the like. Strictly
//! observational -- nothing here feeds back into simulation state.

use crate::id::{BuildingId, PresetId};
use crate::sim::Ticks;

/// A simulation notification. All events carry the tick at which they
/// occurred.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    BuildingAdded {
        building: BuildingId,
        preset: PresetId,
        tick: Ticks,
    },
    BuildingRemoved {
        building: BuildingId,
        tick: Ticks,
    },
    /// A building's provider set changed (connection lines need redrawing).
    ProvidersChanged {
        building: BuildingId,
        tick: Ticks,
    },
    /// A building's recipient queue was recomputed.
    RecipientsChanged {
        building: BuildingId,
        tick: Ticks,
    },
    /// A delivery agent was dispatched from `source` to `target`.
    DeliveryDispatched {
        source: BuildingId,
        target: BuildingId,
        tick: Ticks,
    },
    /// A construction site attempted fabrication. Emitted on every attempt,
    /// success or not, so progress UI can react.
    ConstructionProgress {
        site: BuildingId,
        success: bool,
        tick: Ticks,
    },
    /// A construction site met its build cost.
    ConstructionCompleted {
        site: BuildingId,
        target: PresetId,
        tick: Ticks,
    },
}

/// An append-only log of [`Event`]s, drained by the presentation layer.
#[derive(Debug, Default)]
pub struct EventLog {
    events: Vec<Event>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: Event) {
        self.events.push(event);
    }

    /// Drain all recorded events, oldest first.
    pub fn drain(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    /// Peek at recorded events without draining.
    pub fn iter(&self) -> impl Iterator<Item = &Event> {
        self.events.iter()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
