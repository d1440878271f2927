//! Resource accounting.
//!
//! A [`ResourceLedger`] maps resource kinds to non-negative quantities.
//! A missing entry is canonically quantity zero; entries that drain to zero
//! are dropped so the two states are indistinguishable.
//!
//! Removal has a precondition: the caller must have verified sufficiency
//! via [`ResourceLedger::has_at_least`] (or `has_all`). Violating it is an
//! invariant breach and panics rather than clamping -- insufficiency is
//! checked-for steady state everywhere in the simulation, so an unchecked
//! removal is a bug in the caller, not a recoverable condition.

use crate::id::ResourceKindId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A quantity of a single resource kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceAmount {
    pub kind: ResourceKindId,
    pub quantity: u32,
}

impl ResourceAmount {
    pub fn new(kind: ResourceKindId, quantity: u32) -> Self {
        Self { kind, quantity }
    }
}

/// A mapping from resource kind to stored quantity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceLedger {
    contents: BTreeMap<ResourceKindId, u32>,
}

impl ResourceLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a ledger seeded with the given amounts.
    pub fn with_initial(initial: &[ResourceAmount]) -> Self {
        let mut ledger = Self::new();
        for amount in initial {
            ledger.add(*amount);
        }
        ledger
    }

    /// Add a resource amount, creating or incrementing the entry.
    pub fn add(&mut self, amount: ResourceAmount) {
        if amount.quantity == 0 {
            return;
        }
        *self.contents.entry(amount.kind).or_insert(0) += amount.quantity;
    }

    /// Add every amount in the slice.
    pub fn add_all(&mut self, amounts: &[ResourceAmount]) {
        for amount in amounts {
            self.add(*amount);
        }
    }

    /// Remove a resource amount.
    ///
    /// # Panics
    ///
    /// Panics if the ledger does not hold at least `amount.quantity` of
    /// `amount.kind`. Callers verify sufficiency first.
    pub fn remove(&mut self, amount: ResourceAmount) {
        if amount.quantity == 0 {
            return;
        }
        let stored = self.contents.get_mut(&amount.kind);
        let Some(stored) = stored else {
            panic!("ledger underflow: removing {:?} from empty entry", amount);
        };
        assert!(
            *stored >= amount.quantity,
            "ledger underflow: removing {} of {:?} but only {} stored",
            amount.quantity,
            amount.kind,
            stored
        );
        *stored -= amount.quantity;
        if *stored == 0 {
            self.contents.remove(&amount.kind);
        }
    }

    /// Remove every amount in the slice. Same precondition as [`remove`].
    ///
    /// [`remove`]: ResourceLedger::remove
    pub fn remove_all(&mut self, amounts: &[ResourceAmount]) {
        for amount in amounts {
            self.remove(*amount);
        }
    }

    /// Whether the ledger holds at least the given amount.
    /// A missing kind satisfies only a zero-quantity request.
    pub fn has_at_least(&self, amount: ResourceAmount) -> bool {
        self.get(amount.kind) >= amount.quantity
    }

    /// Whether [`has_at_least`] holds for every element.
    ///
    /// [`has_at_least`]: ResourceLedger::has_at_least
    pub fn has_all(&self, amounts: &[ResourceAmount]) -> bool {
        amounts.iter().all(|a| self.has_at_least(*a))
    }

    /// Stored quantity for a kind; 0 if absent.
    pub fn get(&self, kind: ResourceKindId) -> u32 {
        self.contents.get(&kind).copied().unwrap_or(0)
    }

    /// Whether the ledger holds nothing at all.
    pub fn is_empty(&self) -> bool {
        self.contents.is_empty()
    }

    /// Iterate over (kind, quantity) entries in kind order.
    pub fn iter(&self) -> impl Iterator<Item = (ResourceKindId, u32)> + '_ {
        self.contents.iter().map(|(&k, &q)| (k, q))
    }
}
