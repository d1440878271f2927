//! Hamlet Core -- the production-logistics simulation for a grid-based
//! city/factory-builder.
//!
//! This crate is position-agnostic: buildings, resource ledgers, the
//! provider/recipient flow graph, the delivery scheduler, and the tick
//! engine. Geometry (tiles, roads, spatial search) lives in `hamlet-grid`,
//! which drives this crate through the engine's structural API.
//!
//! # Tick Pipeline
//!
//! Each call to [`engine::Engine::step`] advances the simulation one tick:
//!
//! 1. **Fabricate** -- buildings on their production cadence consume their
//!    recipe inputs and produce outputs atomically; construction sites that
//!    meet their build cost are reported for replacement.
//! 2. **Transport** -- buildings on their transport cadence pick one
//!    recipient from their queue and try to dispatch a delivery agent.
//! 3. **Bookkeeping** -- the tick counter advances.
//!
//! # Key Types
//!
//! - [`engine::Engine`] -- simulation orchestrator; owns the graph, the
//!   frozen preset registry, the clock, and the event log.
//! - [`flow::FlowGraph`] -- arena of buildings plus bidirectional
//!   provider/recipient bookkeeping.
//! - [`building::Building`] -- a production unit; [`building::Role`]
//!   distinguishes producers from construction sites.
//! - [`ledger::ResourceLedger`] -- non-negative resource accounting.
//! - [`transport::AgentPool`] -- contract with the external delivery
//!   agent pool.
//! - [`event::EventLog`] -- drain-style notifications for presentation.

pub mod building;
pub mod engine;
pub mod event;
pub mod flow;
pub mod id;
pub mod ledger;
pub mod registry;
pub mod sim;
pub mod transport;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
