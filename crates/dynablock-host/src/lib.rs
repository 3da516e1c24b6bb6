//! Reference host document for Dynablock.
//!
//! [`SimulatedDocument`] implements the host boundary with plain data:
//! definitions, placed instances and loose curves. The CLI persists it next to
//! the registry; tests use its fault injection to exercise failure paths.

pub mod simulated;

pub use simulated::{Faults, InstanceDefinition, SimulatedDocument};
