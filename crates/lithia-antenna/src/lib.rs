//! # Lithia Antenna
//!
//! Antenna-rule checking and repair for routed designs: builds a wire
//! graph per net, evaluates PAR/PSR and cumulative CAR/CSR ratios
//! against per-layer rules, and repairs violations by inserting
//! protection diodes or layer-hopping jumpers.
//!
//! Checking parallelizes across nets; repair mutates the design and is
//! serialized. See [`AntennaRepair`] for the orchestration entry points
//! and [`AntennaChecker`] for standalone reporting.

pub mod checker;
pub mod config;
pub mod dsu;
pub mod error;
pub mod graph;
pub mod info;
mod jumper;
pub mod repair;

pub use checker::{AntennaChecker, DiodeRef, MAX_DIODE_COUNT_PER_GATE};
pub use config::RepairConfig;
pub use error::AntennaError;
pub use graph::WireGraph;
pub use info::{LayerInfo, Violation};
pub use repair::{AntennaRepair, PlacementLegalizer, RepairOutcome};
