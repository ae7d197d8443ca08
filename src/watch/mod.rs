//! Periodic watch layer
//!
//! # Modules
//!
//! - [`orchestrator`]: one check cycle over all manifests and their dependencies
//! - [`server`]: tracing setup, collaborator wiring and the periodic loop

pub mod orchestrator;
pub mod server;

pub use orchestrator::{CheckError, CycleReport, Orchestrator, Outcome};
