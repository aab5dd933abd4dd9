//! `tf-engine` — the boundary between the traffic-flow core and a running
//! microsimulation.
//!
//! # Step cycle
//!
//! ```text
//! Simulation::step():
//!   ① engine.advance()        — vehicles move, departures/arrivals recorded
//!   ② for listener in order:  — registered via Simulation::on_step
//!        listener.on_step(&engine)
//!   ③ first listener error, if any, is returned after all listeners ran
//! ```
//!
//! # Modules
//!
//! | Module         | Contents                                               |
//! |----------------|--------------------------------------------------------|
//! | [`engine`]     | `TrafficEngine` trait, `VehicleInfo`, `EngineId`       |
//! | [`simulation`] | `Simulation` host, `StepListener`, `SharedListener`    |
//! | [`replay`]     | `ReplayEngine`, `StepFrame`                            |
//! | [`loader`]     | CSV frame loader for `ReplayEngine`                    |
//! | [`error`]      | `EngineError`, `SimulationError`                       |
//!
//! Concrete bindings to external simulators implement [`TrafficEngine`] in
//! their own crates; nothing here depends on a particular simulator.

pub mod engine;
pub mod error;
pub mod loader;
pub mod replay;
pub mod simulation;

#[cfg(test)]
mod tests;

pub use engine::{EngineId, TrafficEngine, VehicleInfo};
pub use error::{EngineError, EngineResult, SimulationError, SimulationResult};
pub use loader::{load_frames_csv, load_frames_reader};
pub use replay::{ReplayEngine, StepFrame};
pub use simulation::{ListenerError, SharedListener, Simulation, StepListener};
