use thiserror::Error;

use tf_core::{LightId, VehicleId};

use crate::ListenerError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("vehicle {0} is not known to the engine")]
    VehicleNotFound(VehicleId),

    #[error("unknown traffic light {0}")]
    UnknownLight(LightId),

    #[error("phase index {index} out of range for {light} ({count} phases)")]
    PhaseOutOfRange { light: LightId, index: u32, count: usize },

    #[error("no more recorded steps after {steps}")]
    Exhausted { steps: usize },

    #[error("unknown {kind} name {name:?}")]
    UnknownName { kind: &'static str, name: String },

    #[error("replay parse error: {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

pub type EngineResult<T> = Result<T, EngineError>;

#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("step listener failed: {0}")]
    Listener(ListenerError),

    #[error("step listener #{0} is already borrowed")]
    ListenerBusy(usize),
}

pub type SimulationResult<T> = Result<T, SimulationError>;
