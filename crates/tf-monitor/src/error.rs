use thiserror::Error;

use tf_core::{CoreError, EdgeId, VehicleId};
use tf_engine::{EngineError, EngineId};
use tf_movement::MovementError;

#[derive(Debug, Error)]
pub enum MonitorError {
    /// The engine reported a route that never visits the movement's origin
    /// edge although the vehicle is queued on it.
    #[error("route of vehicle {vehicle} does not contain {edge}")]
    RouteInconsistency { vehicle: VehicleId, edge: EdgeId },

    /// A vehicle arrived without a recorded departure.
    #[error("vehicle {vehicle} arrived without a recorded departure")]
    MissingDeparture { vehicle: VehicleId },

    #[error("monitor is already attached to {engine}")]
    AlreadyAttached { engine: EngineId },

    #[error("monitor is borrowed elsewhere")]
    Busy,

    #[error(transparent)]
    Movement(#[from] MovementError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Config(#[from] CoreError),
}

pub type MonitorResult<T> = Result<T, MonitorError>;
