use thiserror::Error;

use tf_core::{CoreError, EdgeId, MovementId};

#[derive(Debug, Error)]
pub enum MovementError {
    /// The road graph contradicts itself; the movement graph cannot be built.
    #[error("road graph inconsistency: {0}")]
    GraphConsistency(String),

    #[error("no movement from {from} to {to}")]
    MovementNotFound { from: EdgeId, to: EdgeId },

    #[error("unknown movement {0}")]
    UnknownMovement(MovementId),

    #[error(transparent)]
    Core(#[from] CoreError),
}

pub type MovementResult<T> = Result<T, MovementError>;
