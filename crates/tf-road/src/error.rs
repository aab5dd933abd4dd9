//! Road-graph consistency errors.

use thiserror::Error;

use tf_core::{EdgeId, JunctionId, LaneId, LightId, LinkId};

/// Errors produced while assembling a [`RoadGraph`](crate::RoadGraph).
///
/// Every variant means the supplied network is malformed or incomplete; a
/// graph that fails to build must not be used.
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("edge {edge:?} references unknown junction {junction}")]
    UnknownJunction { edge: String, junction: JunctionId },

    #[error("lane {lane:?} references unknown edge {edge}")]
    UnknownEdge { lane: String, edge: EdgeId },

    #[error("lane link references unknown lane {0}")]
    UnknownLane(LaneId),

    #[error("traffic light {light:?} references unknown lane link {link}")]
    UnknownLink { light: String, link: LinkId },

    #[error("phase references unknown traffic light {0}")]
    UnknownLight(LightId),

    #[error("duplicate {kind} name {name:?}")]
    DuplicateName { kind: &'static str, name: String },

    #[error("lane link {from_lane:?} -> {to_lane:?} does not connect through a single junction")]
    DisconnectedLink { from_lane: String, to_lane: String },

    #[error("phase {phase} of light {light:?} grants link {link} which the light does not control")]
    UncontrolledGrant { light: String, phase: u32, link: LinkId },
}

pub type GraphResult<T> = Result<T, GraphError>;
