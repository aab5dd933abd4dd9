//! The `Movement` entity.

use std::fmt;

use tf_core::{EdgeId, LaneId, LightId, MovementId, PhaseId};

/// All lanes of `from_edge` that have at least one link onto `to_edge`.
///
/// Identified by the ordered `(from_edge, to_edge)` pair; a
/// [`MovementGraph`](crate::MovementGraph) holds at most one movement per
/// pair.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Movement {
    pub id:         MovementId,
    /// `"{from_edge}_{to_edge}"` using edge names.
    pub name:       String,
    pub from_edge:  EdgeId,
    pub to_edge:    EdgeId,
    /// Sorted, no duplicates.
    pub from_lanes: Vec<LaneId>,
    /// The light with a phase granting a link from one of `from_lanes`.
    pub light:      Option<LightId>,
    /// Phases of `light` that grant a link from one of `from_lanes`, in
    /// cycle order.
    pub phases:     Vec<PhaseId>,
}

impl Movement {
    /// `true` when no phase grants a link starting on any of this
    /// movement's lanes.
    #[inline]
    pub fn is_uncontrolled(&self) -> bool {
        self.light.is_none()
    }

    /// `true` if `phase` grants this movement.
    #[inline]
    pub fn granted_by(&self, phase: PhaseId) -> bool {
        self.phases.contains(&phase)
    }
}

impl fmt::Display for Movement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.light {
            Some(light) => write!(f, "Movement({}, {} lanes, {light})", self.name, self.from_lanes.len()),
            None        => write!(f, "Movement({}, {} lanes, uncontrolled)", self.name, self.from_lanes.len()),
        }
    }
}
