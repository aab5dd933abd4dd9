//! Phase-based conflict relation between movements.
//!
//! Two movements conflict when the same light controls both and none of its
//! phases grants them together.  The relation is symmetric and irreflexive
//! but not transitive, so it is evaluated pair by pair instead of being
//! partitioned into compatibility classes.

use tf_core::MovementId;

use crate::{Movement, MovementGraph, MovementResult};

/// Read-only conflict queries over a [`MovementGraph`].
#[derive(Clone, Copy)]
pub struct ConflictAnalyzer<'g> {
    graph: &'g MovementGraph,
}

impl<'g> ConflictAnalyzer<'g> {
    pub fn new(graph: &'g MovementGraph) -> Self {
        Self { graph }
    }

    /// Every other movement of `id`'s light that can never be green together
    /// with it.  Empty for an uncontrolled movement.
    pub fn conflicts_of(&self, id: MovementId) -> MovementResult<Vec<MovementId>> {
        let target = self.graph.get(id)?;
        let Some(light) = target.light else {
            return Ok(Vec::new());
        };
        let mut out = Vec::new();
        for &other in self.graph.movements_of_light(light) {
            if other != id && !share_phase(target, self.graph.get(other)?) {
                out.push(other);
            }
        }
        Ok(out)
    }

    /// `true` if `a` and `b` are distinct movements of one light that no
    /// phase grants together.
    pub fn are_conflicting(&self, a: MovementId, b: MovementId) -> MovementResult<bool> {
        let ma = self.graph.get(a)?;
        let mb = self.graph.get(b)?;
        Ok(a != b && ma.light.is_some() && ma.light == mb.light && !share_phase(ma, mb))
    }
}

fn share_phase(a: &Movement, b: &Movement) -> bool {
    a.phases.iter().any(|p| b.phases.contains(p))
}
