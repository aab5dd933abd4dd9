//! The derived movement graph and its lookup tables.

use std::sync::Arc;

use rustc_hash::FxHashMap;

use tf_core::{CoreError, EdgeId, LaneId, LightId, MovementId, PhaseId};
use tf_road::RoadGraph;

use crate::{ConflictAnalyzer, Movement, MovementError, MovementResult};

/// Movements of a road graph plus lane, edge, light, and phase indices.
///
/// Built once by [`MovementGraphBuilder`](crate::MovementGraphBuilder) and
/// read-only afterwards, so it can be shared freely between estimators and
/// monitors.  Collection queries return an empty slice for ids the graph does
/// not know; single-entity queries return an error.
pub struct MovementGraph {
    pub(crate) road:      Arc<RoadGraph>,
    pub(crate) movements: Vec<Movement>,

    pub(crate) by_pair:  FxHashMap<(EdgeId, EdgeId), MovementId>,
    pub(crate) by_name:  FxHashMap<String, MovementId>,
    pub(crate) by_lane:  FxHashMap<LaneId, Vec<MovementId>>,
    pub(crate) by_edge:  FxHashMap<EdgeId, Vec<MovementId>>,
    pub(crate) by_light: FxHashMap<LightId, Vec<MovementId>>,
    pub(crate) by_phase: FxHashMap<PhaseId, Vec<MovementId>>,
}

impl MovementGraph {
    /// The road graph these movements were derived from.
    pub fn road(&self) -> &RoadGraph {
        &self.road
    }

    pub fn road_arc(&self) -> &Arc<RoadGraph> {
        &self.road
    }

    pub fn movements(&self) -> &[Movement] {
        &self.movements
    }

    pub fn len(&self) -> usize {
        self.movements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.movements.is_empty()
    }

    // ── Single movements ──────────────────────────────────────────────────

    pub fn get(&self, id: MovementId) -> MovementResult<&Movement> {
        self.movements.get(id.index()).ok_or(MovementError::UnknownMovement(id))
    }

    /// The movement from `from` to `to`.
    pub fn movement(&self, from: EdgeId, to: EdgeId) -> MovementResult<&Movement> {
        let id = self
            .by_pair
            .get(&(from, to))
            .ok_or(MovementError::MovementNotFound { from, to })?;
        self.get(*id)
    }

    /// Look a movement up by its `"{from}_{to}"` name.
    pub fn movement_by_name(&self, name: &str) -> MovementResult<&Movement> {
        let id = self.by_name.get(name).ok_or_else(|| CoreError::NotFound {
            kind: "movement",
            name: name.to_owned(),
        })?;
        self.get(*id)
    }

    // ── Index lookups ─────────────────────────────────────────────────────

    /// Movements that `lane` feeds.  More than one for a shared lane.
    pub fn movements_of_lane(&self, lane: LaneId) -> &[MovementId] {
        self.by_lane.get(&lane).map(Vec::as_slice).unwrap_or_default()
    }

    /// Movements leaving `edge`, ordered by destination edge.
    pub fn movements_of_edge(&self, edge: EdgeId) -> &[MovementId] {
        self.by_edge.get(&edge).map(Vec::as_slice).unwrap_or_default()
    }

    /// Movements granted by some phase of `light`.
    pub fn movements_of_light(&self, light: LightId) -> &[MovementId] {
        self.by_light.get(&light).map(Vec::as_slice).unwrap_or_default()
    }

    /// Movements granted while `phase` is active.
    pub fn movements_of_phase(&self, phase: PhaseId) -> &[MovementId] {
        self.by_phase.get(&phase).map(Vec::as_slice).unwrap_or_default()
    }

    // ── Topology ──────────────────────────────────────────────────────────

    /// Movements starting on `id`'s destination edge.
    pub fn downstream_movements(&self, id: MovementId) -> MovementResult<&[MovementId]> {
        let m = self.get(id)?;
        Ok(self.movements_of_edge(m.to_edge))
    }

    /// Movements leaving any edge that enters the junction `id` starts from,
    /// grouped by incoming edge in the junction's order.  Includes movements
    /// that do not end on `id`'s origin edge.
    pub fn upstream_movements(&self, id: MovementId) -> MovementResult<Vec<MovementId>> {
        let m = self.get(id)?;
        let Some(origin) = self.road.edge(m.from_edge).and_then(|e| self.road.junction(e.from)) else {
            return Ok(Vec::new());
        };
        Ok(origin
            .incoming
            .iter()
            .flat_map(|&e| self.movements_of_edge(e).iter().copied())
            .collect())
    }

    /// Shorthand for [`ConflictAnalyzer::conflicts_of`].
    pub fn conflicting_movements(&self, id: MovementId) -> MovementResult<Vec<MovementId>> {
        ConflictAnalyzer::new(self).conflicts_of(id)
    }
}

/// Structural equality: same movements and same indices.  The road graph
/// itself is not compared.
impl PartialEq for MovementGraph {
    fn eq(&self, other: &Self) -> bool {
        self.movements == other.movements
            && self.by_pair == other.by_pair
            && self.by_name == other.by_name
            && self.by_lane == other.by_lane
            && self.by_edge == other.by_edge
            && self.by_light == other.by_light
            && self.by_phase == other.by_phase
    }
}

impl std::fmt::Debug for MovementGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MovementGraph")
            .field("movements", &self.movements.len())
            .field("lights", &self.by_light.len())
            .field("phases", &self.by_phase.len())
            .finish()
    }
}

impl std::fmt::Display for MovementGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let controlled = self.movements.iter().filter(|m| !m.is_uncontrolled()).count();
        write!(
            f,
            "MovementGraph({} movements, {} signal-controlled)",
            self.movements.len(),
            controlled,
        )
    }
}
