//! The assembled road graph.
//!
//! # Data layout
//!
//! Each entity kind lives in its own arena `Vec`, indexed by its typed id:
//!
//! ```text
//! junctions[JunctionId]  edges[EdgeId]  lanes[LaneId]
//! links[LinkId]          lights[LightId] phases[PhaseId]
//! ```
//!
//! Cross references are ids, so lookups are O(1) and the structure is free of
//! ownership cycles.  Engines and loaders address entities by name; the name
//! index maps those strings back to ids.
//!
//! # Spatial index
//!
//! An R-tree (via `rstar`) maps planar `(x, y)` positions to the nearest
//! junction, used to match detector or probe coordinates to the network.

use rstar::{PointDistance, RTree, RTreeObject, AABB};
use rustc_hash::{FxHashMap, FxHashSet};

use tf_core::{EdgeId, JunctionId, LaneId, LightId, LinkId, PhaseId, Point};

use crate::entity::{Edge, Junction, Lane, LaneLink, TrafficLight, TrafficLightPhase};

// ── R-tree junction entry ─────────────────────────────────────────────────────

#[derive(Clone)]
pub(crate) struct JunctionEntry {
    pub(crate) point: [f64; 2],
    pub(crate) id:    JunctionId,
}

impl RTreeObject for JunctionEntry {
    type Envelope = AABB<[f64; 2]>;
    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.point)
    }
}

impl PointDistance for JunctionEntry {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.point[0] - point[0];
        let dy = self.point[1] - point[1];
        dx * dx + dy * dy
    }
}

// ── Name index ────────────────────────────────────────────────────────────────

#[derive(Default)]
pub(crate) struct NameIndex {
    pub(crate) junctions: FxHashMap<String, JunctionId>,
    pub(crate) edges:     FxHashMap<String, EdgeId>,
    pub(crate) lanes:     FxHashMap<String, LaneId>,
    pub(crate) lights:    FxHashMap<String, LightId>,
}

// ── RoadGraph ─────────────────────────────────────────────────────────────────

/// Immutable lane-level road graph.
///
/// The arena vectors are `pub` for direct indexed access.  Do not construct
/// directly; use [`RoadGraphBuilder`](crate::RoadGraphBuilder), which
/// validates every cross reference.
pub struct RoadGraph {
    pub junctions: Vec<Junction>,
    pub edges:     Vec<Edge>,
    pub lanes:     Vec<Lane>,
    pub links:     Vec<LaneLink>,
    pub lights:    Vec<TrafficLight>,
    pub phases:    Vec<TrafficLightPhase>,

    pub(crate) names:       NameIndex,
    pub(crate) spatial_idx: RTree<JunctionEntry>,
}

impl RoadGraph {
    /// A graph with no entities at all.
    pub fn empty() -> Self {
        Self {
            junctions:   Vec::new(),
            edges:       Vec::new(),
            lanes:       Vec::new(),
            links:       Vec::new(),
            lights:      Vec::new(),
            phases:      Vec::new(),
            names:       NameIndex::default(),
            spatial_idx: RTree::new(),
        }
    }

    // ── Dimensions ────────────────────────────────────────────────────────

    pub fn junction_count(&self) -> usize { self.junctions.len() }
    pub fn edge_count(&self) -> usize { self.edges.len() }
    pub fn lane_count(&self) -> usize { self.lanes.len() }
    pub fn link_count(&self) -> usize { self.links.len() }
    pub fn light_count(&self) -> usize { self.lights.len() }

    pub fn is_empty(&self) -> bool {
        self.junctions.is_empty()
    }

    // ── Entity lookup by id ───────────────────────────────────────────────

    #[inline]
    pub fn junction(&self, id: JunctionId) -> Option<&Junction> {
        self.junctions.get(id.index())
    }

    #[inline]
    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.get(id.index())
    }

    #[inline]
    pub fn lane(&self, id: LaneId) -> Option<&Lane> {
        self.lanes.get(id.index())
    }

    #[inline]
    pub fn link(&self, id: LinkId) -> Option<&LaneLink> {
        self.links.get(id.index())
    }

    #[inline]
    pub fn light(&self, id: LightId) -> Option<&TrafficLight> {
        self.lights.get(id.index())
    }

    #[inline]
    pub fn phase(&self, id: PhaseId) -> Option<&TrafficLightPhase> {
        self.phases.get(id.index())
    }

    /// The edge a lane belongs to.
    #[inline]
    pub fn lane_edge(&self, lane: LaneId) -> Option<EdgeId> {
        self.lane(lane).map(|l| l.edge)
    }

    /// Phase number `index` of `light`, in cycle order.
    pub fn light_phase(&self, light: LightId, index: u32) -> Option<&TrafficLightPhase> {
        let id = *self.light(light)?.phases.get(index as usize)?;
        self.phase(id)
    }

    /// Iterator over the phases of `light` in cycle order.  Empty for an
    /// unknown light.
    pub fn phases_of(&self, light: LightId) -> impl Iterator<Item = &TrafficLightPhase> + '_ {
        self.light(light)
            .map(|l| l.phases.as_slice())
            .unwrap_or_default()
            .iter()
            .filter_map(|&p| self.phase(p))
    }

    // ── Entity lookup by name ─────────────────────────────────────────────

    pub fn junction_id(&self, name: &str) -> Option<JunctionId> {
        self.names.junctions.get(name).copied()
    }

    pub fn edge_id(&self, name: &str) -> Option<EdgeId> {
        self.names.edges.get(name).copied()
    }

    pub fn lane_id(&self, name: &str) -> Option<LaneId> {
        self.names.lanes.get(name).copied()
    }

    pub fn light_id(&self, name: &str) -> Option<LightId> {
        self.names.lights.get(name).copied()
    }

    // ── Derived queries ───────────────────────────────────────────────────

    /// Controlled links of `light` that no phase ever grants.
    ///
    /// Computed on first request and cached for the life of the graph.  Links
    /// are compared by their `(from_lane, to_lane)` pair.  Empty for an
    /// unknown light.
    pub fn uncontrolled_links(&self, light: LightId) -> &[LinkId] {
        let Some(tl) = self.light(light) else {
            return &[];
        };
        tl.uncontrolled.get_or_init(|| {
            let granted: FxHashSet<(LaneId, LaneId)> = self
                .phases_of(light)
                .flat_map(|p| p.granted.iter())
                .filter_map(|&l| self.link(l))
                .map(|l| (l.from_lane, l.to_lane))
                .collect();
            tl.controlled
                .iter()
                .copied()
                .filter(|&id| {
                    self.link(id)
                        .is_some_and(|l| !granted.contains(&(l.from_lane, l.to_lane)))
                })
                .collect()
        })
    }

    // ── Spatial queries ───────────────────────────────────────────────────

    /// The junction closest to `pos`, or `None` for an empty graph.
    pub fn nearest_junction(&self, pos: Point) -> Option<JunctionId> {
        self.spatial_idx.nearest_neighbor(&[pos.x, pos.y]).map(|e| e.id)
    }

    /// Up to `k` junctions nearest to `pos`, by ascending distance.
    pub fn k_nearest_junctions(&self, pos: Point, k: usize) -> Vec<JunctionId> {
        self.spatial_idx
            .nearest_neighbor_iter(&[pos.x, pos.y])
            .take(k)
            .map(|e| e.id)
            .collect()
    }
}

impl std::fmt::Display for RoadGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "RoadGraph({} junctions, {} edges, {} lanes, {} traffic lights)",
            self.junctions.len(),
            self.edges.len(),
            self.lanes.len(),
            self.lights.len(),
        )
    }
}
