//! Road-graph entities.
//!
//! Entities refer to each other through typed arena handles (`EdgeId`,
//! `LaneId`, …) rather than references, so the graph has no ownership cycles
//! and every entity can be looked up in O(1) through [`RoadGraph`].
//!
//! [`RoadGraph`]: crate::RoadGraph

use std::fmt;
use std::sync::OnceLock;

use tf_core::{EdgeId, JunctionId, LaneId, LightId, LinkId, PhaseId, Point};

// ── Junction ──────────────────────────────────────────────────────────────────

/// A node where edges meet.  Owns the lane links that cross it.
#[derive(Debug, Clone)]
pub struct Junction {
    pub id:       JunctionId,
    pub name:     String,
    pub position: Point,
    /// Edges ending at this junction.
    pub incoming: Vec<EdgeId>,
    /// Edges starting at this junction.
    pub outgoing: Vec<EdgeId>,
    /// Lane links crossing this junction.
    pub links:    Vec<LinkId>,
}

impl Junction {
    /// Incoming edges followed by outgoing edges.
    pub fn edges(&self) -> impl Iterator<Item = EdgeId> + '_ {
        self.incoming.iter().chain(self.outgoing.iter()).copied()
    }
}

impl fmt::Display for Junction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Junction({} at {}, {} in, {} out, {} links)",
            self.name,
            self.position,
            self.incoming.len(),
            self.outgoing.len(),
            self.links.len(),
        )
    }
}

// ── Edge ──────────────────────────────────────────────────────────────────────

/// A directed road segment between two junctions.
#[derive(Debug, Clone)]
pub struct Edge {
    pub id:        EdgeId,
    pub name:      String,
    pub from:      JunctionId,
    pub to:        JunctionId,
    /// Lanes ordered by their index within the edge.
    pub lanes:     Vec<LaneId>,
    /// Free-form road class reported by the network file (may be empty).
    pub edge_type: String,
}

impl Edge {
    #[inline]
    pub fn lane_count(&self) -> usize {
        self.lanes.len()
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Edge({}, {} -> {}, {} lanes)", self.name, self.from, self.to, self.lanes.len())
    }
}

// ── Lane ──────────────────────────────────────────────────────────────────────

/// A single traversable path within an edge.
#[derive(Debug, Clone)]
pub struct Lane {
    pub id:          LaneId,
    pub name:        String,
    pub edge:        EdgeId,
    /// Position within the owning edge (0 = rightmost in most formats).
    pub index:       u32,
    pub length:      f64,
    pub width:       f64,
    pub speed_limit: f64,
    /// Outgoing lane links.
    pub links:       Vec<LinkId>,
}

impl fmt::Display for Lane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Lane({}, index {}, length {:.1}, speed limit {:.1})",
            self.name, self.index, self.length, self.speed_limit,
        )
    }
}

// ── LaneLink ──────────────────────────────────────────────────────────────────

/// A legal lane-to-lane transition at a junction.
///
/// Two links are equal when they join the same pair of lanes; the internal
/// `via` lane, the kind tag, and the arena id do not take part in equality.
#[derive(Debug, Clone)]
pub struct LaneLink {
    pub id:        LinkId,
    pub junction:  JunctionId,
    pub from_lane: LaneId,
    pub to_lane:   LaneId,
    /// Internal lane used to cross the junction, if the network models one.
    pub via:       Option<LaneId>,
    /// Turn kind reported by the network file ("go_straight", "turn_left", …).
    pub kind:      Option<String>,
}

impl PartialEq for LaneLink {
    fn eq(&self, other: &Self) -> bool {
        self.from_lane == other.from_lane && self.to_lane == other.to_lane
    }
}

impl Eq for LaneLink {}

impl fmt::Display for LaneLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LaneLink({} -> {})", self.from_lane, self.to_lane)
    }
}

// ── TrafficLight ──────────────────────────────────────────────────────────────

/// A signal controller and its cyclic list of phases.
#[derive(Debug)]
pub struct TrafficLight {
    pub id:         LightId,
    pub name:       String,
    /// Every link this light is responsible for.
    pub controlled: Vec<LinkId>,
    /// Phases in cyclic order; `phases[i]` has `index == i`.
    pub phases:     Vec<PhaseId>,
    pub(crate) uncontrolled: OnceLock<Vec<LinkId>>,
}

impl TrafficLight {
    pub(crate) fn new(id: LightId, name: String, controlled: Vec<LinkId>) -> Self {
        Self { id, name, controlled, phases: Vec::new(), uncontrolled: OnceLock::new() }
    }

    #[inline]
    pub fn phase_count(&self) -> usize {
        self.phases.len()
    }
}

impl Clone for TrafficLight {
    /// The clone starts with an empty uncontrolled-link cache.
    fn clone(&self) -> Self {
        Self {
            id:           self.id,
            name:         self.name.clone(),
            controlled:   self.controlled.clone(),
            phases:       self.phases.clone(),
            uncontrolled: OnceLock::new(),
        }
    }
}

impl fmt::Display for TrafficLight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "TrafficLight({}, {} controlled links, {} phases)",
            self.name,
            self.controlled.len(),
            self.phases.len(),
        )
    }
}

// ── TrafficLightPhase ─────────────────────────────────────────────────────────

/// One right-of-way configuration of a traffic light.
#[derive(Debug, Clone)]
pub struct TrafficLightPhase {
    pub id:       PhaseId,
    /// `"{light}_phase_{index}"`.
    pub name:     String,
    /// Position in the light's cycle; also the value sent to the engine.
    pub index:    u32,
    pub duration: f64,
    pub light:    LightId,
    /// Links that may proceed while this phase is active.
    pub granted:  Vec<LinkId>,
}

impl TrafficLightPhase {
    #[inline]
    pub fn grants(&self, link: LinkId) -> bool {
        self.granted.contains(&link)
    }
}

impl fmt::Display for TrafficLightPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "TrafficLightPhase({}, duration {:.1}, {} granted links)",
            self.name,
            self.duration,
            self.granted.len(),
        )
    }
}
