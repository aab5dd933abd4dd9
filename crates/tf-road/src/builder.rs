//! Incremental construction of a [`RoadGraph`].

use rstar::RTree;
use rustc_hash::FxHashMap;
use tracing::debug;

use tf_core::{EdgeId, JunctionId, LaneId, LightId, LinkId, PhaseId, Point};

use crate::entity::{Edge, Junction, Lane, LaneLink, TrafficLight, TrafficLightPhase};
use crate::graph::{JunctionEntry, NameIndex, RoadGraph};
use crate::{GraphError, GraphResult};

/// Physical attributes of a lane.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LaneSpec {
    pub length:      f64,
    pub width:       f64,
    pub speed_limit: f64,
}

impl LaneSpec {
    pub fn new(length: f64, width: f64, speed_limit: f64) -> Self {
        Self { length, width, speed_limit }
    }
}

impl Default for LaneSpec {
    fn default() -> Self {
        Self { length: 0.0, width: 0.0, speed_limit: f64::INFINITY }
    }
}

/// Construct a [`RoadGraph`] incrementally, then call [`build`](Self::build).
///
/// `add_*` methods hand out ids sequentially and never fail; every cross
/// reference is validated once, in `build()`.
///
/// # Example
///
/// ```
/// use tf_core::Point;
/// use tf_road::{LaneSpec, RoadGraphBuilder};
///
/// let mut b = RoadGraphBuilder::new();
/// let w = b.add_junction("w", Point::new(0.0, 0.0));
/// let c = b.add_junction("c", Point::new(100.0, 0.0));
/// let e = b.add_junction("e", Point::new(200.0, 0.0));
/// let wc = b.add_edge("wc", w, c);
/// let ce = b.add_edge("ce", c, e);
/// let in_lane  = b.add_lane(wc, LaneSpec::new(100.0, 3.2, 13.9));
/// let out_lane = b.add_lane(ce, LaneSpec::new(100.0, 3.2, 13.9));
/// b.add_lane_link(in_lane, out_lane);
/// let graph = b.build().unwrap();
/// assert_eq!(graph.lane_count(), 2);
/// assert_eq!(graph.lanes[in_lane.index()].name, "wc_0");
/// ```
#[derive(Default)]
pub struct RoadGraphBuilder {
    junctions: Vec<RawJunction>,
    edges:     Vec<RawEdge>,
    lanes:     Vec<RawLane>,
    links:     Vec<RawLink>,
    lights:    Vec<RawLight>,
    phases:    Vec<RawPhase>,

    lanes_per_edge:  FxHashMap<EdgeId, u32>,
    phases_per_light: FxHashMap<LightId, u32>,
}

struct RawJunction {
    name:     String,
    position: Point,
}

struct RawEdge {
    name:      String,
    from:      JunctionId,
    to:        JunctionId,
    edge_type: String,
}

struct RawLane {
    name:  Option<String>,
    edge:  EdgeId,
    index: u32,
    spec:  LaneSpec,
}

struct RawLink {
    from_lane: LaneId,
    to_lane:   LaneId,
    via:       Option<LaneId>,
    kind:      Option<String>,
}

struct RawLight {
    name:       String,
    controlled: Vec<LinkId>,
}

struct RawPhase {
    light:    LightId,
    index:    u32,
    duration: f64,
    granted:  Vec<LinkId>,
}

impl RoadGraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a junction and return its id (sequential from 0).
    pub fn add_junction(&mut self, name: impl Into<String>, position: Point) -> JunctionId {
        let id = JunctionId(self.junctions.len() as u32);
        self.junctions.push(RawJunction { name: name.into(), position });
        id
    }

    /// Add a directed edge from `from` to `to`.
    pub fn add_edge(&mut self, name: impl Into<String>, from: JunctionId, to: JunctionId) -> EdgeId {
        let id = EdgeId(self.edges.len() as u32);
        self.edges.push(RawEdge { name: name.into(), from, to, edge_type: String::new() });
        id
    }

    /// Tag an edge with its road class.  Ignored for unknown edges.
    pub fn set_edge_type(&mut self, edge: EdgeId, edge_type: impl Into<String>) {
        if let Some(e) = self.edges.get_mut(edge.index()) {
            e.edge_type = edge_type.into();
        }
    }

    /// Append a lane to `edge`.  Lanes take consecutive indices within their
    /// edge and are named `"{edge}_{index}"`.
    pub fn add_lane(&mut self, edge: EdgeId, spec: LaneSpec) -> LaneId {
        self.push_lane(None, edge, spec)
    }

    /// Like [`add_lane`](Self::add_lane) with an explicit lane name, for
    /// formats whose lane ids do not follow the `{edge}_{index}` scheme.
    pub fn add_named_lane(&mut self, name: impl Into<String>, edge: EdgeId, spec: LaneSpec) -> LaneId {
        self.push_lane(Some(name.into()), edge, spec)
    }

    fn push_lane(&mut self, name: Option<String>, edge: EdgeId, spec: LaneSpec) -> LaneId {
        let id = LaneId(self.lanes.len() as u32);
        let counter = self.lanes_per_edge.entry(edge).or_insert(0);
        let index = *counter;
        *counter += 1;
        self.lanes.push(RawLane { name, edge, index, spec });
        id
    }

    /// Add a legal transition from `from_lane` to `to_lane`.  The junction is
    /// the one where `from_lane`'s edge ends.
    pub fn add_lane_link(&mut self, from_lane: LaneId, to_lane: LaneId) -> LinkId {
        self.add_lane_link_with(from_lane, to_lane, None, None)
    }

    /// Add a lane link with an internal `via` lane and/or a turn-kind tag.
    pub fn add_lane_link_with(
        &mut self,
        from_lane: LaneId,
        to_lane:   LaneId,
        via:       Option<LaneId>,
        kind:      Option<String>,
    ) -> LinkId {
        let id = LinkId(self.links.len() as u32);
        self.links.push(RawLink { from_lane, to_lane, via, kind });
        id
    }

    /// Add a traffic light responsible for `controlled` links.
    pub fn add_traffic_light(&mut self, name: impl Into<String>, controlled: Vec<LinkId>) -> LightId {
        let id = LightId(self.lights.len() as u32);
        self.lights.push(RawLight { name: name.into(), controlled });
        id
    }

    /// Append the next phase to `light`'s cycle.
    pub fn add_phase(&mut self, light: LightId, duration: f64, granted: Vec<LinkId>) -> PhaseId {
        let id = PhaseId(self.phases.len() as u32);
        let counter = self.phases_per_light.entry(light).or_insert(0);
        let index = *counter;
        *counter += 1;
        self.phases.push(RawPhase { light, index, duration, granted });
        id
    }

    pub fn junction_count(&self) -> usize { self.junctions.len() }
    pub fn edge_count(&self) -> usize { self.edges.len() }
    pub fn lane_count(&self) -> usize { self.lanes.len() }

    /// Validate all references and produce the [`RoadGraph`].
    pub fn build(self) -> GraphResult<RoadGraph> {
        let mut names = NameIndex::default();

        // ── Junctions ─────────────────────────────────────────────────────
        let mut junctions: Vec<Junction> = Vec::with_capacity(self.junctions.len());
        for (i, raw) in self.junctions.into_iter().enumerate() {
            let id = JunctionId(i as u32);
            insert_unique(&mut names.junctions, "junction", &raw.name, id)?;
            junctions.push(Junction {
                id,
                name:     raw.name,
                position: raw.position,
                incoming: Vec::new(),
                outgoing: Vec::new(),
                links:    Vec::new(),
            });
        }

        // ── Edges ─────────────────────────────────────────────────────────
        let mut edges: Vec<Edge> = Vec::with_capacity(self.edges.len());
        for (i, raw) in self.edges.into_iter().enumerate() {
            let id = EdgeId(i as u32);
            for j in [raw.from, raw.to] {
                if j.index() >= junctions.len() {
                    return Err(GraphError::UnknownJunction { edge: raw.name, junction: j });
                }
            }
            insert_unique(&mut names.edges, "edge", &raw.name, id)?;
            junctions[raw.from.index()].outgoing.push(id);
            junctions[raw.to.index()].incoming.push(id);
            edges.push(Edge {
                id,
                name:      raw.name,
                from:      raw.from,
                to:        raw.to,
                lanes:     Vec::new(),
                edge_type: raw.edge_type,
            });
        }

        // ── Lanes ─────────────────────────────────────────────────────────
        let mut lanes: Vec<Lane> = Vec::with_capacity(self.lanes.len());
        for (i, raw) in self.lanes.into_iter().enumerate() {
            let id = LaneId(i as u32);
            let Some(edge) = edges.get_mut(raw.edge.index()) else {
                let name = raw.name.unwrap_or_else(|| format!("{}_{}", raw.edge, raw.index));
                return Err(GraphError::UnknownEdge { lane: name, edge: raw.edge });
            };
            let name = raw.name.unwrap_or_else(|| format!("{}_{}", edge.name, raw.index));
            insert_unique(&mut names.lanes, "lane", &name, id)?;
            edge.lanes.push(id);
            lanes.push(Lane {
                id,
                name,
                edge:        raw.edge,
                index:       raw.index,
                length:      raw.spec.length,
                width:       raw.spec.width,
                speed_limit: raw.spec.speed_limit,
                links:       Vec::new(),
            });
        }

        // ── Lane links ────────────────────────────────────────────────────
        let mut links: Vec<LaneLink> = Vec::with_capacity(self.links.len());
        for (i, raw) in self.links.into_iter().enumerate() {
            let id = LinkId(i as u32);
            for lane in [Some(raw.from_lane), Some(raw.to_lane), raw.via].into_iter().flatten() {
                if lane.index() >= lanes.len() {
                    return Err(GraphError::UnknownLane(lane));
                }
            }
            let from_edge = &edges[lanes[raw.from_lane.index()].edge.index()];
            let to_edge   = &edges[lanes[raw.to_lane.index()].edge.index()];
            if from_edge.to != to_edge.from {
                return Err(GraphError::DisconnectedLink {
                    from_lane: lanes[raw.from_lane.index()].name.clone(),
                    to_lane:   lanes[raw.to_lane.index()].name.clone(),
                });
            }
            let junction = from_edge.to;
            lanes[raw.from_lane.index()].links.push(id);
            junctions[junction.index()].links.push(id);
            links.push(LaneLink {
                id,
                junction,
                from_lane: raw.from_lane,
                to_lane:   raw.to_lane,
                via:       raw.via,
                kind:      raw.kind,
            });
        }

        // ── Traffic lights ────────────────────────────────────────────────
        let mut lights: Vec<TrafficLight> = Vec::with_capacity(self.lights.len());
        for (i, raw) in self.lights.into_iter().enumerate() {
            let id = LightId(i as u32);
            if let Some(&bad) = raw.controlled.iter().find(|l| l.index() >= links.len()) {
                return Err(GraphError::UnknownLink { light: raw.name, link: bad });
            }
            insert_unique(&mut names.lights, "traffic light", &raw.name, id)?;
            lights.push(TrafficLight::new(id, raw.name, raw.controlled));
        }

        // ── Phases ────────────────────────────────────────────────────────
        let mut phases: Vec<TrafficLightPhase> = Vec::with_capacity(self.phases.len());
        for (i, raw) in self.phases.into_iter().enumerate() {
            let id = PhaseId(i as u32);
            let Some(light) = lights.get_mut(raw.light.index()) else {
                return Err(GraphError::UnknownLight(raw.light));
            };
            if let Some(&bad) = raw.granted.iter().find(|&&l| !light.controlled.contains(&l)) {
                return Err(GraphError::UncontrolledGrant {
                    light: light.name.clone(),
                    phase: raw.index,
                    link:  bad,
                });
            }
            light.phases.push(id);
            phases.push(TrafficLightPhase {
                id,
                name:     format!("{}_phase_{}", light.name, raw.index),
                index:    raw.index,
                duration: raw.duration,
                light:    raw.light,
                granted:  raw.granted,
            });
        }

        // ── Spatial index ─────────────────────────────────────────────────
        let entries: Vec<JunctionEntry> = junctions
            .iter()
            .map(|j| JunctionEntry { point: [j.position.x, j.position.y], id: j.id })
            .collect();
        let spatial_idx = RTree::bulk_load(entries);

        let graph = RoadGraph { junctions, edges, lanes, links, lights, phases, names, spatial_idx };
        debug!(%graph, "road graph built");
        Ok(graph)
    }
}

fn insert_unique<I: Copy>(
    map:  &mut FxHashMap<String, I>,
    kind: &'static str,
    name: &str,
    id:   I,
) -> GraphResult<()> {
    if map.insert(name.to_owned(), id).is_some() {
        return Err(GraphError::DuplicateName { kind, name: name.to_owned() });
    }
    Ok(())
}
