//! One-shot derivation of a [`MovementGraph`] from a [`RoadGraph`].
//!
//! # Algorithm
//!
//! ```text
//! ① Group   — for each edge, bucket its lanes by the destination edge each
//!             outgoing link reaches; every bucket becomes one Movement.
//!             A lane with links to two destination edges lands in both.
//! ② Signal  — for each light, each phase, each granted link: take every
//!             movement fed by the link's from-lane and record
//!             light → movement, phase → movement, movement → light.
//! ```
//!
//! A phase granting one link of a shared lane therefore controls every
//! movement of that lane.
//!
//! Buckets are keyed by `BTreeMap<EdgeId, _>` and edges, lights and phases
//! are visited in id order, so movement ids and every index are a pure
//! function of the road graph.

use std::collections::BTreeMap;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use tracing::debug;

use tf_core::{EdgeId, LaneId, LinkId, MovementId};
use tf_road::RoadGraph;

use crate::{Movement, MovementError, MovementGraph, MovementResult};

pub struct MovementGraphBuilder;

impl MovementGraphBuilder {
    /// Derive all movements of `road` and their indices.
    ///
    /// Fails with [`MovementError::GraphConsistency`] when a lane link points
    /// at a lane or edge missing from the graph, or when a granted link's
    /// from-lane feeds no movement.  Also fails when one movement ends up
    /// controlled by two different lights, since a movement carries a single
    /// controlling light.
    pub fn build(road: Arc<RoadGraph>) -> MovementResult<MovementGraph> {
        let mut graph = MovementGraph {
            road:      Arc::clone(&road),
            movements: Vec::new(),
            by_pair:   FxHashMap::default(),
            by_name:   FxHashMap::default(),
            by_lane:   FxHashMap::default(),
            by_edge:   FxHashMap::default(),
            by_light:  FxHashMap::default(),
            by_phase:  FxHashMap::default(),
        };

        for edge in &road.edges {
            let mut groups: BTreeMap<EdgeId, Vec<LaneId>> = BTreeMap::new();
            for &lane_id in &edge.lanes {
                let lane = road.lane(lane_id).ok_or_else(|| {
                    MovementError::GraphConsistency(format!(
                        "edge {:?} lists missing lane {lane_id}",
                        edge.name
                    ))
                })?;
                for &link in &lane.links {
                    let (_, to_edge) = link_edges(&road, link)?;
                    groups.entry(to_edge).or_default().push(lane_id);
                }
            }
            for (to_edge, mut lanes) in groups {
                lanes.sort_unstable();
                lanes.dedup();
                add_movement(&mut graph, &road, edge.id, to_edge, lanes)?;
            }
        }

        for light in &road.lights {
            for phase in road.phases_of(light.id) {
                for &link in &phase.granted {
                    let from_lane = road
                        .link(link)
                        .map(|l| l.from_lane)
                        .ok_or_else(|| MovementError::GraphConsistency(format!("missing lane link {link}")))?;
                    let fed: Vec<MovementId> = graph.movements_of_lane(from_lane).to_vec();
                    if fed.is_empty() {
                        return Err(MovementError::GraphConsistency(format!(
                            "link {link} granted by {:?} starts on lane {from_lane}, which feeds no movement",
                            phase.name
                        )));
                    }
                    for mid in fed {
                        let movement = &mut graph.movements[mid.index()];
                        match movement.light {
                            Some(other) if other != light.id => {
                                return Err(MovementError::GraphConsistency(format!(
                                    "movement {:?} is controlled by lights {other} and {}",
                                    movement.name, light.id
                                )));
                            }
                            _ => movement.light = Some(light.id),
                        }
                        if !movement.phases.contains(&phase.id) {
                            movement.phases.push(phase.id);
                        }
                        push_unique(graph.by_light.entry(light.id).or_default(), mid);
                        push_unique(graph.by_phase.entry(phase.id).or_default(), mid);
                    }
                }
            }
        }

        debug!(%graph, "movement graph built");
        Ok(graph)
    }
}

/// `(edge(from_lane), edge(to_lane))` of a link, checking every hop.
fn link_edges(road: &RoadGraph, link: LinkId) -> MovementResult<(EdgeId, EdgeId)> {
    let l = road
        .link(link)
        .ok_or_else(|| MovementError::GraphConsistency(format!("missing lane link {link}")))?;
    let edge_of = |lane: LaneId| -> MovementResult<EdgeId> {
        let edge = road.lane_edge(lane).ok_or_else(|| {
            MovementError::GraphConsistency(format!("lane link {link} references missing lane {lane}"))
        })?;
        if road.edge(edge).is_none() {
            return Err(MovementError::GraphConsistency(format!(
                "lane {lane} of link {link} references missing edge {edge}"
            )));
        }
        Ok(edge)
    };
    Ok((edge_of(l.from_lane)?, edge_of(l.to_lane)?))
}

fn add_movement(
    graph:      &mut MovementGraph,
    road:       &RoadGraph,
    from_edge:  EdgeId,
    to_edge:    EdgeId,
    from_lanes: Vec<LaneId>,
) -> MovementResult<()> {
    let id = MovementId(graph.movements.len() as u32);
    let name = match (road.edge(from_edge), road.edge(to_edge)) {
        (Some(f), Some(t)) => format!("{}_{}", f.name, t.name),
        _ => {
            return Err(MovementError::GraphConsistency(format!(
                "movement {from_edge} -> {to_edge} references a missing edge"
            )));
        }
    };
    if graph.by_name.insert(name.clone(), id).is_some() {
        return Err(MovementError::GraphConsistency(format!("duplicate movement name {name:?}")));
    }

    graph.by_pair.insert((from_edge, to_edge), id);
    graph.by_edge.entry(from_edge).or_default().push(id);
    for &lane in &from_lanes {
        graph.by_lane.entry(lane).or_default().push(id);
    }
    graph.movements.push(Movement {
        id,
        name,
        from_edge,
        to_edge,
        from_lanes,
        light:  None,
        phases: Vec::new(),
    });
    Ok(())
}

#[inline]
fn push_unique(ids: &mut Vec<MovementId>, id: MovementId) {
    if !ids.contains(&id) {
        ids.push(id);
    }
}
