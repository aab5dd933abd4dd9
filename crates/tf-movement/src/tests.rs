//! Unit tests for tf-movement.

use std::sync::Arc;

use tf_core::{EdgeId, LaneId, LightId, Point};
use tf_road::{LaneSpec, RoadGraph, RoadGraphBuilder};

use crate::{MovementGraph, MovementGraphBuilder};

// ── Helpers ───────────────────────────────────────────────────────────────────

struct Cross {
    road:  RoadGraph,
    w_in:  EdgeId,
    s_in:  EdgeId,
    e_out: EdgeId,
    n_out: EdgeId,
    e_far: EdgeId,
    /// Lanes of `w_in`: lane 0 goes straight only, lane 1 straight or left.
    w_lanes: [LaneId; 2],
    /// Only lane of `s_in`, shared by C and D.
    s_lane: LaneId,
    light: LightId,
}

/// Signalised junction `c` with a second, unsignalised junction `e` beyond it.
///
/// ```text
///                n
///                ▲ n_out
///   w ──w_in──▶  c ──e_out──▶ e ──e_far──▶ far
///                ▲ s_in
///                s
/// ```
///
/// Movements: A = w_in→e_out, B = w_in→n_out, C = s_in→n_out,
/// D = s_in→e_out, E = e_out→e_far.  Phase 0 grants A and B.  Phase 1
/// grants only the s0→n0 link, but s0 also feeds D, so it controls C and D.
/// E is unsignalised.
fn cross() -> Cross {
    let mut b = RoadGraphBuilder::new();
    let w   = b.add_junction("w", Point::new(0.0, 0.0));
    let c   = b.add_junction("c", Point::new(100.0, 0.0));
    let n   = b.add_junction("n", Point::new(100.0, 100.0));
    let s   = b.add_junction("s", Point::new(100.0, -100.0));
    let e   = b.add_junction("e", Point::new(200.0, 0.0));
    let far = b.add_junction("far", Point::new(300.0, 0.0));

    let w_in  = b.add_edge("w_in", w, c);
    let s_in  = b.add_edge("s_in", s, c);
    let e_out = b.add_edge("e_out", c, e);
    let n_out = b.add_edge("n_out", c, n);
    let e_far = b.add_edge("e_far", e, far);

    let spec = LaneSpec::new(100.0, 3.2, 13.9);
    let w0 = b.add_lane(w_in, spec.clone());
    let w1 = b.add_lane(w_in, spec.clone());
    let s0 = b.add_lane(s_in, spec.clone());
    let e0 = b.add_lane(e_out, spec.clone());
    let n0 = b.add_lane(n_out, spec.clone());
    let f0 = b.add_lane(e_far, spec);

    let a0 = b.add_lane_link(w0, e0);
    let a1 = b.add_lane_link(w1, e0);
    let b1 = b.add_lane_link(w1, n0);
    let c0 = b.add_lane_link(s0, n0);
    let d0 = b.add_lane_link(s0, e0);
    b.add_lane_link(e0, f0);

    let light = b.add_traffic_light("c", vec![a0, a1, b1, c0, d0]);
    b.add_phase(light, 30.0, vec![a0, a1, b1]);
    b.add_phase(light, 20.0, vec![c0]);

    Cross {
        road: b.build().unwrap(),
        w_in,
        s_in,
        e_out,
        n_out,
        e_far,
        w_lanes: [w0, w1],
        s_lane: s0,
        light,
    }
}

fn movements(road: RoadGraph) -> MovementGraph {
    MovementGraphBuilder::build(Arc::new(road)).unwrap()
}

// ── Construction ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod construction {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn one_movement_per_edge_pair() {
        let g = movements(cross().road);
        assert_eq!(g.len(), 5);
        let pairs: HashSet<_> = g.movements().iter().map(|m| (m.from_edge, m.to_edge)).collect();
        assert_eq!(pairs.len(), g.len());
    }

    #[test]
    fn lanes_folded_into_movements() {
        let t = cross();
        let g = movements(t.road);
        let a = g.movement(t.w_in, t.e_out).unwrap();
        assert_eq!(a.from_lanes, t.w_lanes);
        assert_eq!(a.name, "w_in_e_out");
        let b = g.movement(t.w_in, t.n_out).unwrap();
        assert_eq!(b.from_lanes, [t.w_lanes[1]]);
    }

    #[test]
    fn shared_lane_feeds_two_movements() {
        let t = cross();
        let g = movements(t.road);
        assert_eq!(g.movements_of_lane(t.w_lanes[0]).len(), 1);
        let shared = g.movements_of_lane(t.w_lanes[1]);
        assert_eq!(shared.len(), 2);
        assert_eq!(g.movements_of_edge(t.w_in), shared);
    }

    #[test]
    fn light_and_phase_indices() {
        let t = cross();
        let g = movements(t.road);
        let a = g.movement_by_name("w_in_e_out").unwrap().id;
        let b = g.movement_by_name("w_in_n_out").unwrap().id;
        let c = g.movement_by_name("s_in_n_out").unwrap().id;
        let d = g.movement_by_name("s_in_e_out").unwrap().id;
        assert_eq!(g.movements_of_light(t.light), [a, b, d, c]);

        let p0 = g.road().light_phase(t.light, 0).unwrap().id;
        let p1 = g.road().light_phase(t.light, 1).unwrap().id;
        assert_eq!(g.movements_of_phase(p0), [a, b]);
        assert_eq!(g.movements_of_phase(p1), [d, c]);
        assert!(g.get(a).unwrap().granted_by(p0));
        assert!(!g.get(a).unwrap().granted_by(p1));
    }

    #[test]
    fn granted_link_controls_every_movement_of_its_lane() {
        let t = cross();
        let g = movements(t.road);
        let p1 = g.road().light_phase(t.light, 1).unwrap().id;
        let c = g.movement(t.s_in, t.n_out).unwrap();
        let d = g.movement(t.s_in, t.e_out).unwrap();

        assert_eq!(g.movements_of_lane(t.s_lane), [d.id, c.id]);
        assert_eq!(d.light, Some(t.light));
        assert_eq!(d.phases, [p1]);
        assert!(g.movements_of_phase(p1).contains(&d.id));
        assert_eq!(c.phases, d.phases);
    }

    #[test]
    fn unsignalised_movement_is_uncontrolled() {
        let t = cross();
        let g = movements(t.road);
        let e = g.movement(t.e_out, t.e_far).unwrap();
        assert!(e.is_uncontrolled());
        assert!(e.phases.is_empty());
    }

    #[test]
    fn controlled_but_never_granted_lane_is_uncontrolled() {
        let mut b = RoadGraphBuilder::new();
        let w = b.add_junction("w", Point::new(0.0, 0.0));
        let c = b.add_junction("c", Point::new(1.0, 0.0));
        let e = b.add_junction("e", Point::new(2.0, 0.0));
        let n = b.add_junction("n", Point::new(1.0, 1.0));
        let wc = b.add_edge("wc", w, c);
        let ce = b.add_edge("ce", c, e);
        let cn = b.add_edge("cn", c, n);
        let l0 = b.add_lane(wc, LaneSpec::default());
        let l1 = b.add_lane(wc, LaneSpec::default());
        let to_e = b.add_lane(ce, LaneSpec::default());
        let to_n = b.add_lane(cn, LaneSpec::default());
        let straight = b.add_lane_link(l0, to_e);
        let left     = b.add_lane_link(l1, to_n);
        let light = b.add_traffic_light("c", vec![straight, left]);
        b.add_phase(light, 30.0, vec![straight]);

        let g = movements(b.build().unwrap());
        assert_eq!(g.movement(wc, ce).unwrap().light, Some(light));
        assert!(g.movement(wc, cn).unwrap().is_uncontrolled());
    }

    #[test]
    fn build_is_deterministic() {
        let t = cross();
        let road = Arc::new(t.road);
        let first  = MovementGraphBuilder::build(Arc::clone(&road)).unwrap();
        let second = MovementGraphBuilder::build(road).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn empty_road_graph() {
        let g = movements(RoadGraph::empty());
        assert!(g.is_empty());
        assert!(g.movements_of_light(LightId(0)).is_empty());
    }
}

// ── Queries ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod queries {
    use tf_core::MovementId;

    use super::*;
    use crate::MovementError;

    #[test]
    fn missing_pair_is_an_error() {
        let t = cross();
        let g = movements(t.road);
        assert!(matches!(
            g.movement(t.e_out, t.w_in),
            Err(MovementError::MovementNotFound { .. })
        ));
        assert!(matches!(g.get(MovementId(42)), Err(MovementError::UnknownMovement(_))));
        assert!(matches!(g.movement_by_name("nope"), Err(MovementError::Core(_))));
    }

    #[test]
    fn unknown_ids_give_empty_collections() {
        let g = movements(cross().road);
        assert!(g.movements_of_lane(LaneId(99)).is_empty());
        assert!(g.movements_of_edge(EdgeId(99)).is_empty());
        assert!(g.movements_of_light(LightId(99)).is_empty());
    }

    #[test]
    fn downstream_and_upstream() {
        let t = cross();
        let g = movements(t.road);
        let a = g.movement(t.w_in, t.e_out).unwrap().id;
        let d = g.movement(t.s_in, t.e_out).unwrap().id;
        let e = g.movement(t.e_out, t.e_far).unwrap().id;

        assert_eq!(g.downstream_movements(a).unwrap(), [e]);
        assert!(g.downstream_movements(e).unwrap().is_empty());
        // Every movement leaving an edge into `c`, not only those ending on e_out.
        let b = g.movement(t.w_in, t.n_out).unwrap().id;
        let c = g.movement(t.s_in, t.n_out).unwrap().id;
        assert_eq!(g.upstream_movements(e).unwrap(), [a, b, d, c]);
        assert!(g.upstream_movements(a).unwrap().is_empty());
    }
}

// ── Conflicts ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod conflicts {
    use super::*;
    use crate::ConflictAnalyzer;

    #[test]
    fn two_phase_light() {
        let g = movements(cross().road);
        let a = g.movement_by_name("w_in_e_out").unwrap().id;
        let b = g.movement_by_name("w_in_n_out").unwrap().id;
        let c = g.movement_by_name("s_in_n_out").unwrap().id;
        let d = g.movement_by_name("s_in_e_out").unwrap().id;

        // A and B share phase 0, C and D share phase 1.
        let of_a = g.conflicting_movements(a).unwrap();
        assert!(!of_a.contains(&b));
        assert_eq!(of_a, [d, c]);
        assert_eq!(g.conflicting_movements(b).unwrap(), [d, c]);
        assert_eq!(g.conflicting_movements(c).unwrap(), [a, b]);
        assert_eq!(g.conflicting_movements(d).unwrap(), [a, b]);
    }

    #[test]
    fn symmetric_and_irreflexive() {
        let g = movements(cross().road);
        let analyzer = ConflictAnalyzer::new(&g);
        for m1 in g.movements() {
            let of_m1 = analyzer.conflicts_of(m1.id).unwrap();
            assert!(!of_m1.contains(&m1.id));
            for m2 in g.movements() {
                let of_m2 = analyzer.conflicts_of(m2.id).unwrap();
                assert_eq!(of_m1.contains(&m2.id), of_m2.contains(&m1.id));
                assert_eq!(
                    analyzer.are_conflicting(m1.id, m2.id).unwrap(),
                    of_m1.contains(&m2.id),
                );
            }
        }
    }

    #[test]
    fn uncontrolled_never_conflicts() {
        let t = cross();
        let g = movements(t.road);
        let e = g.movement(t.e_out, t.e_far).unwrap().id;
        let c = g.movement(t.s_in, t.n_out).unwrap().id;
        assert!(g.conflicting_movements(e).unwrap().is_empty());
        assert!(!ConflictAnalyzer::new(&g).are_conflicting(e, c).unwrap());
        assert!(!ConflictAnalyzer::new(&g).are_conflicting(c, e).unwrap());
    }
}

// ── Consistency errors ────────────────────────────────────────────────────────

#[cfg(test)]
mod consistency {
    use super::*;
    use crate::MovementError;

    #[test]
    fn dangling_link_target() {
        let mut road = cross().road;
        road.links[0].to_lane = LaneId(999);
        let result = MovementGraphBuilder::build(Arc::new(road));
        assert!(matches!(result, Err(MovementError::GraphConsistency(_))));
    }

    #[test]
    fn granted_link_from_lane_without_movements() {
        let t = cross();
        let mut road = t.road;
        road.lanes[t.s_lane.index()].links.clear();
        let result = MovementGraphBuilder::build(Arc::new(road));
        assert!(matches!(result, Err(MovementError::GraphConsistency(_))));
    }

    #[test]
    fn movement_granted_by_two_lights() {
        let mut b = RoadGraphBuilder::new();
        let w = b.add_junction("w", Point::new(0.0, 0.0));
        let c = b.add_junction("c", Point::new(1.0, 0.0));
        let e = b.add_junction("e", Point::new(2.0, 0.0));
        let wc = b.add_edge("wc", w, c);
        let ce = b.add_edge("ce", c, e);
        let l0 = b.add_lane(wc, LaneSpec::default());
        let l1 = b.add_lane(wc, LaneSpec::default());
        let out = b.add_lane(ce, LaneSpec::default());
        let k0 = b.add_lane_link(l0, out);
        let k1 = b.add_lane_link(l1, out);
        let first  = b.add_traffic_light("first", vec![k0]);
        let second = b.add_traffic_light("second", vec![k1]);
        b.add_phase(first, 10.0, vec![k0]);
        b.add_phase(second, 10.0, vec![k1]);

        let result = MovementGraphBuilder::build(Arc::new(b.build().unwrap()));
        assert!(matches!(result, Err(MovementError::GraphConsistency(_))));
    }
}

// ── Serde ─────────────────────────────────────────────────────────────────────

#[cfg(all(test, feature = "serde"))]
mod serde_support {
    use super::*;
    use crate::Movement;

    #[test]
    fn movement_json_keeps_control() {
        let t = cross();
        let g = movements(t.road);
        let d = g.movement(t.s_in, t.e_out).unwrap();
        let json = serde_json::to_string(d).unwrap();
        let back: Movement = serde_json::from_str(&json).unwrap();
        assert_eq!(&back, d);
        assert_eq!(back.light, Some(t.light));
    }
}
