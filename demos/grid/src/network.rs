//! The demo crossroads.
//!
//! One signalised junction with four two-way arms.  Every inbound edge has a
//! shared straight/right lane (index 0) and a left-turn lane (index 1).
//! Right-turn links are left out of the light's phases, but they start on
//! the shared lane, so the right-turn movement follows the straight phase.
//! The cycle is a north–south and an east–west phase.

use tf_core::{EdgeId, LaneId, LightId, Point};
use tf_road::{GraphResult, LaneSpec, RoadGraph, RoadGraphBuilder};

pub const ARM_LENGTH: f64 = 150.0;
const SPEED_LIMIT:    f64 = 13.9;
const LANE_WIDTH:     f64 = 3.2;

/// Compass arms in clockwise order.
pub const ARMS: [&str; 4] = ["n", "e", "s", "w"];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Turn {
    Straight,
    Right,
    Left,
}

impl Turn {
    /// Arm a vehicle entering from `arm` leaves through.
    pub fn exit_arm(self, arm: usize) -> usize {
        match self {
            Turn::Straight => (arm + 2) % 4,
            Turn::Right    => (arm + 3) % 4,
            Turn::Left     => (arm + 1) % 4,
        }
    }

    pub fn lane_index(self) -> usize {
        match self {
            Turn::Straight | Turn::Right => 0,
            Turn::Left                   => 1,
        }
    }
}

/// Ids of the crossroads entities, by arm index (see [`ARMS`]).
pub struct Crossroads {
    pub light:    LightId,
    pub inbound:  [EdgeId; 4],
    pub outbound: [EdgeId; 4],
    pub in_lanes: [[LaneId; 2]; 4],
    pub out_lane: [LaneId; 4],
}

impl Crossroads {
    /// Phase 0 serves north–south, phase 1 east–west.
    pub fn serves(phase: u32, arm: usize) -> bool {
        arm % 2 == phase as usize % 2
    }
}

pub fn build_crossroads() -> GraphResult<(RoadGraph, Crossroads)> {
    let mut b = RoadGraphBuilder::new();
    let centre = b.add_junction("centre", Point::new(0.0, 0.0));
    let offsets = [(0.0, 1.0), (1.0, 0.0), (0.0, -1.0), (-1.0, 0.0)];

    let mut inbound  = [EdgeId::INVALID; 4];
    let mut outbound = [EdgeId::INVALID; 4];
    for (arm, (dx, dy)) in offsets.into_iter().enumerate() {
        let name = ARMS[arm];
        let outer = b.add_junction(name, Point::new(dx * ARM_LENGTH, dy * ARM_LENGTH));
        inbound[arm]  = b.add_edge(format!("{name}_in"), outer, centre);
        outbound[arm] = b.add_edge(format!("{name}_out"), centre, outer);
        b.set_edge_type(inbound[arm], "urban");
        b.set_edge_type(outbound[arm], "urban");
    }

    let spec = LaneSpec::new(ARM_LENGTH, LANE_WIDTH, SPEED_LIMIT);
    let in_lanes = inbound.map(|e| [b.add_lane(e, spec.clone()), b.add_lane(e, spec.clone())]);
    let out_lane = outbound.map(|e| b.add_lane(e, spec.clone()));

    let mut signalled = Vec::new();
    let mut by_phase = [Vec::new(), Vec::new()];
    for arm in 0..4 {
        for turn in [Turn::Straight, Turn::Right, Turn::Left] {
            let from = in_lanes[arm][turn.lane_index()];
            let to   = out_lane[turn.exit_arm(arm)];
            let kind = match turn {
                Turn::Straight => "go_straight",
                Turn::Right    => "turn_right",
                Turn::Left     => "turn_left",
            };
            let link = b.add_lane_link_with(from, to, None, Some(kind.to_owned()));
            if turn != Turn::Right {
                signalled.push(link);
                by_phase[arm % 2].push(link);
            }
        }
    }

    let light = b.add_traffic_light("centre", signalled);
    let [ns, ew] = by_phase;
    b.add_phase(light, 30.0, ns);
    b.add_phase(light, 30.0, ew);

    let graph = b.build()?;
    Ok((graph, Crossroads { light, inbound, outbound, in_lanes, out_lane }))
}
