//! The capability surface every simulation engine exposes to the core.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use tf_core::{EdgeId, LaneId, LightId, VehicleId};
use tf_road::RoadGraph;

use crate::EngineResult;

// ── EngineId ──────────────────────────────────────────────────────────────────

static NEXT_ENGINE_ID: AtomicU64 = AtomicU64::new(0);

/// Process-unique identity of an engine instance.
///
/// Lets stateful observers tell "the same engine again" apart from "a second
/// engine" without holding a reference to it.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct EngineId(u64);

impl EngineId {
    /// Allocate a fresh id.  Engines call this once, at construction.
    pub fn fresh() -> Self {
        Self(NEXT_ENGINE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for EngineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "engine#{}", self.0)
    }
}

// ── VehicleInfo ───────────────────────────────────────────────────────────────

/// Per-step snapshot of one vehicle.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VehicleInfo {
    pub id:            VehicleId,
    /// `false` once the vehicle has finished or before it has been inserted.
    pub running:       bool,
    /// Distance travelled along the current lane.
    pub lane_position: f64,
    pub speed:         f64,
    /// `LaneId::INVALID` when not running.
    pub lane:          LaneId,
    /// `EdgeId::INVALID` when not running.
    pub edge:          EdgeId,
    /// Remaining route, starting with the current edge.
    pub route:         Vec<EdgeId>,
}

impl VehicleInfo {
    /// A running vehicle at `lane_position` on `lane` of `edge`.
    pub fn running(
        id:            impl Into<VehicleId>,
        lane:          LaneId,
        edge:          EdgeId,
        lane_position: f64,
        speed:         f64,
        route:         Vec<EdgeId>,
    ) -> Self {
        Self { id: id.into(), running: true, lane_position, speed, lane, edge, route }
    }

    /// The part of the route after `edge`, or `None` if the route never
    /// visits `edge`.  An empty slice means `edge` is the destination.
    pub fn route_after(&self, edge: EdgeId) -> Option<&[EdgeId]> {
        let pos = self.route.iter().position(|&e| e == edge)?;
        Some(&self.route[pos + 1..])
    }
}

// ── TrafficEngine ─────────────────────────────────────────────────────────────

/// Everything the core needs from a running microsimulation.
///
/// Per-step accessors (`lane_vehicle_ids`, `vehicle_info`, the departure and
/// arrival lists) describe the state after the most recent
/// [`advance`](Self::advance) and stay stable until the next one.
///
/// The trait is object safe; listeners and estimators receive
/// `&dyn TrafficEngine` and never learn which simulator is behind it.
pub trait TrafficEngine {
    fn engine_id(&self) -> EngineId;

    /// The network the engine simulates.
    fn road_graph(&self) -> &RoadGraph;

    /// Advance the simulation by one step.
    fn advance(&mut self) -> EngineResult<()>;

    /// Return to the initial state.  Simulation time starts over.
    fn reset(&mut self) -> EngineResult<()>;

    fn current_time(&self) -> f64;

    /// Vehicles currently on `lane`.  Empty for an unknown lane.
    fn lane_vehicle_ids(&self, lane: LaneId) -> &[VehicleId];

    /// Every vehicle present in the network this step.
    fn active_vehicle_ids(&self) -> &[VehicleId];

    fn vehicle_info(&self, id: &VehicleId) -> EngineResult<&VehicleInfo>;

    /// Vehicles that entered the network during the last step.
    fn last_step_departed_ids(&self) -> &[VehicleId];

    /// Vehicles that left the network during the last step.
    fn last_step_arrived_ids(&self) -> &[VehicleId];

    /// Switch `light` to phase number `index` of its cycle.
    fn set_phase(&mut self, light: LightId, index: u32) -> EngineResult<()>;

    fn phase_index(&self, light: LightId) -> EngineResult<u32>;

    /// Number of running vehicles on `lane` slower than `threshold`.
    fn lane_queue_length(&self, lane: LaneId, threshold: f64) -> usize {
        self.lane_vehicle_ids(lane)
            .iter()
            .filter_map(|id| self.vehicle_info(id).ok())
            .filter(|v| v.running && v.speed < threshold)
            .count()
    }
}
