//! An engine that plays back recorded vehicle states.
//!
//! Each [`StepFrame`] is the full set of vehicles present after one step.
//! Departures and arrivals are the differences between consecutive frames,
//! computed once per `advance()` so that consumers only ever see the per-step
//! deltas.  Phase commands are validated and stored but do not influence the
//! recorded traffic.

use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;

use tf_core::{LaneId, LightId, VehicleId};
use tf_road::RoadGraph;

use crate::{EngineError, EngineId, EngineResult, TrafficEngine, VehicleInfo};

/// All vehicles present at one recorded instant.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StepFrame {
    pub time:     f64,
    pub vehicles: Vec<VehicleInfo>,
}

impl StepFrame {
    pub fn new(time: f64, vehicles: Vec<VehicleInfo>) -> Self {
        Self { time, vehicles }
    }
}

pub struct ReplayEngine {
    id:     EngineId,
    road:   Arc<RoadGraph>,
    frames: Vec<StepFrame>,
    /// Number of frames consumed; the current frame is `frames[cursor - 1]`.
    cursor: usize,

    time:     f64,
    vehicles: FxHashMap<VehicleId, VehicleInfo>,
    active:   Vec<VehicleId>,
    by_lane:  FxHashMap<LaneId, Vec<VehicleId>>,
    departed: Vec<VehicleId>,
    arrived:  Vec<VehicleId>,
    phases:   Vec<u32>,
}

impl ReplayEngine {
    pub fn new(road: Arc<RoadGraph>, frames: Vec<StepFrame>) -> Self {
        let phases = vec![0; road.light_count()];
        Self {
            id: EngineId::fresh(),
            road,
            frames,
            cursor:   0,
            time:     0.0,
            vehicles: FxHashMap::default(),
            active:   Vec::new(),
            by_lane:  FxHashMap::default(),
            departed: Vec::new(),
            arrived:  Vec::new(),
            phases,
        }
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Frames not yet played.
    pub fn remaining(&self) -> usize {
        self.frames.len() - self.cursor
    }

    pub fn is_finished(&self) -> bool {
        self.cursor >= self.frames.len()
    }

    fn light_index(&self, light: LightId) -> EngineResult<usize> {
        if light.index() < self.phases.len() {
            Ok(light.index())
        } else {
            Err(EngineError::UnknownLight(light))
        }
    }

    fn clear_step_state(&mut self) {
        self.vehicles.clear();
        self.active.clear();
        self.by_lane.clear();
        self.departed.clear();
        self.arrived.clear();
    }
}

impl TrafficEngine for ReplayEngine {
    fn engine_id(&self) -> EngineId {
        self.id
    }

    fn road_graph(&self) -> &RoadGraph {
        &self.road
    }

    fn advance(&mut self) -> EngineResult<()> {
        let Some(frame) = self.frames.get(self.cursor) else {
            return Err(EngineError::Exhausted { steps: self.cursor });
        };
        self.cursor += 1;

        let present: FxHashSet<&VehicleId> = frame.vehicles.iter().map(|v| &v.id).collect();
        // Keep the previous frame's order so arrivals are deterministic.
        let arrived: Vec<VehicleId> = self
            .active
            .iter()
            .filter(|id| !present.contains(id))
            .cloned()
            .collect();
        let departed: Vec<VehicleId> = frame
            .vehicles
            .iter()
            .filter(|v| !self.vehicles.contains_key(&v.id))
            .map(|v| v.id.clone())
            .collect();

        self.time = frame.time;
        self.vehicles.clear();
        self.active.clear();
        self.by_lane.clear();
        for v in &frame.vehicles {
            self.active.push(v.id.clone());
            if v.running {
                self.by_lane.entry(v.lane).or_default().push(v.id.clone());
            }
            self.vehicles.insert(v.id.clone(), v.clone());
        }
        self.departed = departed;
        self.arrived = arrived;
        Ok(())
    }

    fn reset(&mut self) -> EngineResult<()> {
        debug!(engine = %self.id, played = self.cursor, "replay rewound");
        self.cursor = 0;
        self.time = 0.0;
        self.clear_step_state();
        self.phases.iter_mut().for_each(|p| *p = 0);
        Ok(())
    }

    fn current_time(&self) -> f64 {
        self.time
    }

    fn lane_vehicle_ids(&self, lane: LaneId) -> &[VehicleId] {
        self.by_lane.get(&lane).map(Vec::as_slice).unwrap_or_default()
    }

    fn active_vehicle_ids(&self) -> &[VehicleId] {
        &self.active
    }

    fn vehicle_info(&self, id: &VehicleId) -> EngineResult<&VehicleInfo> {
        self.vehicles.get(id).ok_or_else(|| EngineError::VehicleNotFound(id.clone()))
    }

    fn last_step_departed_ids(&self) -> &[VehicleId] {
        &self.departed
    }

    fn last_step_arrived_ids(&self) -> &[VehicleId] {
        &self.arrived
    }

    fn set_phase(&mut self, light: LightId, index: u32) -> EngineResult<()> {
        let slot = self.light_index(light)?;
        let count = self.road.light(light).map_or(0, |l| l.phase_count());
        if index as usize >= count {
            return Err(EngineError::PhaseOutOfRange { light, index, count });
        }
        self.phases[slot] = index;
        Ok(())
    }

    fn phase_index(&self, light: LightId) -> EngineResult<u32> {
        Ok(self.phases[self.light_index(light)?])
    }
}
