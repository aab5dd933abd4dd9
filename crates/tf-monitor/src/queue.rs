//! Queue lengths per movement.
//!
//! A lane that feeds a single movement hands its whole queue to it.  A shared
//! lane (straight + right, say) hands its whole queue to whichever movement
//! its front queued vehicle is about to take:
//!
//! ```text
//! queued vehicles on lane, front first (lane_position desc, id asc)
//!   └─ route after the movement's origin edge
//!        missing origin edge → RouteInconsistency
//!        empty (destination) → try the next vehicle
//!        next == to_edge     → full queue
//!        otherwise           → 0
//! no vehicle decided         → 0
//! ```

use tf_core::{LaneId, MonitorConfig, MovementId};
use tf_engine::{TrafficEngine, VehicleInfo};
use tf_movement::{Movement, MovementGraph};

use crate::{MonitorError, MonitorResult};

/// Read-only queue queries over a movement graph and a live engine.
#[derive(Clone, Copy)]
pub struct QueueEstimator<'g> {
    graph:     &'g MovementGraph,
    threshold: f64,
}

impl<'g> QueueEstimator<'g> {
    /// Estimator with the default queue threshold.
    pub fn new(graph: &'g MovementGraph) -> Self {
        Self::with_threshold(graph, MonitorConfig::default().queue_speed_threshold)
    }

    /// Vehicles slower than `threshold` count as queued.
    pub fn with_threshold(graph: &'g MovementGraph, threshold: f64) -> Self {
        Self { graph, threshold }
    }

    pub fn from_config(graph: &'g MovementGraph, config: &MonitorConfig) -> Self {
        Self::with_threshold(graph, config.queue_speed_threshold)
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Queued vehicles attributed to `id`, summed over its lanes.
    pub fn sum_queue_length(&self, engine: &dyn TrafficEngine, id: MovementId) -> MonitorResult<usize> {
        let movement = self.graph.get(id)?;
        let mut total = 0;
        for &lane in &movement.from_lanes {
            total += self.lane_share(engine, movement, lane)?;
        }
        Ok(total)
    }

    /// [`sum_queue_length`](Self::sum_queue_length) divided by the number
    /// of lanes the movement uses.
    pub fn avg_queue_length(&self, engine: &dyn TrafficEngine, id: MovementId) -> MonitorResult<f64> {
        let lanes = self.graph.get(id)?.from_lanes.len();
        if lanes == 0 {
            return Ok(0.0);
        }
        Ok(self.sum_queue_length(engine, id)? as f64 / lanes as f64)
    }

    /// Length of the longest lane of the movement.
    pub fn max_approach_length(&self, id: MovementId) -> MonitorResult<f64> {
        let movement = self.graph.get(id)?;
        let road = self.graph.road();
        Ok(movement
            .from_lanes
            .iter()
            .filter_map(|&l| road.lane(l))
            .map(|l| l.length)
            .fold(0.0, f64::max))
    }

    /// Own average queue minus the mean average queue of the movements
    /// leaving this movement's destination edge.
    pub fn efficient_pressure(&self, engine: &dyn TrafficEngine, id: MovementId) -> MonitorResult<f64> {
        let own = self.avg_queue_length(engine, id)?;
        let downstream = self.graph.downstream_movements(id)?;
        if downstream.is_empty() {
            return Ok(own);
        }
        let mut sum = 0.0;
        for &d in downstream {
            sum += self.avg_queue_length(engine, d)?;
        }
        Ok(own - sum / downstream.len() as f64)
    }

    /// The part of `lane`'s queue that belongs to `movement`.
    fn lane_share(
        &self,
        engine:   &dyn TrafficEngine,
        movement: &Movement,
        lane:     LaneId,
    ) -> MonitorResult<usize> {
        let queue = engine.lane_queue_length(lane, self.threshold);
        if queue == 0 {
            return Ok(0);
        }
        if self.graph.movements_of_lane(lane).len() <= 1 {
            return Ok(queue);
        }

        let mut queued: Vec<&VehicleInfo> = Vec::with_capacity(queue);
        for id in engine.lane_vehicle_ids(lane) {
            let info = engine.vehicle_info(id)?;
            if info.running && info.speed < self.threshold {
                queued.push(info);
            }
        }
        queued.sort_by(|a, b| {
            b.lane_position
                .total_cmp(&a.lane_position)
                .then_with(|| a.id.cmp(&b.id))
        });

        for v in queued {
            match v.route_after(movement.from_edge) {
                None => {
                    return Err(MonitorError::RouteInconsistency {
                        vehicle: v.id.clone(),
                        edge:    movement.from_edge,
                    });
                }
                Some([]) => continue,
                Some([next, ..]) => {
                    return Ok(if *next == movement.to_edge { queue } else { 0 });
                }
            }
        }
        Ok(0)
    }
}
