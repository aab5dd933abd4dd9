//! Streaming traffic statistics.
//!
//! # Per-step update
//!
//! ```text
//! ① departures  — record depart time of every last_step_departed id
//! ② active      — running vehicle below the waiting threshold:
//!                   waiting_time += step_length
//!                   stop_count   += 1 on a moving → waiting transition
//!                 (a vehicle seen for the first time counts as moving)
//! ③ arrivals    — travel time = now − depart time; depart entry dropped
//! ④ queue       — mean lane queue over all lanes appended to the series
//! ```
//!
//! Only the engine's step deltas and the current active set are read; the
//! cost of a step never grows with simulation history.
//!
//! # Auto-reset
//!
//! Once attached with [`TrafficMonitor::attach_to`], the monitor clears every
//! accumulator when simulation time goes backwards between two steps of the
//! engine it is attached to.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use rustc_hash::FxHashMap;
use tracing::{info, warn};

use tf_core::{LaneId, MonitorConfig, VehicleId};
use tf_engine::{EngineId, ListenerError, Simulation, StepListener, TrafficEngine};

use crate::{MonitorError, MonitorResult};

// ── MonitorSummary ────────────────────────────────────────────────────────────

/// Point-in-time snapshot of every aggregate.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MonitorSummary {
    pub mean_waiting_time: f64,
    pub mean_stop_count:   f64,
    pub mean_travel_time:  f64,
    pub mean_queue_length: f64,
    pub throughput:        u64,
    /// Vehicles ever seen running since the last reset.
    pub tracked_vehicles:  usize,
    /// Departed but not yet arrived.
    pub in_flight:         usize,
    /// Steps observed since the last reset.
    pub steps:             usize,
}

impl fmt::Display for MonitorSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "steps={} tracked={} in_flight={} throughput={} \
             wait={:.2} stops={:.2} travel={:.2} queue={:.3}",
            self.steps,
            self.tracked_vehicles,
            self.in_flight,
            self.throughput,
            self.mean_waiting_time,
            self.mean_stop_count,
            self.mean_travel_time,
            self.mean_queue_length,
        )
    }
}

// ── TrafficMonitor ────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct TrafficMonitor {
    config:    MonitorConfig,
    attached:  Option<EngineId>,
    last_time: Option<f64>,

    waiting_time: FxHashMap<VehicleId, f64>,
    stop_count:   FxHashMap<VehicleId, u32>,
    /// Waiting state as of the previous step; pruned on arrival.
    is_waiting:   FxHashMap<VehicleId, bool>,
    depart_time:  FxHashMap<VehicleId, f64>,
    travel_times: Vec<f64>,
    queue_series: Vec<f64>,
    arrivals:     u64,
}

impl TrafficMonitor {
    /// Fails if `config` holds negative or non-finite values.
    pub fn new(config: MonitorConfig) -> MonitorResult<Self> {
        config.validate()?;
        Ok(Self { config, ..Self::default() })
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// The engine this monitor is attached to, if any.
    pub fn attached_engine(&self) -> Option<EngineId> {
        self.attached
    }

    /// Register `this` as a step listener of `sim` and enable auto-reset for
    /// `sim`'s engine.
    ///
    /// A monitor can be attached once; a second call fails with
    /// [`MonitorError::AlreadyAttached`] whatever the target.
    pub fn attach_to<E: TrafficEngine>(
        this: &Rc<RefCell<Self>>,
        sim:  &mut Simulation<E>,
    ) -> MonitorResult<()> {
        let engine = sim.engine().engine_id();
        {
            let mut monitor = this.try_borrow_mut().map_err(|_| MonitorError::Busy)?;
            if let Some(current) = monitor.attached {
                return Err(MonitorError::AlreadyAttached { engine: current });
            }
            monitor.attached = Some(engine);
        }
        let listener: Rc<RefCell<Self>> = Rc::clone(this);
        sim.on_step(listener);
        info!(%engine, "traffic monitor attached");
        Ok(())
    }

    /// Fold the engine's current step into the statistics.
    ///
    /// Every vehicle of the step is processed even when one of them fails;
    /// the first failure is returned afterwards.
    pub fn observe(&mut self, engine: &dyn TrafficEngine) -> MonitorResult<()> {
        let now = engine.current_time();
        let mut first_err: Option<MonitorError> = None;

        for id in engine.last_step_departed_ids() {
            self.depart_time.insert(id.clone(), now);
        }

        for id in engine.active_vehicle_ids() {
            let info = match engine.vehicle_info(id) {
                Ok(info) => info,
                Err(e) => {
                    warn!(vehicle = %id, error = %e, "vehicle listed as active but not found");
                    first_err.get_or_insert(e.into());
                    continue;
                }
            };
            if info.running {
                self.update_vehicle(id, info.speed);
            }
        }

        for id in engine.last_step_arrived_ids() {
            self.arrivals += 1;
            self.is_waiting.remove(id);
            match self.depart_time.remove(id) {
                Some(depart) => self.travel_times.push(now - depart),
                None => {
                    warn!(vehicle = %id, time = now, "arrival without recorded departure");
                    first_err.get_or_insert(MonitorError::MissingDeparture { vehicle: id.clone() });
                }
            }
        }

        self.queue_series.push(self.mean_lane_queue(engine));
        self.last_time = Some(now);

        match first_err {
            Some(e) => Err(e),
            None    => Ok(()),
        }
    }

    fn update_vehicle(&mut self, id: &VehicleId, speed: f64) {
        let waiting = speed < self.config.waiting_speed_threshold;
        let was_waiting = self.is_waiting.insert(id.clone(), waiting).unwrap_or(false);
        let wait = self.waiting_time.entry(id.clone()).or_insert(0.0);
        let stops = self.stop_count.entry(id.clone()).or_insert(0);
        if waiting {
            *wait += self.config.step_length;
            if !was_waiting {
                *stops += 1;
            }
        }
    }

    fn mean_lane_queue(&self, engine: &dyn TrafficEngine) -> f64 {
        let lanes = engine.road_graph().lane_count();
        if lanes == 0 {
            return 0.0;
        }
        let total: usize = (0..lanes as u32)
            .map(|i| engine.lane_queue_length(LaneId(i), self.config.queue_speed_threshold))
            .sum();
        total as f64 / lanes as f64
    }

    /// Clear accumulators if time went backwards since the last observation.
    fn auto_reset(&mut self, now: f64) {
        if let Some(prev) = self.last_time {
            if now < prev {
                info!(from = prev, to = now, "simulation time went backwards; monitor reset");
                self.reset();
            }
        }
    }

    /// Drop every accumulator.  The attachment is kept.
    pub fn reset(&mut self) {
        self.last_time = None;
        self.waiting_time.clear();
        self.stop_count.clear();
        self.is_waiting.clear();
        self.depart_time.clear();
        self.travel_times.clear();
        self.queue_series.clear();
        self.arrivals = 0;
    }

    // ── Aggregates ────────────────────────────────────────────────────────

    pub fn mean_waiting_time(&self) -> f64 {
        mean(self.waiting_time.values().copied())
    }

    pub fn mean_stop_count(&self) -> f64 {
        mean(self.stop_count.values().map(|&c| f64::from(c)))
    }

    /// Mean travel time of arrived vehicles.
    pub fn mean_travel_time(&self) -> f64 {
        mean(self.travel_times.iter().copied())
    }

    /// Mean of the per-step average lane queue.
    pub fn mean_queue_length(&self) -> f64 {
        mean(self.queue_series.iter().copied())
    }

    /// Arrivals since the last reset.
    pub fn throughput(&self) -> u64 {
        self.arrivals
    }

    pub fn travel_times(&self) -> &[f64] {
        &self.travel_times
    }

    pub fn queue_series(&self) -> &[f64] {
        &self.queue_series
    }

    pub fn waiting_time_of(&self, vehicle: &VehicleId) -> Option<f64> {
        self.waiting_time.get(vehicle).copied()
    }

    pub fn stop_count_of(&self, vehicle: &VehicleId) -> Option<u32> {
        self.stop_count.get(vehicle).copied()
    }

    pub fn summary(&self) -> MonitorSummary {
        MonitorSummary {
            mean_waiting_time: self.mean_waiting_time(),
            mean_stop_count:   self.mean_stop_count(),
            mean_travel_time:  self.mean_travel_time(),
            mean_queue_length: self.mean_queue_length(),
            throughput:        self.arrivals,
            tracked_vehicles:  self.waiting_time.len(),
            in_flight:         self.depart_time.len(),
            steps:             self.queue_series.len(),
        }
    }
}

impl StepListener for TrafficMonitor {
    fn on_step(&mut self, engine: &dyn TrafficEngine) -> Result<(), ListenerError> {
        if self.attached == Some(engine.engine_id()) {
            self.auto_reset(engine.current_time());
        }
        self.observe(engine).map_err(Into::into)
    }
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, n) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if n == 0 { 0.0 } else { sum / n as f64 }
}
