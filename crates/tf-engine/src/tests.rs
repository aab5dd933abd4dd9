//! Unit tests for tf-engine.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use tf_core::{EdgeId, LaneId, LightId, Point, VehicleId};
use tf_road::{LaneSpec, RoadGraph, RoadGraphBuilder};

use crate::{
    EngineError, ListenerError, ReplayEngine, SimulationError, Simulation, StepFrame,
    StepListener, TrafficEngine, VehicleInfo,
};

// ── Helpers ───────────────────────────────────────────────────────────────────

/// `a ──ab──▶ b ──bc──▶ c`, one lane each, one two-phase light at `b`.
fn line() -> Arc<RoadGraph> {
    let mut b = RoadGraphBuilder::new();
    let ja = b.add_junction("a", Point::new(0.0, 0.0));
    let jb = b.add_junction("b", Point::new(100.0, 0.0));
    let jc = b.add_junction("c", Point::new(200.0, 0.0));
    let ab = b.add_edge("ab", ja, jb);
    let bc = b.add_edge("bc", jb, jc);
    let l0 = b.add_lane(ab, LaneSpec::new(100.0, 3.2, 13.9));
    let l1 = b.add_lane(bc, LaneSpec::new(100.0, 3.2, 13.9));
    let link = b.add_lane_link(l0, l1);
    let light = b.add_traffic_light("b", vec![link]);
    b.add_phase(light, 30.0, vec![link]);
    b.add_phase(light, 5.0, vec![]);
    Arc::new(b.build().unwrap())
}

const AB: EdgeId = EdgeId(0);
const BC: EdgeId = EdgeId(1);
const AB_0: LaneId = LaneId(0);
const BC_0: LaneId = LaneId(1);

fn on_ab(id: &str, pos: f64, speed: f64) -> VehicleInfo {
    VehicleInfo::running(id, AB_0, AB, pos, speed, vec![AB, BC])
}

fn on_bc(id: &str, pos: f64, speed: f64) -> VehicleInfo {
    VehicleInfo::running(id, BC_0, BC, pos, speed, vec![BC])
}

/// veh0 departs at t=0 and leaves after t=2; veh1 departs at t=1 and stays.
fn three_frames() -> Vec<StepFrame> {
    vec![
        StepFrame::new(0.0, vec![on_ab("veh0", 10.0, 5.0)]),
        StepFrame::new(1.0, vec![on_ab("veh0", 15.0, 5.0), on_ab("veh1", 2.0, 0.0)]),
        StepFrame::new(2.0, vec![on_ab("veh1", 2.0, 0.0)]),
    ]
}

fn ids(list: &[VehicleId]) -> Vec<&str> {
    list.iter().map(VehicleId::as_str).collect()
}

// ── ReplayEngine ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod replay {
    use super::*;

    #[test]
    fn engine_ids_are_unique() {
        let a = ReplayEngine::new(line(), vec![]);
        let b = ReplayEngine::new(line(), vec![]);
        assert_ne!(a.engine_id(), b.engine_id());
    }

    #[test]
    fn departures_and_arrivals_are_step_deltas() {
        let mut e = ReplayEngine::new(line(), three_frames());

        e.advance().unwrap();
        assert_eq!(ids(e.last_step_departed_ids()), ["veh0"]);
        assert!(e.last_step_arrived_ids().is_empty());

        e.advance().unwrap();
        assert_eq!(ids(e.last_step_departed_ids()), ["veh1"]);
        assert!(e.last_step_arrived_ids().is_empty());

        e.advance().unwrap();
        assert!(e.last_step_departed_ids().is_empty());
        assert_eq!(ids(e.last_step_arrived_ids()), ["veh0"]);
        assert_eq!(e.current_time(), 2.0);
    }

    #[test]
    fn lane_and_vehicle_queries() {
        let mut e = ReplayEngine::new(line(), three_frames());
        e.advance().unwrap();
        e.advance().unwrap();
        assert_eq!(ids(e.lane_vehicle_ids(AB_0)), ["veh0", "veh1"]);
        assert!(e.lane_vehicle_ids(BC_0).is_empty());
        assert!(e.lane_vehicle_ids(LaneId(77)).is_empty());
        assert_eq!(ids(e.active_vehicle_ids()), ["veh0", "veh1"]);

        let v = e.vehicle_info(&VehicleId::from("veh0")).unwrap();
        assert_eq!(v.lane_position, 15.0);
        assert!(matches!(
            e.vehicle_info(&VehicleId::from("ghost")),
            Err(EngineError::VehicleNotFound(_))
        ));
    }

    #[test]
    fn queue_length_counts_slow_vehicles() {
        let mut e = ReplayEngine::new(line(), three_frames());
        e.advance().unwrap();
        e.advance().unwrap();
        assert_eq!(e.lane_queue_length(AB_0, 0.1), 1);
        assert_eq!(e.lane_queue_length(AB_0, 10.0), 2);
    }

    #[test]
    fn non_running_vehicle_is_not_on_a_lane() {
        let mut parked = on_ab("parked", 0.0, 0.0);
        parked.running = false;
        let mut e = ReplayEngine::new(line(), vec![StepFrame::new(0.0, vec![parked])]);
        e.advance().unwrap();
        assert!(e.lane_vehicle_ids(AB_0).is_empty());
        assert_eq!(e.active_vehicle_ids().len(), 1);
    }

    #[test]
    fn exhausted_after_last_frame() {
        let mut e = ReplayEngine::new(line(), three_frames());
        for _ in 0..3 {
            e.advance().unwrap();
        }
        assert!(e.is_finished());
        assert!(matches!(e.advance(), Err(EngineError::Exhausted { steps: 3 })));
    }

    #[test]
    fn reset_rewinds_everything() {
        let mut e = ReplayEngine::new(line(), three_frames());
        e.advance().unwrap();
        e.advance().unwrap();
        e.set_phase(LightId(0), 1).unwrap();
        e.reset().unwrap();

        assert_eq!(e.remaining(), 3);
        assert_eq!(e.current_time(), 0.0);
        assert!(e.active_vehicle_ids().is_empty());
        assert_eq!(e.phase_index(LightId(0)).unwrap(), 0);

        e.advance().unwrap();
        assert_eq!(ids(e.last_step_departed_ids()), ["veh0"]);
    }

    #[test]
    fn phase_commands_are_validated() {
        let mut e = ReplayEngine::new(line(), vec![]);
        e.set_phase(LightId(0), 1).unwrap();
        assert_eq!(e.phase_index(LightId(0)).unwrap(), 1);
        assert!(matches!(
            e.set_phase(LightId(0), 2),
            Err(EngineError::PhaseOutOfRange { index: 2, count: 2, .. })
        ));
        assert!(matches!(e.set_phase(LightId(5), 0), Err(EngineError::UnknownLight(_))));
        assert!(matches!(e.phase_index(LightId(5)), Err(EngineError::UnknownLight(_))));
    }

    #[test]
    fn route_after() {
        let v = on_ab("v", 0.0, 0.0);
        assert_eq!(v.route_after(AB), Some(&[BC][..]));
        assert_eq!(v.route_after(BC), Some(&[][..]));
        assert_eq!(v.route_after(EdgeId(9)), None);
    }
}

// ── Simulation host ───────────────────────────────────────────────────────────

#[cfg(test)]
mod simulation {
    use super::*;

    /// Records `(tag, time)` into a shared log on every step.
    struct Recorder {
        tag: &'static str,
        log: Rc<RefCell<Vec<(&'static str, f64)>>>,
    }

    impl StepListener for Recorder {
        fn on_step(&mut self, engine: &dyn TrafficEngine) -> Result<(), ListenerError> {
            self.log.borrow_mut().push((self.tag, engine.current_time()));
            Ok(())
        }
    }

    struct Failing;

    impl StepListener for Failing {
        fn on_step(&mut self, _engine: &dyn TrafficEngine) -> Result<(), ListenerError> {
            Err("boom".into())
        }
    }

    #[test]
    fn listeners_run_in_registration_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut sim = Simulation::new(ReplayEngine::new(line(), three_frames()));
        sim.on_step(Rc::new(RefCell::new(Recorder { tag: "first", log: Rc::clone(&log) })));
        sim.on_step(Rc::new(RefCell::new(Recorder { tag: "second", log: Rc::clone(&log) })));

        sim.step_n(2).unwrap();
        assert_eq!(sim.steps(), 2);
        assert_eq!(
            *log.borrow(),
            [("first", 0.0), ("second", 0.0), ("first", 1.0), ("second", 1.0)]
        );
    }

    #[test]
    fn failing_listener_does_not_starve_later_ones() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut sim = Simulation::new(ReplayEngine::new(line(), three_frames()));
        sim.on_step(Rc::new(RefCell::new(Failing)));
        sim.on_step(Rc::new(RefCell::new(Recorder { tag: "after", log: Rc::clone(&log) })));

        let err = sim.step().unwrap_err();
        assert!(matches!(err, SimulationError::Listener(_)));
        assert_eq!(log.borrow().len(), 1);
    }

    #[test]
    fn borrowed_listener_is_reported() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let recorder = Rc::new(RefCell::new(Recorder { tag: "r", log }));
        let mut sim = Simulation::new(ReplayEngine::new(line(), three_frames()));
        sim.on_step(recorder.clone());

        let _held = recorder.borrow_mut();
        assert!(matches!(sim.step(), Err(SimulationError::ListenerBusy(0))));
    }

    #[test]
    fn engine_errors_propagate() {
        let mut sim = Simulation::new(ReplayEngine::new(line(), vec![]));
        assert!(matches!(sim.step(), Err(SimulationError::Engine(EngineError::Exhausted { .. }))));
    }

    #[test]
    fn reset_keeps_listeners() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut sim = Simulation::new(ReplayEngine::new(line(), three_frames()));
        sim.on_step(Rc::new(RefCell::new(Recorder { tag: "r", log: Rc::clone(&log) })));
        sim.step_n(3).unwrap();
        sim.reset().unwrap();
        assert_eq!(sim.steps(), 0);
        assert_eq!(sim.listener_count(), 1);
        sim.step().unwrap();
        assert_eq!(log.borrow().last(), Some(&("r", 0.0)));
    }
}

// ── CSV loader ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod loader {
    use std::io::{Cursor, Write};

    use super::*;
    use crate::{load_frames_csv, load_frames_reader};

    const CSV: &str = "\
time,vehicle_id,lane,lane_position,speed,route
0,veh0,ab_0,10.0,5.0,ab bc
1,veh0,ab_0,15.0,5.0,ab bc
1,veh1,ab_0,2.0,0.0,ab bc
2,,,,,
3,veh1,bc_0,1.0,4.0,bc
";

    #[test]
    fn groups_rows_into_frames() {
        let road = line();
        let frames = load_frames_reader(Cursor::new(CSV), &road).unwrap();
        let times: Vec<f64> = frames.iter().map(|f| f.time).collect();
        assert_eq!(times, [0.0, 1.0, 2.0, 3.0]);
        assert_eq!(frames[1].vehicles.len(), 2);
        assert!(frames[2].vehicles.is_empty());

        let v = &frames[3].vehicles[0];
        assert_eq!(v.id.as_str(), "veh1");
        assert_eq!(v.lane, BC_0);
        assert_eq!(v.edge, BC);
        assert_eq!(v.route, [BC]);
        assert!(v.running);
    }

    #[test]
    fn unknown_lane_name() {
        let road = line();
        let bad = "time,vehicle_id,lane,lane_position,speed,route\n0,v,zz_0,0,0,ab\n";
        let result = load_frames_reader(Cursor::new(bad), &road);
        assert!(matches!(result, Err(EngineError::UnknownName { kind: "lane", .. })));
    }

    #[test]
    fn unknown_route_edge() {
        let road = line();
        let bad = "time,vehicle_id,lane,lane_position,speed,route\n0,v,ab_0,0,0,ab nowhere\n";
        let result = load_frames_reader(Cursor::new(bad), &road);
        assert!(matches!(result, Err(EngineError::UnknownName { kind: "edge", .. })));
    }

    #[test]
    fn duplicate_vehicle_in_frame() {
        let road = line();
        let bad = "time,vehicle_id,lane,lane_position,speed,route\n0,v,ab_0,0,0,ab\n0,v,ab_0,1,0,ab\n";
        assert!(matches!(load_frames_reader(Cursor::new(bad), &road), Err(EngineError::Parse(_))));
    }

    #[test]
    fn malformed_number() {
        let road = line();
        let bad = "time,vehicle_id,lane,lane_position,speed,route\nsoon,v,ab_0,0,0,ab\n";
        assert!(matches!(load_frames_reader(Cursor::new(bad), &road), Err(EngineError::Csv(_))));
    }

    #[test]
    fn loads_from_file_and_replays() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("frames.csv");
        std::fs::File::create(&path).unwrap().write_all(CSV.as_bytes()).unwrap();

        let road = line();
        let frames = load_frames_csv(&path, &road).unwrap();
        let mut e = ReplayEngine::new(road, frames);
        e.advance().unwrap();
        e.advance().unwrap();
        e.advance().unwrap();
        // Empty step: both vehicles gone.
        assert_eq!(ids(e.last_step_arrived_ids()), ["veh0", "veh1"]);
        e.advance().unwrap();
        assert_eq!(ids(e.last_step_departed_ids()), ["veh1"]);
    }

    #[test]
    fn missing_file() {
        let road = line();
        let result = load_frames_csv(std::path::Path::new("/no/such/frames.csv"), &road);
        assert!(matches!(result, Err(EngineError::Io(_))));
    }
}
