//! CSV loader for [`ReplayEngine`](crate::ReplayEngine) frames.
//!
//! # CSV format
//!
//! One row per vehicle per recorded step.  Consecutive rows with the same
//! `time` form one frame; lanes and route edges are referenced by name.
//!
//! ```csv
//! time,vehicle_id,lane,lane_position,speed,route
//! 0,veh0,w_in_0,12.5,8.3,w_in e_out
//! 1,veh0,w_in_0,20.8,8.3,w_in e_out
//! 1,veh1,s_in_0,3.0,0.0,s_in n_out
//! 2,,,,,
//! ```
//!
//! | Column          | Meaning                                                  |
//! |-----------------|----------------------------------------------------------|
//! | `route`         | Space-separated edge names, current edge first           |
//! | `vehicle_id`    | Empty: a step with no vehicles (other fields ignored)    |
//!
//! A vehicle's edge is the edge of its lane.

use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use tf_core::{EdgeId, VehicleId};
use tf_road::RoadGraph;

use crate::{EngineError, EngineResult, StepFrame, VehicleInfo};

// ── CSV record ────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct FrameRecord {
    time:          f64,
    vehicle_id:    String,
    #[serde(default)]
    lane:          String,
    #[serde(default)]
    lane_position: Option<f64>,
    #[serde(default)]
    speed:         Option<f64>,
    #[serde(default)]
    route:         String,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Load replay frames from a CSV file, resolving names against `road`.
pub fn load_frames_csv(path: &Path, road: &RoadGraph) -> EngineResult<Vec<StepFrame>> {
    let file = std::fs::File::open(path)?;
    load_frames_reader(file, road)
}

/// Like [`load_frames_csv`] but accepts any `Read` source.
pub fn load_frames_reader<R: Read>(reader: R, road: &RoadGraph) -> EngineResult<Vec<StepFrame>> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut frames: Vec<StepFrame> = Vec::new();

    for result in csv_reader.deserialize::<FrameRecord>() {
        let row = result?;
        if !row.time.is_finite() {
            return Err(EngineError::Parse(format!("non-finite time {}", row.time)));
        }

        let starts_frame = frames.last().is_none_or(|f| f.time != row.time);
        if starts_frame {
            frames.push(StepFrame::new(row.time, Vec::new()));
        }
        if row.vehicle_id.trim().is_empty() {
            continue;
        }

        let vehicle = parse_vehicle(row, road)?;
        if let Some(frame) = frames.last_mut() {
            if frame.vehicles.iter().any(|v| v.id == vehicle.id) {
                return Err(EngineError::Parse(format!(
                    "vehicle {} listed twice at time {}",
                    vehicle.id, frame.time
                )));
            }
            frame.vehicles.push(vehicle);
        }
    }

    Ok(frames)
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn parse_vehicle(row: FrameRecord, road: &RoadGraph) -> EngineResult<VehicleInfo> {
    let id = VehicleId::new(row.vehicle_id.trim());
    let lane_name = row.lane.trim();
    let lane = road.lane_id(lane_name).ok_or_else(|| EngineError::UnknownName {
        kind: "lane",
        name: lane_name.to_owned(),
    })?;
    let edge = road.lane_edge(lane).unwrap_or(EdgeId::INVALID);
    let route = row
        .route
        .split_whitespace()
        .map(|name| {
            road.edge_id(name).ok_or_else(|| EngineError::UnknownName {
                kind: "edge",
                name: name.to_owned(),
            })
        })
        .collect::<EngineResult<Vec<EdgeId>>>()?;
    let (Some(lane_position), Some(speed)) = (row.lane_position, row.speed) else {
        return Err(EngineError::Parse(format!(
            "vehicle {id} at time {} lacks lane_position or speed",
            row.time
        )));
    };
    Ok(VehicleInfo::running(id, lane, edge, lane_position, speed, route))
}
