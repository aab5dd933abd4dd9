//! Synthetic traffic for the demo crossroads.
//!
//! A deliberately crude car-following model: cars drive at the speed limit,
//! keep a fixed gap to the car ahead, and stop at the line while their arm is
//! red.  The output is a list of [`StepFrame`]s for
//! a [`ReplayEngine`](tf_engine::ReplayEngine).

use rand::rngs::SmallRng;
use rand::Rng;

use tf_core::{LaneId, VehicleId};
use tf_engine::{StepFrame, VehicleInfo};

use crate::network::{ARM_LENGTH, Crossroads, Turn};

const SPEED: f64 = 10.0;
const GAP:   f64 = 7.5;

struct Car {
    id:      VehicleId,
    arm:     usize,
    turn:    Turn,
    crossed: bool,
    pos:     f64,
    speed:   f64,
}

/// Generate one frame per entry of `phases` (the active phase at each step).
pub fn generate(
    net:         &Crossroads,
    phases:      &[u32],
    spawn_prob:  f64,
    rng:         &mut SmallRng,
) -> Vec<StepFrame> {
    let mut cars: Vec<Car> = Vec::new();
    let mut next_id = 0u64;
    let mut frames = Vec::with_capacity(phases.len());

    for (step, &phase) in phases.iter().enumerate() {
        cars.retain(|c| !(c.crossed && c.pos >= ARM_LENGTH));

        // Move front cars first so followers see their leader's new position.
        cars.sort_by(|a, b| b.pos.total_cmp(&a.pos));
        let mut leaders: Vec<(LaneId, f64)> = Vec::new();
        for car in &mut cars {
            let lane = lane_of(net, car);
            let mut limit = leaders
                .iter()
                .find(|(l, _)| *l == lane)
                .map_or(f64::INFINITY, |&(_, p)| p - GAP);
            let green = Crossroads::serves(phase, car.arm);
            if !car.crossed && !green {
                limit = limit.min(ARM_LENGTH);
            }
            let new_pos = (car.pos + SPEED).min(limit).max(car.pos);
            car.speed = new_pos - car.pos;
            car.pos = new_pos;
            if !car.crossed && car.pos >= ARM_LENGTH && green {
                car.crossed = true;
                car.pos -= ARM_LENGTH;
            }
            leaders.retain(|(l, _)| *l != lane);
            leaders.push((lane_of(net, car), car.pos));
        }

        for arm in 0..4 {
            if !rng.gen_bool(spawn_prob) {
                continue;
            }
            let turn = match rng.gen_range(0..10) {
                0..=5 => Turn::Straight,
                6..=7 => Turn::Right,
                _     => Turn::Left,
            };
            let entry = net.in_lanes[arm][turn.lane_index()];
            let blocked = cars.iter().any(|c| lane_of(net, c) == entry && c.pos < GAP);
            if blocked {
                continue;
            }
            cars.push(Car {
                id: VehicleId::new(format!("veh{next_id}")),
                arm,
                turn,
                crossed: false,
                pos:     0.0,
                speed:   SPEED,
            });
            next_id += 1;
        }

        let vehicles = cars.iter().map(|c| snapshot(net, c)).collect();
        frames.push(StepFrame::new(step as f64, vehicles));
    }
    frames
}

fn lane_of(net: &Crossroads, car: &Car) -> LaneId {
    if car.crossed {
        net.out_lane[car.turn.exit_arm(car.arm)]
    } else {
        net.in_lanes[car.arm][car.turn.lane_index()]
    }
}

fn snapshot(net: &Crossroads, car: &Car) -> VehicleInfo {
    let exit = net.outbound[car.turn.exit_arm(car.arm)];
    let (edge, route) = if car.crossed {
        (exit, vec![exit])
    } else {
        (net.inbound[car.arm], vec![net.inbound[car.arm], exit])
    };
    VehicleInfo::running(car.id.clone(), lane_of(net, car), edge, car.pos, car.speed, route)
}
