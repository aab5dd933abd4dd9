//! grid — a single signalised crossroads under synthetic traffic.
//!
//! Builds the road and movement graphs, replays generated (or CSV-loaded)
//! traffic through a `Simulation` with a `TrafficMonitor` attached, switches
//! the signal at random every `phase_interval` steps, and prints per-movement
//! queues and the monitor summary.
//!
//! ```text
//! cargo run -p grid [-- CONFIG.json [FRAMES.csv]]
//! ```
//!
//! Logging follows `RUST_LOG` (default `info`).

mod network;
mod traffic;

use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use tf_core::MonitorConfig;
use tf_engine::{ReplayEngine, Simulation, TrafficEngine, load_frames_csv};
use tf_monitor::{QueueEstimator, TrafficMonitor};
use tf_movement::MovementGraphBuilder;

use network::build_crossroads;

// ── Configuration ─────────────────────────────────────────────────────────────

#[derive(Deserialize, Debug)]
#[serde(default)]
struct DemoConfig {
    steps:          usize,
    seed:           u64,
    /// Steps between random phase decisions.
    phase_interval: usize,
    /// Per-arm, per-step probability that a car enters.
    spawn_prob:     f64,
    monitor:        MonitorConfig,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            steps:          600,
            seed:           42,
            phase_interval: 30,
            spawn_prob:     0.15,
            monitor:        MonitorConfig::default(),
        }
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<DemoConfig> {
    let Some(path) = path else {
        return Ok(DemoConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
}

// ── main ──────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args: Vec<PathBuf> = std::env::args_os().skip(1).map(PathBuf::from).collect();
    let config = load_config(args.first())?;
    info!(?config, "configuration loaded");

    // 1. Road and movement graphs.
    let (graph, net) = build_crossroads()?;
    let light = net.light;
    let road = Arc::new(graph);
    let movements = MovementGraphBuilder::build(Arc::clone(&road))?;
    println!("{road}");
    println!("{movements}");

    // 2. Phase schedule: a random phase every `phase_interval` steps.
    let mut rng = SmallRng::seed_from_u64(config.seed);
    let phase_count = road.light(light).map_or(1, |l| l.phase_count().max(1)) as u32;
    let interval = config.phase_interval.max(1);
    let mut phases = Vec::with_capacity(config.steps);
    let mut current = 0;
    for step in 0..config.steps {
        if step % interval == 0 {
            current = rng.gen_range(0..phase_count);
        }
        phases.push(current);
    }

    // 3. Traffic: generated, or replayed from CSV when a second path is given.
    let frames = match args.get(1) {
        Some(path) => load_frames_csv(path, &road)
            .with_context(|| format!("loading frames {}", path.display()))?,
        None => traffic::generate(&net, &phases, config.spawn_prob, &mut rng),
    };
    info!(frames = frames.len(), "traffic ready");

    // 4. Simulation with a monitor attached.
    let mut sim = Simulation::new(ReplayEngine::new(Arc::clone(&road), frames));
    let monitor = Rc::new(RefCell::new(TrafficMonitor::new(config.monitor.clone())?));
    TrafficMonitor::attach_to(&monitor, &mut sim)?;

    // 5. Run.
    let t0 = Instant::now();
    let steps = phases.len().min(sim.engine().frame_count());
    for &phase in &phases[..steps] {
        sim.engine_mut().set_phase(light, phase)?;
        sim.step()?;
    }
    let elapsed = t0.elapsed();
    println!("Replayed {steps} steps in {:.3} s", elapsed.as_secs_f64());
    println!();

    // 6. Per-movement view of the final step.
    let engine = sim.engine();
    let queues = QueueEstimator::from_config(&movements, &config.monitor);
    println!(
        "{:<16} {:>6} {:>8} {:>9} {:>10}  {}",
        "Movement", "Queue", "AvgQ", "Approach", "Pressure", "Conflicts"
    );
    println!("{}", "-".repeat(72));
    for m in movements.movements() {
        let conflicts: Vec<&str> = movements
            .conflicting_movements(m.id)?
            .into_iter()
            .filter_map(|c| movements.get(c).ok())
            .map(|c| c.name.as_str())
            .collect();
        println!(
            "{:<16} {:>6} {:>8.2} {:>9.1} {:>10.2}  {}",
            m.name,
            queues.sum_queue_length(engine, m.id)?,
            queues.avg_queue_length(engine, m.id)?,
            queues.max_approach_length(m.id)?,
            queues.efficient_pressure(engine, m.id)?,
            if m.is_uncontrolled() { "uncontrolled".to_owned() } else { conflicts.join(" ") },
        );
    }
    println!();

    // 7. Monitor summary.
    let summary = monitor.borrow().summary();
    println!("Final time        : {:.0}", engine.current_time());
    println!("Throughput        : {}", summary.throughput);
    println!("Mean waiting time : {:.2}", summary.mean_waiting_time);
    println!("Mean stop count   : {:.2}", summary.mean_stop_count);
    println!("Mean travel time  : {:.2}", summary.mean_travel_time);
    println!("Mean queue length : {:.4}", summary.mean_queue_length);
    info!(%summary, "done");

    Ok(())
}
