//! `tf-monitor` — queue estimation and streaming traffic statistics.
//!
//! | Module      | Contents                                                    |
//! |-------------|-------------------------------------------------------------|
//! | [`queue`]   | `QueueEstimator` — per-movement queue, approach, pressure   |
//! | [`monitor`] | `TrafficMonitor`, `MonitorSummary`                          |
//! | [`error`]   | `MonitorError`, `MonitorResult`                             |
//!
//! # Wiring a monitor
//!
//! ```rust,ignore
//! let monitor = Rc::new(RefCell::new(TrafficMonitor::new(MonitorConfig::default())?));
//! TrafficMonitor::attach_to(&monitor, &mut sim)?;
//! sim.step_n(3600)?;
//! println!("{}", monitor.borrow().summary());
//! ```

pub mod error;
pub mod monitor;
pub mod queue;


pub use error::{MonitorError, MonitorResult};
pub use monitor::{MonitorSummary, TrafficMonitor};
pub use queue::QueueEstimator;
