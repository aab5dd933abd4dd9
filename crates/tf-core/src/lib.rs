//! `tf-core` — foundational types for the traffic-flow workspace.
//!
//! This crate is a dependency of every other `tf-*` crate.  It has no `tf-*`
//! dependencies and only `thiserror` (plus optional `serde`) from outside.
//!
//! # What lives here
//!
//! | Module     | Contents                                                       |
//! |------------|----------------------------------------------------------------|
//! | [`ids`]    | `JunctionId`, `EdgeId`, `LaneId`, `LinkId`, `LightId`,         |
//! |            | `PhaseId`, `MovementId`, `VehicleId`                           |
//! | [`geo`]    | `Point` (planar network coordinates)                           |
//! | [`config`] | `MonitorConfig` — speed thresholds and step length             |
//! | [`error`]  | `CoreError`, `CoreResult`                                      |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public types.        |

pub mod config;
pub mod error;
pub mod geo;
pub mod ids;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use config::MonitorConfig;
pub use error::{CoreError, CoreResult};
pub use geo::Point;
pub use ids::{EdgeId, JunctionId, LaneId, LightId, LinkId, MovementId, PhaseId, VehicleId};
