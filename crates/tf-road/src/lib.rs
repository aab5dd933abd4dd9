//! `tf-road` — the static, lane-level road graph.
//!
//! The graph is supplied by an external loader (engine-specific network file
//! parsers live outside this workspace) through [`RoadGraphBuilder`], and is
//! immutable once built.
//!
//! # Crate layout
//!
//! | Module      | Contents                                                      |
//! |-------------|---------------------------------------------------------------|
//! | [`entity`]  | `Junction`, `Edge`, `Lane`, `LaneLink`, `TrafficLight`,       |
//! |             | `TrafficLightPhase`                                           |
//! | [`graph`]   | `RoadGraph` — arenas, name index, junction R-tree             |
//! | [`builder`] | `RoadGraphBuilder`, `LaneSpec`                                |
//! | [`error`]   | `GraphError`, `GraphResult<T>`                                |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                       |
//! |---------|--------------------------------------------------------------|
//! | `serde` | Derives `Serialize`/`Deserialize` on `LaneSpec`.             |

pub mod builder;
pub mod entity;
pub mod error;
pub mod graph;


pub use builder::{LaneSpec, RoadGraphBuilder};
pub use entity::{Edge, Junction, Lane, LaneLink, TrafficLight, TrafficLightPhase};
pub use error::{GraphError, GraphResult};
pub use graph::RoadGraph;
