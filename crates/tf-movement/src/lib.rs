//! `tf-movement` — movements, movement graph, and conflict analysis.
//!
//! A *movement* folds every lane of one edge that can reach a given
//! destination edge into a single unit, the granularity at which signal
//! phases and queues are reasoned about.
//!
//! # Modules
//!
//! | Module       | Contents                                                   |
//! |--------------|------------------------------------------------------------|
//! | [`movement`] | `Movement`                                                 |
//! | [`builder`]  | `MovementGraphBuilder` — one pass over a `RoadGraph`       |
//! | [`graph`]    | `MovementGraph` and its lane/edge/light/phase indices      |
//! | [`conflict`] | `ConflictAnalyzer` — phase-based mutual exclusion          |
//! | [`error`]    | `MovementError`, `MovementResult`                          |
//!
//! # Quick-start
//!
//! ```rust,ignore
//! let road  = Arc::new(builder.build()?);
//! let moves = MovementGraphBuilder::build(road)?;
//! let m     = moves.movement(west_in, east_out)?;
//! let rivals = moves.conflicting_movements(m.id)?;
//! ```

pub mod builder;
pub mod conflict;
pub mod error;
pub mod graph;
pub mod movement;

#[cfg(test)]
mod tests;

pub use builder::MovementGraphBuilder;
pub use conflict::ConflictAnalyzer;
pub use error::{MovementError, MovementResult};
pub use graph::MovementGraph;
pub use movement::Movement;
