//! Strongly typed identifier wrappers.
//!
//! Road-graph entities live in arenas (`Vec`s) and are referred to by `u32`
//! handles.  All handles are `Copy + Ord + Hash` so they work as map keys and
//! sort keys without ceremony.  The inner integer is `pub` to allow direct
//! indexing via `id.0 as usize`, but callers should prefer `.index()`.
//!
//! Vehicles are the exception: their ids are assigned by the simulation engine
//! and only ever used as map keys, so [`VehicleId`] wraps the engine's string.

use std::fmt;

/// Generate a typed ID wrapper around a primitive integer.
macro_rules! typed_id {
    ($(#[$attr:meta])* $vis:vis struct $name:ident($inner:ty);) => {
        $(#[$attr])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        $vis struct $name(pub $inner);

        impl $name {
            /// Sentinel meaning "no valid ID" — equivalent to `u32::MAX`.
            pub const INVALID: $name = $name(<$inner>::MAX);

            /// Cast to `usize` for direct use as a `Vec` index.
            #[inline(always)]
            pub fn index(self) -> usize {
                self.0 as usize
            }

            /// `true` unless this is the `INVALID` sentinel.
            #[inline(always)]
            pub fn is_valid(self) -> bool {
                self != Self::INVALID
            }
        }

        impl Default for $name {
            /// Returns the `INVALID` sentinel so uninitialized IDs are visibly invalid.
            #[inline(always)]
            fn default() -> Self {
                Self::INVALID
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl From<$name> for usize {
            #[inline(always)]
            fn from(id: $name) -> usize {
                id.0 as usize
            }
        }

        impl TryFrom<usize> for $name {
            type Error = std::num::TryFromIntError;
            fn try_from(n: usize) -> Result<$name, Self::Error> {
                <$inner>::try_from(n).map($name)
            }
        }
    };
}

typed_id! {
    /// Index of a junction (graph node) in the road-graph arena.
    pub struct JunctionId(u32);
}

typed_id! {
    /// Index of a directed edge (road segment).
    pub struct EdgeId(u32);
}

typed_id! {
    /// Index of a lane.  Lanes are numbered globally, not per edge.
    pub struct LaneId(u32);
}

typed_id! {
    /// Index of a lane-to-lane link at a junction.
    pub struct LinkId(u32);
}

typed_id! {
    /// Index of a traffic light (signal controller).
    pub struct LightId(u32);
}

typed_id! {
    /// Index of a traffic-light phase, numbered globally across all lights.
    pub struct PhaseId(u32);
}

typed_id! {
    /// Index of a derived movement in a `MovementGraph`.
    pub struct MovementId(u32);
}

/// Engine-assigned vehicle identifier.
///
/// Ordering is lexicographic on the underlying string and is used as the
/// stable tie-breaker whenever two vehicles share a lane position.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VehicleId(pub String);

impl VehicleId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VehicleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for VehicleId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for VehicleId {
    fn from(s: String) -> Self {
        Self(s)
    }
}
