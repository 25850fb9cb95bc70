//! # tether_math
//!
//! Spatial primitives used to locate host objects: [`BlockPos`],
//! [`ChunkPos`] and the six axis-aligned [`Direction`]s. Re-exports the
//! [`glam`] integer vectors they are built on.

pub mod direction;
pub mod position;

pub use glam::{IVec2, IVec3};

pub use direction::Direction;
pub use position::{BlockPos, ChunkPos};
