//! # tether_chunk
//!
//! Chunks as component hosts. Modules register a
//! [`ChunkComponentFactory`] per chunk type in [`ChunkComponents`]; every
//! [`Chunk`] built afterwards carries the resulting components.

pub mod chunk;
pub mod factory;

pub use chunk::{Chunk, ChunkData, ChunkType};
pub use factory::{ChunkComponentFactory, ChunkComponents};
