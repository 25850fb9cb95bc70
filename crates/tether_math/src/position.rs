//! Block and chunk coordinates.

use std::fmt;

use glam::{IVec2, IVec3};
use serde::{Deserialize, Serialize};

use crate::direction::Direction;

/// Position of a block in the world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct BlockPos(pub IVec3);

impl BlockPos {
    /// The world origin.
    pub const ORIGIN: Self = Self(IVec3::ZERO);

    /// Create a position from coordinates.
    #[must_use]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self(IVec3::new(x, y, z))
    }

    #[must_use]
    pub const fn x(self) -> i32 {
        self.0.x
    }

    #[must_use]
    pub const fn y(self) -> i32 {
        self.0.y
    }

    #[must_use]
    pub const fn z(self) -> i32 {
        self.0.z
    }

    /// The neighbouring position one step towards `direction`.
    #[must_use]
    pub fn offset(self, direction: Direction) -> Self {
        Self(self.0 + direction.offset())
    }

    /// The chunk containing this block.
    #[must_use]
    pub fn chunk(self) -> ChunkPos {
        ChunkPos::from_block(self)
    }
}

impl fmt::Display for BlockPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.0.x, self.0.y, self.0.z)
    }
}

/// Position of a 16×16 column of blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ChunkPos(pub IVec2);

impl ChunkPos {
    /// Side length of a chunk in blocks.
    pub const SIZE: i32 = 16;

    /// Create a chunk position from chunk coordinates.
    #[must_use]
    pub const fn new(x: i32, z: i32) -> Self {
        Self(IVec2::new(x, z))
    }

    /// The chunk containing `pos`.
    #[must_use]
    pub const fn from_block(pos: BlockPos) -> Self {
        Self(IVec2::new(pos.0.x >> 4, pos.0.z >> 4))
    }

    #[must_use]
    pub const fn x(self) -> i32 {
        self.0.x
    }

    #[must_use]
    pub const fn z(self) -> i32 {
        self.0.y
    }

    /// Lowest block x/z coordinate inside the chunk, at height `y`.
    #[must_use]
    pub const fn start_block(self, y: i32) -> BlockPos {
        BlockPos::new(self.0.x * Self::SIZE, y, self.0.y * Self::SIZE)
    }

    /// Returns `true` if `pos` lies in this chunk.
    #[must_use]
    pub fn contains(self, pos: BlockPos) -> bool {
        Self::from_block(pos) == self
    }
}

impl fmt::Display for ChunkPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.0.x, self.0.y)
    }
}
