//! Chunk host objects.

use tether_component::{Attached, HostObject, HostTypeId};
use tether_math::ChunkPos;

/// Well-known chunk host types.
///
/// `chunk` is the root; `proto_chunk` is a chunk still being generated,
/// `world_chunk` a fully loaded one and `empty_chunk` a placeholder world
/// chunk with no blocks.
pub struct ChunkType;

impl ChunkType {
    pub const CHUNK: HostTypeId = HostTypeId::from_name("chunk");
    pub const PROTO: HostTypeId = HostTypeId::from_name("proto_chunk");
    pub const WORLD: HostTypeId = HostTypeId::from_name("world_chunk");
    pub const EMPTY: HostTypeId = HostTypeId::from_name("empty_chunk");

    /// `(name, parent)` declarations for the built-in chunk types, parents first.
    pub const DECLARATIONS: [(&'static str, Option<&'static str>); 4] = [
        ("chunk", None),
        ("proto_chunk", Some("chunk")),
        ("world_chunk", Some("chunk")),
        ("empty_chunk", Some("world_chunk")),
    ];
}

/// The chunk itself, as seen by component factories during construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkData {
    pos: ChunkPos,
    kind: HostTypeId,
}

impl ChunkData {
    #[must_use]
    pub fn new(pos: ChunkPos, kind: HostTypeId) -> Self {
        Self { pos, kind }
    }

    #[must_use]
    pub fn pos(&self) -> ChunkPos {
        self.pos
    }

    #[must_use]
    pub fn kind(&self) -> HostTypeId {
        self.kind
    }
}

impl HostObject for ChunkData {
    fn host_type(&self) -> HostTypeId {
        self.kind
    }
}

/// A constructed chunk together with its components.
pub type Chunk = Attached<ChunkData>;
