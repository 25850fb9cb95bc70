//! Block entities as component hosts.

use tether_component::{
    Attached, ComponentError, ComponentFactoryRegistry, HostObject, HostTypeId, HostTypeTable,
};
use tether_math::BlockPos;

/// Built-in block entity types.
///
/// ```text
/// block_entity
/// └── lockable_container
///     ├── chest
///     └── abstract_furnace
///         ├── furnace
///         └── blast_furnace
/// ```
pub struct BlockEntityType;

impl BlockEntityType {
    pub const BLOCK_ENTITY: HostTypeId = HostTypeId::from_name("block_entity");
    pub const LOCKABLE_CONTAINER: HostTypeId = HostTypeId::from_name("lockable_container");
    pub const CHEST: HostTypeId = HostTypeId::from_name("chest");
    pub const ABSTRACT_FURNACE: HostTypeId = HostTypeId::from_name("abstract_furnace");
    pub const FURNACE: HostTypeId = HostTypeId::from_name("furnace");
    pub const BLAST_FURNACE: HostTypeId = HostTypeId::from_name("blast_furnace");

    /// `(name, parent)` declarations for the built-in types, parents first.
    pub const DECLARATIONS: [(&'static str, Option<&'static str>); 6] = [
        ("block_entity", None),
        ("lockable_container", Some("block_entity")),
        ("chest", Some("lockable_container")),
        ("abstract_furnace", Some("lockable_container")),
        ("furnace", Some("abstract_furnace")),
        ("blast_furnace", Some("abstract_furnace")),
    ];

    /// A host type table holding the built-in types.
    ///
    /// # Errors
    ///
    /// Propagates [`HostTypeTable::declare`] errors.
    pub fn hierarchy() -> Result<HostTypeTable, ComponentError> {
        let mut table = HostTypeTable::new();
        for (name, parent) in Self::DECLARATIONS {
            table.declare(name, parent)?;
        }
        Ok(table)
    }
}

/// The block entity as seen by component factories during construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockEntityData {
    kind: HostTypeId,
    pos: BlockPos,
}

impl BlockEntityData {
    #[must_use]
    pub fn new(kind: HostTypeId, pos: BlockPos) -> Self {
        Self { kind, pos }
    }

    /// The block entity type.
    #[must_use]
    pub fn kind(&self) -> HostTypeId {
        self.kind
    }

    #[must_use]
    pub fn pos(&self) -> BlockPos {
        self.pos
    }
}

impl HostObject for BlockEntityData {
    fn host_type(&self) -> HostTypeId {
        self.kind
    }
}

/// A constructed block entity together with its components.
pub type BlockEntity = Attached<BlockEntityData>;

/// Factory registry for block entity components.
pub type BlockEntityComponents = ComponentFactoryRegistry<BlockEntityData>;
