//! Block world storage.
//!
//! The [`World`] holds placed block states and block entities by position.
//! It is the locator that [`ApiLookup`](crate::ApiLookup) queries resolve
//! against.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use tether_component::{ComponentError, ComponentProvider, HostTypeId};
use tether_math::BlockPos;
use tracing::debug;

use crate::block::BlockState;
use crate::block_entity::{BlockEntity, BlockEntityComponents, BlockEntityData};

/// Blocks and block entities by position. Positions without a block are air.
#[derive(Debug, Default)]
pub struct World {
    blocks: HashMap<BlockPos, BlockState>,
    block_entities: HashMap<BlockPos, BlockEntity>,
}

impl World {
    /// Create an empty world.
    #[must_use]
    pub fn new() -> Self {
        Self {
            blocks: HashMap::new(),
            block_entities: HashMap::new(),
        }
    }

    /// Place a block, returning the state it replaced.
    pub fn set_block(&mut self, pos: BlockPos, state: BlockState) -> Option<BlockState> {
        self.blocks.insert(pos, state)
    }

    /// Remove a block and any block entity at `pos`.
    ///
    /// Returns the removed state, or `None` if `pos` was air.
    pub fn remove_block(&mut self, pos: BlockPos) -> Option<BlockState> {
        self.block_entities.remove(&pos);
        self.blocks.remove(&pos)
    }

    /// The block state at `pos`, or `None` for air.
    #[must_use]
    pub fn block_state(&self, pos: BlockPos) -> Option<&BlockState> {
        self.blocks.get(&pos)
    }

    /// Construct a block entity of type `kind` at `pos`, building its
    /// components from `registry`, and store it, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns the container build error. The world is left unchanged; in
    /// particular a previous block entity at `pos` is kept.
    pub fn place_block_entity(
        &mut self,
        pos: BlockPos,
        kind: HostTypeId,
        registry: &BlockEntityComponents,
    ) -> Result<&BlockEntity, ComponentError> {
        let block_entity = BlockEntity::new(BlockEntityData::new(kind, pos), registry)?;
        debug!(
            %pos,
            block_entity = block_entity.component_container().host_type_name(),
            components = block_entity.component_container().len(),
            "placed block entity"
        );
        Ok(match self.block_entities.entry(pos) {
            Entry::Occupied(mut entry) => {
                entry.insert(block_entity);
                entry.into_mut()
            }
            Entry::Vacant(entry) => entry.insert(block_entity),
        })
    }

    /// The block entity at `pos`, if any.
    #[must_use]
    pub fn block_entity(&self, pos: BlockPos) -> Option<&BlockEntity> {
        self.block_entities.get(&pos)
    }

    /// Remove the block entity at `pos`; its components are dropped with it.
    pub fn remove_block_entity(&mut self, pos: BlockPos) -> Option<BlockEntity> {
        self.block_entities.remove(&pos)
    }

    /// Number of placed blocks.
    #[must_use]
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Number of block entities.
    #[must_use]
    pub fn block_entity_count(&self) -> usize {
        self.block_entities.len()
    }
}
