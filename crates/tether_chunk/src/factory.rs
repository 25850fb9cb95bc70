//! Chunk component factories.

use std::rc::Rc;

use tether_component::{
    BoxError, ComponentError, ComponentFactoryRegistry, ComponentKey, ComponentProvider,
    FactoryResult, HostTypeId, HostTypeTable,
};
use tether_math::ChunkPos;
use tracing::debug;

use crate::chunk::{Chunk, ChunkData, ChunkType};

/// A component factory for chunks.
///
/// The factory is called once for every chunk of the registered type while
/// the chunk is being constructed; the component becomes available as soon
/// as all factories have run. It should have no side effects and keep work
/// to a minimum, deferring costly state to first use inside the component.
pub trait ChunkComponentFactory<C: ?Sized> {
    /// Create the component for `chunk`.
    ///
    /// # Errors
    ///
    /// Any error aborts construction of the chunk.
    fn create_for_chunk(&self, chunk: &ChunkData) -> Result<Rc<C>, BoxError>;
}

impl<C: ?Sized, F> ChunkComponentFactory<C> for F
where
    F: Fn(&ChunkData) -> FactoryResult<C>,
{
    fn create_for_chunk(&self, chunk: &ChunkData) -> Result<Rc<C>, BoxError> {
        self(chunk)
    }
}

/// Registration surface and factory table for chunk components.
#[derive(Debug)]
pub struct ChunkComponents {
    registry: ComponentFactoryRegistry<ChunkData>,
}

impl ChunkComponents {
    /// Create a table with the built-in chunk types declared.
    ///
    /// # Errors
    ///
    /// Never fails for the built-in declarations; the `Result` mirrors
    /// [`ChunkComponents::with_hierarchy`].
    pub fn new() -> Result<Self, ComponentError> {
        let mut table = HostTypeTable::new();
        for (name, parent) in ChunkType::DECLARATIONS {
            table.declare(name, parent)?;
        }
        Ok(Self::with_hierarchy(table))
    }

    /// Create a table over a custom chunk type hierarchy.
    #[must_use]
    pub fn with_hierarchy(hierarchy: HostTypeTable) -> Self {
        Self {
            registry: ComponentFactoryRegistry::with_hierarchy(hierarchy),
        }
    }

    /// Attach `key` to every chunk of `chunk_type` (and its subtypes).
    ///
    /// # Errors
    ///
    /// See [`ComponentFactoryRegistry::register_for`].
    pub fn register_for<C, F>(
        &mut self,
        chunk_type: HostTypeId,
        key: &ComponentKey<C>,
        factory: F,
    ) -> Result<(), ComponentError>
    where
        C: ?Sized + 'static,
        F: ChunkComponentFactory<C> + 'static,
    {
        self.registry
            .register_for(chunk_type, key, move |chunk: &ChunkData| factory.create_for_chunk(chunk))
    }

    /// Attach `key` to all chunks.
    ///
    /// # Errors
    ///
    /// See [`ComponentFactoryRegistry::register_for`].
    pub fn register<C, F>(&mut self, key: &ComponentKey<C>, factory: F) -> Result<(), ComponentError>
    where
        C: ?Sized + 'static,
        F: ChunkComponentFactory<C> + 'static,
    {
        self.register_for(ChunkType::CHUNK, key, factory)
    }

    /// Construct a chunk and its components.
    ///
    /// # Errors
    ///
    /// Returns the container build error; the chunk is not created.
    pub fn create_chunk(&self, pos: ChunkPos, chunk_type: HostTypeId) -> Result<Chunk, ComponentError> {
        let chunk = Chunk::new(ChunkData::new(pos, chunk_type), &self.registry)?;
        debug!(%pos, components = chunk.component_container().len(), "created chunk");
        Ok(chunk)
    }

    /// The underlying factory registry.
    #[must_use]
    pub fn registry(&self) -> &ComponentFactoryRegistry<ChunkData> {
        &self.registry
    }
}
