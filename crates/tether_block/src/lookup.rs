//! Capability lookups over a block world.
//!
//! An [`ApiLookup<A, T>`] answers "give me something implementing `A` at this
//! position, given context `T`" (typically `T = Direction`, the queried
//! side) without the caller knowing which component backs the answer.
//!
//! ## Resolution order
//!
//! 1. The provider registered for the block at the position, if any.
//! 2. The provider registered for the block entity's type, if any.
//! 3. Generic fallbacks, in registration order.
//!
//! The first provider returning `Some` wins. If none do, the result is
//! `Ok(None)`: a missing capability is an ordinary outcome. Errors are only
//! returned when a provider reports one, which for component-backed
//! providers means broken wiring ([`ComponentError::MissingComponent`]).

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use tether_component::{ComponentError, HostTypeId, Identifier};
use tether_math::BlockPos;
use tracing::{debug, trace};

use crate::block::{BlockId, BlockState};
use crate::block_entity::BlockEntity;
use crate::world::World;

/// What a block provider or fallback gets to see about the queried position.
#[derive(Debug, Clone, Copy)]
pub struct BlockQuery<'w> {
    /// The world being queried.
    pub world: &'w World,
    /// The queried position.
    pub pos: BlockPos,
    /// The block state at `pos`, `None` for air.
    pub state: Option<&'w BlockState>,
    /// The block entity at `pos`, if any.
    pub block_entity: Option<&'w BlockEntity>,
}

impl<'w> BlockQuery<'w> {
    /// Gather the state and block entity at `pos`.
    #[must_use]
    pub fn at(world: &'w World, pos: BlockPos) -> Self {
        Self {
            world,
            pos,
            state: world.block_state(pos),
            block_entity: world.block_entity(pos),
        }
    }
}

/// Result of a single provider.
pub type ProviderResult<A> = Result<Option<Rc<A>>, ComponentError>;

type BlockProvider<A, T> = Rc<dyn Fn(&BlockQuery<'_>, &T) -> ProviderResult<A>>;
type BlockEntityProvider<A, T> = Rc<dyn Fn(&BlockEntity, &T) -> ProviderResult<A>>;

/// A capability lookup for API type `A` with query context `T`.
pub struct ApiLookup<A: ?Sized, T> {
    identifier: Identifier,
    block_providers: HashMap<BlockId, BlockProvider<A, T>>,
    block_entity_providers: HashMap<HostTypeId, BlockEntityProvider<A, T>>,
    fallbacks: Vec<BlockProvider<A, T>>,
}

impl<A: ?Sized + 'static, T: 'static> ApiLookup<A, T> {
    /// Create an empty lookup.
    ///
    /// # Errors
    ///
    /// Returns [`ComponentError::InvalidIdentifier`] for malformed identifiers.
    pub fn new(identifier: &str) -> Result<Self, ComponentError> {
        Ok(Self::with_identifier(Identifier::parse(identifier)?))
    }

    pub(crate) fn with_identifier(identifier: Identifier) -> Self {
        Self {
            identifier,
            block_providers: HashMap::new(),
            block_entity_providers: HashMap::new(),
            fallbacks: Vec::new(),
        }
    }

    /// The lookup's identifier.
    #[must_use]
    pub fn identifier(&self) -> &Identifier {
        &self.identifier
    }

    /// Register a provider for specific blocks.
    ///
    /// Block providers also answer for positions without a block entity.
    ///
    /// # Errors
    ///
    /// Returns [`ComponentError::DuplicateProvider`] if one of `blocks`
    /// already has a provider; no registration is made in that case.
    pub fn register_for_blocks<P>(&mut self, provider: P, blocks: &[BlockId]) -> Result<(), ComponentError>
    where
        P: Fn(&BlockQuery<'_>, &T) -> ProviderResult<A> + 'static,
    {
        if let Some(taken) = blocks.iter().find(|b| self.block_providers.contains_key(*b)) {
            return Err(self.duplicate(taken.to_string()));
        }
        let provider: BlockProvider<A, T> = Rc::new(provider);
        for block in blocks {
            self.block_providers.insert(block.clone(), Rc::clone(&provider));
        }
        debug!(lookup = %self.identifier, blocks = blocks.len(), "registered block provider");
        Ok(())
    }

    /// Register a provider for block entities of the given types.
    ///
    /// Types match exactly; subtypes of a listed type are not covered.
    ///
    /// # Errors
    ///
    /// Returns [`ComponentError::DuplicateProvider`] if one of `types`
    /// already has a provider; no registration is made in that case.
    pub fn register_for_block_entities<P>(
        &mut self,
        provider: P,
        types: &[HostTypeId],
    ) -> Result<(), ComponentError>
    where
        P: Fn(&BlockEntity, &T) -> ProviderResult<A> + 'static,
    {
        if let Some(taken) = types.iter().find(|t| self.block_entity_providers.contains_key(*t)) {
            return Err(self.duplicate(taken.to_string()));
        }
        let provider: BlockEntityProvider<A, T> = Rc::new(provider);
        for ty in types {
            self.block_entity_providers.insert(*ty, Rc::clone(&provider));
        }
        debug!(lookup = %self.identifier, types = types.len(), "registered block entity provider");
        Ok(())
    }

    /// Register a generic fallback, consulted after every specific provider.
    pub fn register_fallback<P>(&mut self, provider: P)
    where
        P: Fn(&BlockQuery<'_>, &T) -> ProviderResult<A> + 'static,
    {
        self.fallbacks.push(Rc::new(provider));
        debug!(lookup = %self.identifier, fallbacks = self.fallbacks.len(), "registered fallback provider");
    }

    /// Find the API at `pos`.
    ///
    /// # Errors
    ///
    /// Propagates the first error a provider returns.
    pub fn find(&self, world: &World, pos: BlockPos, context: T) -> ProviderResult<A> {
        self.find_in(&BlockQuery::at(world, pos), &context)
    }

    /// Find the API for an already gathered query.
    ///
    /// # Errors
    ///
    /// Propagates the first error a provider returns.
    pub fn find_in(&self, query: &BlockQuery<'_>, context: &T) -> ProviderResult<A> {
        if let Some(provider) = query.state.and_then(|s| self.block_providers.get(s.block())) {
            if let Some(api) = provider(query, context)? {
                trace!(lookup = %self.identifier, pos = %query.pos, "resolved by block provider");
                return Ok(Some(api));
            }
        }

        if let Some(block_entity) = query.block_entity {
            if let Some(provider) = self.block_entity_providers.get(&block_entity.kind()) {
                if let Some(api) = provider(block_entity, context)? {
                    trace!(lookup = %self.identifier, pos = %query.pos, "resolved by block entity provider");
                    return Ok(Some(api));
                }
            }
        }

        for fallback in &self.fallbacks {
            if let Some(api) = fallback(query, context)? {
                trace!(lookup = %self.identifier, pos = %query.pos, "resolved by fallback");
                return Ok(Some(api));
            }
        }
        Ok(None)
    }

    /// Number of registered fallbacks.
    #[must_use]
    pub fn fallback_count(&self) -> usize {
        self.fallbacks.len()
    }

    fn duplicate(&self, target: String) -> ComponentError {
        ComponentError::DuplicateProvider {
            lookup: self.identifier.to_string(),
            target,
        }
    }
}

impl<A: ?Sized, T> fmt::Debug for ApiLookup<A, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiLookup")
            .field("identifier", &self.identifier)
            .field("block_providers", &self.block_providers.len())
            .field("block_entity_providers", &self.block_entity_providers.len())
            .field("fallbacks", &self.fallbacks.len())
            .finish()
    }
}
