//! Bridges from block entity components to [`ApiLookup`]s.
//!
//! Each function registers a provider that answers a lookup from the
//! component a [`ComponentKey`] attaches to the block entity at the queried
//! position.

use std::rc::Rc;

use tether_component::{Capability, ComponentError, ComponentKey, HostTypeId};

use crate::lookup::ApiLookup;

/// A context-free lookup named after `key` that answers with the component
/// itself.
#[must_use]
pub fn api_lookup<C>(key: &ComponentKey<C>) -> ApiLookup<C, ()>
where
    C: ?Sized + 'static,
{
    let mut lookup = ApiLookup::with_identifier(key.identifier().clone());
    expose_api(key, &mut lookup);
    lookup
}

/// Expose the component under `key` as `A` on every block entity that has it.
///
/// Registered as a fallback, so block and block entity type providers take
/// precedence. Block entities without the component yield `None`.
pub fn expose_api<C, A, T>(key: &ComponentKey<C>, lookup: &mut ApiLookup<A, T>)
where
    C: ?Sized + Capability<A> + 'static,
    A: ?Sized + 'static,
    T: 'static,
{
    let key = key.clone();
    lookup.register_fallback(move |query, _| {
        Ok(query
            .block_entity
            .and_then(|be| key.maybe_get(be))
            .map(<C as Capability<A>>::into_capability))
    });
}

/// Expose the component under `key` through `mapper`, which may inspect the
/// query context and decline with `None`.
pub fn expose_api_mapped<C, A, T, M>(key: &ComponentKey<C>, lookup: &mut ApiLookup<A, T>, mapper: M)
where
    C: ?Sized + 'static,
    A: ?Sized + 'static,
    T: 'static,
    M: Fn(&C, &T) -> Option<Rc<A>> + 'static,
{
    let key = key.clone();
    lookup.register_fallback(move |query, context| {
        Ok(query
            .block_entity
            .and_then(|be| key.get_nullable(be))
            .and_then(|component| mapper(component, context)))
    });
}

/// Expose the component under `key` for block entities of exactly `types`.
///
/// The component is required: querying a listed type whose block entities
/// do not carry it is [`ComponentError::MissingComponent`], not `None`.
///
/// # Errors
///
/// Returns [`ComponentError::DuplicateProvider`] if one of `types` already
/// has a provider in `lookup`.
pub fn expose_api_for<C, A, T, M>(
    key: &ComponentKey<C>,
    lookup: &mut ApiLookup<A, T>,
    mapper: M,
    types: &[HostTypeId],
) -> Result<(), ComponentError>
where
    C: ?Sized + 'static,
    A: ?Sized + 'static,
    T: 'static,
    M: Fn(&C, &T) -> Option<Rc<A>> + 'static,
{
    let key = key.clone();
    lookup.register_for_block_entities(move |be, context| Ok(mapper(key.get(be)?, context)), types)
}
