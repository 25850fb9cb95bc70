//! Per-host-type component factory registry.
//!
//! A [`ComponentFactoryRegistry`] maps `(host type, key)` to the factory that
//! constructs the component for each new host object, plus any decorators
//! that wrap the factory's result.
//!
//! ## Resolution
//!
//! Factories for a host type are resolved by walking its ancestry from the
//! root down to the type itself. Within one type, entries keep registration
//! order. When a subtype registers a factory for a key that an ancestor
//! already provides, the subtype's factory replaces the ancestor's at the
//! ancestor's position. Decorators from every level are kept, ancestors
//! first.
//!
//! ## Freezing
//!
//! The first call to [`ComponentFactoryRegistry::get_factories`] (which every
//! container build performs) freezes the registry. Any later registration
//! fails with [`ComponentError::RegistryFrozen`].

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use tracing::{debug, info, warn};

use crate::error::{BoxError, ComponentError};
use crate::hierarchy::{HostTypeId, HostTypeTable};
use crate::identifier::Identifier;
use crate::key::{ComponentKey, ErasedKey};

/// Result type returned by component factories.
pub type FactoryResult<C> = Result<Rc<C>, BoxError>;

type ErasedFactory<H> = Rc<dyn Fn(&H) -> Result<Box<dyn Any>, BoxError>>;
type ErasedDecorator<H> = Rc<dyn Fn(&H, Box<dyn Any>) -> Result<Box<dyn Any>, BoxError>>;

/// Registrations for one key on one host type.
struct FactoryEntry<H: ?Sized> {
    key: ErasedKey,
    factory: Option<ErasedFactory<H>>,
    decorators: Vec<ErasedDecorator<H>>,
}

/// A partially resolved entry; the factory may still be missing.
struct Pending<H: ?Sized> {
    key: ErasedKey,
    origin: HostTypeId,
    factory: Option<ErasedFactory<H>>,
    decorators: Vec<ErasedDecorator<H>>,
}

/// A factory selected for a concrete host type, ready to invoke.
pub struct ResolvedFactory<H: ?Sized> {
    key: ErasedKey,
    origin: HostTypeId,
    factory: ErasedFactory<H>,
    decorators: Vec<ErasedDecorator<H>>,
}

impl<H: ?Sized> ResolvedFactory<H> {
    /// The key this factory fills.
    #[must_use]
    pub fn key(&self) -> &ErasedKey {
        &self.key
    }

    /// The host type whose registration supplied the factory.
    #[must_use]
    pub fn origin(&self) -> HostTypeId {
        self.origin
    }

    /// Number of decorators applied after the factory.
    #[must_use]
    pub fn decorator_count(&self) -> usize {
        self.decorators.len()
    }

    /// Run the factory and then each decorator in order.
    pub(crate) fn invoke(&self, host: &H) -> Result<Box<dyn Any>, BoxError> {
        let mut component = (self.factory)(host)?;
        for decorator in &self.decorators {
            component = decorator(host, component)?;
        }
        Ok(component)
    }
}

impl<H: ?Sized> Clone for ResolvedFactory<H> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            origin: self.origin,
            factory: Rc::clone(&self.factory),
            decorators: self.decorators.clone(),
        }
    }
}

impl<H: ?Sized> fmt::Debug for ResolvedFactory<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedFactory")
            .field("key", &self.key)
            .field("origin", &self.origin)
            .field("decorators", &self.decorators.len())
            .finish()
    }
}

/// Registry of component factories for host objects of type `H`.
///
/// One registry exists per host family (chunks, block entities, ...). It owns
/// the [`HostTypeTable`] describing that family's hierarchy.
pub struct ComponentFactoryRegistry<H: ?Sized> {
    hierarchy: HostTypeTable,
    /// Entries per host type, in registration order.
    entries: HashMap<HostTypeId, Vec<FactoryEntry<H>>>,
    /// Identifier owning each key index seen so far.
    slot_owners: HashMap<u32, Identifier>,
    frozen: Cell<bool>,
    resolved: RefCell<HashMap<HostTypeId, Rc<[ResolvedFactory<H>]>>>,
}

impl<H: ?Sized + 'static> ComponentFactoryRegistry<H> {
    /// Create an empty registry with no declared host types.
    #[must_use]
    pub fn new() -> Self {
        Self::with_hierarchy(HostTypeTable::new())
    }

    /// Create a registry over an existing host type table.
    #[must_use]
    pub fn with_hierarchy(hierarchy: HostTypeTable) -> Self {
        Self {
            hierarchy,
            entries: HashMap::new(),
            slot_owners: HashMap::new(),
            frozen: Cell::new(false),
            resolved: RefCell::new(HashMap::new()),
        }
    }

    /// The host type table.
    #[must_use]
    pub fn hierarchy(&self) -> &HostTypeTable {
        &self.hierarchy
    }

    /// Returns `true` once any factory list has been resolved.
    #[must_use]
    pub fn is_frozen(&self) -> bool {
        self.frozen.get()
    }

    /// Declare a host type. See [`HostTypeTable::declare`].
    ///
    /// # Errors
    ///
    /// [`ComponentError::RegistryFrozen`] after freeze, otherwise whatever
    /// [`HostTypeTable::declare`] returns.
    pub fn declare_host_type(
        &mut self,
        name: &str,
        parent: Option<&str>,
    ) -> Result<HostTypeId, ComponentError> {
        self.ensure_open(name)?;
        self.hierarchy.declare(name, parent)
    }

    /// Register the factory for `key` on `host_type`.
    ///
    /// The factory runs once per host object of `host_type` or any subtype
    /// that does not override it. It should be pure: the result is cached
    /// for the lifetime of the host object.
    ///
    /// # Errors
    ///
    /// - [`ComponentError::RegistryFrozen`] after the first container build.
    /// - [`ComponentError::UnknownHostType`] if `host_type` is not declared.
    /// - [`ComponentError::DuplicateFactory`] if `host_type` already has a
    ///   factory for `key`. Use [`decorate_for`](Self::decorate_for) to layer
    ///   additional behaviour instead.
    /// - [`ComponentError::SlotConflict`] if `key` comes from a different
    ///   key registry than keys registered earlier.
    pub fn register_for<C, F>(
        &mut self,
        host_type: HostTypeId,
        key: &ComponentKey<C>,
        factory: F,
    ) -> Result<(), ComponentError>
    where
        C: ?Sized + 'static,
        F: Fn(&H) -> FactoryResult<C> + 'static,
    {
        self.ensure_open(key.identifier().as_str())?;
        let host_name = self.host_name(host_type)?;
        self.claim_slot(key)?;
        let entry = self.entry_mut(host_type, key);
        if entry.factory.is_some() {
            return Err(ComponentError::DuplicateFactory {
                key: key.identifier().to_string(),
                host_type: host_name,
            });
        }
        entry.factory = Some(Rc::new(move |host: &H| -> Result<Box<dyn Any>, BoxError> {
            let component: Rc<C> = factory(host)?;
            Ok(Box::new(component) as Box<dyn Any>)
        }));
        debug!(key = %key, host_type = %host_name, "registered component factory");
        Ok(())
    }

    /// Register a decorator for `key` on `host_type`.
    ///
    /// Decorators receive the component produced by the effective factory
    /// (or by the previous decorator) and return the component to store.
    /// Any number of decorators may be registered for the same pair; they
    /// run in registration order, ancestors' decorators first.
    ///
    /// # Errors
    ///
    /// [`ComponentError::RegistryFrozen`], [`ComponentError::UnknownHostType`]
    /// or [`ComponentError::SlotConflict`].
    pub fn decorate_for<C, D>(
        &mut self,
        host_type: HostTypeId,
        key: &ComponentKey<C>,
        decorator: D,
    ) -> Result<(), ComponentError>
    where
        C: ?Sized + 'static,
        D: Fn(&H, Rc<C>) -> FactoryResult<C> + 'static,
    {
        self.ensure_open(key.identifier().as_str())?;
        let host_name = self.host_name(host_type)?;
        self.claim_slot(key)?;
        let identifier = key.identifier().clone();
        let erased: ErasedDecorator<H> = Rc::new(
            move |host: &H, component: Box<dyn Any>| -> Result<Box<dyn Any>, BoxError> {
                let inner = component
                    .downcast::<Rc<C>>()
                    .map_err(|_| format!("component stored under '{identifier}' has the wrong type"))?;
                let decorated: Rc<C> = decorator(host, *inner)?;
                Ok(Box::new(decorated) as Box<dyn Any>)
            },
        );
        self.entry_mut(host_type, key).decorators.push(erased);
        debug!(key = %key, host_type = %host_name, "registered component decorator");
        Ok(())
    }

    /// Resolve the effective, ordered factory list for `host_type`.
    ///
    /// The first successful call freezes the registry. Results are cached
    /// per host type.
    ///
    /// # Errors
    ///
    /// Returns [`ComponentError::UnknownHostType`] if `host_type` is not
    /// declared. The registry stays open in that case.
    pub fn get_factories(
        &self,
        host_type: HostTypeId,
    ) -> Result<Rc<[ResolvedFactory<H>]>, ComponentError> {
        if !self.hierarchy.contains(host_type) {
            return Err(ComponentError::UnknownHostType(host_type.to_string()));
        }
        if !self.frozen.replace(true) {
            info!(
                host_types = self.hierarchy.len(),
                "component factory registry frozen"
            );
        }
        if let Some(cached) = self.resolved.borrow().get(&host_type) {
            return Ok(Rc::clone(cached));
        }

        let resolved: Rc<[ResolvedFactory<H>]> = self.resolve(host_type)?.into();
        self.resolved
            .borrow_mut()
            .insert(host_type, Rc::clone(&resolved));
        Ok(resolved)
    }

    fn resolve(&self, host_type: HostTypeId) -> Result<Vec<ResolvedFactory<H>>, ComponentError> {
        let mut pending: Vec<Pending<H>> = Vec::new();
        let mut position: HashMap<u32, usize> = HashMap::new();

        for ty in self.hierarchy.ancestry(host_type)? {
            let Some(entries) = self.entries.get(&ty) else {
                continue;
            };
            for entry in entries {
                match position.get(&entry.key.index()) {
                    Some(&at) => {
                        let slot = &mut pending[at];
                        if let Some(factory) = &entry.factory {
                            slot.factory = Some(Rc::clone(factory));
                            slot.origin = ty;
                        }
                        slot.decorators.extend(entry.decorators.iter().cloned());
                    }
                    None => {
                        position.insert(entry.key.index(), pending.len());
                        pending.push(Pending {
                            key: entry.key.clone(),
                            origin: ty,
                            factory: entry.factory.clone(),
                            decorators: entry.decorators.clone(),
                        });
                    }
                }
            }
        }

        let host_name = self.hierarchy.name_of(host_type).unwrap_or_default();
        let resolved: Vec<ResolvedFactory<H>> = pending
            .into_iter()
            .filter_map(|p| match p.factory {
                Some(factory) => Some(ResolvedFactory {
                    key: p.key,
                    origin: p.origin,
                    factory,
                    decorators: p.decorators,
                }),
                None => {
                    warn!(
                        key = %p.key.identifier(),
                        host_type = host_name,
                        "decorators registered without a factory; nothing to decorate"
                    );
                    None
                }
            })
            .collect();
        debug!(host_type = host_name, factories = resolved.len(), "resolved component factories");
        Ok(resolved)
    }

    fn ensure_open(&self, what: &str) -> Result<(), ComponentError> {
        if self.frozen.get() {
            return Err(ComponentError::RegistryFrozen {
                identifier: what.to_owned(),
            });
        }
        Ok(())
    }

    fn host_name(&self, host_type: HostTypeId) -> Result<String, ComponentError> {
        self.hierarchy
            .name_of(host_type)
            .map(str::to_owned)
            .ok_or_else(|| ComponentError::UnknownHostType(host_type.to_string()))
    }

    /// Bind the key's index to its identifier, rejecting a different key
    /// (from another [`ComponentRegistry`](crate::ComponentRegistry)) that
    /// already uses the same index.
    fn claim_slot<C: ?Sized + 'static>(&mut self, key: &ComponentKey<C>) -> Result<(), ComponentError> {
        let owner = self
            .slot_owners
            .entry(key.index())
            .or_insert_with(|| key.identifier().clone());
        if *owner != *key.identifier() {
            return Err(ComponentError::SlotConflict {
                key: key.identifier().to_string(),
                existing: owner.to_string(),
                index: key.index(),
            });
        }
        Ok(())
    }

    fn entry_mut<C: ?Sized + 'static>(
        &mut self,
        host_type: HostTypeId,
        key: &ComponentKey<C>,
    ) -> &mut FactoryEntry<H> {
        let entries = self.entries.entry(host_type).or_default();
        let at = match entries.iter().position(|e| e.key.index() == key.index()) {
            Some(at) => at,
            None => {
                entries.push(FactoryEntry {
                    key: key.erase(),
                    factory: None,
                    decorators: Vec::new(),
                });
                entries.len() - 1
            }
        };
        &mut entries[at]
    }
}

impl<H: ?Sized + 'static> Default for ComponentFactoryRegistry<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: ?Sized> fmt::Debug for ComponentFactoryRegistry<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentFactoryRegistry")
            .field("host_types", &self.hierarchy.len())
            .field("registered_types", &self.entries.len())
            .field("frozen", &self.frozen.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::ComponentRegistry;

    struct Host;

    const BASE: HostTypeId = HostTypeId::from_name("base");
    const CHILD: HostTypeId = HostTypeId::from_name("child");

    fn registry() -> ComponentFactoryRegistry<Host> {
        let mut registry = ComponentFactoryRegistry::new();
        registry.declare_host_type("base", None).unwrap();
        registry.declare_host_type("child", Some("base")).unwrap();
        registry
    }

    fn names(resolved: &[ResolvedFactory<Host>]) -> Vec<String> {
        resolved
            .iter()
            .map(|r| r.key().identifier().path().to_owned())
            .collect()
    }

    #[test]
    fn test_resolution_is_root_first_then_registration_order() {
        let mut keys = ComponentRegistry::new();
        let a = keys.register::<u32>("tether:a").unwrap();
        let b = keys.register::<u32>("tether:b").unwrap();
        let c = keys.register::<u32>("tether:c").unwrap();

        let mut registry = registry();
        registry.register_for(CHILD, &c, |_| Ok(Rc::new(3))).unwrap();
        registry.register_for(BASE, &b, |_| Ok(Rc::new(2))).unwrap();
        registry.register_for(BASE, &a, |_| Ok(Rc::new(1))).unwrap();

        let resolved = registry.get_factories(CHILD).unwrap();
        assert_eq!(names(&resolved), vec!["b", "a", "c"]);
        assert_eq!(names(&registry.get_factories(BASE).unwrap()), vec!["b", "a"]);
    }

    #[test]
    fn test_subtype_factory_replaces_ancestor_in_place() {
        let mut keys = ComponentRegistry::new();
        let a = keys.register::<u32>("tether:a").unwrap();
        let b = keys.register::<u32>("tether:b").unwrap();

        let mut registry = registry();
        registry.register_for(BASE, &a, |_| Ok(Rc::new(1))).unwrap();
        registry.register_for(BASE, &b, |_| Ok(Rc::new(2))).unwrap();
        registry.register_for(CHILD, &a, |_| Ok(Rc::new(10))).unwrap();

        let resolved = registry.get_factories(CHILD).unwrap();
        assert_eq!(names(&resolved), vec!["a", "b"]);
        assert_eq!(resolved[0].origin(), CHILD);
        assert_eq!(resolved[1].origin(), BASE);

        let value = resolved[0].invoke(&Host).unwrap();
        assert_eq!(**value.downcast_ref::<Rc<u32>>().unwrap(), 10);
    }

    #[test]
    fn test_duplicate_factory_on_same_type_fails() {
        let mut keys = ComponentRegistry::new();
        let a = keys.register::<u32>("tether:a").unwrap();
        let mut registry = registry();
        registry.register_for(BASE, &a, |_| Ok(Rc::new(1))).unwrap();
        let err = registry.register_for(BASE, &a, |_| Ok(Rc::new(2))).unwrap_err();
        assert!(matches!(err, ComponentError::DuplicateFactory { .. }));
    }

    #[test]
    fn test_unknown_host_type_fails() {
        let mut keys = ComponentRegistry::new();
        let a = keys.register::<u32>("tether:a").unwrap();
        let mut registry = registry();
        let err = registry
            .register_for(HostTypeId::from_name("nope"), &a, |_| Ok(Rc::new(1)))
            .unwrap_err();
        assert!(matches!(err, ComponentError::UnknownHostType(_)));
    }

    #[test]
    fn test_registration_after_freeze_fails() {
        let mut keys = ComponentRegistry::new();
        let a = keys.register::<u32>("tether:a").unwrap();
        let b = keys.register::<u32>("tether:b").unwrap();
        let mut registry = registry();
        registry.register_for(BASE, &a, |_| Ok(Rc::new(1))).unwrap();

        assert!(!registry.is_frozen());
        registry.get_factories(BASE).unwrap();
        assert!(registry.is_frozen());

        let err = registry.register_for(BASE, &b, |_| Ok(Rc::new(2))).unwrap_err();
        assert!(matches!(err, ComponentError::RegistryFrozen { .. }));
        let err = registry.decorate_for(BASE, &a, |_, c| Ok(c)).unwrap_err();
        assert!(matches!(err, ComponentError::RegistryFrozen { .. }));
        assert!(registry.declare_host_type("late", None).is_err());
    }

    #[test]
    fn test_decorators_run_ancestors_first() {
        let mut keys = ComponentRegistry::new();
        let log_key = keys.register::<RefCell<Vec<&'static str>>>("tether:log").unwrap();

        let mut registry = registry();
        registry
            .register_for(BASE, &log_key, |_| Ok(Rc::new(RefCell::new(vec!["factory"]))))
            .unwrap();
        registry
            .decorate_for(CHILD, &log_key, |_, log| {
                log.borrow_mut().push("child");
                Ok(log)
            })
            .unwrap();
        registry
            .decorate_for(BASE, &log_key, |_, log| {
                log.borrow_mut().push("base");
                Ok(log)
            })
            .unwrap();

        let resolved = registry.get_factories(CHILD).unwrap();
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].decorator_count(), 2);
        let value = resolved[0].invoke(&Host).unwrap();
        let log = value.downcast_ref::<Rc<RefCell<Vec<&'static str>>>>().unwrap();
        assert_eq!(*log.borrow(), vec!["factory", "base", "child"]);
    }

    #[test]
    fn test_decorator_without_factory_is_inert() {
        let mut keys = ComponentRegistry::new();
        let a = keys.register::<u32>("tether:a").unwrap();
        let mut registry = registry();
        registry.decorate_for(CHILD, &a, |_, c| Ok(c)).unwrap();
        assert!(registry.get_factories(CHILD).unwrap().is_empty());
    }

    #[test]
    fn test_resolution_is_cached() {
        let mut keys = ComponentRegistry::new();
        let a = keys.register::<u32>("tether:a").unwrap();
        let mut registry = registry();
        registry.register_for(BASE, &a, |_| Ok(Rc::new(1))).unwrap();
        let first = registry.get_factories(CHILD).unwrap();
        let second = registry.get_factories(CHILD).unwrap();
        assert!(Rc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_resolving_unknown_host_type_keeps_registry_open() {
        let mut keys = ComponentRegistry::new();
        let a = keys.register::<u32>("tether:a").unwrap();
        let mut registry = registry();
        let err = registry.get_factories(HostTypeId::from_name("nope")).unwrap_err();
        assert!(matches!(err, ComponentError::UnknownHostType(_)));
        assert!(!registry.is_frozen());
        registry.register_for(BASE, &a, |_| Ok(Rc::new(1))).unwrap();
    }

    #[test]
    fn test_keys_from_another_registry_conflict_on_shared_slot() {
        let mut mod_a = ComponentRegistry::new();
        let energy = mod_a.register::<u32>("mod_a:energy").unwrap();
        let mut mod_b = ComponentRegistry::new();
        let heat = mod_b.register::<u32>("mod_b:heat").unwrap();

        let mut registry = registry();
        registry.register_for(BASE, &energy, |_| Ok(Rc::new(42))).unwrap();
        let err = registry.register_for(CHILD, &heat, |_| Ok(Rc::new(7))).unwrap_err();
        match err {
            ComponentError::SlotConflict { key, existing, index } => {
                assert_eq!(key, "mod_b:heat");
                assert_eq!(existing, "mod_a:energy");
                assert_eq!(index, 0);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(matches!(
            registry.decorate_for(BASE, &heat, |_, c| Ok(c)),
            Err(ComponentError::SlotConflict { .. })
        ));
        assert_eq!(names(&registry.get_factories(CHILD).unwrap()), vec!["energy"]);
    }
}
