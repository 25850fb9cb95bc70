//! Per-host component containers.
//!
//! A [`ComponentContainer`] holds the realised components of exactly one host
//! object, one slot per key index. It is built in a single batch when the
//! host object is created and is read-only afterwards: there is no removal
//! or replacement API. Dropping the host drops its container.

use std::any::Any;
use std::fmt;
use std::ops::Deref;
use std::rc::Rc;

use tracing::trace;

use crate::error::ComponentError;
use crate::factory::ComponentFactoryRegistry;
use crate::hierarchy::{HostObject, HostTypeId};
use crate::identifier::Identifier;
use crate::key::{ComponentKey, ErasedKey};

/// Anything that exposes a [`ComponentContainer`] and can therefore be
/// queried with a [`ComponentKey`].
pub trait ComponentProvider {
    /// The container holding this object's components.
    fn component_container(&self) -> &ComponentContainer;
}

impl ComponentProvider for ComponentContainer {
    fn component_container(&self) -> &ComponentContainer {
        self
    }
}

/// One filled slot: the owning key's identifier and the boxed `Rc<C>`.
struct Slot {
    identifier: Identifier,
    component: Box<dyn Any>,
}

/// Realised components for one host object.
///
/// Each slot stores an `Rc<C>` boxed as `dyn Any` together with the
/// identifier of the key that filled it. A read must match both the
/// identifier and the declared type `C`, so a key never observes another
/// key's component, even one from a different [`ComponentRegistry`](crate::ComponentRegistry)
/// that happens to share its index.
pub struct ComponentContainer {
    host_type: HostTypeId,
    host_type_name: Rc<str>,
    /// Slots indexed by key index.
    slots: Vec<Option<Slot>>,
    /// Keys in construction order.
    keys: Vec<ErasedKey>,
}

impl ComponentContainer {
    /// Build the container for `host` by running every factory resolved for
    /// `host_type`, in resolution order.
    ///
    /// Resolving factories freezes `registry`.
    ///
    /// # Errors
    ///
    /// - [`ComponentError::UnknownHostType`] if `host_type` is not declared.
    /// - [`ComponentError::ContainerBuild`] if any factory or decorator fails.
    ///   Components built before the failure are dropped; no partially
    ///   populated container is returned.
    pub fn build<H: ?Sized + 'static>(
        registry: &ComponentFactoryRegistry<H>,
        host_type: HostTypeId,
        host: &H,
    ) -> Result<Self, ComponentError> {
        let factories = registry.get_factories(host_type)?;
        let host_type_name = registry
            .hierarchy()
            .shared_name(host_type)
            .ok_or_else(|| ComponentError::UnknownHostType(host_type.to_string()))?;

        let slot_count = factories
            .iter()
            .map(|f| f.key().index() as usize + 1)
            .max()
            .unwrap_or(0);
        let mut container = Self {
            host_type,
            host_type_name,
            slots: Vec::with_capacity(slot_count),
            keys: Vec::with_capacity(factories.len()),
        };
        container.slots.resize_with(slot_count, || None);

        for factory in factories.iter() {
            trace!(key = %factory.key().identifier(), host_type = %container.host_type_name, "invoking component factory");
            let component = factory
                .invoke(host)
                .map_err(|source| ComponentError::ContainerBuild {
                    key: factory.key().identifier().to_string(),
                    host_type: container.host_type_name.to_string(),
                    source,
                })?;
            container.slots[factory.key().index() as usize] = Some(Slot {
                identifier: factory.key().identifier().clone(),
                component,
            });
            container.keys.push(factory.key().clone());
        }
        Ok(container)
    }

    /// Borrow the component for `key`, if attached.
    #[must_use]
    pub fn get<C: ?Sized + 'static>(&self, key: &ComponentKey<C>) -> Option<&C> {
        self.slot(key).map(|rc| &**rc)
    }

    /// A shared handle to the component for `key`, if attached.
    #[must_use]
    pub fn get_shared<C: ?Sized + 'static>(&self, key: &ComponentKey<C>) -> Option<Rc<C>> {
        self.slot(key).map(Rc::clone)
    }

    /// Returns `true` if a component for `key` is attached.
    #[must_use]
    pub fn contains<C: ?Sized + 'static>(&self, key: &ComponentKey<C>) -> bool {
        self.slot(key).is_some()
    }

    fn slot<C: ?Sized + 'static>(&self, key: &ComponentKey<C>) -> Option<&Rc<C>> {
        let slot = self.slots.get(key.index() as usize)?.as_ref()?;
        if slot.identifier != *key.identifier() {
            return None;
        }
        slot.component.downcast_ref::<Rc<C>>()
    }

    /// The host type this container was built for.
    #[must_use]
    pub fn host_type(&self) -> HostTypeId {
        self.host_type
    }

    /// The declared name of the host type.
    #[must_use]
    pub fn host_type_name(&self) -> &str {
        &self.host_type_name
    }

    /// Keys of the attached components, in construction order.
    pub fn keys(&self) -> impl Iterator<Item = &ErasedKey> {
        self.keys.iter()
    }

    /// Number of attached components.
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Returns `true` if no component is attached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl fmt::Debug for ComponentContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentContainer")
            .field("host_type", &self.host_type_name)
            .field(
                "keys",
                &self.keys.iter().map(|k| k.identifier().as_str()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// A host object together with its component container.
///
/// `Attached::new` is the construction path for hosts that do not embed a
/// container themselves: the host value is only returned once its container
/// has been fully built.
#[derive(Debug)]
pub struct Attached<H> {
    host: H,
    components: ComponentContainer,
}

impl<H: HostObject + 'static> Attached<H> {
    /// Attach components to `host`.
    ///
    /// # Errors
    ///
    /// See [`ComponentContainer::build`]. On error `host` is dropped.
    pub fn new(host: H, registry: &ComponentFactoryRegistry<H>) -> Result<Self, ComponentError> {
        let components = ComponentContainer::build(registry, host.host_type(), &host)?;
        Ok(Self { host, components })
    }
}

impl<H> Attached<H> {
    /// The wrapped host object.
    #[must_use]
    pub fn host(&self) -> &H {
        &self.host
    }
}

impl<H> Deref for Attached<H> {
    type Target = H;

    fn deref(&self) -> &H {
        &self.host
    }
}

impl<H> ComponentProvider for Attached<H> {
    fn component_container(&self) -> &ComponentContainer {
        &self.components
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::ComponentRegistry;

    #[derive(Debug)]
    struct Crate {
        kind: HostTypeId,
        label: &'static str,
    }

    impl HostObject for Crate {
        fn host_type(&self) -> HostTypeId {
            self.kind
        }
    }

    const STORAGE: HostTypeId = HostTypeId::from_name("storage");
    const CRATE: HostTypeId = HostTypeId::from_name("crate");
    const BARREL: HostTypeId = HostTypeId::from_name("barrel");

    fn factories() -> ComponentFactoryRegistry<Crate> {
        let mut registry = ComponentFactoryRegistry::new();
        registry.declare_host_type("storage", None).unwrap();
        registry.declare_host_type("crate", Some("storage")).unwrap();
        registry.declare_host_type("barrel", Some("storage")).unwrap();
        registry
    }

    trait Named {
        fn name(&self) -> String;
    }

    struct Label(String);

    impl Named for Label {
        fn name(&self) -> String {
            self.0.clone()
        }
    }

    #[test]
    fn test_get_returns_factory_product() {
        let mut keys = ComponentRegistry::new();
        let slots = keys.register::<u32>("tether:slots").unwrap();
        let mut registry = factories();
        registry
            .register_for(STORAGE, &slots, |c: &Crate| Ok(Rc::new(c.label.len() as u32)))
            .unwrap();

        let host = Attached::new(Crate { kind: CRATE, label: "abcd" }, &registry).unwrap();
        assert_eq!(*slots.get(&host).unwrap(), 4);
        assert_eq!(host.label, "abcd");
    }

    #[test]
    fn test_unregistered_key_is_missing() {
        let mut keys = ComponentRegistry::new();
        let slots = keys.register::<u32>("tether:slots").unwrap();
        let hoops = keys.register::<u8>("tether:hoops").unwrap();
        let mut registry = factories();
        registry.register_for(BARREL, &hoops, |_| Ok(Rc::new(3))).unwrap();

        let host = Attached::new(Crate { kind: CRATE, label: "" }, &registry).unwrap();
        let err = hoops.get(&host).unwrap_err();
        assert!(err.is_missing_component());
        assert_eq!(
            err.to_string(),
            "component 'tether:hoops' is not attached to host type 'crate'"
        );
        assert!(hoops.get_nullable(&host).is_none());
        assert!(hoops.maybe_get(&host).is_none());
        assert!(!slots.is_provided_by(&host));
        assert!(host.component_container().is_empty());
    }

    #[test]
    fn test_trait_object_components() {
        let mut keys = ComponentRegistry::new();
        let named = keys.register::<dyn Named>("tether:named").unwrap();
        let mut registry = factories();
        registry
            .register_for(STORAGE, &named, |c: &Crate| {
                Ok(Rc::new(Label(c.label.to_owned())) as Rc<dyn Named>)
            })
            .unwrap();

        let host = Attached::new(Crate { kind: BARREL, label: "oak" }, &registry).unwrap();
        assert_eq!(named.get(&host).unwrap().name(), "oak");
        let shared = named.maybe_get(&host).unwrap();
        assert_eq!(shared.name(), "oak");
    }

    #[test]
    fn test_each_host_gets_its_own_component() {
        let mut keys = ComponentRegistry::new();
        let counter = keys.register::<RefCell<u32>>("tether:counter").unwrap();
        let mut registry = factories();
        registry
            .register_for(STORAGE, &counter, |_| Ok(Rc::new(RefCell::new(0))))
            .unwrap();

        let a = Attached::new(Crate { kind: CRATE, label: "a" }, &registry).unwrap();
        let b = Attached::new(Crate { kind: CRATE, label: "b" }, &registry).unwrap();
        *counter.get(&a).unwrap().borrow_mut() += 5;
        assert_eq!(*counter.get(&a).unwrap().borrow(), 5);
        assert_eq!(*counter.get(&b).unwrap().borrow(), 0);
    }

    #[test]
    fn test_factory_order_is_deterministic() {
        fn run() -> Vec<&'static str> {
            let calls = Rc::new(RefCell::new(Vec::new()));
            let mut keys = ComponentRegistry::new();
            let a = keys.register::<()>("tether:a").unwrap();
            let b = keys.register::<()>("tether:b").unwrap();
            let c = keys.register::<()>("tether:c").unwrap();
            let mut registry = factories();
            for (ty, key, name) in [(CRATE, &c, "c"), (STORAGE, &b, "b"), (STORAGE, &a, "a")] {
                let calls = Rc::clone(&calls);
                registry
                    .register_for(ty, key, move |_| {
                        calls.borrow_mut().push(name);
                        Ok(Rc::new(()))
                    })
                    .unwrap();
            }
            let host = Attached::new(Crate { kind: CRATE, label: "" }, &registry).unwrap();
            assert_eq!(host.component_container().len(), 3);
            let order = calls.borrow().clone();
            order
        }

        let first = run();
        assert_eq!(first, vec!["b", "a", "c"]);
        assert_eq!(first, run());
    }

    #[test]
    fn test_failing_factory_aborts_build() {
        let mut keys = ComponentRegistry::new();
        let ok = keys.register::<u32>("tether:ok").unwrap();
        let broken = keys.register::<u32>("tether:broken").unwrap();
        let mut registry = factories();
        registry.register_for(STORAGE, &ok, |_| Ok(Rc::new(1))).unwrap();
        registry
            .register_for(CRATE, &broken, |_| Err("out of wood".into()))
            .unwrap();

        let err = Attached::new(Crate { kind: CRATE, label: "" }, &registry).unwrap_err();
        match err {
            ComponentError::ContainerBuild { key, host_type, source } => {
                assert_eq!(key, "tether:broken");
                assert_eq!(host_type, "crate");
                assert_eq!(source.to_string(), "out of wood");
            }
            other => panic!("unexpected error: {other}"),
        }

        // Other host types are unaffected.
        let barrel = Attached::new(Crate { kind: BARREL, label: "" }, &registry).unwrap();
        assert_eq!(*ok.get(&barrel).unwrap(), 1);
    }

    #[test]
    fn test_build_freezes_registry() {
        let mut keys = ComponentRegistry::new();
        let ok = keys.register::<u32>("tether:ok").unwrap();
        let mut registry = factories();
        let _host = Attached::new(Crate { kind: CRATE, label: "" }, &registry).unwrap();
        assert!(registry.is_frozen());
        assert!(matches!(
            registry.register_for(CRATE, &ok, |_| Ok(Rc::new(1))),
            Err(ComponentError::RegistryFrozen { .. })
        ));
    }

    #[test]
    fn test_key_registered_after_build_is_absent() {
        let mut keys = ComponentRegistry::new();
        let ok = keys.register::<u32>("tether:ok").unwrap();
        let mut registry = factories();
        registry.register_for(STORAGE, &ok, |_| Ok(Rc::new(1))).unwrap();
        let host = Attached::new(Crate { kind: CRATE, label: "" }, &registry).unwrap();

        let late = keys.register::<u32>("tether:late").unwrap();
        assert!(late.get_nullable(&host).is_none());
        assert_eq!(host.component_container().keys().count(), 1);
    }

    #[test]
    fn test_key_from_other_registry_does_not_alias_slot() {
        let mut mod_a = ComponentRegistry::new();
        let energy = mod_a.register::<u32>("mod_a:energy").unwrap();
        let mut mod_b = ComponentRegistry::new();
        let heat = mod_b.register::<u32>("mod_b:heat").unwrap();
        assert_eq!(energy.index(), heat.index());

        let mut registry = factories();
        registry.register_for(STORAGE, &energy, |_| Ok(Rc::new(42))).unwrap();
        let host = Attached::new(Crate { kind: CRATE, label: "" }, &registry).unwrap();

        assert_eq!(*energy.get(&host).unwrap(), 42);
        assert!(heat.get_nullable(&host).is_none());
        assert!(heat.get(&host).is_err_and(|e| e.is_missing_component()));
        assert!(!heat.is_provided_by(&host));
        assert_eq!(host.host().kind, CRATE);
    }
}
