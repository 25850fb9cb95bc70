//! Typed component keys.
//!
//! A [`ComponentKey`] names one component slot (an abstract capability such
//! as "has an inventory") and doubles as the typed accessor for that slot on
//! any [`ComponentProvider`].
//!
//! ## Stable hashing
//!
//! [`ComponentKeyId`] is derived from the key's identifier with FNV-1a 64-bit,
//! so the same identifier always yields the same id regardless of
//! registration order. The dense [`ComponentKey::index`] is what containers
//! use for O(1) slot access; it depends on registration order and is only
//! meaningful within one [`ComponentRegistry`](crate::ComponentRegistry).

use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::rc::Rc;

use crate::container::ComponentProvider;
use crate::error::ComponentError;
use crate::identifier::Identifier;

/// Stable 64-bit id of a component key, the FNV-1a hash of its identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentKeyId(pub u64);

impl ComponentKeyId {
    /// FNV-1a 64-bit offset basis.
    const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;

    /// FNV-1a 64-bit prime.
    const FNV_PRIME: u64 = 0x0100_0000_01b3;

    /// Hash an identifier string.
    #[must_use]
    pub const fn from_name(name: &str) -> Self {
        Self(fnv1a(name.as_bytes(), Self::FNV_OFFSET_BASIS, Self::FNV_PRIME))
    }
}

pub(crate) const fn fnv1a(bytes: &[u8], basis: u64, prime: u64) -> u64 {
    let mut hash = basis;
    let mut i = 0;
    while i < bytes.len() {
        hash ^= bytes[i] as u64;
        hash = hash.wrapping_mul(prime);
        i += 1;
    }
    hash
}

/// Type-erased view of a key: identifier and slot index.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ErasedKey {
    identifier: Identifier,
    index: u32,
}

impl ErasedKey {
    /// The key's identifier.
    #[must_use]
    pub fn identifier(&self) -> &Identifier {
        &self.identifier
    }

    /// The key's container slot index.
    #[must_use]
    pub fn index(&self) -> u32 {
        self.index
    }
}

/// A typed handle to one component slot.
///
/// Keys are created by [`ComponentRegistry::register`](crate::ComponentRegistry::register)
/// and are equal iff their identifiers are equal. `C` may be unsized, so a
/// key can declare a trait object such as `dyn FluidContainer` as its
/// component type.
///
/// # Examples
///
/// ```rust
/// use std::rc::Rc;
/// use tether_component::{Attached, ComponentFactoryRegistry, ComponentRegistry, HostObject, HostTypeId};
///
/// struct Counter(u32);
///
/// struct Crate;
/// const CRATE: HostTypeId = HostTypeId::from_name("crate");
/// impl HostObject for Crate {
///     fn host_type(&self) -> HostTypeId { CRATE }
/// }
///
/// let mut keys = ComponentRegistry::new();
/// let counter = keys.register::<Counter>("demo:counter").unwrap();
///
/// let mut factories = ComponentFactoryRegistry::<Crate>::new();
/// factories.declare_host_type("crate", None).unwrap();
/// factories.register_for(CRATE, &counter, |_| Ok(Rc::new(Counter(3)))).unwrap();
///
/// let host = Attached::new(Crate, &factories).unwrap();
/// assert_eq!(counter.get(&host).unwrap().0, 3);
/// ```
pub struct ComponentKey<C: ?Sized> {
    identifier: Identifier,
    id: ComponentKeyId,
    index: u32,
    _marker: PhantomData<fn() -> Rc<C>>,
}

impl<C: ?Sized + 'static> ComponentKey<C> {
    pub(crate) fn new(identifier: Identifier, index: u32) -> Self {
        Self {
            id: ComponentKeyId::from_name(identifier.as_str()),
            identifier,
            index,
            _marker: PhantomData,
        }
    }

    /// The key's identifier.
    #[must_use]
    pub fn identifier(&self) -> &Identifier {
        &self.identifier
    }

    /// The stable hashed id of this key.
    #[must_use]
    pub fn id(&self) -> ComponentKeyId {
        self.id
    }

    /// The dense slot index used by containers.
    #[must_use]
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Drop the component type, keeping identifier and index.
    #[must_use]
    pub fn erase(&self) -> ErasedKey {
        ErasedKey {
            identifier: self.identifier.clone(),
            index: self.index,
        }
    }

    /// Retrieve the component attached to `provider`.
    ///
    /// # Errors
    ///
    /// Returns [`ComponentError::MissingComponent`] if no factory for this key
    /// was registered on the provider's host type or any of its ancestors.
    /// That is a wiring bug; use [`get_nullable`](Self::get_nullable) where
    /// the attachment is genuinely optional.
    pub fn get<'a, P>(&self, provider: &'a P) -> Result<&'a C, ComponentError>
    where
        P: ComponentProvider + ?Sized,
    {
        let container = provider.component_container();
        container
            .get(self)
            .ok_or_else(|| ComponentError::MissingComponent {
                key: self.identifier.to_string(),
                host_type: container.host_type_name().to_owned(),
            })
    }

    /// Retrieve the component attached to `provider`, or `None`.
    #[must_use]
    pub fn get_nullable<'a, P>(&self, provider: &'a P) -> Option<&'a C>
    where
        P: ComponentProvider + ?Sized,
    {
        provider.component_container().get(self)
    }

    /// Retrieve a shared handle to the component attached to `provider`.
    ///
    /// Unlike [`get_nullable`](Self::get_nullable) the result is not tied to
    /// the provider's borrow.
    #[must_use]
    pub fn maybe_get<P>(&self, provider: &P) -> Option<Rc<C>>
    where
        P: ComponentProvider + ?Sized,
    {
        provider.component_container().get_shared(self)
    }

    /// Returns `true` if `provider` has a component for this key.
    #[must_use]
    pub fn is_provided_by<P>(&self, provider: &P) -> bool
    where
        P: ComponentProvider + ?Sized,
    {
        provider.component_container().contains(self)
    }
}

impl<C: ?Sized> Clone for ComponentKey<C> {
    fn clone(&self) -> Self {
        Self {
            identifier: self.identifier.clone(),
            id: self.id,
            index: self.index,
            _marker: PhantomData,
        }
    }
}

impl<C: ?Sized> PartialEq for ComponentKey<C> {
    fn eq(&self, other: &Self) -> bool {
        self.identifier == other.identifier
    }
}

impl<C: ?Sized> Eq for ComponentKey<C> {}

impl<C: ?Sized> Hash for ComponentKey<C> {
    fn hash<S: Hasher>(&self, state: &mut S) {
        self.identifier.hash(state);
    }
}

impl<C: ?Sized> fmt::Debug for ComponentKey<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentKey")
            .field("identifier", &self.identifier)
            .field("index", &self.index)
            .field("type", &std::any::type_name::<C>())
            .finish()
    }
}

impl<C: ?Sized> fmt::Display for ComponentKey<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.identifier, f)
    }
}
