//! # tether_component
//!
//! Attach strongly-typed components to host objects (chunks, block
//! entities, ...) without changing the host types.
//!
//! This crate provides:
//!
//! - [`ComponentRegistry`]: the process-wide table of [`ComponentKey`]s.
//! - [`HostTypeTable`]: declared host types and their `extends` relation.
//! - [`ComponentFactoryRegistry`]: per-host-type factories, frozen on first use.
//! - [`ComponentContainer`]: the realised components of one host object.
//! - [`Capability`]: checked upcasts used by capability lookups.
//!
//! ## Threading
//!
//! Everything here is single-threaded: components are shared through `Rc`
//! and the factory registry uses `Cell`/`RefCell` internally. A host object
//! and its container belong to one thread. Components that need to be read
//! from elsewhere must arrange that themselves.

pub mod capability;
pub mod container;
pub mod error;
pub mod factory;
pub mod hierarchy;
pub mod identifier;
pub mod key;
pub mod registry;

pub use capability::Capability;
pub use container::{Attached, ComponentContainer, ComponentProvider};
pub use error::{BoxError, ComponentError};
pub use factory::{ComponentFactoryRegistry, FactoryResult, ResolvedFactory};
pub use hierarchy::{HierarchyConfig, HostObject, HostTypeDecl, HostTypeId, HostTypeTable};
pub use identifier::Identifier;
pub use key::{ComponentKey, ComponentKeyId, ErasedKey};
pub use registry::ComponentRegistry;
