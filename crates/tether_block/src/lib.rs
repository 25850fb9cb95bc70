//! # tether_block
//!
//! Block entities as component hosts, and capability lookups over a block
//! world.
//!
//! - [`World`]: blocks and block entities by position.
//! - [`BlockEntity`]: a block entity with its attached components.
//! - [`ApiLookup`]: "find me something implementing `A` at this position,
//!   given context `T`", resolved through block-specific providers,
//!   block-entity-type providers and generic fallbacks.
//! - [`expose`]: publish components through an [`ApiLookup`].

pub mod block;
pub mod block_entity;
pub mod expose;
pub mod lookup;
pub mod world;

pub use block::{BlockId, BlockState};
pub use block_entity::{BlockEntity, BlockEntityComponents, BlockEntityData, BlockEntityType};
pub use expose::{api_lookup, expose_api, expose_api_for, expose_api_mapped};
pub use lookup::{ApiLookup, BlockQuery, ProviderResult};
pub use world::World;
