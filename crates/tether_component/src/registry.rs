//! Component key registry.
//!
//! The [`ComponentRegistry`] is the single table of component keys for a
//! process. It is an explicit value created once during bootstrap and passed
//! to every module that registers keys; there is no hidden global.

use std::any::TypeId;
use std::collections::HashMap;

use tracing::debug;

use crate::error::ComponentError;
use crate::identifier::Identifier;
use crate::key::{ComponentKey, ErasedKey};

/// Registration record for one key.
#[derive(Debug, Clone)]
struct KeyEntry {
    index: u32,
    type_id: TypeId,
    type_name: &'static str,
}

/// Registry of all component keys.
#[derive(Debug, Default)]
pub struct ComponentRegistry {
    /// Keys by identifier.
    entries: HashMap<Identifier, KeyEntry>,
    /// Identifiers in registration order; position is the key index.
    order: Vec<Identifier>,
}

impl ComponentRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Register a component key with declared type `C`.
    ///
    /// Registering the same identifier again with the same `C` returns an
    /// equal key.
    ///
    /// # Errors
    ///
    /// - [`ComponentError::InvalidIdentifier`] if `identifier` does not parse.
    /// - [`ComponentError::DuplicateKey`] if the identifier is bound to a
    ///   different component type.
    /// - [`ComponentError::TooManyKeys`] if every `u32` slot index is taken.
    pub fn register<C: ?Sized + 'static>(
        &mut self,
        identifier: &str,
    ) -> Result<ComponentKey<C>, ComponentError> {
        let identifier = Identifier::parse(identifier)?;
        let type_id = TypeId::of::<C>();
        let type_name = std::any::type_name::<C>();

        if let Some(entry) = self.entries.get(&identifier) {
            if entry.type_id != type_id {
                return Err(ComponentError::DuplicateKey {
                    identifier: identifier.to_string(),
                    existing: entry.type_name,
                    requested: type_name,
                });
            }
            return Ok(ComponentKey::new(identifier, entry.index));
        }

        let index = next_index(self.order.len(), &identifier)?;
        debug!(key = %identifier, index, component = type_name, "registered component key");
        self.entries.insert(
            identifier.clone(),
            KeyEntry {
                index,
                type_id,
                type_name,
            },
        );
        self.order.push(identifier.clone());
        Ok(ComponentKey::new(identifier, index))
    }

    /// Look up an existing key by identifier.
    ///
    /// Returns `None` if the identifier is unknown or bound to a type other
    /// than `C`.
    #[must_use]
    pub fn get_key<C: ?Sized + 'static>(&self, identifier: &str) -> Option<ComponentKey<C>> {
        let identifier = Identifier::parse(identifier).ok()?;
        let entry = self.entries.get(&identifier)?;
        (entry.type_id == TypeId::of::<C>()).then(|| ComponentKey::new(identifier, entry.index))
    }

    /// Returns `true` if a key with this identifier exists.
    #[must_use]
    pub fn contains(&self, identifier: &str) -> bool {
        Identifier::parse(identifier).is_ok_and(|id| self.entries.contains_key(&id))
    }

    /// Returns the number of registered keys.
    #[must_use]
    pub fn key_count(&self) -> usize {
        self.order.len()
    }

    /// Iterate over all keys in registration order.
    pub fn keys(&self) -> impl Iterator<Item = ErasedKey> + '_ {
        self.order.iter().filter_map(|id| {
            let entry = self.entries.get(id)?;
            Some(ComponentKey::<()>::new(id.clone(), entry.index).erase())
        })
    }
}

/// The slot index for the key registered after `len` others.
fn next_index(len: usize, identifier: &Identifier) -> Result<u32, ComponentError> {
    u32::try_from(len).map_err(|_| ComponentError::TooManyKeys {
        identifier: identifier.to_string(),
    })
}
