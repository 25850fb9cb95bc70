//! Host types and their declared hierarchy.
//!
//! Host objects (chunks, block entities, ...) are identified by a stable
//! [`HostTypeId`] rather than a runtime class. Subtyping is an explicit
//! `extends` relation declared during bootstrap, either through
//! [`HostTypeTable::declare`] or from a JSON [`HierarchyConfig`].

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use serde::Deserialize;

use crate::error::ComponentError;
use crate::key::fnv1a;

/// Stable id of a host type, the FNV-1a hash of its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HostTypeId(pub u64);

impl HostTypeId {
    /// Hash a host type name. Usable in `const` items.
    #[must_use]
    pub const fn from_name(name: &str) -> Self {
        Self(fnv1a(name.as_bytes(), 0xcbf2_9ce4_8422_2325, 0x0100_0000_01b3))
    }
}

impl fmt::Display for HostTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HostType({:#018x})", self.0)
    }
}

/// An object components can be attached to.
pub trait HostObject {
    /// The most specific host type of this object.
    fn host_type(&self) -> HostTypeId;
}

#[derive(Debug, Clone)]
struct HostTypeInfo {
    name: Rc<str>,
    parent: Option<HostTypeId>,
}

/// Table of declared host types and their parents.
#[derive(Debug, Clone, Default)]
pub struct HostTypeTable {
    types: HashMap<HostTypeId, HostTypeInfo>,
}

impl HostTypeTable {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from a parsed configuration document.
    ///
    /// # Errors
    ///
    /// Any error [`HostTypeTable::declare`] would return for an entry.
    pub fn from_config(config: &HierarchyConfig) -> Result<Self, ComponentError> {
        let mut table = Self::new();
        for decl in &config.types {
            table.declare(&decl.name, decl.extends.as_deref())?;
        }
        Ok(table)
    }

    /// Declare a host type, optionally extending an already-declared parent.
    ///
    /// Re-declaring a type with the same parent is a no-op.
    ///
    /// # Errors
    ///
    /// - [`ComponentError::UnknownHostType`] if `parent` has not been declared.
    /// - [`ComponentError::DuplicateHostType`] if `name` was declared with a
    ///   different parent.
    pub fn declare(&mut self, name: &str, parent: Option<&str>) -> Result<HostTypeId, ComponentError> {
        let id = HostTypeId::from_name(name);
        let parent_id = match parent {
            Some(parent) => {
                let parent_id = HostTypeId::from_name(parent);
                if !self.types.contains_key(&parent_id) {
                    return Err(ComponentError::UnknownHostType(parent.to_owned()));
                }
                Some(parent_id)
            }
            None => None,
        };

        if let Some(existing) = self.types.get(&id) {
            if existing.parent == parent_id {
                return Ok(id);
            }
            return Err(ComponentError::DuplicateHostType {
                name: name.to_owned(),
                existing: existing.parent.and_then(|p| self.name_of(p)).map(str::to_owned),
            });
        }

        self.types.insert(
            id,
            HostTypeInfo {
                name: Rc::from(name),
                parent: parent_id,
            },
        );
        Ok(id)
    }

    /// Returns `true` if the host type has been declared.
    #[must_use]
    pub fn contains(&self, id: HostTypeId) -> bool {
        self.types.contains_key(&id)
    }

    /// The declared name of a host type.
    #[must_use]
    pub fn name_of(&self, id: HostTypeId) -> Option<&str> {
        self.types.get(&id).map(|info| &*info.name)
    }

    pub(crate) fn shared_name(&self, id: HostTypeId) -> Option<Rc<str>> {
        self.types.get(&id).map(|info| Rc::clone(&info.name))
    }

    /// The declared parent of a host type.
    #[must_use]
    pub fn parent_of(&self, id: HostTypeId) -> Option<HostTypeId> {
        self.types.get(&id).and_then(|info| info.parent)
    }

    /// The chain of host types from the root ancestor down to `id`, inclusive.
    ///
    /// # Errors
    ///
    /// Returns [`ComponentError::UnknownHostType`] if `id` was never declared.
    pub fn ancestry(&self, id: HostTypeId) -> Result<Vec<HostTypeId>, ComponentError> {
        if !self.types.contains_key(&id) {
            return Err(ComponentError::UnknownHostType(id.to_string()));
        }
        let mut chain = vec![id];
        let mut current = id;
        while let Some(parent) = self.parent_of(current) {
            chain.push(parent);
            current = parent;
        }
        chain.reverse();
        Ok(chain)
    }

    /// Returns `true` if `id` is `ancestor` or extends it transitively.
    #[must_use]
    pub fn is_subtype_of(&self, id: HostTypeId, ancestor: HostTypeId) -> bool {
        let mut current = Some(id);
        while let Some(ty) = current {
            if ty == ancestor {
                return true;
            }
            current = self.parent_of(ty);
        }
        false
    }

    /// Number of declared host types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Returns `true` if no host type has been declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

/// One host type declaration in a [`HierarchyConfig`].
#[derive(Debug, Clone, Deserialize)]
pub struct HostTypeDecl {
    /// The host type name.
    pub name: String,
    /// The parent host type, which must appear earlier in the document.
    #[serde(default)]
    pub extends: Option<String>,
}

/// Declarative host type hierarchy, loaded at process start.
///
/// ```json
/// { "types": [
///     { "name": "block_entity" },
///     { "name": "furnace", "extends": "block_entity" }
/// ] }
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HierarchyConfig {
    /// Declarations in dependency order.
    pub types: Vec<HostTypeDecl>,
}

impl HierarchyConfig {
    /// Parse a JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`ComponentError::InvalidConfig`] if the document is malformed.
    pub fn from_json(json: &str) -> Result<Self, ComponentError> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn furnace_table() -> HostTypeTable {
        let mut table = HostTypeTable::new();
        table.declare("block_entity", None).unwrap();
        table.declare("abstract_furnace", Some("block_entity")).unwrap();
        table.declare("furnace", Some("abstract_furnace")).unwrap();
        table
    }

    #[test]
    fn test_ancestry_is_root_first() {
        let table = furnace_table();
        let chain = table.ancestry(HostTypeId::from_name("furnace")).unwrap();
        assert_eq!(
            chain,
            vec![
                HostTypeId::from_name("block_entity"),
                HostTypeId::from_name("abstract_furnace"),
                HostTypeId::from_name("furnace"),
            ]
        );
    }

    #[test]
    fn test_unknown_parent_is_rejected() {
        let mut table = HostTypeTable::new();
        let err = table.declare("furnace", Some("block_entity")).unwrap_err();
        assert!(matches!(err, ComponentError::UnknownHostType(name) if name == "block_entity"));
    }

    #[test]
    fn test_redeclare_same_parent_is_noop() {
        let mut table = furnace_table();
        assert!(table.declare("furnace", Some("abstract_furnace")).is_ok());
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn test_redeclare_different_parent_fails() {
        let mut table = furnace_table();
        let err = table.declare("furnace", Some("block_entity")).unwrap_err();
        assert!(matches!(err, ComponentError::DuplicateHostType { .. }));
    }

    #[test]
    fn test_is_subtype_of() {
        let table = furnace_table();
        let furnace = HostTypeId::from_name("furnace");
        assert!(table.is_subtype_of(furnace, HostTypeId::from_name("block_entity")));
        assert!(table.is_subtype_of(furnace, furnace));
        assert!(!table.is_subtype_of(HostTypeId::from_name("block_entity"), furnace));
    }

    #[test]
    fn test_ancestry_of_undeclared_type() {
        let table = furnace_table();
        assert!(table.ancestry(HostTypeId::from_name("chest")).is_err());
    }

    #[test]
    fn test_from_json_config() {
        let config = HierarchyConfig::from_json(
            r#"{ "types": [
                { "name": "chunk" },
                { "name": "world_chunk", "extends": "chunk" }
            ] }"#,
        )
        .unwrap();
        let table = HostTypeTable::from_config(&config).unwrap();
        assert_eq!(table.name_of(HostTypeId::from_name("world_chunk")), Some("world_chunk"));
        assert_eq!(
            table.parent_of(HostTypeId::from_name("world_chunk")),
            Some(HostTypeId::from_name("chunk"))
        );
    }

    #[test]
    fn test_config_requires_parent_first() {
        let config = HierarchyConfig::from_json(
            r#"{ "types": [ { "name": "world_chunk", "extends": "chunk" }, { "name": "chunk" } ] }"#,
        )
        .unwrap();
        assert!(HostTypeTable::from_config(&config).is_err());
    }

    #[test]
    fn test_malformed_config() {
        assert!(matches!(
            HierarchyConfig::from_json("{ not json"),
            Err(ComponentError::InvalidConfig(_))
        ));
    }
}
