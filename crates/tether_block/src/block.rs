//! Blocks and block states.

use std::fmt;

use tether_component::{ComponentError, Identifier};

/// Identifier of a block kind, e.g. `tether:furnace`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BlockId(Identifier);

impl BlockId {
    /// Parse a block identifier.
    ///
    /// # Errors
    ///
    /// Returns [`ComponentError::InvalidIdentifier`] for malformed identifiers.
    pub fn new(raw: &str) -> Result<Self, ComponentError> {
        Ok(Self(Identifier::parse(raw)?))
    }

    #[must_use]
    pub fn identifier(&self) -> &Identifier {
        &self.0
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// The state of a placed block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockState {
    block: BlockId,
}

impl BlockState {
    /// Default state of `block`.
    #[must_use]
    pub fn new(block: BlockId) -> Self {
        Self { block }
    }

    #[must_use]
    pub fn block(&self) -> &BlockId {
        &self.block
    }
}
