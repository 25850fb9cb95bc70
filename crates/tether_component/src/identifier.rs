//! Namespaced identifiers (`namespace:path`).

use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use crate::error::ComponentError;

/// A namespaced identifier such as `tether:fluid_tank`.
///
/// Cloning is cheap; the backing string is shared.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identifier {
    full: Rc<str>,
    split: usize,
}

impl Identifier {
    /// Namespace used when a string has no `:` separator.
    pub const DEFAULT_NAMESPACE: &'static str = "tether";

    /// Build an identifier from a namespace and a path.
    ///
    /// # Errors
    ///
    /// Returns [`ComponentError::InvalidIdentifier`] if either part is empty or
    /// contains characters outside `[a-z0-9_.-]` (the path may also contain `/`).
    pub fn new(namespace: &str, path: &str) -> Result<Self, ComponentError> {
        let valid_namespace = !namespace.is_empty() && namespace.bytes().all(is_namespace_byte);
        let valid_path = !path.is_empty() && path.bytes().all(|b| is_namespace_byte(b) || b == b'/');
        if !valid_namespace || !valid_path {
            return Err(ComponentError::InvalidIdentifier(format!("{namespace}:{path}")));
        }
        Ok(Self {
            full: Rc::from(format!("{namespace}:{path}")),
            split: namespace.len(),
        })
    }

    /// Parse `namespace:path`, or a bare `path` in the default namespace.
    ///
    /// # Errors
    ///
    /// See [`Identifier::new`].
    pub fn parse(raw: &str) -> Result<Self, ComponentError> {
        match raw.split_once(':') {
            Some((namespace, path)) => Self::new(namespace, path),
            None => Self::new(Self::DEFAULT_NAMESPACE, raw),
        }
    }

    /// The namespace part.
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.full[..self.split]
    }

    /// The path part.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.full[self.split + 1..]
    }

    /// The full `namespace:path` string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.full
    }
}

fn is_namespace_byte(b: u8) -> bool {
    b.is_ascii_lowercase() || b.is_ascii_digit() || matches!(b, b'_' | b'-' | b'.')
}

impl FromStr for Identifier {
    type Err = ComponentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full)
    }
}
