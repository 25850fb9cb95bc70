//! Error types for key registration, factory registration and container
//! construction.

/// A boxed error returned by component factories and decorators.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors raised by the component attachment core.
///
/// Registration errors (`InvalidIdentifier`, `DuplicateKey`,
/// `RegistryFrozen`, `UnknownHostType`, `DuplicateHostType`,
/// `DuplicateFactory`, `SlotConflict`, `DuplicateProvider`, `InvalidConfig`) are wiring
/// mistakes and should abort bootstrap. `MissingComponent` is a programmer
/// error at query time. `ContainerBuild` aborts construction of the host
/// object whose container was being built.
#[derive(Debug, thiserror::Error)]
pub enum ComponentError {
    /// An identifier did not have the `namespace:path` shape.
    #[error("invalid identifier '{0}'")]
    InvalidIdentifier(String),

    /// The identifier is already bound to a component of another type.
    #[error("component key '{identifier}' is already registered with type {existing}, cannot re-register with {requested}")]
    DuplicateKey {
        identifier: String,
        existing: &'static str,
        requested: &'static str,
    },

    /// The registry ran out of `u32` slot indices.
    #[error("cannot register '{identifier}': no slot indices left")]
    TooManyKeys { identifier: String },

    /// Registration attempted after the first container was built.
    #[error("cannot register '{identifier}': the factory registry is frozen")]
    RegistryFrozen { identifier: String },

    /// A host type was referenced before being declared.
    #[error("unknown host type '{0}'")]
    UnknownHostType(String),

    /// A host type was declared twice with different parents.
    #[error("host type '{name}' is already declared with parent {existing:?}")]
    DuplicateHostType {
        name: String,
        existing: Option<String>,
    },

    /// The hierarchy configuration document could not be parsed.
    #[error("invalid hierarchy config: {0}")]
    InvalidConfig(#[from] serde_json::Error),

    /// A second plain factory was registered for the same host type and key.
    #[error("a factory for '{key}' is already registered on host type '{host_type}'")]
    DuplicateFactory { key: String, host_type: String },

    /// Two keys from different key registries share a container slot index.
    #[error("component key '{key}' uses slot {index}, already taken by '{existing}'; keys must come from one registry")]
    SlotConflict {
        key: String,
        existing: String,
        index: u32,
    },

    /// A lookup already has a provider for this block or block entity type.
    #[error("lookup '{lookup}' already has a provider for '{target}'")]
    DuplicateProvider { lookup: String, target: String },

    /// No component for the key is attached to the host object.
    #[error("component '{key}' is not attached to host type '{host_type}'")]
    MissingComponent { key: String, host_type: String },

    /// A factory or decorator failed while building a container.
    #[error("failed to build component '{key}' for host type '{host_type}'")]
    ContainerBuild {
        key: String,
        host_type: String,
        #[source]
        source: BoxError,
    },
}

impl ComponentError {
    /// Returns `true` for errors that indicate absent static wiring rather
    /// than a failure inside a factory.
    #[must_use]
    pub fn is_missing_component(&self) -> bool {
        matches!(self, Self::MissingComponent { .. })
    }
}
