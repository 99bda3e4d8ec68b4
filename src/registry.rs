//! Registry trait - the engine's single consumed collaborator
//!
//! The resolution engine only ever talks to a named-component registry
//! through this interface. [`crate::Container`] is the bundled
//! implementation; tests plug in mocks to observe lookup behavior.

use crate::{Result, Value};

/// A named-component registry: maps string ids to constructed (or
/// constructible) component values.
pub trait Registry: Send + Sync {
    /// Whether the id is known to the registry.
    fn has(&self, id: &str) -> bool;

    /// Look up a component by id, constructing it if the registration is a
    /// factory or class definition.
    ///
    /// Fails with a NotFound-kind error when the id is absent; construction
    /// failures (including `CircularDependency`) surface unchanged.
    fn get(&self, id: &str) -> Result<Value>;
}
