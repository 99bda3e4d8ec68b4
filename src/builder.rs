//! Object builder
//!
//! Drives one construction end to end: cached introspection, override
//! validation and merge, argument resolution, constructor invocation, then
//! post-construction configuration. Resolution errors are reported in
//! preference to instantiability errors: the abstract check happens only
//! after argument resolution succeeds.

use crate::cache::DependencyCache;
use crate::dependency::{Args, Value};
use crate::overrides::{self, Overrides};
use crate::registry::Registry;
use crate::resolve;
use crate::shape::ShapeRegistry;
use crate::{DiError, Result};
use std::sync::Arc;

#[cfg(feature = "logging")]
use tracing::{debug, trace};

/// Definition-map key that scopes constructor overrides, as opposed to the
/// property/setter directives every other key carries.
pub const CONSTRUCT_KEY: &str = "__construct()";

/// A per-construction definition map: constructor-scoped overrides plus
/// post-construction property/setter directives.
///
/// # Examples
///
/// ```rust
/// use autowire::{value, Definitions, Dependency, Overrides};
///
/// let definitions = Definitions::new()
///     .construct(Overrides::named([("retries", Dependency::value(5u32))]))
///     .prop("subject", value(String::from("weekly report")));
/// # let _ = definitions;
/// ```
#[derive(Clone, Default)]
pub struct Definitions {
    construct: Overrides,
    props: Vec<(String, Value)>,
}

impl Definitions {
    /// Empty definition map: pure default construction, no configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the constructor override set (the `__construct()` entry).
    pub fn construct(mut self, overrides: Overrides) -> Self {
        self.construct = overrides;
        self
    }

    /// Add a property/setter directive, applied after construction in
    /// insertion order.
    pub fn prop(mut self, name: impl Into<String>, value: Value) -> Self {
        self.props.push((name.into(), value));
        self
    }

    /// The constructor override set.
    #[inline]
    pub fn constructor_overrides(&self) -> &Overrides {
        &self.construct
    }

    /// The property/setter directives.
    #[inline]
    pub fn props(&self) -> &[(String, Value)] {
        &self.props
    }
}

impl std::fmt::Debug for Definitions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Definitions")
            .field("construct", &self.construct)
            .field("props", &self.props.len())
            .finish()
    }
}

/// Construct and configure one instance of `class`.
///
/// Steps, in order: introspect (cache-checked), validate + merge overrides,
/// resolve arguments, check instantiability, invoke the constructor, apply
/// property directives. The first failure aborts; no partially constructed
/// object is ever returned.
pub(crate) fn build(
    shapes: &ShapeRegistry,
    cache: &DependencyCache,
    registry: &dyn Registry,
    class: &str,
    definitions: &Definitions,
) -> Result<Value> {
    let introspected = cache.introspect(shapes, class)?;

    let valid = definitions.constructor_overrides().validate(class)?;
    let merged = overrides::merge(valid, &introspected, class)?;

    #[cfg(feature = "logging")]
    trace!(
        target: "autowire",
        class = class,
        dependencies = merged.len(),
        "Resolving merged dependency list"
    );

    let args = resolve::resolve(&merged, introspected.metadata(), class, registry)?;

    // Instantiability is checked only now so that dependency resolution
    // failures take precedence over abstract-class failures.
    if !introspected.shape.is_instantiable() {
        return Err(DiError::not_instantiable(
            class,
            "class is abstract or an interface",
        ));
    }

    let mut instance = introspected.shape.construct(Args::new(args))?;

    for (property, value) in definitions.props() {
        introspected
            .shape
            .apply(instance.as_mut(), property, Value::clone(value))?;
    }

    #[cfg(feature = "logging")]
    debug!(
        target: "autowire",
        class = class,
        configured = definitions.props().len(),
        "Instance constructed and configured"
    );

    Ok(Arc::from(instance))
}
