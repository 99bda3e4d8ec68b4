//! Dependency cache
//!
//! Memoizes, per class id, the introspection result: the constructor
//! metadata and the derived default dependency list. The cache is owned by
//! the engine instance that created it, never process-global, so isolated
//! engines start cold. Writes happen only on first sight of a class and are
//! idempotent, which makes the unsynchronized first-population race safe.

use crate::dependency::Dependency;
use crate::shape::{ClassShape, ParamSpec, ShapeRegistry};
use crate::{DiError, Result};
use ahash::RandomState;
use dashmap::DashMap;
use std::sync::Arc;

/// Cached introspection result for one class.
#[derive(Debug)]
pub struct IntrospectedClass {
    /// The shape as registered
    pub(crate) shape: Arc<ClassShape>,
    /// Ordered constructor parameter records
    pub(crate) metadata: Arc<[ParamSpec]>,
    /// Derived default dependency list, keyed by parameter name
    pub(crate) defaults: Vec<(String, Dependency)>,
}

impl IntrospectedClass {
    /// Ordered constructor metadata.
    #[inline]
    pub fn metadata(&self) -> &[ParamSpec] {
        &self.metadata
    }

    /// Default dependency list in declaration order.
    #[inline]
    pub fn defaults(&self) -> &[(String, Dependency)] {
        &self.defaults
    }
}

/// Per-engine memo of introspection results, keyed by class id.
pub struct DependencyCache {
    entries: DashMap<String, Arc<IntrospectedClass>, RandomState>,
}

impl DependencyCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self {
            entries: DashMap::with_capacity_and_hasher_and_shard_amount(0, RandomState::new(), 8),
        }
    }

    /// Introspect a class, returning the cached pair when present.
    ///
    /// Fails with `NotInstantiable` when no shape is registered for the
    /// class id. Cached entries are never invalidated; class shapes are
    /// assumed static for the engine's lifetime.
    pub fn introspect(
        &self,
        shapes: &ShapeRegistry,
        class: &str,
    ) -> Result<Arc<IntrospectedClass>> {
        if let Some(entry) = self.entries.get(class) {
            #[cfg(feature = "logging")]
            tracing::trace!(
                target: "autowire",
                class = class,
                "Constructor metadata served from dependency cache"
            );
            return Ok(Arc::clone(entry.value()));
        }

        let shape = shapes
            .get(class)
            .ok_or_else(|| DiError::not_instantiable(class, "no shape registered for class"))?;

        #[cfg(feature = "logging")]
        tracing::debug!(
            target: "autowire",
            class = class,
            params = shape.params().len(),
            "Introspecting class shape (cache miss)"
        );

        let entry = Arc::new(IntrospectedClass {
            metadata: shape.params(),
            defaults: shape.default_dependencies(),
            shape,
        });
        self.entries.insert(class.to_string(), Arc::clone(&entry));
        Ok(entry)
    }

    /// Number of cached classes.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop all cached introspection results.
    pub fn clear(&self) {
        self.entries.clear();
    }
}

impl Default for DependencyCache {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for DependencyCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DependencyCache")
            .field("count", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::ClassShape;
    use crate::value;

    fn shapes_with_widget() -> ShapeRegistry {
        let shapes = ShapeRegistry::new();
        shapes.register(
            ClassShape::new("app.widget")
                .param(ParamSpec::new("store").of_type("app.store"))
                .param(ParamSpec::new("size").with_default(value(4u32))),
        );
        shapes
    }

    #[test]
    fn introspection_is_cached() {
        let shapes = shapes_with_widget();
        let cache = DependencyCache::new();

        let first = cache.introspect(&shapes, "app.widget").unwrap();
        assert_eq!(cache.len(), 1);

        let second = cache.introspect(&shapes, "app.widget").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn repeated_introspection_yields_identical_metadata() {
        let shapes = shapes_with_widget();
        let cache = DependencyCache::new();

        let first = cache.introspect(&shapes, "app.widget").unwrap();
        cache.clear();
        let second = cache.introspect(&shapes, "app.widget").unwrap();

        assert_eq!(first.metadata().len(), second.metadata().len());
        for (a, b) in first.metadata().iter().zip(second.metadata().iter()) {
            assert_eq!(a.name(), b.name());
            assert_eq!(a.type_names(), b.type_names());
            assert_eq!(a.is_variadic(), b.is_variadic());
            assert_eq!(a.default().is_some(), b.default().is_some());
        }
        assert_eq!(first.defaults().len(), second.defaults().len());
    }

    #[test]
    fn unknown_class_fails_not_instantiable() {
        let shapes = ShapeRegistry::new();
        let cache = DependencyCache::new();
        let err = cache.introspect(&shapes, "app.ghost").unwrap_err();
        assert!(matches!(err, DiError::NotInstantiable { .. }));
        assert!(err.to_string().contains("app.ghost"));
    }

    #[test]
    fn parameterless_shape_yields_empty_metadata() {
        let shapes = ShapeRegistry::new();
        shapes.register(ClassShape::new("app.unit").constructor(|_args| Ok(())));
        let cache = DependencyCache::new();

        let entry = cache.introspect(&shapes, "app.unit").unwrap();
        assert!(entry.metadata().is_empty());
        assert!(entry.defaults().is_empty());
    }
}
