//! Resolution engine
//!
//! Walks a merged dependency list positionally, replacing every `Instance`
//! placeholder with a registry lookup and recursing into nested lists.
//! Index alignment with the constructor's declared parameter order is
//! preserved throughout; the first unresolvable required placeholder aborts
//! the entire resolution, so a partially resolved argument list is never
//! observable.

use crate::dependency::{Dependency, Value};
use crate::registry::Registry;
use crate::shape::ParamSpec;
use crate::{DiError, Result};
use std::sync::Arc;

#[cfg(feature = "logging")]
use tracing::trace;

/// Resolve a merged dependency list into concrete argument values, aligned
/// with `metadata`.
///
/// Per entry at index `i`:
/// - `Ref` attempts a registry lookup; on NotFound, the aligned parameter's
///   declared default substitutes, else the call fails with
///   `NotInstantiable` naming the parameter and `class`. Non-NotFound
///   lookup failures (such as `CircularDependency`) propagate unchanged.
/// - `List` recurses, producing a `Vec<Value>` value.
/// - `Literal` passes through unchanged.
pub fn resolve(
    merged: &[Dependency],
    metadata: &[ParamSpec],
    class: &str,
    registry: &dyn Registry,
) -> Result<Vec<Value>> {
    let mut resolved = Vec::with_capacity(merged.len());
    for (index, entry) in merged.iter().enumerate() {
        resolved.push(resolve_entry(entry, index, metadata, class, registry)?);
    }
    Ok(resolved)
}

fn resolve_entry(
    entry: &Dependency,
    index: usize,
    metadata: &[ParamSpec],
    class: &str,
    registry: &dyn Registry,
) -> Result<Value> {
    match entry {
        Dependency::Literal(value) => Ok(Value::clone(value)),

        Dependency::Ref(instance) => match registry.get(instance.id()) {
            Ok(value) => {
                #[cfg(feature = "logging")]
                trace!(
                    target: "autowire",
                    class = class,
                    index = index,
                    id = instance.id(),
                    "Placeholder resolved from registry"
                );
                Ok(value)
            }
            Err(err) if err.is_not_found() => {
                // Fall back to the aligned parameter's declared default
                if let Some(default) = metadata.get(index).and_then(ParamSpec::default) {
                    #[cfg(feature = "logging")]
                    trace!(
                        target: "autowire",
                        class = class,
                        index = index,
                        id = instance.id(),
                        "Placeholder absent from registry, using parameter default"
                    );
                    return Ok(Value::clone(default));
                }
                Err(DiError::missing_dependency(
                    class,
                    param_name(metadata, index),
                ))
            }
            Err(err) => Err(err),
        },

        Dependency::List(entries) => {
            // Nested lists carry no parameter alignment of their own; a
            // failed placeholder inside one has no default to fall back to.
            let mut values = Vec::with_capacity(entries.len());
            for (nested_index, nested) in entries.iter().enumerate() {
                values.push(resolve_entry(nested, nested_index, &[], class, registry)?);
            }
            Ok(Arc::new(values) as Value)
        }
    }
}

/// Parameter name for diagnostics: the aligned record's name, the trailing
/// variadic's name for overflow indexes, or the bare position.
fn param_name(metadata: &[ParamSpec], index: usize) -> String {
    if let Some(param) = metadata.get(index) {
        return param.name().to_string();
    }
    match metadata.last() {
        Some(last) if last.is_variadic() => last.name().to_string(),
        _ => format!("#{index}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dependency::downcast;
    use crate::value;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Registry mock that counts lookups per id.
    struct CountingRegistry {
        components: HashMap<String, Value>,
        lookups: Mutex<Vec<String>>,
    }

    impl CountingRegistry {
        fn new(entries: impl IntoIterator<Item = (&'static str, Value)>) -> Self {
            Self {
                components: entries
                    .into_iter()
                    .map(|(id, v)| (id.to_string(), v))
                    .collect(),
                lookups: Mutex::new(Vec::new()),
            }
        }

        fn lookup_count(&self, id: &str) -> usize {
            self.lookups
                .lock()
                .unwrap()
                .iter()
                .filter(|l| l.as_str() == id)
                .count()
        }
    }

    impl Registry for CountingRegistry {
        fn has(&self, id: &str) -> bool {
            self.components.contains_key(id)
        }

        fn get(&self, id: &str) -> Result<Value> {
            self.lookups.lock().unwrap().push(id.to_string());
            self.components
                .get(id)
                .map(Value::clone)
                .ok_or_else(|| DiError::not_found(id))
        }
    }

    fn param(name: &str) -> ParamSpec {
        ParamSpec::new(name)
    }

    #[test]
    fn literals_pass_through_unchanged() {
        let registry = CountingRegistry::new([]);
        let merged = vec![Dependency::value(1u32), Dependency::value(2u32)];
        let resolved = resolve(&merged, &[], "c", &registry).unwrap();
        assert_eq!(resolved.len(), 2);
        assert_eq!(*downcast::<u32>(&resolved[0]).unwrap(), 1);
        assert_eq!(registry.lookups.lock().unwrap().len(), 0);
    }

    #[test]
    fn placeholder_resolves_via_registry() {
        let registry = CountingRegistry::new([("db", value(String::from("postgres")))]);
        let merged = vec![Dependency::reference("db").unwrap()];
        let resolved = resolve(&merged, &[param("db")], "c", &registry).unwrap();
        assert_eq!(*downcast::<String>(&resolved[0]).unwrap(), "postgres");
        assert_eq!(registry.lookup_count("db"), 1);
    }

    #[test]
    fn missing_placeholder_falls_back_to_param_default() {
        let registry = CountingRegistry::new([]);
        let merged = vec![Dependency::reference("absent").unwrap()];
        let metadata = [ParamSpec::new("size").with_default(value(42u32))];
        let resolved = resolve(&merged, &metadata, "c", &registry).unwrap();
        assert_eq!(*downcast::<u32>(&resolved[0]).unwrap(), 42);
    }

    #[test]
    fn missing_placeholder_without_default_fails() {
        let registry = CountingRegistry::new([]);
        let merged = vec![Dependency::reference("absent").unwrap()];
        let err = resolve(&merged, &[param("store")], "app.widget", &registry).unwrap_err();
        assert!(matches!(err, DiError::NotInstantiable { .. }));
        let msg = err.to_string();
        assert!(msg.contains("store"));
        assert!(msg.contains("app.widget"));
    }

    #[test]
    fn nested_lists_resolve_recursively() {
        let registry = CountingRegistry::new([
            ("a", value(1u32)),
            ("b", value(2u32)),
        ]);
        let merged = vec![Dependency::list([
            Dependency::reference("a").unwrap(),
            Dependency::list([Dependency::reference("b").unwrap()]),
            Dependency::value(3u32),
        ])];
        let resolved = resolve(&merged, &[param("items")], "c", &registry).unwrap();

        let outer = downcast::<Vec<Value>>(&resolved[0]).unwrap();
        assert_eq!(outer.len(), 3);
        assert_eq!(*downcast::<u32>(&outer[0]).unwrap(), 1);
        let inner = downcast::<Vec<Value>>(&outer[1]).unwrap();
        assert_eq!(*downcast::<u32>(&inner[0]).unwrap(), 2);
        assert_eq!(*downcast::<u32>(&outer[2]).unwrap(), 3);
    }

    #[test]
    fn nested_failure_aborts_whole_resolution() {
        let registry = CountingRegistry::new([("a", value(1u32))]);
        let merged = vec![
            Dependency::reference("a").unwrap(),
            Dependency::list([Dependency::reference("absent").unwrap()]),
        ];
        let err = resolve(
            &merged,
            &[param("a"), param("items")],
            "app.widget",
            &registry,
        )
        .unwrap_err();
        assert!(matches!(err, DiError::NotInstantiable { .. }));
    }

    #[test]
    fn order_is_preserved() {
        let registry = CountingRegistry::new([("x", value(10u32))]);
        let merged = vec![
            Dependency::value(1u32),
            Dependency::reference("x").unwrap(),
            Dependency::value(3u32),
        ];
        let resolved = resolve(
            &merged,
            &[param("a"), param("b"), param("c")],
            "c",
            &registry,
        )
        .unwrap();
        let values: Vec<u32> = resolved
            .iter()
            .map(|v| *downcast::<u32>(v).unwrap())
            .collect();
        assert_eq!(values, [1, 10, 3]);
    }

    #[test]
    fn non_not_found_errors_propagate_unchanged() {
        struct CircularRegistry;
        impl Registry for CircularRegistry {
            fn has(&self, _id: &str) -> bool {
                true
            }
            fn get(&self, id: &str) -> Result<Value> {
                Err(DiError::circular(id, &[id.to_string()]))
            }
        }

        let merged = vec![Dependency::reference("a").unwrap()];
        // Parameter default exists, but the failure is not NotFound so it
        // must not be masked.
        let metadata = [ParamSpec::new("a").with_default(value(1u32))];
        let err = resolve(&merged, &metadata, "c", &CircularRegistry).unwrap_err();
        assert!(matches!(err, DiError::CircularDependency { .. }));
    }

    #[test]
    fn resolution_is_deterministic() {
        let registry = CountingRegistry::new([("x", value(10u32))]);
        let merged = vec![Dependency::reference("x").unwrap(), Dependency::value(2u32)];
        let metadata = [param("a"), param("b")];

        let first = resolve(&merged, &metadata, "c", &registry).unwrap();
        let second = resolve(&merged, &metadata, "c", &registry).unwrap();
        for (a, b) in first.iter().zip(second.iter()) {
            assert_eq!(
                *downcast::<u32>(a).unwrap(),
                *downcast::<u32>(b).unwrap()
            );
        }
    }
}
