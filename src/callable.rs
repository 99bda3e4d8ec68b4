//! Callable argument resolution
//!
//! The parallel path to constructor resolution: resolves arguments for an
//! arbitrary invocable from its declared signature, the registry, and a set
//! of supplied parameters. Signatures are resolved fresh on every call;
//! callables are not class-cached. Unlike constructor resolution there is no
//! definition merging, and variadic catch-alls are supported.
//!
//! Four callable shapes are handled uniformly: a free function or closure, a
//! `(target, method)` pair, an invocable object, and any value implementing
//! [`Invoke`].

use crate::dependency::{Args, Value};
use crate::registry::Registry;
use crate::shape::ParamSpec;
use crate::{DiError, Result};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

#[cfg(feature = "logging")]
use tracing::trace;

// =============================================================================
// Callable shapes
// =============================================================================

/// Anything with a declared signature that can be called with resolved
/// arguments. Blanket coverage for "is invocable": implement this trait and
/// wrap with [`Callable::object`].
pub trait Invoke: Send + Sync {
    /// Display name used in diagnostics.
    fn name(&self) -> &str;

    /// Declared parameter records, in order.
    fn params(&self) -> &[ParamSpec];

    /// Call with the resolved, positionally-ordered arguments.
    fn call(&self, args: Args) -> Result<Value>;
}

/// Type-erased free function body
type CallFn = Arc<dyn Fn(Args) -> Result<Value> + Send + Sync>;

/// Type-erased bound method body (receives the target first)
type MethodFn = Arc<dyn Fn(&Value, Args) -> Result<Value> + Send + Sync>;

/// An invocable with a declared signature.
///
/// # Examples
///
/// ```rust
/// use autowire::{value, Args, Callable, ParamSpec};
///
/// let double = Callable::function(
///     "double",
///     vec![ParamSpec::new("n")],
///     |args: Args| Ok(value(*args.get::<u32>(0)? * 2)),
/// );
/// # let _ = double;
/// ```
#[derive(Clone)]
pub enum Callable {
    /// Free function or closure
    Function {
        name: String,
        params: Arc<[ParamSpec]>,
        body: CallFn,
    },
    /// Bound `(target, method)` pair
    Method {
        target: Value,
        name: String,
        params: Arc<[ParamSpec]>,
        body: MethodFn,
    },
    /// Invocable object dispatched through its call operator
    Object(Arc<dyn Invoke>),
}

impl Callable {
    /// Wrap a free function or closure.
    pub fn function<F>(name: impl Into<String>, params: Vec<ParamSpec>, body: F) -> Self
    where
        F: Fn(Args) -> Result<Value> + Send + Sync + 'static,
    {
        Self::Function {
            name: name.into(),
            params: params.into(),
            body: Arc::new(body),
        }
    }

    /// Wrap a `(target, method)` pair. The body receives the bound target
    /// followed by the resolved arguments.
    pub fn method<F>(
        target: Value,
        name: impl Into<String>,
        params: Vec<ParamSpec>,
        body: F,
    ) -> Self
    where
        F: Fn(&Value, Args) -> Result<Value> + Send + Sync + 'static,
    {
        Self::Method {
            target,
            name: name.into(),
            params: params.into(),
            body: Arc::new(body),
        }
    }

    /// Wrap an invocable object.
    pub fn object(invocable: impl Invoke + 'static) -> Self {
        Self::Object(Arc::new(invocable))
    }

    /// Display name for diagnostics.
    pub fn name(&self) -> &str {
        match self {
            Self::Function { name, .. } | Self::Method { name, .. } => name,
            Self::Object(o) => o.name(),
        }
    }

    /// Declared parameter records.
    pub fn params(&self) -> &[ParamSpec] {
        match self {
            Self::Function { params, .. } | Self::Method { params, .. } => params,
            Self::Object(o) => o.params(),
        }
    }

    /// Dispatch with already-resolved arguments.
    pub fn call(&self, args: Args) -> Result<Value> {
        match self {
            Self::Function { body, .. } => body(args),
            Self::Method { target, body, .. } => body(target, args),
            Self::Object(o) => o.call(args),
        }
    }
}

impl std::fmt::Debug for Callable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Callable")
            .field("name", &self.name())
            .field("params", &self.params().len())
            .finish()
    }
}

// =============================================================================
// Supplied parameters
// =============================================================================

/// Caller-supplied parameters for a callable: named entries consumed by
/// parameter name, positional entries consumed in order.
///
/// # Examples
///
/// ```rust
/// use autowire::{value, SuppliedParams};
///
/// let supplied = SuppliedParams::new()
///     .with(value(String::from("A")))
///     .with_named("retries", value(2u32));
/// # let _ = supplied;
/// ```
#[derive(Clone, Default)]
pub struct SuppliedParams {
    named: HashMap<String, Value>,
    positional: VecDeque<Value>,
}

impl SuppliedParams {
    /// Create an empty parameter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create from an ordered positional list.
    pub fn positional(values: impl IntoIterator<Item = Value>) -> Self {
        Self {
            named: HashMap::new(),
            positional: values.into_iter().collect(),
        }
    }

    /// Append a positional entry.
    pub fn with(mut self, value: Value) -> Self {
        self.positional.push_back(value);
        self
    }

    /// Add a named entry.
    pub fn with_named(mut self, name: impl Into<String>, value: Value) -> Self {
        self.named.insert(name.into(), value);
        self
    }

    /// Whether nothing was supplied.
    pub fn is_empty(&self) -> bool {
        self.named.is_empty() && self.positional.is_empty()
    }

    fn take_named(&mut self, name: &str) -> Option<Value> {
        self.named.remove(name)
    }

    fn take_positional(&mut self) -> Option<Value> {
        self.positional.pop_front()
    }
}

impl std::fmt::Debug for SuppliedParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SuppliedParams")
            .field("named", &self.named.len())
            .field("positional", &self.positional.len())
            .finish()
    }
}

// =============================================================================
// Resolution
// =============================================================================

/// Resolve a callable's arguments from the registry and supplied parameters.
///
/// Per parameter, in declaration order:
/// 1. Candidate class types are tried against the registry in order; a
///    NotFound for one candidate tries the next, any other failure aborts.
/// 2. On full fallthrough (or no declared types): a named supplied entry is
///    consumed, else the next unconsumed positional entry, else the declared
///    default, else the call fails with `InvalidConfig` naming the parameter
///    and the callable.
/// 3. A variadic parameter drains the remaining supplied entries in
///    encounter order; a drained entry that is itself an argument list is
///    spread element-wise.
pub fn resolve_callable_args(
    callable: &Callable,
    registry: &dyn Registry,
    mut supplied: SuppliedParams,
) -> Result<Vec<Value>> {
    let mut resolved = Vec::with_capacity(callable.params().len());

    for param in callable.params() {
        if param.is_variadic() {
            if let Some(v) = supplied.take_named(param.name()) {
                spread(&mut resolved, v);
            }
            while let Some(v) = supplied.take_positional() {
                spread(&mut resolved, v);
            }
            break;
        }

        if let Some(v) = lookup_candidates(param, registry)? {
            resolved.push(v);
            continue;
        }

        if let Some(v) = supplied.take_named(param.name()) {
            resolved.push(v);
        } else if let Some(v) = supplied.take_positional() {
            resolved.push(v);
        } else if let Some(default) = param.default() {
            resolved.push(Value::clone(default));
        } else {
            return Err(DiError::unresolved_param(callable.name(), param.name()));
        }
    }

    Ok(resolved)
}

/// Resolve arguments, then dispatch the callable.
pub fn invoke(
    callable: &Callable,
    registry: &dyn Registry,
    supplied: SuppliedParams,
) -> Result<Value> {
    let args = resolve_callable_args(callable, registry, supplied)?;

    #[cfg(feature = "logging")]
    trace!(
        target: "autowire",
        callable = callable.name(),
        args = args.len(),
        "Invoking callable with resolved arguments"
    );

    callable.call(Args::new(args))
}

/// Try each candidate class type in declaration order. NotFound falls
/// through to the next candidate; other failures propagate.
fn lookup_candidates(param: &ParamSpec, registry: &dyn Registry) -> Result<Option<Value>> {
    for type_name in param.type_names() {
        match registry.get(type_name) {
            Ok(v) => {
                #[cfg(feature = "logging")]
                trace!(
                    target: "autowire",
                    param = param.name(),
                    candidate = type_name.as_str(),
                    "Callable parameter resolved by candidate type"
                );
                return Ok(Some(v));
            }
            Err(err) if err.is_not_found() => continue,
            Err(err) => return Err(err),
        }
    }
    Ok(None)
}

/// Append a consumed variadic entry; argument-list values spread into their
/// elements.
fn spread(resolved: &mut Vec<Value>, v: Value) {
    match crate::dependency::downcast::<Vec<Value>>(&v) {
        Some(list) => resolved.extend(list.iter().map(Value::clone)),
        None => resolved.push(v),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dependency::downcast;
    use crate::value;
    use std::sync::Mutex;

    struct MapRegistry {
        components: HashMap<String, Value>,
        lookups: Mutex<Vec<String>>,
    }

    impl MapRegistry {
        fn new(entries: impl IntoIterator<Item = (&'static str, Value)>) -> Self {
            Self {
                components: entries
                    .into_iter()
                    .map(|(id, v)| (id.to_string(), v))
                    .collect(),
                lookups: Mutex::new(Vec::new()),
            }
        }

        fn lookups(&self) -> Vec<String> {
            self.lookups.lock().unwrap().clone()
        }
    }

    impl Registry for MapRegistry {
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

    fn concat_all() -> Callable {
        Callable::function(
            "concat_all",
            vec![
                ParamSpec::new("first"),
                ParamSpec::new("rest").variadic(),
            ],
            |args: Args| {
                let mut out = String::new();
                for v in args.remaining(0) {
                    out.push_str(&downcast::<String>(v).unwrap());
                }
                Ok(value(out))
            },
        )
    }

    #[test]
    fn named_entry_is_consumed_first() {
        let registry = MapRegistry::new([]);
        let callable = Callable::function(
            "f",
            vec![ParamSpec::new("a"), ParamSpec::new("b")],
            |args: Args| Ok(value(args.len())),
        );
        let supplied = SuppliedParams::new()
            .with(value(2u32))
            .with_named("a", value(1u32));

        let args = resolve_callable_args(&callable, &registry, supplied).unwrap();
        assert_eq!(*downcast::<u32>(&args[0]).unwrap(), 1);
        assert_eq!(*downcast::<u32>(&args[1]).unwrap(), 2);
    }

    #[test]
    fn default_used_when_nothing_supplied() {
        let registry = MapRegistry::new([]);
        let callable = Callable::function(
            "f",
            vec![ParamSpec::new("n").with_default(value(9u32))],
            |args: Args| Ok(value(*args.get::<u32>(0)?)),
        );
        let args = resolve_callable_args(&callable, &registry, SuppliedParams::new()).unwrap();
        assert_eq!(*downcast::<u32>(&args[0]).unwrap(), 9);
    }

    #[test]
    fn missing_param_fails_naming_callable() {
        let registry = MapRegistry::new([]);
        let callable = Callable::function("send_report", vec![ParamSpec::new("recipient")], |_| {
            Ok(value(()))
        });
        let err =
            resolve_callable_args(&callable, &registry, SuppliedParams::new()).unwrap_err();
        assert!(matches!(err, DiError::InvalidConfig { .. }));
        let msg = err.to_string();
        assert!(msg.contains("send_report"));
        assert!(msg.contains("recipient"));
    }

    #[test]
    fn class_typed_param_resolved_from_registry_first() {
        let registry = MapRegistry::new([("app.db", value(String::from("db")))]);
        let callable = Callable::function(
            "f",
            vec![ParamSpec::new("db").of_type("app.db")],
            |args: Args| Ok(value(args.len())),
        );
        // A positional entry is supplied but the registry wins for
        // class-typed parameters.
        let supplied = SuppliedParams::positional([value(String::from("override"))]);
        let args = resolve_callable_args(&callable, &registry, supplied).unwrap();
        assert_eq!(*downcast::<String>(&args[0]).unwrap(), "db");
    }

    #[test]
    fn union_candidates_tried_in_declaration_order() {
        let registry = MapRegistry::new([("Interface2", value(String::from("two")))]);
        let callable = Callable::function(
            "f",
            vec![
                ParamSpec::new("sink")
                    .of_type("Interface1")
                    .of_type("Interface2"),
            ],
            |args: Args| Ok(value(args.len())),
        );
        let args =
            resolve_callable_args(&callable, &registry, SuppliedParams::new()).unwrap();
        assert_eq!(*downcast::<String>(&args[0]).unwrap(), "two");
        assert_eq!(registry.lookups(), ["Interface1", "Interface2"]);
    }

    #[test]
    fn failed_candidates_fall_through_to_supplied() {
        let registry = MapRegistry::new([]);
        let callable = Callable::function(
            "f",
            vec![ParamSpec::new("sink").of_type("Interface1")],
            |args: Args| Ok(value(args.len())),
        );
        let supplied = SuppliedParams::positional([value(7u32)]);
        let args = resolve_callable_args(&callable, &registry, supplied).unwrap();
        assert_eq!(*downcast::<u32>(&args[0]).unwrap(), 7);
    }

    #[test]
    fn variadic_consumes_remaining_and_spreads_lists() {
        let registry = MapRegistry::new([]);
        let rest: Vec<Value> = vec![value(String::from("B")), value(String::from("C"))];
        let supplied =
            SuppliedParams::positional([value(String::from("A")), value(rest)]);

        let result = invoke(&concat_all(), &registry, supplied).unwrap();
        assert_eq!(*downcast::<String>(&result).unwrap(), "ABC");
    }

    #[test]
    fn variadic_with_no_remaining_input_is_empty() {
        let registry = MapRegistry::new([]);
        let supplied = SuppliedParams::positional([value(String::from("A"))]);
        let result = invoke(&concat_all(), &registry, supplied).unwrap();
        assert_eq!(*downcast::<String>(&result).unwrap(), "A");
    }

    #[test]
    fn method_shape_receives_bound_target() {
        struct Greeter {
            prefix: String,
        }

        let registry = MapRegistry::new([]);
        let target = value(Greeter {
            prefix: "hello ".into(),
        });
        let callable = Callable::method(
            target,
            "Greeter::greet",
            vec![ParamSpec::new("name")],
            |target: &Value, args: Args| {
                let greeter = downcast::<Greeter>(target)
                    .ok_or_else(|| DiError::invalid_config("Greeter::greet", "bad target"))?;
                let name = args.get::<String>(0)?;
                Ok(value(format!("{}{}", greeter.prefix, name)))
            },
        );

        let supplied = SuppliedParams::positional([value(String::from("ada"))]);
        let result = invoke(&callable, &registry, supplied).unwrap();
        assert_eq!(*downcast::<String>(&result).unwrap(), "hello ada");
    }

    #[test]
    fn invocable_object_shape() {
        struct Doubler {
            params: Vec<ParamSpec>,
        }

        impl Invoke for Doubler {
            fn name(&self) -> &str {
                "Doubler"
            }
            fn params(&self) -> &[ParamSpec] {
                &self.params
            }
            fn call(&self, args: Args) -> Result<Value> {
                Ok(value(*args.get::<u32>(0)? * 2))
            }
        }

        let registry = MapRegistry::new([]);
        let callable = Callable::object(Doubler {
            params: vec![ParamSpec::new("n")],
        });
        let supplied = SuppliedParams::positional([value(21u32)]);
        let result = invoke(&callable, &registry, supplied).unwrap();
        assert_eq!(*downcast::<u32>(&result).unwrap(), 42);
    }
}
