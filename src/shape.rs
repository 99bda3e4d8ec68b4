//! Class shape descriptors and the shape registry
//!
//! Rust has no runtime reflection, so "introspecting a constructor" means
//! looking up a registered [`ClassShape`]: the ordered parameter records, the
//! construction closure, and the property/setter appliers for one class id.
//! The shape registry plays the role a reflection API plays elsewhere; the
//! derived constructor metadata is the stable four-field parameter record
//! the resolution engine consumes.

use crate::dependency::{Args, Dependency, Instance, Value};
use crate::{DiError, Result};
use ahash::RandomState;
use dashmap::DashMap;
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

/// Built-in scalar type names stripped from declared parameter types.
///
/// A parameter typed only with one of these never becomes an `Instance`
/// placeholder; scalars are supplied by defaults or explicit overrides.
const BUILTIN_TYPES: &[&str] = &[
    "bool", "char", "str", "String", "i8", "i16", "i32", "i64", "i128", "isize", "u8", "u16",
    "u32", "u64", "u128", "usize", "f32", "f64",
];

/// Whether a declared type name is a built-in scalar.
#[inline]
pub fn is_builtin_type(name: &str) -> bool {
    BUILTIN_TYPES.contains(&name)
}

// =============================================================================
// ParamSpec
// =============================================================================

/// One constructor (or callable) parameter: name, candidate class types,
/// variadic flag, and declared default.
///
/// Union/intersection-typed parameters reduce to an ordered candidate list;
/// the resolution engine tries each candidate in declaration order.
///
/// # Examples
///
/// ```rust
/// use autowire::{value, ParamSpec};
///
/// let transport = ParamSpec::new("transport").of_type("app.transport");
/// let retries = ParamSpec::new("retries").with_default(value(3u32));
/// let tags = ParamSpec::new("tags").variadic();
/// # let _ = (transport, retries, tags);
/// ```
#[derive(Clone)]
pub struct ParamSpec {
    name: String,
    type_names: Vec<String>,
    variadic: bool,
    default: Option<Value>,
}

impl ParamSpec {
    /// Create a parameter record with no declared type and no default.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_names: Vec::new(),
            variadic: false,
            default: None,
        }
    }

    /// Declare a candidate class type. Built-in scalar names are stripped,
    /// matching how a reflected type list drops scalars.
    pub fn of_type(mut self, type_name: impl Into<String>) -> Self {
        let type_name = type_name.into();
        if !is_builtin_type(&type_name) {
            self.type_names.push(type_name);
        }
        self
    }

    /// Declare a default value.
    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    /// Mark the parameter variadic (consumes remaining positional input).
    pub fn variadic(mut self) -> Self {
        self.variadic = true;
        self
    }

    /// Parameter name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Candidate class type names, in declaration order.
    #[inline]
    pub fn type_names(&self) -> &[String] {
        &self.type_names
    }

    /// Whether the parameter is variadic.
    #[inline]
    pub fn is_variadic(&self) -> bool {
        self.variadic
    }

    /// Declared default value, if any.
    #[inline]
    pub fn default(&self) -> Option<&Value> {
        self.default.as_ref()
    }
}

impl std::fmt::Debug for ParamSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParamSpec")
            .field("name", &self.name)
            .field("type_names", &self.type_names)
            .field("variadic", &self.variadic)
            .field("has_default", &self.default.is_some())
            .finish()
    }
}

// =============================================================================
// ClassShape
// =============================================================================

/// Type-erased construction closure
type ConstructFn = Arc<dyn Fn(Args) -> Result<Box<dyn Any + Send + Sync>> + Send + Sync>;

/// Type-erased property/setter applier
type ApplyFn = Arc<dyn Fn(&mut (dyn Any + Send + Sync), Value) -> Result<()> + Send + Sync>;

/// The registered shape of one class: its constructor parameters, the
/// construction closure, and named property appliers.
///
/// A shape without a constructor closure marks an abstract class or
/// interface; its dependencies still resolve, but construction fails with
/// `NotInstantiable`.
///
/// # Examples
///
/// ```rust
/// use autowire::{value, Args, ClassShape, ParamSpec};
/// use std::sync::Arc;
///
/// struct Transport { dsn: String }
/// struct Mailer { transport: Arc<Transport>, retries: u32 }
///
/// let shape = ClassShape::new("app.mailer")
///     .param(ParamSpec::new("transport").of_type("app.transport"))
///     .param(ParamSpec::new("retries").with_default(value(3u32)))
///     .constructor(|args: Args| {
///         Ok(Mailer {
///             transport: args.get::<Transport>(0)?,
///             retries: *args.get::<u32>(1)?,
///         })
///     });
/// # let _ = shape;
/// ```
#[derive(Clone)]
pub struct ClassShape {
    class: String,
    params: Arc<[ParamSpec]>,
    constructor: Option<ConstructFn>,
    setters: HashMap<String, ApplyFn, RandomState>,
}

impl ClassShape {
    /// Start a shape for a class id. Until a constructor closure is added the
    /// shape is abstract.
    pub fn new(class: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            params: Arc::from([]),
            constructor: None,
            setters: HashMap::default(),
        }
    }

    /// Append one constructor parameter, in declaration order.
    pub fn param(mut self, param: ParamSpec) -> Self {
        let mut params: Vec<ParamSpec> = self.params.iter().cloned().collect();
        params.push(param);
        self.params = params.into();
        self
    }

    /// Attach the construction closure. The closure receives the resolved,
    /// positionally-ordered [`Args`].
    pub fn constructor<T, F>(mut self, f: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn(Args) -> Result<T> + Send + Sync + 'static,
    {
        self.constructor = Some(Arc::new(move |args| {
            f(args).map(|v| Box::new(v) as Box<dyn Any + Send + Sync>)
        }));
        self
    }

    /// Attach a named property/setter applier.
    ///
    /// The applier is invoked after construction with the directive value
    /// from the definition map.
    pub fn setter<T, F>(mut self, property: impl Into<String>, f: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn(&mut T, Value) -> Result<()> + Send + Sync + 'static,
    {
        let property = property.into();
        let class = self.class.clone();
        let name = property.clone();
        self.setters.insert(
            property,
            Arc::new(move |target, value| {
                let typed = target.downcast_mut::<T>().ok_or_else(|| {
                    DiError::invalid_config(
                        format!("{class}.{name}"),
                        "setter target type mismatch",
                    )
                })?;
                f(typed, value)
            }),
        );
        self
    }

    /// Class id this shape describes.
    #[inline]
    pub fn class(&self) -> &str {
        &self.class
    }

    /// Ordered constructor parameter records (the constructor metadata).
    #[inline]
    pub fn params(&self) -> Arc<[ParamSpec]> {
        Arc::clone(&self.params)
    }

    /// Whether the shape can be constructed at all.
    #[inline]
    pub fn is_instantiable(&self) -> bool {
        self.constructor.is_some()
    }

    /// Invoke the constructor with resolved arguments.
    ///
    /// Fails with `NotInstantiable` on abstract shapes. Callers check
    /// instantiability after argument resolution so resolution errors take
    /// precedence.
    pub fn construct(&self, args: Args) -> Result<Box<dyn Any + Send + Sync>> {
        let constructor = self.constructor.as_ref().ok_or_else(|| {
            DiError::not_instantiable(&self.class, "class is abstract or an interface")
        })?;
        constructor(args)
    }

    /// Apply one property/setter directive to a freshly constructed instance.
    pub fn apply(
        &self,
        instance: &mut (dyn Any + Send + Sync),
        property: &str,
        value: Value,
    ) -> Result<()> {
        let applier = self.setters.get(property).ok_or_else(|| {
            DiError::invalid_config(
                format!("{}.{property}", self.class),
                "unknown property or setter",
            )
        })?;
        applier(instance, value)
    }

    /// Derive the default dependency list from the parameter records.
    ///
    /// Per parameter, in order: variadic parameters are skipped entirely; a
    /// single non-built-in declared type yields an `Instance` placeholder
    /// keyed by that type; otherwise a declared default yields its literal;
    /// otherwise the parameter is omitted (it must be supplied explicitly).
    pub(crate) fn default_dependencies(&self) -> Vec<(String, Dependency)> {
        let mut defaults = Vec::with_capacity(self.params.len());
        for param in self.params.iter() {
            if param.is_variadic() {
                continue;
            }
            if let [type_name] = param.type_names() {
                // Instance::of over a registered non-empty type name cannot fail
                if let Ok(instance) = Instance::of(type_name.clone()) {
                    defaults.push((param.name().to_string(), Dependency::Ref(instance)));
                    continue;
                }
            }
            if let Some(default) = param.default() {
                defaults.push((
                    param.name().to_string(),
                    Dependency::Literal(Value::clone(default)),
                ));
            }
        }
        defaults
    }
}

impl std::fmt::Debug for ClassShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClassShape")
            .field("class", &self.class)
            .field("params", &self.params.len())
            .field("instantiable", &self.is_instantiable())
            .field("setters", &self.setters.len())
            .finish()
    }
}

// =============================================================================
// ShapeRegistry
// =============================================================================

/// Thread-safe store of class shapes, keyed by class id.
pub struct ShapeRegistry {
    shapes: DashMap<String, Arc<ClassShape>, RandomState>,
}

impl ShapeRegistry {
    /// Create an empty shape registry.
    pub fn new() -> Self {
        Self {
            shapes: DashMap::with_capacity_and_hasher_and_shard_amount(0, RandomState::new(), 8),
        }
    }

    /// Register a shape under its class id, replacing any previous shape.
    pub fn register(&self, shape: ClassShape) {
        #[cfg(feature = "logging")]
        tracing::debug!(
            target: "autowire",
            class = shape.class(),
            params = shape.params.len(),
            instantiable = shape.is_instantiable(),
            "Registering class shape"
        );

        self.shapes.insert(shape.class.clone(), Arc::new(shape));
    }

    /// Look up the shape for a class id.
    pub fn get(&self, class: &str) -> Option<Arc<ClassShape>> {
        self.shapes.get(class).map(|s| Arc::clone(s.value()))
    }

    /// Whether a shape is registered for the class id.
    #[inline]
    pub fn contains(&self, class: &str) -> bool {
        self.shapes.contains_key(class)
    }

    /// Number of registered shapes.
    #[inline]
    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    /// Whether the registry is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }
}

impl Default for ShapeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ShapeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShapeRegistry")
            .field("count", &self.len())
            .finish()
    }
}
