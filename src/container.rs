//! Named-component registry and engine facade
//!
//! The `Container` stores components under string ids and fronts the
//! resolution engine: `create` constructs and configures class instances,
//! `invoke` resolves and dispatches callables, and the `Registry`
//! implementation (`get`/`has`) serves placeholder lookups — including the
//! recursive ones a class definition triggers while its own dependencies are
//! being constructed.

use crate::builder::{self, Definitions};
use crate::cache::DependencyCache;
use crate::callable::{self, Callable, SuppliedParams};
use crate::dependency::{downcast, Value};
use crate::registry::Registry;
use crate::shape::{ClassShape, ShapeRegistry};
use crate::{DiError, Result};
use ahash::RandomState;
use dashmap::DashMap;
use once_cell::sync::OnceCell;
use std::cell::RefCell;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

#[cfg(feature = "logging")]
use tracing::debug;

/// Type-erased component factory; receives the container so it can resolve
/// its own dependencies.
type FactoryFn = Arc<dyn Fn(&Container) -> Result<Value> + Send + Sync>;

/// One registered component.
#[derive(Clone)]
enum Component {
    /// Eager instance, stored as registered
    Instance(Value),
    /// Factory invoked once on first lookup, result memoized
    Lazy(Arc<LazyComponent>),
    /// Factory invoked on every lookup
    Transient(FactoryFn),
    /// Class definition constructed through the engine on first lookup
    Definition(Arc<ClassDefinition>),
}

struct LazyComponent {
    factory: FactoryFn,
    cell: OnceCell<Value>,
}

struct ClassDefinition {
    class: String,
    definitions: Definitions,
    cell: OnceCell<Value>,
}

thread_local! {
    /// Ids currently being constructed on this thread. Re-entry of an id
    /// while it is in flight is a circular registration.
    static IN_FLIGHT: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };
}

/// Pops the in-flight id on scope exit, error paths included.
struct InFlightGuard;

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        IN_FLIGHT.with(|stack| {
            stack.borrow_mut().pop();
        });
    }
}

fn enter_in_flight(id: &str) -> Result<InFlightGuard> {
    IN_FLIGHT.with(|stack| {
        let mut stack = stack.borrow_mut();
        if stack.iter().any(|inflight| inflight == id) {
            return Err(DiError::circular(id, &stack));
        }
        stack.push(id.to_string());
        Ok(InFlightGuard)
    })
}

/// Named-component registry with automatic dependency resolution.
///
/// Clones share the same component store, shape registry, and dependency
/// cache; construct a fresh `Container` for an isolated engine with a cold
/// cache.
///
/// # Examples
///
/// ```rust
/// use autowire::{value, Args, ClassShape, Container, Definitions, ParamSpec};
/// use std::sync::Arc;
///
/// struct Transport { dsn: String }
/// struct Mailer { transport: Arc<Transport>, retries: u32 }
///
/// let container = Container::new();
/// container.instance("app.transport", Transport { dsn: "smtp://localhost".into() });
/// container.register_shape(
///     ClassShape::new("app.mailer")
///         .param(ParamSpec::new("transport").of_type("app.transport"))
///         .param(ParamSpec::new("retries").with_default(value(3u32)))
///         .constructor(|args: Args| {
///             Ok(Mailer {
///                 transport: args.get::<Transport>(0)?,
///                 retries: *args.get::<u32>(1)?,
///             })
///         }),
/// );
///
/// let mailer = container.create("app.mailer", &Definitions::new()).unwrap();
/// let mailer = autowire::downcast::<Mailer>(&mailer).unwrap();
/// assert_eq!(mailer.transport.dsn, "smtp://localhost");
/// assert_eq!(mailer.retries, 3);
/// ```
#[derive(Clone)]
pub struct Container {
    components: Arc<DashMap<String, Component, RandomState>>,
    shapes: Arc<ShapeRegistry>,
    cache: Arc<DependencyCache>,
    /// Lock state - registrations are rejected once locked
    locked: Arc<AtomicBool>,
}

impl Container {
    /// Create an empty container with its own shape registry and cache.
    pub fn new() -> Self {
        Self::with_shapes(Arc::new(ShapeRegistry::new()))
    }

    /// Create a container over a shared shape registry.
    ///
    /// The dependency cache is still private to this container, so engines
    /// sharing shapes stay observably independent.
    pub fn with_shapes(shapes: Arc<ShapeRegistry>) -> Self {
        #[cfg(feature = "logging")]
        debug!(
            target: "autowire",
            shared_shapes = shapes.len(),
            "Creating container"
        );

        Self {
            components: Arc::new(DashMap::with_capacity_and_hasher_and_shard_amount(
                0,
                RandomState::new(),
                8,
            )),
            shapes,
            cache: Arc::new(DependencyCache::new()),
            locked: Arc::new(AtomicBool::new(false)),
        }
    }

    /// The shape registry backing `create` and `can_be_autowired`.
    #[inline]
    pub fn shapes(&self) -> &ShapeRegistry {
        &self.shapes
    }

    /// Register a class shape (convenience for `shapes().register`).
    pub fn register_shape(&self, shape: ClassShape) {
        self.shapes.register(shape);
    }

    // =========================================================================
    // Registration Methods
    // =========================================================================

    /// Register an eager instance under an id.
    pub fn instance<T: Send + Sync + 'static>(&self, id: impl Into<String>, component: T) {
        self.check_not_locked();
        let id = id.into();

        #[cfg(feature = "logging")]
        debug!(
            target: "autowire",
            id = id.as_str(),
            lifetime = "instance",
            "Registering component"
        );

        self.components
            .insert(id, Component::Instance(Arc::new(component)));
    }

    /// Register a pre-erased value under an id.
    pub fn instance_value(&self, id: impl Into<String>, component: Value) {
        self.check_not_locked();
        self.components
            .insert(id.into(), Component::Instance(component));
    }

    /// Register a lazy component: the factory runs once on first lookup and
    /// the result is memoized.
    pub fn lazy<F>(&self, id: impl Into<String>, factory: F)
    where
        F: Fn(&Container) -> Result<Value> + Send + Sync + 'static,
    {
        self.check_not_locked();
        let id = id.into();

        #[cfg(feature = "logging")]
        debug!(
            target: "autowire",
            id = id.as_str(),
            lifetime = "lazy",
            "Registering component (created on first lookup)"
        );

        self.components.insert(
            id,
            Component::Lazy(Arc::new(LazyComponent {
                factory: Arc::new(factory),
                cell: OnceCell::new(),
            })),
        );
    }

    /// Register a transient component: the factory runs on every lookup.
    pub fn transient<F>(&self, id: impl Into<String>, factory: F)
    where
        F: Fn(&Container) -> Result<Value> + Send + Sync + 'static,
    {
        self.check_not_locked();
        let id = id.into();

        #[cfg(feature = "logging")]
        debug!(
            target: "autowire",
            id = id.as_str(),
            lifetime = "transient",
            "Registering component (new value on every lookup)"
        );

        self.components
            .insert(id, Component::Transient(Arc::new(factory)));
    }

    /// Register a class definition: on first lookup the id is constructed
    /// through the engine (`create`) and memoized.
    pub fn define(
        &self,
        id: impl Into<String>,
        class: impl Into<String>,
        definitions: Definitions,
    ) {
        self.check_not_locked();
        let id = id.into();
        let class = class.into();

        #[cfg(feature = "logging")]
        debug!(
            target: "autowire",
            id = id.as_str(),
            class = class.as_str(),
            lifetime = "definition",
            "Registering class definition"
        );

        self.components.insert(
            id,
            Component::Definition(Arc::new(ClassDefinition {
                class,
                definitions,
                cell: OnceCell::new(),
            })),
        );
    }

    // =========================================================================
    // Engine Facade
    // =========================================================================

    /// Whether a class id can be constructed by the engine.
    #[inline]
    pub fn can_be_autowired(&self, id: &str) -> bool {
        self.shapes.contains(id)
    }

    /// Construct and configure an instance of `class`.
    ///
    /// `definitions` carries the `__construct()` override set plus
    /// post-construction property/setter directives (see
    /// [`Definitions`]). Fails with `NotInstantiable` or `InvalidConfig`
    /// without side effects; no partial object is ever returned.
    pub fn create(&self, class: &str, definitions: &Definitions) -> Result<Value> {
        builder::build(&self.shapes, &self.cache, self, class, definitions)
    }

    /// Resolve a callable's arguments against this registry, without
    /// dispatching it.
    pub fn resolve_callable_args(
        &self,
        callable: &Callable,
        supplied: SuppliedParams,
    ) -> Result<Vec<Value>> {
        callable::resolve_callable_args(callable, self, supplied)
    }

    /// Resolve a callable's arguments and dispatch it.
    pub fn invoke(&self, callable: &Callable, supplied: SuppliedParams) -> Result<Value> {
        callable::invoke(callable, self, supplied)
    }

    // =========================================================================
    // Lookup Methods
    // =========================================================================

    /// Look up a component and downcast it.
    pub fn get_as<T: Send + Sync + 'static>(&self, id: &str) -> Result<Arc<T>> {
        let v = self.get(id)?;
        downcast::<T>(&v).ok_or_else(|| {
            DiError::invalid_config(id, format!("expected {}", std::any::type_name::<T>()))
        })
    }

    /// Number of registered components (shapes not included).
    #[inline]
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Whether no components are registered.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Remove a component registration.
    pub fn remove(&self, id: &str) -> bool {
        self.components.remove(id).is_some()
    }

    /// Clear all component registrations (shapes and cache survive).
    pub fn clear(&self) {
        self.components.clear();
    }

    // =========================================================================
    // Lifecycle Methods
    // =========================================================================

    /// Lock the container to prevent further registrations.
    pub fn lock(&self) {
        self.locked.store(true, Ordering::Release);

        #[cfg(feature = "logging")]
        debug!(
            target: "autowire",
            components = self.len(),
            "Container locked - no further registrations allowed"
        );
    }

    /// Whether the container is locked.
    #[inline]
    pub fn is_locked(&self) -> bool {
        self.locked.load(Ordering::Acquire)
    }

    #[inline]
    fn check_not_locked(&self) {
        if self.locked.load(Ordering::Relaxed) {
            panic!("Cannot register components: container is locked");
        }
    }
}

impl Registry for Container {
    fn has(&self, id: &str) -> bool {
        self.components.contains_key(id)
    }

    fn get(&self, id: &str) -> Result<Value> {
        // Clone the registration out of the shard guard before running any
        // factory; factories re-enter this map for their own dependencies.
        let component = self
            .components
            .get(id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| DiError::not_found(id))?;

        match component {
            Component::Instance(v) => Ok(v),
            Component::Lazy(lazy) => {
                let _guard = enter_in_flight(id)?;
                lazy.cell
                    .get_or_try_init(|| (lazy.factory)(self))
                    .map(Value::clone)
            }
            Component::Transient(factory) => {
                let _guard = enter_in_flight(id)?;
                factory(self)
            }
            Component::Definition(def) => {
                let _guard = enter_in_flight(id)?;
                def.cell
                    .get_or_try_init(|| self.create(&def.class, &def.definitions))
                    .map(Value::clone)
            }
        }
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Container")
            .field("components", &self.len())
            .field("shapes", &self.shapes.len())
            .field("locked", &self.is_locked())
            .finish()
    }
}
