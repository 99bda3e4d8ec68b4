//! # Autowire - Dependency Resolution and Object Construction for Rust
//!
//! An autowiring container: classes declare their constructor shape once,
//! and the engine resolves dependencies by name, merges per-call overrides,
//! and constructs fully configured instances on demand.
//!
//! ## Features
//!
//! - ⚡ **Lock-free** - Uses `DashMap` for concurrent access without blocking
//! - 🔌 **Named components** - Instance, lazy, transient, and class-definition
//!   registrations under string ids
//! - 🧩 **Autowiring** - Constructor dependencies resolved from registered
//!   class shapes, recursively
//! - 🎛️ **Overrides** - Positional lists replace the dependency list wholesale;
//!   named maps overlay individual parameters
//! - 📞 **Callables** - Argument resolution and dispatch for functions, bound
//!   methods, and invocable objects, variadics included
//! - 🔁 **Cycle-safe** - Circular registrations fail with the offending chain
//!   instead of hanging
//! - 📊 **Observable** - Optional tracing integration with JSON or pretty output
//!
//! ## Quick Start
//!
//! ```rust
//! use autowire::{Args, ClassShape, Container, Definitions, ParamSpec};
//! use std::sync::Arc;
//!
//! struct Database { url: Arc<String> }
//! struct UserService { db: Arc<Database> }
//!
//! let container = Container::new();
//! container.instance("app.db-url", String::from("postgres://localhost"));
//!
//! // Declare constructor shapes once
//! container.register_shape(
//!     ClassShape::new("app.database")
//!         .param(ParamSpec::new("url").of_type("app.db-url"))
//!         .constructor(|args: Args| Ok(Database { url: args.get::<String>(0)? })),
//! );
//! container.register_shape(
//!     ClassShape::new("app.users")
//!         .param(ParamSpec::new("db").of_type("db"))
//!         .constructor(|args: Args| Ok(UserService { db: args.get::<Database>(0)? })),
//! );
//!
//! // Register ids; construction happens on first lookup
//! container.define("db", "app.database", Definitions::new());
//! container.define("users", "app.users", Definitions::new());
//!
//! let users = container.get_as::<UserService>("users").unwrap();
//! assert_eq!(*users.db.url, "postgres://localhost");
//! ```
//!
//! ## Overrides
//!
//! ```rust
//! use autowire::{value, Args, ClassShape, Container, Definitions, Dependency, Overrides, ParamSpec};
//!
//! struct Cache { size: u32 }
//!
//! let container = Container::new();
//! container.register_shape(
//!     ClassShape::new("app.cache")
//!         .param(ParamSpec::new("size").with_default(value(128u32)))
//!         .constructor(|args: Args| Ok(Cache { size: *args.get::<u32>(0)? })),
//! );
//!
//! // Named overrides overlay individual parameters over the defaults
//! let definitions = Definitions::new()
//!     .construct(Overrides::named([("size", Dependency::value(512u32))]));
//! let cache = container.create("app.cache", &definitions).unwrap();
//! assert_eq!(autowire::downcast::<Cache>(&cache).unwrap().size, 512);
//! ```
//!
//! ## Performance
//!
//! - **Lock-free reads**: `DashMap` for component and shape storage
//! - **AHash**: Faster hashing for string ids
//! - **Cached introspection**: Constructor metadata and derived defaults are
//!   computed once per class per container
//! - **Zero-copy resolve**: Components are shared as `Arc` values

mod builder;
mod cache;
mod callable;
mod container;
mod dependency;
mod error;
#[cfg(feature = "logging")]
pub mod logging;
mod overrides;
mod registry;
mod resolve;
mod shape;

pub use builder::{Definitions, CONSTRUCT_KEY};
pub use cache::{DependencyCache, IntrospectedClass};
pub use callable::{invoke, resolve_callable_args, Callable, Invoke, SuppliedParams};
pub use container::Container;
pub use dependency::{downcast, value, Args, Dependency, Instance, Value};
pub use error::{DiError, Result};
pub use overrides::{OverrideKey, Overrides};
pub use registry::Registry;
pub use resolve::resolve;
pub use shape::{is_builtin_type, ClassShape, ParamSpec, ShapeRegistry};

// Re-export tracing macros for convenience when logging feature is enabled
#[cfg(feature = "logging")]
pub use tracing::{debug, error, info, trace, warn};

// Re-export for convenience
pub use std::sync::Arc;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        downcast, value, Args, Callable, ClassShape, Container, Definitions, Dependency, DiError,
        Instance, Overrides, ParamSpec, Registry, Result, ShapeRegistry, SuppliedParams, Value,
    };
    pub use std::sync::Arc;
}
