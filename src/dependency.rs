//! Dependency value model
//!
//! Components flow through the engine type-erased as [`Value`]. A dependency
//! waiting to be resolved is one of three forms: a concrete literal, an
//! [`Instance`] placeholder naming a registry id, or a nested list of further
//! dependencies. The resolution engine pattern-matches over [`Dependency`]
//! rather than sniffing runtime types.

use crate::{DiError, Result};
use std::any::Any;
use std::sync::Arc;

/// A type-erased component value.
///
/// Everything the engine resolves, constructs, or passes to a constructor is
/// one of these. `Arc` keeps sharing zero-copy; downcast back with
/// [`Args::get`] or [`downcast`].
pub type Value = Arc<dyn Any + Send + Sync>;

/// Erase a concrete value into a [`Value`].
#[inline]
pub fn value<T: Send + Sync + 'static>(v: T) -> Value {
    Arc::new(v)
}

/// Downcast a [`Value`] to a concrete `Arc<T>`, cloning the handle.
#[inline]
pub fn downcast<T: Send + Sync + 'static>(v: &Value) -> Option<Arc<T>> {
    Arc::clone(v).downcast::<T>().ok()
}

// =============================================================================
// Instance - indirect reference placeholder
// =============================================================================

/// An indirect reference to a registry id, resolved at argument-resolution
/// time rather than at definition time.
///
/// Immutable; the id is never empty.
///
/// # Examples
///
/// ```rust
/// use autowire::Instance;
///
/// let reference = Instance::of("app.database").unwrap();
/// assert_eq!(reference.id(), "app.database");
///
/// assert!(Instance::of("").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Instance {
    id: String,
}

impl Instance {
    /// Create a placeholder for a registry id.
    ///
    /// Fails with `InvalidConfig` if the id is empty.
    pub fn of(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        if id.is_empty() {
            return Err(DiError::invalid_config(
                "Instance reference",
                "id must not be empty",
            ));
        }
        Ok(Self { id })
    }

    /// The registry id this placeholder names.
    #[inline]
    pub fn id(&self) -> &str {
        &self.id
    }
}

impl std::fmt::Display for Instance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Instance({})", self.id)
    }
}

// =============================================================================
// Dependency - tagged sum over resolution forms
// =============================================================================

/// One entry of a dependency list, before resolution.
#[derive(Clone)]
pub enum Dependency {
    /// A concrete value, passed through unchanged
    Literal(Value),
    /// A placeholder resolved through the registry
    Ref(Instance),
    /// A nested list resolved recursively
    List(Vec<Dependency>),
}

impl Dependency {
    /// Wrap a concrete value as a literal entry.
    #[inline]
    pub fn value<T: Send + Sync + 'static>(v: T) -> Self {
        Self::Literal(value(v))
    }

    /// Create a placeholder entry for a registry id.
    pub fn reference(id: impl Into<String>) -> Result<Self> {
        Ok(Self::Ref(Instance::of(id)?))
    }

    /// Create a nested list entry.
    #[inline]
    pub fn list(entries: impl IntoIterator<Item = Dependency>) -> Self {
        Self::List(entries.into_iter().collect())
    }
}

impl From<Instance> for Dependency {
    #[inline]
    fn from(instance: Instance) -> Self {
        Self::Ref(instance)
    }
}

impl std::fmt::Debug for Dependency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Literal(_) => f.write_str("Literal(..)"),
            Self::Ref(instance) => write!(f, "Ref({})", instance.id()),
            Self::List(entries) => write!(f, "List(len={})", entries.len()),
        }
    }
}

// =============================================================================
// Args - resolved argument list handed to constructors
// =============================================================================

/// The resolved, positionally-ordered argument list a constructor or callable
/// body receives.
///
/// # Examples
///
/// ```rust
/// use autowire::{value, Args};
///
/// let args = Args::new(vec![value(String::from("smtp")), value(3u32)]);
/// assert_eq!(*args.get::<u32>(1).unwrap(), 3);
/// ```
pub struct Args(Vec<Value>);

impl Args {
    /// Wrap a resolved argument list.
    #[inline]
    pub fn new(values: Vec<Value>) -> Self {
        Self(values)
    }

    /// Number of arguments.
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the list is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Downcast the argument at `index` to `Arc<T>`.
    ///
    /// Fails with `InvalidConfig` if the index is out of range or the
    /// argument is not a `T`.
    pub fn get<T: Send + Sync + 'static>(&self, index: usize) -> Result<Arc<T>> {
        let v = self.0.get(index).ok_or_else(|| {
            DiError::invalid_config(
                format!("argument #{index}"),
                format!("only {} argument(s) were resolved", self.0.len()),
            )
        })?;
        downcast::<T>(v).ok_or_else(|| {
            DiError::invalid_config(
                format!("argument #{index}"),
                format!("expected {}", std::any::type_name::<T>()),
            )
        })
    }

    /// The raw arguments from `from` onward (variadic tails).
    #[inline]
    pub fn remaining(&self, from: usize) -> &[Value] {
        self.0.get(from..).unwrap_or(&[])
    }

    /// Consume into the underlying values.
    #[inline]
    pub fn into_values(self) -> Vec<Value> {
        self.0
    }
}

impl std::fmt::Debug for Args {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Args").field("len", &self.0.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instance_rejects_empty_id() {
        assert!(Instance::of("").is_err());
        assert!(Instance::of("db").is_ok());
    }

    #[test]
    fn instance_is_compared_by_id() {
        let a = Instance::of("db").unwrap();
        let b = Instance::of("db").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn dependency_constructors() {
        assert!(matches!(Dependency::value(1u32), Dependency::Literal(_)));
        assert!(matches!(
            Dependency::reference("db").unwrap(),
            Dependency::Ref(_)
        ));
        let list = Dependency::list([Dependency::value(1u32), Dependency::value(2u32)]);
        assert!(matches!(list, Dependency::List(ref e) if e.len() == 2));
    }

    #[test]
    fn args_downcast() {
        let args = Args::new(vec![value(7u32), value(String::from("x"))]);
        assert_eq!(*args.get::<u32>(0).unwrap(), 7);
        assert_eq!(*args.get::<String>(1).unwrap(), "x");
        assert!(args.get::<u32>(1).is_err());
        assert!(args.get::<u32>(2).is_err());
    }

    #[test]
    fn args_remaining_tail() {
        let args = Args::new(vec![value(1u32), value(2u32), value(3u32)]);
        assert_eq!(args.remaining(1).len(), 2);
        assert_eq!(args.remaining(5).len(), 0);
    }
}
