//! Error types for dependency resolution and construction

use thiserror::Error;

/// Errors that can occur while resolving dependencies or constructing components
#[derive(Error, Debug, Clone)]
pub enum DiError {
    /// Component was not found in the registry
    #[error("Component not found: '{id}'")]
    NotFound {
        /// Registry id that was looked up
        id: String,
    },

    /// The target class cannot be constructed
    ///
    /// Raised when the class has no registered shape, is abstract, or a
    /// required dependency could not be resolved and has no default.
    #[error("Class '{class}' is not instantiable: {reason}")]
    NotInstantiable { class: String, reason: String },

    /// An override set or callable argument set is malformed
    #[error("Invalid configuration for {context}: {reason}")]
    InvalidConfig { context: String, reason: String },

    /// Circular dependency detected by the registry during resolution
    #[error("Circular dependency detected while resolving '{id}' (chain: {chain})")]
    CircularDependency { id: String, chain: String },
}

impl DiError {
    /// Create a NotFound error for a registry id
    #[inline]
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound { id: id.into() }
    }

    /// Create a NotInstantiable error
    #[inline]
    pub fn not_instantiable(class: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::NotInstantiable {
            class: class.into(),
            reason: reason.into(),
        }
    }

    /// Create a NotInstantiable error naming an unresolved required parameter
    #[inline]
    pub fn missing_dependency(class: impl Into<String>, param: impl AsRef<str>) -> Self {
        Self::NotInstantiable {
            class: class.into(),
            reason: format!(
                "required parameter '{}' could not be resolved and has no default",
                param.as_ref()
            ),
        }
    }

    /// Create an InvalidConfig error
    #[inline]
    pub fn invalid_config(context: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            context: context.into(),
            reason: reason.into(),
        }
    }

    /// Create an InvalidConfig error naming an unresolvable callable parameter
    #[inline]
    pub fn unresolved_param(callable: impl Into<String>, param: impl AsRef<str>) -> Self {
        Self::InvalidConfig {
            context: callable.into(),
            reason: format!(
                "parameter '{}' was not supplied and has no default",
                param.as_ref()
            ),
        }
    }

    /// Create a CircularDependency error from the in-flight resolution chain
    #[inline]
    pub fn circular(id: impl Into<String>, chain: &[String]) -> Self {
        Self::CircularDependency {
            id: id.into(),
            chain: chain.join(" -> "),
        }
    }

    /// Whether this is a NotFound-kind failure.
    ///
    /// Candidate-type fallback chains treat NotFound as "try the next
    /// candidate"; every other kind aborts resolution.
    #[inline]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Result type alias for resolution operations
pub type Result<T> = std::result::Result<T, DiError>;
