//! Override sets: validation and merge strategy
//!
//! Caller-supplied constructor overrides arrive either as a positional list
//! (contiguous from zero) or as a named map. Mixing the two forms in one set
//! is invalid and rejected before any merge is attempted. A non-empty
//! positional set replaces the default dependency list entirely; a named set
//! overlays the defaults key by key, preserving constructor order.

use crate::cache::IntrospectedClass;
use crate::dependency::Dependency;
use crate::{DiError, Result};

/// Key of one override entry: positional index or parameter name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OverrideKey {
    /// Positional, zero-based
    Index(usize),
    /// Named after a constructor parameter
    Name(String),
}

/// A caller-supplied override set, unvalidated.
///
/// # Examples
///
/// ```rust
/// use autowire::{Dependency, Overrides};
///
/// let positional = Overrides::positional([Dependency::value(10u32), Dependency::value(20u32)]);
/// let named = Overrides::named([("retries", Dependency::value(5u32))]);
/// # let _ = (positional, named);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    entries: Vec<(OverrideKey, Dependency)>,
}

/// An override set that passed validation.
#[derive(Debug, Clone)]
pub(crate) enum ValidOverrides {
    Positional(Vec<Dependency>),
    Named(Vec<(String, Dependency)>),
}

impl Overrides {
    /// Create an empty override set (merges to the pure defaults).
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a positional override set.
    pub fn positional(entries: impl IntoIterator<Item = Dependency>) -> Self {
        Self {
            entries: entries
                .into_iter()
                .enumerate()
                .map(|(i, dep)| (OverrideKey::Index(i), dep))
                .collect(),
        }
    }

    /// Create a named override set.
    pub fn named<N: Into<String>>(entries: impl IntoIterator<Item = (N, Dependency)>) -> Self {
        Self {
            entries: entries
                .into_iter()
                .map(|(name, dep)| (OverrideKey::Name(name.into()), dep))
                .collect(),
        }
    }

    /// Append an entry under an explicit positional index.
    pub fn set_index(mut self, index: usize, dep: Dependency) -> Self {
        self.entries.push((OverrideKey::Index(index), dep));
        self
    }

    /// Append an entry under a parameter name.
    pub fn set_name(mut self, name: impl Into<String>, dep: Dependency) -> Self {
        self.entries.push((OverrideKey::Name(name.into()), dep));
        self
    }

    /// Whether the set has no entries.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Validate the set: pure positional (contiguous from zero, possibly
    /// empty) or pure named (non-empty). Mixed keying fails with
    /// `InvalidConfig` before any merge or lookup happens.
    pub(crate) fn validate(&self, class: &str) -> Result<ValidOverrides> {
        let has_index = self
            .entries
            .iter()
            .any(|(k, _)| matches!(k, OverrideKey::Index(_)));
        let has_name = self
            .entries
            .iter()
            .any(|(k, _)| matches!(k, OverrideKey::Name(_)));

        if has_index && has_name {
            return Err(DiError::invalid_config(
                class,
                "override set mixes positional and named keys",
            ));
        }

        if has_name {
            let named = self
                .entries
                .iter()
                .map(|(k, dep)| match k {
                    OverrideKey::Name(name) => (name.clone(), dep.clone()),
                    OverrideKey::Index(_) => unreachable!(),
                })
                .collect();
            return Ok(ValidOverrides::Named(named));
        }

        // Positional (or empty): indexes must be exactly 0..n
        let mut indexed: Vec<(usize, Dependency)> = self
            .entries
            .iter()
            .map(|(k, dep)| match k {
                OverrideKey::Index(i) => (*i, dep.clone()),
                OverrideKey::Name(_) => unreachable!(),
            })
            .collect();
        indexed.sort_by_key(|(i, _)| *i);
        for (expected, (actual, _)) in indexed.iter().enumerate() {
            if *actual != expected {
                return Err(DiError::invalid_config(
                    class,
                    format!("positional overrides must be contiguous from zero, found index {actual}"),
                ));
            }
        }
        Ok(ValidOverrides::Positional(
            indexed.into_iter().map(|(_, dep)| dep).collect(),
        ))
    }
}

/// Combine validated overrides with the class's introspected defaults into a
/// flat, ordered dependency list aligned with the constructor parameters.
///
/// Positional overrides (non-empty) replace the defaults verbatim; the
/// caller takes full responsibility for argument order and count. Named
/// overrides overlay the defaults following constructor order; a named
/// override may supply a parameter that had no default entry at all.
pub(crate) fn merge(
    overrides: ValidOverrides,
    introspected: &IntrospectedClass,
    class: &str,
) -> Result<Vec<Dependency>> {
    let named = match overrides {
        ValidOverrides::Positional(list) if !list.is_empty() => return Ok(list),
        ValidOverrides::Positional(_) => Vec::new(),
        ValidOverrides::Named(named) => named,
    };

    // Unknown names are rejected rather than dropped: a typo in an override
    // must not silently fall back to the default.
    for (name, _) in &named {
        match introspected
            .metadata()
            .iter()
            .find(|p| p.name() == name.as_str())
        {
            None => {
                return Err(DiError::invalid_config(
                    class,
                    format!("override names unknown constructor parameter '{name}'"),
                ));
            }
            Some(param) if param.is_variadic() => {
                return Err(DiError::invalid_config(
                    class,
                    format!("variadic parameter '{name}' cannot be overridden by name"),
                ));
            }
            Some(_) => {}
        }
    }

    let mut merged = Vec::with_capacity(introspected.metadata().len());
    for param in introspected.metadata().iter() {
        if param.is_variadic() {
            continue;
        }
        if let Some((_, dep)) = named.iter().find(|(name, _)| name == param.name()) {
            merged.push(dep.clone());
        } else if let Some((_, dep)) = introspected
            .defaults()
            .iter()
            .find(|(name, _)| name == param.name())
        {
            merged.push(dep.clone());
        } else {
            // Neither a default nor an explicit value exists for a required
            // parameter; construction cannot proceed.
            return Err(DiError::missing_dependency(class, param.name()));
        }
    }
    Ok(merged)
}
