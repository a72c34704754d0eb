//! Per-attribute import strategies.
//!
//! A strategy decides what happens to one attribute key/value pair while an
//! element is imported: keep it, drop it, or store it under another key.
//! Strategies are registered per (element kind, key) in an
//! [`AttributeStrategyRegistry`] owned by a single pipeline invocation.
//!
//! # Example
//!
//! ```rust
//! use graphport::io::{AttributeStrategy, AttributeStrategyRegistry, StrategyOutcome};
//! use graphport::models::{AttributeValue, ElementKind};
//!
//! let registry = AttributeStrategyRegistry::new()
//!     .with_vertex_strategy("__type__", AttributeStrategy::Ignore)
//!     .with_edge_strategy("label", AttributeStrategy::rename("edge_label"));
//!
//! let outcome = registry.apply(ElementKind::Vertex, "__type__", AttributeValue::from("Person"));
//! assert_eq!(outcome, StrategyOutcome::Drop);
//! ```

use crate::models::{AttributeValue, Attributes, ElementKind};
use crate::{Error, Result};
use std::collections::HashMap;
use std::fmt;

/// Result of applying a strategy to one attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum StrategyOutcome {
    /// Store the value under its original key.
    Keep(String, AttributeValue),
    /// Remove the attribute from the element.
    Drop,
    /// Store the value under a new key.
    Rename(String, AttributeValue),
}

/// Transformation applied to an attribute during import.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AttributeStrategy {
    /// Keep the attribute unchanged.
    #[default]
    PassThrough,
    /// Drop the attribute, e.g. to avoid colliding with store-managed fields.
    Ignore,
    /// Store the value under `target` instead of the original key.
    Rename {
        /// The new attribute key.
        target: String,
    },
}

impl AttributeStrategy {
    /// Creates a rename strategy.
    #[must_use]
    pub fn rename(target: impl Into<String>) -> Self {
        Self::Rename {
            target: target.into(),
        }
    }

    /// Applies the strategy. Pure; never fails.
    #[must_use]
    pub fn apply(&self, _kind: ElementKind, key: &str, value: AttributeValue) -> StrategyOutcome {
        match self {
            Self::PassThrough => StrategyOutcome::Keep(key.to_string(), value),
            Self::Ignore => StrategyOutcome::Drop,
            Self::Rename { target } => StrategyOutcome::Rename(target.clone(), value),
        }
    }

    /// Returns the configuration name of the strategy.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::PassThrough => "passthrough",
            Self::Ignore => "ignore",
            Self::Rename { .. } => "rename",
        }
    }

    /// Builds a strategy from its configuration name.
    ///
    /// `target` is required for `rename` and ignored otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] for unknown names or a rename without target.
    pub fn from_name(name: &str, target: Option<&str>) -> Result<Self> {
        match name.trim().to_lowercase().as_str() {
            "pass" | "passthrough" | "pass-through" | "keep" => Ok(Self::PassThrough),
            "ignore" | "drop" => Ok(Self::Ignore),
            "rename" => match target.map(str::trim) {
                Some(t) if !t.is_empty() => Ok(Self::rename(t)),
                _ => Err(Error::Configuration(
                    "rename strategy requires a target key".to_string(),
                )),
            },
            other => Err(Error::Configuration(format!(
                "unknown attribute strategy '{other}'"
            ))),
        }
    }

    /// Parses the compact `name[:target]` form used in option strings.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] as [`Self::from_name`] does.
    pub fn parse_descriptor(descriptor: &str) -> Result<Self> {
        match descriptor.split_once(':') {
            Some((name, target)) => Self::from_name(name, Some(target)),
            None => Self::from_name(descriptor, None),
        }
    }
}

impl fmt::Display for AttributeStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rename { target } => write!(f, "rename:{target}"),
            other => f.write_str(other.name()),
        }
    }
}

/// Strategies keyed by element kind and attribute key.
///
/// At most one strategy exists per key; registering again overwrites the
/// previous entry. Keys without an entry pass through unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeStrategyRegistry {
    strategies: HashMap<(ElementKind, String), AttributeStrategy>,
}

impl AttributeStrategyRegistry {
    /// Creates an empty registry (everything passes through).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a strategy, replacing any previous one for the same key.
    pub fn register(&mut self, kind: ElementKind, key: impl Into<String>, strategy: AttributeStrategy) {
        self.strategies.insert((kind, key.into()), strategy);
    }

    /// Registers a vertex attribute strategy.
    #[must_use]
    pub fn with_vertex_strategy(mut self, key: impl Into<String>, strategy: AttributeStrategy) -> Self {
        self.register(ElementKind::Vertex, key, strategy);
        self
    }

    /// Registers an edge attribute strategy.
    #[must_use]
    pub fn with_edge_strategy(mut self, key: impl Into<String>, strategy: AttributeStrategy) -> Self {
        self.register(ElementKind::Edge, key, strategy);
        self
    }

    /// Returns the strategy for a key, if one was registered.
    #[must_use]
    pub fn get(&self, kind: ElementKind, key: &str) -> Option<&AttributeStrategy> {
        self.strategies.get(&(kind, key.to_string()))
    }

    /// Returns the number of registered strategies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    /// Returns whether no strategy is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    /// Applies the matching strategy, falling back to pass-through.
    #[must_use]
    pub fn apply(&self, kind: ElementKind, key: &str, value: AttributeValue) -> StrategyOutcome {
        match self.get(kind, key) {
            Some(strategy) => strategy.apply(kind, key, value),
            None => StrategyOutcome::Keep(key.to_string(), value),
        }
    }

    /// Applies strategies to all attributes of one element, in source order.
    ///
    /// Dropped attributes disappear; a renamed key that collides with an
    /// existing one overwrites it (last write wins within the element).
    #[must_use]
    pub fn apply_all<I>(&self, kind: ElementKind, raw: I) -> Attributes
    where
        I: IntoIterator<Item = (String, AttributeValue)>,
    {
        let mut attributes = Attributes::new();
        for (key, value) in raw {
            match self.apply(kind, &key, value) {
                StrategyOutcome::Keep(key, value) | StrategyOutcome::Rename(key, value) => {
                    attributes.insert(key, value);
                },
                StrategyOutcome::Drop => {},
            }
        }
        attributes
    }
}
