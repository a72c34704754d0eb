//! External-to-store identifier mapping.

use crate::storage::StoreId;
use crate::{Error, Result};
use std::collections::HashMap;
use std::collections::hash_map::Entry;

/// Maps document vertex identifiers to the identifiers the store assigned.
///
/// Built while vertices are created; consulted to resolve edge endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentifierMap {
    ids: HashMap<String, StoreId>,
}

impl IdentifierMap {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Maps a new external identifier to the store id `create` returns.
    ///
    /// `create` only runs for identifiers not seen before, so a duplicate
    /// never reaches the store.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Structural`] if the identifier is already mapped, or
    /// the error `create` returns.
    pub fn insert(
        &mut self,
        external: &str,
        create: impl FnOnce() -> Result<StoreId>,
    ) -> Result<&StoreId> {
        match self.ids.entry(external.to_string()) {
            Entry::Occupied(_) => Err(Error::Structural(format!(
                "duplicate vertex identifier '{external}'"
            ))),
            Entry::Vacant(slot) => Ok(slot.insert(create()?)),
        }
    }

    /// Resolves an external identifier.
    #[must_use]
    pub fn get(&self, external: &str) -> Option<&StoreId> {
        self.ids.get(external)
    }

    /// Returns whether the external identifier has been seen.
    #[must_use]
    pub fn contains(&self, external: &str) -> bool {
        self.ids.contains_key(external)
    }

    /// Returns the number of mapped vertices.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Returns whether nothing is mapped.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Iterates over `(external, store)` pairs in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &StoreId)> {
        self.ids.iter().map(|(k, v)| (k.as_str(), v))
    }
}
