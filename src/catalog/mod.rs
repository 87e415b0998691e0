//! The metric catalog: immutable-per-snapshot registry of definitions.
//!
//! A [`Catalog`] is built wholesale by a [`CatalogSource`] and never mutated.
//! The [`CatalogHandle`] swaps whole snapshots on reload, so concurrent
//! readers always see a fully-built catalog, never a partial one.

mod definition;
mod loader;

pub use definition::{DerivedRef, LeafRef, MetricDefinition, MetricKind, Operator};
pub use loader::{parse_catalog, YamlCatalogSource};

use crate::core::{Alias, Result};
use arc_swap::ArcSwap;
use std::collections::HashMap;
use std::sync::Arc;

/// An immutable mapping from alias to metric definition.
#[derive(Debug, Default)]
pub struct Catalog {
    metrics: HashMap<Alias, Arc<MetricDefinition>>,
}

impl Catalog {
    /// Builds a catalog from definitions. On duplicate aliases the first
    /// definition wins and the duplicate is logged and dropped.
    pub fn from_definitions(definitions: impl IntoIterator<Item = MetricDefinition>) -> Self {
        let mut metrics: HashMap<Alias, Arc<MetricDefinition>> = HashMap::new();
        for definition in definitions {
            let alias = definition.alias().clone();
            if metrics.contains_key(&alias) {
                tracing::warn!(alias = %alias, "duplicate metric alias, keeping first definition");
                continue;
            }
            metrics.insert(alias, Arc::new(definition));
        }
        Catalog { metrics }
    }

    /// Looks up a definition by alias.
    pub fn get(&self, alias: &Alias) -> Option<&Arc<MetricDefinition>> {
        self.metrics.get(alias)
    }

    /// Returns true if the alias is defined.
    pub fn contains(&self, alias: &Alias) -> bool {
        self.metrics.contains_key(alias)
    }

    /// Number of definitions in this snapshot.
    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    /// Returns true if the catalog holds no definitions.
    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }

    /// Iterates over all aliases in this snapshot.
    pub fn aliases(&self) -> impl Iterator<Item = &Alias> {
        self.metrics.keys()
    }
}

/// Produces validated catalog snapshots (typically from configuration).
pub trait CatalogSource: Send + Sync {
    /// Loads a complete catalog snapshot.
    fn load(&self) -> Result<Catalog>;
}

/// Shared handle to the current catalog snapshot.
///
/// Readers take a cheap `Arc` snapshot per request; reloads swap the whole
/// snapshot in one atomic store.
#[derive(Debug)]
pub struct CatalogHandle {
    inner: ArcSwap<Catalog>,
}

impl CatalogHandle {
    /// Creates a handle holding the given initial snapshot.
    pub fn new(catalog: Catalog) -> Self {
        CatalogHandle {
            inner: ArcSwap::from_pointee(catalog),
        }
    }

    /// Returns the current snapshot. Computations hold the returned `Arc`
    /// for their whole run, so a concurrent swap never affects them.
    pub fn current(&self) -> Arc<Catalog> {
        self.inner.load_full()
    }

    /// Replaces the current snapshot.
    pub fn swap(&self, catalog: Catalog) {
        self.inner.store(Arc::new(catalog));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::MemoryStatisticProvider;

    fn sample_definition(alias: &str) -> MetricDefinition {
        let provider = MemoryStatisticProvider::new();
        provider.register_untyped("jump");
        MetricDefinition::leaf_set(alias, alias, vec![LeafRef::untyped("jump")], false, &provider)
            .unwrap()
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let catalog = Catalog::from_definitions([sample_definition("Times_Jumped")]);
        assert!(catalog.contains(&Alias::new("times_jumped")));
        assert!(catalog.contains(&Alias::new("TIMES_JUMPED")));
        assert!(!catalog.contains(&Alias::new("deaths")));
    }

    #[test]
    fn test_duplicate_alias_keeps_first() {
        let catalog = Catalog::from_definitions([
            sample_definition("jumps"),
            sample_definition("jumps"),
        ]);
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn test_handle_swaps_whole_snapshots() {
        let handle = CatalogHandle::new(Catalog::from_definitions([sample_definition("a")]));
        let before = handle.current();

        handle.swap(Catalog::from_definitions([
            sample_definition("b"),
            sample_definition("c"),
        ]));

        // The old snapshot is unchanged; the new one is fully built.
        assert_eq!(before.len(), 1);
        assert_eq!(handle.current().len(), 2);
        assert!(handle.current().contains(&Alias::new("b")));
    }
}
