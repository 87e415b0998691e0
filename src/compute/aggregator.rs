//! Parallel population aggregation.
//!
//! Classic fork-join divide-and-conquer over the subject list: below the
//! configured threshold a chunk is computed sequentially, otherwise the list
//! is split at its midpoint and both halves run on the rayon pool. Halves
//! cover disjoint subjects, so the merge is a plain union and the result map
//! is identical regardless of threshold or parallelism.

use crate::catalog::Catalog;
use crate::compute::evaluator::{EvalCache, Evaluator};
use crate::core::{Alias, EvalDiagnostics, SubjectId};
use crate::provider::{DomainFilter, StatisticProvider};
use std::collections::HashMap;
use std::sync::Arc;

/// Maps every subject of a population to its value for one alias.
pub struct PopulationAggregator {
    catalog: Arc<Catalog>,
    provider: Arc<dyn StatisticProvider>,
    diagnostics: Arc<EvalDiagnostics>,
    threshold: usize,
    max_depth: usize,
}

impl PopulationAggregator {
    /// Creates an aggregator over one catalog snapshot.
    ///
    /// `threshold` is the subject count below which a chunk is computed
    /// sequentially; `max_depth` bounds derived-metric recursion.
    pub fn new(
        catalog: Arc<Catalog>,
        provider: Arc<dyn StatisticProvider>,
        diagnostics: Arc<EvalDiagnostics>,
        threshold: usize,
        max_depth: usize,
    ) -> Self {
        PopulationAggregator {
            catalog,
            provider,
            diagnostics,
            threshold: threshold.max(1),
            max_depth,
        }
    }

    /// Computes `alias` for every subject and returns the subject→value map.
    pub fn aggregate(
        &self,
        subjects: &[SubjectId],
        alias: &Alias,
        filter: Option<&DomainFilter>,
    ) -> HashMap<SubjectId, i64> {
        tracing::debug!(subjects = subjects.len(), %alias, "computing population aggregation");

        if subjects.len() < self.threshold {
            return self.aggregate_sequential(subjects, alias, filter);
        }

        let (left, right) = subjects.split_at(subjects.len() / 2);
        let (mut left_map, right_map) = rayon::join(
            || self.aggregate(left, alias, filter),
            || self.aggregate(right, alias, filter),
        );

        // Halves are disjoint by construction, so union is the whole merge.
        left_map.extend(right_map);
        left_map
    }

    fn aggregate_sequential(
        &self,
        subjects: &[SubjectId],
        alias: &Alias,
        filter: Option<&DomainFilter>,
    ) -> HashMap<SubjectId, i64> {
        let evaluator = Evaluator::new(&self.catalog, self.provider.as_ref(), &self.diagnostics)
            .with_filter(filter)
            .with_max_depth(self.max_depth);

        let mut results = HashMap::with_capacity(subjects.len());
        for subject in subjects {
            let mut cache = EvalCache::new();
            let value = evaluator.evaluate(subject, alias, &mut cache, 0);
            results.insert(subject.clone(), value);
        }
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{LeafRef, MetricDefinition};
    use crate::provider::MemoryStatisticProvider;

    fn fixture(subject_count: usize) -> (Arc<Catalog>, Arc<MemoryStatisticProvider>, Vec<SubjectId>) {
        let provider = MemoryStatisticProvider::new();
        provider.register_untyped("player_kills");

        let subjects: Vec<SubjectId> = (0..subject_count)
            .map(|i| SubjectId::new(format!("subject_{i}")))
            .collect();
        for (i, subject) in subjects.iter().enumerate() {
            provider.set(subject.as_str(), "player_kills", i as i64);
        }

        let provider = Arc::new(provider);
        let catalog = Arc::new(Catalog::from_definitions([MetricDefinition::leaf_set(
            "kills",
            "Kills",
            vec![LeafRef::untyped("player_kills")],
            false,
            provider.as_ref(),
        )
        .unwrap()]));
        (catalog, provider, subjects)
    }

    #[test]
    fn test_parallel_equals_sequential() {
        let (catalog, provider, subjects) = fixture(2500);
        let alias = Alias::new("kills");

        let parallel = PopulationAggregator::new(
            catalog.clone(),
            provider.clone(),
            Arc::new(EvalDiagnostics::new()),
            1000,
            10,
        );
        let sequential = PopulationAggregator::new(
            catalog,
            provider,
            Arc::new(EvalDiagnostics::new()),
            subjects.len() + 1,
            10,
        );

        let parallel_map = parallel.aggregate(&subjects, &alias, None);
        let sequential_map = sequential.aggregate(&subjects, &alias, None);

        assert_eq!(parallel_map.len(), 2500);
        assert_eq!(parallel_map, sequential_map);
    }

    #[test]
    fn test_every_entry_matches_direct_evaluation() {
        let (catalog, provider, subjects) = fixture(64);
        let alias = Alias::new("kills");
        let diagnostics = Arc::new(EvalDiagnostics::new());

        let aggregator =
            PopulationAggregator::new(catalog.clone(), provider.clone(), diagnostics.clone(), 8, 10);
        let results = aggregator.aggregate(&subjects, &alias, None);

        let evaluator = Evaluator::new(&catalog, provider.as_ref(), &diagnostics);
        for subject in &subjects {
            let mut cache = EvalCache::new();
            let direct = evaluator.evaluate(subject, &alias, &mut cache, 0);
            assert_eq!(results.get(subject), Some(&direct));
        }
    }

    #[test]
    fn test_empty_population() {
        let (catalog, provider, _) = fixture(0);
        let aggregator =
            PopulationAggregator::new(catalog, provider, Arc::new(EvalDiagnostics::new()), 1000, 10);
        let results = aggregator.aggregate(&[], &Alias::new("kills"), None);
        assert!(results.is_empty());
    }
}
