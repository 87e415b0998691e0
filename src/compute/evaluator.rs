//! Single-subject metric evaluation.
//!
//! Resolves one alias to one integer for one subject, recursively for
//! derived metrics, with per-subject memoization and a depth guard against
//! cyclic definitions. Business-level absence of data never fails an
//! evaluation: it degrades to 0 and records a diagnostic.

use crate::catalog::{Catalog, LeafRef, MetricKind};
use crate::core::{Alias, EvalDiagnostics, SubjectId};
use crate::provider::{DomainFilter, StatisticProvider};
use std::collections::HashMap;

/// Default maximum recursion depth when resolving derived metrics.
pub const MAX_DEPTH: usize = 10;

/// Memoized results for one subject within one request.
///
/// Created fresh per `(subject, request)` pair and discarded after; never
/// shared across subjects or requests.
pub type EvalCache = HashMap<Alias, i64>;

/// Evaluates metrics for single subjects against one catalog snapshot.
pub struct Evaluator<'a> {
    catalog: &'a Catalog,
    provider: &'a dyn StatisticProvider,
    diagnostics: &'a EvalDiagnostics,
    filter: Option<&'a DomainFilter>,
    max_depth: usize,
}

impl<'a> Evaluator<'a> {
    /// Creates an evaluator over a catalog snapshot and provider.
    pub fn new(
        catalog: &'a Catalog,
        provider: &'a dyn StatisticProvider,
        diagnostics: &'a EvalDiagnostics,
    ) -> Self {
        Evaluator {
            catalog,
            provider,
            diagnostics,
            filter: None,
            max_depth: MAX_DEPTH,
        }
    }

    /// Attaches a request-scoped discriminator filter, applied to total
    /// requests while iterating the discriminator domain.
    pub fn with_filter(mut self, filter: Option<&'a DomainFilter>) -> Self {
        self.filter = filter;
        self
    }

    /// Overrides the maximum recursion depth.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Resolves `alias` to a value for `subject`.
    ///
    /// Entry points pass a fresh cache and depth 0. Missing aliases, missing
    /// leaf values and exceeded depth all yield 0 with a diagnostic.
    pub fn evaluate(
        &self,
        subject: &SubjectId,
        alias: &Alias,
        cache: &mut EvalCache,
        depth: usize,
    ) -> i64 {
        if let Some(&value) = cache.get(alias) {
            return value;
        }

        if depth > self.max_depth {
            tracing::warn!(
                %alias, %subject,
                "max recursion depth reached, check for circular derived definitions"
            );
            self.diagnostics.record_depth_exceeded();
            return 0;
        }

        let Some(definition) = self.catalog.get(alias) else {
            tracing::warn!(%alias, %subject, "alias not found in catalog");
            self.diagnostics.record_missing_alias();
            return 0;
        };

        let value = match definition.kind() {
            MetricKind::LeafSet { components, is_total } => {
                if *is_total {
                    // Validated at construction: exactly one keyed leaf.
                    self.leaf_total(subject, &components[0])
                } else {
                    components
                        .iter()
                        .fold(0i64, |sum, leaf| sum.saturating_add(self.leaf_value(subject, leaf)))
                }
            },
            MetricKind::Derived { components } => {
                let mut value =
                    self.evaluate(subject, &components[0].alias_ref, cache, depth + 1);
                for component in &components[1..] {
                    let operand =
                        self.evaluate(subject, &component.alias_ref, cache, depth + 1);
                    value = component.operator.apply(value, operand);
                }
                value
            },
        };

        cache.insert(alias.clone(), value);
        value
    }

    /// Queries one leaf counter. Absence contributes 0 without aborting the
    /// rest of the definition.
    fn leaf_value(&self, subject: &SubjectId, leaf: &LeafRef) -> i64 {
        match self
            .provider
            .query(subject, &leaf.statistic, leaf.discriminator.as_ref())
        {
            Some(value) => value,
            None => {
                tracing::debug!(
                    statistic = %leaf.statistic, %subject,
                    "statistic not tracked for subject, contributing 0"
                );
                self.diagnostics.record_missing_leaf();
                0
            },
        }
    }

    /// Sums a keyed statistic across its whole discriminator domain,
    /// honoring the request-scoped filter.
    fn leaf_total(&self, subject: &SubjectId, leaf: &LeafRef) -> i64 {
        let mut sum = 0i64;
        for key in self.provider.discriminator_domain(&leaf.statistic) {
            if let Some(filter) = self.filter {
                if !filter.matches(&key) {
                    continue;
                }
            }
            if let Some(value) = self.provider.query(subject, &leaf.statistic, Some(&key)) {
                sum = sum.saturating_add(value);
            }
        }
        sum
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::MetricDefinition;
    use crate::provider::MemoryStatisticProvider;

    fn provider() -> MemoryStatisticProvider {
        let provider = MemoryStatisticProvider::new();
        provider.register_untyped("player_kills");
        provider.register_untyped("deaths");
        provider.register_keyed("mine_block", ["stone", "iron_ore", "deepslate_iron_ore"]);
        provider.set("alice", "player_kills", 10);
        provider.set("alice", "deaths", 3);
        provider.set_keyed("alice", "mine_block", "stone", 100);
        provider.set_keyed("alice", "mine_block", "iron_ore", 5);
        provider.set_keyed("alice", "mine_block", "deepslate_iron_ore", 3);
        provider
    }

    fn evaluate_with(catalog: &Catalog, provider: &MemoryStatisticProvider, alias: &str) -> i64 {
        let diagnostics = EvalDiagnostics::new();
        let evaluator = Evaluator::new(catalog, provider, &diagnostics);
        let mut cache = EvalCache::new();
        evaluator.evaluate(&SubjectId::new("alice"), &Alias::new(alias), &mut cache, 0)
    }

    #[test]
    fn test_untyped_leaf() {
        let provider = provider();
        let catalog = Catalog::from_definitions([MetricDefinition::leaf_set(
            "kills",
            "Kills",
            vec![LeafRef::untyped("player_kills")],
            false,
            &provider,
        )
        .unwrap()]);
        assert_eq!(evaluate_with(&catalog, &provider, "kills"), 10);
    }

    #[test]
    fn test_multi_leaf_composite_sums() {
        let provider = provider();
        let catalog = Catalog::from_definitions([MetricDefinition::leaf_set(
            "ores_mined_iron",
            "Iron Ores Mined",
            vec![
                LeafRef::keyed("mine_block", "iron_ore"),
                LeafRef::keyed("mine_block", "deepslate_iron_ore"),
            ],
            false,
            &provider,
        )
        .unwrap()]);
        assert_eq!(evaluate_with(&catalog, &provider, "ores_mined_iron"), 8);
    }

    #[test]
    fn test_total_sums_whole_domain() {
        let provider = provider();
        let catalog = Catalog::from_definitions([MetricDefinition::leaf_set(
            "blocks_mined",
            "Blocks Mined",
            vec![LeafRef::keyed_total("mine_block")],
            true,
            &provider,
        )
        .unwrap()]);
        assert_eq!(evaluate_with(&catalog, &provider, "blocks_mined"), 108);
    }

    #[test]
    fn test_filtered_total() {
        let provider = provider();
        let catalog = Catalog::from_definitions([MetricDefinition::leaf_set(
            "blocks_mined",
            "Blocks Mined",
            vec![LeafRef::keyed_total("mine_block")],
            true,
            &provider,
        )
        .unwrap()]);

        let diagnostics = EvalDiagnostics::new();
        let filter = DomainFilter::excluding(["stone"]);
        let evaluator =
            Evaluator::new(&catalog, &provider, &diagnostics).with_filter(Some(&filter));
        let mut cache = EvalCache::new();
        let value =
            evaluator.evaluate(&SubjectId::new("alice"), &Alias::new("blocks_mined"), &mut cache, 0);
        assert_eq!(value, 8);
    }

    #[test]
    fn test_derived_fold_is_left_to_right() {
        let provider = provider();
        let catalog = Catalog::from_definitions([
            MetricDefinition::leaf_set(
                "kills",
                "Kills",
                vec![LeafRef::untyped("player_kills")],
                false,
                &provider,
            )
            .unwrap(),
            MetricDefinition::leaf_set(
                "deaths",
                "Deaths",
                vec![LeafRef::untyped("deaths")],
                false,
                &provider,
            )
            .unwrap(),
            MetricDefinition::derived(
                "net_kills",
                "Net Kills",
                vec![(Alias::new("kills"), '+'), (Alias::new("deaths"), '-')],
            )
            .unwrap(),
            // (kills - deaths) * deaths = (10 - 3) * 3, not kills - (deaths * deaths)
            MetricDefinition::derived(
                "weighted",
                "Weighted",
                vec![
                    (Alias::new("kills"), '+'),
                    (Alias::new("deaths"), '-'),
                    (Alias::new("deaths"), '*'),
                ],
            )
            .unwrap(),
        ]);
        assert_eq!(evaluate_with(&catalog, &provider, "net_kills"), 7);
        assert_eq!(evaluate_with(&catalog, &provider, "weighted"), 21);
    }

    #[test]
    fn test_missing_alias_degrades_to_zero() {
        let provider = provider();
        let catalog = Catalog::default();
        let diagnostics = EvalDiagnostics::new();
        let evaluator = Evaluator::new(&catalog, &provider, &diagnostics);
        let mut cache = EvalCache::new();
        let value =
            evaluator.evaluate(&SubjectId::new("alice"), &Alias::new("ghost"), &mut cache, 0);
        assert_eq!(value, 0);
        assert_eq!(diagnostics.snapshot().missing_alias, 1);
    }

    #[test]
    fn test_cycle_terminates_with_zero() {
        let provider = provider();
        let catalog = Catalog::from_definitions([
            MetricDefinition::derived("x", "X", vec![(Alias::new("y"), '+')]).unwrap(),
            MetricDefinition::derived("y", "Y", vec![(Alias::new("x"), '+')]).unwrap(),
        ]);

        let diagnostics = EvalDiagnostics::new();
        let evaluator = Evaluator::new(&catalog, &provider, &diagnostics);
        let mut cache = EvalCache::new();
        let value = evaluator.evaluate(&SubjectId::new("alice"), &Alias::new("x"), &mut cache, 0);
        assert_eq!(value, 0);
        assert_eq!(diagnostics.snapshot().depth_exceeded, 1);
    }

    #[test]
    fn test_memoization_within_one_subject() {
        let provider = provider();
        let catalog = Catalog::from_definitions([MetricDefinition::leaf_set(
            "kills",
            "Kills",
            vec![LeafRef::untyped("player_kills")],
            false,
            &provider,
        )
        .unwrap()]);

        let diagnostics = EvalDiagnostics::new();
        let evaluator = Evaluator::new(&catalog, &provider, &diagnostics);
        let mut cache = EvalCache::new();
        let subject = SubjectId::new("alice");
        let alias = Alias::new("kills");

        let first = evaluator.evaluate(&subject, &alias, &mut cache, 0);
        assert_eq!(cache.get(&alias), Some(&first));

        // Mutate the backing value; the cached result must win.
        provider.set("alice", "player_kills", 999);
        assert_eq!(evaluator.evaluate(&subject, &alias, &mut cache, 0), first);
    }
}
