//! The engine: one explicit context object wiring all components together.
//!
//! Constructed once at startup and passed by reference to all entry points;
//! the catalog snapshot is rebuilt on reload, everything else lives for the
//! process.

use crate::catalog::{Catalog, CatalogHandle, CatalogSource};
use crate::compute::{EvalCache, Evaluator, PopulationAggregator};
use crate::core::{
    Alias, Config, DiagnosticsSnapshot, EvalDiagnostics, RequesterId, Result, SubjectId,
};
use crate::provider::{DomainFilter, PopulationSource, StatisticProvider};
use crate::rank::{self, RankedResult};
use crate::scheduler::{CompletionEvent, RequestScheduler};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;

/// The statrank engine.
pub struct Engine {
    config: Config,
    catalog: CatalogHandle,
    provider: Arc<dyn StatisticProvider>,
    population: Arc<dyn PopulationSource>,
    scheduler: RequestScheduler,
    diagnostics: Arc<EvalDiagnostics>,
}

impl Engine {
    /// Creates an engine from a validated configuration, an initial catalog
    /// snapshot and the external collaborators.
    ///
    /// Also returns the completion receiver; the caller's environment owns
    /// it and must drain it on a single consumer, invoking
    /// [`CompletionEvent::run`] on each event.
    pub fn new(
        config: Config,
        catalog: Catalog,
        provider: Arc<dyn StatisticProvider>,
        population: Arc<dyn PopulationSource>,
    ) -> Result<(Self, UnboundedReceiver<CompletionEvent>)> {
        config.validate()?;
        let (scheduler, completions) = RequestScheduler::new(config.engine.single_flight);
        let engine = Engine {
            config,
            catalog: CatalogHandle::new(catalog),
            provider,
            population,
            scheduler,
            diagnostics: Arc::new(EvalDiagnostics::new()),
        };
        Ok((engine, completions))
    }

    /// Evaluates one alias for one subject, synchronously, with a fresh
    /// cache. Absence of data yields 0.
    pub fn evaluate_one(&self, subject: &SubjectId, alias: &Alias) -> i64 {
        let catalog = self.catalog.current();
        let evaluator = Evaluator::new(&catalog, self.provider.as_ref(), &self.diagnostics)
            .with_max_depth(self.config.engine.max_depth);
        let mut cache = EvalCache::new();
        evaluator.evaluate(subject, alias, &mut cache, 0)
    }

    /// Submits a population computation over an explicit subject list.
    ///
    /// Rejects with [`crate::core::StatError::AlreadyRunning`] when the
    /// requester already has one in flight and single-flight is enabled.
    pub fn submit_population_computation<F>(
        &self,
        requester: RequesterId,
        subjects: Vec<SubjectId>,
        alias: Alias,
        filter: Option<DomainFilter>,
        on_complete: F,
    ) -> Result<()>
    where
        F: FnOnce(HashMap<SubjectId, i64>) + Send + 'static,
    {
        self.scheduler
            .submit(requester, self.aggregator(), subjects, alias, filter, on_complete)
    }

    /// Submits a population computation over the configured population
    /// source's current subject list.
    pub fn submit_for_population<F>(
        &self,
        requester: RequesterId,
        alias: Alias,
        filter: Option<DomainFilter>,
        on_complete: F,
    ) -> Result<()>
    where
        F: FnOnce(HashMap<SubjectId, i64>) + Send + 'static,
    {
        let subjects = self.population.list();
        self.submit_population_computation(requester, subjects, alias, filter, on_complete)
    }

    /// Ranks a raw aggregation result. `n = None` uses the configured
    /// default leaderboard length.
    pub fn rank_top_n(
        &self,
        results: &HashMap<SubjectId, i64>,
        n: Option<usize>,
        requester: &SubjectId,
    ) -> RankedResult {
        let n = n.unwrap_or(self.config.engine.default_top_size);
        rank::rank_top_n(results, n, requester)
    }

    /// Sums a raw aggregation result into a population total.
    pub fn population_total(&self, results: &HashMap<SubjectId, i64>) -> i64 {
        rank::population_total(results)
    }

    /// Reloads the catalog: drains in-flight computations, then swaps in the
    /// snapshot produced by `source`.
    ///
    /// Computations that already took a snapshot keep using it; new requests
    /// see the new catalog.
    pub async fn reload(&self, source: &dyn CatalogSource) -> Result<()> {
        tracing::info!("reloading metric catalog");
        self.scheduler
            .quiesce(self.config.engine.quiesce_poll, self.config.engine.quiesce_timeout)
            .await?;
        let catalog = source.load()?;
        let metrics = catalog.len();
        self.catalog.swap(catalog);
        tracing::info!(metrics, "metric catalog reloaded");
        Ok(())
    }

    /// The current catalog snapshot.
    pub fn catalog(&self) -> Arc<Catalog> {
        self.catalog.current()
    }

    /// Point-in-time evaluation diagnostics.
    pub fn diagnostics(&self) -> DiagnosticsSnapshot {
        self.diagnostics.snapshot()
    }

    /// Number of population computations currently in flight.
    pub fn active_requests(&self) -> usize {
        self.scheduler.active_count()
    }

    /// Average wall time of finished requests, if any.
    pub fn average_request_time(&self) -> Option<std::time::Duration> {
        self.scheduler.average_request_time()
    }

    fn aggregator(&self) -> Arc<PopulationAggregator> {
        Arc::new(PopulationAggregator::new(
            self.catalog.current(),
            Arc::clone(&self.provider),
            Arc::clone(&self.diagnostics),
            self.config.engine.threshold,
            self.config.engine.max_depth,
        ))
    }
}
