//! Request scheduling and single-flight admission control.
//!
//! Each requester may have at most one population computation in flight
//! (when enabled). Aggregations run on the blocking pool, fanning out over
//! rayon internally; completions are marshalled through a channel to a
//! single consumer, the analog of delivering results back to an owning
//! thread.

use crate::compute::PopulationAggregator;
use crate::core::{Alias, RequesterId, Result, StatError, SubjectId};
use crate::provider::DomainFilter;
use dashmap::DashSet;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

/// Callback invoked with the raw aggregation result.
pub type OnComplete = Box<dyn FnOnce(HashMap<SubjectId, i64>) + Send + 'static>;

/// A finished computation, delivered to the completion consumer.
///
/// The consumer owns the completion context: callbacks only run when it
/// calls [`CompletionEvent::run`], never on a worker thread.
pub struct CompletionEvent {
    requester: RequesterId,
    result: HashMap<SubjectId, i64>,
    on_complete: OnComplete,
}

impl CompletionEvent {
    /// The requester this computation belonged to.
    pub fn requester(&self) -> &RequesterId {
        &self.requester
    }

    /// Invokes the request's completion callback with the raw result.
    pub fn run(self) {
        (self.on_complete)(self.result);
    }
}

/// Schedules population computations with per-requester single-flight.
pub struct RequestScheduler {
    /// Requesters with a computation in flight. Maintained only while
    /// single-flight is enabled.
    inflight: Arc<DashSet<RequesterId>>,
    /// Global count of in-flight aggregation tasks.
    active: Arc<AtomicUsize>,
    single_flight: bool,
    completions: mpsc::UnboundedSender<CompletionEvent>,
    /// Accumulated wall time and count of finished requests, for the
    /// average-duration gauge.
    total_millis: Arc<AtomicU64>,
    completed: Arc<AtomicU64>,
}

impl RequestScheduler {
    /// Creates a scheduler and the receiver its completions are sent to.
    ///
    /// The receiver must be drained by a single consumer that calls
    /// [`CompletionEvent::run`] on each event.
    pub fn new(single_flight: bool) -> (Self, mpsc::UnboundedReceiver<CompletionEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let scheduler = RequestScheduler {
            inflight: Arc::new(DashSet::new()),
            active: Arc::new(AtomicUsize::new(0)),
            single_flight,
            completions: tx,
            total_millis: Arc::new(AtomicU64::new(0)),
            completed: Arc::new(AtomicU64::new(0)),
        };
        (scheduler, rx)
    }

    /// Submits a population computation. Must be called within a tokio
    /// runtime.
    ///
    /// Returns [`StatError::AlreadyRunning`] without starting anything if the
    /// requester already has a computation in flight and single-flight is
    /// enabled. Otherwise the caller gets its answer asynchronously via the
    /// completion channel; a panic inside the aggregation is converted to an
    /// empty result map.
    pub fn submit<F>(
        &self,
        requester: RequesterId,
        aggregator: Arc<PopulationAggregator>,
        subjects: Vec<SubjectId>,
        alias: Alias,
        filter: Option<DomainFilter>,
        on_complete: F,
    ) -> Result<()>
    where
        F: FnOnce(HashMap<SubjectId, i64>) + Send + 'static,
    {
        if self.single_flight && !self.inflight.insert(requester.clone()) {
            tracing::debug!(%requester, "rejecting submission, computation already running");
            return Err(StatError::AlreadyRunning(requester.as_str().to_owned()));
        }

        let started = Instant::now();
        self.active.fetch_add(1, Ordering::SeqCst);
        tracing::debug!(%requester, %alias, subjects = subjects.len(), "starting population computation");

        let alias_label = alias.clone();
        let inflight = Arc::clone(&self.inflight);
        let active = Arc::clone(&self.active);
        let total_millis = Arc::clone(&self.total_millis);
        let completed = Arc::clone(&self.completed);
        let completions = self.completions.clone();

        tokio::spawn(async move {
            let filter_ref = filter;
            let joined = tokio::task::spawn_blocking(move || {
                aggregator.aggregate(&subjects, &alias, filter_ref.as_ref())
            })
            .await;

            let result = match joined {
                Ok(result) => result,
                Err(err) => {
                    tracing::warn!(%requester, error = %err, "population computation failed, delivering empty result");
                    HashMap::new()
                },
            };

            inflight.remove(&requester);
            let elapsed = started.elapsed();
            total_millis.fetch_add(elapsed.as_millis() as u64, Ordering::Relaxed);
            completed.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(
                %requester,
                alias = %alias_label,
                elapsed_ms = elapsed.as_millis() as u64,
                "population computation finished"
            );
            active.fetch_sub(1, Ordering::SeqCst);

            let event = CompletionEvent {
                requester,
                result,
                on_complete: Box::new(on_complete),
            };
            if completions.send(event).is_err() {
                tracing::warn!("completion consumer dropped, discarding result");
            }
        });

        Ok(())
    }

    /// Returns true if the requester currently has a computation in flight.
    ///
    /// Tracked only while single-flight is enabled; with admission control
    /// disabled this always returns false. Use [`Self::active_count`] for the
    /// global in-flight count.
    pub fn is_running(&self, requester: &RequesterId) -> bool {
        self.inflight.contains(requester)
    }

    /// Number of aggregation tasks currently in flight.
    pub fn active_count(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    /// Waits until no aggregation tasks are in flight.
    ///
    /// Used before destructive reconfiguration (the catalog swap on reload).
    /// Fails with [`StatError::QuiesceTimeout`] if the drain does not finish
    /// within `timeout`.
    pub async fn quiesce(&self, poll: Duration, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        loop {
            let pending = self.active_count();
            if pending == 0 {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(StatError::QuiesceTimeout { pending });
            }
            tokio::time::sleep(poll).await;
        }
    }

    /// Average wall time of finished requests, if any have finished.
    pub fn average_request_time(&self) -> Option<Duration> {
        let completed = self.completed.load(Ordering::Relaxed);
        if completed == 0 {
            return None;
        }
        let total = self.total_millis.load(Ordering::Relaxed);
        Some(Duration::from_millis(total / completed))
    }
}
