//! External collaborator interfaces: statistic providers and populations.
//!
//! The engine consumes raw counters through [`StatisticProvider`] and subject
//! universes through [`PopulationSource`]. Both are expected to be safe to
//! call from any worker thread; provider queries may block on I/O but must
//! never require synchronization with the completion thread.

mod memory;

pub use memory::MemoryStatisticProvider;

use crate::core::{Discriminator, StatKind, StatisticId, SubjectId};
use std::collections::HashSet;

/// Knows the intrinsic shape of each statistic.
///
/// Consulted at definition-construction time to reject declared/intrinsic
/// kind mismatches before a definition ever reaches the evaluator.
pub trait StatisticRegistry: Send + Sync {
    /// Returns the intrinsic kind of the statistic, or `None` if unknown.
    fn kind_of(&self, statistic: &StatisticId) -> Option<StatKind>;
}

/// Source of raw per-subject counters.
pub trait StatisticProvider: StatisticRegistry {
    /// Returns the counter value, or `None` if the statistic is not tracked
    /// for this subject. Absence is an expected outcome, not an error.
    fn query(
        &self,
        subject: &SubjectId,
        statistic: &StatisticId,
        discriminator: Option<&Discriminator>,
    ) -> Option<i64>;

    /// Returns the full discriminator domain of a keyed statistic.
    ///
    /// Used for total requests and filtered sums. Untyped statistics have an
    /// empty domain.
    fn discriminator_domain(&self, statistic: &StatisticId) -> Vec<Discriminator>;
}

/// The inclusion-filtered subject universe for population computations.
///
/// Inclusion/exclusion policy is owned by the caller's environment; the
/// engine only consumes the resulting list.
pub trait PopulationSource: Send + Sync {
    /// Returns the subjects to aggregate over.
    fn list(&self) -> Vec<SubjectId>;
}

/// A fixed list of subjects.
#[derive(Debug, Clone, Default)]
pub struct StaticPopulation {
    subjects: Vec<SubjectId>,
}

impl StaticPopulation {
    /// Creates a population from the given subjects.
    pub fn new(subjects: Vec<SubjectId>) -> Self {
        StaticPopulation { subjects }
    }
}

impl PopulationSource for StaticPopulation {
    fn list(&self) -> Vec<SubjectId> {
        self.subjects.clone()
    }
}

/// Request-scoped filter over a keyed statistic's discriminator domain.
///
/// Applied while iterating the domain of a total request ("hostile kills
/// only", "everything except one block kind"). Not part of the stored metric
/// definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainFilter {
    /// Keep only the listed discriminators.
    Only(HashSet<Discriminator>),
    /// Keep everything except the listed discriminators.
    Excluding(HashSet<Discriminator>),
}

impl DomainFilter {
    /// Filter that keeps only the given discriminators.
    pub fn only<I, D>(keys: I) -> Self
    where
        I: IntoIterator<Item = D>,
        D: Into<Discriminator>,
    {
        DomainFilter::Only(keys.into_iter().map(Into::into).collect())
    }

    /// Filter that drops the given discriminators.
    pub fn excluding<I, D>(keys: I) -> Self
    where
        I: IntoIterator<Item = D>,
        D: Into<Discriminator>,
    {
        DomainFilter::Excluding(keys.into_iter().map(Into::into).collect())
    }

    /// Returns true if the discriminator passes the filter.
    pub fn matches(&self, key: &Discriminator) -> bool {
        match self {
            DomainFilter::Only(keys) => keys.contains(key),
            DomainFilter::Excluding(keys) => !keys.contains(key),
        }
    }
}
