//! In-memory statistic provider.
//!
//! Concurrent-safe backing store for embedding and testing. Counters are
//! keyed per subject, with keyed statistics holding one counter per
//! discriminator.

use super::{StatisticProvider, StatisticRegistry};
use crate::core::{Discriminator, StatKind, StatisticId, SubjectId};
use dashmap::DashMap;
use std::collections::BTreeSet;

/// A statistic provider backed by concurrent in-memory maps.
#[derive(Debug, Default)]
pub struct MemoryStatisticProvider {
    /// Intrinsic kind per registered statistic.
    kinds: DashMap<StatisticId, StatKind>,
    /// Discriminator domain per keyed statistic (ordered for stable iteration).
    domains: DashMap<StatisticId, BTreeSet<Discriminator>>,
    /// Counters for untyped statistics.
    untyped: DashMap<(SubjectId, StatisticId), i64>,
    /// Counters for keyed statistics.
    keyed: DashMap<(SubjectId, StatisticId, Discriminator), i64>,
}

impl MemoryStatisticProvider {
    /// Creates an empty provider.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an untyped statistic.
    pub fn register_untyped(&self, statistic: impl Into<StatisticId>) {
        self.kinds.insert(statistic.into(), StatKind::Untyped);
    }

    /// Registers a keyed statistic together with its discriminator domain.
    pub fn register_keyed<I, D>(&self, statistic: impl Into<StatisticId>, domain: I)
    where
        I: IntoIterator<Item = D>,
        D: Into<Discriminator>,
    {
        let statistic = statistic.into();
        self.kinds.insert(statistic.clone(), StatKind::Keyed);
        self.domains
            .entry(statistic)
            .or_default()
            .extend(domain.into_iter().map(Into::into));
    }

    /// Sets the counter of an untyped statistic for one subject.
    pub fn set(&self, subject: impl Into<SubjectId>, statistic: impl Into<StatisticId>, value: i64) {
        self.untyped.insert((subject.into(), statistic.into()), value);
    }

    /// Sets the counter of a keyed statistic for one subject.
    ///
    /// The discriminator is added to the statistic's domain if not already
    /// present.
    pub fn set_keyed(
        &self,
        subject: impl Into<SubjectId>,
        statistic: impl Into<StatisticId>,
        discriminator: impl Into<Discriminator>,
        value: i64,
    ) {
        let statistic = statistic.into();
        let discriminator = discriminator.into();
        self.domains
            .entry(statistic.clone())
            .or_default()
            .insert(discriminator.clone());
        self.keyed.insert((subject.into(), statistic, discriminator), value);
    }
}

impl StatisticRegistry for MemoryStatisticProvider {
    fn kind_of(&self, statistic: &StatisticId) -> Option<StatKind> {
        self.kinds.get(statistic).map(|kind| *kind)
    }
}

impl StatisticProvider for MemoryStatisticProvider {
    fn query(
        &self,
        subject: &SubjectId,
        statistic: &StatisticId,
        discriminator: Option<&Discriminator>,
    ) -> Option<i64> {
        match (self.kind_of(statistic)?, discriminator) {
            (StatKind::Untyped, None) => self
                .untyped
                .get(&(subject.clone(), statistic.clone()))
                .map(|value| *value),
            (StatKind::Keyed, Some(key)) => self
                .keyed
                .get(&(subject.clone(), statistic.clone(), key.clone()))
                .map(|value| *value),
            // Shape mismatch between request and statistic: not tracked.
            _ => None,
        }
    }

    fn discriminator_domain(&self, statistic: &StatisticId) -> Vec<Discriminator> {
        self.domains
            .get(statistic)
            .map(|domain| domain.iter().cloned().collect())
            .unwrap_or_default()
    }
}
