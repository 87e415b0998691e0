//! Shared fixtures for integration tests.

// Not every test binary uses every fixture.
#![allow(dead_code)]

use statrank::catalog::{Catalog, LeafRef, MetricDefinition};
use statrank::core::{Alias, SubjectId};
use statrank::provider::MemoryStatisticProvider;
use std::sync::Arc;

/// Provider with a small game-flavored statistic universe.
pub fn build_provider() -> Arc<MemoryStatisticProvider> {
    let provider = MemoryStatisticProvider::new();
    provider.register_untyped("player_kills");
    provider.register_untyped("deaths");
    provider.register_untyped("jump");
    provider.register_keyed("mine_block", ["stone", "iron_ore", "deepslate_iron_ore"]);

    provider.set("alice", "player_kills", 10);
    provider.set("alice", "deaths", 3);
    provider.set("alice", "jump", 500);
    provider.set_keyed("alice", "mine_block", "stone", 100);
    provider.set_keyed("alice", "mine_block", "iron_ore", 5);
    provider.set_keyed("alice", "mine_block", "deepslate_iron_ore", 3);

    provider.set("bob", "player_kills", 4);
    provider.set("bob", "deaths", 8);

    Arc::new(provider)
}

/// Catalog exercising every definition shape.
pub fn build_catalog(provider: &MemoryStatisticProvider) -> Catalog {
    Catalog::from_definitions([
        MetricDefinition::leaf_set(
            "kills",
            "Player Kills",
            vec![LeafRef::untyped("player_kills")],
            false,
            provider,
        )
        .unwrap(),
        MetricDefinition::leaf_set(
            "deaths",
            "Deaths",
            vec![LeafRef::untyped("deaths")],
            false,
            provider,
        )
        .unwrap(),
        MetricDefinition::leaf_set(
            "ores_mined_iron",
            "Iron Ores Mined",
            vec![
                LeafRef::keyed("mine_block", "iron_ore"),
                LeafRef::keyed("mine_block", "deepslate_iron_ore"),
            ],
            false,
            provider,
        )
        .unwrap(),
        MetricDefinition::leaf_set(
            "blocks_mined",
            "Blocks Mined",
            vec![LeafRef::keyed_total("mine_block")],
            true,
            provider,
        )
        .unwrap(),
        MetricDefinition::derived(
            "net_kills",
            "Net Kills",
            vec![(Alias::new("kills"), '+'), (Alias::new("deaths"), '-')],
        )
        .unwrap(),
    ])
}

/// A synthetic population `subject_0 .. subject_{n-1}` where subject i has
/// `player_kills = i`.
pub fn synthetic_population(provider: &MemoryStatisticProvider, n: usize) -> Vec<SubjectId> {
    let subjects: Vec<SubjectId> = (0..n).map(|i| SubjectId::new(format!("subject_{i}"))).collect();
    for (i, subject) in subjects.iter().enumerate() {
        provider.set(subject.as_str(), "player_kills", i as i64);
    }
    subjects
}
