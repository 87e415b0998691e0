//! Statrank - metric evaluation and ranking over large subject populations.
//!
//! Statrank exposes named metrics over a population of subjects. Metrics are
//! composed from raw counters or derived from other metrics via arithmetic;
//! the engine computes per-subject values, population totals and ranked
//! top-N leaderboards, correctly under concurrent access.
//!
//! # Features
//!
//! - **Tagged definitions**: leaf-set and derived metrics built through
//!   validating smart constructors
//! - **Fail-soft evaluation**: absent data degrades to 0 with a diagnostic,
//!   never an error
//! - **Fork-join aggregation**: divide-and-conquer over the population on a
//!   rayon pool, deterministic regardless of parallelism
//! - **Single-flight scheduling**: one in-flight computation per requester,
//!   results marshalled back to a single consumer
//! - **Swap-on-reload catalog**: readers always see a fully-built snapshot
//!
//! # Architecture
//!
//! - `catalog`: metric definitions, snapshots and YAML loading
//! - `provider`: external collaborator traits (counters, populations)
//! - `compute`: the single-subject evaluator and population aggregator
//! - `rank`: top-N ranking and totals
//! - `scheduler`: admission control and completion delivery
//! - `core`: domain types, errors, config, diagnostics
//!
//! # Example
//!
//! ```no_run
//! use statrank::catalog::{Catalog, LeafRef, MetricDefinition};
//! use statrank::core::{Alias, Config, RequesterId, SubjectId};
//! use statrank::provider::{MemoryStatisticProvider, StaticPopulation};
//! use statrank::Engine;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let provider = Arc::new(MemoryStatisticProvider::new());
//!     provider.register_untyped("player_kills");
//!     provider.set("alice", "player_kills", 10);
//!
//!     let catalog = Catalog::from_definitions([MetricDefinition::leaf_set(
//!         "kills",
//!         "Kills",
//!         vec![LeafRef::untyped("player_kills")],
//!         false,
//!         provider.as_ref(),
//!     )?]);
//!
//!     let population = Arc::new(StaticPopulation::new(vec![SubjectId::new("alice")]));
//!     let (engine, mut completions) =
//!         Engine::new(Config::default(), catalog, provider, population)?;
//!
//!     engine.submit_for_population(
//!         RequesterId::new("console"),
//!         Alias::new("kills"),
//!         None,
//!         |results| println!("computed {} subjects", results.len()),
//!     )?;
//!     completions.recv().await.unwrap().run();
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod catalog;
pub mod compute;
pub mod core;
mod engine;
pub mod provider;
pub mod rank;
pub mod scheduler;

// Re-export the engine and core types for convenience
pub use crate::core::{Config, Result, StatError};
pub use engine::Engine;
