//! The computation core: single-subject evaluation and population
//! aggregation.

mod aggregator;
mod evaluator;

pub use aggregator::PopulationAggregator;
pub use evaluator::{EvalCache, Evaluator, MAX_DEPTH};
